//! Rendering of the final rule set
//!
//! Rules are written as a single JSON array in the gateway's access rule
//! format, either to a file or to stdout.

use crate::config::OutputConfig;
use crate::error::OutputError;
use crate::rules::Rule;
use std::fs;
use std::io::{self, Write};
use tracing::info;

/// Serialize rules to a JSON array
pub fn render_rules(rules: &[Rule], pretty: bool) -> Result<String, OutputError> {
    let json = if pretty {
        serde_json::to_string_pretty(rules)?
    } else {
        serde_json::to_string(rules)?
    };
    Ok(json)
}

/// Write rules to the configured file, or stdout when no path is set
pub fn write_rules(rules: &[Rule], config: &OutputConfig) -> Result<(), OutputError> {
    let mut json = render_rules(rules, config.pretty)?;
    json.push('\n');

    match &config.path {
        Some(path) => {
            fs::write(path, json)?;
            info!(path = %path.display(), rules = rules.len(), "Wrote rules");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{HandlerDescriptor, RuleMatch};
    use serde_json::json;

    fn rule() -> Rule {
        Rule {
            id: "petstore:showPetById".into(),
            description: "Info for a specific pet".into(),
            matcher: RuleMatch {
                url: "https://api.example.com/pets/<[a-zA-Z0-9-_%]*>".into(),
                methods: vec!["GET".into()],
            },
            authenticators: vec![HandlerDescriptor::with_config(
                "jwt",
                json!({ "jwks_urls": ["https://idp.example.com/.well-known/jwks.json"] }),
            )],
            authorizer: HandlerDescriptor::allow(),
            mutators: vec![HandlerDescriptor::new("id_token")],
            errors: vec![HandlerDescriptor::new("json")],
        }
    }

    #[test]
    fn test_render_compact() {
        insta::assert_snapshot!(
            render_rules(&[rule()], false).unwrap(),
            @r#"[{"id":"petstore:showPetById","description":"Info for a specific pet","match":{"url":"https://api.example.com/pets/<[a-zA-Z0-9-_%]*>","methods":["GET"]},"authenticators":[{"handler":"jwt","config":{"jwks_urls":["https://idp.example.com/.well-known/jwks.json"]}}],"authorizer":{"handler":"allow"},"mutators":[{"handler":"id_token"}],"errors":[{"handler":"json"}]}]"#
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_rules(&[], false).unwrap(), "[]");
        assert_eq!(render_rules(&[], true).unwrap(), "[]");
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let config = OutputConfig {
            pretty: true,
            path: Some(path.clone()),
        };

        write_rules(&[rule()], &config).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["match"]["methods"], json!(["GET"]));
        assert_eq!(written[0]["authorizer"], json!({ "handler": "allow" }));
        assert!(written[0]["mutators"][0].get("config").is_none());
    }
}
