//! URL pattern building
//!
//! Produces the gateway's match expression for a rule: a domain prefix
//! followed by the path, with `{name}` placeholders replaced by a wildcard.
//! Text between `<` and `>` is interpreted by the gateway as a regular
//! expression; everything else is matched literally.

use regex::Regex;
use std::sync::LazyLock;

/// Wildcard substituted for every declared path parameter
pub const PARAMETER_WILDCARD: &str = "<[a-zA-Z0-9-_%]*>";

/// A path segment consisting of a single `{name}` placeholder
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{([^{}/]+)\}$").expect("placeholder regex is valid"));

/// A path placeholder whose parameter is not declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndeclaredParameter(pub String);

/// Build the domain part of a URL pattern.
///
/// A single domain is used literally (minus a trailing `/`). Several domains
/// become an alternation group with escaped dots, e.g. `<(a\.com|b\.com)>`.
pub fn build_domain_prefix<S: AsRef<str>>(domains: &[S]) -> String {
    if let [domain] = domains {
        return strip_slash(domain.as_ref()).to_string();
    }

    let alternatives: Vec<String> = domains
        .iter()
        .map(|d| strip_slash(d.as_ref()).replace('.', "\\."))
        .collect();

    format!("<({})>", alternatives.join("|"))
}

/// Remove exactly one trailing `/`
fn strip_slash(domain: &str) -> &str {
    domain.strip_suffix('/').unwrap_or(domain)
}

/// Extract the parameter name if a segment is a `{name}` placeholder
pub fn placeholder_name(segment: &str) -> Option<&str> {
    PLACEHOLDER
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Build the path part of a URL pattern.
///
/// Placeholder segments are replaced by [`PARAMETER_WILDCARD`] once
/// `is_declared` confirms the parameter exists; all other segments are
/// kept verbatim.
pub fn build_path_matcher<F>(path: &str, is_declared: F) -> Result<String, UndeclaredParameter>
where
    F: Fn(&str) -> bool,
{
    let segments = path
        .split('/')
        .map(|segment| match placeholder_name(segment) {
            Some(name) if is_declared(name) => Ok(PARAMETER_WILDCARD),
            Some(name) => Err(UndeclaredParameter(name.to_string())),
            None => Ok(segment),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(segments.join("/"))
}

/// Build the full URL pattern for a set of domains and a path template
pub fn build_url_pattern<S, F>(
    domains: &[S],
    path: &str,
    is_declared: F,
) -> Result<String, UndeclaredParameter>
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    Ok(build_domain_prefix(domains) + &build_path_matcher(path, is_declared)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_domain_strips_trailing_slash() {
        assert_eq!(
            build_domain_prefix(&["https://api.example.com/"]),
            "https://api.example.com"
        );
    }

    #[test]
    fn test_only_one_trailing_slash_removed() {
        assert_eq!(build_domain_prefix(&["a.com//"]), "a.com/");
    }

    #[test]
    fn test_single_domain_keeps_dots() {
        assert_eq!(build_domain_prefix(&["a.com"]), "a.com");
    }

    #[test]
    fn test_multiple_domains_alternation() {
        assert_eq!(
            build_domain_prefix(&["a.com", "b.com/"]),
            r"<(a\.com|b\.com)>"
        );
    }

    #[test]
    fn test_placeholder_name() {
        assert_eq!(placeholder_name("{petId}"), Some("petId"));
        assert_eq!(placeholder_name("pets"), None);
        assert_eq!(placeholder_name("{petId}.json"), None);
        assert_eq!(placeholder_name("<[0-9]{3}>"), None);
        assert_eq!(placeholder_name("{}"), None);
    }

    #[test]
    fn test_path_matcher_replaces_declared_parameter() {
        let path = build_path_matcher("/pets/{petId}", |name| name == "petId").unwrap();
        assert_eq!(path, "/pets/<[a-zA-Z0-9-_%]*>");
    }

    #[test]
    fn test_path_matcher_rejects_undeclared_parameter() {
        let err = build_path_matcher("/pets/{petId}/toys/{toyId}", |name| name == "petId")
            .unwrap_err();
        assert_eq!(err, UndeclaredParameter("toyId".to_string()));
    }

    #[test]
    fn test_path_matcher_literal_path() {
        let path = build_path_matcher("/pets/<.*>", |_| false).unwrap();
        assert_eq!(path, "/pets/<.*>");
    }

    #[test]
    fn test_url_pattern() {
        let url = build_url_pattern(
            &["https://api.example.com/"],
            "/pets/{petId}",
            |name| name == "petId",
        )
        .unwrap();
        assert_eq!(url, "https://api.example.com/pets/<[a-zA-Z0-9-_%]*>");
    }
}
