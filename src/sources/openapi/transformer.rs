//! OpenAPI rule generation
//!
//! Registers the authenticators and mutators declared through vendor
//! extensions, then emits one rule per (path, method) operation.

use crate::config::SourceKind;
use crate::error::{ResolveError, ResolveResult, SourceError};
use crate::rules::patterns::{UndeclaredParameter, build_url_pattern};
use crate::rules::{HandlerDescriptor, HandlerKind, HandlerRegistry, HttpMethod, Rule, RuleMatch};
use crate::sources::openapi::document::{
    OpenApiDocument, Operation, ParameterLocation, PathItem, SecurityRequirement,
};
use crate::sources::openapi::extensions;
use crate::sources::{RuleSource, local_or_default};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// An OpenAPI3 document plus the domains its rules match
#[derive(Debug, Clone)]
pub struct OpenApiSource {
    document: OpenApiDocument,
    domains: Vec<String>,
}

impl OpenApiSource {
    pub fn new(document: OpenApiDocument, domains: Vec<String>) -> Self {
        Self { document, domains }
    }

    /// Parse a document read from `path`; `.json` files are JSON, anything else YAML
    pub fn parse(path: &Path, content: &str, domains: Vec<String>) -> Result<Self, SourceError> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            OpenApiDocument::from_json(content).map_err(|e| e.to_string())
        } else {
            OpenApiDocument::from_yaml(content).map_err(|e| e.to_string())
        };
        let document = parsed.map_err(|reason| SourceError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;

        if !document.is_supported_version() {
            return Err(SourceError::UnsupportedVersion {
                path: path.to_path_buf(),
                version: document.openapi,
            });
        }

        Ok(Self::new(document, domains))
    }

    pub fn document(&self) -> &OpenApiDocument {
        &self.document
    }

    /// Configured domains, else the document's server URLs
    fn domains(&self) -> Vec<String> {
        if !self.domains.is_empty() {
            return self.domains.clone();
        }

        self.document
            .servers
            .iter()
            .map(|server| server.url.clone())
            .filter(|url| !url.is_empty())
            .collect()
    }

    /// Register every security scheme that names an authenticator
    fn register_authenticators(&self, registry: &mut HandlerRegistry) -> ResolveResult<()> {
        for (scheme_name, scheme) in &self.document.components.security_schemes {
            let location = format!("components.securitySchemes.{scheme_name}");
            if let Some(descriptor) = extensions::authenticator(&scheme.extensions, &location)? {
                registry.define(HandlerKind::Authenticator, scheme_name, descriptor);
            }
        }
        Ok(())
    }

    /// Register mutator schemes from `components` and the document root
    fn register_mutators(&self, registry: &mut HandlerRegistry) -> ResolveResult<()> {
        let declared = [
            (&self.document.components.extensions, "components"),
            (&self.document.extensions, "document"),
        ];

        for (ext, location) in declared {
            for (scheme_name, descriptor) in extensions::mutator_schemes(ext, location)? {
                registry.define(HandlerKind::Mutator, scheme_name, descriptor);
            }
        }
        Ok(())
    }

    fn rule_for_operation(
        &self,
        registry: &HandlerRegistry,
        scope: &RuleScope<'_>,
        path: &str,
        item: &PathItem,
        method: HttpMethod,
        operation: &Operation,
    ) -> ResolveResult<Rule> {
        let id = operation
            .operation_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ResolveError::MissingIdentifier {
                path: path.to_string(),
                method: method.to_string(),
            })?;

        let authenticators = self.resolve_authenticators(registry, id, operation)?;
        let mutators = resolve_mutators(registry, id, path, method, operation, scope)?;

        if scope.domains.is_empty() {
            return Err(ResolveError::MissingDomains { rule: id.to_string() });
        }

        let declared = self.declared_path_parameters(id, item, operation)?;
        let url = build_url_pattern(scope.domains, path, |name| declared.contains(name)).map_err(
            |UndeclaredParameter(parameter)| ResolveError::UndeclaredPathParameter {
                rule: id.to_string(),
                path: path.to_string(),
                parameter,
            },
        )?;

        Ok(Rule {
            id: id.to_string(),
            description: operation.describe().to_string(),
            matcher: RuleMatch {
                url,
                methods: vec![method.to_string()],
            },
            authenticators,
            authorizer: HandlerDescriptor::allow(),
            mutators,
            errors: registry.error_chain().to_vec(),
        })
    }

    /// Operation security if present and non-empty, else document security
    fn resolve_authenticators(
        &self,
        registry: &HandlerRegistry,
        rule: &str,
        operation: &Operation,
    ) -> ResolveResult<Vec<HandlerDescriptor>> {
        let requirements: &[SecurityRequirement] =
            local_or_default(operation.security.as_deref(), &self.document.security);
        trace!(
            rule,
            local = operation.security.as_ref().is_some_and(|s| !s.is_empty()),
            "Resolving authenticators"
        );

        let schemes = requirements.iter().flat_map(|requirement| requirement.keys());
        registry
            .resolve_all(HandlerKind::Authenticator, schemes)
            .map_err(|e| e.for_rule(rule))
    }

    /// Names of the path parameters declared on the path item and the operation
    fn declared_path_parameters<'a>(
        &'a self,
        rule: &str,
        item: &'a PathItem,
        operation: &'a Operation,
    ) -> ResolveResult<HashSet<&'a str>> {
        let components = &self.document.components;
        let mut declared = HashSet::new();

        for parameter in item.parameters.iter().chain(&operation.parameters) {
            let resolved = components.resolve_parameter(parameter).ok_or_else(|| {
                ResolveError::UnresolvedReference {
                    rule: rule.to_string(),
                    reference: parameter.reference().unwrap_or_default().to_string(),
                }
            })?;

            if resolved.location == ParameterLocation::Path {
                declared.insert(resolved.name.as_str());
            }
        }

        Ok(declared)
    }
}

/// Values shared by every operation of one document
struct RuleScope<'a> {
    domains: &'a [String],
    default_mutators: &'a [String],
}

/// Operation mutators if present and non-empty, else the document default
fn resolve_mutators(
    registry: &HandlerRegistry,
    rule: &str,
    path: &str,
    method: HttpMethod,
    operation: &Operation,
    scope: &RuleScope<'_>,
) -> ResolveResult<Vec<HandlerDescriptor>> {
    let location = format!("{method} {path}");
    let local = extensions::mutator_names(&operation.extensions, &location)?;
    trace!(
        rule,
        local = local.as_ref().is_some_and(|names| !names.is_empty()),
        "Resolving mutators"
    );
    let names = local_or_default(local.as_deref(), scope.default_mutators);

    registry
        .resolve_all(HandlerKind::Mutator, names)
        .map_err(|e| e.for_rule(rule))
}

impl RuleSource for OpenApiSource {
    fn kind(&self) -> SourceKind {
        SourceKind::OpenApi
    }

    fn transform(&self, registry: &mut HandlerRegistry) -> ResolveResult<Vec<Rule>> {
        info!(
            title = %self.document.info.title,
            paths = self.document.paths.len(),
            "Transforming OpenAPI document"
        );

        self.register_authenticators(registry)?;
        self.register_mutators(registry)?;

        let domains = self.domains();
        let default_mutators =
            extensions::mutator_names(&self.document.extensions, "document")?.unwrap_or_default();
        let scope = RuleScope {
            domains: &domains,
            default_mutators: &default_mutators,
        };

        let mut seen = HashSet::new();
        let mut rules = Vec::new();

        for (path, item) in &self.document.paths {
            for method in item.unsupported_methods() {
                warn!(path = %path, method, "Ignoring operation with unsupported method");
            }

            for (method, operation) in item.operations() {
                let rule = self.rule_for_operation(registry, &scope, path, item, method, operation)?;

                if !seen.insert(rule.id.clone()) {
                    return Err(ResolveError::DuplicateIdentifier { rule: rule.id });
                }

                debug!(rule = %rule.id, url = %rule.matcher.url, method = %method, "Built rule");
                rules.push(rule);
            }
        }

        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::openapi::extensions::{AUTHENTICATOR, MUTATORS};
    use serde_json::json;
    use std::path::PathBuf;

    fn source(json: &str) -> OpenApiSource {
        OpenApiSource::new(
            OpenApiDocument::from_json(json).unwrap(),
            vec!["https://api.example.com/".to_string()],
        )
    }

    #[test]
    fn test_single_operation() {
        let src = source(
            r#"{
                "openapi": "3.0.0",
                "paths": { "/health": { "get": { "operationId": "health", "description": "Liveness" } } }
            }"#,
        );
        let mut registry = HandlerRegistry::new();
        let rules = src.transform(&mut registry).unwrap();

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "health");
        assert_eq!(rules[0].description, "Liveness");
        assert_eq!(rules[0].matcher.url, "https://api.example.com/health");
        assert_eq!(rules[0].matcher.methods, ["GET"]);
        assert_eq!(rules[0].authorizer.handler, "allow");
        assert!(rules[0].authenticators.is_empty());
        assert!(rules[0].mutators.is_empty());
    }

    #[test]
    fn test_missing_operation_id() {
        let src = source(r#"{ "openapi": "3.0.0", "paths": { "/pets": { "delete": {} } } }"#);
        let err = src.transform(&mut HandlerRegistry::new()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingIdentifier {
                path: "/pets".into(),
                method: "DELETE".into()
            }
        );
    }

    #[test]
    fn test_duplicate_operation_id() {
        let src = source(
            r#"{
                "openapi": "3.0.0",
                "paths": {
                    "/a": { "get": { "operationId": "same" } },
                    "/b": { "get": { "operationId": "same" } }
                }
            }"#,
        );
        let err = src.transform(&mut HandlerRegistry::new()).unwrap_err();
        assert_eq!(err, ResolveError::DuplicateIdentifier { rule: "same".into() });
    }

    #[test]
    fn test_registers_authenticators_and_mutators() {
        let mut doc = OpenApiDocument::from_json(r#"{ "openapi": "3.0.0" }"#).unwrap();
        let mut scheme = crate::sources::openapi::document::SecurityScheme::default();
        scheme.extensions.insert(AUTHENTICATOR, json!("jwt"));
        doc.components.security_schemes.insert("bearer".into(), scheme);
        doc.components.extensions.insert(
            extensions::MUTATOR_SCHEMES,
            json!({ "idToken": { "handler": "id_token" } }),
        );
        doc.extensions.insert(
            extensions::MUTATOR_SCHEMES,
            json!({ "idToken": { "handler": "header" } }),
        );

        let mut registry = HandlerRegistry::new();
        OpenApiSource::new(doc, vec!["a.com".into()])
            .transform(&mut registry)
            .unwrap();

        assert_eq!(
            registry.resolve(HandlerKind::Authenticator, "bearer").unwrap().handler,
            "jwt"
        );
        // root-level schemes are registered after components
        assert_eq!(
            registry.resolve(HandlerKind::Mutator, "idToken").unwrap().handler,
            "header"
        );
    }

    #[test]
    fn test_empty_operation_mutators_fall_back() {
        let mut doc = OpenApiDocument::from_json(
            r#"{
                "openapi": "3.0.0",
                "paths": { "/pets": { "get": { "operationId": "listPets", "x-oathkeeper-mutators": [] } } }
            }"#,
        )
        .unwrap();
        doc.extensions.insert(MUTATORS, json!(["idToken"]));

        let mut registry = HandlerRegistry::new();
        registry.define(HandlerKind::Mutator, "idToken", HandlerDescriptor::new("id_token"));

        let rules = OpenApiSource::new(doc, vec!["a.com".into()])
            .transform(&mut registry)
            .unwrap();
        assert_eq!(rules[0].mutators, [HandlerDescriptor::new("id_token")]);
    }

    #[test]
    fn test_domains_fall_back_to_servers() {
        let doc = OpenApiDocument::from_json(
            r#"{
                "openapi": "3.0.0",
                "servers": [{ "url": "https://a.example.com" }, { "url": "https://b.example.com" }],
                "paths": { "/pets": { "get": { "operationId": "listPets" } } }
            }"#,
        )
        .unwrap();

        let rules = OpenApiSource::new(doc, vec![])
            .transform(&mut HandlerRegistry::new())
            .unwrap();
        assert_eq!(
            rules[0].matcher.url,
            r"<(https://a\.example\.com|https://b\.example\.com)>/pets"
        );
    }

    #[test]
    fn test_no_domains() {
        let doc = OpenApiDocument::from_json(
            r#"{ "openapi": "3.0.0", "paths": { "/pets": { "get": { "operationId": "listPets" } } } }"#,
        )
        .unwrap();

        let err = OpenApiSource::new(doc, vec![])
            .transform(&mut HandlerRegistry::new())
            .unwrap_err();
        assert_eq!(err, ResolveError::MissingDomains { rule: "listPets".into() });
    }

    #[test]
    fn test_dangling_parameter_reference() {
        let src = source(
            r##"{
                "openapi": "3.0.0",
                "paths": { "/pets/{petId}": { "get": {
                    "operationId": "showPetById",
                    "parameters": [{ "$ref": "#/components/parameters/PetId" }]
                } } }
            }"##,
        );
        let err = src.transform(&mut HandlerRegistry::new()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnresolvedReference {
                rule: "showPetById".into(),
                reference: "#/components/parameters/PetId".into()
            }
        );
    }

    #[test]
    fn test_query_parameter_does_not_declare_placeholder() {
        let src = source(
            r#"{
                "openapi": "3.0.0",
                "paths": { "/pets/{petId}": { "get": {
                    "operationId": "showPetById",
                    "parameters": [{ "name": "petId", "in": "query" }]
                } } }
            }"#,
        );
        let err = src.transform(&mut HandlerRegistry::new()).unwrap_err();
        assert!(matches!(err, ResolveError::UndeclaredPathParameter { .. }));
    }

    #[test]
    fn test_parse_rejects_swagger() {
        let err = OpenApiSource::parse(
            &PathBuf::from("legacy.json"),
            r#"{ "swagger": "2.0", "paths": {} }"#,
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let err = OpenApiSource::parse(&PathBuf::from("broken.yaml"), "openapi: [3.0", vec![])
            .unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }
}
