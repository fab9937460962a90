//! Declarative source adapter tests

use rulesmith::error::{ResolveError, SourceError};
use rulesmith::rules::{HandlerDescriptor, HandlerKind, HandlerRegistry, Rule};
use rulesmith::sources::{DeclarativeSource, RuleSource};
use serde_json::json;
use std::path::Path;

const ADMIN: &str = include_str!("fixtures/admin.toml");

fn admin(domains: Vec<String>) -> DeclarativeSource {
    DeclarativeSource::parse(Path::new("tests/fixtures/admin.toml"), ADMIN, domains).unwrap()
}

/// Registry as left behind by the petstore source
fn petstore_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.define(
        HandlerKind::Mutator,
        "idToken",
        HandlerDescriptor::with_config("id_token", json!({ "ttl": "60s" })),
    );
    registry.append_error_handler(HandlerDescriptor::new("json"));
    registry
}

fn find<'a>(rules: &'a [Rule], id: &str) -> &'a Rule {
    rules.iter().find(|r| r.id == id).unwrap()
}

#[test]
fn test_rules_sorted_by_name() {
    let source = admin(vec![]);
    assert_eq!(source.file().rules.len(), 3);

    let rules = source.transform(&mut petstore_registry()).unwrap();
    let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["health", "listPets", "user"]);
}

#[test]
fn test_file_domains_alternation() {
    let rules = admin(vec![]).transform(&mut petstore_registry()).unwrap();
    assert_eq!(
        find(&rules, "listPets").matcher.url,
        r"<(https://admin\.example\.com|https://admin\.internal\.example\.com)>/pets"
    );
}

#[test]
fn test_entry_domains_override() {
    let rules = admin(vec![]).transform(&mut petstore_registry()).unwrap();
    assert_eq!(
        find(&rules, "health").matcher.url,
        "https://status.example.com/health"
    );
}

#[test]
fn test_file_domains_win_over_configured() {
    let rules = admin(vec!["https://configured.example.com".into()])
        .transform(&mut petstore_registry())
        .unwrap();
    assert!(find(&rules, "user").matcher.url.starts_with("<(https://admin"));
}

#[test]
fn test_handler_resolution() {
    let rules = admin(vec![]).transform(&mut petstore_registry()).unwrap();

    let list = find(&rules, "listPets");
    assert_eq!(list.authenticators[0].handler, "cookie_session");
    assert_eq!(
        list.authenticators[0].config,
        Some(json!({ "check_session_url": "https://auth.example.com/sessions/whoami" }))
    );
    assert_eq!(list.mutators[0].handler, "id_token");

    // explicit authenticators, empty mutators fall back to the default
    let health = find(&rules, "health");
    assert_eq!(health.authenticators, [HandlerDescriptor::new("anonymous")]);
    assert_eq!(health.mutators[0].handler, "id_token");
}

#[test]
fn test_methods_are_uppercased() {
    let rules = admin(vec![]).transform(&mut petstore_registry()).unwrap();
    assert_eq!(find(&rules, "health").matcher.methods, ["GET"]);
    assert_eq!(find(&rules, "user").matcher.methods, ["GET", "PUT", "DELETE"]);
    assert!(find(&rules, "user").matcher.url.ends_with("/users/<[a-zA-Z0-9-_%]*>"));
}

#[test]
fn test_error_chain_extended() {
    let mut registry = petstore_registry();
    let rules = admin(vec![]).transform(&mut registry).unwrap();

    for rule in &rules {
        let chain: Vec<&str> = rule.errors.iter().map(|h| h.handler.as_str()).collect();
        assert_eq!(chain, ["json", "redirect"]);
    }
    assert_eq!(registry.error_chain().len(), 2);
}

#[test]
fn test_missing_mutator_from_earlier_source() {
    let err = admin(vec![])
        .transform(&mut HandlerRegistry::new())
        .unwrap_err();

    assert_eq!(
        err,
        ResolveError::UnresolvedHandler {
            rule: "health".into(),
            kind: HandlerKind::Mutator,
            name: "idToken".into(),
        }
    );
    assert_eq!(
        err.to_string(),
        "rule 'health' references unknown mutator 'idToken'"
    );
}

#[test]
fn test_parse_failure() {
    let err = DeclarativeSource::parse(
        Path::new("broken.toml"),
        "[rules.a]\npath = 42\n",
        vec![],
    )
    .unwrap_err();

    match err {
        SourceError::Parse { path, .. } => assert_eq!(path, Path::new("broken.toml")),
        other => panic!("unexpected error: {other}"),
    }
}
