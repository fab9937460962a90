use crate::config::SourceKind;
use crate::error::{ResolveError, ResolveResult, SourceError};
use crate::rules::patterns::{UndeclaredParameter, build_url_pattern};
use crate::rules::{
    ALLOW_AUTHORIZER, HandlerDescriptor, HandlerKind, HandlerRegistry, Rule, RuleMatch,
};
use crate::sources::declarative::document::{RuleEntry, RuleFile};
use crate::sources::{RuleSource, local_or_default};
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// A parsed rule file plus the domains configured for its source
#[derive(Debug, Clone)]
pub struct DeclarativeSource {
    file: RuleFile,
    domains: Vec<String>,
}

impl DeclarativeSource {
    pub fn new(file: RuleFile, domains: Vec<String>) -> Self {
        Self { file, domains }
    }

    pub fn parse(path: &Path, content: &str, domains: Vec<String>) -> Result<Self, SourceError> {
        let file = RuleFile::from_toml(content).map_err(|e| SourceError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(Self::new(file, domains))
    }

    pub fn file(&self) -> &RuleFile {
        &self.file
    }

    fn register_handlers(&self, registry: &mut HandlerRegistry) {
        for (name, descriptor) in &self.file.authenticators {
            registry.define(HandlerKind::Authenticator, name, descriptor.clone());
        }
        for (name, descriptor) in &self.file.mutators {
            registry.define(HandlerKind::Mutator, name, descriptor.clone());
        }
        for descriptor in &self.file.errors {
            registry.append_error_handler(descriptor.clone());
        }
    }

    fn build_rule(
        &self,
        registry: &HandlerRegistry,
        name: &str,
        entry: &RuleEntry,
    ) -> ResolveResult<Rule> {
        if entry.methods.is_empty() {
            return Err(ResolveError::InvalidRule {
                rule: name.to_string(),
                reason: "no methods declared".to_string(),
            });
        }

        let resolve = |kind: HandlerKind, local: &Option<Vec<String>>, default: &[String]| {
            trace!(
                rule = name,
                kind = %kind,
                local = local.as_ref().is_some_and(|l| !l.is_empty()),
                "Resolving handlers"
            );
            registry
                .resolve_all(kind, local_or_default(local.as_deref(), default))
                .map_err(|e| e.for_rule(name))
        };

        let authenticators = resolve(
            HandlerKind::Authenticator,
            &entry.authenticators,
            &self.file.default_authenticators,
        )?;
        let mutators = resolve(
            HandlerKind::Mutator,
            &entry.mutators,
            &self.file.default_mutators,
        )?;
        let mut errors = resolve(
            HandlerKind::ErrorHandler,
            &entry.errors,
            &self.file.default_errors,
        )?;
        if errors.is_empty() {
            errors = registry.error_chain().to_vec();
        }

        let domains = local_or_default(
            entry.domains.as_deref(),
            local_or_default(Some(self.file.domains.as_slice()), &self.domains),
        );
        if domains.is_empty() {
            return Err(ResolveError::MissingDomains {
                rule: name.to_string(),
            });
        }

        let url = build_url_pattern(domains, &entry.path, |param| {
            entry.parameters.iter().any(|p| p == param)
        })
        .map_err(|UndeclaredParameter(parameter)| ResolveError::UndeclaredPathParameter {
            rule: name.to_string(),
            path: entry.path.clone(),
            parameter,
        })?;

        Ok(Rule {
            id: name.to_string(),
            description: entry.description.clone(),
            matcher: RuleMatch {
                url,
                methods: entry.methods.iter().map(|m| m.to_uppercase()).collect(),
            },
            authenticators,
            authorizer: HandlerDescriptor::allow(),
            mutators,
            errors,
        })
    }
}

impl RuleSource for DeclarativeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Declarative
    }

    fn transform(&self, registry: &mut HandlerRegistry) -> ResolveResult<Vec<Rule>> {
        info!(rules = self.file.rules.len(), "Transforming rule file");

        self.register_handlers(registry);

        if let Some(authorizer) = self
            .file
            .default_authorizer
            .as_deref()
            .filter(|a| *a != ALLOW_AUTHORIZER)
        {
            warn!(authorizer, "Unsupported default_authorizer, using allow");
        }

        let mut rules = Vec::with_capacity(self.file.rules.len());
        for (name, entry) in &self.file.rules {
            let rule = self.build_rule(registry, name, entry)?;
            debug!(rule = %rule.id, url = %rule.matcher.url, "Built rule");
            rules.push(rule);
        }

        Ok(rules)
    }
}
