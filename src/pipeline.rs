//! Aggregation pipeline
//!
//! Runs every configured source, in order, against one shared
//! [`HandlerRegistry`] and concatenates their rules. Each rule id is
//! prefixed with `<source name>:` so ids from different sources never
//! collide.
//!
//! Source order is significant: handlers defined by a source can only be
//! referenced by that source and the sources after it.

use crate::config::{AppConfig, ErrorPolicy};
use crate::error::{PipelineError, ResolveError, SourceError};
use crate::rules::{HandlerRegistry, Rule};
use crate::sources::{RuleSource, load_source};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Separator between the source name and the rule id
pub const ID_SEPARATOR: char = ':';

/// A source registered under its configured name
#[derive(Debug)]
struct NamedSource {
    name: String,
    source: Box<dyn RuleSource>,
}

/// Result of a pipeline run
#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// Rules of every successful source, in source order
    pub rules: Vec<Rule>,

    /// Sources skipped under [`ErrorPolicy::Continue`]
    pub skipped: Vec<PipelineError>,
}

#[derive(Debug, Default)]
pub struct Pipeline {
    registry: HandlerRegistry,
    sources: Vec<NamedSource>,
    policy: ErrorPolicy,
    skipped: Vec<PipelineError>,
}

impl Pipeline {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Build a pipeline from configuration, reading and parsing every source.
    ///
    /// All documents are parsed before any of them is resolved. Under
    /// [`ErrorPolicy::Continue`] a source that cannot be loaded is recorded
    /// as skipped instead of failing the build.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let mut pipeline = Self::new(HandlerRegistry::from_config(&config.gateway))
            .with_policy(config.pipeline.on_error);

        for source_config in &config.sources {
            match load_source(source_config) {
                Ok(source) => pipeline.add_source(&source_config.name, source),
                Err(e) => pipeline.fail(PipelineError::new(&source_config.name, e))?,
            }
        }

        Ok(pipeline)
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Append a source; sources run in the order they are added
    pub fn add_source(&mut self, name: impl Into<String>, source: Box<dyn RuleSource>) {
        let name = name.into();
        debug!(source = %name, kind = %source.kind(), "Adding source");
        self.sources.push(NamedSource { name, source });
    }

    pub fn with_source(mut self, name: impl Into<String>, source: Box<dyn RuleSource>) -> Self {
        self.add_source(name, source);
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Number of sources that will run
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Apply the error policy to a failed source
    fn fail(&mut self, err: PipelineError) -> Result<(), PipelineError> {
        match self.policy {
            ErrorPolicy::Abort => Err(err),
            ErrorPolicy::Continue => {
                error!(source = %err.source_name, error = %err.error, "Skipping source");
                self.skipped.push(err);
                Ok(())
            }
        }
    }

    /// Resolve every source and collect the prefixed rules
    pub fn run(mut self) -> Result<PipelineOutput, PipelineError> {
        if self.is_empty() {
            warn!("No sources to run");
        }
        info!(sources = self.len(), policy = ?self.policy, "Running pipeline");

        let sources = std::mem::take(&mut self.sources);
        let mut ids = HashSet::new();
        let mut rules = Vec::new();

        for NamedSource { name, source } in sources {
            let checkpoint = match self.policy {
                ErrorPolicy::Continue => Some(self.registry.clone()),
                ErrorPolicy::Abort => None,
            };

            match resolve_source(&name, source.as_ref(), &mut self.registry, &ids) {
                Ok(resolved) => {
                    info!(source = %name, kind = %source.kind(), rules = resolved.len(), "Processed source");
                    ids.extend(resolved.iter().map(|rule| rule.id.clone()));
                    rules.extend(resolved);
                }
                Err(e) => {
                    if let Some(registry) = checkpoint {
                        self.registry = registry;
                    }
                    self.fail(PipelineError::new(name, e))?;
                }
            }
        }

        Ok(PipelineOutput {
            rules,
            skipped: self.skipped,
        })
    }
}

/// Run one source and prefix its rule ids, rejecting ids already emitted
fn resolve_source(
    name: &str,
    source: &dyn RuleSource,
    registry: &mut HandlerRegistry,
    seen: &HashSet<String>,
) -> Result<Vec<Rule>, SourceError> {
    let mut rules = source.transform(registry)?;

    for rule in &mut rules {
        rule.id = format!("{name}{ID_SEPARATOR}{}", rule.id);
        if seen.contains(&rule.id) {
            return Err(ResolveError::DuplicateIdentifier {
                rule: rule.id.clone(),
            }
            .into());
        }
    }

    Ok(rules)
}
