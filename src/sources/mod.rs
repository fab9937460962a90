//! Source adapters
//!
//! A source turns one parsed document into rules, defining the handlers it
//! declares in the shared [`HandlerRegistry`] on the way. Reading and
//! parsing happen in [`load_source`], before any registry is touched.

pub mod declarative;
pub mod openapi;

pub use crate::config::SourceKind;
pub use declarative::DeclarativeSource;
pub use openapi::OpenApiSource;

use crate::config::SourceConfig;
use crate::error::{ResolveResult, SourceError};
use crate::rules::{HandlerRegistry, Rule};
use std::fs;
use tracing::debug;

/// A parsed document that can be resolved into rules
pub trait RuleSource: std::fmt::Debug {
    /// Document format of this source
    fn kind(&self) -> SourceKind;

    /// Define this source's handlers and build its rules.
    ///
    /// Rule ids are returned unprefixed. On error the registry may hold
    /// partial definitions from this source.
    fn transform(&self, registry: &mut HandlerRegistry) -> ResolveResult<Vec<Rule>>;
}

/// Read and parse the document of a configured source
pub fn load_source(config: &SourceConfig) -> Result<Box<dyn RuleSource>, SourceError> {
    debug!(source = %config.name, kind = %config.kind, path = %config.file.display(), "Loading source");

    let content = fs::read_to_string(&config.file).map_err(|source| SourceError::Read {
        path: config.file.clone(),
        source,
    })?;

    let source: Box<dyn RuleSource> = match config.kind {
        SourceKind::OpenApi => Box::new(OpenApiSource::parse(
            &config.file,
            &content,
            config.domains.clone(),
        )?),
        SourceKind::Declarative => Box::new(DeclarativeSource::parse(
            &config.file,
            &content,
            config.domains.clone(),
        )?),
    };

    Ok(source)
}

/// The local list when present and non-empty, otherwise the default
pub(crate) fn local_or_default<'a, T>(local: Option<&'a [T]>, default: &'a [T]) -> &'a [T] {
    match local {
        Some(items) if !items.is_empty() => items,
        _ => default,
    }
}
