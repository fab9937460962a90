//! Error types for rulesmith
//!
//! This module defines the error hierarchy used throughout the application.
//! Resolution failures are values all the way up to the pipeline, which
//! decides whether a failing source aborts the run.

use crate::rules::HandlerKind;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A handler name that is not present in the registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no {kind} named '{name}'")]
pub struct HandlerNotFound {
    pub kind: HandlerKind,
    pub name: String,
}

impl HandlerNotFound {
    /// Attach the id of the rule that referenced the missing handler
    pub fn for_rule(self, rule: impl Into<String>) -> ResolveError {
        ResolveError::UnresolvedHandler {
            rule: rule.into(),
            kind: self.kind,
            name: self.name,
        }
    }
}

/// Errors raised while turning a parsed document into rules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("operation {method} '{path}' has no operationId")]
    MissingIdentifier { path: String, method: String },

    #[error("rule '{rule}' references unknown {kind} '{name}'")]
    UnresolvedHandler {
        rule: String,
        kind: HandlerKind,
        name: String,
    },

    #[error("rule '{rule}': path '{path}' uses parameter '{parameter}' which is not declared")]
    UndeclaredPathParameter {
        rule: String,
        path: String,
        parameter: String,
    },

    #[error("invalid '{extension}' at {location}: {reason}")]
    InvalidExtension {
        location: String,
        extension: String,
        reason: String,
    },

    #[error("rule '{rule}' references unknown parameter '{reference}'")]
    UnresolvedReference { rule: String, reference: String },

    #[error("rule id '{rule}' is used more than once")]
    DuplicateIdentifier { rule: String },

    #[error("rule '{rule}' has no domains to match")]
    MissingDomains { rule: String },

    #[error("rule '{rule}' is invalid: {reason}")]
    InvalidRule { rule: String, reason: String },
}

/// Errors raised by a single source (reading, parsing or resolving)
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("'{}' declares OpenAPI version '{version}', only 3.x is supported", path.display())]
    UnsupportedVersion { path: PathBuf, version: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// A source failure, tagged with the configured source name
#[derive(Error, Debug)]
#[error("source '{source_name}': {error}")]
pub struct PipelineError {
    pub source_name: String,
    #[source]
    pub error: SourceError,
}

impl PipelineError {
    pub fn new(source_name: impl Into<String>, error: impl Into<SourceError>) -> Self {
        Self {
            source_name: source_name.into(),
            error: error.into(),
        }
    }

    /// The underlying resolution error, if the source failed while resolving
    pub fn resolve_error(&self) -> Option<&ResolveError> {
        match &self.error {
            SourceError::Resolve(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors writing the final rule set
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for rule resolution
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
