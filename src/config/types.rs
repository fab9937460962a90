//! Configuration types for rulesmith
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::rules::HandlerDescriptor;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Handlers available to every source
    pub gateway: GatewayConfig,

    /// Sources, processed in the listed order
    pub sources: Vec<SourceConfig>,

    /// Pipeline behaviour
    pub pipeline: PipelineConfig,

    /// Output settings
    pub output: OutputConfig,
}

/// Handlers pre-seeded into the registry before any source runs
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Authenticators by name
    pub authenticators: HashMap<String, HandlerDescriptor>,

    /// Mutators by name
    pub mutators: HashMap<String, HandlerDescriptor>,

    /// Error handler chain attached to rules without an explicit selection
    pub errors: Vec<HandlerDescriptor>,
}

/// One configured source document
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Source name, used as the rule id prefix (`<name>:<id>`)
    pub name: String,

    /// Document format
    pub kind: SourceKind,

    /// Path to the document; relative paths are resolved against the config file
    pub file: PathBuf,

    /// Domains matched by the generated rules
    #[serde(default)]
    pub domains: Vec<String>,
}

/// Source document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// OpenAPI3 document (JSON or YAML) with vendor extensions
    #[serde(alias = "oas3")]
    OpenApi,
    /// TOML rule file
    #[serde(alias = "toml")]
    Declarative,
}

impl SourceKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SourceKind::OpenApi => "openapi",
            SourceKind::Declarative => "declarative",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// What to do when a source fails
    pub on_error: ErrorPolicy,
}

/// Failure handling for a source that cannot be transformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the run at the first failing source (default)
    #[default]
    Abort,
    /// Skip the failing source and keep going
    Continue,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print the JSON output
    pub pretty: bool,

    /// Write to this file instead of stdout
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.sources.is_empty());
        assert!(config.gateway.errors.is_empty());
        assert_eq!(config.pipeline.on_error, ErrorPolicy::Abort);
        assert!(!config.output.pretty);
        assert!(config.output.path.is_none());
    }

    #[test]
    fn test_deserialize_source_kind() {
        let kind: SourceKind = serde_json::from_str(r#""openapi""#).unwrap();
        assert_eq!(kind, SourceKind::OpenApi);

        let kind: SourceKind = serde_json::from_str(r#""oas3""#).unwrap();
        assert_eq!(kind, SourceKind::OpenApi);

        let kind: SourceKind = serde_json::from_str(r#""declarative""#).unwrap();
        assert_eq!(kind, SourceKind::Declarative);

        let kind: SourceKind = serde_json::from_str(r#""toml""#).unwrap();
        assert_eq!(kind, SourceKind::Declarative);

        assert!(serde_json::from_str::<SourceKind>(r#""graphql""#).is_err());
    }

    #[test]
    fn test_deserialize_error_policy() {
        let policy: ErrorPolicy = serde_json::from_str(r#""continue""#).unwrap();
        assert_eq!(policy, ErrorPolicy::Continue);

        let policy: ErrorPolicy = serde_json::from_str(r#""abort""#).unwrap();
        assert_eq!(policy, ErrorPolicy::Abort);
    }
}
