//! Rulesmith
//!
//! Generates access rules for an Oathkeeper-style reverse-proxy gateway from
//! OpenAPI3 documents and declarative TOML rule files.
//!
//! ## Features
//!
//! - **OpenAPI3 sources** (JSON or YAML) annotated with `x-oathkeeper-*` vendor extensions
//! - **Declarative sources** for endpoints that have no OpenAPI description
//! - **Shared handler registry** so handlers declared once are reusable by later sources
//! - **Deterministic output**: sorted paths, fixed method order, source-prefixed rule ids
//!
//! ## Pipeline
//!
//! ```text
//! [gateway] config → source 1 → source 2 → ... → JSON rule array
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [gateway.authenticators.bearer]
//! handler = "jwt"
//!
//! [[gateway.errors]]
//! handler = "json"
//!
//! [[sources]]
//! name = "admin"
//! kind = "declarative"
//! file = "admin.toml"
//! domains = ["https://admin.example.com"]
//!
//! [[sources]]
//! name = "petstore"
//! kind = "openapi"
//! file = "petstore.yaml"
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod rules;
pub mod sources;

// Re-export main types
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use pipeline::{Pipeline, PipelineOutput};
pub use rules::{HandlerDescriptor, HandlerKind, HandlerRegistry, Rule};
pub use sources::RuleSource;

/// Load every configured source and resolve it into rules
pub fn generate(config: &AppConfig) -> Result<PipelineOutput> {
    let output = Pipeline::from_config(config)?.run()?;
    Ok(output)
}
