//! TOML rule file model

use crate::rules::HandlerDescriptor;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Root of a declarative rule file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuleFile {
    /// Domains used by entries that declare none
    pub domains: Vec<String>,

    /// Authenticator definitions, registered before any rule is resolved
    pub authenticators: BTreeMap<String, HandlerDescriptor>,

    /// Mutator definitions
    pub mutators: BTreeMap<String, HandlerDescriptor>,

    /// Error handlers appended to the run's error handler chain
    pub errors: Vec<HandlerDescriptor>,

    pub default_authenticators: Vec<String>,

    pub default_mutators: Vec<String>,

    /// Error handler names applied to entries without their own selection
    #[serde(alias = "default_error")]
    pub default_errors: Vec<String>,

    /// Only `allow` is supported
    pub default_authorizer: Option<String>,

    /// Rule entries by name, emitted in name order
    pub rules: BTreeMap<String, RuleEntry>,
}

impl RuleFile {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// One named rule
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleEntry {
    #[serde(default)]
    pub description: String,

    pub domains: Option<Vec<String>>,

    pub path: String,

    #[serde(default)]
    pub methods: Vec<String>,

    pub authenticators: Option<Vec<String>>,

    pub mutators: Option<Vec<String>>,

    pub errors: Option<Vec<String>>,

    /// Path parameter names that `{name}` placeholders may reference
    #[serde(default)]
    pub parameters: Vec<String>,
}
