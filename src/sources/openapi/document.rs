//! OpenAPI3 document model
//!
//! Only the parts of the document that influence rule generation are
//! modelled; everything else is skipped during deserialization.

use crate::rules::HttpMethod;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One security requirement: scheme name → scopes, in document order
pub type SecurityRequirement = serde_json::Map<String, Value>;

/// Root of an OpenAPI3 document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenApiDocument {
    /// Declared OpenAPI version (e.g. `3.0.3`)
    #[serde(default)]
    pub openapi: String,

    #[serde(default)]
    pub info: Info,

    #[serde(default)]
    pub servers: Vec<Server>,

    /// Paths, iterated in lexicographic order
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,

    #[serde(default)]
    pub components: Components,

    /// Document-level security requirements
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl OpenApiDocument {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Check whether the declared version is OpenAPI 3.x
    pub fn is_supported_version(&self) -> bool {
        self.openapi.starts_with("3.")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub url: String,
}

/// Operations and shared parameters of one path
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub post: Option<Operation>,
    pub put: Option<Operation>,
    pub patch: Option<Operation>,
    pub delete: Option<Operation>,

    // Methods that never produce rules
    head: Option<IgnoredAny>,
    options: Option<IgnoredAny>,
    trace: Option<IgnoredAny>,

    /// Parameters shared by every operation on this path
    #[serde(default)]
    pub parameters: Vec<ParameterOrReference>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
        }
    }

    /// Operations present on this path, in [`HttpMethod::PRIORITY`] order
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> + '_ {
        HttpMethod::PRIORITY
            .into_iter()
            .filter_map(move |method| self.operation(method).map(|op| (method, op)))
    }

    /// Declared methods that are ignored during rule generation
    pub fn unsupported_methods(&self) -> Vec<&'static str> {
        [
            ("HEAD", self.head.is_some()),
            ("OPTIONS", self.options.is_some()),
            ("TRACE", self.trace.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,

    pub summary: Option<String>,

    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterOrReference>,

    /// Operation-level security requirements
    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Operation {
    /// Description, falling back to the summary
    pub fn describe(&self) -> &str {
        [self.description.as_deref(), self.summary.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }
}

/// An inline parameter or a `$ref` to one in `components.parameters`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrReference {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Parameter(Parameter),
}

impl ParameterOrReference {
    pub fn reference(&self) -> Option<&str> {
        match self {
            ParameterOrReference::Reference { reference } => Some(reference.as_str()),
            ParameterOrReference::Parameter(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

const PARAMETER_REF_PREFIX: &str = "#/components/parameters/";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Components {
    #[serde(default, rename = "securitySchemes")]
    pub security_schemes: BTreeMap<String, SecurityScheme>,

    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterOrReference>,

    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Components {
    /// Resolve an inline parameter or a local `#/components/parameters/...` reference
    pub fn resolve_parameter<'a>(
        &'a self,
        parameter: &'a ParameterOrReference,
    ) -> Option<&'a Parameter> {
        match parameter {
            ParameterOrReference::Parameter(p) => Some(p),
            ParameterOrReference::Reference { reference } => {
                let name = reference.strip_prefix(PARAMETER_REF_PREFIX)?;
                match self.parameters.get(name)? {
                    ParameterOrReference::Parameter(p) => Some(p),
                    ParameterOrReference::Reference { .. } => None,
                }
            }
        }
    }
}

/// Security scheme; only its vendor extensions matter here
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityScheme {
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Vendor extensions (`x-*` keys) of a document node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions(BTreeMap<String, Value>);

impl Extensions {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }
}

impl<'de> Deserialize<'de> for Extensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ExtensionsVisitor;

        impl<'de> Visitor<'de> for ExtensionsVisitor {
            type Value = Extensions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of vendor extensions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Extensions, A::Error> {
                let mut extensions = BTreeMap::new();
                while let Some(key) = map.next_key::<String>()? {
                    if key.starts_with("x-") {
                        extensions.insert(key, map.next_value::<Value>()?);
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                Ok(Extensions(extensions))
            }
        }

        deserializer.deserialize_map(ExtensionsVisitor)
    }
}
