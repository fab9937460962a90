//! Rule model
//!
//! The gateway rule records produced by a run, the shared handler registry
//! they are resolved against, and the URL pattern builder.
//!
//! ## Handler resolution
//!
//! Handler names referenced by a rule are looked up in the registry at the
//! moment the rule is built. The registry is seeded from `[gateway]` in the
//! configuration and then enriched by every source in configured order:
//!
//! ```text
//! config [gateway] → source 1 definitions → source 2 definitions → ...
//! ```
//!
//! A name that is not defined by then is an error for the owning source.
//!
//! ## Example Output
//!
//! ```json
//! {
//!   "id": "petstore:showPetById",
//!   "description": "Info for a specific pet",
//!   "match": {
//!     "url": "https://api.example.com/pets/<[a-zA-Z0-9-_%]*>",
//!     "methods": ["GET"]
//!   },
//!   "authenticators": [{ "handler": "jwt" }],
//!   "authorizer": { "handler": "allow" },
//!   "mutators": [{ "handler": "id_token" }],
//!   "errors": [{ "handler": "json" }]
//! }
//! ```

pub mod patterns;
pub mod registry;
pub mod types;

pub use patterns::{PARAMETER_WILDCARD, build_domain_prefix, build_path_matcher, build_url_pattern};
pub use registry::{HandlerKind, HandlerRegistry};
pub use types::{ALLOW_AUTHORIZER, HandlerDescriptor, HttpMethod, Rule, RuleMatch};
