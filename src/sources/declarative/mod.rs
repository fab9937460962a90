//! Declarative TOML source adapter
//!
//! ```toml
//! domains = ["https://admin.example.com"]
//! default_authenticators = ["session"]
//!
//! [authenticators.session]
//! handler = "cookie_session"
//!
//! [rules.users]
//! path = "/users/{userId}"
//! methods = ["GET", "DELETE"]
//! parameters = ["userId"]
//! ```

pub mod document;
pub mod transformer;

pub use document::{RuleEntry, RuleFile};
pub use transformer::DeclarativeSource;
