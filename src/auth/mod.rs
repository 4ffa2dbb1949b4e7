//! Authentication and authorization module

pub mod guard;
pub mod password;
pub mod policy;
pub mod resolver;
pub mod token;
pub mod user;

// Re-export main components
pub use guard::{optional_identity, require_identity, require_role};
pub use policy::{allowed, authorize, evaluate, Action, Decision, Resource};
pub use resolver::{extract_credential, IdentityResolver};
pub use token::{Claims, TokenCodec, Verification};
pub use user::{Identity, UserRole};
