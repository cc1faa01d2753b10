//! Signing identity lookup and negotiation
//!
//! - `registry` - Query the host for installed code signing identities
//! - `resolver` - Negotiate a candidate identity against that list

pub mod registry;
pub mod resolver;

pub use registry::{IdentityRegistry, SecurityIdentityRegistry, parse_identities};
pub use resolver::{IdentityResolver, SigningIdentity};
