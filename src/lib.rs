//! Re-signing of existing ipa files
//!
//! Resolves the three inputs of a re-sign (the ipa, a signing identity
//! installed on this machine, and the provisioning profiles to embed),
//! validates them, and hands them to the bundled `resign.sh` script which
//! does the actual code signing.
//!
//! # Module Organization
//!
//! - `identity` - Installed identities and identity negotiation
//! - `locator` - Discovery of ipa / profile files
//! - `validation` - Input checks, in fixed order
//! - `signer` - Building and running the signer invocation
//! - `resign` - The orchestration tying them together
//! - `prompt` / `report` - Operator interaction and output

pub mod config;
pub mod error;
pub mod identity;
pub mod locator;
pub mod profile;
pub mod prompt;
pub mod report;
pub mod request;
pub mod resign;
pub mod signer;
pub mod validation;

// Re-export common types
pub use config::ResignConfig;
pub use error::{ResignError, Result};
pub use identity::{IdentityRegistry, SecurityIdentityRegistry, SigningIdentity};
pub use profile::{ProvisioningProfileRef, ProvisioningProfileSet};
pub use request::SigningRequest;
pub use resign::{ResignInputs, ResignSettings, Resigner};
pub use signer::{InvocationResult, ProcessRunner, SignerInvocation, SystemRunner};
