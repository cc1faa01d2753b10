//! Fully resolved and validated signing inputs

use crate::identity::SigningIdentity;
use crate::profile::ProvisioningProfileSet;
use std::path::{Path, PathBuf};

/// Inputs for exactly one signer invocation.
///
/// Only [`crate::validation::validate_request`] creates these, after every
/// path has been checked, so holding one means the archive and every
/// profile existed with the right extension and the identity was installed
/// when they were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    archive: PathBuf,
    identity: SigningIdentity,
    profiles: ProvisioningProfileSet,
}

impl SigningRequest {
    pub(crate) fn validated(
        archive: PathBuf,
        identity: SigningIdentity,
        profiles: ProvisioningProfileSet,
    ) -> Self {
        Self {
            archive,
            identity,
            profiles,
        }
    }

    #[must_use]
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    #[must_use]
    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    #[must_use]
    pub fn profiles(&self) -> &ProvisioningProfileSet {
        &self.profiles
    }
}
