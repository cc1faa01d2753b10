//! Checks run on every resolved input before the signer is started
//!
//! Order is fixed and the first failure aborts the run: signer script,
//! then the ipa, then each provisioning profile in the order given.

use crate::config::{ARCHIVE_EXTENSION, PROFILE_EXTENSION};
use crate::error::{ResignError, Result};
use crate::identity::SigningIdentity;
use crate::profile::ProvisioningProfileSet;
use crate::request::SigningRequest;
use std::path::{Path, PathBuf};

/// The signer script must be installed where the package put it
pub fn validate_signer_tool(signer: &Path) -> Result<()> {
    if !signer.exists() {
        return Err(ResignError::MissingTool(signer.to_path_buf()));
    }
    Ok(())
}

/// Path must end in `.ipa` and exist
pub fn validate_archive(archive: &Path) -> Result<()> {
    if !(has_extension(archive, ARCHIVE_EXTENSION) && archive.exists()) {
        return Err(ResignError::InvalidArchive(archive.to_path_buf()));
    }
    Ok(())
}

/// Path must end in `.mobileprovision` and exist
pub fn validate_profile(profile: &Path) -> Result<()> {
    if !(has_extension(profile, PROFILE_EXTENSION) && profile.exists()) {
        return Err(ResignError::InvalidProfile(profile.to_path_buf()));
    }
    Ok(())
}

/// Validate every input and, only if all pass, build the request.
///
/// # Returns
/// * `Ok(SigningRequest)` - All inputs valid
/// * `Err(ResignError::MissingTool)` - Signer script not installed
/// * `Err(ResignError::InvalidArchive)` - Bad ipa path
/// * `Err(ResignError::InvalidConfig)` - No provisioning profile at all
/// * `Err(ResignError::InvalidProfile)` - First bad profile path
pub fn validate_request(
    signer: &Path,
    archive: PathBuf,
    identity: SigningIdentity,
    profiles: ProvisioningProfileSet,
) -> Result<SigningRequest> {
    validate_signer_tool(signer)?;
    validate_archive(&archive)?;

    if profiles.is_empty() {
        return Err(ResignError::InvalidConfig(
            "At least one provisioning profile is required".to_string(),
        ));
    }
    for profile in &profiles {
        validate_profile(profile.path())?;
    }

    Ok(SigningRequest::validated(archive, identity, profiles))
}

/// File name ends in `.<extension>`; a bare `.ipa` counts, `App.IPA` does not
pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(extension))
        .is_some_and(|stem| stem.ends_with('.'))
}
