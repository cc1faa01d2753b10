//! Configuration for the re-signing pipeline.
//!
//! Settings come from three layers, later layers winning:
//! built-in defaults, an optional TOML file, and command-line flags
//! (applied by the binary).

use crate::error::{ResignError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extension of the application archive being re-signed
pub const ARCHIVE_EXTENSION: &str = "ipa";

/// Extension of provisioning profiles
pub const PROFILE_EXTENSION: &str = "mobileprovision";

/// Signer script shipped alongside the binary
pub const SIGNER_SCRIPT_NAME: &str = "resign.sh";

/// Directory under the user config dir shared by kodegen tools
pub const CONFIG_DIR_NAME: &str = "kodegen";

/// Config file looked up when `--config` is not given
pub const CONFIG_FILE_NAME: &str = "resign.toml";

/// Configuration for a re-signing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResignConfig {
    /// Override for the signer script location
    #[serde(default)]
    pub signer_path: Option<PathBuf>,

    /// Directory scanned for ipa and provisioning profile files
    #[serde(default)]
    pub search_dir: Option<PathBuf>,

    /// Identity to try before prompting
    #[serde(default)]
    pub signing_identity: Option<String>,

    /// Upper bound on identity re-prompts; unbounded when absent
    #[serde(default)]
    pub max_identity_attempts: Option<u32>,

    /// Allow prompting on stdin for missing or invalid inputs
    #[serde(default = "default_true")]
    pub interactive: bool,
}

impl Default for ResignConfig {
    fn default() -> Self {
        Self {
            signer_path: None,
            search_dir: None,
            signing_identity: None,
            max_identity_attempts: None,
            interactive: true,
        }
    }
}

impl ResignConfig {
    /// Parse a TOML document, expanding `~` in path settings.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;

        if config.max_identity_attempts == Some(0) {
            return Err(ResignError::InvalidConfig(
                "max_identity_attempts must be at least 1".to_string(),
            ));
        }

        config.signer_path = config.signer_path.as_deref().map(expand_path).transpose()?;
        config.search_dir = config.search_dir.as_deref().map(expand_path).transpose()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ResignError::InvalidConfig(format!(
                "Cannot read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the explicit config file, else the per-user default if it exists.
    ///
    /// An explicit path that cannot be read is an error; a missing per-user
    /// file silently yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Resolved signer location: configured path or the installed default.
    pub fn signer_path(&self) -> Result<PathBuf> {
        match &self.signer_path {
            Some(path) => Ok(path.clone()),
            None => default_signer_path(),
        }
    }

    /// Resolved search directory: configured path or the working directory.
    pub fn search_dir(&self) -> Result<PathBuf> {
        match &self.search_dir {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

/// Per-user config file location (e.g. `~/.config/kodegen/resign.toml`)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Signer script location relative to the installed binary.
///
/// Installed layout is `<prefix>/bin/kodegen_resign` with the script at
/// `<prefix>/lib/assets/resign.sh`.
pub fn default_signer_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let bin_dir = exe.parent().ok_or_else(|| {
        ResignError::InvalidConfig(format!(
            "Cannot determine install directory of {}",
            exe.display()
        ))
    })?;

    Ok(bin_dir
        .join("..")
        .join("lib")
        .join("assets")
        .join(SIGNER_SCRIPT_NAME))
}

/// Expand tilde in path, returning error if HOME is not set
///
/// When HOME is unset, `shellexpand` leaves `~` unchanged; that case is
/// reported instead of producing a relative path named `~`.
pub fn expand_tilde_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::tilde(path).to_string();

    if path.starts_with('~') && expanded.starts_with('~') {
        return Err(ResignError::InvalidConfig(format!(
            "Could not expand ~ in path '{path}' (HOME environment variable not set).\n\
             Please use an absolute path instead."
        )));
    }

    Ok(PathBuf::from(expanded))
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    match path.to_str() {
        Some(s) => expand_tilde_path(s),
        None => Ok(path.to_path_buf()),
    }
}

fn default_true() -> bool {
    true
}
