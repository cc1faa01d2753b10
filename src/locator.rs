//! Discovery of ipa and provisioning profile files in a directory

use crate::config::{ARCHIVE_EXTENSION, PROFILE_EXTENSION};
use crate::error::Result;
use crate::validation::has_extension;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Most recently modified regular file in `dir` with the given extension.
///
/// The scan is not recursive and the file name must end in exactly
/// `.<extension>` (`"ipa"` matches `App.ipa`, not `App.IPA` or
/// `App.ipa.bak`). Equal modification times are broken by path ordering,
/// greatest path wins.
///
/// # Returns
/// * `Ok(Some(path))` - Newest matching file
/// * `Ok(None)` - No matching file
/// * `Err(ResignError::Io)` - `dir` could not be read
pub fn find_latest_by_extension(dir: &Path, extension: &str) -> Result<Option<PathBuf>> {
    let mut latest: Option<(SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if !has_extension(&path, extension) {
            continue;
        }

        // follows symlinks, a link to an ipa counts as an ipa
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            // removed or dangling while scanning
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            continue;
        }

        let modified = metadata.modified()?;
        let is_newer = match &latest {
            None => true,
            Some((time, current)) => (modified, &path) > (*time, current),
        };

        if is_newer {
            latest = Some((modified, path));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

/// Newest `*.ipa` in `dir`
pub fn find_archive(dir: &Path) -> Result<Option<PathBuf>> {
    find_latest_by_extension(dir, ARCHIVE_EXTENSION)
}

/// Newest `*.mobileprovision` in `dir`
pub fn find_provisioning_profile(dir: &Path) -> Result<Option<PathBuf>> {
    find_latest_by_extension(dir, PROFILE_EXTENSION)
}
