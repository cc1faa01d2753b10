//! Provisioning profile references
//!
//! A profile is either a bare path, or a path paired with a label (the
//! bundle identifier of the app it is embedded into, for multi-app ipas).
//! A label given without a path doubles as the path.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningProfileRef {
    /// Profile path on its own, passed as `-p <path>`
    Path(PathBuf),

    /// Labelled profile, passed as `-p <label>=<path>`, or `-p <label>` when
    /// the label is also the path
    Labeled { label: String, path: Option<PathBuf> },
}

impl ProvisioningProfileRef {
    pub fn labeled(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Labeled {
            label: label.into(),
            path: Some(path.into()),
        }
    }

    /// Parse a command-line value: `LABEL=PATH` or a bare `PATH`.
    ///
    /// Splits on the first `=`. `LABEL=` keeps the label as the path and
    /// `=PATH` is a bare path.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.split_once('=') {
            Some(("", path)) => Self::Path(PathBuf::from(path)),
            Some((label, "")) => Self::Labeled {
                label: label.to_string(),
                path: None,
            },
            Some((label, path)) => Self::labeled(label, path),
            None => Self::Path(PathBuf::from(value)),
        }
    }

    /// File that has to exist on disk for this entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Path(path) => path.as_path(),
            Self::Labeled {
                path: Some(path), ..
            } => path.as_path(),
            Self::Labeled { label, path: None } => Path::new(label),
        }
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Labeled { label, .. } => Some(label),
        }
    }
}

impl From<PathBuf> for ProvisioningProfileRef {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ProvisioningProfileRef {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Ordered profiles to embed. Order is the order given by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningProfileSet(Vec<ProvisioningProfileRef>);

impl ProvisioningProfileSet {
    #[must_use]
    pub fn new(refs: Vec<ProvisioningProfileRef>) -> Self {
        Self(refs)
    }

    /// Normalize a single profile into a one-element set
    pub fn single(profile: impl Into<ProvisioningProfileRef>) -> Self {
        Self(vec![profile.into()])
    }

    /// Build from `(label, path)` pairs, keeping their order
    pub fn from_pairs<I, L, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, P)>,
        L: Into<String>,
        P: Into<PathBuf>,
    {
        pairs
            .into_iter()
            .map(|(label, path)| ProvisioningProfileRef::labeled(label, path))
            .collect()
    }

    /// Parse repeated `-p` values
    pub fn parse_all<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values
            .into_iter()
            .map(|v| ProvisioningProfileRef::parse(v.as_ref()))
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProvisioningProfileRef> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ProvisioningProfileRef> for ProvisioningProfileSet {
    fn from(profile: ProvisioningProfileRef) -> Self {
        Self::single(profile)
    }
}

impl From<PathBuf> for ProvisioningProfileSet {
    fn from(path: PathBuf) -> Self {
        Self::single(path)
    }
}

impl From<Vec<ProvisioningProfileRef>> for ProvisioningProfileSet {
    fn from(refs: Vec<ProvisioningProfileRef>) -> Self {
        Self(refs)
    }
}

impl FromIterator<ProvisioningProfileRef> for ProvisioningProfileSet {
    fn from_iter<T: IntoIterator<Item = ProvisioningProfileRef>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ProvisioningProfileSet {
    type Item = &'a ProvisioningProfileRef;
    type IntoIter = std::slice::Iter<'a, ProvisioningProfileRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
