use std::path::Path;

use serde::{Serialize, Serializer};
use tracing::warn;

use super::profile::resolve_version;

/// Marker shown in place of a version whose descriptor could not be parsed.
pub const ERROR_MARKER: &str = "ERROR";

/// Version of a bundle as far as it could be determined.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionState {
    /// No descriptor to read.
    #[default]
    Missing,
    Known(String),
    /// Descriptor exists but is unreadable or malformed.
    Corrupt,
}

impl VersionState {
    /// Resolve descriptor contents, downgrading failures to `Corrupt`.
    pub fn from_descriptor(contents: &str) -> Self {
        match resolve_version(contents) {
            Ok(version) => VersionState::Known(version),
            Err(e) => {
                warn!("Unparseable descriptor: {}", e);
                VersionState::Corrupt
            }
        }
    }

    /// Displayed value: the version, the error marker, or nothing.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VersionState::Missing => None,
            VersionState::Known(v) => Some(v),
            VersionState::Corrupt => Some(ERROR_MARKER),
        }
    }

    pub fn is_present(&self) -> bool {
        self.as_str().is_some_and(|v| !v.trim().is_empty())
    }
}

impl std::fmt::Display for VersionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().unwrap_or("-"))
    }
}

impl Serialize for VersionState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.as_str() {
            Some(v) => serializer.serialize_str(v),
            None => serializer.serialize_none(),
        }
    }
}

/// Read `file_name` inside `dir` and resolve its version.
///
/// A missing file is `Missing`; any read or parse failure is `Corrupt`.
pub async fn read_descriptor_version(dir: &Path, file_name: &str) -> VersionState {
    let path = dir.join(file_name);
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => VersionState::from_descriptor(&contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => VersionState::Missing,
        Err(e) => {
            warn!("Cannot read {:?}: {}", path, e);
            VersionState::Corrupt
        }
    }
}
