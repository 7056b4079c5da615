use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the manager backend.
/// Every module returns `Result<T, ManagerError>`.
#[derive(Debug, Error)]
pub enum ManagerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── XML ─────────────────────────────────────────────
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("Invalid descriptor: {0}")]
    Descriptor(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Bundles ─────────────────────────────────────────
    #[error("Bundle not found in catalog: {0}")]
    BundleNotFound(String),

    #[error("Profile is not installed: {0}")]
    ProfileNotInstalled(String),

    #[error("Directory not configured: {0}")]
    NotConfigured(&'static str),

    // ── Host application ────────────────────────────────
    #[error("vatSys executable not found at {0:?}")]
    HostNotFound(PathBuf),

    #[error("vatSys is running")]
    HostRunning,

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Failure domain of an error, as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
    Filesystem,
    Host,
    Other,
}

impl ManagerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManagerError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ManagerError::Http(_) | ManagerError::DownloadFailed { .. } => ErrorKind::Network,
            ManagerError::Xml(_) | ManagerError::Descriptor(_) | ManagerError::Json(_) => {
                ErrorKind::Parse
            }
            ManagerError::Io { .. } | ManagerError::Zip(_) | ManagerError::ProfileNotInstalled(_) => {
                ErrorKind::Filesystem
            }
            ManagerError::HostNotFound(_) | ManagerError::HostRunning => ErrorKind::Host,
            ManagerError::BundleNotFound(_)
            | ManagerError::NotConfigured(_)
            | ManagerError::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<std::io::Error> for ManagerError {
    fn from(source: std::io::Error) -> Self {
        ManagerError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for JSON output ───────────────────────
impl serde::Serialize for ManagerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_failure_domains() {
        let status = ManagerError::DownloadFailed {
            url: "http://x/a.zip".into(),
            status: 404,
        };
        assert_eq!(status.kind(), ErrorKind::Network);
        assert!(status.to_string().contains("404"));

        let io = ManagerError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(io.kind(), ErrorKind::Filesystem);
        assert_eq!(
            ManagerError::Descriptor("no Version".into()).kind(),
            ErrorKind::Parse
        );
    }
}
