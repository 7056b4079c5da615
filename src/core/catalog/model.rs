use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::descriptor::VersionState;

/// Kind of installable bundle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BundleKind {
    Profile,
    Plugin,
}

impl std::fmt::Display for BundleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundleKind::Profile => write!(f, "profile"),
            BundleKind::Plugin => write!(f, "plugin"),
        }
    }
}

/// A bundle offered by a remote catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleDescriptor {
    /// Unique catalog key.
    pub name: String,
    pub kind: BundleKind,
    /// Archive to download.
    pub source_url: String,
    /// Folder name the bundle is installed under.
    pub directory_name: String,
    /// Binary used to recognise an installed plugin.
    pub dll_name: Option<String>,
    pub remote_version: VersionState,
}

/// A bundle found on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstalledBundle {
    pub name: String,
    pub kind: BundleKind,
    pub install_path: PathBuf,
    /// Owning profile of a plugin; `None` for profiles and shared plugins.
    pub profile: Option<String>,
    pub local_version: VersionState,
}

/// Merge of the remote and local view of one bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledBundle {
    pub name: String,
    pub kind: BundleKind,
    pub installed: bool,
    pub install_path: Option<PathBuf>,
    pub profile: Option<String>,
    pub source_url: Option<String>,
    pub local_version: VersionState,
    pub remote_version: VersionState,
    pub update_available: bool,
}

/// An update is offered only when both versions are known and differ.
/// A missing local version means "installable", never "updatable".
pub fn update_available(local: &VersionState, remote: &VersionState) -> bool {
    if !local.is_present() || !remote.is_present() {
        return false;
    }
    local.as_str() != remote.as_str()
}

// ── Catalog wire formats ────────────────────────────────

/// Entry of the profile catalog: `{ "name": …, "path": … }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileEntry {
    pub name: String,
    pub path: String,
    /// Explicit archive location; defaults to `{path}.zip`.
    #[serde(default)]
    pub url: Option<String>,
}

impl ProfileEntry {
    pub fn descriptor_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.path.trim_end_matches('/'), file_name)
    }

    pub fn into_descriptor(self, remote_version: VersionState) -> BundleDescriptor {
        let source_url = self
            .url
            .unwrap_or_else(|| format!("{}.zip", self.path.trim_end_matches('/')));
        BundleDescriptor {
            directory_name: self.name.clone(),
            name: self.name,
            kind: BundleKind::Profile,
            source_url,
            dll_name: None,
            remote_version,
        }
    }
}

/// Entry of the plugin catalog: `{ "Name": "owner/repo", "DllName": … }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginEntry {
    pub name: String,
    pub dll_name: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl PluginEntry {
    /// Latest release archive of the plugin's repository under `base`
    /// (normally `https://github.com`).
    pub fn download_url(&self, base: &str) -> String {
        format!(
            "{}/{}/releases/download/latest/Plugin.zip",
            base.trim_end_matches('/'),
            self.name
        )
    }

    /// Last path segment of the repository name.
    pub fn directory_name(&self) -> String {
        self.name
            .rsplit('/')
            .next()
            .unwrap_or(&self.name)
            .to_string()
    }

    pub fn into_descriptor(self, download_base: &str) -> BundleDescriptor {
        let remote_version = match self.version.as_deref() {
            Some(v) if !v.trim().is_empty() => VersionState::Known(v.to_string()),
            _ => VersionState::Missing,
        };
        BundleDescriptor {
            source_url: self.download_url(download_base),
            directory_name: self.directory_name(),
            dll_name: Some(self.dll_name),
            name: self.name,
            kind: BundleKind::Plugin,
            remote_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::DEFAULT_PLUGIN_DOWNLOAD_BASE;

    #[test]
    fn update_requires_both_versions() {
        let known = |v: &str| VersionState::Known(v.into());

        assert!(!update_available(&VersionState::Missing, &known("2401")));
        assert!(!update_available(&known(""), &known("2401")));
        assert!(!update_available(&known("2401"), &VersionState::Missing));
        assert!(!update_available(&known("2401"), &known("2401")));
        assert!(update_available(&known("2401"), &known("2402")));
        assert!(update_available(&VersionState::Corrupt, &known("2402")));
    }

    #[test]
    fn deserialize_plugin_entry() {
        let json = r#"{ "Name": "vatSys/PluginExample", "DllName": "PluginExample.dll" }"#;
        let entry: PluginEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.directory_name(), "PluginExample");
        assert_eq!(
            entry.download_url(DEFAULT_PLUGIN_DOWNLOAD_BASE),
            "https://github.com/vatSys/PluginExample/releases/download/latest/Plugin.zip"
        );
        assert_eq!(
            entry.download_url("http://127.0.0.1:9000/"),
            "http://127.0.0.1:9000/vatSys/PluginExample/releases/download/latest/Plugin.zip"
        );

        let descriptor = entry.into_descriptor(DEFAULT_PLUGIN_DOWNLOAD_BASE);
        assert_eq!(descriptor.dll_name.as_deref(), Some("PluginExample.dll"));
        assert_eq!(descriptor.remote_version, VersionState::Missing);
    }

    #[test]
    fn profile_archive_defaults_to_path_zip() {
        let json = r#"{ "name": "Australia", "path": "https://x/profiles/Australia/" }"#;
        let entry: ProfileEntry = serde_json::from_str(json).unwrap();
        assert_eq!(
            entry.descriptor_url("Profile.xml"),
            "https://x/profiles/Australia/Profile.xml"
        );

        let descriptor = entry.into_descriptor(VersionState::Known("2401".into()));
        assert_eq!(descriptor.source_url, "https://x/profiles/Australia.zip");
        assert_eq!(descriptor.directory_name, "Australia");
    }
}
