use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::model::{BundleDescriptor, PluginEntry, ProfileEntry};
use crate::core::descriptor::{VersionState, PROFILE_DESCRIPTOR};
use crate::core::error::{ManagerError, ManagerResult};

/// Default profile catalog published for vatSys.
pub const DEFAULT_PROFILES_CATALOG_URL: &str =
    "https://vatsys.sawbe.com/downloads/data/emptyprofiles/profiles.json";

/// Host serving plugin release archives.
pub const DEFAULT_PLUGIN_DOWNLOAD_BASE: &str = "https://github.com";

/// Reads the remote profile and plugin catalogs.
///
/// Catalog failures never propagate: an unreachable or malformed catalog
/// is reported as an empty list so local installs stay listable offline.
pub struct CatalogService {
    client: Client,
    profiles_url: Option<String>,
    plugins_url: Option<String>,
    plugin_download_base: String,
}

impl CatalogService {
    pub fn new(client: Client, profiles_url: Option<String>, plugins_url: Option<String>) -> Self {
        Self {
            client,
            profiles_url,
            plugins_url,
            plugin_download_base: DEFAULT_PLUGIN_DOWNLOAD_BASE.to_string(),
        }
    }

    pub fn with_plugin_download_base(mut self, base: impl Into<String>) -> Self {
        self.plugin_download_base = base.into();
        self
    }

    /// Profiles offered remotely, each with the version of its published
    /// `Profile.xml`. Entries are resolved one after another.
    pub async fn list_remote_profiles(&self) -> Vec<BundleDescriptor> {
        let entries = self.profile_entries().await;
        let mut profiles = Vec::with_capacity(entries.len());
        for entry in entries {
            profiles.push(self.resolve_profile(entry).await);
        }

        info!("Loaded {} profiles from catalog", profiles.len());
        profiles
    }

    /// The catalog profile called `name`, resolving only its own descriptor.
    pub async fn find_remote_profile(&self, name: &str) -> Option<BundleDescriptor> {
        let entry = self
            .profile_entries()
            .await
            .into_iter()
            .find(|entry| entry.name == name)?;
        Some(self.resolve_profile(entry).await)
    }

    /// Plugins offered remotely.
    pub async fn list_remote_plugins(&self) -> Vec<BundleDescriptor> {
        let Some(url) = self.plugins_url.as_deref() else {
            return Vec::new();
        };
        match self.fetch_catalog::<PluginEntry>(url).await {
            Ok(entries) => {
                info!("Loaded {} plugins from catalog", entries.len());
                entries
                    .into_iter()
                    .map(|entry| entry.into_descriptor(&self.plugin_download_base))
                    .collect()
            }
            Err(e) => {
                warn!("Plugin catalog unavailable: {}", e);
                Vec::new()
            }
        }
    }

    async fn profile_entries(&self) -> Vec<ProfileEntry> {
        let Some(url) = self.profiles_url.as_deref() else {
            return Vec::new();
        };
        match self.fetch_catalog(url).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Profile catalog unavailable: {}", e);
                Vec::new()
            }
        }
    }

    async fn resolve_profile(&self, entry: ProfileEntry) -> BundleDescriptor {
        let descriptor_url = entry.descriptor_url(PROFILE_DESCRIPTOR);
        let remote_version = self.fetch_remote_version(&descriptor_url).await;
        entry.into_descriptor(remote_version)
    }

    async fn fetch_catalog<T: DeserializeOwned>(&self, url: &str) -> ManagerResult<Vec<T>> {
        let body = self.fetch_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_remote_version(&self, url: &str) -> VersionState {
        match self.fetch_text(url).await {
            Ok(contents) => VersionState::from_descriptor(&contents),
            Err(e) => {
                warn!("Cannot fetch descriptor {}: {}", url, e);
                VersionState::Corrupt
            }
        }
    }

    async fn fetch_text(&self, url: &str) -> ManagerResult<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
