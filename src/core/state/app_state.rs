use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::catalog::{
    CatalogService, DEFAULT_PLUGIN_DOWNLOAD_BASE, DEFAULT_PROFILES_CATALOG_URL, WORKING_DIR_NAME,
};
use crate::core::error::{ManagerError, ManagerResult};
use crate::core::filesystem::LocalDirectories;
use crate::core::host::HostApplication;
use crate::core::http::build_http_client;
use crate::core::workflow::Workflow;

const APP_DIR_NAME: &str = "vatSysManager";
const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// User settings, persisted as JSON next to the other app data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// vatSys install root (contains `bin/vatSys.exe`).
    pub base_directory: Option<PathBuf>,
    /// Content root holding one folder per profile.
    pub profile_directory: Option<PathBuf>,
    pub profiles_catalog_url: Option<String>,
    pub plugins_catalog_url: Option<String>,
    /// Host of plugin release archives (`{base}/{Name}/releases/...`).
    pub plugin_download_base: String,
    /// Per-request timeout; `0` disables it.
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            profile_directory: default_profile_directory(),
            profiles_catalog_url: Some(DEFAULT_PROFILES_CATALOG_URL.to_string()),
            plugins_catalog_url: None,
            plugin_download_base: DEFAULT_PLUGIN_DOWNLOAD_BASE.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Corrupt settings at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> ManagerResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ManagerError::io(parent, source))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ManagerError::io(path, source))
    }

    fn http_timeout(&self) -> Option<Duration> {
        (self.http_timeout_secs > 0).then(|| Duration::from_secs(self.http_timeout_secs))
    }
}

/// Default location of the settings file.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(SETTINGS_FILE)
}

fn default_profile_directory() -> Option<PathBuf> {
    let dir = dirs::document_dir()?.join("vatSys Files").join("Profiles");
    dir.is_dir().then_some(dir)
}

fn default_base_directory() -> Option<PathBuf> {
    let dir = PathBuf::from(r"C:\Program Files (x86)\vatSys");
    dir.is_dir().then_some(dir)
}

/// Everything a command needs, built once at startup and passed explicitly.
pub struct AppContext {
    pub settings: Settings,
    pub http_client: Client,
    /// Guards the shared working directory across workflow runs.
    workflow_lock: Arc<Mutex<()>>,
}

impl AppContext {
    pub fn new(settings: Settings) -> ManagerResult<Self> {
        let http_client = build_http_client(settings.http_timeout())?;
        debug!("Context ready: {:?}", settings);
        Ok(Self {
            settings,
            http_client,
            workflow_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn profile_directory(&self) -> ManagerResult<&Path> {
        self.settings
            .profile_directory
            .as_deref()
            .ok_or(ManagerError::NotConfigured("profile directory"))
    }

    pub fn base_directory(&self) -> ManagerResult<&Path> {
        self.settings
            .base_directory
            .as_deref()
            .ok_or(ManagerError::NotConfigured("base directory"))
    }

    /// Scratch space for downloads: `{profile_directory}/.working`.
    pub fn working_dir(&self) -> ManagerResult<PathBuf> {
        Ok(self.profile_directory()?.join(WORKING_DIR_NAME))
    }

    pub fn host(&self) -> ManagerResult<HostApplication> {
        Ok(HostApplication::new(self.base_directory()?.to_path_buf()))
    }

    /// Shared plugin folder, when the base directory is configured.
    pub fn shared_plugin_dir(&self) -> Option<PathBuf> {
        self.host().ok().map(|host| host.shared_plugin_dir())
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(
            self.http_client.clone(),
            self.settings.profiles_catalog_url.clone(),
            self.settings.plugins_catalog_url.clone(),
        )
        .with_plugin_download_base(self.settings.plugin_download_base.clone())
    }

    pub fn workflow(&self) -> ManagerResult<Workflow> {
        Ok(Workflow::new(
            LocalDirectories,
            self.http_client.clone(),
            self.working_dir()?,
            Arc::clone(&self.workflow_lock),
        ))
    }
}
