use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::model::{BundleDescriptor, BundleKind, InstalledBundle};
use super::{PLUGINS_DIR_NAME, WORKING_DIR_NAME};
use crate::core::descriptor::{read_descriptor_version, PLUGIN_DESCRIPTOR, PROFILE_DESCRIPTOR};

/// Installed profiles: every directory under `root` except the working directory.
///
/// A missing root yields an empty list; a missing `Profile.xml` a missing version.
pub async fn list_installed_profiles(root: &Path) -> Vec<InstalledBundle> {
    let mut profiles = Vec::new();
    for dir in profile_directories(root).await {
        let name = dir_name(&dir);
        let local_version = read_descriptor_version(&dir, PROFILE_DESCRIPTOR).await;
        profiles.push(InstalledBundle {
            name,
            kind: BundleKind::Profile,
            install_path: dir,
            profile: None,
            local_version,
        });
    }
    profiles
}

/// Installed plugins, found in every profile's `Plugins` folder and in the
/// shared plugin directory.
///
/// A plugin folder is attributed to the first catalog entry whose DLL name
/// matches a file inside it. Folders matching no entry are skipped.
pub async fn list_installed_plugins(
    content_root: &Path,
    shared_plugin_dir: Option<&Path>,
    catalog: &[BundleDescriptor],
) -> Vec<InstalledBundle> {
    let mut plugins = Vec::new();

    for profile_dir in profile_directories(content_root).await {
        let profile = dir_name(&profile_dir);
        let plugins_dir = profile_dir.join(PLUGINS_DIR_NAME);
        scan_plugin_dir(&plugins_dir, Some(profile.as_str()), catalog, &mut plugins).await;
    }

    if let Some(shared) = shared_plugin_dir {
        scan_plugin_dir(shared, None, catalog, &mut plugins).await;
    }

    plugins
}

async fn scan_plugin_dir(
    plugins_dir: &Path,
    profile: Option<&str>,
    catalog: &[BundleDescriptor],
    out: &mut Vec<InstalledBundle>,
) {
    for candidate in subdirectories(plugins_dir).await {
        let files = file_names(&candidate).await;
        let Some(entry) = attribute_plugin(&files, catalog) else {
            debug!("No catalog plugin matches {:?}", candidate);
            continue;
        };

        let local_version = read_descriptor_version(&candidate, PLUGIN_DESCRIPTOR).await;
        out.push(InstalledBundle {
            name: entry.name.clone(),
            kind: BundleKind::Plugin,
            install_path: candidate,
            profile: profile.map(str::to_string),
            local_version,
        });
    }
}

/// First catalog entry whose DLL name is among `files` (ASCII case-insensitive).
///
/// Two entries sharing a DLL name are ambiguous; catalog order decides.
pub fn attribute_plugin<'a>(
    files: &[String],
    catalog: &'a [BundleDescriptor],
) -> Option<&'a BundleDescriptor> {
    catalog.iter().find(|entry| {
        entry
            .dll_name
            .as_deref()
            .is_some_and(|dll| files.iter().any(|f| f.eq_ignore_ascii_case(dll)))
    })
}

async fn profile_directories(root: &Path) -> Vec<PathBuf> {
    let mut dirs = subdirectories(root).await;
    dirs.retain(|d| d.file_name().and_then(|n| n.to_str()) != Some(WORKING_DIR_NAME));
    dirs
}

/// Immediate subdirectories of `dir`, sorted; empty when `dir` is unreadable.
async fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Cannot read {:?}: {}", dir, e);
            }
            return found;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.is_dir() {
            found.push(path);
        }
    }

    found.sort();
    found
}

async fn file_names(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return names;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.path().is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
