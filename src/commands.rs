use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::core::catalog::{
    list_installed_plugins, list_installed_profiles, reconcile, BundleDescriptor,
    ReconciledBundle, PLUGINS_DIR_NAME, WORKING_DIR_NAME,
};
use crate::core::error::{ManagerError, ManagerResult};
use crate::core::state::AppContext;
use crate::core::workflow::WorkflowReport;

/// Where a plugin gets installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginTarget {
    /// `{profiles}/{profile}/Plugins`
    Profile(String),
    /// `{base}/bin/Plugins`, loaded for every profile.
    Shared,
}

/// A user-triggered action on a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    InstallProfile(String),
    UpdateProfile(String),
    DeleteProfile(String),
    InstallPlugin { name: String, target: PluginTarget },
    /// `directory` is the plugin folder found by the listing.
    UpdatePlugin { name: String, directory: PathBuf },
    DeletePlugin(PathBuf),
}

#[derive(Debug, Serialize)]
pub struct HostStatus {
    pub base_directory: Option<String>,
    pub profile_directory: Option<String>,
    pub executable_found: bool,
    pub running: bool,
}

// ── Listings ────────────────────────────────────────────

/// Installed profiles merged with the remote catalog.
pub async fn list_profiles(ctx: &AppContext) -> ManagerResult<Vec<ReconciledBundle>> {
    let root = ctx.profile_directory()?;
    let installed = list_installed_profiles(root).await;
    let remote = ctx.catalog().list_remote_profiles().await;
    Ok(reconcile(&remote, &installed))
}

/// Installed plugins (per profile and shared) merged with the remote catalog.
pub async fn list_plugins(ctx: &AppContext) -> ManagerResult<Vec<ReconciledBundle>> {
    let root = ctx.profile_directory()?;
    let remote = ctx.catalog().list_remote_plugins().await;
    let shared = ctx.shared_plugin_dir();
    let installed = list_installed_plugins(root, shared.as_deref(), &remote).await;
    Ok(reconcile(&remote, &installed))
}

pub fn host_status(ctx: &AppContext) -> HostStatus {
    let host = ctx.host().ok();
    HostStatus {
        base_directory: display(ctx.settings.base_directory.as_deref()),
        profile_directory: display(ctx.settings.profile_directory.as_deref()),
        executable_found: host.as_ref().is_some_and(|h| h.executable().is_file()),
        running: host.as_ref().is_some_and(|h| h.is_running()),
    }
}

fn display(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.to_string_lossy().to_string())
}

// ── Dispatch ────────────────────────────────────────────

/// Run `command` to completion.
///
/// Lookup problems (unknown bundle, unconfigured directory) are errors;
/// everything that happens once the workflow starts is in the report.
pub async fn execute(ctx: &AppContext, command: Command) -> ManagerResult<WorkflowReport> {
    info!("Executing {:?}", command);
    let workflow = ctx.workflow()?;

    let report = match command {
        Command::InstallProfile(name) => {
            let bundle = find_remote_profile(ctx, &name).await?;
            let root = ctx.profile_directory()?;
            bundle_dir(root, &bundle.directory_name)?;
            workflow.install(&bundle, root).await
        }
        Command::UpdateProfile(name) => {
            let bundle = find_remote_profile(ctx, &name).await?;
            let root = ctx.profile_directory()?;
            bundle_dir(root, &bundle.directory_name)?;
            workflow.update(&bundle, root).await
        }
        Command::DeleteProfile(name) => {
            let dir = bundle_dir(ctx.profile_directory()?, &name)?;
            workflow.delete(&dir).await
        }
        Command::InstallPlugin { name, target } => {
            let bundle = find_remote_plugin(ctx, &name).await?;
            let root = plugin_root(ctx, &target)?;
            bundle_dir(&root, &bundle.directory_name)?;
            workflow.install(&bundle, &root).await
        }
        Command::UpdatePlugin { name, directory } => {
            let mut bundle = find_remote_plugin(ctx, &name).await?;
            let (root, folder) = installed_plugin_dir(ctx, &directory)?;
            // Reinstall into the folder the plugin was found in.
            bundle.directory_name = folder;
            workflow.update(&bundle, &root).await
        }
        Command::DeletePlugin(directory) => {
            let (root, folder) = installed_plugin_dir(ctx, &directory)?;
            workflow.delete(&root.join(folder)).await
        }
    };

    Ok(report)
}

async fn find_remote_profile(ctx: &AppContext, name: &str) -> ManagerResult<BundleDescriptor> {
    ctx.catalog()
        .find_remote_profile(name)
        .await
        .ok_or_else(|| ManagerError::BundleNotFound(name.to_string()))
}

async fn find_remote_plugin(ctx: &AppContext, name: &str) -> ManagerResult<BundleDescriptor> {
    ctx.catalog()
        .list_remote_plugins()
        .await
        .into_iter()
        .find(|p| p.name == name || p.directory_name == name)
        .ok_or_else(|| ManagerError::BundleNotFound(name.to_string()))
}

/// Plugin folder of an installed profile, or the shared plugin folder.
fn plugin_root(ctx: &AppContext, target: &PluginTarget) -> ManagerResult<PathBuf> {
    match target {
        PluginTarget::Profile(profile) => {
            let profile_dir = bundle_dir(ctx.profile_directory()?, profile)?;
            if !profile_dir.is_dir() {
                return Err(ManagerError::ProfileNotInstalled(profile.clone()));
            }
            Ok(profile_dir.join(PLUGINS_DIR_NAME))
        }
        PluginTarget::Shared => Ok(ctx.host()?.shared_plugin_dir()),
    }
}

/// `root/name`, refusing names that would escape `root` or hit the working directory.
fn bundle_dir(root: &Path, name: &str) -> ManagerResult<PathBuf> {
    let mut components = Path::new(name).components();
    let valid = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
        && name != WORKING_DIR_NAME;
    if !valid {
        return Err(ManagerError::Other(format!("Invalid bundle name: {name:?}")));
    }
    Ok(root.join(name))
}

/// Split a plugin folder into its plugin root and folder name.
///
/// The root must be a profile's `Plugins` folder or the shared plugin folder.
fn installed_plugin_dir(ctx: &AppContext, directory: &Path) -> ManagerResult<(PathBuf, String)> {
    let invalid = || {
        ManagerError::Other(format!(
            "Not a plugin directory: {}",
            directory.display()
        ))
    };

    let (Some(root), Some(folder)) = (directory.parent(), directory.file_name()) else {
        return Err(invalid());
    };
    let folder = folder.to_str().ok_or_else(invalid)?;
    bundle_dir(root, folder).map_err(|_| invalid())?;

    if is_profile_plugin_root(ctx.profile_directory()?, root)
        || ctx.shared_plugin_dir().is_some_and(|shared| shared == root)
    {
        Ok((root.to_path_buf(), folder.to_string()))
    } else {
        Err(invalid())
    }
}

/// Whether `root` is `{content_root}/<profile>/Plugins`.
fn is_profile_plugin_root(content_root: &Path, root: &Path) -> bool {
    if root.file_name().and_then(|n| n.to_str()) != Some(PLUGINS_DIR_NAME) {
        return false;
    }
    let Some(profile_dir) = root.parent() else {
        return false;
    };
    match (profile_dir.parent(), profile_dir.file_name().and_then(|n| n.to_str())) {
        (Some(parent), Some(profile)) => {
            parent == content_root && bundle_dir(content_root, profile).is_ok()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Settings;

    #[test]
    fn bundle_names_stay_inside_root() {
        let root = Path::new("/profiles");
        assert_eq!(bundle_dir(root, "EGLL").unwrap(), root.join("EGLL"));
        assert!(bundle_dir(root, "../etc").is_err());
        assert!(bundle_dir(root, "a/b").is_err());
        assert!(bundle_dir(root, "").is_err());
        assert!(bundle_dir(root, WORKING_DIR_NAME).is_err());
    }

    #[test]
    fn recognises_profile_plugin_roots() {
        let content = Path::new("/profiles");
        assert!(is_profile_plugin_root(
            content,
            Path::new("/profiles/Australia/Plugins")
        ));
        assert!(!is_profile_plugin_root(content, Path::new("/profiles/Australia")));
        assert!(!is_profile_plugin_root(content, Path::new("/profiles/Plugins")));
        assert!(!is_profile_plugin_root(
            content,
            Path::new("/profiles/.working/Plugins")
        ));
        assert!(!is_profile_plugin_root(
            content,
            Path::new("/elsewhere/Australia/Plugins")
        ));
    }

    #[test]
    fn plugin_directories_must_sit_in_a_plugin_root() {
        let settings = Settings {
            base_directory: Some(PathBuf::from("/vatSys")),
            profile_directory: Some(PathBuf::from("/profiles")),
            ..Settings::default()
        };
        let ctx = AppContext::new(settings).unwrap();

        let (root, folder) =
            installed_plugin_dir(&ctx, Path::new("/profiles/Australia/Plugins/Events")).unwrap();
        assert_eq!(root, PathBuf::from("/profiles/Australia/Plugins"));
        assert_eq!(folder, "Events");

        let (root, _) =
            installed_plugin_dir(&ctx, Path::new("/vatSys/bin/Plugins/Events")).unwrap();
        assert_eq!(root, PathBuf::from("/vatSys/bin/Plugins"));

        assert!(installed_plugin_dir(&ctx, Path::new("/profiles")).is_err());
        assert!(installed_plugin_dir(&ctx, Path::new("/profiles/Australia")).is_err());
        assert!(installed_plugin_dir(&ctx, Path::new("/profiles/Australia/Plugins/..")).is_err());
        assert!(installed_plugin_dir(&ctx, Path::new("/vatSys/bin")).is_err());
    }
}
