pub mod local;
pub mod model;
pub mod reconcile;
pub mod remote;

pub use local::{attribute_plugin, list_installed_plugins, list_installed_profiles};
pub use model::{
    update_available, BundleDescriptor, BundleKind, InstalledBundle, PluginEntry, ProfileEntry,
    ReconciledBundle,
};
pub use reconcile::reconcile;
pub use remote::{CatalogService, DEFAULT_PLUGIN_DOWNLOAD_BASE, DEFAULT_PROFILES_CATALOG_URL};

/// Scratch directory under the content root used by in-flight installs.
/// Never listed as a bundle.
pub const WORKING_DIR_NAME: &str = ".working";

/// Per-profile folder holding that profile's plugins.
pub const PLUGINS_DIR_NAME: &str = "Plugins";
