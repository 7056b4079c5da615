pub mod profile;
pub mod version_state;

pub use profile::{format_version, resolve_version, DescriptorDocument};
pub use version_state::{read_descriptor_version, VersionState, ERROR_MARKER};

/// Descriptor shipped at the root of every profile.
pub const PROFILE_DESCRIPTOR: &str = "Profile.xml";
/// Optional descriptor inside a plugin directory.
pub const PLUGIN_DESCRIPTOR: &str = "Version.xml";
