use std::collections::{HashMap, HashSet};

use super::model::{update_available, BundleDescriptor, InstalledBundle, ReconciledBundle};
use crate::core::descriptor::VersionState;

/// Left-join installed bundles with the catalog on name.
///
/// Installed bundles come first in their input order; catalog entries with no
/// local install follow in catalog order. Local-only bundles keep a missing
/// remote version.
pub fn reconcile(
    descriptors: &[BundleDescriptor],
    installed: &[InstalledBundle],
) -> Vec<ReconciledBundle> {
    let mut by_name: HashMap<&str, &BundleDescriptor> = HashMap::new();
    for descriptor in descriptors {
        by_name.entry(descriptor.name.as_str()).or_insert(descriptor);
    }

    let mut merged: Vec<ReconciledBundle> = installed
        .iter()
        .map(|local| {
            let remote = by_name.get(local.name.as_str()).copied();
            let remote_version = remote
                .map(|d| d.remote_version.clone())
                .unwrap_or(VersionState::Missing);
            ReconciledBundle {
                name: local.name.clone(),
                kind: local.kind,
                installed: true,
                install_path: Some(local.install_path.clone()),
                profile: local.profile.clone(),
                source_url: remote.map(|d| d.source_url.clone()),
                update_available: update_available(&local.local_version, &remote_version),
                local_version: local.local_version.clone(),
                remote_version,
            }
        })
        .collect();

    let installed_names: HashSet<&str> = installed.iter().map(|b| b.name.as_str()).collect();
    let mut appended: HashSet<&str> = HashSet::new();
    for descriptor in descriptors {
        let name = descriptor.name.as_str();
        if installed_names.contains(name) || !appended.insert(name) {
            continue;
        }
        merged.push(ReconciledBundle {
            name: descriptor.name.clone(),
            kind: descriptor.kind,
            installed: false,
            install_path: None,
            profile: None,
            source_url: Some(descriptor.source_url.clone()),
            local_version: VersionState::Missing,
            remote_version: descriptor.remote_version.clone(),
            update_available: false,
        });
    }

    merged
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::core::catalog::model::BundleKind;

    fn remote(name: &str, version: VersionState) -> BundleDescriptor {
        BundleDescriptor {
            name: name.into(),
            kind: BundleKind::Profile,
            source_url: format!("http://x/{name}.zip"),
            directory_name: name.into(),
            dll_name: None,
            remote_version: version,
        }
    }

    fn local(name: &str, version: VersionState) -> InstalledBundle {
        InstalledBundle {
            name: name.into(),
            kind: BundleKind::Profile,
            install_path: PathBuf::from("/profiles").join(name),
            profile: None,
            local_version: version,
        }
    }

    fn known(v: &str) -> VersionState {
        VersionState::Known(v.into())
    }

    #[test]
    fn joins_on_name() {
        let descriptors = vec![remote("EGLL", known("2402")), remote("LFPG", known("2402"))];
        let installed = vec![local("EGLL", known("2401")), local("Custom", known("1"))];

        let merged = reconcile(&descriptors, &installed);
        let names: Vec<_> = merged.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["EGLL", "Custom", "LFPG"]);

        assert!(merged[0].installed && merged[0].update_available);
        assert_eq!(merged[0].source_url.as_deref(), Some("http://x/EGLL.zip"));

        assert_eq!(merged[1].remote_version, VersionState::Missing);
        assert!(!merged[1].update_available);

        assert!(!merged[2].installed);
        assert_eq!(merged[2].local_version, VersionState::Missing);
        assert!(!merged[2].update_available);
    }

    #[test]
    fn per_key_result_ignores_input_order() {
        let descriptors = vec![
            remote("EGLL", known("2402")),
            remote("LFPG", known("2401")),
            remote("KJFK", VersionState::Corrupt),
        ];
        let installed = vec![
            local("LFPG", known("2401")),
            local("EGLL", known("2401")),
            local("YMML", VersionState::Corrupt),
        ];

        let forward = reconcile(&descriptors, &installed);

        let mut rev_descriptors = descriptors.clone();
        rev_descriptors.reverse();
        let mut rev_installed = installed.clone();
        rev_installed.reverse();
        let backward = reconcile(&rev_descriptors, &rev_installed);

        assert_eq!(forward.len(), backward.len());
        for bundle in &forward {
            let twin = backward.iter().find(|b| b.name == bundle.name).unwrap();
            assert_eq!(bundle, twin);
        }
    }
}
