use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use sysinfo::System;
use tracing::{info, warn};

use crate::core::error::{ManagerError, ManagerResult};

/// Process name of the vatSys client.
pub const HOST_PROCESS_NAME: &str = "vatSys";

/// The vatSys installation the managed content belongs to.
pub struct HostApplication {
    base_directory: PathBuf,
}

impl HostApplication {
    pub fn new(base_directory: PathBuf) -> Self {
        Self { base_directory }
    }

    /// `{base}/bin/vatSys.exe`
    pub fn executable(&self) -> PathBuf {
        self.base_directory
            .join("bin")
            .join(format!("{HOST_PROCESS_NAME}.exe"))
    }

    /// Plugins shared by every profile: `{base}/bin/Plugins`.
    pub fn shared_plugin_dir(&self) -> PathBuf {
        self.base_directory.join("bin").join("Plugins")
    }

    pub fn is_running(&self) -> bool {
        let system = System::new_all();
        system
            .processes()
            .values()
            .any(|process| is_host_process(&process.name().to_string_lossy()))
    }

    /// Kill every running vatSys process. Returns how many were signalled.
    pub fn stop(&self) -> usize {
        let system = System::new_all();
        let mut stopped = 0;
        for process in system.processes().values() {
            if !is_host_process(&process.name().to_string_lossy()) {
                continue;
            }
            if process.kill() {
                stopped += 1;
            } else {
                warn!("Could not kill vatSys process {}", process.pid());
            }
        }
        info!("Stopped {} vatSys process(es)", stopped);
        stopped
    }

    /// Start vatSys detached from this process.
    pub fn launch(&self) -> ManagerResult<u32> {
        let executable = self.executable();
        if !executable.is_file() {
            return Err(ManagerError::HostNotFound(executable));
        }

        let child = Command::new(&executable)
            .current_dir(executable.parent().unwrap_or(Path::new(".")))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ManagerError::io(&executable, source))?;

        info!("Launched {:?} (pid {})", executable, child.id());
        Ok(child.id())
    }
}

/// Matches `vatSys` and `vatSys.exe`, ignoring case.
fn is_host_process(name: &str) -> bool {
    let stem = name
        .strip_suffix(".exe")
        .or_else(|| name.strip_suffix(".EXE"))
        .unwrap_or(name);
    stem.eq_ignore_ascii_case(HOST_PROCESS_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_host_process_names() {
        assert!(is_host_process("vatSys"));
        assert!(is_host_process("vatsys.exe"));
        assert!(is_host_process("VATSYS.EXE"));
        assert!(!is_host_process("vatSysManager.exe"));
        assert!(!is_host_process("explorer.exe"));
    }

    #[test]
    fn launch_requires_executable() {
        let base = tempfile::tempdir().unwrap();
        let host = HostApplication::new(base.path().to_path_buf());
        assert!(matches!(host.launch(), Err(ManagerError::HostNotFound(_))));
        assert_eq!(
            host.shared_plugin_dir(),
            base.path().join("bin").join("Plugins")
        );
    }
}
