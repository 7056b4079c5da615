use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use super::report::{Run, WorkflowReport};
use crate::core::catalog::BundleDescriptor;
use crate::core::downloader::Downloader;
use crate::core::error::ManagerError;
use crate::core::filesystem::{DirectoryOps, LocalDirectories};
use crate::core::step::{StepFailure, StepResult};

/// Install, update and delete pipelines for bundles.
///
/// Every invocation holds the working-directory lock for its whole run, so
/// two workflows sharing a working directory never interleave.
pub struct Workflow<D: DirectoryOps = LocalDirectories> {
    dirs: Arc<D>,
    downloader: Downloader,
    working_dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl<D: DirectoryOps + 'static> Workflow<D> {
    pub fn new(dirs: D, client: Client, working_dir: PathBuf, lock: Arc<Mutex<()>>) -> Self {
        Self {
            dirs: Arc::new(dirs),
            downloader: Downloader::new(client),
            working_dir,
            lock,
        }
    }

    /// Install `bundle` as `destination_root/<directory_name>`.
    ///
    /// Refused with an empty transcript if the target already exists.
    #[instrument(skip(self, bundle), fields(bundle = %bundle.name))]
    pub async fn install(
        &self,
        bundle: &BundleDescriptor,
        destination_root: &Path,
    ) -> WorkflowReport {
        let _guard = self.lock.lock().await;
        let target = destination_root.join(&bundle.directory_name);
        if target.exists() {
            info!("{} already installed at {:?}", bundle.name, target);
            return WorkflowReport::rejected();
        }

        let mut run = Run::start();
        self.install_steps(bundle, &target, &mut run).await;
        let report = run.finish();
        info!("Install of {} finished: success={}", bundle.name, report.success);
        report
    }

    /// Remove the existing install of `bundle`, then install it again.
    ///
    /// Refused with an empty transcript if nothing is installed. A failed
    /// removal stops the run before anything is downloaded.
    #[instrument(skip(self, bundle), fields(bundle = %bundle.name))]
    pub async fn update(
        &self,
        bundle: &BundleDescriptor,
        destination_root: &Path,
    ) -> WorkflowReport {
        let _guard = self.lock.lock().await;
        let target = destination_root.join(&bundle.directory_name);
        if !target.exists() {
            info!("{} not installed at {:?}", bundle.name, target);
            return WorkflowReport::rejected();
        }

        let mut run = Run::start();
        run.begin();
        if run.record("remove existing install", self.remove_tree(&target).await) {
            self.install_steps(bundle, &target, &mut run).await;
        }
        let report = run.finish();
        info!("Update of {} finished: success={}", bundle.name, report.success);
        report
    }

    /// Delete an installed bundle directory.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &Path) -> WorkflowReport {
        let _guard = self.lock.lock().await;
        let mut run = Run::start();
        run.begin();
        run.record("remove directory", self.remove_tree(path).await);
        run.finish()
    }

    async fn install_steps(
        &self,
        bundle: &BundleDescriptor,
        target: &Path,
        run: &mut Run,
    ) -> bool {
        let archive = self.working_dir.join(format!("{}.zip", Uuid::new_v4()));

        run.begin();
        if !run.record("create working directory", self.ensure(&self.working_dir).await) {
            return false;
        }

        run.begin();
        let downloaded = self.downloader.download(&bundle.source_url, &archive).await;
        if !run.record("download", downloaded) {
            return false;
        }

        run.begin();
        if !run.record("create target directory", self.ensure(target).await) {
            return false;
        }

        run.begin();
        let extracted = self.downloader.extract(&archive, target).await;
        if !run.record("extract", extracted) {
            return false;
        }

        run.begin();
        run.record("remove working directory", self.remove_tree(&self.working_dir).await)
    }

    async fn ensure(&self, path: &Path) -> StepResult {
        self.blocking(path, D::ensure_directory).await
    }

    async fn remove_tree(&self, path: &Path) -> StepResult {
        self.blocking(path, D::remove_directory_tree).await
    }

    /// Run a directory operation on the blocking pool.
    async fn blocking(&self, path: &Path, op: fn(&D, &Path) -> StepResult) -> StepResult {
        let dirs = Arc::clone(&self.dirs);
        let path = path.to_path_buf();
        match tokio::task::spawn_blocking(move || op(&*dirs, &path)).await {
            Ok(result) => result,
            Err(e) => Err(StepFailure::new(
                Vec::new(),
                ManagerError::Other(format!("Task join error: {e}")),
            )),
        }
    }
}
