//! Remote store synchronization.
//!
//! The store is downloaded before a run and uploaded after it. The blob
//! protocol itself lives behind `RemoteStore`; `DirRemote` is the
//! filesystem flavor used locally and in tests. `RunGuard` keeps a second
//! run from starting while a prior run's upload may still be in flight.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{error, info, warn};
use uuid::Uuid;

use crate::error::RunError;

pub trait RemoteStore {
    /// Fetch the remote copy over the local store, if one exists.
    fn download(&self, local: &Path) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Persist the local store remotely.
    fn upload(&self, local: &Path) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Remote backed by a plain directory.
pub struct DirRemote {
    dir: PathBuf,
}

impl DirRemote {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn remote_path(&self, local: &Path) -> Result<PathBuf> {
        let name = local
            .file_name()
            .context("store path has no file name")?;
        Ok(self.dir.join(name))
    }
}

impl RemoteStore for DirRemote {
    async fn download(&self, local: &Path) -> Result<()> {
        let remote = self.remote_path(local)?;
        match tokio::fs::copy(&remote, local).await {
            Ok(_) => {
                info!("Downloaded store from {}", remote.display());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(
                    "No remote store at {}; starting from the local copy",
                    remote.display()
                );
                Ok(())
            }
            Err(err) => Err(err).with_context(|| {
                format!("failed to download store from {}", remote.display())
            }),
        }
    }

    async fn upload(&self, local: &Path) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create remote dir {}", self.dir.display()))?;
        let remote = self.remote_path(local)?;
        tokio::fs::copy(local, &remote)
            .await
            .with_context(|| format!("failed to upload store to {}", remote.display()))?;
        info!("Uploaded store to {}", remote.display());
        Ok(())
    }
}

const LOCK_FILE: &str = "noteminder.lock";

/// Mutual-exclusion marker for one reconciliation run. Acquiring writes a
/// run id into the lock file; the file is removed on drop.
pub struct RunGuard {
    path: PathBuf,
    run_id: Uuid,
}

impl RunGuard {
    pub fn acquire(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create lock dir {}", dir.display()))?;
        let path = dir.join(LOCK_FILE);
        let run_id = Uuid::new_v4();

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => {
                use std::io::Write;
                let mut file = file;
                file.write_all(run_id.to_string().as_bytes())
                    .with_context(|| format!("failed to write lock {}", path.display()))?;
                Ok(Self { path, run_id })
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path).unwrap_or_else(|_| "unknown".into());
                Err(RunError::RunInProgress(holder.trim().to_string()).into())
            }
            Err(err) => {
                Err(err).with_context(|| format!("failed to create lock {}", path.display()))
            }
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            error!("Failed to remove run lock {}: {err}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn download_missing_remote_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let remote = DirRemote::new(dir.path().join("remote"));
        let local = dir.path().join("local.db");
        remote.download(&local).await.unwrap();
        assert!(!local.exists());
    }

    #[tokio::test]
    async fn upload_then_download_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let remote = DirRemote::new(dir.path().join("remote"));

        let local = dir.path().join("local.db");
        std::fs::write(&local, b"store bytes").unwrap();
        remote.upload(&local).await.unwrap();

        let other = dir.path().join("other").join("local.db");
        std::fs::create_dir_all(other.parent().unwrap()).unwrap();
        std::fs::write(&other, b"stale").unwrap();
        remote.download(&other).await.unwrap();
        assert_eq!(std::fs::read(&other).unwrap(), b"store bytes");
    }

    #[test]
    fn second_guard_is_refused_until_first_drops() {
        let dir = tempfile::tempdir().unwrap();
        let first = RunGuard::acquire(dir.path()).unwrap();

        let second = RunGuard::acquire(dir.path());
        assert!(second.is_err());
        let err = second.err().unwrap();
        assert!(err.downcast_ref::<RunError>().is_some());

        drop(first);
        RunGuard::acquire(dir.path()).unwrap();
    }
}
