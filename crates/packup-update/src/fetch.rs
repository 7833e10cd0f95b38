//! Downloading updated mods and swapping them into the instance.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};

use chrono::Local;
use packup_pack::settings::BackupMode;
use packup_repository::VersionSource;
use packup_repository::archive::atomic_replace;
use parking_lot::Mutex;
use tracing::instrument;

use crate::gate::Gate;
use crate::resolve::{FailureReason, ResolvedMod, Status};

/// One lock per file path, so that two swaps touching the same file never
/// interleave.
#[derive(Debug, Default)]
pub struct DestinationLocks {
    table: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl DestinationLocks {
    #[must_use]
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        Arc::clone(self.table.lock().entry(path.to_path_buf()).or_default())
    }
}

/// Installs the files of updated mods into an instance directory.
pub struct Fetcher<'a> {
    source: &'a dyn VersionSource,
    gate: &'a dyn Gate,
    instance_directory: PathBuf,
    backup_mode: BackupMode,
    locks: DestinationLocks,
}

impl<'a> Fetcher<'a> {
    pub fn new(
        source: &'a dyn VersionSource,
        gate: &'a dyn Gate,
        instance_directory: PathBuf,
        backup_mode: BackupMode,
    ) -> Self {
        Self {
            source,
            gate,
            instance_directory,
            backup_mode,
            locks: DestinationLocks::default(),
        }
    }

    /// Downloads, verifies and installs the new file of an updated mod.
    ///
    /// Anything but [`Status::Updated`] is returned untouched. When this
    /// fails, the pinned file is left as it was and the result is downgraded
    /// to [`Status::Failed`].
    #[instrument(level = "debug", skip_all, fields(id = %resolved.entry.id))]
    pub fn fetch(&self, resolved: ResolvedMod) -> ResolvedMod {
        if resolved.status != Status::Updated {
            return resolved;
        }
        let Some(candidate) = resolved.candidate.as_ref() else {
            return resolved;
        };

        self.gate.wait();
        let bytes = match self.source.download(&candidate.file.url) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(%error, "Download failed");
                return resolved.fail(FailureReason::DownloadFailed(error.to_string()));
            }
        };
        if let Err(mismatch) = candidate.file.hashes.verify(&bytes) {
            tracing::warn!(%mismatch, "Downloaded file is corrupt");
            return resolved.fail(FailureReason::HashMismatch(mismatch));
        }

        match self.replace(&resolved, &bytes) {
            Ok(()) => resolved,
            Err(error) => {
                tracing::warn!(%error, "Failed to replace the pinned file");
                resolved.fail(FailureReason::ReplaceFailed(error.to_string()))
            }
        }
    }

    fn replace(&self, resolved: &ResolvedMod, bytes: &[u8]) -> io::Result<()> {
        let destination = resolved.destination.under(&self.instance_directory);
        let previous = resolved.entry.path.under(&self.instance_directory);

        let mut paths = vec![destination.clone(), previous.clone()];
        paths.sort();
        paths.dedup();
        let locks: Vec<_> = paths.iter().map(|path| self.locks.lock_for(path)).collect();
        let _guards: Vec<_> = locks.iter().map(|lock| lock.lock()).collect();

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let backup = match (self.backup_mode, previous.is_file()) {
            (BackupMode::Keep, true) => Some(Self::back_up(&previous)?),
            _ => None,
        };
        if let Err(error) = atomic_replace(&destination, bytes) {
            if let Some(backup) = backup {
                let _ = fs::remove_file(backup);
            }
            return Err(error);
        }

        tracing::debug!(path = ?destination, "Installed");
        if previous != destination {
            Self::remove_previous(&previous);
        }
        Ok(())
    }

    /// Removes the file an update replaced. The new file is already in place,
    /// so a failure here is reported and the update stands.
    fn remove_previous(previous: &Path) {
        match fs::remove_file(previous) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!(path = ?previous, %error, "Failed to remove the replaced file");
            }
        }
    }

    /// Copies `previous` into the backup directory next to it, under a
    /// timestamped name.
    fn back_up(previous: &Path) -> io::Result<PathBuf> {
        let directory = previous
            .parent()
            .map_or_else(|| PathBuf::from(BackupMode::BACKUP_DIRECTORY), |parent| {
                parent.join(BackupMode::BACKUP_DIRECTORY)
            });
        fs::create_dir_all(&directory)?;

        let stem = previous.file_stem().unwrap_or_default().to_string_lossy();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let name = match previous.extension() {
            Some(extension) => format!("{stem}_{timestamp}.{}", extension.to_string_lossy()),
            None => format!("{stem}_{timestamp}"),
        };
        let backup = directory.join(name);
        fs::copy(previous, &backup)?;
        Ok(backup)
    }
}
