use std::path::{Path, PathBuf};
use std::{fs, io};

use packup_component::RuntimePath;
use packup_pack::index::Index;
use packup_pack::index::overrides::{
    CLIENT_OVERRIDES_FOLDER, COMMON_OVERRIDES_FOLDER, SERVER_OVERRIDES_FOLDER,
};
use packup_pack::{IndexError, Pack};
use tempdir::TempDir;
use tracing::instrument;
use walkdir::WalkDir;

pub mod archive;
pub mod persist;

/// A modpack on the local filesystem, either unpacked or as an **`.mrpack`**.
#[derive(Debug)]
pub struct LocalRepository {
    root_directory: PathBuf,
    index_path: PathBuf,
    pub pack: Pack,
    ignored_overrides: Vec<PathBuf>,

    /// Where an archive was extracted to. Removed when dropped.
    scratch: Option<TempDir>,
}

impl LocalRepository {
    /// Index file names, in order of preference.
    pub const INDEX_FILE_NAMES: [&str; 2] = [Index::FILE_NAME, "index.json"];
    pub const SCRATCH_PREFIX: &str = "packup";

    /// "Open" a modpack at `path`: a directory holding an index, the index
    /// file itself, or a packed archive.
    ///
    /// The index is looked up at the root of the directory first, then
    /// anywhere below it. An `overrides` directory next to the index becomes
    /// the pack's overrides.
    ///
    /// # Errors
    ///
    /// See [`Error`] for the possible causes. Nothing is resolved or written
    /// if this fails.
    #[instrument(level = "debug")]
    pub fn open(path: &Path) -> Result<Self, self::Error> {
        let metadata = fs::metadata(path).map_err(Error::io(path))?;

        let (root_directory, scratch) = if metadata.is_dir() {
            (path.to_path_buf(), None)
        } else if Self::is_index_file(path) {
            let parent = path.parent().map_or_else(PathBuf::new, Path::to_path_buf);
            (parent, None)
        } else {
            let scratch = TempDir::new(Self::SCRATCH_PREFIX).map_err(Error::io(path))?;
            archive::extract_archive(path, scratch.path()).map_err(|error| match error {
                archive::ArchiveError::Io { source, path } => Error::Io { source, path },
                other => Error::invalid(path, other),
            })?;
            tracing::debug!(scratch = ?scratch.path(), "Extracted archive");
            (scratch.path().to_path_buf(), Some(scratch))
        };

        let index_path = match metadata.is_file() && Self::is_index_file(path) {
            true => path.to_path_buf(),
            false => Self::find_index(&root_directory)
                .ok_or_else(|| Error::invalid(path, "no modrinth.index.json was found"))?,
        };
        tracing::info!(index = ?index_path, "Reading modpack index");

        let json = fs::read_to_string(&index_path).map_err(Error::io(&index_path))?;
        let index = Index::from_json(&json).map_err(|error| Error::invalid(&index_path, error))?;

        let index_directory = index_path.parent().unwrap_or(root_directory.as_path());
        let overrides = Some(index_directory.join(COMMON_OVERRIDES_FOLDER))
            .filter(|overrides| overrides.is_dir());
        let ignored_overrides: Vec<PathBuf> = [CLIENT_OVERRIDES_FOLDER, SERVER_OVERRIDES_FOLDER]
            .iter()
            .map(|folder| index_directory.join(folder))
            .filter(|folder| folder.is_dir())
            .collect();
        for folder in &ignored_overrides {
            tracing::warn!(?folder, "Side-specific overrides are not carried into the written packs");
        }

        let pack = Pack::from_index(index, overrides).map_err(|error| match error {
            IndexError::MissingLoader => Error::UnsupportedLoader("none".into()),
            IndexError::UnsupportedLoader(loader) => Error::UnsupportedLoader(loader),
            IndexError::DuplicateDestination(path) => Error::DuplicateDestination(path),
            other => Error::invalid(&index_path, other),
        })?;

        Ok(Self {
            root_directory,
            index_path,
            pack,
            ignored_overrides,
            scratch,
        })
    }

    fn is_index_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| Self::INDEX_FILE_NAMES.contains(&name))
    }

    fn find_index(root_directory: &Path) -> Option<PathBuf> {
        for name in Self::INDEX_FILE_NAMES {
            let candidate = root_directory.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        let found: Vec<PathBuf> = WalkDir::new(root_directory)
            .sort_by_file_name()
            .into_iter()
            .flatten()
            .filter(|entry| entry.file_type().is_file() && Self::is_index_file(entry.path()))
            .map(walkdir::DirEntry::into_path)
            .collect();
        Self::INDEX_FILE_NAMES.iter().find_map(|name| {
            found
                .iter()
                .find(|path| path.file_name().is_some_and(|file_name| file_name == *name))
                .cloned()
        })
    }

    /// The directory the index was found in or extracted to.
    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    #[must_use]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// The `client-overrides` and `server-overrides` directories found next
    /// to the index. Their files are not copied into written packs.
    #[must_use]
    pub fn ignored_overrides(&self) -> &[PathBuf] {
        &self.ignored_overrides
    }

    /// Whether the pack was read from an archive.
    #[must_use]
    pub const fn is_archive(&self) -> bool {
        self.scratch.is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{path:?} is not a valid modpack: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("modloader {0:?} is not supported")]
    UnsupportedLoader(String),

    #[error("An I/O error occurred, path at fault: {path:?}")]
    Io { source: io::Error, path: PathBuf },

    #[error("more than one file is installed at {0}")]
    DuplicateDestination(RuntimePath),
}

impl Error {
    fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { source, path }
    }

    fn invalid(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ManifestInvalid {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
