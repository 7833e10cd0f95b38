//! Building **`.mrpack`** archives from resolved mods.

use std::path::{Path, PathBuf};
use std::{fs, io};

use packup_component::{Id, Requirement, ServerSupport};
use packup_pack::index::overrides::Overrides;
use packup_pack::index::{File, Index};
use packup_pack::{Pack, Variant};
use packup_repository::archive::{self, ArchiveEntry, ArchiveError, EntrySource};
use packup_repository::VersionSource;
use tracing::instrument;

use crate::gate::Gate;
use crate::resolve::ResolvedMod;
use crate::server::{Exclusion, ServerFilter, Verdict};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An I/O error occurred, path at fault: {path:?}")]
    Io { source: io::Error, path: PathBuf },

    #[error("Failed to serialize the index")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// A pack ready to be written, in one [`Variant`].
#[derive(Debug, Clone)]
#[must_use]
pub struct Assembly {
    pub variant: Variant,
    pub index: Index,
    /// What the server variant left out, in index order.
    pub exclusions: Vec<Exclusion>,
    pub file_name: String,
}

pub struct Assembler<'a> {
    filter: ServerFilter<'a>,
}

impl<'a> Assembler<'a> {
    pub fn new(source: &'a dyn VersionSource, gate: &'a dyn Gate) -> Self {
        Self {
            filter: ServerFilter::new(source, gate),
        }
    }

    /// Builds the index of `pack` after `resolved`, for `variant`.
    ///
    /// Mods come first, in the order they were declared, then the pack's
    /// other files. Failed mods are left out. The server variant also
    /// leaves out whatever can't run on a dedicated server.
    ///
    /// # Errors
    ///
    /// Fails if the overrides directory can't be traversed.
    #[instrument(level = "debug", skip(self, pack, resolved))]
    pub fn assemble(&self, pack: &Pack, resolved: &[ResolvedMod], variant: Variant) -> Result<Assembly, Error> {
        let mut files = vec![];
        let mut exclusions = vec![];

        for outcome in resolved {
            let Some(file) = outcome.index_file() else {
                continue;
            };
            let verdict = match variant {
                Variant::Server => self.filter.classify(outcome),
                Variant::Client => Verdict::Included(ServerSupport::Unknown),
            };
            if let Verdict::Excluded(exclusion) = verdict {
                tracing::info!(id = %exclusion.id, reason = %exclusion.reason, "Leaving out of the server pack");
                exclusions.push(exclusion);
                continue;
            }
            files.push(file);
        }

        for file in &pack.passthrough {
            let client_only = file.env.is_some_and(|env| env.server == Requirement::Unsupported);
            if variant == Variant::Server && client_only {
                exclusions.push(Exclusion {
                    id: Id::from(file.path.file_name()),
                    file_name: file.path.file_name(),
                    reason: "the pack's index marks it as client-only".into(),
                });
                continue;
            }
            files.push(file.clone());
        }

        let overrides = match &pack.overrides {
            Some(directory) if directory.is_dir() => {
                let listed = archive::list_files(directory).map_err(|source| Error::Io {
                    source: source.into(),
                    path: directory.clone(),
                })?;
                Overrides::new(directory.clone(), listed)
            }
            _ => Overrides::default(),
        };

        let index = Index::new(
            format!("{}{}", pack.name, variant.name_suffix()),
            pack.version_id.clone(),
            pack.summary.clone(),
            &pack.instance,
            files,
            overrides,
        );

        Ok(Assembly {
            variant,
            index,
            exclusions,
            file_name: pack.archive_file_name(variant),
        })
    }
}

impl Assembly {
    /// The files installed by this pack.
    #[must_use]
    pub fn files(&self) -> &[File] {
        &self.index.files
    }

    /// Writes this pack into `output_directory` and returns the archive's path.
    ///
    /// # Errors
    ///
    /// See [`Error`] for the possible causes.
    pub fn write(&self, output_directory: &Path) -> Result<PathBuf, Error> {
        fs::create_dir_all(output_directory).map_err(|source| Error::Io {
            source,
            path: output_directory.to_path_buf(),
        })?;
        let path = output_directory.join(&self.file_name);

        let mut entries = vec![ArchiveEntry {
            name: Index::FILE_NAME.into(),
            source: EntrySource::Bytes(self.index.to_json()?.into_bytes()),
        }];
        if let Some(source) = &self.index.overrides.source {
            entries.extend(self.index.overrides.files.iter().map(|file| ArchiveEntry {
                name: Overrides::archive_name(file),
                source: EntrySource::File(source.join(file)),
            }));
        }

        tracing::info!(path = ?path, files = self.index.files.len(), "Writing {} pack", self.variant);
        archive::create_archive(&path, &entries)?;
        Ok(path)
    }
}
