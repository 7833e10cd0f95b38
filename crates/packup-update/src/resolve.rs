//! Picking the version each mod should be at.

use std::fmt;

use itertools::Itertools;
use packup_component::{HashMismatch, ModEntry, RuntimePath};
use packup_pack::Pack;
use packup_pack::candidate::VersionCandidate;
use packup_pack::index::File;
use packup_pack::instance::Instance;
use packup_repository::VersionSource;
use serde::Serialize;
use tracing::instrument;

use crate::gate::Gate;

/// Why a single mod could not be brought up to date.
///
/// These never stop the run: the mod is reported and left out of the
/// assembled packs.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("no version is compatible with the pack")]
    NoCompatibleVersion,
    #[error("the hosting service does not know this file")]
    ProjectUnidentified,
    #[error("looking up versions failed: {0}")]
    LookupFailed(String),
    #[error("downloading failed: {0}")]
    DownloadFailed(String),
    #[error("downloaded file is corrupt: {0}")]
    HashMismatch(HashMismatch),
    #[error("replacing the file failed: {0}")]
    ReplaceFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// A newer compatible version was found (and, unless dry-running,
    /// installed).
    Updated,
    /// The pinned version is already the best compatible one.
    UpToDate,
    Failed(FailureReason),
}

impl Status {
    #[must_use]
    pub const fn tag(&self) -> StatusTag {
        match self {
            Self::Updated => StatusTag::Updated,
            Self::UpToDate => StatusTag::UpToDate,
            Self::Failed(_) => StatusTag::Failed,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tag(), f)
    }
}

/// A [`Status`] without its failure reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StatusTag {
    Updated,
    UpToDate,
    Failed,
}

/// The outcome of resolving one [`ModEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ResolvedMod {
    /// The entry as declared, plus IDs learned while resolving it.
    pub entry: ModEntry,
    /// The human-facing label of the pinned version.
    pub previous_label: String,
    /// The selected version. Always present for [`Status::Updated`] and
    /// [`Status::UpToDate`].
    pub candidate: Option<VersionCandidate>,
    /// Where the mod is installed once resolved.
    pub destination: RuntimePath,
    pub status: Status,
    /// The project's display name, like `Sodium`, if the service has one.
    pub title: Option<String>,
}

impl ResolvedMod {
    fn failed(entry: ModEntry, previous_label: String, reason: FailureReason) -> Self {
        Self {
            destination: entry.path.clone(),
            entry,
            previous_label,
            candidate: None,
            status: Status::Failed(reason),
            title: None,
        }
    }

    /// Downgrades this result to [`Status::Failed`]. The pinned file stays
    /// where it was.
    pub fn fail(self, reason: FailureReason) -> Self {
        Self {
            destination: self.entry.path.clone(),
            status: Status::Failed(reason),
            ..self
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.status, Status::Failed(_))
    }

    /// The label of the version the mod is at after resolving.
    #[must_use]
    pub fn new_label(&self) -> Option<&str> {
        self.candidate
            .as_ref()
            .map(|candidate| candidate.version_number.as_str())
    }

    /// The entry installing this mod in an assembled pack: the new file when
    /// updated, the pinned one when up to date, nothing when failed.
    #[must_use]
    pub fn index_file(&self) -> Option<File> {
        match (&self.status, &self.candidate) {
            (Status::Updated, Some(candidate)) => Some(
                File::from_candidate()
                    .runtime_path(self.destination.clone())
                    .maybe_env(self.entry.environment)
                    .candidate_file(&candidate.file)
                    .build(),
            ),
            (Status::UpToDate, _) => Some(File::from(&self.entry)),
            _ => None,
        }
    }
}

/// Selects the version each mod should be at, asking a [`VersionSource`].
pub struct Resolver<'a> {
    source: &'a dyn VersionSource,
    gate: &'a dyn Gate,
}

impl<'a> Resolver<'a> {
    pub fn new(source: &'a dyn VersionSource, gate: &'a dyn Gate) -> Self {
        Self { source, gate }
    }

    /// Resolves `entry` against the versions currently published for it.
    ///
    /// Only talks to the hosting service: calling this again with the same
    /// service state gives the same result.
    #[instrument(level = "debug", skip_all, fields(id = %entry.id))]
    pub fn resolve(&self, entry: &ModEntry, pack: &Pack) -> ResolvedMod {
        let fallback_label = entry.file_name();

        let entry = match self.identify(entry) {
            Ok(entry) => entry,
            Err(reason) => return ResolvedMod::failed(entry.clone(), fallback_label, reason),
        };
        let Some(project_id) = entry.project_id.as_deref() else {
            return ResolvedMod::failed(entry, fallback_label, FailureReason::ProjectUnidentified);
        };

        self.gate.wait();
        let candidates = match self.source.list_versions(project_id) {
            Ok(candidates) => candidates,
            Err(error) => {
                tracing::warn!(%error, "Failed to list versions");
                let reason = FailureReason::LookupFailed(error.to_string());
                return ResolvedMod::failed(entry, fallback_label, reason);
            }
        };

        let title = self.title(project_id);
        let previous_label = candidates
            .iter()
            .find(|candidate| is_pinned(&entry, candidate))
            .map_or(fallback_label, |pinned| pinned.version_number.clone());

        let Some(winner) = select(&candidates, &pack.instance) else {
            tracing::debug!(count = candidates.len(), "No compatible candidate");
            return ResolvedMod {
                title,
                ..ResolvedMod::failed(entry, previous_label, FailureReason::NoCompatibleVersion)
            };
        };

        if is_pinned(&entry, winner) {
            return ResolvedMod {
                destination: entry.path.clone(),
                entry,
                previous_label,
                candidate: Some(winner.clone()),
                status: Status::UpToDate,
                title,
            };
        }

        let destination = match entry.path.with_file_name(&winner.file.file_name) {
            Ok(destination) => destination,
            Err(error) => {
                let reason = FailureReason::LookupFailed(format!(
                    "unusable file name {:?}: {error}",
                    winner.file.file_name
                ));
                return ResolvedMod {
                    title,
                    ..ResolvedMod::failed(entry, previous_label, reason)
                };
            }
        };
        tracing::debug!(from = %previous_label, to = %winner.version_number, "Found an update");

        ResolvedMod {
            entry,
            previous_label,
            candidate: Some(winner.clone()),
            destination,
            status: Status::Updated,
            title,
        }
    }

    /// The project's display name. Only used in reports, so a failed lookup
    /// is logged and ignored.
    fn title(&self, project_id: &str) -> Option<String> {
        self.gate.wait();
        self.source.project_title(project_id).unwrap_or_else(|error| {
            tracing::warn!(%error, "Failed to look up the project's title");
            None
        })
    }

    fn identify(&self, entry: &ModEntry) -> Result<ModEntry, FailureReason> {
        if entry.is_identified() {
            return Ok(entry.clone());
        }

        self.gate.wait();
        match self.source.identify(&entry.hashes.sha1) {
            Ok(Some(identified)) => Ok(entry.identified(identified.project_id, identified.version_id)),
            Ok(None) => Err(FailureReason::ProjectUnidentified),
            Err(error) => Err(FailureReason::LookupFailed(error.to_string())),
        }
    }
}

/// Whether `candidate` is the version `entry` is pinned at.
fn is_pinned(entry: &ModEntry, candidate: &VersionCandidate) -> bool {
    entry.pinned_version.as_deref() == Some(candidate.id.as_str())
        || candidate.file.hashes.sha1 == entry.hashes.sha1
}

/// Picks the best of `candidates` for `instance`.
///
/// Candidates whose loaders the instance can't run are dropped first. Exact
/// game version matches beat sub-version ones, and within the best tier the
/// service's order decides. A build native to the instance's loader is
/// preferred over a foreign one with the same version number.
#[must_use]
pub fn select<'c>(candidates: &'c [VersionCandidate], instance: &Instance) -> Option<&'c VersionCandidate> {
    let tier: Vec<&VersionCandidate> = candidates
        .iter()
        .filter_map(|candidate| candidate.fit(instance).map(|fit| (candidate, fit)))
        .max_set_by_key(|(_, fit)| *fit)
        .into_iter()
        .map(|(candidate, _)| candidate)
        .collect();

    let pick = *tier.first()?;
    if pick.is_native_to(instance.loader) {
        return Some(pick);
    }
    let native = tier.iter().find(|candidate| {
        candidate.version_number == pick.version_number && candidate.is_native_to(instance.loader)
    });
    Some(native.copied().unwrap_or(pick))
}
