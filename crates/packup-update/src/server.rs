//! Deciding which mods belong in a server pack.

use packup_component::{Id, ServerSupport};
use packup_repository::VersionSource;
use serde::Serialize;

use crate::gate::Gate;
use crate::resolve::ResolvedMod;

/// A file left out of a server pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exclusion {
    pub id: Id,
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Included(ServerSupport),
    Excluded(Exclusion),
}

pub struct ServerFilter<'a> {
    source: &'a dyn VersionSource,
    gate: &'a dyn Gate,
}

impl<'a> ServerFilter<'a> {
    pub fn new(source: &'a dyn VersionSource, gate: &'a dyn Gate) -> Self {
        Self { source, gate }
    }

    /// Whether `resolved` goes into a server pack.
    ///
    /// The selected version's own flag is trusted first. If the service
    /// didn't report one, it is asked about the project. A mod nobody knows
    /// anything about is included, whatever the index declares for it.
    #[must_use]
    pub fn classify(&self, resolved: &ResolvedMod) -> Verdict {
        let support = self.server_support(resolved);
        match support.is_included() {
            true => Verdict::Included(support),
            false => Verdict::Excluded(Exclusion {
                id: resolved.entry.id.clone(),
                file_name: resolved.destination.file_name(),
                reason: "the hosting service marks it as client-only".into(),
            }),
        }
    }

    fn server_support(&self, resolved: &ResolvedMod) -> ServerSupport {
        let reported = resolved
            .candidate
            .as_ref()
            .map_or(ServerSupport::Unknown, |candidate| candidate.server_support);
        if reported != ServerSupport::Unknown {
            return reported;
        }

        let version_id = resolved
            .candidate
            .as_ref()
            .map(|candidate| candidate.id.as_str())
            .or(resolved.entry.pinned_version.as_deref());
        let (Some(project_id), Some(version_id)) = (resolved.entry.project_id.as_deref(), version_id) else {
            return ServerSupport::Unknown;
        };

        self.gate.wait();
        self.source
            .server_support(project_id, version_id)
            .unwrap_or_else(|error| {
                tracing::warn!(id = %resolved.entry.id, %error, "Failed to look up server support");
                ServerSupport::Unknown
            })
    }
}
