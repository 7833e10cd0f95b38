//! A Markdown report of what an update did.

use std::fmt::Write;

use chrono::{DateTime, Local};
use packup_component::Id;
use serde::Serialize;

use crate::resolve::{ResolvedMod, Status, StatusTag};
use crate::server::Exclusion;

/// One line of the report, for one declared mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogEntry {
    pub id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub file_name: String,
    pub previous_label: String,
    pub new_label: Option<String>,
    pub status: StatusTag,
    pub reason: Option<String>,
}

impl ChangelogEntry {
    /// How the mod is named in the report: its title when known, its id
    /// otherwise.
    #[must_use]
    pub fn heading(&self) -> String {
        match &self.title {
            Some(title) => format!("**{title}** ({})", self.id),
            None => format!("**{}**", self.id),
        }
    }
}

impl From<&ResolvedMod> for ChangelogEntry {
    fn from(resolved: &ResolvedMod) -> Self {
        Self {
            id: resolved.entry.id.clone(),
            title: resolved.title.clone(),
            file_name: resolved.destination.file_name(),
            previous_label: resolved.previous_label.clone(),
            new_label: resolved.new_label().map(ToString::to_string),
            status: resolved.status.tag(),
            reason: match &resolved.status {
                Status::Failed(reason) => Some(reason.to_string()),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone)]
#[must_use]
pub struct Changelog {
    title: String,
    entries: Vec<ChangelogEntry>,
    exclusions: Vec<Exclusion>,
    timestamp: Option<DateTime<Local>>,
}

impl Changelog {
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Starts a report on `resolved`, kept in the given (manifest) order.
    pub fn new(title: impl Into<String>, resolved: &[ResolvedMod]) -> Self {
        Self {
            title: title.into(),
            entries: resolved.iter().map(ChangelogEntry::from).collect(),
            exclusions: vec![],
            timestamp: None,
        }
    }

    /// Lists files left out of the server pack.
    pub fn with_exclusions(mut self, exclusions: &[Exclusion]) -> Self {
        self.exclusions.extend_from_slice(exclusions);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn entries(&self) -> &[ChangelogEntry] {
        &self.entries
    }

    fn with_status(&self, status: StatusTag) -> impl Iterator<Item = &ChangelogEntry> {
        self.entries.iter().filter(move |entry| entry.status == status)
    }

    #[must_use]
    pub fn render(&self) -> String {
        let updated: Vec<_> = self.with_status(StatusTag::Updated).collect();
        let up_to_date: Vec<_> = self.with_status(StatusTag::UpToDate).collect();
        let failed: Vec<_> = self.with_status(StatusTag::Failed).collect();

        let mut out = String::new();
        let _ = writeln!(out, "# {} changelog\n", self.title);
        if let Some(timestamp) = self.timestamp {
            let _ = writeln!(out, "**Update time:** {}\n", timestamp.format(Self::TIMESTAMP_FORMAT));
        }
        let _ = writeln!(out, "- Updated: {}", updated.len());
        let _ = writeln!(out, "- Up-to-date: {}", up_to_date.len());
        let _ = writeln!(out, "- Failed: {}", failed.len());
        if !self.exclusions.is_empty() {
            let _ = writeln!(out, "- Excluded from server pack: {}", self.exclusions.len());
        }

        if !updated.is_empty() {
            out.push_str("\n## Updated\n\n");
            for entry in updated {
                let new_label = entry.new_label.as_deref().unwrap_or("?");
                let _ = writeln!(
                    out,
                    "- {} (`{}`): {} → {}",
                    entry.heading(),
                    entry.file_name,
                    entry.previous_label,
                    new_label
                );
            }
        }

        if !up_to_date.is_empty() {
            out.push_str("\n## Up-to-date\n\n");
            for entry in up_to_date {
                let _ = writeln!(out, "- {} (`{}`): {}", entry.heading(), entry.file_name, entry.previous_label);
            }
        }

        if !failed.is_empty() {
            out.push_str("\n## Failed\n\n");
            for entry in failed {
                let reason = entry.reason.as_deref().unwrap_or("unknown error");
                let _ = writeln!(
                    out,
                    "- {} (`{}`): {}, kept at {}",
                    entry.heading(),
                    entry.file_name,
                    reason,
                    entry.previous_label
                );
            }
        }

        if !self.exclusions.is_empty() {
            out.push_str("\n## Excluded from server pack\n\n");
            for exclusion in &self.exclusions {
                let _ = writeln!(out, "- **{}** (`{}`): {}", exclusion.id, exclusion.file_name, exclusion.reason);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Local, TimeZone};
    use packup_component::{Hashes, Id, ModEntry, RuntimePath, ServerSupport};
    use packup_pack::candidate::{CandidateFile, VersionCandidate};
    use packup_pack::instance::Loader;
    use url::Url;

    use super::Changelog;
    use crate::resolve::{FailureReason, ResolvedMod, Status, StatusTag};
    use crate::server::Exclusion;

    fn resolved(name: &str, status: Status) -> ResolvedMod {
        let path = RuntimePath::try_from(format!("mods/{name}.jar").as_str()).unwrap();
        let url = Url::parse(&format!("https://example.com/{name}.jar")).unwrap();
        let entry = ModEntry::new(path.clone(), Hashes::of(name.as_bytes()), None, vec![url], 1);
        ResolvedMod {
            entry,
            previous_label: "1.0".into(),
            candidate: None,
            destination: path,
            status,
            title: None,
        }
    }

    fn updated(name: &str, version_number: &str) -> ResolvedMod {
        let file_name = format!("{name}-{version_number}.jar");
        let candidate = VersionCandidate {
            id: "B".into(),
            version_number: version_number.into(),
            loaders: BTreeSet::from([Loader::Fabric]),
            game_versions: vec!["1.21.6".into()],
            file: CandidateFile {
                url: Url::parse(&format!("https://cdn.modrinth.com/data/P/versions/B/{file_name}")).unwrap(),
                file_name: file_name.clone(),
                hashes: Hashes::of(file_name.as_bytes()),
                size: 1,
            },
            server_support: ServerSupport::Unknown,
        };
        let base = resolved(name, Status::Updated);
        ResolvedMod {
            destination: base.entry.path.with_file_name(&file_name).unwrap(),
            candidate: Some(candidate),
            ..base
        }
    }

    #[test]
    fn updated_mods_show_both_versions() {
        let mut sodium = updated("sodium", "0.6.2");
        sodium.title = Some("Sodium".into());
        let resolved = [updated("lithium", "0.15.0"), sodium];
        let changelog = Changelog::new("Cozy", &resolved);
        let report = changelog.render();

        assert!(report.contains("- Updated: 2\n"));
        assert!(report.contains(
            "## Updated\n\n- **lithium** (`lithium-0.15.0.jar`): 1.0 → 0.15.0\n- **Sodium** (sodium) (`sodium-0.6.2.jar`): 1.0 → 0.6.2\n"
        ));
        assert!(!report.contains("## Up-to-date"));
        assert!(changelog.entries().iter().all(|entry| entry.status == StatusTag::Updated));
    }

    #[test]
    fn sections_follow_status() {
        let resolved = [
            resolved("sodium", Status::UpToDate),
            resolved("lithium", Status::Failed(FailureReason::NoCompatibleVersion)),
            resolved("iris", Status::UpToDate),
        ];
        let report = Changelog::new("Cozy", &resolved).render();

        assert!(report.starts_with("# Cozy changelog\n"));
        assert!(report.contains("- Up-to-date: 2\n"));
        assert!(report.contains("- Failed: 1\n"));
        assert!(!report.contains("## Updated"));
        assert!(report.contains("- **lithium** (`lithium.jar`): no version is compatible with the pack, kept at 1.0"));

        let sodium = report.find("**sodium**").unwrap();
        let iris = report.find("**iris**").unwrap();
        assert!(sodium < iris);
        assert!(!report.contains("Excluded"));
    }

    #[test]
    fn exclusions_and_timestamp() {
        let timestamp = Local.with_ymd_and_hms(2025, 6, 20, 12, 30, 0).unwrap();
        let report = Changelog::new("Cozy", &[])
            .with_exclusions(&[Exclusion {
                id: Id::from("sodium".to_string()),
                file_name: "sodium.jar".into(),
                reason: "the hosting service marks it as client-only".into(),
            }])
            .with_timestamp(timestamp)
            .render();

        assert!(report.contains("**Update time:** 2025-06-20 12:30:00"));
        assert!(report.contains("- Excluded from server pack: 1"));
        assert!(report.contains("## Excluded from server pack\n\n- **sodium** (`sodium.jar`): the hosting service marks it as client-only"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let resolved = [resolved("sodium", Status::UpToDate)];
        let changelog = Changelog::new("Cozy", &resolved);
        assert_eq!(changelog.render(), changelog.render());
    }
}
