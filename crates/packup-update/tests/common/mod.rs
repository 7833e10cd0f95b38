#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

use packup_component::{Env, Hashes, ModEntry, Requirement, RuntimePath, ServerSupport, Sha1};
use packup_pack::Pack;
use packup_pack::candidate::{CandidateFile, VersionCandidate};
use packup_pack::instance::version::MinecraftVersion;
use packup_pack::instance::{Instance, Loader};
use packup_repository::{Identified, SourceError, VersionSource};
use parking_lot::Mutex;
use url::Url;

/// An in-memory hosting service.
#[derive(Default)]
pub struct FakeSource {
    pub versions: HashMap<String, Vec<VersionCandidate>>,
    pub files: HashMap<Url, Vec<u8>>,
    pub server_side: HashMap<String, ServerSupport>,
    /// Projects whose server support can't be looked up.
    pub server_side_errors: HashSet<String>,
    pub titles: HashMap<String, String>,
    pub identities: HashMap<Sha1, Identified>,
    pub downloads: Mutex<Vec<Url>>,
}

impl FakeSource {
    /// Publishes `candidate` for `project`, serving `content` as its file.
    pub fn publish(&mut self, project: &str, candidate: VersionCandidate, content: &[u8]) {
        self.files.insert(candidate.file.url.clone(), content.to_vec());
        self.versions
            .entry(project.to_string())
            .or_default()
            .push(candidate);
    }

    pub fn download_count(&self) -> usize {
        self.downloads.lock().len()
    }
}

impl VersionSource for FakeSource {
    fn list_versions(&self, project_id: &str) -> Result<Vec<VersionCandidate>, SourceError> {
        self.versions
            .get(project_id)
            .cloned()
            .ok_or_else(|| SourceError::unavailable(format!("project {project_id} does not exist")))
    }

    fn project_title(&self, project_id: &str) -> Result<Option<String>, SourceError> {
        Ok(self.titles.get(project_id).cloned())
    }

    fn server_support(&self, project_id: &str, _version_id: &str) -> Result<ServerSupport, SourceError> {
        if self.server_side_errors.contains(project_id) {
            return Err(SourceError::unavailable("503 Service Unavailable"));
        }
        Ok(self.server_side.get(project_id).copied().unwrap_or_default())
    }

    fn identify(&self, sha1: &Sha1) -> Result<Option<Identified>, SourceError> {
        Ok(self.identities.get(sha1).cloned())
    }

    fn download(&self, url: &Url) -> Result<Vec<u8>, SourceError> {
        self.downloads.lock().push(url.clone());
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::unavailable(format!("{url} returned 404")))
    }
}

pub fn cdn_url(project: &str, version: &str, file_name: &str) -> Url {
    Url::parse(&format!(
        "https://cdn.modrinth.com/data/{project}/versions/{version}/{file_name}"
    ))
    .unwrap()
}

pub fn file_name(project: &str, version_number: &str) -> String {
    format!("{project}-{version_number}.jar")
}

/// A version of `project` whose file contains `content`.
pub fn candidate(
    project: &str,
    id: &str,
    version_number: &str,
    loaders: &[Loader],
    game_versions: &[&str],
    content: &[u8],
) -> VersionCandidate {
    let file_name = file_name(project, version_number);
    VersionCandidate {
        id: id.into(),
        version_number: version_number.into(),
        loaders: loaders.iter().copied().collect::<BTreeSet<_>>(),
        game_versions: game_versions.iter().map(ToString::to_string).collect(),
        file: CandidateFile {
            url: cdn_url(project, id, &file_name),
            hashes: Hashes::of(content),
            size: content.len() as u64,
            file_name,
        },
        server_support: ServerSupport::Unknown,
    }
}

/// An entry pinned at `candidate`, as a pack's index would declare it.
pub fn pinned_entry(candidate: &VersionCandidate) -> ModEntry {
    let path = RuntimePath::try_from(format!("mods/{}", candidate.file.file_name).as_str()).unwrap();
    ModEntry::new(
        path,
        candidate.file.hashes.clone(),
        Some(Env::BOTH),
        vec![candidate.file.url.clone()],
        candidate.file.size,
    )
}

pub fn client_only_env() -> Env {
    Env {
        client: Requirement::Required,
        server: Requirement::Unsupported,
    }
}

pub fn pack(loader: Loader, mods: Vec<ModEntry>) -> Pack {
    Pack {
        name: "Cozy Pack".into(),
        version_id: "1.0.0".into(),
        summary: None,
        instance: Instance::new(MinecraftVersion::from("1.21.6"), loader, "0.29.0".into()),
        mods,
        passthrough: vec![],
        overrides: None,
    }
}

/// Writes the pinned files of `pack` into `instance_directory`.
pub fn install(pack: &Pack, source: &FakeSource, instance_directory: &Path) {
    for entry in &pack.mods {
        let path = entry.path.under(instance_directory);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let content = entry
            .downloads
            .iter()
            .find_map(|url| source.files.get(url))
            .unwrap();
        fs::write(path, content).unwrap();
    }
}
