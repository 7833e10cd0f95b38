use std::collections::BTreeSet;

use packup_component::{Hashes, ServerSupport};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::instance::Instance;
use crate::instance::Loader;
use crate::instance::version::GameVersionMatch;

/// One published version of a mod, as the hosting service describes it.
///
/// Candidates are fetched anew for every resolution and never stored.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[must_use]
pub struct VersionCandidate {
    pub id: String,
    /// The human-facing label of this version, like `0.6.13+mc1.21.6`.
    pub version_number: String,
    pub loaders: BTreeSet<Loader>,
    pub game_versions: Vec<String>,
    pub file: CandidateFile,
    #[serde(default)]
    pub server_support: ServerSupport,
}

/// The file a [`VersionCandidate`] installs.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub struct CandidateFile {
    pub url: Url,
    pub file_name: String,
    pub hashes: Hashes,
    pub size: u64,
}

impl VersionCandidate {
    /// The best match among this candidate's game versions for `instance`,
    /// or [`None`] if the candidate does not run on the instance's loader.
    #[must_use]
    pub fn fit(&self, instance: &Instance) -> Option<GameVersionMatch> {
        if !instance.loader.accepts(&self.loaders) {
            return None;
        }
        self.game_versions
            .iter()
            .filter_map(|declared| instance.minecraft_version.match_declared(declared))
            .max()
    }

    #[must_use]
    pub fn is_native_to(&self, loader: Loader) -> bool {
        self.loaders.contains(&loader)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use packup_component::{Hashes, ServerSupport};
    use rstest::rstest;
    use url::Url;

    use super::{CandidateFile, VersionCandidate};
    use crate::instance::version::{GameVersionMatch, MinecraftVersion};
    use crate::instance::{Instance, Loader};

    fn candidate(loaders: &[Loader], game_versions: &[&str]) -> VersionCandidate {
        VersionCandidate {
            id: "abc".into(),
            version_number: "1.0.0".into(),
            loaders: loaders.iter().copied().collect::<BTreeSet<_>>(),
            game_versions: game_versions.iter().map(ToString::to_string).collect(),
            file: CandidateFile {
                url: Url::parse("https://cdn.modrinth.com/data/p/versions/abc/mod.jar").unwrap(),
                file_name: "mod.jar".into(),
                hashes: Hashes::of(b"mod"),
                size: 3,
            },
            server_support: ServerSupport::Unknown,
        }
    }

    #[rstest]
    #[case(&[Loader::Quilt], &["1.21.6"], Some(GameVersionMatch::Exact))]
    #[case(&[Loader::Fabric], &["1.21.4", "1.21.6"], Some(GameVersionMatch::Exact))]
    #[case(&[Loader::Fabric], &["1.21.4"], Some(GameVersionMatch::SubVersion))]
    #[case(&[Loader::Forge], &["1.21.6"], None)]
    #[case(&[Loader::Quilt], &["1.20.1"], None)]
    fn fit_on_quilt(
        #[case] loaders: &[Loader],
        #[case] game_versions: &[&str],
        #[case] expected: Option<GameVersionMatch>,
    ) {
        let instance = Instance::new(
            MinecraftVersion::from("1.21.6"),
            Loader::Quilt,
            "0.29.0".into(),
        );
        assert_eq!(candidate(loaders, game_versions).fit(&instance), expected);
    }
}
