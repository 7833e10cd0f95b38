use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use version::MinecraftVersion;

/// Some domain-specific types representing Minecraft's version formats.
pub mod version;

/// A struct representing the **Minecraft instance** a pack targets.
///
/// An instance does **NOT** take into account the pack's mods. Those, bundled
/// with an [`Instance`] and the overrides, form a [`Pack`].
///
/// [`Pack`]: crate::Pack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Instance {
    pub minecraft_version: MinecraftVersion,
    pub loader: Loader,
    /// Kept verbatim, loader versions are not semantic for every loader.
    pub loader_version: String,
}

impl Instance {
    pub const fn new(
        minecraft_version: MinecraftVersion,
        loader: Loader,
        loader_version: String,
    ) -> Self {
        Self {
            minecraft_version,
            loader,
            loader_version,
        }
    }

    /// The `dependencies` table of an **`.mrpack`** index for this instance.
    #[must_use]
    pub fn index_dependencies(&self) -> BTreeMap<String, String> {
        let mut dependencies = BTreeMap::from_iter([(
            Loader::MINECRAFT_KEY.to_string(),
            self.minecraft_version.to_string(),
        )]);
        if let Some(key) = self.loader.dependency_key() {
            dependencies.insert(key.to_string(), self.loader_version.clone());
        }
        dependencies
    }
}

/// Possible types of modloaders an [`Instance`] can depend on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Loader {
    /// The [**Forge**](https://minecraftforge.net) modloader.
    Forge,

    /// The [**NeoForge**](https://neoforged.net) modloader.
    ///
    /// Started as a fork of [`Forge`](Loader::Forge), but mods are built
    /// against one or the other.
    Neoforge,

    /// The [**Fabric**](https://fabricmc.net) modloader.
    Fabric,

    /// The [**Quilt**](https://quiltmc.org/en) modloader.
    ///
    /// Runs [`Fabric`](Loader::Fabric) mods as well as its own.
    Quilt,

    /// Some other loader the hosting service reported for a version.
    ///
    /// Shaders say `"iris"` or `"optifine"`, datapacks say `"datapack"`. A
    /// pack can never target one of these.
    #[serde(other)]
    Other,
}

impl Loader {
    pub const MINECRAFT_KEY: &'static str = "minecraft";

    /// Which loaders' builds each target loader can run.
    ///
    /// This table is the only place cross-loader compatibility is decided.
    pub const COMPATIBILITY: [(Self, &'static [Self]); 4] = [
        (Self::Fabric, &[Self::Fabric]),
        (Self::Quilt, &[Self::Quilt, Self::Fabric]),
        (Self::Forge, &[Self::Forge]),
        (Self::Neoforge, &[Self::Neoforge]),
    ];

    /// The loaders whose builds run on `self`.
    #[must_use]
    pub fn runs(self) -> &'static [Self] {
        Self::COMPATIBILITY
            .iter()
            .find(|(target, _)| *target == self)
            .map_or(&[], |(_, accepted)| accepted)
    }

    /// Whether a version built for `candidate_loaders` runs on `self`.
    #[must_use]
    pub fn accepts<'a, I>(self, candidate_loaders: I) -> bool
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let runs = self.runs();
        candidate_loaders
            .into_iter()
            .any(|loader| runs.contains(loader))
    }

    /// The key of this loader in an **`.mrpack`** `dependencies` table.
    #[must_use]
    pub const fn dependency_key(self) -> Option<&'static str> {
        match self {
            Self::Forge => Some("forge"),
            Self::Neoforge => Some("neoforge"),
            Self::Fabric => Some("fabric-loader"),
            Self::Quilt => Some("quilt-loader"),
            Self::Other => None,
        }
    }

    #[must_use]
    pub fn from_dependency_key(key: &str) -> Option<Self> {
        match key {
            "forge" => Some(Self::Forge),
            "neoforge" => Some(Self::Neoforge),
            "fabric-loader" => Some(Self::Fabric),
            "quilt-loader" => Some(Self::Quilt),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::{Instance, Loader};
    use crate::instance::version::MinecraftVersion;

    #[rstest]
    #[case(Loader::Fabric, Loader::Fabric, true)]
    #[case(Loader::Fabric, Loader::Quilt, false)]
    #[case(Loader::Fabric, Loader::Forge, false)]
    #[case(Loader::Fabric, Loader::Neoforge, false)]
    #[case(Loader::Quilt, Loader::Quilt, true)]
    #[case(Loader::Quilt, Loader::Fabric, true)]
    #[case(Loader::Quilt, Loader::Forge, false)]
    #[case(Loader::Quilt, Loader::Neoforge, false)]
    #[case(Loader::Forge, Loader::Forge, true)]
    #[case(Loader::Forge, Loader::Neoforge, false)]
    #[case(Loader::Forge, Loader::Fabric, false)]
    #[case(Loader::Forge, Loader::Quilt, false)]
    #[case(Loader::Neoforge, Loader::Neoforge, true)]
    #[case(Loader::Neoforge, Loader::Forge, false)]
    #[case(Loader::Neoforge, Loader::Fabric, false)]
    #[case(Loader::Neoforge, Loader::Quilt, false)]
    fn compatibility_matrix(
        #[case] target: Loader,
        #[case] candidate: Loader,
        #[case] accepted: bool,
    ) {
        assert_eq!(target.accepts(&[candidate]), accepted);
    }

    #[test]
    fn quilt_is_the_only_cross_loader_pair() {
        let accepted: Vec<_> = Loader::iter()
            .flat_map(|target| Loader::iter().map(move |candidate| (target, candidate)))
            .filter(|(target, candidate)| target.accepts(&[*candidate]))
            .collect();
        assert_eq!(
            accepted,
            vec![
                (Loader::Forge, Loader::Forge),
                (Loader::Neoforge, Loader::Neoforge),
                (Loader::Fabric, Loader::Fabric),
                (Loader::Quilt, Loader::Fabric),
                (Loader::Quilt, Loader::Quilt),
            ]
        );
    }

    #[test]
    fn unknown_loaders_are_never_accepted() {
        for target in Loader::iter() {
            assert!(!target.accepts(&[Loader::Other]));
            assert!(!Loader::Other.accepts(&[target]));
        }
    }

    #[test]
    fn multi_loader_candidates() {
        assert!(Loader::Quilt.accepts(&[Loader::Forge, Loader::Fabric]));
        assert!(!Loader::Fabric.accepts(&[]));
    }

    #[test]
    fn dependency_keys_round_trip() {
        for loader in Loader::iter() {
            if let Some(key) = loader.dependency_key() {
                assert_eq!(Loader::from_dependency_key(key), Some(loader));
            }
        }
        assert_eq!(Loader::from_dependency_key("liteloader"), None);
    }

    #[test]
    fn index_dependencies() {
        let instance = Instance::new(
            MinecraftVersion::from("1.21.6"),
            Loader::Quilt,
            "0.29.0".into(),
        );
        let dependencies = instance.index_dependencies();
        assert_eq!(
            dependencies.into_iter().collect::<Vec<_>>(),
            vec![
                ("minecraft".to_string(), "1.21.6".to_string()),
                ("quilt-loader".to_string(), "0.29.0".to_string()),
            ]
        );
    }
}
