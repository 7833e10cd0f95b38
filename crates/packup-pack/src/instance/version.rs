use std::fmt;
use std::str::FromStr;

pub use semver;
use serde::{Deserialize, Serialize};

/// A [version of Minecraft], be it semantic one, a [`Snapshot`] or whatever.
///
/// # Note on possible edge cases
///
/// Minecraft's versioning is not [semver]. There are [`Snapshot`]s, April
/// Fools' releases like `22w13oneblockatatime`, `1.17` (a valid Minecraft
/// version, but not a valid semantic one) and `1.10-pre2`. Anything that
/// can't be understood ends up as [`MinecraftVersion::Unknown`] and only ever
/// matches itself.
///
/// [version of Minecraft]: https://minecraft.wiki/w/Java_Edition_version_history
/// [semver]: https://semver.org
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug)]
#[serde(untagged)]
#[must_use]
pub enum MinecraftVersion {
    /// A regular minecraft semantic version, like `1.20.1` or `1.18.2-pre3`.
    Semantic(semver::Version),
    /// A minecraft snapshot, like [`18w10d`](https://minecraft.wiki/w/18w10d) or [`14w26a`](https://minecraft.wiki/w/14w26a).
    Snapshot(Snapshot),
    /// Some other minecraft version nobody prepared this thing for.
    Unknown(String),
}

/// How well a game version declared by a mod version fits the target one.
///
/// Ordered from worst to best, so [`Iterator::max`] picks the best match.
#[derive(Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[serde(rename_all = "snake_case")]
pub enum GameVersionMatch {
    /// An older patch release of the same `major.minor` line, like `1.21.4`
    /// for a `1.21.6` target.
    SubVersion,
    /// The very same version.
    Exact,
}

impl MinecraftVersion {
    /// Matches a version declared by a mod against this (target) version.
    ///
    /// Pre-releases and snapshots only ever match exactly. A newer patch
    /// release than the target is never a match.
    #[must_use]
    pub fn match_declared(&self, declared: &str) -> Option<GameVersionMatch> {
        let declared = Self::from(declared);
        if declared == *self {
            return Some(GameVersionMatch::Exact);
        }
        match (self, &declared) {
            (Self::Semantic(target), Self::Semantic(declared))
                if target.pre.is_empty()
                    && declared.pre.is_empty()
                    && target.major == declared.major
                    && target.minor == declared.minor
                    && declared.patch <= target.patch =>
            {
                Some(GameVersionMatch::SubVersion)
            }
            _ => None,
        }
    }
}

impl<S> From<S> for MinecraftVersion
where
    S: AsRef<str>,
{
    fn from(value: S) -> Self {
        let str = value.as_ref().trim();
        match semver::Version::from_str(str) {
            Ok(version) => Self::Semantic(version),
            Err(_) => {
                if let Ok(version) = semver::Version::from_str(&format!("{str}.0")) {
                    // HACK: This lets versions like `1.17` parse into [`Self::Semantic`]
                    // instead of [`Self::Unknown`], however this won't help with `1.10-pre2`.
                    Self::Semantic(version)
                } else if let Ok(snapshot) = Snapshot::from_str(str) {
                    Self::Snapshot(snapshot)
                } else {
                    Self::Unknown(str.to_string())
                }
            }
        }
    }
}

impl fmt::Display for MinecraftVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string_repr = match self {
            Self::Snapshot(snapshot) => snapshot.to_string(),
            Self::Unknown(string_ref) => string_ref.to_string(),
            Self::Semantic(version) => {
                let string_repr = version.to_string();
                match version.patch {
                    0 => string_repr.replacen(".0", "", 1),
                    _ => string_repr,
                }
            }
        };
        write!(f, "{string_repr}")?;
        Ok(())
    }
}

/// A [Minecraft snapshot](https://minecraft.wiki/w/Snapshot), like `18w10d`.
///
/// Snapshots use the format `YYwWWn`: two-digit year, a literal `w`, the
/// two-digit week number and a letter that increments when more than one
/// snapshot was released that week. April Fools' snapshots like `24w14potato`
/// don't fit and end up as [`MinecraftVersion::Unknown`].
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug)]
#[must_use]
pub struct Snapshot {
    pub year: u8,
    pub week: u8,
    pub identifier: char,
}

impl Snapshot {
    /// The length of a string-represented snapshot, in chars.
    pub const LENGTH: usize = "YYwWWn".len();

    /// A shorthand for creating a [`Snapshot`].
    pub const fn new(year: u8, week: u8, identifier: char) -> Self {
        Self {
            year,
            week,
            identifier,
        }
    }
}

/// Errors that may occur when parsing a [`Snapshot`] string.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SnapshotParseError {
    #[error("The snapshot string was {0} chars long, which is invalid")]
    WrongLength(usize),
    #[error("The snapshot string is not shaped like `YYwWWn`")]
    Malformed,
    #[error(transparent)]
    ParseIntError(#[from] std::num::ParseIntError),
}

impl FromStr for Snapshot {
    type Err = SnapshotParseError;

    fn from_str(str: &str) -> Result<Self, Self::Err> {
        if str.len() != Self::LENGTH {
            return Err(SnapshotParseError::WrongLength(str.len()));
        }
        if !str.is_ascii() || &str[2..3] != "w" {
            return Err(SnapshotParseError::Malformed);
        }
        let year: u8 = str[0..2].parse()?;
        let week: u8 = str[3..5].parse()?;
        let identifier = str
            .chars()
            .last()
            .filter(char::is_ascii_lowercase)
            .ok_or(SnapshotParseError::Malformed)?;
        Ok(Self::new(year, week, identifier))
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}w{:02}{}", self.year, self.week, self.identifier)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;
    use semver::Version as Semver;

    use super::{GameVersionMatch, MinecraftVersion, Snapshot};

    #[rstest]
    #[case("24w01a", Snapshot::new(24, 1, 'a'))]
    #[case("18w10d", Snapshot::new(18, 10, 'd'))]
    #[case("15w35e", Snapshot::new(15, 35, 'e'))]
    #[case("14w26a", Snapshot::new(14, 26, 'a'))]
    fn snapshot_parsing(#[case] string_repr: &str, #[case] snapshot: Snapshot) {
        let _ = color_eyre::install();
        assert_eq!(string_repr, snapshot.to_string());
        assert_eq!(Ok(snapshot), Snapshot::from_str(string_repr));
    }

    #[rstest]
    #[case::semver("1.20.1", MinecraftVersion::Semantic(Semver::new(1, 20, 1)))]
    #[case::semver("1.12.2", MinecraftVersion::Semantic(Semver::new(1, 12, 2)))]
    #[case::semver("1.17", MinecraftVersion::Semantic(Semver::new(1, 17, 0)))]
    #[case::snapshot("24w01a", MinecraftVersion::Snapshot(Snapshot::new(24, 1, 'a')))]
    #[case::snapshot("18w10d", MinecraftVersion::Snapshot(Snapshot::new(18, 10, 'd')))]
    #[case::semver("1.21.2-rc2", MinecraftVersion::Semantic(Semver::parse("1.21.2-rc2").unwrap()))]
    #[case::semver("1.21.2-pre5", MinecraftVersion::Semantic(Semver::parse("1.21.2-pre5").unwrap()))]
    #[case::unknown("1.5+mod", MinecraftVersion::Unknown(String::from("1.5+mod")))]
    #[case::unknown("24w14potato", MinecraftVersion::Unknown(String::from("24w14potato")))]
    fn version_parsing(#[case] string_repr: &str, #[case] version: MinecraftVersion) {
        let _ = color_eyre::install();
        assert_eq!(string_repr, version.to_string());
        assert_eq!(version, MinecraftVersion::from(string_repr));
    }

    #[rstest]
    #[case("1.21.6", "1.21.6", Some(GameVersionMatch::Exact))]
    #[case("1.21", "1.21.0", Some(GameVersionMatch::Exact))]
    #[case("1.21.6", "1.21.4", Some(GameVersionMatch::SubVersion))]
    #[case("1.21.6", "1.21", Some(GameVersionMatch::SubVersion))]
    #[case("1.21.4", "1.21.6", None)]
    #[case("1.21.6", "1.20.6", None)]
    #[case("1.21.6", "1.21.5-pre1", None)]
    #[case("24w01a", "24w01a", Some(GameVersionMatch::Exact))]
    #[case("24w01a", "24w01b", None)]
    fn game_version_matching(
        #[case] target: &str,
        #[case] declared: &str,
        #[case] expected: Option<GameVersionMatch>,
    ) {
        let target = MinecraftVersion::from(target);
        assert_eq!(target.match_declared(declared), expected);
    }

    #[test]
    fn exact_beats_sub_version() {
        assert!(GameVersionMatch::Exact > GameVersionMatch::SubVersion);
    }
}
