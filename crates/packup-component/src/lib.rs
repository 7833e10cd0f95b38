//! This crate is a part of **[packup]**.
//!
//! ## What's in here?
//!
//! The smallest building blocks of a modpack as **packup** sees them: the
//! [`ModEntry`] declared in a pack's index, its [`Env`]ironment requirements,
//! the [`Hashes`] that pin its file, and the [`RuntimePath`] it is installed
//! at. Nothing here talks to the network or the filesystem.
//!
//! [packup]: https://github.com/packup-mc/packup

use std::fmt;

use nutype::nutype;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

mod entry;
mod runtime;
pub use entry::*;
pub use runtime::*;

/// An identifier of a [`ModEntry`].
///
/// Usually a Modrinth project ID, which is case-sensitive, so unlike a slug
/// this one is only trimmed and never lowercased.
#[nutype(
    sanitize(trim),
    derive(
        From,
        Into,
        Serialize,
        Deserialize,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Clone,
        Debug,
    )
)]
pub struct Id(String);

/// Possible relations between a file and its loading environment.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "camelCase")]
pub enum Requirement {
    #[serde(alias = "incompatible")]
    Unsupported,
    Optional,
    #[serde(other)]
    Required,
}

/// Client- and server-side requirements of a file, as declared in an index.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Env {
    pub client: Requirement,
    pub server: Requirement,
}

impl Env {
    pub const BOTH: Self = Self {
        client: Requirement::Required,
        server: Requirement::Required,
    };
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match (self.client, self.server) {
            (
                Requirement::Required | Requirement::Optional,
                Requirement::Required | Requirement::Optional,
            ) => "client/server",
            (Requirement::Optional | Requirement::Required, Requirement::Unsupported) => "client",
            (Requirement::Unsupported, Requirement::Required | Requirement::Optional) => "server",
            (Requirement::Unsupported, Requirement::Unsupported) => "nowhere",
        };
        write!(f, "{repr}")
    }
}

/// Whether a mod can run on a dedicated server, as reported by the hosting
/// service.
///
/// Unlike [`Requirement`], the service may simply not know.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServerSupport {
    Required,
    Optional,
    Unsupported,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ServerSupport {
    /// Whether a mod with this support level belongs in a server package.
    ///
    /// [`Unknown`](Self::Unknown) counts as [`Optional`](Self::Optional): a
    /// server pack with one mod too many is easier to notice and fix than
    /// one that silently lacks a mod.
    #[must_use]
    pub const fn is_included(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl From<Requirement> for ServerSupport {
    fn from(requirement: Requirement) -> Self {
        match requirement {
            Requirement::Required => Self::Required,
            Requirement::Optional => Self::Optional,
            Requirement::Unsupported => Self::Unsupported,
        }
    }
}

/// **SHA1** and **SHA512** hashes of a file, combined.
#[serde_as]
#[must_use]
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Hashes {
    pub sha1: Sha1,
    pub sha512: Sha512,
}

impl Hashes {
    /// Hashes `bytes` with both algorithms.
    pub fn of(bytes: &[u8]) -> Self {
        Self {
            sha1: Sha1::digest(bytes),
            sha512: Sha512::digest(bytes),
        }
    }

    /// Checks that `bytes` hash to exactly these [`Hashes`].
    ///
    /// # Errors
    ///
    /// Returns a [`HashMismatch`] naming the first algorithm that disagrees.
    pub fn verify(&self, bytes: &[u8]) -> Result<(), HashMismatch> {
        let actual = Self::of(bytes);
        if actual.sha1 != self.sha1 {
            return Err(HashMismatch {
                algorithm: "sha1",
                expected: self.sha1.to_string(),
                actual: actual.sha1.to_string(),
            });
        }
        if actual.sha512 != self.sha512 {
            return Err(HashMismatch {
                algorithm: "sha512",
                expected: self.sha512.to_string(),
                actual: actual.sha512.to_string(),
            });
        }
        Ok(())
    }
}

/// Downloaded bytes did not hash to what the hosting service declared.
#[derive(thiserror::Error, Serialize, Clone, PartialEq, Eq, Debug)]
#[error("{algorithm} mismatch: expected {expected}, got {actual}")]
pub struct HashMismatch {
    pub algorithm: &'static str,
    pub expected: String,
    pub actual: String,
}

/// A thin wrapper around a [`serde`]-compatible **SHA1** hash.
#[serde_as]
#[must_use]
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Sha1(#[serde_as(as = "serde_with::hex::Hex")] [u8; 20]);

impl Sha1 {
    pub fn digest(bytes: &[u8]) -> Self {
        use sha1::Digest;
        let mut raw = [0; 20];
        raw.copy_from_slice(&sha1::Sha1::digest(bytes));
        Self(raw)
    }
}

impl fmt::Display for Sha1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

/// A thin wrapper around a [`serde`]-compatible **SHA512** hash.
#[serde_as]
#[must_use]
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Sha512(#[serde_as(as = "serde_with::hex::Hex")] [u8; 64]);

impl Sha512 {
    pub fn digest(bytes: &[u8]) -> Self {
        use sha2::Digest;
        let mut raw = [0; 64];
        raw.copy_from_slice(&sha2::Sha512::digest(bytes));
        Self(raw)
    }
}

impl fmt::Display for Sha512 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}
