//! This crate is a part of **[packup]**.
//!
//! Everything **packup** reads from or writes to: the hosting service behind
//! the [`VersionSource`] trait, and modpacks on the local filesystem.
//!
//! [packup]: https://github.com/packup-mc/packup

#![allow(clippy::missing_errors_doc)]

mod local;
mod modrinth;
mod source;
pub use local::*;
pub use modrinth::*;
pub use source::*;
