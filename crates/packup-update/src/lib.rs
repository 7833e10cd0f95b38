//! This crate is a part of **[packup]**.
//!
//! The update engine: resolves every mod of a [`Pack`] against a
//! [`VersionSource`], installs the newer files, and assembles client and
//! server packs and a changelog from the outcome.
//!
//! [packup]: https://github.com/packup-mc/packup

#![allow(clippy::missing_errors_doc)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use bon::Builder;
use packup_pack::Pack;
use packup_pack::settings::Settings;
use packup_repository::VersionSource;

pub mod assemble;
pub mod changelog;
pub mod fetch;
pub mod gate;
pub mod resolve;
pub mod server;

use crate::fetch::Fetcher;
use crate::gate::Gate;
use crate::resolve::{ResolvedMod, Resolver};

/// Runs resolution and replacement for every mod of a pack.
#[derive(Builder)]
pub struct Updater<'a> {
    source: &'a dyn VersionSource,
    gate: &'a dyn Gate,
    /// The directory the pack's runtime paths are relative to.
    instance_directory: PathBuf,
    #[builder(default)]
    settings: Settings,
    /// Resolve only: nothing is downloaded or replaced.
    #[builder(default)]
    dry_run: bool,
}

impl Updater<'_> {
    /// Resolves every mod of `pack` and, unless dry-running, installs the
    /// updated ones.
    ///
    /// Mods are processed by a pool of [`Settings::workers`] threads.
    /// `progress` is called on the calling thread once per mod, in
    /// completion order. The returned results are in declaration order.
    pub fn run<F>(&self, pack: &Pack, progress: F) -> Vec<ResolvedMod>
    where
        F: Fn(&ResolvedMod) + Sync,
    {
        let resolver = Resolver::new(self.source, self.gate);
        let fetcher = Fetcher::new(
            self.source,
            self.gate,
            self.instance_directory.clone(),
            self.settings.backup_mode,
        );
        let workers = self.settings.workers().min(pack.mods.len().max(1));
        tracing::info!(mods = pack.mods.len(), workers, dry_run = self.dry_run, "Resolving");

        let next = AtomicUsize::new(0);
        let mut slots: Vec<Option<ResolvedMod>> = pack.mods.iter().map(|_| None).collect();
        let (sender, receiver) = mpsc::channel();

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let sender = sender.clone();
                let (resolver, fetcher, next) = (&resolver, &fetcher, &next);
                scope.spawn(move || {
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(entry) = pack.mods.get(index) else {
                            break;
                        };
                        let resolved = resolver.resolve(entry, pack);
                        let resolved = match self.dry_run {
                            true => resolved,
                            false => fetcher.fetch(resolved),
                        };
                        if sender.send((index, resolved)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(sender);

            for (index, resolved) in receiver {
                progress(&resolved);
                slots[index] = Some(resolved);
            }
        });

        slots.into_iter().flatten().collect()
    }
}
