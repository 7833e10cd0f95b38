use std::io;
use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor::{BrightBlue, White, Yellow};
use clap::{Parser, ValueEnum};
use clap_complete::Generator;
use clap_complete::shells::{Bash, Elvish, Fish, PowerShell, Zsh};
use clap_complete_nushell::Nushell;
use packup_pack::Variant;
use packup_pack::settings::{BackupMode, Settings};

/// Styling for [`clap`]'s CLI interface.
const STYLES: Styles = Styles::styled()
    .usage(Yellow.on_default().bold())
    .literal(BrightBlue.on_default().bold())
    .placeholder(White.on_default().bold())
    .header(Yellow.on_default().bold());

#[derive(Parser, Debug)]
#[command(version, author, about, styles(STYLES))]
pub struct Options {
    #[command(subcommand)]
    pub subcommand: Subcommand,

    /// How the final summary is printed.
    #[arg(short, long, value_enum, global = true, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,
}

#[derive(clap::Subcommand, Debug)]
pub enum Subcommand {
    /// Update every mod of a modpack and re-package it.
    Update(UpdateArgs),

    /// Generate shell completions for this tool.
    Completions {
        /// Which shell to generate completions for.
        #[arg(short, long, value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// A directory containing `modrinth.index.json`, the index itself, or an
    /// `.mrpack` archive.
    #[arg(visible_alias = "modpack-dir")]
    pub modpack: PathBuf,

    /// Write a client `.mrpack`.
    #[arg(long)]
    pub client: bool,

    /// Write a server `.mrpack`, without client-only mods.
    #[arg(long)]
    pub server: bool,

    /// Files to copy verbatim into the written packs. Defaults to the
    /// `overrides` directory next to the index.
    #[arg(long)]
    pub overrides_folder: Option<PathBuf>,

    /// Where the pack's `mods/` directory lives.
    #[arg(short, long, default_value = ".")]
    pub instance_dir: PathBuf,

    /// Where packs and the changelog are written.
    #[arg(short = 'O', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// The directory holding `packup.yml`. Defaults to the instance directory.
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// How many mods are processed at once.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// The minimum delay between two requests to Modrinth, in milliseconds.
    #[arg(long)]
    pub request_interval_ms: Option<u64>,

    /// How long a single request may take, in seconds.
    #[arg(long)]
    pub http_timeout_secs: Option<u64>,

    /// Move replaced files to `old_mods/` instead of deleting them.
    #[arg(long)]
    pub keep_old: bool,

    /// Only report what would be updated. Nothing is downloaded or written.
    #[arg(long, visible_alias = "check")]
    pub dry_run: bool,
}

impl UpdateArgs {
    /// Overrides values of `settings` with the ones given on the command line.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(interval) = self.request_interval_ms {
            settings.request_interval_ms = interval;
        }
        if let Some(timeout) = self.http_timeout_secs {
            settings.http_timeout_secs = timeout;
        }
        if self.keep_old {
            settings.backup_mode = BackupMode::Keep;
        }
        settings
    }

    /// The pack variants to be written, in order.
    #[must_use]
    pub fn variants(&self) -> Vec<Variant> {
        [(self.client, Variant::Client), (self.server, Variant::Server)]
            .into_iter()
            .filter_map(|(requested, variant)| requested.then_some(variant))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Yaml,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
#[expect(clippy::enum_variant_names, reason = "PowerShell is a single word")]
pub enum Shell {
    Bash,
    Elvish,
    Fish,
    PowerShell,
    Zsh,
    Nushell,
}

impl Generator for Shell {
    fn file_name(&self, name: &str) -> String {
        match self {
            Self::Bash => Bash.file_name(name),
            Self::Elvish => Elvish.file_name(name),
            Self::Fish => Fish.file_name(name),
            Self::PowerShell => PowerShell.file_name(name),
            Self::Zsh => Zsh.file_name(name),
            Self::Nushell => Nushell.file_name(name),
        }
    }

    fn generate(&self, cmd: &clap::Command, buf: &mut dyn io::Write) {
        match self {
            Self::Bash => Bash.generate(cmd, buf),
            Self::Elvish => Elvish.generate(cmd, buf),
            Self::Fish => Fish.generate(cmd, buf),
            Self::PowerShell => PowerShell.generate(cmd, buf),
            Self::Zsh => Zsh.generate(cmd, buf),
            Self::Nushell => Nushell.generate(cmd, buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use packup_pack::Variant;
    use packup_pack::settings::{BackupMode, Settings};
    use rstest::rstest;

    use super::{Options, Subcommand, UpdateArgs};

    fn update_args(args: &[&str]) -> UpdateArgs {
        let options = Options::try_parse_from(["packup", "update"].iter().chain(args)).unwrap();
        match options.subcommand {
            Subcommand::Update(args) => args,
            Subcommand::Completions { .. } => unreachable!(),
        }
    }

    #[test]
    fn command_is_well_formed() {
        Options::command().debug_assert();
    }

    #[rstest]
    #[case::none(&["pack"], vec![])]
    #[case::client(&["pack", "--client"], vec![Variant::Client])]
    #[case::both(&["pack", "--server", "--client"], vec![Variant::Client, Variant::Server])]
    fn variants(#[case] args: &[&str], #[case] expected: Vec<Variant>) {
        assert_eq!(update_args(args).variants(), expected);
    }

    #[test]
    fn flags_override_settings() {
        let persisted = Settings {
            workers: 2,
            request_interval_ms: 1000,
            ..Settings::default()
        };
        let settings = update_args(&["pack.mrpack", "-w", "8", "--keep-old"]).apply(persisted);
        assert_eq!(settings.workers, 8);
        assert_eq!(settings.request_interval_ms, 1000);
        assert_eq!(settings.backup_mode, BackupMode::Keep);
    }

    #[test]
    fn check_is_a_dry_run() {
        assert!(update_args(&["pack", "--check"]).dry_run);
    }
}
