mod cli;

use std::path::Path;
use std::{fs, io};

use chrono::Local;
use clap::{CommandFactory, Parser};
use color_eyre::Section;
use color_eyre::eyre::Report;
use color_eyre::owo_colors::OwoColorize;
use eyre::{Context, eyre};
use packup_pack::Pack;
use packup_pack::settings::Settings;
use packup_repository::persist::{PersistError, PersistedEntity};
use packup_repository::{LocalRepository, ModrinthRepository};
use packup_update::Updater;
use packup_update::assemble::Assembler;
use packup_update::changelog::{Changelog, ChangelogEntry};
use packup_update::gate::IntervalGate;
use packup_update::resolve::{ResolvedMod, Status};
use packup_update::server::Exclusion;
use serde::Serialize;
use tracing::instrument;

use crate::cli::{Options, OutputFormat, Subcommand, UpdateArgs};

fn main() -> Result<(), Report> {
    let options = Options::parse();
    color_eyre::install()?;
    install_tracing()?;

    let status = run_with_options(options);
    if let Err(mut report) = status {
        if let Some(error) = report.downcast_ref::<packup_repository::Error>() {
            match error {
                packup_repository::Error::ManifestInvalid { .. } => {
                    report = report.with_suggestion(|| {
                        "Point packup at a directory containing `modrinth.index.json`, the index itself, or an `.mrpack` file."
                    });
                }
                packup_repository::Error::UnsupportedLoader(_) => {
                    report = report
                        .with_note(|| "Packup understands Fabric, Quilt, Forge and NeoForge packs.");
                }
                packup_repository::Error::DuplicateDestination(_) => {
                    report = report.with_suggestion(|| {
                        "Remove one of the index entries installing to this path."
                    });
                }
                packup_repository::Error::Io { .. } => {
                    report = report
                        .with_note(|| "Packup encountered an I/O error.")
                        .with_suggestion(|| {
                            "Ensure the modpack path is right and you have enough permissions."
                        });
                }
            }
        } else if let Some(error) = report.downcast_ref::<PersistError>() {
            match error {
                PersistError::Io { .. } => {
                    report = report
                        .with_note(|| "Packup encountered an I/O error.")
                        .with_suggestion(|| {
                            "Ensure you're in the right directory and have enough permissions."
                        });
                }
                PersistError::SerdeYml(_) => {
                    report = report
                        .with_note(|| format!("`{}` could not be parsed.", Settings::FILE_PATH))
                        .with_suggestion(|| "Fix or delete the file to fall back to the defaults.");
                }
            }
        }

        return Err(report);
    }

    Ok(())
}

#[instrument(name = "action_handling", skip(options))]
fn run_with_options(options: Options) -> Result<(), Report> {
    match options.subcommand {
        Subcommand::Update(args) => update(&args, options.output_format),
        Subcommand::Completions { shell } => {
            let mut stdout = io::stdout();
            clap_complete::generate(
                shell,
                &mut Options::command(),
                env!("CARGO_CRATE_NAME"),
                &mut stdout,
            );
            Ok(())
        }
    }
}

/// What the `yaml` output format prints.
#[derive(Serialize)]
struct Summary<'a> {
    pack: &'a str,
    updated: usize,
    up_to_date: usize,
    failed: usize,
    mods: &'a [ChangelogEntry],
    excluded_from_server: &'a [Exclusion],
}

fn update(args: &UpdateArgs, output_format: OutputFormat) -> Result<(), Report> {
    let mut local_repository = LocalRepository::open(&args.modpack)?;
    if let Some(overrides) = &args.overrides_folder {
        local_repository.pack.overrides = Some(overrides.clone());
    }
    let pack = &local_repository.pack;

    let config_directory = args.config_dir.as_deref().unwrap_or(&args.instance_dir);
    let settings = args.apply(Settings::read_or_default(config_directory)?);
    tracing::info!(
        name = %pack.name,
        minecraft_version = %pack.instance.minecraft_version,
        loader = %pack.instance.loader,
        mods = pack.mods.len(),
        "Loaded modpack"
    );

    let modrinth_repository = ModrinthRepository::new(settings.http_timeout())
        .wrap_err("Failed to set up the HTTP client")?;
    let gate = IntervalGate::new(settings.request_interval());
    let resolved = Updater::builder()
        .source(&modrinth_repository)
        .gate(&gate)
        .instance_directory(args.instance_dir.clone())
        .settings(settings)
        .dry_run(args.dry_run)
        .build()
        .run(pack, report_progress);

    let assembler = Assembler::new(&modrinth_repository, &gate);
    let mut exclusions = Vec::new();
    for variant in args.variants() {
        let assembly = assembler
            .assemble(pack, &resolved, variant)
            .wrap_err_with(|| format!("Failed to assemble the {variant} pack"))?;
        if !args.dry_run {
            let path = assembly
                .write(&args.output_dir)
                .wrap_err_with(|| format!("Failed to write the {variant} pack"))?;
            tracing::info!(?path, "Wrote the {variant} pack");
        }
        exclusions.extend(assembly.exclusions);
    }

    let changelog = Changelog::new(&pack.name, &resolved)
        .with_exclusions(&exclusions)
        .with_timestamp(Local::now());
    if args.dry_run {
        if output_format == OutputFormat::Human {
            println!("{}", changelog.render());
        }
    } else {
        write_changelog(pack, &changelog, &args.output_dir)?;
    }

    let count = |predicate: fn(&Status) -> bool| {
        resolved.iter().filter(|resolved| predicate(&resolved.status)).count()
    };
    let summary = Summary {
        pack: &pack.name,
        updated: count(|status| matches!(status, Status::Updated)),
        up_to_date: count(|status| matches!(status, Status::UpToDate)),
        failed: count(|status| matches!(status, Status::Failed(_))),
        mods: changelog.entries(),
        excluded_from_server: &exclusions,
    };
    match output_format {
        OutputFormat::Human => {
            eprintln!(
                "{} {}, {} {}, {} {}",
                summary.updated.green().bold(),
                "updated".green(),
                summary.up_to_date.blue().bold(),
                "up-to-date".blue(),
                summary.failed.red().bold(),
                "failed".red(),
            );
            if !exclusions.is_empty() {
                eprintln!("{} excluded from the server pack", exclusions.len().yellow().bold());
            }
        }
        OutputFormat::Yaml => println!("{}", serde_yml::to_string(&summary)?),
    }

    if summary.failed > 0 {
        return Err(eyre!("{} of {} mods could not be updated", summary.failed, resolved.len()))
            .with_note(|| "Failed mods were kept at their previous version.")
            .with_suggestion(|| "Check the changelog for the reason of each failure.");
    }

    Ok(())
}

fn write_changelog(pack: &Pack, changelog: &Changelog, output_directory: &Path) -> Result<(), Report> {
    let path = output_directory.join(pack.changelog_file_name());
    fs::create_dir_all(output_directory)
        .and_then(|()| fs::write(&path, changelog.render()))
        .wrap_err_with(|| format!("Failed to write the changelog to {}", path.display()))?;
    tracing::info!(?path, "Wrote the changelog");
    Ok(())
}

fn report_progress(resolved: &ResolvedMod) {
    let name = resolved.title.clone().unwrap_or_else(|| resolved.entry.id.to_string());
    let id = name.bold();
    match &resolved.status {
        Status::Updated => eprintln!(
            "{:>10} {id} {} {} {}",
            "Updated".green().bold(),
            resolved.previous_label,
            "→".white(),
            resolved.new_label().unwrap_or("?").green(),
        ),
        Status::UpToDate => eprintln!(
            "{:>10} {id} {}",
            "Current".blue().bold(),
            resolved.previous_label.white(),
        ),
        Status::Failed(reason) => eprintln!(
            "{:>10} {id} {}",
            "Failed".red().bold(),
            reason.to_string().red(),
        ),
    }
}

fn install_tracing() -> Result<(), Report> {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};
    let format_layer = fmt::layer().pretty().without_time().with_writer(io::stderr);
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}
