//! TexHub: incremental texture catalog.
//!
//! Thin binary entry point. All logic lives in the `texhub-core` crate.

mod cli;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Command, IgnoreAction};
use std::io;
use std::path::{Path, PathBuf};
use texhub_core::analysis::{self, BrowseQuery};
use texhub_core::changes::{self, ImportBatch};
use texhub_core::config::TexHubConfig;
use texhub_core::library;
use texhub_core::model::{AssetId, Category};
use texhub_core::orchestrator::{Orchestrator, ScanOutcome, ScanProgress};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let root = cli.project.clone();
    let config = TexHubConfig::load(&root)
        .with_context(|| format!("loading configuration for {}", root.display()))?;

    run(&root, &config, cli.command)
}

fn open(root: &Path, config: &TexHubConfig) -> anyhow::Result<Orchestrator> {
    Orchestrator::open(root, config)
        .with_context(|| format!("opening project {}", root.display()))
}

fn run(root: &Path, config: &TexHubConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Folders => {
            for category in Category::ALL {
                let dir = library::ensure_category_folder(root, config, category)?;
                println!("{category}: {}", dir.display());
            }
            Ok(())
        }

        Command::Scan { rebuild } => full_scan(&open(root, config)?, rebuild),

        Command::Import { paths } => {
            let orchestrator = open(root, config)?;
            let batch = ImportBatch::imported(absolute(root, paths));
            match changes::apply_import_batch(&orchestrator, &batch)? {
                Some(summary) => println!(
                    "{} materials rescanned: {} new, {} updated, {} unchanged",
                    summary.materials, summary.inserted, summary.updated, summary.unchanged
                ),
                None => println!("No materials among the given paths"),
            }
            Ok(())
        }

        Command::List {
            category,
            sort,
            search,
            include_ignored,
            all_duplicates,
        } => {
            let orchestrator = open(root, config)?;
            let query = BrowseQuery {
                category,
                search,
                include_ignored,
                collapse_duplicates: !all_duplicates,
                sort,
            };
            let catalog = orchestrator.catalog().read();
            let records = analysis::browse(&catalog, &query);
            for record in &records {
                let hsv = record.color_signature.unwrap_or_default();
                println!(
                    "{:<34} h={:.3} s={:.3} v={:.3} spread={:.3}  {}",
                    record.identity,
                    hsv.h,
                    hsv.s,
                    hsv.v,
                    record.color_spread,
                    record.location.display()
                );
            }
            println!("{} textures in {category}", records.len());
            Ok(())
        }

        Command::Duplicates => {
            let orchestrator = open(root, config)?;
            let catalog = orchestrator.catalog().read();
            let groups = analysis::find_duplicates(&catalog);
            for group in &groups {
                println!("{}", group.hash);
                for record in &group.records {
                    println!("  [{}] {}", record.category, record.location.display());
                }
            }
            println!("{} duplicate groups", groups.len());
            Ok(())
        }

        Command::Ignore { action } => {
            let orchestrator = open(root, config)?;
            let mut catalog = orchestrator.catalog().write();
            match action {
                IgnoreAction::Add { identity } => {
                    if !catalog.add_ignore(AssetId::new(&identity))? {
                        println!("{identity} is already ignored");
                    }
                }
                IgnoreAction::Remove { identity } => {
                    if !catalog.remove_ignore(&AssetId::new(&identity))? {
                        println!("{identity} was not ignored");
                    }
                }
                IgnoreAction::List => {
                    for identity in catalog.ignored() {
                        println!("{identity}");
                    }
                }
            }
            Ok(())
        }

        Command::Add { category, paths } => {
            let orchestrator = open(root, config)?;
            let copied = library::add_to_category(
                orchestrator.host().as_ref(),
                root,
                config,
                category,
                &absolute(root, paths),
            )?;
            println!("Copied {} textures into {category}", copied.len());
            full_scan(&orchestrator, false)
        }

        Command::Export { out } => {
            let orchestrator = open(root, config)?;
            let catalog = orchestrator.catalog().read();
            let rows = match out {
                Some(path) => analysis::export_csv(&path, catalog.records())
                    .with_context(|| format!("writing {}", path.display()))?,
                None => analysis::write_csv(io::stdout().lock(), catalog.records())?,
            };
            tracing::info!("Exported {rows} records");
            Ok(())
        }
    }
}

/// Run a full scan on the background scanner thread, logging progress in
/// 10% steps until it finishes.
fn full_scan(orchestrator: &Orchestrator, rebuild: bool) -> anyhow::Result<()> {
    let handle = orchestrator.start_full_scan(rebuild)?;
    let mut last_decile = -1;

    for progress in handle.progress_rx.iter() {
        match progress {
            ScanProgress::Update { fraction, phase } => {
                let decile = (fraction * 10.0) as i32;
                if decile > last_decile {
                    last_decile = decile;
                    tracing::info!("{:>3.0}% ({phase:?})", fraction * 100.0);
                }
            }
            ScanProgress::Complete { .. }
            | ScanProgress::Cancelled { .. }
            | ScanProgress::Failed { .. } => break,
        }
    }

    match handle.wait() {
        ScanOutcome::Completed(summary) => {
            println!(
                "Scan complete: {} new, {} updated, {} unchanged, {} skipped, {} pruned ({} materials)",
                summary.inserted,
                summary.updated,
                summary.unchanged,
                summary.skipped,
                summary.pruned,
                summary.materials
            );
            Ok(())
        }
        ScanOutcome::Cancelled(_) => bail!("scan was cancelled"),
        ScanOutcome::Failed(message) => bail!("scan failed: {message}"),
    }
}

fn absolute(root: &Path, paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .map(|p| if p.is_absolute() { p } else { root.join(p) })
        .collect()
}
