//! Daily missing-notes run: pull the store down, reconcile the latest
//! scrape into it, build the report, push the store back up.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use log::{info, warn};

use noteminder::collector::{Collector, FileCollector};
use noteminder::config::{DateRange, RunConfig};
use noteminder::db::Database;
use noteminder::error::RunError;
use noteminder::notify::{LogNotifier, Notifier};
use noteminder::reconcile::Reconciler;
use noteminder::report::{assemble, select_missing, ReportSections};
use noteminder::sync::{DirRemote, RemoteStore, RunGuard};

#[derive(Parser, Debug)]
#[command(
    name = "noteminder",
    about = "Check which lessons are missing instructor notes and build the report"
)]
struct Cli {
    /// Portal subdomain of the school to check (e.g. westu-sor).
    #[arg(long)]
    school: Option<String>,

    /// Start of the date window (YYYY-MM-DD). Defaults to 7 days ago.
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// End of the date window (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Path to the scraper's observation handoff file.
    #[arg(long)]
    observations: Option<PathBuf>,

    /// Config file path.
    #[arg(long, default_value = "noteminder.json")]
    config: PathBuf,

    /// Include the missing-notes section (overrides the config file).
    #[arg(long)]
    missing: bool,

    /// Include the completed-notes section (overrides the config file).
    #[arg(long)]
    completed: bool,

    /// Initialize a fresh store and upload it when a remote is configured.
    #[arg(long)]
    init_db: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    let config = RunConfig::load(&cli.config)?;
    let remote = config.remote_dir.clone().map(DirRemote::new);

    if cli.init_db {
        return init_db(&config, remote.as_ref()).await;
    }

    let school = match cli.school.clone().filter(|s| !s.is_empty()) {
        Some(school) => school,
        None if !config.school.is_empty() => config.school.clone(),
        None => bail!("no school configured; pass --school or set it in the config file"),
    };

    let today = Utc::now().date_naive();
    let range = match (cli.start_date, cli.end_date) {
        (Some(start), Some(end)) => DateRange::new(start, end),
        (Some(start), None) => DateRange::new(start, today),
        (None, Some(end)) => DateRange::new(end - Duration::days(7), end),
        (None, None) => DateRange::trailing_week(today),
    };

    let sections = if cli.missing || cli.completed {
        ReportSections {
            missing: cli.missing,
            completed: cli.completed,
        }
    } else {
        config.sections
    };

    // Holds off while a previous run's upload may still be in flight.
    let guard = match &config.remote_dir {
        Some(dir) => {
            let guard = RunGuard::acquire(dir)?;
            info!("Run {} started for {school}", guard.run_id());
            Some(guard)
        }
        None => None,
    };

    if let Some(remote) = &remote {
        remote.download(&config.db_path).await?;
    }

    let db = Database::new(config.db_path.clone())
        .map_err(|err| RunError::StoreUnavailable(err.to_string()))?;

    let observations_path = cli
        .observations
        .context("no observation file given; pass --observations")?;
    let collector = FileCollector::new(observations_path);
    let observations = collector
        .collect(&school, &range)
        .await
        .map_err(|err| RunError::CollectorFailed(err.to_string()))?;
    info!(
        "Collected {} observations for {school} ({} to {})",
        observations.len(),
        range.start,
        range.end
    );

    let reconciler = Reconciler::new(db.clone());
    let outcome = reconciler.reconcile(&school, observations, today).await?;
    if outcome.skipped > 0 {
        warn!("Skipped {} malformed observations", outcome.skipped);
    }
    info!(
        "Reconciled {} observations, {} with new notes",
        outcome.processed,
        outcome.completed.len()
    );

    let missing = select_missing(&db, &school, range).await?;

    match assemble(&school, range, missing, outcome.completed, sections) {
        Some(payload) => {
            if config.recipients.is_empty() {
                warn!(
                    "No recipients configured; skipping report '{}'",
                    payload.subject
                );
            } else {
                LogNotifier.send(&payload, &config.recipients).await?;
            }
        }
        None => info!("Nothing to report for {school}"),
    }

    // Close the store before copying its file anywhere.
    drop(reconciler);
    drop(db);

    if let Some(remote) = &remote {
        remote.upload(&config.db_path).await?;
    }
    drop(guard);

    Ok(())
}

async fn init_db(config: &RunConfig, remote: Option<&DirRemote>) -> Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let mut path = config.db_path.as_os_str().to_owned();
        path.push(suffix);
        let path = PathBuf::from(path);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
        }
    }

    let db = Database::new(config.db_path.clone())
        .map_err(|err| RunError::StoreUnavailable(err.to_string()))?;
    drop(db);
    info!("Fresh store initialized at {}", config.db_path.display());

    if let Some(remote) = remote {
        remote.upload(&config.db_path).await?;
    }
    Ok(())
}
