//! Maintenance commands for one store's media directory.

use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use exn::{OptionExt, ResultExt};
use recall_config::Config;
use recall_media::{Context, MediaEngine, MediaFailure};
use recall_store::{Database, Repository};
use std::path::PathBuf;
use std::process::ExitCode;

/// Keep a flashcard store and its media directory consistent.
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML). Defaults and `RECALL_*` variables apply either way.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the media directory of the configured store
    MediaDir,
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that need the store opened.
#[derive(Subcommand, Debug)]
pub enum StoreCommand {
    /// Report media files edited outside the application
    CheckMedia,
    /// Delete media files no fact references
    CleanMedia,
    /// Copy and register the media referenced by a stored fact
    Ingest {
        /// Id of the fact to ingest
        fact_id: String,
    },
}

pub async fn execute(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let command = match cli.command {
        Commands::MediaDir => {
            println!("{}", config.media_dir().or_raise(|| ErrorKind::Config)?.display());
            return Ok(ExitCode::SUCCESS);
        },
        Commands::Store(command) => command,
    };

    tokio::fs::create_dir_all(&config.data_dir).await.or_raise(|| ErrorKind::DataDir)?;
    let db = Database::connect(config.database_path()).await.or_raise(|| ErrorKind::Store)?;
    let repo = Repository::from(&db);
    let engine = MediaEngine::new(&config, repo.clone()).or_raise(|| ErrorKind::Media)?;
    tracing::debug!(database = %config.database_path().display(), media = %engine.media_dir().display(), "Opened store");

    let result = run(&engine, &repo, command).await;
    db.close().await;
    result
}

async fn run(engine: &MediaEngine, repo: &Repository, command: StoreCommand) -> Result<ExitCode> {
    match command {
        StoreCommand::CheckMedia => {
            for filename in engine.detect_edited_media_files().await.or_raise(|| ErrorKind::Media)? {
                println!("{filename}");
            }
            Ok(ExitCode::SUCCESS)
        },
        StoreCommand::CleanMedia => {
            let reclaim = engine.reclaim_orphaned_media().await.or_raise(|| ErrorKind::Media)?;
            for filename in &reclaim.deleted {
                println!("{filename}");
            }
            Ok(report(&reclaim.failures))
        },
        StoreCommand::Ingest { fact_id } => {
            let fact = repo
                .get_fact(&fact_id)
                .await
                .or_raise(|| ErrorKind::Store)?
                .ok_or_raise(|| ErrorKind::FactNotFound(fact_id.clone()))?;
            let ingest = engine.ingest(&fact, &Context::local()).await.or_raise(|| ErrorKind::Media)?;
            for filename in &ingest.added {
                println!("{filename}");
            }
            Ok(report(&ingest.failures))
        },
    }
}

fn report(failures: &[MediaFailure]) -> ExitCode {
    for failure in failures {
        eprintln!("{}: {}", failure.path, failure.error);
    }
    match failures.is_empty() {
        true => ExitCode::SUCCESS,
        false => ExitCode::FAILURE,
    }
}
