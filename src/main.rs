use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use playback_session::config::Config;
use playback_session::db::Database;
use playback_session::db::repository::HistoryRepositoryImpl;
use playback_session::player::NoOverlay;
use playback_session::replay::{self, LoggingEngine, ReplayScript};
use playback_session::services::{FolderSeriesResolver, SessionStores};
use playback_session::spawn_session;

/// Replay a scripted playback session against a logging engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON script of engine events and user commands
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Config file to use instead of the default location
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file to use instead of the configured one
    #[arg(short = 'd', long = "database", value_name = "FILE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("playback_session=debug")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(database) = args.database {
        config.storage.database_path = Some(database);
    }

    let db = Database::connect(&config.database_path()?).await?;
    db.migrate().await?;
    let stores = SessionStores::from_database(db.get_connection());

    let script = ReplayScript::from_file(&args.script).await?;
    info!(
        "Replaying {} steps against {}",
        script.steps.len(),
        script.video
    );

    let engine = LoggingEngine::new(script.chapters.clone());
    let handle = spawn_session(
        config,
        Box::new(engine.clone()),
        stores,
        Arc::new(FolderSeriesResolver::default()),
        Arc::new(NoOverlay),
    );
    let mut events = handle.take_event_receiver();

    let snapshot = replay::run(&script, &handle, &engine).await;
    handle.teardown().await?;
    let snapshot = snapshot?;

    if let Some(events) = events.as_mut() {
        println!("Session events:");
        while let Ok(event) = events.try_recv() {
            println!("  {:?}", event);
        }
    }

    println!("Engine calls:");
    for call in engine.calls().await {
        println!("  {}", call);
    }

    println!("Final state: {}", snapshot.session.state);
    println!(
        "Position: {:.1}s / {:.1}s",
        snapshot.session.position, snapshot.session.duration
    );
    if let Some(index) = snapshot.series_index {
        println!("Episode {} of {}", index + 1, snapshot.series_len);
    }

    let recent = HistoryRepositoryImpl::new(db.get_connection())
        .find_recent(5)
        .await?;
    if !recent.is_empty() {
        println!("Recently played:");
        for entry in recent {
            println!(
                "  {} ({}) at {}s",
                entry.file_name,
                entry.folder_name,
                entry.position_ms / 1000
            );
        }
    }

    Ok(())
}
