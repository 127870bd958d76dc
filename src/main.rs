mod config;
mod db_utils;
mod fixtures;
mod graceful_shutdown;
mod models;
mod seeder;
mod store;

use anyhow::bail;
use tracing::{info, warn};
use dotenv::dotenv;

use config::Config;
use db_utils::{get_mongo_client, MongoStore};
use models::Note;
use seeder::{seed, verify, SeedMode, SeedReport};
use store::{MemoryStore, NoteStore};

/// Seeds the store and optionally checks the result.
///
/// Only the first run of `Append` mode can be checked exactly, later runs only
/// guarantee that every fixture note is present.
async fn seed_and_verify(store: &dyn NoteStore, config: &Config, notes: &[Note]) -> Result<SeedReport, anyhow::Error> {
    let report = seed(store, config.seed_mode, notes).await?;

    if config.verify {
        let exact = config.seed_mode != SeedMode::Append || report.created;
        verify(store, notes, exact).await?;
        info!("Collection {} verified", config.collection_name);
    } else {
        warn!("Verification disabled, skipping read-back");
    }
    Ok(report)
}

async fn run(config: &Config) -> Result<SeedReport, anyhow::Error> {
    let notes = fixtures::seed_notes()?;

    if config.dry_run {
        info!("Dry run: seeding an in-memory collection, MongoDB is not contacted");
        let store = MemoryStore::new(&config.collection_name);
        let report = seed_and_verify(&store, config, &notes).await?;
        let documents: Vec<serde_json::Value> = store.notes()?.iter().map(Note::to_json).collect();
        println!("{}", serde_json::to_string_pretty(&documents)?);
        return Ok(report);
    }

    let client = get_mongo_client(
        &config.mongo_uri,
        config.credential.as_ref(),
        config.connect_attempts,
        config.retry_delay,
    )
    .await?;
    let store = MongoStore::new(&client, &config.db_name, &config.collection_name);
    seed_and_verify(&store, config, &notes).await
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error>{

    tracing_subscriber::fmt()
    .with_max_level(tracing::Level::INFO)
    .init();

    dotenv().ok();

    let config = Config::from_env()?;

    info!(
        "notes-seed started: {}.{} ({:?} mode)",
        config.db_name, config.collection_name, config.seed_mode
    );

    let report = tokio::select! {
        report = run(&config) => report?,
        signal = graceful_shutdown::wait_for_signal() => {
            bail!("Seeding interrupted by {}", signal);
        }
    };

    info!(
        "Seeding done: created collection: {}, removed: {}, inserted: {}",
        report.created, report.cleared, report.inserted
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn dry_run_config(seed_mode: SeedMode) -> Config {
        Config {
            mongo_uri: "mongodb://localhost:27017".to_string(),
            credential: None,
            db_name: fixtures::DB_NAME.to_string(),
            collection_name: fixtures::COLLECTION_NAME.to_string(),
            seed_mode,
            connect_attempts: 1,
            retry_delay: Duration::from_secs(0),
            verify: true,
            dry_run: true,
        }
    }

    #[tokio::test]
    async fn dry_run_seeds_and_verifies_in_memory() {
        let report = run(&dry_run_config(SeedMode::Fresh)).await.unwrap();
        assert_eq!(report, SeedReport { created: true, cleared: 0, inserted: 9 });
    }

    #[tokio::test]
    async fn append_rerun_checks_presence_only() {
        let store = MemoryStore::new(fixtures::COLLECTION_NAME);
        let config = dry_run_config(SeedMode::Append);
        let notes = fixtures::seed_notes().unwrap();

        seed_and_verify(&store, &config, &notes).await.unwrap();
        let report = seed_and_verify(&store, &config, &notes).await.unwrap();

        assert!(!report.created);
        assert_eq!(store.count().await.unwrap(), 18);
    }
}
