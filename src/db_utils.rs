use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bson::doc;
use mongodb::options::{ClientOptions, Credential};
use mongodb::{Client, Collection, Database};
use tracing::{error, info};

use crate::models::Note;
use crate::store::NoteStore;

/// Parses the connection string once. Malformed values are configuration
/// errors and never reach the retry loop.
pub async fn client_options(mongo_uri: &str, credential: Option<&Credential>) -> Result<ClientOptions, anyhow::Error> {
    let mut options = ClientOptions::parse(mongo_uri)
        .await
        .with_context(|| format!("Invalid value for MONGO_URI: {}", mongo_uri))?;
    options.app_name = Some("notes-seed".to_string());
    if let Some(credential) = credential {
        options.credential = Some(credential.clone());
    }
    Ok(options)
}

pub async fn get_mongo_client(
    mongo_uri: &str,
    credential: Option<&Credential>,
    num_attempts: u32,
    retry_delay: Duration,
) -> Result<Client, anyhow::Error> {
    info!("Trying to establish a MongoDB connection");

    let options = client_options(mongo_uri, credential).await?;

    let mut attempts = 0;
    let mut err: Option<anyhow::Error> = None;

    while attempts < num_attempts {
        info!("Attempt to connect to MongoDB {} of {}", attempts + 1, num_attempts);
        match ping(options.clone()).await {
            Ok(client) => {
                info!("MongoDB connection successfull \u{2705}");
                return Ok(client)
            },
            Err(e) => {
                error!("Failed to connect to MongoDB. Attempt {} of {}: {}", attempts + 1, num_attempts, e);
                err = Some(e);
            }
        }
        attempts += 1;
        if attempts < num_attempts {
            tokio::time::sleep(retry_delay).await;
        }
    }
    let err = err.unwrap_or_else(|| anyhow!("Failed to connect to MongoDB"));
    Err(err.context(format!("Failed to connect to MongoDB after {} attempts", num_attempts)))
}

// the driver connects lazily, so a round trip is needed to know the server is up
async fn ping(options: ClientOptions) -> Result<Client, anyhow::Error> {
    let client = Client::with_options(options)?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await?;
    Ok(client)
}

pub async fn pred_collection_exists(db: &Database, collection_name: &str) -> Result<bool, anyhow::Error> {
    info!("Checking whether collection {} exists in {}", collection_name, db.name());

    let names = db
        .list_collection_names()
        .await
        .map_err(|err| {
            error!("Failed to list collections: {}", err);
            anyhow::Error::new(err)
        })?;

    Ok(names.iter().any(|name| name == collection_name))
}

/// NoteStore backed by a MongoDB collection.
pub struct MongoStore {
    db: Database,
    notes: Collection<Note>,
}

impl MongoStore {
    /// Selects the database and collection by name. Neither is created on the
    /// server until the first write.
    pub fn new(client: &Client, db_name: &str, collection_name: &str) -> Self {
        let db = client.database(db_name);
        let notes = db.collection::<Note>(collection_name);
        MongoStore { db, notes }
    }
}

#[async_trait]
impl NoteStore for MongoStore {
    async fn collection_exists(&self) -> Result<bool, anyhow::Error> {
        pred_collection_exists(&self.db, self.notes.name()).await
    }

    async fn create_collection(&self) -> Result<(), anyhow::Error> {
        info!("Creating collection {} in {}", self.notes.name(), self.db.name());
        self.db.create_collection(self.notes.name()).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<u64, anyhow::Error> {
        let result = self.notes.delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }

    async fn insert_many(&self, notes: &[Note]) -> Result<usize, anyhow::Error> {
        let result = self.notes.insert_many(notes).await?;
        Ok(result.inserted_ids.len())
    }

    async fn count(&self) -> Result<u64, anyhow::Error> {
        Ok(self.notes.count_documents(doc! {}).await?)
    }

    async fn notes_by_patient(&self, patient_id: i32) -> Result<Vec<Note>, anyhow::Error> {
        let mut cursor = self
            .notes
            .find(doc! { "patientId": patient_id })
            .sort(doc! { "date": -1 })
            .await?;

        let mut notes = Vec::new();
        while cursor.advance().await? {
            notes.push(cursor.deserialize_current()?);
        }
        Ok(notes)
    }
}
