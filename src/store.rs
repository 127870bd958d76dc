use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::Note;

/// Persistence seam for the notes collection.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn collection_exists(&self) -> Result<bool>;
    /// Fails when the collection already exists.
    async fn create_collection(&self) -> Result<()>;
    /// Removes every document, returns how many were removed.
    async fn clear(&self) -> Result<u64>;
    /// Ordered batch insert, returns how many were inserted.
    async fn insert_many(&self, notes: &[Note]) -> Result<usize>;
    async fn count(&self) -> Result<u64>;
    /// Notes of one patient, most recent first.
    async fn notes_by_patient(&self, patient_id: i32) -> Result<Vec<Note>>;
}

// ── MemoryStore ──

/// In-process NoteStore used for dry runs and tests.
///
/// `None` means the collection has not been created. Inserting into an
/// absent collection creates it, as a document store would.
pub struct MemoryStore {
    name: String,
    inner: RwLock<Option<Vec<Note>>>,
}

impl MemoryStore {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inner: RwLock::new(None),
        }
    }

    pub fn notes(&self) -> Result<Vec<Note>> {
        let store = self.inner.read().map_err(|e| anyhow!("Lock: {}", e))?;
        Ok(store.clone().unwrap_or_default())
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn collection_exists(&self) -> Result<bool> {
        let store = self.inner.read().map_err(|e| anyhow!("Lock: {}", e))?;
        Ok(store.is_some())
    }

    async fn create_collection(&self) -> Result<()> {
        let mut store = self.inner.write().map_err(|e| anyhow!("Lock: {}", e))?;
        if store.is_some() {
            bail!("Collection already exists: {}", self.name);
        }
        *store = Some(Vec::new());
        Ok(())
    }

    async fn clear(&self) -> Result<u64> {
        let mut store = self.inner.write().map_err(|e| anyhow!("Lock: {}", e))?;
        let removed = store.as_mut().map(|notes| notes.drain(..).count()).unwrap_or(0);
        Ok(removed as u64)
    }

    async fn insert_many(&self, notes: &[Note]) -> Result<usize> {
        if notes.is_empty() {
            bail!("Cannot insert an empty batch into {}", self.name);
        }
        let mut store = self.inner.write().map_err(|e| anyhow!("Lock: {}", e))?;
        store.get_or_insert_with(Vec::new).extend_from_slice(notes);
        Ok(notes.len())
    }

    async fn count(&self) -> Result<u64> {
        let store = self.inner.read().map_err(|e| anyhow!("Lock: {}", e))?;
        Ok(store.as_ref().map(|notes| notes.len()).unwrap_or(0) as u64)
    }

    async fn notes_by_patient(&self, patient_id: i32) -> Result<Vec<Note>> {
        let store = self.inner.read().map_err(|e| anyhow!("Lock: {}", e))?;
        let mut notes: Vec<Note> = store
            .iter()
            .flatten()
            .filter(|n| n.patient_id == patient_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(notes)
    }
}
