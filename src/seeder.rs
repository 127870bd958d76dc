use std::str::FromStr;

use anyhow::{bail, ensure, Result};
use tracing::{info, warn};

use crate::fixtures::expected_counts;
use crate::models::Note;
use crate::store::NoteStore;

/// How the loader treats a collection that may already hold data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedMode {
    /// Create the collection, then insert. Fails if it already exists.
    Fresh,
    /// Clear the collection if present, create it otherwise, then insert.
    #[default]
    Reseed,
    /// Insert on top of whatever is there.
    Append,
}

impl FromStr for SeedMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fresh" => Ok(SeedMode::Fresh),
            "reseed" => Ok(SeedMode::Reseed),
            "append" => Ok(SeedMode::Append),
            other => bail!("Invalid seed mode: {} (expected fresh, reseed or append)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeedReport {
    pub created: bool,
    pub cleared: u64,
    pub inserted: usize,
}

/// Loads `notes` into the store as one ordered batch.
pub async fn seed<S: NoteStore + ?Sized>(store: &S, mode: SeedMode, notes: &[Note]) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    match mode {
        SeedMode::Fresh => {
            store.create_collection().await?;
            report.created = true;
        }
        SeedMode::Reseed => {
            if store.collection_exists().await? {
                report.cleared = store.clear().await?;
                if report.cleared > 0 {
                    warn!("Removed {} existing notes before reseeding", report.cleared);
                }
            } else {
                store.create_collection().await?;
                report.created = true;
            }
        }
        SeedMode::Append => {
            if !store.collection_exists().await? {
                store.create_collection().await?;
                report.created = true;
            }
        }
    }

    report.inserted = store.insert_many(notes).await?;
    info!("Inserted {} notes ({:?} mode)", report.inserted, mode);
    Ok(report)
}

/// Checks the stored notes against `expected`.
///
/// With `exact` the collection must hold exactly the expected notes. Otherwise
/// each expected note must be present at least once, which is what `Append`
/// mode can promise.
pub async fn verify<S: NoteStore + ?Sized>(store: &S, expected: &[Note], exact: bool) -> Result<()> {
    let total = store.count().await?;
    if exact {
        ensure!(
            total == expected.len() as u64,
            "Expected {} notes in collection, found {}",
            expected.len(),
            total
        );
    } else {
        ensure!(
            total >= expected.len() as u64,
            "Expected at least {} notes in collection, found {}",
            expected.len(),
            total
        );
    }

    for (patient_id, count) in expected_counts(expected) {
        let mut stored = store.notes_by_patient(patient_id).await?;
        let mut wanted: Vec<Note> = expected
            .iter()
            .filter(|n| n.patient_id == patient_id)
            .cloned()
            .collect();

        if exact {
            ensure!(
                stored.len() == count,
                "Patient {} has {} notes, expected {}",
                patient_id,
                stored.len(),
                count
            );
            // ordering among equal dates is up to the store
            stored.sort_by(|a, b| (a.date, &a.note).cmp(&(b.date, &b.note)));
            wanted.sort_by(|a, b| (a.date, &a.note).cmp(&(b.date, &b.note)));
            ensure!(stored == wanted, "Stored notes for patient {} do not match the fixtures", patient_id);
            info!("Patient {}: {} notes verified \u{2705}", patient_id, count);
        } else {
            for note in &wanted {
                ensure!(
                    stored.contains(note),
                    "Patient {} is missing a note dated {}",
                    patient_id,
                    note.date
                );
            }
            info!(
                "Patient {}: all {} expected notes present among {} stored \u{2705}",
                patient_id,
                count,
                stored.len()
            );
        }
    }

    Ok(())
}
