use std::collections::BTreeMap;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::models::Note;

pub const DB_NAME: &str = "diabete_notes_db";
pub const COLLECTION_NAME: &str = "notes";

// (patientId, date, note) in insertion order
const SEED_NOTES: [(i32, &str, &str); 9] = [
    (
        1,
        "2024-12-01T10:00:00.000Z",
        "Le patient déclare qu'il se sent très bien. Poids égal ou inférieur au poids recommandé",
    ),
    (
        2,
        "2024-12-02T11:00:00.000Z",
        "Le patient déclare qu'il ressent beaucoup de stress au travail Il se plaint également que son audition est anormale dernièrement",
    ),
    (
        2,
        "2024-12-02T11:00:00.000Z",
        "Le patient déclare avoir fait une réaction aux médicaments au cours des 3 derniers mois Il remarque également que son audition continue d'être anormale",
    ),
    (
        3,
        "2024-12-03T14:30:00.000Z",
        "Le patient déclare qu'il fume depuis peu",
    ),
    (
        3,
        "2024-12-03T14:30:00.000Z",
        "Le patient déclare qu'il est fumeur et qu'il a cessé de fumer l'année dernière Il se plaint également de crises d\u{2019}apnée respiratoire anormales Tests de laboratoire indiquant un taux de cholestérol LDL élevé",
    ),
    (
        4,
        "2024-12-04T16:00:00.000Z",
        "Le patient déclare qu'il lui est devenu difficile de monter les escaliers Il se plaint également d\u{2019}être essoufflé Tests de laboratoire indiquant que les anticorps sont élevés Réaction aux médicaments",
    ),
    (
        4,
        "2024-12-04T16:00:00.000Z",
        "Le patient déclare qu'il a mal au dos lorsqu'il reste assis pendant longtemps",
    ),
    (
        4,
        "2024-12-04T16:00:00.000Z",
        "Le patient déclare avoir commencé à fumer depuis peu Hémoglobine A1C supérieure au niveau recommandé",
    ),
    (
        4,
        "2024-12-04T16:00:00.000Z",
        "Taille, Poids, Cholestérol, Vertige et Réaction",
    ),
];

/// The fixture notes, in the order they are inserted.
pub fn seed_notes() -> Result<Vec<Note>, anyhow::Error> {
    SEED_NOTES
        .iter()
        .map(|(patient_id, date, note)| {
            let date = DateTime::parse_from_rfc3339(date)
                .with_context(|| format!("Invalid fixture date {}", date))?
                .with_timezone(&Utc);
            Ok(Note::new(*patient_id, date, *note))
        })
        .collect()
}

/// Number of notes per patient in `notes`.
pub fn expected_counts(notes: &[Note]) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for note in notes {
        *counts.entry(note.patient_id).or_insert(0) += 1;
    }
    counts
}
