use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A clinical note as persisted in the `notes` collection.
///
/// The store-assigned `_id` is not part of the model and is skipped on read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Note {
    #[serde(rename = "patientId")]
    pub patient_id: i32,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    pub note: String,
}

impl Note {
    pub fn new(patient_id: i32, date: DateTime<Utc>, note: impl Into<String>) -> Self {
        Note { patient_id, date, note: note.into() }
    }

    // plain JSON view, the bson helper would emit extended JSON for the date
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "patientId": self.patient_id,
            "date": self.date.to_rfc3339_opts(SecondsFormat::Millis, true),
            "note": self.note,
        })
    }
}
