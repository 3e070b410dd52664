use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::content::Pet;

/// On-disk shape of the game state. Missing fields take their defaults so
/// older, partial records still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct SaveRecord {
    #[serde(deserialize_with = "lenient")]
    pub(crate) scene: String,
    #[serde(alias = "selectedPup")]
    pub(crate) selected_pet: Option<Pet>,
    pub(crate) day: u32,
    pub(crate) care_tasks: BTreeMap<String, bool>,
    pub(crate) mission_completed: bool,
    pub(crate) play_completed: bool,
    pub(crate) bath_completed: bool,
    pub(crate) sound_enabled: bool,
    #[serde(deserialize_with = "lenient")]
    pub(crate) last_saved: Option<DateTime<Utc>>,
}

impl Default for SaveRecord {
    fn default() -> Self {
        Self {
            scene: String::new(),
            selected_pet: None,
            day: 1,
            care_tasks: BTreeMap::new(),
            mission_completed: false,
            play_completed: false,
            bath_completed: false,
            sound_enabled: true,
            last_saved: None,
        }
    }
}

/// Falls back to the field default instead of failing the whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value.clone()).unwrap_or_else(|error| {
        warn!(value = %value, error = %error, "ignoring malformed save field");
        T::default()
    }))
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("parse save json: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("parse save json at {path}: {source}")]
    ParseAt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode save json: {0}")]
    Encode(#[source] serde_json::Error),
}

pub(crate) fn parse_save_record(raw: &str) -> Result<SaveRecord, RecordError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, SaveRecord>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let source = error.into_inner();
        if path.is_empty() || path == "." {
            RecordError::Parse(source)
        } else {
            RecordError::ParseAt { path, source }
        }
    })
}

pub(crate) fn encode_save_record(record: &SaveRecord) -> Result<String, RecordError> {
    serde_json::to_string_pretty(record).map_err(RecordError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_record_fills_defaults() {
        let record = parse_save_record(r#"{"day": 4}"#).expect("parse");
        assert_eq!(record.day, 4);
        assert!(record.sound_enabled);
        assert!(record.selected_pet.is_none());
        assert!(record.care_tasks.is_empty());
    }

    #[test]
    fn legacy_selected_pup_field_is_accepted() {
        let record =
            parse_save_record(r#"{"selectedPup": {"id": "rofa", "name": "Rofa"}}"#).expect("parse");
        assert_eq!(record.selected_pet.map(|pet| pet.id).as_deref(), Some("rofa"));
    }

    #[test]
    fn type_mismatch_reports_json_path() {
        let error = parse_save_record(r#"{"careTasks": {"feed": "yes"}}"#).expect_err("bad flag");
        let message = error.to_string();
        assert!(message.contains("careTasks.feed"), "{message}");
    }

    #[test]
    fn malformed_scene_and_timestamp_fall_back_without_losing_progress() {
        let record = parse_save_record(
            r#"{"scene": null, "lastSaved": "garbage", "day": 5,
                "selectedPet": {"id": "rofa", "name": "Rofa"}, "bathCompleted": true}"#,
        )
        .expect("parse");
        assert_eq!(record.scene, "");
        assert!(record.last_saved.is_none());
        assert_eq!(record.day, 5);
        assert_eq!(record.selected_pet.map(|pet| pet.id).as_deref(), Some("rofa"));
        assert!(record.bath_completed);

        let record = parse_save_record(r#"{"scene": 7, "lastSaved": 12345}"#).expect("parse");
        assert_eq!(record.scene, "");
        assert!(record.last_saved.is_none());
    }

    #[test]
    fn valid_timestamp_still_parses() {
        let record =
            parse_save_record(r#"{"scene": "bath", "lastSaved": "2024-03-01T08:30:00Z"}"#)
                .expect("parse");
        assert_eq!(record.scene, "bath");
        assert_eq!(
            record.last_saved.map(|at| at.to_rfc3339()).as_deref(),
            Some("2024-03-01T08:30:00+00:00")
        );
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            parse_save_record("not json"),
            Err(RecordError::Parse(_))
        ));
    }

    #[test]
    fn encodes_camel_case_field_names() {
        let json = encode_save_record(&SaveRecord::default()).expect("encode");
        for field in [
            "\"scene\"",
            "\"selectedPet\"",
            "\"careTasks\"",
            "\"missionCompleted\"",
            "\"playCompleted\"",
            "\"bathCompleted\"",
            "\"soundEnabled\"",
            "\"lastSaved\"",
        ] {
            assert!(json.contains(field), "missing {field} in {json}");
        }
    }
}
