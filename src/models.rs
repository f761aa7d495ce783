use crate::dates::read_timestamp;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use uuid::Uuid;

/// One logged mood/energy observation.
///
/// `mood` and `energy` are documented as 1..=10. The HTTP boundary enforces
/// that range; the statistics code computes over whatever it is handed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredObservation", into = "StoredObservation")]
pub struct MoodObservation {
    pub id: Uuid,
    pub recorded_at: Option<DateTime<FixedOffset>>,
    /// Stored `recorded_at` that could not be parsed, written back verbatim.
    pub unreadable_recorded_at: Option<Value>,
    pub mood: i32,
    pub energy: i32,
    pub label: Option<String>,
    pub note: Option<String>,
    pub tags: BTreeSet<Uuid>,
}

/// On-disk and wire shape of an observation, with `recorded_at` kept raw.
#[derive(Serialize, Deserialize)]
struct StoredObservation {
    id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recorded_at: Option<Value>,
    mood: i32,
    energy: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(default)]
    tags: BTreeSet<Uuid>,
}

impl From<StoredObservation> for MoodObservation {
    fn from(stored: StoredObservation) -> Self {
        let raw = stored.recorded_at.filter(|value| !value.is_null());
        let recorded_at = raw.as_ref().and_then(read_timestamp);
        Self {
            id: stored.id,
            unreadable_recorded_at: if recorded_at.is_none() { raw } else { None },
            recorded_at,
            mood: stored.mood,
            energy: stored.energy,
            label: stored.label,
            note: stored.note,
            tags: stored.tags,
        }
    }
}

impl From<MoodObservation> for StoredObservation {
    fn from(obs: MoodObservation) -> Self {
        Self {
            id: obs.id,
            recorded_at: obs
                .recorded_at
                .map(|ts| Value::String(ts.to_rfc3339()))
                .or(obs.unreadable_recorded_at),
            mood: obs.mood,
            energy: obs.energy,
            label: obs.label,
            note: obs.note,
            tags: obs.tags,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    Activity,
    Person,
    Location,
    Weather,
    Health,
    Work,
    Social,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub category: TagCategory,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_mood: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_energy: Option<i32>,
    pub start: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub entries: Vec<MoodObservation>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

impl AppData {
    /// Removes a tag and drops its id from every observation that referenced
    /// it. Returns `false` when no such tag exists.
    pub fn remove_tag(&mut self, id: Uuid) -> bool {
        let before = self.tags.len();
        self.tags.retain(|tag| tag.id != id);
        if self.tags.len() == before {
            return false;
        }

        for entry in &mut self.entries {
            entry.tags.remove(&id);
        }
        true
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub mood: i32,
    pub energy: i32,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub recorded_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub category: TagCategory,
}

#[derive(Debug, Deserialize)]
pub struct CreateGoalRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_mood: Option<i32>,
    #[serde(default)]
    pub target_energy: Option<i32>,
    #[serde(default)]
    pub duration_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub progress: u8,
    pub overdue: bool,
}
