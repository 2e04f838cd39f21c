//! Habit records and day rollover

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::id::generate_id;

/// A daily habit with a streak counter
///
/// The streak only grows on a completed-today false -> true transition and is
/// never decremented automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub completed_today: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// Create a new habit with a fresh ID and no streak
    pub fn new(name: impl Into<String>, category: impl Into<String>, now: DateTime<Utc>) -> Self {
        let name = name.into();
        Self {
            id: generate_id("habit", &name),
            name,
            category: category.into(),
            streak: 0,
            completed_today: false,
            last_completed_on: None,
            created_at: now,
        }
    }

    /// The habit as it should look on `today`
    ///
    /// Returns `None` when nothing changes: a habit logged on an earlier day
    /// gets its completed-today flag cleared, the streak is left alone.
    pub fn rolled_over(&self, today: NaiveDate) -> Option<Habit> {
        match self.last_completed_on {
            Some(day) if self.completed_today && day < today => Some(Habit {
                completed_today: false,
                ..self.clone()
            }),
            _ => None,
        }
    }
}
