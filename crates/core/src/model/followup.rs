use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A scheduled or completed follow-up (consultation, exam, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Followup {
    /// Generated token, see [`crate::ids::new_token`].
    pub id: String,
    pub patient_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: NaiveDate,
    pub professional: String,
    pub summary: String,
    pub status: String,
}

impl Followup {
    /// Whether the follow-up falls on or after `today`.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.date >= today
    }
}
