use serde::{Deserialize, Serialize};
use tcth_types::{NonEmptyText, PatientStatus, RiskLevel};

/// A patient tracked by the transplant unit.
///
/// `id` is the natural key. Uniqueness (case-insensitive) is checked when a patient is
/// created and never re-validated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: NonEmptyText,
    pub name: NonEmptyText,
    pub diagnosis: String,
    pub transplant_type: String,
    /// Days relative to infusion: negative during conditioning, `0` on the day of infusion.
    pub days_post: i32,
    pub risk: RiskLevel,
    pub status: PatientStatus,
    pub notes: String,
}

impl Patient {
    /// `D+12`, `D-2`, `D+0`.
    pub fn day_label(&self) -> String {
        day_label(self.days_post)
    }

    /// Whether `query` (already trimmed and lowercased) appears in the id, name or diagnosis.
    pub fn matches_text(&self, query: &str) -> bool {
        query.is_empty()
            || self.id.as_str().to_lowercase().contains(query)
            || self.name.as_str().to_lowercase().contains(query)
            || self.diagnosis.to_lowercase().contains(query)
    }
}

pub fn day_label(days_post: i32) -> String {
    if days_post >= 0 {
        format!("D+{days_post}")
    } else {
        format!("D{days_post}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(id: &str, name: &str, diagnosis: &str) -> Patient {
        Patient {
            id: NonEmptyText::new(id).unwrap(),
            name: NonEmptyText::new(name).unwrap(),
            diagnosis: diagnosis.into(),
            transplant_type: "Autólogo".into(),
            days_post: 0,
            risk: RiskLevel::Baixo,
            status: PatientStatus::FollowUp,
            notes: String::new(),
        }
    }

    #[test]
    fn day_label_signs() {
        assert_eq!(day_label(12), "D+12");
        assert_eq!(day_label(0), "D+0");
        assert_eq!(day_label(-5), "D-5");
    }

    #[test]
    fn matches_text_searches_id_name_and_diagnosis() {
        let p = patient("TCTH-201", "Mariana Lopes", "Leucemia mieloide aguda");
        assert!(p.matches_text("tcth-2"));
        assert!(p.matches_text("lopes"));
        assert!(p.matches_text("mieloide"));
        assert!(p.matches_text(""));
        assert!(!p.matches_text("linfoma"));
    }

    #[test]
    fn serialises_with_camel_case_keys() {
        let p = patient("P1", "Ana", "LMA");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["transplantType"], "Autólogo");
        assert_eq!(json["daysPost"], 0);
        assert_eq!(json["risk"], "baixo");
        assert_eq!(json["status"], "Follow-up");
    }
}
