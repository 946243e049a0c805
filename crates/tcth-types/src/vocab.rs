//! Closed vocabularies for the patient table.
//!
//! Wire values are the Portuguese labels stored in snapshots and submitted by
//! forms. Each type round-trips through serde using exactly those labels.

use serde::{Deserialize, Serialize};

/// Clinical risk stratification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Alto,
    #[default]
    Moderado,
    Baixo,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Alto, RiskLevel::Moderado, RiskLevel::Baixo];

    /// Wire/storage label (`alto`, `moderado`, `baixo`).
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Alto => "alto",
            RiskLevel::Moderado => "moderado",
            RiskLevel::Baixo => "baixo",
        }
    }

    /// Strict parse, case-insensitive. Returns `None` outside the allow-list.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalised = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|r| r.as_str() == normalised)
    }

    /// Lenient parse: unknown values become [`RiskLevel::Moderado`].
    pub fn sanitize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_default()
    }

    /// Badge text, e.g. `Risco Alto`.
    pub fn badge(self) -> String {
        let label = self.as_str();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => format!("Risco {}{}", first.to_uppercase(), chars.as_str()),
            None => String::from("Risco"),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage of the patient in the transplant pathway.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientStatus {
    #[serde(rename = "Pré-transplante")]
    PreTransplante,
    #[serde(rename = "Condicionamento")]
    Condicionamento,
    #[serde(rename = "Pós-imediato")]
    PosImediato,
    #[default]
    #[serde(rename = "Follow-up")]
    FollowUp,
}

impl PatientStatus {
    pub const ALL: [PatientStatus; 4] = [
        PatientStatus::PreTransplante,
        PatientStatus::Condicionamento,
        PatientStatus::PosImediato,
        PatientStatus::FollowUp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PatientStatus::PreTransplante => "Pré-transplante",
            PatientStatus::Condicionamento => "Condicionamento",
            PatientStatus::PosImediato => "Pós-imediato",
            PatientStatus::FollowUp => "Follow-up",
        }
    }

    /// Strict parse on the trimmed label. Status labels are case-sensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL.into_iter().find(|s| s.as_str() == trimmed)
    }

    /// Lenient parse: unknown values become [`PatientStatus::FollowUp`].
    pub fn sanitize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_default()
    }
}

impl std::fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display theme preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Anything other than `dark` is light.
    pub fn sanitize(raw: &str) -> Self {
        if raw.trim() == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn risk_parse_is_case_insensitive() {
        assert_eq!(RiskLevel::parse("ALTO"), Some(RiskLevel::Alto));
        assert_eq!(RiskLevel::parse(" baixo "), Some(RiskLevel::Baixo));
        assert_eq!(RiskLevel::parse("Alta"), None);
    }

    #[test]
    fn risk_badge_capitalises_label() {
        assert_eq!(RiskLevel::Alto.badge(), "Risco Alto");
        assert_eq!(RiskLevel::Moderado.badge(), "Risco Moderado");
    }

    #[test]
    fn status_parse_requires_exact_label() {
        assert_eq!(
            PatientStatus::parse(" Pós-imediato "),
            Some(PatientStatus::PosImediato)
        );
        assert_eq!(PatientStatus::parse("follow-up"), None);
        assert_eq!(PatientStatus::sanitize("Alta"), PatientStatus::FollowUp);
    }

    #[test]
    fn status_serialises_with_portuguese_labels() {
        let json = serde_json::to_string(&PatientStatus::PreTransplante).unwrap();
        assert_eq!(json, "\"Pré-transplante\"");
        let back: PatientStatus = serde_json::from_str("\"Follow-up\"").unwrap();
        assert_eq!(back, PatientStatus::FollowUp);
    }

    #[test]
    fn theme_sanitize_and_toggle() {
        assert_eq!(Theme::sanitize("dark"), Theme::Dark);
        assert_eq!(Theme::sanitize("solarized"), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }

    proptest! {
        #[test]
        fn prop_sanitized_risk_is_always_allowed(raw in ".*") {
            let risk = RiskLevel::sanitize(&raw);
            prop_assert!(RiskLevel::ALL.contains(&risk));
        }

        #[test]
        fn prop_sanitized_status_is_always_allowed(raw in ".*") {
            let status = PatientStatus::sanitize(&raw);
            prop_assert!(PatientStatus::ALL.contains(&status));
        }
    }
}
