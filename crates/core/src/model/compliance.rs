use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tcth_types::Theme;

use crate::constants::SNAPSHOT_VERSION;

/// Regulatory compliance flags plus free-text risk notes. Singleton per registry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compliance {
    pub lgpd: bool,
    pub hipaa: bool,
    pub anvisa: bool,
    pub risk_notes: Vec<String>,
}

/// Regimes tracked by [`Compliance`], in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    Lgpd,
    Hipaa,
    Anvisa,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::Lgpd, Regime::Hipaa, Regime::Anvisa];

    pub fn label(self) -> &'static str {
        match self {
            Regime::Lgpd => "LGPD",
            Regime::Hipaa => "HIPAA",
            Regime::Anvisa => "ANVISA",
        }
    }
}

impl Compliance {
    pub fn is_compliant(&self, regime: Regime) -> bool {
        match regime {
            Regime::Lgpd => self.lgpd,
            Regime::Hipaa => self.hipaa,
            Regime::Anvisa => self.anvisa,
        }
    }
}

/// One append-only audit trail entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub date: DateTime<Utc>,
    pub author: String,
    pub description: String,
}

impl AuditEntry {
    pub fn new(date: DateTime<Utc>, author: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            date,
            author: author.into(),
            description: description.into(),
        }
    }
}

/// Registry-wide settings stored alongside the records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub version: String,
    /// Updated on every successful or attempted persist.
    pub last_sync: DateTime<Utc>,
    pub data_owner: String,
    pub contact: String,
}

impl Settings {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            theme: Theme::Light,
            version: SNAPSHOT_VERSION.into(),
            last_sync: now,
            data_owner: "Coordenador TCTH".into(),
            contact: "suporte@tcth.digital".into(),
        }
    }
}
