//! Registry records and the snapshot that holds them.
//!
//! [`Registry`] is the unit of persistence: it is serialised whole under a single
//! storage key and replaced whole on load. Field names on the wire are camelCase:
//!
//! ```text
//! { "patients": [...], "transplants": [...], "followups": [...],
//!   "compliance": {...}, "auditTrail": [...], "settings": {...} }
//! ```

mod compliance;
mod demo;
mod followup;
mod patient;
mod transplant;

pub use compliance::{AuditEntry, Compliance, Regime, Settings};
pub use demo::demo_registry;
pub use followup::Followup;
pub use patient::{day_label, Patient};
pub use transplant::Transplant;

use serde::{Deserialize, Serialize};

/// The full in-memory store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    /// Newest first.
    pub patients: Vec<Patient>,
    pub transplants: Vec<Transplant>,
    pub followups: Vec<Followup>,
    pub compliance: Compliance,
    pub audit_trail: Vec<AuditEntry>,
    pub settings: Settings,
}

impl Registry {
    /// Exact-match lookup, as used by table actions and soft references.
    pub fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id.as_str() == id)
    }

    /// Case-insensitive id collision check used when creating patients.
    pub fn has_patient_id(&self, id: &str) -> bool {
        self.patients.iter().any(|p| p.id.eq_ignore_case(id))
    }

    /// Inserts at the front so the newest patient is listed first.
    pub fn prepend_patient(&mut self, patient: Patient) {
        self.patients.insert(0, patient);
    }

    /// Removes the patient with exactly this id. Transplants and follow-ups that point at it
    /// are left in place as dangling references.
    pub fn remove_patient(&mut self, id: &str) -> Option<Patient> {
        let index = self.patients.iter().position(|p| p.id.as_str() == id)?;
        Some(self.patients.remove(index))
    }

    pub fn push_transplant(&mut self, transplant: Transplant) {
        self.transplants.push(transplant);
    }

    pub fn push_followup(&mut self, followup: Followup) {
        self.followups.push(followup);
    }

    pub fn record_audit(&mut self, entry: AuditEntry) {
        self.audit_trail.push(entry);
    }
}
