//! Patient table search and categorical filters.
//!
//! Filtering is a pure function of the patient list and a [`PatientFilter`]; it never
//! reorders, so the newest-first order of the store is preserved.

use crate::constants::ALL_SENTINEL;
use crate::model::Patient;
use tcth_types::{PatientStatus, RiskLevel};

/// A categorical filter that is either disabled or pinned to one value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Choice<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq + Copy> Choice<T> {
    pub fn admits(&self, value: T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(expected) => *expected == value,
        }
    }

    /// Parses a select value: the `todos`/`all` sentinels (or blank) disable the filter,
    /// anything else must be accepted by `parse`.
    pub fn parse_with(raw: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case(ALL_SENTINEL)
            || trimmed.eq_ignore_ascii_case("all")
        {
            return Some(Choice::All);
        }
        parse(trimmed).map(Choice::Only)
    }
}

impl Choice<RiskLevel> {
    pub fn wire(&self) -> &'static str {
        match self {
            Choice::All => ALL_SENTINEL,
            Choice::Only(r) => r.as_str(),
        }
    }
}

impl Choice<PatientStatus> {
    pub fn wire(&self) -> &'static str {
        match self {
            Choice::All => ALL_SENTINEL,
            Choice::Only(s) => s.as_str(),
        }
    }
}

/// Filter state of the patient table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientFilter {
    pub query: String,
    pub risk: Choice<RiskLevel>,
    pub status: Choice<PatientStatus>,
}

impl PatientFilter {
    pub fn new(query: impl Into<String>, risk: Choice<RiskLevel>, status: Choice<PatientStatus>) -> Self {
        Self {
            query: query.into(),
            risk,
            status,
        }
    }

    /// Empty query, both selects on `todos`.
    pub fn cleared() -> Self {
        Self::default()
    }

    /// Quick search from the header: text only, categorical filters reset.
    pub fn quick(query: impl Into<String>) -> Self {
        Self::new(query, Choice::All, Choice::All)
    }

    pub fn is_cleared(&self) -> bool {
        self.query.trim().is_empty() && self.risk == Choice::All && self.status == Choice::All
    }

    fn normalised_query(&self) -> String {
        self.query.trim().to_lowercase()
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        self.matches_normalised(&self.normalised_query(), patient)
    }

    fn matches_normalised(&self, query: &str, patient: &Patient) -> bool {
        patient.matches_text(query) && self.risk.admits(patient.risk) && self.status.admits(patient.status)
    }

    /// Returns the matching patients in their original order.
    pub fn apply<'a>(&self, patients: &'a [Patient]) -> Vec<&'a Patient> {
        let query = self.normalised_query();
        patients
            .iter()
            .filter(|p| self.matches_normalised(&query, p))
            .collect()
    }
}
