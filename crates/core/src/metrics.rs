//! Dashboard counters and monthly chart series.
//!
//! Everything here is recomputed from scratch on each render.

use crate::model::Registry;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tcth_types::{PatientStatus, RiskLevel};

/// Engraftment rate display band for the patient-based rate.
pub const ENGRAFTMENT_RATE_FLOOR: u32 = 65;
pub const ENGRAFTMENT_RATE_CEILING: u32 = 99;

/// Lowest compliance score shown, and the penalty per critical alert.
pub const COMPLIANCE_SCORE_FLOOR: u32 = 85;
pub const COMPLIANCE_PENALTY_PER_ALERT: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub total_patients: usize,
    /// Patients not yet in follow-up.
    pub active_patients: usize,
    /// Percentage, clamped to the display band; `None` when no patient is past infusion.
    pub engraftment_rate: Option<u32>,
    /// High-risk patients.
    pub critical_alerts: usize,
    pub compliance_score: u32,
    /// Transplants not yet discharged.
    pub active_transplants: usize,
    pub upcoming_followups: usize,
    /// Share of transplants with an engraftment date, unclamped.
    pub transplant_engraftment_rate: u32,
}

fn rounded_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

impl DashboardMetrics {
    pub fn compute(registry: &Registry, today: NaiveDate) -> Self {
        let patients = &registry.patients;

        let active_patients = patients
            .iter()
            .filter(|p| p.status != PatientStatus::FollowUp)
            .count();

        let eligible = patients.iter().filter(|p| p.days_post >= 0).count();
        let engrafted = patients
            .iter()
            .filter(|p| p.days_post >= 0 && p.status == PatientStatus::FollowUp)
            .count();
        let engraftment_rate = (eligible > 0).then(|| {
            rounded_percent(engrafted, eligible)
                .clamp(ENGRAFTMENT_RATE_FLOOR, ENGRAFTMENT_RATE_CEILING)
        });

        let critical_alerts = patients.iter().filter(|p| p.risk == RiskLevel::Alto).count();
        let penalty = u32::try_from(critical_alerts)
            .unwrap_or(u32::MAX)
            .saturating_mul(COMPLIANCE_PENALTY_PER_ALERT);
        let compliance_score = 100u32.saturating_sub(penalty).max(COMPLIANCE_SCORE_FLOOR);

        let transplants = &registry.transplants;
        let active_transplants = transplants.iter().filter(|t| !t.is_discharged()).count();
        let engrafted_transplants = transplants.iter().filter(|t| t.is_engrafted()).count();

        Self {
            total_patients: patients.len(),
            active_patients,
            engraftment_rate,
            critical_alerts,
            compliance_score,
            active_transplants,
            upcoming_followups: registry
                .followups
                .iter()
                .filter(|f| f.is_upcoming(today))
                .count(),
            transplant_engraftment_rate: rounded_percent(engrafted_transplants, transplants.len()),
        }
    }
}

/// One bar/point of a monthly chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthBucket {
    /// `YYYY-MM`
    pub label: String,
    pub count: usize,
}

/// Counts dates per calendar month, sorted by label (chronological for `YYYY-MM`).
pub fn monthly_series(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<MonthBucket> {
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for date in dates {
        let label = format!("{:04}-{:02}", date.year(), date.month());
        *buckets.entry(label).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|(label, count)| MonthBucket { label, count })
        .collect()
}

/// Transplants per month of infusion.
pub fn transplant_volume_series(registry: &Registry) -> Vec<MonthBucket> {
    monthly_series(registry.transplants.iter().map(|t| t.infusion_date))
}

/// Engraftments per month, ignoring transplants without an engraftment date.
pub fn engraftment_series(registry: &Registry) -> Vec<MonthBucket> {
    monthly_series(registry.transplants.iter().filter_map(|t| t.engraftment_date))
}
