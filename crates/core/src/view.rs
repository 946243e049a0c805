//! Pure projection of the registry into display-ready view models.
//!
//! `project` is a function of the registry, the filter state and the clock. It knows
//! nothing about how the result is drawn; front-ends implement [`Renderer`].

use crate::constants::{MISSING_PATIENT_LABEL, SCHEDULED_FOLLOWUP_STATUS};
use crate::filter::PatientFilter;
use crate::format::{format_date, format_datetime};
use crate::metrics::{engraftment_series, transplant_volume_series, DashboardMetrics, MonthBucket};
use crate::model::{Patient, Regime, Registry};
use crate::ui::{ModalKind, Notice};
use chrono::{DateTime, NaiveDate, Utc};
use tcth_types::Theme;

/// Message shown in place of rows when the filters match nothing.
pub const NO_PATIENTS_MESSAGE: &str = "Nenhum paciente encontrado com os filtros aplicados.";
pub const NO_FOLLOWUPS_MESSAGE: &str = "Sem acompanhamentos programados.";
pub const NO_RISK_NOTES_MESSAGE: &str = "Sem riscos registrados.";

/// Draws a [`RegistryView`].
pub trait Renderer {
    fn render(&mut self, view: &RegistryView);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRow {
    pub id: String,
    pub name: String,
    pub diagnosis: String,
    pub transplant_type: String,
    pub day_label: String,
    pub risk: String,
    pub risk_badge: String,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransplantRow {
    pub id: String,
    pub patient: String,
    pub donor_type: String,
    pub graft_source: String,
    pub infusion: String,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FollowupItem {
    pub heading: String,
    pub patient: String,
    pub professional: String,
    pub summary: String,
    pub status: String,
    pub pending: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineEvent {
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditItem {
    pub when: String,
    pub author: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplianceBadge {
    pub regime: &'static str,
    pub compliant: bool,
    pub label: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComplianceView {
    pub badges: Vec<ComplianceBadge>,
    /// Risk notes, or a single placeholder line when there are none.
    pub risk_notes: Vec<String>,
}

/// Patient picker entry for the transplant and follow-up forms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientOption {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryView {
    pub theme: Theme,
    pub metrics: DashboardMetrics,
    pub last_sync: String,
    pub filter: PatientFilter,
    pub patients: Vec<PatientRow>,
    pub patients_empty: Option<&'static str>,
    pub transplants: Vec<TransplantRow>,
    pub followups: Vec<FollowupItem>,
    pub followups_empty: Option<&'static str>,
    pub timeline: Vec<TimelineEvent>,
    pub audit: Vec<AuditItem>,
    pub compliance: ComplianceView,
    pub patient_options: Vec<PatientOption>,
    pub volume_series: Vec<MonthBucket>,
    pub engraftment_series: Vec<MonthBucket>,
    pub notice: Option<Notice>,
    pub modal: Option<ModalKind>,
}

/// Inputs of [`project`] that are not part of the registry.
#[derive(Clone, Debug)]
pub struct ViewContext<'a> {
    pub filter: &'a PatientFilter,
    pub theme: Theme,
    pub now: DateTime<Utc>,
    pub audit_limit: usize,
    pub notice: Option<&'a Notice>,
    pub modal: Option<ModalKind>,
}

fn patient_label(registry: &Registry, patient_id: &str) -> String {
    registry
        .patient(patient_id)
        .map(|p| p.name.to_string())
        .unwrap_or_else(|| MISSING_PATIENT_LABEL.to_string())
}

pub fn patient_row(patient: &Patient) -> PatientRow {
    PatientRow {
        id: patient.id.to_string(),
        name: patient.name.to_string(),
        diagnosis: patient.diagnosis.clone(),
        transplant_type: patient.transplant_type.clone(),
        day_label: patient.day_label(),
        risk: patient.risk.as_str().to_string(),
        risk_badge: patient.risk.badge(),
        status: patient.status.as_str().to_string(),
    }
}

/// Label/value pairs for the patient details modal.
pub fn patient_details(patient: &Patient) -> Vec<(&'static str, String)> {
    let notes = if patient.notes.is_empty() {
        "Nenhuma observação registrada.".to_string()
    } else {
        patient.notes.clone()
    };
    vec![
        ("ID", patient.id.to_string()),
        ("Paciente", patient.name.to_string()),
        ("Diagnóstico", patient.diagnosis.clone()),
        ("Tipo de TCTH", patient.transplant_type.clone()),
        ("Dias pós-transplante", patient.day_label()),
        ("Estratificação", patient.risk.as_str().to_string()),
        ("Status", patient.status.as_str().to_string()),
        ("Observações", notes),
    ]
}

fn transplant_rows(registry: &Registry) -> Vec<TransplantRow> {
    registry
        .transplants
        .iter()
        .map(|t| TransplantRow {
            id: t.id.to_string(),
            patient: patient_label(registry, &t.patient_id),
            donor_type: t.donor_type.clone(),
            graft_source: t.graft_source.clone(),
            infusion: format_date(t.infusion_date),
            status: t.status.clone(),
        })
        .collect()
}

/// Follow-ups by ascending date; ties keep insertion order.
fn followup_items(registry: &Registry) -> Vec<FollowupItem> {
    let mut sorted: Vec<_> = registry.followups.iter().collect();
    sorted.sort_by_key(|f| f.date);
    sorted
        .into_iter()
        .map(|f| FollowupItem {
            heading: format!("{} — {}", f.kind, format_date(f.date)),
            patient: patient_label(registry, &f.patient_id),
            professional: f.professional.clone(),
            summary: f.summary.clone(),
            status: f.status.clone(),
            pending: f.status == SCHEDULED_FOLLOWUP_STATUS,
        })
        .collect()
}

/// Infusions, engraftments and follow-ups merged into one chronological list.
pub fn timeline(registry: &Registry) -> Vec<TimelineEvent> {
    let mut events: Vec<TimelineEvent> = Vec::new();

    for t in &registry.transplants {
        let who = registry
            .patient(&t.patient_id)
            .map(|p| p.name.to_string())
            .unwrap_or_else(|| t.patient_id.clone());
        events.push(TimelineEvent {
            date: t.infusion_date,
            title: format!("Infusão de células ({})", t.id),
            description: format!("{} · {}", who, t.conditioning),
        });
        if let Some(engrafted) = t.engraftment_date {
            events.push(TimelineEvent {
                date: engrafted,
                title: "Engraftment".into(),
                description: format!("CD34+ monitorado · Status atual: {}", t.status),
            });
        }
    }

    events.extend(registry.followups.iter().map(|f| TimelineEvent {
        date: f.date,
        title: format!("Acompanhamento ({})", f.kind),
        description: f.summary.clone(),
    }));

    events.sort_by_key(|e| e.date);
    events
}

/// Most recent first, truncated to `limit`.
pub fn audit_log(registry: &Registry, limit: usize) -> Vec<AuditItem> {
    let mut entries: Vec<_> = registry.audit_trail.iter().collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
        .into_iter()
        .take(limit)
        .map(|e| AuditItem {
            when: format_datetime(e.date),
            author: e.author.clone(),
            description: e.description.clone(),
        })
        .collect()
}

fn compliance_view(registry: &Registry) -> ComplianceView {
    let badges = Regime::ALL
        .into_iter()
        .map(|regime| {
            let compliant = registry.compliance.is_compliant(regime);
            ComplianceBadge {
                regime: regime.label(),
                compliant,
                label: if compliant { "Conforme" } else { "Pendência" },
            }
        })
        .collect();

    let risk_notes = if registry.compliance.risk_notes.is_empty() {
        vec![NO_RISK_NOTES_MESSAGE.to_string()]
    } else {
        registry.compliance.risk_notes.clone()
    };

    ComplianceView { badges, risk_notes }
}

/// Patients sorted by name for select inputs.
fn patient_options(registry: &Registry) -> Vec<PatientOption> {
    let mut options: Vec<PatientOption> = registry
        .patients
        .iter()
        .map(|p| PatientOption {
            value: p.id.to_string(),
            label: format!("{} ({})", p.name, p.id),
        })
        .collect();
    options.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
    options
}

/// Projects the registry into everything a front-end draws.
pub fn project(registry: &Registry, ctx: &ViewContext<'_>) -> RegistryView {
    let patients: Vec<PatientRow> = ctx
        .filter
        .apply(&registry.patients)
        .into_iter()
        .map(patient_row)
        .collect();
    let followups = followup_items(registry);

    RegistryView {
        theme: ctx.theme,
        metrics: DashboardMetrics::compute(registry, ctx.now.date_naive()),
        last_sync: format_datetime(registry.settings.last_sync),
        filter: ctx.filter.clone(),
        patients_empty: patients.is_empty().then_some(NO_PATIENTS_MESSAGE),
        patients,
        transplants: transplant_rows(registry),
        followups_empty: followups.is_empty().then_some(NO_FOLLOWUPS_MESSAGE),
        followups,
        timeline: timeline(registry),
        audit: audit_log(registry, ctx.audit_limit),
        compliance: compliance_view(registry),
        patient_options: patient_options(registry),
        volume_series: transplant_volume_series(registry),
        engraftment_series: engraftment_series(registry),
        notice: ctx.notice.cloned(),
        modal: ctx.modal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{demo_registry, AuditEntry};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    fn view_of(registry: &Registry, filter: &PatientFilter) -> RegistryView {
        project(
            registry,
            &ViewContext {
                filter,
                theme: Theme::Light,
                now: now(),
                audit_limit: 6,
                notice: None,
                modal: None,
            },
        )
    }

    #[test]
    fn orphaned_references_get_placeholder() {
        let mut registry = demo_registry(now());
        registry.transplants[0].patient_id = "P-404".into();
        registry.followups[0].patient_id = "P-404".into();
        let view = view_of(&registry, &PatientFilter::cleared());
        assert_eq!(view.transplants[0].patient, MISSING_PATIENT_LABEL);
        assert_eq!(view.followups[0].patient, MISSING_PATIENT_LABEL);
        assert!(view.timeline.iter().any(|e| e.description.starts_with("P-404 · ")));
    }

    #[test]
    fn audit_is_newest_first_and_truncated() {
        let mut registry = demo_registry(now());
        for i in 1..=8 {
            registry.record_audit(AuditEntry::new(
                now() + Duration::minutes(i),
                "Tester",
                format!("evento {i}"),
            ));
        }
        let log = audit_log(&registry, 6);
        assert_eq!(log.len(), 6);
        assert_eq!(log[0].description, "evento 8");
        assert_eq!(log[5].description, "evento 3");
    }

    #[test]
    fn timeline_is_chronological() {
        let registry = demo_registry(now());
        let events = timeline(&registry);
        // 4 infusions, 2 engraftments, 3 follow-ups
        assert_eq!(events.len(), 9);
        assert!(events.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn empty_filter_result_shows_message() {
        let registry = demo_registry(now());
        let view = view_of(&registry, &PatientFilter::quick("zzz"));
        assert!(view.patients.is_empty());
        assert_eq!(view.patients_empty, Some(NO_PATIENTS_MESSAGE));
    }

    #[test]
    fn followups_sorted_and_flagged() {
        let registry = demo_registry(now());
        let view = view_of(&registry, &PatientFilter::cleared());
        assert_eq!(view.followups.len(), 3);
        assert!(!view.followups[0].pending);
        assert!(view.followups[1].pending);
        assert_eq!(view.followups_empty, None);
    }

    #[test]
    fn compliance_badges_and_notes() {
        let mut registry = demo_registry(now());
        registry.compliance.risk_notes.clear();
        let view = view_of(&registry, &PatientFilter::cleared());
        let hipaa = view
            .compliance
            .badges
            .iter()
            .find(|b| b.regime == "HIPAA")
            .unwrap();
        assert!(!hipaa.compliant);
        assert_eq!(hipaa.label, "Pendência");
        assert_eq!(view.compliance.risk_notes, vec![NO_RISK_NOTES_MESSAGE.to_string()]);
    }

    #[test]
    fn patient_options_sorted_by_name() {
        let registry = demo_registry(now());
        let view = view_of(&registry, &PatientFilter::cleared());
        assert_eq!(view.patient_options[0].label, "André Lima (TCTH-190)");
        assert_eq!(view.patient_options.len(), 6);
    }

    #[test]
    fn details_fill_missing_notes() {
        let mut registry = demo_registry(now());
        registry.patients[0].notes.clear();
        let details = patient_details(&registry.patients[0]);
        assert_eq!(details[4], ("Dias pós-transplante", "D+12".to_string()));
        assert_eq!(details[7].1, "Nenhuma observação registrada.");
    }
}
