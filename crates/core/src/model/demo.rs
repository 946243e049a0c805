//! Demonstration dataset used on first start and whenever the stored snapshot is unusable.
//!
//! Dates are anchored on `now` so the dashboard always shows a plausible unit: infusion
//! dates agree with each patient's `daysPost`, and follow-ups land in the coming weeks.

use super::{AuditEntry, Compliance, Followup, Patient, Registry, Settings, Transplant};
use crate::constants::SYSTEM_AUTHOR;
use crate::ids::new_token;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tcth_types::{NonEmptyText, PatientStatus, RiskLevel};

fn text(value: &'static str) -> NonEmptyText {
    // SAFETY: only called with the non-empty literals below
    NonEmptyText::new(value).expect("demo labels are non-empty literals")
}

struct DemoPatient {
    id: &'static str,
    name: &'static str,
    diagnosis: &'static str,
    transplant_type: &'static str,
    days_post: i32,
    risk: RiskLevel,
    status: PatientStatus,
    notes: &'static str,
}

const DEMO_PATIENTS: [DemoPatient; 6] = [
    DemoPatient {
        id: "TCTH-201",
        name: "Mariana Lopes",
        diagnosis: "Leucemia mieloide aguda",
        transplant_type: "Alogênico aparentado",
        days_post: 12,
        risk: RiskLevel::Alto,
        status: PatientStatus::PosImediato,
        notes: "Sinais leves de GVHD cutânea. Tacrolimo em ajuste fino.",
    },
    DemoPatient {
        id: "TCTH-208",
        name: "Rafael Marques",
        diagnosis: "Linfoma não-Hodgkin",
        transplant_type: "Autólogo",
        days_post: 4,
        risk: RiskLevel::Moderado,
        status: PatientStatus::PosImediato,
        notes: "Neutropenia febril. Culturas colhidas, antibiótico empírico iniciado.",
    },
    DemoPatient {
        id: "TCTH-215",
        name: "Juliana Santos",
        diagnosis: "Anemia aplástica severa",
        transplant_type: "Alogênico não aparentado",
        days_post: -2,
        risk: RiskLevel::Alto,
        status: PatientStatus::Condicionamento,
        notes: "QTc prolongado. Monitorização cardíaca contínua.",
    },
    DemoPatient {
        id: "TCTH-223",
        name: "Carlos Vieira",
        diagnosis: "Mieloma múltiplo",
        transplant_type: "Autólogo",
        days_post: -5,
        risk: RiskLevel::Moderado,
        status: PatientStatus::Condicionamento,
        notes: "BEAM intensificado. Avaliar mucosite diariamente.",
    },
    DemoPatient {
        id: "TCTH-198",
        name: "Fernanda Costa",
        diagnosis: "Leucemia linfoblástica aguda",
        transplant_type: "Haploidêntico",
        days_post: 84,
        risk: RiskLevel::Baixo,
        status: PatientStatus::FollowUp,
        notes: "Sem intercorrências. Ajuste de imunossupressores em andamento.",
    },
    DemoPatient {
        id: "TCTH-190",
        name: "André Lima",
        diagnosis: "Síndrome mielodisplásica",
        transplant_type: "Alogênico aparentado",
        days_post: 45,
        risk: RiskLevel::Moderado,
        status: PatientStatus::FollowUp,
        notes: "Engraftment estável. Monitorar função hepática.",
    },
];

struct DemoTransplant {
    patient_id: &'static str,
    days_post: i64,
    engrafted_on_day: Option<i64>,
    donor_type: &'static str,
    graft_source: &'static str,
    conditioning: &'static str,
    cmv_status: &'static str,
    status: &'static str,
}

const DEMO_TRANSPLANTS: [DemoTransplant; 4] = [
    DemoTransplant {
        patient_id: "TCTH-190",
        days_post: 45,
        engrafted_on_day: Some(16),
        donor_type: "Alogênico aparentado",
        graft_source: "Medula Óssea",
        conditioning: "FLU-BU4",
        cmv_status: "Positivo",
        status: "Pós-engraftment",
    },
    DemoTransplant {
        patient_id: "TCTH-198",
        days_post: 84,
        engrafted_on_day: Some(18),
        donor_type: "Haploidêntico",
        graft_source: "Células periféricas",
        conditioning: "FLU-CY-TBI + PTCy",
        cmv_status: "Negativo",
        status: "Alta hospitalar",
    },
    DemoTransplant {
        patient_id: "TCTH-201",
        days_post: 12,
        engrafted_on_day: None,
        donor_type: "Alogênico aparentado",
        graft_source: "Medula Óssea",
        conditioning: "FLAG-IDA + BuCy",
        cmv_status: "Negativo",
        status: "Pós-infusão",
    },
    DemoTransplant {
        patient_id: "TCTH-208",
        days_post: 4,
        engrafted_on_day: None,
        donor_type: "Autólogo",
        graft_source: "Células periféricas",
        conditioning: "BEAM",
        cmv_status: "Negativo",
        status: "Pós-infusão",
    },
];

fn demo_transplant(today: NaiveDate, sequence: usize, demo: &DemoTransplant) -> Transplant {
    let infusion_date = today - Duration::days(demo.days_post);
    Transplant {
        id: NonEmptyText::new(format!("TCTH-{}-{:03}", infusion_date.year(), sequence + 1))
            .expect("formatted transplant id is never blank"),
        patient_id: demo.patient_id.into(),
        donor_type: demo.donor_type.into(),
        graft_source: demo.graft_source.into(),
        conditioning: demo.conditioning.into(),
        infusion_date,
        engraftment_date: demo
            .engrafted_on_day
            .map(|day| infusion_date + Duration::days(day)),
        cmv_status: demo.cmv_status.into(),
        aboi: "Compatível".into(),
        status: demo.status.into(),
    }
}

/// Builds the demonstration registry relative to `now`.
pub fn demo_registry(now: DateTime<Utc>) -> Registry {
    let today = now.date_naive();

    let patients = DEMO_PATIENTS
        .iter()
        .map(|p| Patient {
            id: text(p.id),
            name: text(p.name),
            diagnosis: p.diagnosis.into(),
            transplant_type: p.transplant_type.into(),
            days_post: p.days_post,
            risk: p.risk,
            status: p.status,
            notes: p.notes.into(),
        })
        .collect();

    let transplants = DEMO_TRANSPLANTS
        .iter()
        .enumerate()
        .map(|(i, t)| demo_transplant(today, i, t))
        .collect();

    let followups = vec![
        Followup {
            id: new_token(),
            patient_id: "TCTH-198".into(),
            kind: "Consulta".into(),
            date: today - Duration::days(10),
            professional: "Dra. Helena Prado".into(),
            summary: "Revisão D+74, quimerismo completo.".into(),
            status: "Realizado".into(),
        },
        Followup {
            id: new_token(),
            patient_id: "TCTH-201".into(),
            kind: "Consulta".into(),
            date: today + Duration::days(5),
            professional: "Dr. João Martins".into(),
            summary: "Avaliação pós-engraftment, coletar sorologias e ajustar tacrolimo.".into(),
            status: "Programado".into(),
        },
        Followup {
            id: new_token(),
            patient_id: "TCTH-208".into(),
            kind: "Exame".into(),
            date: today + Duration::days(12),
            professional: "Enf. Paula Lima".into(),
            summary: "Coleta de PCR-CMV e painel viral.".into(),
            status: "Programado".into(),
        },
    ];

    let compliance = Compliance {
        lgpd: true,
        hipaa: false,
        anvisa: true,
        risk_notes: vec![
            "Plano de resposta a incidentes precisa ser revisado.".into(),
            "Auditoria de acesso em andamento (prazo 30 dias).".into(),
        ],
    };

    Registry {
        patients,
        transplants,
        followups,
        compliance,
        audit_trail: vec![AuditEntry::new(
            now,
            SYSTEM_AUTHOR,
            "Base demonstrativa inicial criada.",
        )],
        settings: Settings::new(now),
    }
}
