//! Form submission validation.
//!
//! Forms arrive as raw strings, exactly as a user typed or selected them. Each
//! `validate_*` function either produces a typed record ready to be inserted, or a
//! [`ValidationError`] whose `Display` text is the warning notice shown to the user.
//! A rejected submission never touches the store.

use crate::ids::new_token;
use crate::model::{Followup, Patient, Registry, Transplant};
use crate::sanitize::parse_date;
use chrono::NaiveDate;
use tcth_types::{NonEmptyText, PatientStatus, RiskLevel};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Preencha os campos obrigatórios para cadastrar o paciente.")]
    MissingPatientFields,
    #[error("Selecione o tipo de TCTH para continuar.")]
    MissingTransplantType,
    #[error("Informe um valor válido para o dia pós-transplante.")]
    InvalidDaysPost,
    #[error("Já existe um paciente com este ID em acompanhamento.")]
    DuplicatePatientId(String),
    #[error("Informe o identificador do TCTH.")]
    MissingTransplantId,
    #[error("Informe uma data válida para {0}.")]
    InvalidDate(&'static str),
}

/// Patient registration form as submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientForm {
    pub id: String,
    pub name: String,
    pub diagnosis: String,
    pub transplant_type: String,
    pub days_post: String,
    pub risk: String,
    pub status: String,
    pub notes: String,
}

/// Transplant registration form as submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransplantForm {
    pub id: String,
    pub patient_id: String,
    pub donor_type: String,
    pub graft_source: String,
    pub conditioning: String,
    pub infusion_date: String,
    pub engraftment_date: String,
    pub cmv_status: String,
    pub aboi: String,
    pub status: String,
}

/// Follow-up scheduling form as submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FollowupForm {
    pub patient_id: String,
    pub kind: String,
    pub date: String,
    pub professional: String,
    pub summary: String,
    pub status: String,
}

/// Integer prefix parse: optional sign followed by at least one digit; trailing text is
/// ignored (`"12 dias"` is 12).
fn parse_leading_int(raw: &str) -> Option<i32> {
    let s = raw.trim();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1i64, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    i32::try_from(sign * magnitude).ok()
}

fn required_date(raw: &str, field: &'static str) -> Result<NaiveDate, ValidationError> {
    parse_date(raw).ok_or(ValidationError::InvalidDate(field))
}

/// Validates a patient submission against the current registry.
///
/// # Errors
///
/// In order of precedence: a blank id, name or diagnosis; a blank transplant type;
/// a days-post value without a leading integer; an id already present (case-insensitive).
pub fn validate_patient(form: &PatientForm, registry: &Registry) -> Result<Patient, ValidationError> {
    let (Ok(id), Ok(name), Ok(diagnosis)) = (
        NonEmptyText::new(&form.id),
        NonEmptyText::new(&form.name),
        NonEmptyText::new(&form.diagnosis),
    ) else {
        return Err(ValidationError::MissingPatientFields);
    };

    let transplant_type = form.transplant_type.trim();
    if transplant_type.is_empty() {
        return Err(ValidationError::MissingTransplantType);
    }

    let days_post = parse_leading_int(&form.days_post).ok_or(ValidationError::InvalidDaysPost)?;

    if registry.has_patient_id(id.as_str()) {
        return Err(ValidationError::DuplicatePatientId(id.to_string()));
    }

    Ok(Patient {
        id,
        name,
        diagnosis: diagnosis.to_string(),
        transplant_type: transplant_type.to_string(),
        days_post,
        risk: RiskLevel::sanitize(&form.risk),
        status: PatientStatus::sanitize(&form.status),
        notes: form.notes.trim().to_string(),
    })
}

/// Validates a transplant submission. The referenced patient is not checked.
pub fn validate_transplant(form: &TransplantForm) -> Result<Transplant, ValidationError> {
    let id = NonEmptyText::new(&form.id).map_err(|_| ValidationError::MissingTransplantId)?;
    let infusion_date = required_date(&form.infusion_date, "a infusão")?;
    let engraftment_date = if form.engraftment_date.trim().is_empty() {
        None
    } else {
        Some(required_date(&form.engraftment_date, "o engraftment")?)
    };

    Ok(Transplant {
        id,
        patient_id: form.patient_id.trim().to_string(),
        donor_type: form.donor_type.trim().to_string(),
        graft_source: form.graft_source.trim().to_string(),
        conditioning: form.conditioning.trim().to_string(),
        infusion_date,
        engraftment_date,
        cmv_status: form.cmv_status.trim().to_string(),
        aboi: form.aboi.trim().to_string(),
        status: form.status.trim().to_string(),
    })
}

/// Validates a follow-up submission and allocates its id.
pub fn validate_followup(form: &FollowupForm) -> Result<Followup, ValidationError> {
    let date = required_date(&form.date, "o acompanhamento")?;
    Ok(Followup {
        id: new_token(),
        patient_id: form.patient_id.trim().to_string(),
        kind: form.kind.trim().to_string(),
        date,
        professional: form.professional.trim().to_string(),
        summary: form.summary.trim().to_string(),
        status: form.status.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::demo_registry;
    use chrono::{TimeZone, Utc};

    fn registry() -> Registry {
        demo_registry(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap())
    }

    fn form() -> PatientForm {
        PatientForm {
            id: " TCTH-300 ".into(),
            name: "Paula Reis".into(),
            diagnosis: "Linfoma de Hodgkin".into(),
            transplant_type: "Autólogo".into(),
            days_post: "-1".into(),
            risk: "Baixo".into(),
            status: "Condicionamento".into(),
            notes: "  ".into(),
        }
    }

    #[test]
    fn valid_form_builds_trimmed_patient() {
        let patient = validate_patient(&form(), &registry()).unwrap();
        assert_eq!(patient.id.as_str(), "TCTH-300");
        assert_eq!(patient.days_post, -1);
        assert_eq!(patient.risk, RiskLevel::Baixo);
        assert_eq!(patient.status, PatientStatus::Condicionamento);
        assert_eq!(patient.notes, "");
    }

    #[test]
    fn blank_required_fields_are_rejected_first() {
        let mut f = form();
        f.name = "   ".into();
        f.transplant_type = String::new();
        assert_eq!(
            validate_patient(&f, &registry()),
            Err(ValidationError::MissingPatientFields)
        );
    }

    #[test]
    fn blank_transplant_type_is_rejected() {
        let mut f = form();
        f.transplant_type = " ".into();
        assert_eq!(
            validate_patient(&f, &registry()),
            Err(ValidationError::MissingTransplantType)
        );
    }

    #[test]
    fn days_post_uses_integer_prefix() {
        let mut f = form();
        f.days_post = "12 dias".into();
        assert_eq!(validate_patient(&f, &registry()).unwrap().days_post, 12);

        f.days_post = "D+3".into();
        assert_eq!(
            validate_patient(&f, &registry()),
            Err(ValidationError::InvalidDaysPost)
        );
        f.days_post = String::new();
        assert_eq!(
            validate_patient(&f, &registry()),
            Err(ValidationError::InvalidDaysPost)
        );
    }

    #[test]
    fn duplicate_id_is_case_insensitive() {
        let mut f = form();
        f.id = "tcth-201".into();
        let err = validate_patient(&f, &registry()).unwrap_err();
        assert_eq!(err, ValidationError::DuplicatePatientId("tcth-201".into()));
        assert_eq!(
            err.to_string(),
            "Já existe um paciente com este ID em acompanhamento."
        );
    }

    #[test]
    fn unknown_select_values_are_sanitized() {
        let mut f = form();
        f.risk = "crítico".into();
        f.status = "Internado".into();
        let patient = validate_patient(&f, &registry()).unwrap();
        assert_eq!(patient.risk, RiskLevel::Moderado);
        assert_eq!(patient.status, PatientStatus::FollowUp);
    }

    #[test]
    fn transplant_requires_id_and_infusion_date() {
        let mut f = TransplantForm {
            id: "TCTH-2024-010".into(),
            patient_id: "P404".into(),
            infusion_date: "2024-03-01".into(),
            ..Default::default()
        };
        let t = validate_transplant(&f).unwrap();
        assert_eq!(t.engraftment_date, None);
        assert_eq!(t.patient_id, "P404");

        f.engraftment_date = "março".into();
        assert_eq!(
            validate_transplant(&f),
            Err(ValidationError::InvalidDate("o engraftment"))
        );

        f.id = " ".into();
        assert_eq!(
            validate_transplant(&f),
            Err(ValidationError::MissingTransplantId)
        );
    }

    #[test]
    fn followup_gets_generated_id() {
        let f = FollowupForm {
            patient_id: "TCTH-201".into(),
            kind: "Consulta".into(),
            date: "2024-04-02".into(),
            ..Default::default()
        };
        let a = validate_followup(&f).unwrap();
        let b = validate_followup(&f).unwrap();
        assert_ne!(a.id, b.id);

        let bad = FollowupForm {
            date: String::new(),
            ..f
        };
        assert!(validate_followup(&bad).is_err());
    }
}
