//! Lenient wire model for stored snapshots and translation into typed records.
//!
//! Stored snapshots are untrusted: they may come from an older layout, from a hand edit,
//! or from a partially written value. Parsing happens in two stages:
//!
//! 1. The outer shape is checked strictly with `serde_path_to_error`, so a wrong shape is
//!    reported with the offending path (e.g. `patients`) and the caller can fall back.
//! 2. Each record is translated field by field. Records missing their key fields are
//!    dropped; every other field is coerced, and enumerable fields are mapped onto their
//!    allow-lists with documented defaults.
//!
//! A bare JSON array is accepted as the legacy patients-only layout. Since that layout
//! carries nothing but patients, a legacy array without a single valid patient is rejected.

use crate::constants::SNAPSHOT_VERSION;
use crate::ids::new_token;
use crate::model::{AuditEntry, Compliance, Followup, Patient, Registry, Settings, Transplant};
use crate::{RegistryError, RegistryResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tcth_types::{NonEmptyText, PatientStatus, RiskLevel, Theme};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotWire {
    #[serde(default)]
    patients: Vec<Value>,
    #[serde(default)]
    transplants: Vec<Value>,
    #[serde(default)]
    followups: Vec<Value>,
    #[serde(default)]
    compliance: Option<Value>,
    #[serde(default)]
    audit_trail: Vec<Value>,
    #[serde(default)]
    settings: Option<Value>,
}

/// Parse a stored snapshot into a sanitized [`Registry`].
///
/// # Errors
///
/// Returns [`RegistryError::Deserialization`] if `raw` is not JSON, and
/// [`RegistryError::Schema`] if the outer structure has the wrong shape, and
/// [`RegistryError::InvalidInput`] for a legacy array with no valid patient.
/// Individual malformed records never produce an error; they are dropped or repaired.
pub fn parse_snapshot(raw: &str, now: DateTime<Utc>) -> RegistryResult<Registry> {
    let value: Value = serde_json::from_str(raw).map_err(RegistryError::Deserialization)?;

    let wire = match value {
        Value::Array(patients) => {
            let registry = wire_to_domain(
                SnapshotWire {
                    patients,
                    transplants: Vec::new(),
                    followups: Vec::new(),
                    compliance: None,
                    audit_trail: Vec::new(),
                    settings: None,
                },
                now,
            );
            if registry.patients.is_empty() {
                return Err(RegistryError::InvalidInput(
                    "legacy snapshot has no valid patients".into(),
                ));
            }
            return Ok(registry);
        }
        other => match serde_path_to_error::deserialize::<_, SnapshotWire>(other) {
            Ok(wire) => wire,
            Err(err) => {
                let path = err.path().to_string();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                return Err(RegistryError::Schema {
                    path,
                    message: err.into_inner().to_string(),
                });
            }
        },
    };

    Ok(wire_to_domain(wire, now))
}

fn wire_to_domain(wire: SnapshotWire, now: DateTime<Utc>) -> Registry {
    let patients = keep_valid("patients", &wire.patients, sanitize_patient);
    let transplants = keep_valid("transplants", &wire.transplants, sanitize_transplant);
    let followups = keep_valid("followups", &wire.followups, sanitize_followup);
    let audit_trail = keep_valid("auditTrail", &wire.audit_trail, sanitize_audit_entry);

    let compliance = wire
        .compliance
        .as_ref()
        .and_then(Value::as_object)
        .map(sanitize_compliance)
        .unwrap_or_default();

    let settings = wire
        .settings
        .as_ref()
        .and_then(Value::as_object)
        .map(|obj| sanitize_settings(obj, now))
        .unwrap_or_else(|| Settings::new(now));

    Registry {
        patients,
        transplants,
        followups,
        compliance,
        audit_trail,
        settings,
    }
}

fn keep_valid<T>(collection: &str, raw: &[Value], sanitize: fn(&Value) -> Option<T>) -> Vec<T> {
    let kept: Vec<T> = raw.iter().filter_map(sanitize).collect();
    let dropped = raw.len() - kept.len();
    if dropped > 0 {
        tracing::warn!(
            "dropped {} malformed record(s) from stored {}",
            dropped,
            collection
        );
    }
    kept
}

// ============================================================================
// Field coercion
// ============================================================================

/// Any scalar rendered as trimmed text; missing, null, `false` and containers become empty.
fn text(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "true".into(),
        _ => String::new(),
    }
}

/// Only genuine strings, trimmed and non-blank.
fn required_text(obj: &Map<String, Value>, key: &str) -> Option<NonEmptyText> {
    match obj.get(key) {
        Some(Value::String(s)) => NonEmptyText::new(s).ok(),
        _ => None,
    }
}

/// Numbers or numeric strings, truncated toward zero; anything else is `0`.
fn integer(obj: &Map<String, Value>, key: &str) -> i32 {
    let parsed = match obj.get(key) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    };
    parsed
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(0)
}

fn boolean(obj: &Map<String, Value>, key: &str) -> bool {
    matches!(obj.get(key), Some(Value::Bool(true)))
}

/// Parses `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

fn date(obj: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    obj.get(key).and_then(Value::as_str).and_then(parse_date)
}

fn timestamp(obj: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    obj.get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// Records
// ============================================================================

fn sanitize_patient(value: &Value) -> Option<Patient> {
    let obj = value.as_object()?;
    Some(Patient {
        id: required_text(obj, "id")?,
        name: required_text(obj, "name")?,
        diagnosis: text(obj, "diagnosis"),
        transplant_type: text(obj, "transplantType"),
        days_post: integer(obj, "daysPost"),
        risk: RiskLevel::sanitize(&text(obj, "risk")),
        status: PatientStatus::sanitize(&text(obj, "status")),
        notes: text(obj, "notes"),
    })
}

fn sanitize_transplant(value: &Value) -> Option<Transplant> {
    let obj = value.as_object()?;
    Some(Transplant {
        id: required_text(obj, "id")?,
        patient_id: text(obj, "patientId"),
        donor_type: text(obj, "donorType"),
        graft_source: text(obj, "graftSource"),
        conditioning: text(obj, "conditioning"),
        infusion_date: date(obj, "infusionDate")?,
        engraftment_date: date(obj, "engraftmentDate"),
        cmv_status: text(obj, "cmvStatus"),
        aboi: text(obj, "aboi"),
        status: text(obj, "status"),
    })
}

fn sanitize_followup(value: &Value) -> Option<Followup> {
    let obj = value.as_object()?;
    let id = match text(obj, "id") {
        id if id.is_empty() => new_token(),
        id => id,
    };
    Some(Followup {
        id,
        patient_id: text(obj, "patientId"),
        kind: text(obj, "type"),
        date: date(obj, "date")?,
        professional: text(obj, "professional"),
        summary: text(obj, "summary"),
        status: text(obj, "status"),
    })
}

fn sanitize_audit_entry(value: &Value) -> Option<AuditEntry> {
    let obj = value.as_object()?;
    Some(AuditEntry {
        date: timestamp(obj, "date")?,
        author: text(obj, "author"),
        description: text(obj, "description"),
    })
}

fn sanitize_compliance(obj: &Map<String, Value>) -> Compliance {
    let risk_notes = obj
        .get("riskNotes")
        .and_then(Value::as_array)
        .map(|notes| {
            notes
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Compliance {
        lgpd: boolean(obj, "lgpd"),
        hipaa: boolean(obj, "hipaa"),
        anvisa: boolean(obj, "anvisa"),
        risk_notes,
    }
}

fn sanitize_settings(obj: &Map<String, Value>, now: DateTime<Utc>) -> Settings {
    let defaults = Settings::new(now);
    let or_default = |value: String, default: String| if value.is_empty() { default } else { value };

    Settings {
        theme: Theme::sanitize(&text(obj, "theme")),
        version: or_default(text(obj, "version"), SNAPSHOT_VERSION.into()),
        last_sync: timestamp(obj, "lastSync").unwrap_or(now),
        data_owner: or_default(text(obj, "dataOwner"), defaults.data_owner),
        contact: or_default(text(obj, "contact"), defaults.contact),
    }
}
