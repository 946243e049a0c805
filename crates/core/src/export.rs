//! JSON and CSV exports of the registry.

use crate::constants::CSV_HEADER;
use crate::format::{format_date, format_optional_date};
use crate::model::Registry;
use crate::persistence::serialize_registry;
use crate::{RegistryError, RegistryResult};
use chrono::{DateTime, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }

    /// Audit description recorded after a successful export.
    pub fn audit_description(self) -> &'static str {
        match self {
            ExportFormat::Json => "Exportação JSON realizada.",
            ExportFormat::Csv => "Exportação CSV realizada.",
        }
    }
}

/// A rendered export, ready to be written wherever the front-end puts downloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub format: ExportFormat,
    pub content: String,
}

/// One row per transplant, joined to its patient when the reference resolves.
///
/// # Errors
///
/// Returns [`RegistryError::Csv`] if a record cannot be written and
/// [`RegistryError::Export`] if the buffer cannot be turned into text.
pub fn registry_csv(registry: &Registry) -> RegistryResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for transplant in &registry.transplants {
        let patient = registry.patient(&transplant.patient_id);
        writer.write_record([
            patient
                .map(|p| p.name.to_string())
                .unwrap_or_else(|| transplant.patient_id.clone()),
            patient
                .map(|p| p.diagnosis.clone())
                .unwrap_or_else(|| "-".into()),
            patient
                .map(|p| p.risk.as_str().to_string())
                .unwrap_or_else(|| "-".into()),
            transplant.status.clone(),
            format_date(transplant.infusion_date),
            format_optional_date(transplant.engraftment_date),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| RegistryError::Export(e.error().to_string()))?;
    String::from_utf8(bytes).map_err(|e| RegistryError::Export(e.to_string()))
}

/// Renders `registry` in `format`, naming the file after `now` in epoch milliseconds.
pub fn export_registry(
    registry: &Registry,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> RegistryResult<ExportFile> {
    let millis = now.timestamp_millis();
    let file = match format {
        ExportFormat::Json => ExportFile {
            filename: format!("tcth-registro-{millis}.json"),
            format,
            content: serialize_registry(registry, true)?,
        },
        ExportFormat::Csv => ExportFile {
            filename: format!("tcth-transplantes-{millis}.csv"),
            format,
            content: registry_csv(registry)?,
        },
    };
    Ok(file)
}
