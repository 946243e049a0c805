//! Constants used throughout the TCTH core crate.
//!
//! Storage keys, display limits and fixed labels live here so the loader,
//! the writer and the projections agree on them.

/// Storage key holding the full registry snapshot.
pub const REGISTRY_STORAGE_KEY: &str = "tcth-registry-v1";

/// Storage key holding the theme preference.
pub const THEME_STORAGE_KEY: &str = "ht-theme";

/// Key written and removed when probing whether storage is usable.
pub const PROBE_STORAGE_KEY: &str = "__ht-storage-test__";

/// Default directory for file-backed storage when none is configured.
pub const DEFAULT_DATA_DIR: &str = "registry_data";

/// Number of audit entries shown in the audit log.
pub const AUDIT_DISPLAY_LIMIT: usize = 6;

/// Seconds a notice stays visible.
pub const NOTICE_LIFETIME_SECS: i64 = 5;

/// Longest accepted notice lifetime, in seconds.
pub const MAX_NOTICE_LIFETIME_SECS: i64 = 3600;

/// Author recorded on audit entries for user actions.
pub const DEFAULT_AUTHOR: &str = "Usuário logado";

/// Author recorded on audit entries created by the system.
pub const SYSTEM_AUTHOR: &str = "Sistema";

/// Schema version written into `settings.version`.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Wire sentinel for "no categorical filter".
pub const ALL_SENTINEL: &str = "todos";

/// Label used when a transplant or follow-up references an unknown patient.
pub const MISSING_PATIENT_LABEL: &str = "Paciente não localizado";

/// Placeholder for absent dates and metrics.
pub const EMPTY_VALUE: &str = "—";

/// Transplant status that counts as discharged on the dashboard.
pub const DISCHARGED_TRANSPLANT_STATUS: &str = "Alta hospitalar";

/// Follow-up status rendered as pending.
pub const SCHEDULED_FOLLOWUP_STATUS: &str = "Programado";

/// Header row of the transplant CSV export.
pub const CSV_HEADER: [&str; 6] = [
    "Paciente",
    "Diagnóstico",
    "Risco",
    "Status",
    "Infusão",
    "Engraftment",
];
