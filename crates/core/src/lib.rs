//! # TCTH Core
//!
//! Core business logic for the TCTH (stem-cell transplant) clinical registry.
//!
//! This crate contains the registry store and everything that operates on it:
//! - Record model, demonstration dataset and snapshot sanitisation
//! - Key/value storage backends with a file-per-key layout under `TCTH_DATA_DIR`
//! - Loading with demo fallback and best-effort persistence
//! - Patient filtering, dashboard metrics and monthly series
//! - Form validation, command dispatch and view projection
//! - JSON and CSV export
//!
//! **No front-end concerns**: argument parsing, environment handling and drawing belong in
//! `tcth-cli` or any other [`view::Renderer`] implementation.

pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod filter;
pub mod format;
pub mod ids;
pub mod metrics;
pub mod model;
pub mod persistence;
pub mod sanitize;
pub mod session;
pub mod storage;
pub mod ui;
pub mod validation;
pub mod view;

pub use config::RegistryConfig;
pub use error::{RegistryError, RegistryResult, StorageError, StorageResult};
pub use export::{ExportFile, ExportFormat};
pub use filter::{Choice, PatientFilter};
pub use metrics::DashboardMetrics;
pub use model::{Followup, Patient, Registry, Transplant};
pub use session::{Command, Outcome, RegistrySession};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use validation::{FollowupForm, PatientForm, TransplantForm, ValidationError};
pub use view::{Renderer, RegistryView};

pub use tcth_types::{NonEmptyText, PatientStatus, RiskLevel, Theme};
