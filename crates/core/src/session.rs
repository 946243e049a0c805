//! The registry session: single owner of the store and all interface state.
//!
//! Every user action is a [`Command`]. [`RegistrySession::dispatch`] validates and
//! applies it to the in-memory registry; [`RegistrySession::handle`] additionally
//! persists when something changed and hands a fresh [`RegistryView`] to a renderer.
//! Validation failures surface as warning notices and leave the store untouched.

use crate::config::RegistryConfig;
use crate::constants::THEME_STORAGE_KEY;
use crate::export::{export_registry, ExportFile, ExportFormat};
use crate::filter::PatientFilter;
use crate::model::{demo_registry, AuditEntry, Registry};
use crate::persistence::{load_registry, persist_registry, LoadSource};
use crate::storage::{usable_or_memory, StorageBackend};
use crate::ui::{CloseTrigger, ModalKind, Notice, NoticeSlot, NoticeTone, Overlay};
use crate::validation::{
    validate_followup, validate_patient, validate_transplant, FollowupForm, PatientForm,
    TransplantForm, ValidationError,
};
use crate::view::{patient_details, project, Renderer, RegistryView, ViewContext};
use crate::{RegistryError, RegistryResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tcth_types::Theme;

pub const PATIENT_ADDED_MESSAGE: &str = "Paciente cadastrado com sucesso no prontuário de TCTH.";
pub const FILTERS_CLEARED_MESSAGE: &str = "Filtros limpos. Exibindo todos os pacientes.";
pub const TRANSPLANT_ADDED_MESSAGE: &str = "TCTH registrado com sucesso.";
pub const FOLLOWUP_ADDED_MESSAGE: &str = "Acompanhamento agendado com sucesso.";
pub const DEMO_RESTORED_MESSAGE: &str = "Base demonstrativa restaurada.";
pub const RESET_PROMPT: &str = "Deseja realmente restaurar a base demonstrativa?";

/// Confirmation question asked before a patient is removed.
pub fn removal_prompt(name: &str) -> String {
    format!("Remover o paciente {name} da base clínica?")
}

/// A user action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    AddPatient(PatientForm),
    /// Removal only happens once the user has confirmed [`removal_prompt`].
    RemovePatient { id: String, confirmed: bool },
    ShowPatient(String),
    AddTransplant(TransplantForm),
    AddFollowup(FollowupForm),
    SetFilter(PatientFilter),
    ClearFilters,
    QuickSearch(String),
    /// Renders an export. Nothing is recorded until the front-end reports
    /// [`Command::ExportSaved`].
    Export(ExportFormat),
    /// The rendered export was delivered; appends its audit entry.
    ExportSaved(ExportFormat),
    ResetDemo { confirmed: bool },
    SetTheme(Theme),
    ToggleTheme,
    OpenModal(ModalKind),
    CloseModal(ModalKind, CloseTrigger),
    Escape,
    ToggleHelp(Option<bool>),
}

/// What a dispatched command did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// The registry was mutated and should be persisted.
    pub changed: bool,
    pub notice: Option<Notice>,
    pub export: Option<ExportFile>,
    pub details: Option<Vec<(&'static str, String)>>,
}

impl Outcome {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed(notice: Option<Notice>) -> Self {
        Self {
            changed: true,
            notice,
            ..Self::default()
        }
    }
}

pub struct RegistrySession {
    cfg: Arc<RegistryConfig>,
    storage: Box<dyn StorageBackend>,
    registry: Registry,
    filter: PatientFilter,
    theme: Theme,
    notices: NoticeSlot,
    overlay: Overlay,
    load_source: LoadSource,
}

impl RegistrySession {
    /// Opens a session over `storage`.
    ///
    /// The backend is probed first and replaced by memory storage when it refuses
    /// writes. When nothing was stored yet, the demonstration dataset is written back
    /// immediately so the next session finds it.
    pub fn open(cfg: Arc<RegistryConfig>, storage: Box<dyn StorageBackend>, now: DateTime<Utc>) -> Self {
        let mut storage = usable_or_memory(storage);
        let loaded = load_registry(storage.as_ref(), cfg.storage_key(), now);
        let mut registry = loaded.registry;

        let theme = match storage.get_item(THEME_STORAGE_KEY) {
            Ok(Some(raw)) => Theme::sanitize(&raw),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!("could not read theme preference: {}", e);
                Theme::default()
            }
        };
        registry.settings.theme = theme;

        if loaded.source == LoadSource::DemoNotFound {
            persist_registry(storage.as_mut(), cfg.storage_key(), &mut registry, now);
        }

        Self {
            cfg,
            storage,
            registry,
            filter: PatientFilter::cleared(),
            theme,
            notices: NoticeSlot::default(),
            overlay: Overlay::default(),
            load_source: loaded.source,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.cfg
    }

    pub fn filter(&self) -> &PatientFilter {
        &self.filter
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn load_source(&self) -> &LoadSource {
        &self.load_source
    }

    /// Whether writes survive the session.
    pub fn is_durable(&self) -> bool {
        self.storage.is_durable()
    }

    pub fn active_notice(&self, now: DateTime<Utc>) -> Option<&Notice> {
        self.notices.active(now)
    }

    fn notice(&mut self, message: impl Into<String>, tone: NoticeTone, now: DateTime<Utc>) -> Notice {
        let notice = Notice::new(message, tone, now, self.cfg.notice_lifetime());
        self.notices.show(notice.clone());
        notice
    }

    fn audit(&mut self, now: DateTime<Utc>, description: String) {
        let entry = AuditEntry::new(now, self.cfg.author().as_str(), description);
        self.registry.record_audit(entry);
    }

    fn rejected(&mut self, err: ValidationError, now: DateTime<Utc>) -> Outcome {
        tracing::debug!("form rejected: {:?}", err);
        let notice = self.notice(err.to_string(), NoticeTone::Warning, now);
        Outcome {
            notice: Some(notice),
            ..Outcome::unchanged()
        }
    }

    /// Applies `cmd` to the in-memory state. Does not persist or render.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::PatientNotFound`] when details are requested for an
    /// unknown id, and propagates export serialisation failures.
    pub fn dispatch(&mut self, cmd: Command, now: DateTime<Utc>) -> RegistryResult<Outcome> {
        let outcome = match cmd {
            Command::AddPatient(form) => match validate_patient(&form, &self.registry) {
                Ok(patient) => {
                    self.audit(
                        now,
                        format!("Paciente {} ({}) cadastrado.", patient.name, patient.id),
                    );
                    tracing::info!("patient {} registered", patient.id);
                    self.registry.prepend_patient(patient);
                    self.overlay.close(ModalKind::Patient, CloseTrigger::Submitted);
                    let notice = self.notice(PATIENT_ADDED_MESSAGE, NoticeTone::Success, now);
                    Outcome::changed(Some(notice))
                }
                Err(err) => self.rejected(err, now),
            },

            Command::RemovePatient { id, confirmed } => {
                if !confirmed {
                    return Ok(Outcome::unchanged());
                }
                match self.registry.remove_patient(&id) {
                    Some(patient) => {
                        self.audit(
                            now,
                            format!("Paciente {} ({}) removido.", patient.name, patient.id),
                        );
                        tracing::info!("patient {} removed", patient.id);
                        self.overlay
                            .close(ModalKind::PatientDetails, CloseTrigger::Submitted);
                        let notice = self.notice(
                            format!("Paciente {} removido do prontuário.", patient.name),
                            NoticeTone::Warning,
                            now,
                        );
                        Outcome::changed(Some(notice))
                    }
                    None => {
                        tracing::debug!("remove ignored, no patient with id {}", id);
                        Outcome::unchanged()
                    }
                }
            }

            Command::ShowPatient(id) => {
                let patient = self
                    .registry
                    .patient(&id)
                    .ok_or_else(|| RegistryError::PatientNotFound(id.clone()))?;
                let details = patient_details(patient);
                self.overlay.open(ModalKind::PatientDetails);
                Outcome {
                    details: Some(details),
                    ..Outcome::unchanged()
                }
            }

            Command::AddTransplant(form) => match validate_transplant(&form) {
                Ok(transplant) => {
                    self.audit(
                        now,
                        format!(
                            "TCTH {} registrado para o paciente {}.",
                            transplant.id, transplant.patient_id
                        ),
                    );
                    self.registry.push_transplant(transplant);
                    self.overlay
                        .close(ModalKind::Transplant, CloseTrigger::Submitted);
                    let notice = self.notice(TRANSPLANT_ADDED_MESSAGE, NoticeTone::Success, now);
                    Outcome::changed(Some(notice))
                }
                Err(err) => self.rejected(err, now),
            },

            Command::AddFollowup(form) => match validate_followup(&form) {
                Ok(followup) => {
                    self.audit(
                        now,
                        format!(
                            "Seguimento {} agendado para {}.",
                            followup.kind, followup.patient_id
                        ),
                    );
                    self.registry.push_followup(followup);
                    self.overlay.close(ModalKind::Followup, CloseTrigger::Submitted);
                    let notice = self.notice(FOLLOWUP_ADDED_MESSAGE, NoticeTone::Success, now);
                    Outcome::changed(Some(notice))
                }
                Err(err) => self.rejected(err, now),
            },

            Command::SetFilter(filter) => {
                self.filter = filter;
                Outcome::unchanged()
            }

            Command::ClearFilters => {
                self.filter = PatientFilter::cleared();
                let notice = self.notice(FILTERS_CLEARED_MESSAGE, NoticeTone::Info, now);
                Outcome {
                    notice: Some(notice),
                    ..Outcome::unchanged()
                }
            }

            Command::QuickSearch(query) => {
                self.filter = PatientFilter::quick(query);
                Outcome::unchanged()
            }

            Command::Export(format) => {
                let file = export_registry(&self.registry, format, now)?;
                tracing::debug!("export {} generated", file.filename);
                Outcome {
                    export: Some(file),
                    ..Outcome::unchanged()
                }
            }

            Command::ExportSaved(format) => {
                self.audit(now, format.audit_description().to_string());
                tracing::info!("{:?} export saved", format);
                Outcome::changed(None)
            }

            Command::ResetDemo { confirmed } => {
                if !confirmed {
                    return Ok(Outcome::unchanged());
                }
                self.registry = demo_registry(now);
                self.filter = PatientFilter::cleared();
                tracing::info!("registry reset to demonstration data");
                let notice = self.notice(DEMO_RESTORED_MESSAGE, NoticeTone::Info, now);
                Outcome::changed(Some(notice))
            }

            Command::SetTheme(theme) => {
                self.apply_theme(theme);
                Outcome::changed(None)
            }

            Command::ToggleTheme => {
                self.apply_theme(self.theme.toggled());
                Outcome::changed(None)
            }

            Command::OpenModal(kind) => {
                self.overlay.open(kind);
                Outcome::unchanged()
            }

            Command::CloseModal(kind, trigger) => {
                self.overlay.close(kind, trigger);
                Outcome::unchanged()
            }

            Command::Escape => {
                self.overlay.escape();
                Outcome::unchanged()
            }

            Command::ToggleHelp(open) => {
                self.overlay.toggle_help(open);
                Outcome::unchanged()
            }
        };

        Ok(outcome)
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.registry.settings.theme = theme;
        if let Err(e) = self.storage.set_item(THEME_STORAGE_KEY, theme.as_str()) {
            tracing::warn!("could not save theme preference: {}", e);
        }
    }

    /// Writes the registry snapshot. Returns whether the write succeeded.
    pub fn persist(&mut self, now: DateTime<Utc>) -> bool {
        persist_registry(
            self.storage.as_mut(),
            self.cfg.storage_key(),
            &mut self.registry,
            now,
        )
    }

    /// Projects the current state for display.
    pub fn view(&self, now: DateTime<Utc>) -> RegistryView {
        project(
            &self.registry,
            &ViewContext {
                filter: &self.filter,
                theme: self.theme,
                now,
                audit_limit: self.cfg.audit_display_limit(),
                notice: self.notices.active(now),
                modal: self.overlay.open_modal(),
            },
        )
    }

    /// Dispatches `cmd`, persists if the registry changed, then renders.
    pub fn handle(
        &mut self,
        cmd: Command,
        now: DateTime<Utc>,
        renderer: &mut dyn Renderer,
    ) -> RegistryResult<Outcome> {
        let outcome = self.dispatch(cmd, now)?;
        if outcome.changed {
            self.persist(now);
        }
        renderer.render(&self.view(now));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::REGISTRY_STORAGE_KEY;
    use crate::storage::MemoryStorage;
    use chrono::{Duration, TimeZone};
    use std::path::PathBuf;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    fn session() -> RegistrySession {
        let cfg = RegistryConfig::with_defaults(PathBuf::from("unused")).unwrap();
        RegistrySession::open(Arc::new(cfg), Box::new(MemoryStorage::new()), now())
    }

    fn form(id: &str) -> PatientForm {
        PatientForm {
            id: id.into(),
            name: "Paula Reis".into(),
            diagnosis: "Linfoma de Hodgkin".into(),
            transplant_type: "Autólogo".into(),
            days_post: "4".into(),
            risk: "alto".into(),
            status: "Pós-imediato".into(),
            notes: String::new(),
        }
    }

    #[derive(Default)]
    struct Recorder {
        frames: Vec<RegistryView>,
    }

    impl Renderer for Recorder {
        fn render(&mut self, view: &RegistryView) {
            self.frames.push(view.clone());
        }
    }

    #[test]
    fn open_seeds_demo_and_persists_it() {
        let s = session();
        assert_eq!(s.load_source(), &LoadSource::DemoNotFound);
        assert!(s
            .storage
            .get_item(REGISTRY_STORAGE_KEY)
            .unwrap()
            .is_some());
    }

    #[test]
    fn add_patient_prepends_audits_and_closes_modal() {
        let mut s = session();
        s.dispatch(Command::OpenModal(ModalKind::Patient), now()).unwrap();
        let audits = s.registry().audit_trail.len();

        let out = s.dispatch(Command::AddPatient(form("TCTH-300")), now()).unwrap();

        assert!(out.changed);
        assert_eq!(s.registry().patients[0].id.as_str(), "TCTH-300");
        assert_eq!(s.registry().audit_trail.len(), audits + 1);
        assert_eq!(s.overlay().open_modal(), None);
        assert_eq!(out.notice.unwrap().message, PATIENT_ADDED_MESSAGE);
    }

    #[test]
    fn rejected_form_shows_warning_and_keeps_modal() {
        let mut s = session();
        s.dispatch(Command::OpenModal(ModalKind::Patient), now()).unwrap();
        let before = s.registry().clone();

        let out = s.dispatch(Command::AddPatient(form("tcth-201")), now()).unwrap();

        assert!(!out.changed);
        assert_eq!(s.registry(), &before);
        assert_eq!(s.overlay().open_modal(), Some(ModalKind::Patient));
        let notice = s.active_notice(now()).unwrap();
        assert_eq!(notice.tone, NoticeTone::Warning);
        assert_eq!(
            notice.message,
            "Já existe um paciente com este ID em acompanhamento."
        );
    }

    #[test]
    fn removal_requires_confirmation() {
        let mut s = session();
        let count = s.registry().patients.len();

        let out = s
            .dispatch(
                Command::RemovePatient {
                    id: "TCTH-201".into(),
                    confirmed: false,
                },
                now(),
            )
            .unwrap();
        assert!(!out.changed);
        assert_eq!(s.registry().patients.len(), count);

        let out = s
            .dispatch(
                Command::RemovePatient {
                    id: "TCTH-201".into(),
                    confirmed: true,
                },
                now(),
            )
            .unwrap();
        assert!(out.changed);
        assert_eq!(s.registry().patients.len(), count - 1);
        assert_eq!(
            out.notice.unwrap().message,
            "Paciente Mariana Lopes removido do prontuário."
        );
    }

    #[test]
    fn show_unknown_patient_is_an_error() {
        let mut s = session();
        let err = s
            .dispatch(Command::ShowPatient("P-404".into()), now())
            .unwrap_err();
        assert!(matches!(err, RegistryError::PatientNotFound(id) if id == "P-404"));
    }

    #[test]
    fn clear_filters_notifies() {
        let mut s = session();
        s.dispatch(Command::QuickSearch("mieloma".into()), now()).unwrap();
        assert!(!s.filter().is_cleared());

        let out = s.dispatch(Command::ClearFilters, now()).unwrap();
        assert!(s.filter().is_cleared());
        assert_eq!(out.notice.unwrap().message, FILTERS_CLEARED_MESSAGE);
        assert!(s.active_notice(now() + Duration::seconds(5)).is_none());
    }

    #[test]
    fn export_is_audited_only_once_saved() {
        let mut s = session();
        let audits = s.registry().audit_trail.len();

        let out = s.dispatch(Command::Export(ExportFormat::Csv), now()).unwrap();
        assert!(!out.changed);
        let file = out.export.unwrap();
        assert!(file.filename.ends_with(".csv"));
        assert_eq!(s.registry().audit_trail.len(), audits);

        let out = s.dispatch(Command::ExportSaved(ExportFormat::Csv), now()).unwrap();
        assert!(out.changed);
        assert_eq!(s.registry().audit_trail.len(), audits + 1);
        assert_eq!(
            s.registry().audit_trail.last().unwrap().description,
            "Exportação CSV realizada."
        );
    }

    #[test]
    fn handle_persists_and_renders() {
        let mut s = session();
        let mut recorder = Recorder::default();
        let later = now() + Duration::minutes(1);

        s.handle(Command::AddPatient(form("TCTH-301")), later, &mut recorder)
            .unwrap();

        assert_eq!(recorder.frames.len(), 1);
        assert_eq!(recorder.frames[0].patients[0].id, "TCTH-301");
        let stored = s.storage.get_item(REGISTRY_STORAGE_KEY).unwrap().unwrap();
        assert!(stored.contains("TCTH-301"));
        assert_eq!(s.registry().settings.last_sync, later);
    }

    #[test]
    fn stored_theme_wins_over_snapshot_setting() {
        let mut storage = MemoryStorage::new();
        storage.set_item(THEME_STORAGE_KEY, "dark").unwrap();
        let cfg = RegistryConfig::with_defaults(PathBuf::from("unused")).unwrap();
        let s = RegistrySession::open(Arc::new(cfg), Box::new(storage), now());
        assert_eq!(s.theme(), Theme::Dark);
        assert_eq!(s.registry().settings.theme, Theme::Dark);
    }

    #[test]
    fn theme_toggle_is_stored() {
        let mut s = session();
        assert_eq!(s.theme(), Theme::Light);
        s.dispatch(Command::ToggleTheme, now()).unwrap();
        assert_eq!(s.theme(), Theme::Dark);
        assert_eq!(
            s.storage.get_item(THEME_STORAGE_KEY).unwrap().as_deref(),
            Some("dark")
        );
    }
}
