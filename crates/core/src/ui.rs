//! Transient interface state: notices, modals and the help drawer.
//!
//! None of this is persisted. Timers are modelled as expiry instants checked against the
//! current time, so replacing a notice implicitly cancels the previous one.

use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeTone {
    Info,
    Success,
    Warning,
}

impl NoticeTone {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeTone::Info => "info",
            NoticeTone::Success => "success",
            NoticeTone::Warning => "warning",
        }
    }
}

/// A dismissible message shown above the patient table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub tone: NoticeTone,
    pub expires_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(message: impl Into<String>, tone: NoticeTone, now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            message: message.into(),
            tone,
            expires_at: now + lifetime,
        }
    }

    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Single notice slot; showing a new notice replaces the current one.
#[derive(Clone, Debug, Default)]
pub struct NoticeSlot {
    current: Option<Notice>,
}

impl NoticeSlot {
    pub fn show(&mut self, notice: Notice) {
        self.current = Some(notice);
    }

    /// The notice still visible at `now`, if any.
    pub fn active(&self, now: DateTime<Utc>) -> Option<&Notice> {
        self.current.as_ref().filter(|n| n.is_visible(now))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalKind {
    Patient,
    PatientDetails,
    Transplant,
    Followup,
    Compliance,
}

/// What closed a modal. Every trigger has the same effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseTrigger {
    CloseButton,
    Backdrop,
    Escape,
    Submitted,
}

/// Modal and help-drawer visibility.
///
/// Each modal is either closed or open; opening one while another is open replaces it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overlay {
    modal: Option<ModalKind>,
    help_open: bool,
}

impl Overlay {
    pub fn open(&mut self, kind: ModalKind) {
        self.modal = Some(kind);
    }

    /// Closes `kind` if it is the open modal. Returns whether anything closed.
    pub fn close(&mut self, kind: ModalKind, trigger: CloseTrigger) -> bool {
        if self.modal == Some(kind) {
            tracing::trace!("closing {:?} modal ({:?})", kind, trigger);
            self.modal = None;
            true
        } else {
            false
        }
    }

    /// Escape closes the open modal first, otherwise the help drawer.
    pub fn escape(&mut self) {
        if let Some(kind) = self.modal {
            self.close(kind, CloseTrigger::Escape);
        } else {
            self.help_open = false;
        }
    }

    pub fn toggle_help(&mut self, open: Option<bool>) {
        self.help_open = open.unwrap_or(!self.help_open);
    }

    pub fn open_modal(&self) -> Option<ModalKind> {
        self.modal
    }

    pub fn is_help_open(&self) -> bool {
        self.help_open
    }
}
