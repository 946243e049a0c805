//! Plain-text renderer for the terminal.

use tcth_core::metrics::MonthBucket;
use tcth_core::ui::NoticeTone;
use tcth_core::view::{RegistryView, NO_FOLLOWUPS_MESSAGE};
use tcth_core::Renderer;

/// Which part of the view a command prints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Dashboard,
    Patients,
    Transplants,
    Followups,
    Timeline,
    Audit,
    Compliance,
    Theme,
    /// Only the notice, if any.
    Quiet,
}

/// Collects rendered lines; `main` prints them once the command finishes.
pub struct TextRenderer {
    section: Section,
    lines: Vec<String>,
}

impl TextRenderer {
    pub fn new(section: Section) -> Self {
        Self {
            section,
            lines: Vec::new(),
        }
    }

    pub fn output(&self) -> String {
        self.lines.join("\n")
    }

    fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    fn series(&mut self, title: &str, buckets: &[MonthBucket]) {
        self.line(format!("{title}:"));
        if buckets.is_empty() {
            self.line("  —");
        }
        for bucket in buckets {
            self.line(format!(
                "  {} {:>3} {}",
                bucket.label,
                bucket.count,
                "#".repeat(bucket.count)
            ));
        }
    }

    fn dashboard(&mut self, view: &RegistryView) {
        let m = &view.metrics;
        let rate = m
            .engraftment_rate
            .map(|r| format!("{r}%"))
            .unwrap_or_else(|| "—".into());

        self.line(format!("Pacientes ativos:            {}", m.active_patients));
        self.line(format!("Taxa de engraftment:         {rate}"));
        self.line(format!("Alertas críticos:            {}", m.critical_alerts));
        self.line(format!("Score de conformidade:       {}%", m.compliance_score));
        self.line(format!("Total de pacientes:          {}", m.total_patients));
        self.line(format!("TCTH ativos:                 {}", m.active_transplants));
        self.line(format!("Acompanhamentos programados: {}", m.upcoming_followups));
        self.line(format!(
            "Engraftment dos TCTH:        {}%",
            m.transplant_engraftment_rate
        ));
        self.line(format!("Última sincronização:        {}", view.last_sync));
        self.series("Volume de TCTH", &view.volume_series);
        self.series("Engraftments", &view.engraftment_series);
    }

    fn patients(&mut self, view: &RegistryView) {
        if let Some(empty) = view.patients_empty {
            self.line(empty);
            return;
        }
        for row in &view.patients {
            self.line(format!(
                "{:<10} {:<20} {:<28} {:<18} {:>6}  {:<12} {}",
                row.id,
                row.name,
                row.diagnosis,
                row.transplant_type,
                row.day_label,
                row.risk_badge,
                row.status
            ));
        }
    }

    fn transplants(&mut self, view: &RegistryView) {
        for row in &view.transplants {
            self.line(format!(
                "{:<14} {:<24} {:<14} {:<16} {:<18} {}",
                row.id, row.patient, row.donor_type, row.graft_source, row.infusion, row.status
            ));
        }
    }

    fn followups(&mut self, view: &RegistryView) {
        if view.followups.is_empty() {
            self.line(NO_FOLLOWUPS_MESSAGE);
            return;
        }
        for item in &view.followups {
            let marker = if item.pending { "*" } else { " " };
            self.line(format!("{marker} {}", item.heading));
            self.line(format!(
                "    {} · {} · {}",
                item.patient, item.professional, item.status
            ));
            if !item.summary.is_empty() {
                self.line(format!("    {}", item.summary));
            }
        }
    }

    fn timeline(&mut self, view: &RegistryView) {
        for event in &view.timeline {
            self.line(format!("{}  {}", event.date, event.title));
            self.line(format!("            {}", event.description));
        }
    }

    fn audit(&mut self, view: &RegistryView) {
        for item in &view.audit {
            self.line(format!("{} · {}", item.when, item.author));
            self.line(format!("    {}", item.description));
        }
    }

    fn compliance(&mut self, view: &RegistryView) {
        for badge in &view.compliance.badges {
            self.line(format!("{:<7} {}", badge.regime, badge.label));
        }
        self.line("Riscos:");
        for note in &view.compliance.risk_notes {
            self.line(format!("  - {note}"));
        }
    }
}

impl Renderer for TextRenderer {
    fn render(&mut self, view: &RegistryView) {
        self.lines.clear();

        if let Some(notice) = &view.notice {
            let prefix = match notice.tone {
                NoticeTone::Info => "[info]",
                NoticeTone::Success => "[ok]",
                NoticeTone::Warning => "[aviso]",
            };
            self.line(format!("{prefix} {}", notice.message));
        }

        match self.section {
            Section::Dashboard => self.dashboard(view),
            Section::Patients => self.patients(view),
            Section::Transplants => self.transplants(view),
            Section::Followups => self.followups(view),
            Section::Timeline => self.timeline(view),
            Section::Audit => self.audit(view),
            Section::Compliance => self.compliance(view),
            Section::Theme => self.line(format!("Tema: {}", view.theme)),
            Section::Quiet => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tcth_core::{Command, MemoryStorage, PatientFilter, RegistryConfig, RegistrySession};

    fn session() -> (RegistrySession, chrono::DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let cfg = RegistryConfig::with_defaults(PathBuf::from("unused")).unwrap();
        let session = RegistrySession::open(Arc::new(cfg), Box::new(MemoryStorage::new()), now);
        (session, now)
    }

    #[test]
    fn dashboard_shows_demo_metrics() {
        let (session, now) = session();
        let mut renderer = TextRenderer::new(Section::Dashboard);
        renderer.render(&session.view(now));
        let out = renderer.output();
        assert!(out.contains("Pacientes ativos:            4"));
        assert!(out.contains("Taxa de engraftment:         65%"));
        assert!(out.contains("Score de conformidade:       96%"));
    }

    #[test]
    fn patients_section_prints_notice_and_empty_message() {
        let (mut session, now) = session();
        let mut renderer = TextRenderer::new(Section::Patients);
        session
            .handle(Command::SetFilter(PatientFilter::quick("inexistente")), now, &mut renderer)
            .unwrap();
        assert_eq!(
            renderer.output(),
            "Nenhum paciente encontrado com os filtros aplicados."
        );

        session
            .handle(Command::ClearFilters, now, &mut renderer)
            .unwrap();
        let out = renderer.output();
        assert!(out.starts_with("[info] Filtros limpos."));
        assert!(out.contains("TCTH-201"));
    }

    #[test]
    fn compliance_lists_each_regime() {
        let (session, now) = session();
        let mut renderer = TextRenderer::new(Section::Compliance);
        renderer.render(&session.view(now));
        let out = renderer.output();
        assert!(out.contains("LGPD    Conforme"));
        assert!(out.contains("HIPAA   Pendência"));
    }
}
