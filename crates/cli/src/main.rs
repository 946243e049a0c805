mod render;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use render::{Section, TextRenderer};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tcth_core::config::{
    audit_limit_from_env_value, author_from_env_value, data_dir_from_env_value,
    notice_lifetime_from_env_value, storage_key_from_env_value,
};
use tcth_core::session::{removal_prompt, RESET_PROMPT};
use tcth_core::{
    Choice, Command, ExportFile, ExportFormat, FileStorage, FollowupForm, PatientFilter, PatientForm,
    PatientStatus, RegistryConfig, RegistrySession, Renderer, RiskLevel, Theme, TransplantForm,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tcth")]
#[command(about = "TCTH clinical registry CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dashboard metrics and monthly series
    Dashboard,
    /// Patient records
    #[command(subcommand)]
    Patients(PatientCommands),
    /// Transplant records
    #[command(subcommand)]
    Transplants(TransplantCommands),
    /// Follow-up schedule
    #[command(subcommand)]
    Followups(FollowupCommands),
    /// Infusions, engraftments and follow-ups in date order
    Timeline,
    /// Most recent audit entries
    Audit,
    /// Compliance badges and risk notes
    Compliance,
    /// Export the registry
    Export {
        format: ExportKind,
        /// Directory the file is written to
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Restore the demonstration dataset
    ResetDemo {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show or change the display theme
    Theme {
        /// `light`, `dark` or `toggle`
        value: Option<String>,
    },
}

#[derive(Subcommand)]
enum PatientCommands {
    /// List patients, optionally filtered
    List {
        /// Matches id, name and diagnosis
        #[arg(long, default_value = "")]
        query: String,
        /// alto, moderado, baixo or todos
        #[arg(long, default_value = "todos")]
        risk: String,
        /// Care stage label or todos
        #[arg(long, default_value = "todos")]
        status: String,
    },
    /// Show one patient
    Show { id: String },
    /// Register a patient
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        diagnosis: String,
        #[arg(long)]
        transplant_type: String,
        /// Days relative to infusion, negative before it
        #[arg(long, allow_hyphen_values = true)]
        days_post: String,
        #[arg(long, default_value = "moderado")]
        risk: String,
        #[arg(long, default_value = "Follow-up")]
        status: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Remove a patient
    Remove {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum TransplantCommands {
    /// List transplants
    List,
    /// Register a transplant
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        patient_id: String,
        #[arg(long, default_value = "")]
        donor_type: String,
        #[arg(long, default_value = "")]
        graft_source: String,
        #[arg(long, default_value = "")]
        conditioning: String,
        /// YYYY-MM-DD
        #[arg(long)]
        infusion_date: String,
        /// YYYY-MM-DD
        #[arg(long, default_value = "")]
        engraftment_date: String,
        #[arg(long, default_value = "")]
        cmv_status: String,
        #[arg(long, default_value = "")]
        aboi: String,
        #[arg(long, default_value = "Pós-infusão")]
        status: String,
    },
}

#[derive(Subcommand)]
enum FollowupCommands {
    /// List follow-ups by date
    List,
    /// Schedule a follow-up
    Add {
        #[arg(long)]
        patient_id: String,
        #[arg(long, default_value = "Consulta")]
        kind: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "")]
        professional: String,
        #[arg(long, default_value = "")]
        summary: String,
        #[arg(long, default_value = "Programado")]
        status: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Json,
    Csv,
}

impl From<ExportKind> for ExportFormat {
    fn from(kind: ExportKind) -> Self {
        match kind {
            ExportKind::Json => ExportFormat::Json,
            ExportKind::Csv => ExportFormat::Csv,
        }
    }
}

/// Builds the registry configuration from `TCTH_*` environment variables.
fn config_from_env() -> anyhow::Result<RegistryConfig> {
    let cfg = RegistryConfig::new(
        data_dir_from_env_value(std::env::var("TCTH_DATA_DIR").ok()),
        storage_key_from_env_value(std::env::var("TCTH_STORAGE_KEY").ok()),
        author_from_env_value(std::env::var("TCTH_AUTHOR").ok())?,
        audit_limit_from_env_value(std::env::var("TCTH_AUDIT_LIMIT").ok())?,
        notice_lifetime_from_env_value(std::env::var("TCTH_NOTICE_SECS").ok())?,
    )?;
    Ok(cfg)
}

/// Asks a yes/no question on the terminal. Anything but `s`/`sim`/`y`/`yes` is no.
fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{question} [s/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(matches!(answer.as_str(), "s" | "sim" | "y" | "yes"))
}

fn parse_filter(query: String, risk: &str, status: &str) -> anyhow::Result<PatientFilter> {
    let risk = Choice::parse_with(risk, RiskLevel::parse)
        .with_context(|| format!("unknown risk filter '{risk}'"))?;
    let status = Choice::parse_with(status, PatientStatus::parse)
        .with_context(|| format!("unknown status filter '{status}'"))?;
    Ok(PatientFilter::new(query, risk, status))
}

/// Translates parsed arguments into a session command and the section to print.
fn plan(command: Commands) -> anyhow::Result<(Option<Command>, Section)> {
    let planned = match command {
        Commands::Dashboard => (None, Section::Dashboard),
        Commands::Patients(PatientCommands::List {
            query,
            risk,
            status,
        }) => (
            Some(Command::SetFilter(parse_filter(query, &risk, &status)?)),
            Section::Patients,
        ),
        Commands::Patients(PatientCommands::Show { id }) => {
            (Some(Command::ShowPatient(id)), Section::Quiet)
        }
        Commands::Patients(PatientCommands::Add {
            id,
            name,
            diagnosis,
            transplant_type,
            days_post,
            risk,
            status,
            notes,
        }) => (
            Some(Command::AddPatient(PatientForm {
                id,
                name,
                diagnosis,
                transplant_type,
                days_post,
                risk,
                status,
                notes,
            })),
            Section::Patients,
        ),
        Commands::Patients(PatientCommands::Remove { id, yes }) => (
            Some(Command::RemovePatient { id, confirmed: yes }),
            Section::Patients,
        ),
        Commands::Transplants(TransplantCommands::List) => (None, Section::Transplants),
        Commands::Transplants(TransplantCommands::Add {
            id,
            patient_id,
            donor_type,
            graft_source,
            conditioning,
            infusion_date,
            engraftment_date,
            cmv_status,
            aboi,
            status,
        }) => (
            Some(Command::AddTransplant(TransplantForm {
                id,
                patient_id,
                donor_type,
                graft_source,
                conditioning,
                infusion_date,
                engraftment_date,
                cmv_status,
                aboi,
                status,
            })),
            Section::Transplants,
        ),
        Commands::Followups(FollowupCommands::List) => (None, Section::Followups),
        Commands::Followups(FollowupCommands::Add {
            patient_id,
            kind,
            date,
            professional,
            summary,
            status,
        }) => (
            Some(Command::AddFollowup(FollowupForm {
                patient_id,
                kind,
                date,
                professional,
                summary,
                status,
            })),
            Section::Followups,
        ),
        Commands::Timeline => (None, Section::Timeline),
        Commands::Audit => (None, Section::Audit),
        Commands::Compliance => (None, Section::Compliance),
        Commands::Export { format, .. } => {
            (Some(Command::Export(format.into())), Section::Quiet)
        }
        Commands::ResetDemo { yes } => (
            Some(Command::ResetDemo { confirmed: yes }),
            Section::Dashboard,
        ),
        Commands::Theme { value } => {
            let command = match value.as_deref().map(str::trim) {
                None => None,
                Some("toggle") => Some(Command::ToggleTheme),
                Some(raw) => Some(Command::SetTheme(Theme::sanitize(raw))),
            };
            (command, Section::Theme)
        }
    };
    Ok(planned)
}

/// Fills in confirmations the user has not given on the command line.
fn confirmed(session: &RegistrySession, command: Command) -> anyhow::Result<Command> {
    Ok(match command {
        Command::RemovePatient { id, confirmed } => {
            let name = session
                .registry()
                .patient(&id)
                .map(|p| p.name.to_string())
                .with_context(|| format!("patient not found: {id}"))?;
            let confirmed = confirmed || confirm(&removal_prompt(&name))?;
            Command::RemovePatient { id, confirmed }
        }
        Command::ResetDemo { confirmed: false } => Command::ResetDemo {
            confirmed: confirm(RESET_PROMPT)?,
        },
        other => other,
    })
}

fn is_submission(command: &Command) -> bool {
    matches!(
        command,
        Command::AddPatient(_) | Command::AddTransplant(_) | Command::AddFollowup(_)
    )
}

fn write_export(file: &ExportFile, out: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    let path = out.join(&file.filename);
    std::fs::write(&path, &file.content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Renders an export, writes it under `out` and only then records it in the audit trail.
fn export(
    session: &mut RegistrySession,
    format: ExportFormat,
    out: &Path,
    now: DateTime<Utc>,
    renderer: &mut TextRenderer,
) -> anyhow::Result<PathBuf> {
    let outcome = session.dispatch(Command::Export(format), now)?;
    let file = outcome.export.context("export produced no file")?;
    let path = write_export(&file, out)?;
    session.handle(Command::ExportSaved(format), now, renderer)?;
    Ok(path)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("tcth=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'tcth --help' for commands");
        return Ok(());
    };

    let cfg = Arc::new(config_from_env()?);
    tracing::debug!("using data directory {}", cfg.data_dir().display());

    let now = Utc::now();
    let storage = Box::new(FileStorage::new(cfg.data_dir()));
    let mut session = RegistrySession::open(cfg, storage, now);
    if !session.is_durable() {
        eprintln!("Armazenamento local indisponível; os dados valem apenas para esta sessão.");
    }

    if let Commands::Export { format, out } = &command {
        let mut renderer = TextRenderer::new(Section::Quiet);
        let path = export(&mut session, (*format).into(), out, now, &mut renderer)?;
        println!("{}", path.display());
        return Ok(());
    }

    let (planned, section) = plan(command)?;
    let mut renderer = TextRenderer::new(section);

    let Some(cmd) = planned else {
        renderer.render(&session.view(now));
        println!("{}", renderer.output());
        return Ok(());
    };

    let cmd = confirmed(&session, cmd)?;
    let submission = is_submission(&cmd);
    let outcome = session.handle(cmd, now, &mut renderer)?;

    if let Some(details) = &outcome.details {
        for (label, value) in details {
            println!("{label:<22} {value}");
        }
    }
    let output = renderer.output();
    if !output.is_empty() {
        println!("{output}");
    }
    if submission && !outcome.changed {
        anyhow::bail!("submission rejected");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_session(dir: &TempDir, now: DateTime<Utc>) -> RegistrySession {
        let cfg = Arc::new(RegistryConfig::with_defaults(dir.path().join("data")).unwrap());
        let storage = Box::new(FileStorage::new(cfg.data_dir()));
        RegistrySession::open(cfg, storage, now)
    }

    #[test]
    fn failed_export_write_is_not_audited() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let now = Utc::now();
        let mut session = open_session(&dir, now);
        let audits = session.registry().audit_trail.len();
        let mut renderer = TextRenderer::new(Section::Quiet);

        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let result = export(
            &mut session,
            ExportFormat::Csv,
            &blocker.join("out"),
            now,
            &mut renderer,
        );
        assert!(result.is_err());
        assert_eq!(session.registry().audit_trail.len(), audits);
        assert_eq!(open_session(&dir, now).registry().audit_trail.len(), audits);

        let path = export(
            &mut session,
            ExportFormat::Csv,
            &dir.path().join("exports"),
            now,
            &mut renderer,
        )
        .unwrap();
        assert!(path.exists());
        let reopened = open_session(&dir, now);
        assert_eq!(reopened.registry().audit_trail.len(), audits + 1);
        assert_eq!(
            reopened.registry().audit_trail.last().unwrap().description,
            "Exportação CSV realizada."
        );
    }

    #[test]
    fn removing_unknown_patient_fails_with_or_without_yes() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let session = open_session(&dir, Utc::now());

        let err = confirmed(
            &session,
            Command::RemovePatient {
                id: "P-404".into(),
                confirmed: true,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("patient not found: P-404"));

        let cmd = confirmed(
            &session,
            Command::RemovePatient {
                id: "TCTH-201".into(),
                confirmed: true,
            },
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::RemovePatient {
                id: "TCTH-201".into(),
                confirmed: true
            }
        );
    }

    #[test]
    fn list_filters_accept_sentinels_and_reject_unknown_values() {
        let filter = parse_filter("ana".into(), "todos", "Follow-up").unwrap();
        assert_eq!(filter.risk, Choice::All);
        assert_eq!(filter.status, Choice::Only(PatientStatus::FollowUp));
        assert!(parse_filter(String::new(), "crítico", "todos").is_err());
    }

    #[test]
    fn theme_values_fall_back_to_light() {
        let (cmd, section) = plan(Commands::Theme {
            value: Some("sepia".into()),
        })
        .unwrap();
        assert_eq!(cmd, Some(Command::SetTheme(Theme::Light)));
        assert_eq!(section, Section::Theme);

        let (cmd, _) = plan(Commands::Theme {
            value: Some("toggle".into()),
        })
        .unwrap();
        assert_eq!(cmd, Some(Command::ToggleTheme));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
