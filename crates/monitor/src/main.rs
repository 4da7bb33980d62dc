//! `vitalwatch` -- run a monitoring session from the terminal.
//!
//! Starts a session for the stored profile (or a demo patient), logs every
//! in-app notification, and reads commands from stdin:
//!
//! ```text
//! sos cardiac|fall        trigger an SOS
//! test                    run the alarm system test
//! resolve                 cancel the open SOS
//! take <id|name>          toggle a dose's taken flag
//! add <name> <dosage> <HH:MM> [pill|liquid|injection]
//! reset                   day-boundary medication reset
//! locate <lat> <lng>      update the patient location
//! notify-test             send a relay test message
//! status                  print vitals, SOS state, and adherence
//! quit
//! ```
//!
//! See [`MonitorConfig::from_env`] for configuration. The demo profile also
//! reads `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitalwatch_core::emergency::EmergencyKind;
use vitalwatch_core::medication::{Medication, MedicationType, NewMedication};
use vitalwatch_core::patient::{EmergencyContact, PatientProfile, RelayCredentials};
use vitalwatch_monitor::{Collaborators, MonitorConfig, MonitorHandle, Session};

#[derive(Debug, Clone, PartialEq)]
enum CliCommand {
    Sos(EmergencyKind),
    Test,
    Resolve,
    Take(String),
    Add(NewMedication),
    Reset,
    Locate(f64, f64),
    NotifyTest,
    Status,
    Quit,
}

fn parse_command(line: &str) -> Result<CliCommand, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["sos", kind] => EmergencyKind::parse(kind)
            .map(CliCommand::Sos)
            .ok_or_else(|| format!("unknown emergency kind '{kind}', expected cardiac or fall")),
        ["test"] => Ok(CliCommand::Test),
        ["resolve"] => Ok(CliCommand::Resolve),
        ["take", target @ ..] if !target.is_empty() => Ok(CliCommand::Take(target.join(" "))),
        ["add", name, dosage, time, rest @ ..] if rest.len() <= 1 => {
            let kind = match rest.first() {
                Some(raw) => MedicationType::parse(raw).map_err(|e| e.to_string())?,
                None => MedicationType::default(),
            };
            Ok(CliCommand::Add(NewMedication {
                name: name.to_string(),
                dosage: dosage.to_string(),
                scheduled_time: time.to_string(),
                kind,
            }))
        }
        ["reset"] => Ok(CliCommand::Reset),
        ["locate", lat, lng] => {
            let lat = lat.parse().map_err(|_| format!("invalid latitude '{lat}'"))?;
            let lng = lng.parse().map_err(|_| format!("invalid longitude '{lng}'"))?;
            Ok(CliCommand::Locate(lat, lng))
        }
        ["notify-test"] => Ok(CliCommand::NotifyTest),
        ["status"] => Ok(CliCommand::Status),
        ["quit"] | ["exit"] => Ok(CliCommand::Quit),
        [] => Err("empty command".into()),
        _ => Err(format!("unrecognised command '{line}'")),
    }
}

// ---------------------------------------------------------------------------
// Demo data
// ---------------------------------------------------------------------------

fn demo_profile() -> PatientProfile {
    let relay = match (
        std::env::var("TELEGRAM_BOT_TOKEN"),
        std::env::var("TELEGRAM_CHAT_ID"),
    ) {
        (Ok(token), Ok(chat_id)) => Some(RelayCredentials::new(token, chat_id)),
        _ => None,
    };
    PatientProfile {
        id: "PT-8842".into(),
        name: "Margaret Thompson".into(),
        age: 72,
        phone_number: None,
        relay,
        contacts: vec![
            EmergencyContact {
                id: "c1".into(),
                name: "Dr. Michael Chen".into(),
                relation: "Cardiologist".into(),
                phone: "555-0123".into(),
                is_primary: true,
            },
            EmergencyContact {
                id: "c2".into(),
                name: "Sarah Thompson".into(),
                relation: "Daughter".into(),
                phone: "555-0199".into(),
                is_primary: false,
            },
        ],
    }
}

fn demo_medications() -> anyhow::Result<Vec<Medication>> {
    let schedule = [
        ("Lisinopril", "10mg", "08:00", true),
        ("Metformin", "500mg", "12:00", false),
        ("Aspirin", "81mg", "21:00", false),
    ];
    schedule
        .into_iter()
        .map(|(name, dosage, time, taken)| {
            let mut med = NewMedication {
                name: name.into(),
                dosage: dosage.into(),
                scheduled_time: time.into(),
                kind: MedicationType::Pill,
            }
            .into_medication()?;
            med.taken = taken;
            Ok(med)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Command execution
// ---------------------------------------------------------------------------

async fn execute(handle: &MonitorHandle, command: CliCommand) -> anyhow::Result<()> {
    match command {
        CliCommand::Sos(kind) => handle.trigger_sos(kind).await?,
        CliCommand::Test => handle.run_system_test().await?,
        CliCommand::Resolve => {
            if !handle.resolve().await? {
                println!("No SOS session is open.");
            }
        }
        CliCommand::Take(target) => {
            let patient = handle.patient().await?;
            let id = patient
                .medications
                .iter()
                .find(|m| m.id == target || m.name.eq_ignore_ascii_case(&target))
                .map(|m| m.id.clone())
                .unwrap_or(target);
            let taken = handle.toggle_medication_taken(&id).await?;
            println!("Marked {} as {}.", id, if taken { "taken" } else { "not taken" });
        }
        CliCommand::Add(new) => {
            let med = handle.add_medication(new).await?;
            println!("Added {} {} at {} (id {}).", med.name, med.dosage, med.scheduled_time, med.id);
        }
        CliCommand::Reset => handle.reset_daily_schedule().await?,
        CliCommand::Locate(lat, lng) => {
            let location = handle.update_location(lat, lng).await?;
            println!("Location: {}", location.address);
        }
        CliCommand::NotifyTest => {
            let delivered = handle.test_notification_channel().await?;
            println!("Relay test {}.", if delivered { "delivered" } else { "failed" });
        }
        CliCommand::Status => print_status(handle).await?,
        CliCommand::Quit => {}
    }
    Ok(())
}

async fn print_status(handle: &MonitorHandle) -> anyhow::Result<()> {
    let patient = handle.patient().await?;
    let sos = handle.sos_status().await?;
    let adherence = handle.adherence().await?;

    println!("{} ({}) status {}", patient.name, patient.age, patient.level());
    println!(
        "  HR {:.0} {}  BP {:.0}/{:.0}  SpO2 {:.0}%  Temp {:.1} {}",
        patient.heart_rate.value,
        patient.heart_rate.unit,
        patient.blood_pressure.systolic,
        patient.blood_pressure.diastolic,
        patient.oxygen_level.value,
        patient.temperature.value,
        patient.temperature.unit,
    );
    println!("  SOS {sos:?}");
    println!(
        "  Medications {}/{} taken, pending: {}",
        adherence.taken,
        adherence.total,
        adherence.pending.join(", ")
    );
    for med in &patient.medications {
        println!(
            "    [{}] {} {} at {}{}",
            if med.taken { "x" } else { " " },
            med.name,
            med.dosage,
            med.scheduled_time,
            if med.reminder_sent { " (reminded)" } else { "" },
        );
    }
    println!("  Log entries {} ({} open)", patient.logs.len(), patient.logs.unresolved_count());
    if let Some(insight) = handle.insight().await? {
        println!("  Insight: {}", insight.content);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitalwatch_monitor=info,vitalwatch_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MonitorConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(
        vitals_ms = config.vitals_interval.as_millis() as u64,
        compliance_secs = config.compliance_interval.as_secs(),
        insights_enabled = config.gemini_api_key.is_some(),
        "Configuration loaded"
    );

    let collaborators = Collaborators::from_config(&config);
    let session = Session::hydrate(config, demo_profile(), demo_medications()?, collaborators).await;
    let handle = session.handle().clone();

    let mut notices = handle.subscribe();
    let notice_logger = tokio::spawn(async move {
        loop {
            match notices.recv().await {
                Ok(notice) => tracing::info!(
                    category = ?notice.category,
                    title = %notice.title,
                    message = %notice.message,
                    "Notification"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(CliCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = execute(&handle, command).await {
                            println!("Error: {e}");
                        }
                    }
                    Err(message) => println!("{message}"),
                }
            }
        }
    }

    drop(handle);
    session.end().await;
    notice_logger.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
