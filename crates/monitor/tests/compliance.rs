//! Missed-dose detection through the monitor, by direct call and by ticker.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use common::{medication, profile, quiet_config, settle, time, Fakes, Harness};
use vitalwatch_core::emergency::LogKind;
use vitalwatch_core::error::CoreError;
use vitalwatch_core::medication::{MedicationType, NewMedication};
use vitalwatch_core::notification::NotificationCategory;
use vitalwatch_monitor::{MonitorConfig, MonitorError};

#[tokio::test(start_paused = true)]
async fn overdue_dose_alerts_once() {
    let h = Harness::start(
        quiet_config(),
        vec![medication("m1", "Lisinopril", "08:00", false)],
    );
    let handle = h.handle();

    assert_eq!(handle.evaluate_compliance(time("09:00")).await.unwrap(), 1);

    let patient = handle.patient().await.unwrap();
    assert!(patient.medications[0].reminder_sent);
    assert_eq!(patient.logs.count_of(LogKind::MedicationAlert), 1);
    let entry = &patient.logs.entries()[0];
    assert!(!entry.resolved);
    assert_eq!(
        entry.notes,
        "Alert: Medication Missed (Lisinopril). Notification sent to Dr. Michael Chen."
    );

    settle().await;
    let notices = handle.notifications().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Medication Reminder");
    assert_eq!(notices[0].category, NotificationCategory::Messaging);
    let sent = h.fakes.relay.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("missed their dose of *Lisinopril* at 08:00"));
    assert_eq!(
        h.fakes.speech.spoken(),
        vec![
            "Reminder: You missed your Lisinopril. A notification has been sent to your caregiver."
                .to_string()
        ]
    );

    // Ten minutes later nothing new happens.
    assert_eq!(handle.evaluate_compliance(time("09:10")).await.unwrap(), 0);
    settle().await;
    let patient = handle.patient().await.unwrap();
    assert_eq!(patient.logs.count_of(LogKind::MedicationAlert), 1);
    assert_eq!(h.fakes.relay.sent().len(), 1);

    h.session.end().await;
}

#[tokio::test(start_paused = true)]
async fn taken_and_future_doses_are_ignored() {
    let h = Harness::start(
        quiet_config(),
        vec![
            medication("m1", "Lisinopril", "08:00", true),
            medication("m2", "Aspirin", "21:00", false),
        ],
    );
    let handle = h.handle();

    assert_eq!(handle.evaluate_compliance(time("12:00")).await.unwrap(), 0);
    assert!(handle.patient().await.unwrap().logs.is_empty());

    h.session.end().await;
}

#[tokio::test(start_paused = true)]
async fn each_overdue_dose_is_handled_independently() {
    let h = Harness::start(
        quiet_config(),
        vec![
            medication("m1", "Lisinopril", "08:00", false),
            medication("m2", "Metformin", "12:00", false),
            medication("m3", "Aspirin", "21:00", false),
        ],
    );
    let handle = h.handle();

    assert_eq!(handle.evaluate_compliance(time("12:30")).await.unwrap(), 2);
    settle().await;

    let patient = handle.patient().await.unwrap();
    assert_eq!(patient.logs.count_of(LogKind::MedicationAlert), 2);
    assert!(!patient.medications[2].reminder_sent);
    assert_eq!(h.fakes.relay.sent().len(), 2);
    assert_eq!(handle.notifications().await.len(), 2);

    h.session.end().await;
}

#[tokio::test(start_paused = true)]
async fn malformed_schedule_is_skipped() {
    let h = Harness::start(
        quiet_config(),
        vec![
            medication("bad", "Mystery", "25:99", false),
            medication("m1", "Lisinopril", "08:00", false),
        ],
    );
    let handle = h.handle();

    assert_eq!(handle.evaluate_compliance(time("09:00")).await.unwrap(), 1);
    let patient = handle.patient().await.unwrap();
    assert!(!patient.medications[0].reminder_sent);
    assert!(patient.medications[1].reminder_sent);

    h.session.end().await;
}

#[tokio::test(start_paused = true)]
async fn missing_contact_falls_back_to_caregiver() {
    let mut lonely = profile();
    lonely.contacts.clear();
    let h = Harness::start_with(
        quiet_config(),
        lonely,
        vec![medication("m1", "Lisinopril", "08:00", false)],
        Fakes::new(true),
    );
    let handle = h.handle();

    handle.evaluate_compliance(time("08:00")).await.unwrap();
    let patient = handle.patient().await.unwrap();
    assert!(patient.logs.entries()[0].notes.ends_with("Notification sent to caregiver."));

    h.session.end().await;
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn compliance_ticker_reads_the_clock_each_tick() {
    let config = MonitorConfig {
        compliance_interval: Duration::from_secs(10),
        ..quiet_config()
    };
    let h = Harness::start(config, vec![medication("m1", "Lisinopril", "08:00", false)]);
    let handle = h.handle();
    h.fakes.clock.set("07:59");

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert!(handle.patient().await.unwrap().logs.is_empty());

    h.fakes.clock.set("09:00");
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(
        handle.patient().await.unwrap().logs.count_of(LogKind::MedicationAlert),
        1
    );

    h.fakes.clock.set("09:10");
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(
        handle.patient().await.unwrap().logs.count_of(LogKind::MedicationAlert),
        1
    );

    h.session.end().await;
}

// ---------------------------------------------------------------------------
// Medication management
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn toggle_taken_flips_and_rejects_unknown_ids() {
    let h = Harness::start(
        quiet_config(),
        vec![medication("m1", "Lisinopril", "08:00", false)],
    );
    let handle = h.handle();

    assert!(handle.toggle_medication_taken("m1").await.unwrap());
    assert_eq!(handle.evaluate_compliance(time("09:00")).await.unwrap(), 0);
    assert!(!handle.toggle_medication_taken("m1").await.unwrap());

    assert_matches!(
        handle.toggle_medication_taken("nope").await,
        Err(MonitorError::Core(CoreError::NotFound { entity: "medication", .. }))
    );

    h.session.end().await;
}

#[tokio::test(start_paused = true)]
async fn added_medication_is_validated_and_scheduled() {
    let h = Harness::start(quiet_config(), Vec::new());
    let handle = h.handle();

    assert_matches!(
        handle
            .add_medication(NewMedication {
                name: "Warfarin".into(),
                dosage: "5mg".into(),
                scheduled_time: "24:00".into(),
                kind: MedicationType::Pill,
            })
            .await,
        Err(MonitorError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        handle
            .add_medication(NewMedication {
                name: "  ".into(),
                dosage: "5mg".into(),
                scheduled_time: "18:00".into(),
                kind: MedicationType::Pill,
            })
            .await,
        Err(MonitorError::Core(CoreError::Validation(_)))
    );

    let med = handle
        .add_medication(NewMedication {
            name: "Warfarin".into(),
            dosage: "5mg".into(),
            scheduled_time: "18:00".into(),
            kind: MedicationType::Liquid,
        })
        .await
        .unwrap();
    assert!(!med.taken && !med.reminder_sent);

    assert_eq!(handle.evaluate_compliance(time("18:00")).await.unwrap(), 1);
    let adherence = handle.adherence().await.unwrap();
    assert_eq!((adherence.taken, adherence.total), (0, 1));

    h.session.end().await;
}

#[tokio::test(start_paused = true)]
async fn daily_reset_rearms_reminders() {
    let h = Harness::start(
        quiet_config(),
        vec![
            medication("m1", "Lisinopril", "08:00", true),
            medication("m2", "Metformin", "08:30", false),
        ],
    );
    let handle = h.handle();

    assert_eq!(handle.evaluate_compliance(time("09:00")).await.unwrap(), 1);
    handle.reset_daily_schedule().await.unwrap();

    let patient = handle.patient().await.unwrap();
    assert!(patient.medications.iter().all(|m| !m.taken && !m.reminder_sent));
    assert_eq!(handle.evaluate_compliance(time("09:00")).await.unwrap(), 2);

    h.session.end().await;
}
