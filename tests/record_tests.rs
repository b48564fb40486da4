// Unit tests for the call record: version-ordered merge, finalization
// defaults, and the flat wire projection.

mod common;

use call_triage::session::{
    CallRecord, CallSettings, CallStatus, EmergencyKind, SeverityLevel, Staged, StageResult,
    NO_LOCATION, UNKNOWN_TRANSCRIPT,
};

fn transcript(text: &str, confidence: f32, version: u64) -> StageResult {
    StageResult::Transcript(Staged::new(text.to_string(), confidence, version))
}

#[test]
fn test_first_result_is_accepted() {
    let mut record = CallRecord::new("call-1", CallSettings::default());
    assert_eq!(record.aggregate_version(), 0);

    assert!(record.merge(transcript("help", 0.8, 1)));
    assert_eq!(record.aggregate_version(), 1);
    assert_eq!(record.flat().transcript, "help");
}

#[test]
fn test_older_snapshot_never_overwrites_newer() {
    let mut record = CallRecord::new("call-1", CallSettings::default());
    assert!(record.merge(transcript("newer text", 0.5, 3)));

    // A result computed from an older snapshot loses even though it
    // arrives later and carries higher confidence.
    assert!(!record.merge(transcript("older text", 0.99, 2)));
    assert_eq!(record.flat().transcript, "newer text");
    assert_eq!(record.aggregate_version(), 1);
}

#[test]
fn test_equal_version_resolves_by_confidence() {
    let mut record = CallRecord::new("call-1", CallSettings::default());
    assert!(record.merge(transcript("confident", 0.8, 2)));

    // Lower confidence from the same snapshot is discarded.
    assert!(!record.merge(transcript("degraded", 0.0, 2)));
    assert_eq!(record.flat().transcript, "confident");

    // Equal-or-better confidence from the same snapshot is accepted.
    assert!(record.merge(transcript("better", 0.9, 2)));
    assert_eq!(record.flat().transcript, "better");
}

#[test]
fn test_aggregate_version_bumps_only_on_accept() {
    let mut record = CallRecord::new("call-1", CallSettings::default());
    assert!(record.merge(transcript("a", 0.5, 1)));
    assert!(!record.merge(transcript("b", 0.4, 1)));
    assert!(record.merge(transcript("c", 0.6, 2)));
    assert_eq!(record.aggregate_version(), 2);
}

#[test]
fn test_stages_merge_independently() {
    let mut record = CallRecord::new("call-1", CallSettings::default());
    assert!(record.merge(transcript("fire downtown", 0.9, 4)));
    assert!(record.merge(StageResult::Classification(Staged::new(
        EmergencyKind::Fire,
        0.7,
        4
    ))));

    // A stale classification does not touch the fresher transcript.
    assert!(!record.merge(StageResult::Classification(Staged::new(
        EmergencyKind::Crime,
        0.9,
        3
    ))));

    let flat = record.flat();
    assert_eq!(flat.transcript, "fire downtown");
    assert_eq!(flat.predicted_class, EmergencyKind::Fire);
}

#[test]
fn test_finalize_fills_empty_stages_with_sentinels() {
    let mut record = CallRecord::new("call-1", CallSettings::default());
    record.finalize();

    let flat = record.flat();
    assert_eq!(flat.status, CallStatus::Finalized);
    assert_eq!(flat.transcript, UNKNOWN_TRANSCRIPT);
    assert_eq!(flat.confidence, 0.0);
    assert_eq!(flat.predicted_class, EmergencyKind::Unknown);
    assert_eq!(flat.severity, SeverityLevel::Low);
    assert_eq!(flat.location, NO_LOCATION);
    assert!(!flat.explanation.is_empty());
    assert_eq!(flat.routing_decision.department, "General Emergency");
    assert!(flat.routing_decision.awaiting_confirmation);
    assert!(flat.finalized_at.is_some());
}

#[test]
fn test_finalize_is_one_way() {
    let mut record = CallRecord::new("call-1", CallSettings::default());
    record.merge(transcript("help", 0.8, 1));
    record.finalize();

    let before = record.flat();
    record.finalize();
    let after = record.flat();

    assert_eq!(before.aggregate_version, after.aggregate_version);
    assert_eq!(before.finalized_at, after.finalized_at);

    // No merges are accepted once finalized, regardless of version.
    assert!(!record.merge(transcript("late result", 0.99, 100)));
    assert_eq!(record.flat().transcript, "help");
}

#[test]
fn test_finalize_keeps_merged_values() {
    let mut record = CallRecord::new("call-1", CallSettings::default());
    record.merge(transcript("my house is on fire", 0.9, 2));
    record.merge(StageResult::Classification(Staged::new(
        EmergencyKind::Fire,
        0.8,
        2,
    )));
    record.merge(StageResult::Severity(Staged::new(
        SeverityLevel::High,
        0.6,
        2,
    )));
    record.finalize();

    let flat = record.flat();
    assert_eq!(flat.transcript, "my house is on fire");
    assert_eq!(flat.predicted_class, EmergencyKind::Fire);
    assert_eq!(flat.severity, SeverityLevel::High);
}

#[test]
fn test_flat_record_wire_shape() {
    let mut record = CallRecord::new("call-42", CallSettings::default());
    record.merge(transcript("she is unconscious", 0.9, 1));
    record.merge(StageResult::Classification(Staged::new(
        EmergencyKind::Medical,
        0.9,
        1,
    )));

    let value = serde_json::to_value(record.flat()).unwrap();
    assert_eq!(value["call_id"], "call-42");
    assert_eq!(value["predicted_class"], "MEDICAL");
    assert_eq!(value["status"], "OPEN");
    assert_eq!(value["transcript"], "she is unconscious");
    assert!(value["routing_decision"]["department"].is_string());
    assert!(value["routing_decision"]["awaiting_confirmation"].is_boolean());
    // Not yet finalized: no finalization timestamp on the wire.
    assert!(value.get("finalized_at").is_none());

    record.finalize();
    let value = serde_json::to_value(record.flat()).unwrap();
    assert_eq!(value["status"], "FINALIZED");
    assert!(value["finalized_at"].is_string());
}

#[test]
fn test_flat_round_trip() {
    let flat = common::flat_record("call-7", 3);
    let json = serde_json::to_string(&flat).unwrap();
    let parsed: call_triage::session::FlatCallRecord = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.call_id, "call-7");
    assert_eq!(parsed.aggregate_version, 3);
    assert_eq!(parsed.predicted_class, EmergencyKind::Medical);
    assert_eq!(parsed.routing_decision.department, "Ambulance Service");
}
