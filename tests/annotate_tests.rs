// Behavior tests for the rule-based annotation services.

use std::sync::Arc;

use call_triage::annotate::{
    CannedTranscriber, Classifier, Explainer, KeywordClassifier, KeywordExplainer,
    KeywordSeverityRater, Locator, SeverityRater, TokenScanLocator, Transcriber,
};
use call_triage::audio::AudioSnapshot;
use call_triage::session::{CallSettings, EmergencyKind, SeverityLevel, NO_LOCATION};

#[tokio::test]
async fn test_classifier_detects_medical_emergency() {
    let classifier = KeywordClassifier::new();
    let result = classifier
        .classify("Help! My wife is unconscious and not breathing")
        .await
        .unwrap();

    assert_eq!(result.kind, EmergencyKind::Medical);
    assert!((result.confidence - 0.9).abs() < 1e-6);
}

#[tokio::test]
async fn test_classifier_detects_fire() {
    let classifier = KeywordClassifier::new();
    let result = classifier
        .classify("There's a fire! Smoke everywhere and flames in the kitchen")
        .await
        .unwrap();

    assert_eq!(result.kind, EmergencyKind::Fire);
    assert!(result.confidence > 0.5);
}

#[tokio::test]
async fn test_classifier_returns_unknown_without_keywords() {
    let classifier = KeywordClassifier::new();
    let result = classifier.classify("good afternoon").await.unwrap();

    assert_eq!(result.kind, EmergencyKind::Unknown);
    assert_eq!(result.confidence, 0.0);
}

#[tokio::test]
async fn test_severity_critical_for_unconscious_patient() {
    let rater = KeywordSeverityRater::new();
    let result = rater
        .rate(
            "Help! My wife is unconscious and not breathing",
            EmergencyKind::Medical,
        )
        .await
        .unwrap();

    assert_eq!(result.level, SeverityLevel::Critical);
    assert!(result.confidence > 0.5);
}

#[tokio::test]
async fn test_severity_defaults_depend_on_category() {
    let rater = KeywordSeverityRater::new();

    // Nothing matched and no category: the call stays LOW.
    let unknown = rater.rate("hello there", EmergencyKind::Unknown).await.unwrap();
    assert_eq!(unknown.level, SeverityLevel::Low);
    assert_eq!(unknown.confidence, 0.0);

    // Nothing matched but a classified call defaults to MEDIUM.
    let classified = rater.rate("hello there", EmergencyKind::Medical).await.unwrap();
    assert_eq!(classified.level, SeverityLevel::Medium);
}

#[tokio::test]
async fn test_severity_high_for_injury_keywords() {
    let rater = KeywordSeverityRater::new();
    let result = rater
        .rate(
            "Someone got injured in a crash, it looks serious",
            EmergencyKind::Accident,
        )
        .await
        .unwrap();

    assert!(matches!(
        result.level,
        SeverityLevel::High | SeverityLevel::Critical
    ));
}

#[tokio::test]
async fn test_locator_finds_street_address_and_area() {
    let locator = TokenScanLocator::new();
    let result = locator
        .locate("Help needed. Address is 123 Main St, Downtown.")
        .await
        .unwrap();

    assert!(result.place.contains("123 Main St"), "got: {}", result.place);
    assert!(result.place.contains("Downtown"), "got: {}", result.place);
    assert!(result.confidence >= 0.3);
}

#[tokio::test]
async fn test_locator_finds_highway() {
    let locator = TokenScanLocator::new();
    let result = locator
        .locate("Car accident on Highway 101 near Exit 15.")
        .await
        .unwrap();

    assert!(result.place.contains("Highway 101"), "got: {}", result.place);
}

#[tokio::test]
async fn test_locator_reports_nothing_found() {
    let locator = TokenScanLocator::new();
    let result = locator.locate("please hurry").await.unwrap();

    assert_eq!(result.place, NO_LOCATION);
    assert_eq!(result.confidence, 0.0);
}

#[tokio::test]
async fn test_explainer_cites_matched_keywords() {
    let explainer = KeywordExplainer::new();
    let result = explainer
        .explain(
            "my wife is unconscious and not breathing",
            EmergencyKind::Medical,
            SeverityLevel::Critical,
        )
        .await
        .unwrap();

    assert!(result.text.contains("not responsive"), "got: {}", result.text);
    assert!(result.confidence > 0.5);
}

#[tokio::test]
async fn test_explainer_falls_back_to_generic_rationale() {
    let explainer = KeywordExplainer::new();
    let result = explainer
        .explain("something happened", EmergencyKind::Unknown, SeverityLevel::Low)
        .await
        .unwrap();

    assert!(result.text.contains("UNKNOWN"));
    assert!(result.text.contains("LOW"));
}

#[tokio::test]
async fn test_canned_transcriber_requires_audio() {
    let transcriber = CannedTranscriber::new();
    let settings = CallSettings::default();

    let err = transcriber
        .transcribe(&AudioSnapshot::empty(), &settings)
        .await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_canned_transcriber_rotates_lines() {
    let transcriber = CannedTranscriber::new();
    let settings = CallSettings::default();
    let snapshot = AudioSnapshot {
        version: 1,
        pcm: Arc::new(vec![0u8; 320]),
        duration_ms: 250,
    };

    let first = transcriber.transcribe(&snapshot, &settings).await.unwrap();
    let second = transcriber.transcribe(&snapshot, &settings).await.unwrap();

    assert!(!first.text.is_empty());
    assert_ne!(first.text, second.text);
    assert!((first.confidence - 0.9).abs() < 1e-6);
}
