// Unit tests for the audio ingest buffer.
//
// Strict fragment ordering and the snapshot version counter are what the
// rest of the pipeline's freshness model is built on.

mod common;

use call_triage::audio::{AudioFragment, IngestBuffer};
use call_triage::error::TriageError;
use common::text_fragment;

#[test]
fn test_in_order_fragments_bump_version() {
    let mut buffer = IngestBuffer::new(100, 250);
    assert_eq!(buffer.version(), 0);

    assert_eq!(buffer.accept(text_fragment(0, "ab")).unwrap(), 1);
    assert_eq!(buffer.accept(text_fragment(1, "cd")).unwrap(), 2);
    assert_eq!(buffer.accept(text_fragment(2, "ef")).unwrap(), 3);

    let snapshot = buffer.snapshot();
    assert_eq!(snapshot.version, 3);
    assert_eq!(snapshot.pcm.as_slice(), b"abcdef");
    assert_eq!(snapshot.duration_ms, 750);
}

#[test]
fn test_gap_is_rejected_without_advancing() {
    let mut buffer = IngestBuffer::new(100, 250);
    buffer.accept(text_fragment(0, "ab")).unwrap();

    let err = buffer.accept(text_fragment(2, "ef")).unwrap_err();
    match err {
        TriageError::OutOfOrderFragment { expected, got } => {
            assert_eq!(expected, 1);
            assert_eq!(got, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The rejection does not advance the snapshot.
    assert_eq!(buffer.version(), 1);
    assert_eq!(buffer.snapshot().pcm.as_slice(), b"ab");

    // The expected fragment is still accepted afterwards.
    assert_eq!(buffer.accept(text_fragment(1, "cd")).unwrap(), 2);
}

#[test]
fn test_duplicate_sequence_is_rejected() {
    let mut buffer = IngestBuffer::new(100, 250);
    buffer.accept(text_fragment(0, "ab")).unwrap();
    buffer.accept(text_fragment(1, "cd")).unwrap();

    let err = buffer.accept(text_fragment(1, "cd")).unwrap_err();
    assert!(matches!(
        err,
        TriageError::OutOfOrderFragment {
            expected: 2,
            got: 1
        }
    ));
    assert_eq!(buffer.version(), 2);
}

#[test]
fn test_first_fragment_must_be_sequence_zero() {
    let mut buffer = IngestBuffer::new(100, 250);
    let err = buffer.accept(text_fragment(5, "ab")).unwrap_err();
    assert!(matches!(
        err,
        TriageError::OutOfOrderFragment {
            expected: 0,
            got: 5
        }
    ));
}

#[test]
fn test_fragment_budget_is_enforced() {
    let mut buffer = IngestBuffer::new(2, 250);
    buffer.accept(text_fragment(0, "ab")).unwrap();
    buffer.accept(text_fragment(1, "cd")).unwrap();

    let err = buffer.accept(text_fragment(2, "ef")).unwrap_err();
    assert!(matches!(
        err,
        TriageError::TooLargeAudio { fragments: 2 }
    ));

    // Audio accepted so far is still intact.
    assert_eq!(buffer.version(), 2);
    assert_eq!(buffer.snapshot().pcm.as_slice(), b"abcd");
}

#[test]
fn test_closed_buffer_rejects_fragments() {
    let mut buffer = IngestBuffer::new(100, 250);
    buffer.accept(text_fragment(0, "ab")).unwrap();
    buffer.close();

    let err = buffer.accept(text_fragment(1, "cd")).unwrap_err();
    assert!(matches!(err, TriageError::StreamClosed));
}

#[test]
fn test_snapshot_is_immutable_under_later_accepts() {
    let mut buffer = IngestBuffer::new(100, 250);
    buffer.accept(text_fragment(0, "ab")).unwrap();

    let early = buffer.snapshot();
    buffer.accept(text_fragment(1, "cd")).unwrap();
    let late = buffer.snapshot();

    // The earlier snapshot is unaffected by the newer audio.
    assert_eq!(early.version, 1);
    assert_eq!(early.pcm.as_slice(), b"ab");
    assert_eq!(late.version, 2);
    assert_eq!(late.pcm.as_slice(), b"abcd");
}

#[test]
fn test_input_level_is_clamped() {
    let fragment = AudioFragment::new(0, vec![0u8; 4], 1.5);
    assert_eq!(fragment.input_level, 1.0);

    let fragment = AudioFragment::new(0, vec![0u8; 4], -0.25);
    assert_eq!(fragment.input_level, 0.0);

    let mut buffer = IngestBuffer::new(100, 250);
    buffer.accept(AudioFragment::new(0, vec![0u8; 4], 0.75)).unwrap();
    assert_eq!(buffer.last_input_level(), 0.75);
}

#[test]
fn test_take_pcm_drains_buffer() {
    let mut buffer = IngestBuffer::new(100, 250);
    buffer.accept(text_fragment(0, "ab")).unwrap();
    buffer.accept(text_fragment(1, "cd")).unwrap();

    assert_eq!(buffer.take_pcm(), b"abcd");
    assert!(buffer.take_pcm().is_empty());
}
