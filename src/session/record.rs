use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::CallSettings;

/// Emergency category assigned by the classification stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmergencyKind {
    Fire,
    Medical,
    Crime,
    Accident,
    Disaster,
    Unknown,
}

impl EmergencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencyKind::Fire => "FIRE",
            EmergencyKind::Medical => "MEDICAL",
            EmergencyKind::Crime => "CRIME",
            EmergencyKind::Accident => "ACCIDENT",
            EmergencyKind::Disaster => "DISASTER",
            EmergencyKind::Unknown => "UNKNOWN",
        }
    }

    /// Dispatch department for this category.
    pub fn department(&self) -> &'static str {
        match self {
            EmergencyKind::Fire => "Fire Department",
            EmergencyKind::Medical => "Ambulance Service",
            EmergencyKind::Crime => "Police Department",
            EmergencyKind::Accident => "Emergency Services",
            EmergencyKind::Disaster => "Emergency Management",
            EmergencyKind::Unknown => "General Emergency",
        }
    }
}

/// Severity assigned by the severity stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl SeverityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Critical => "CRITICAL",
            SeverityLevel::High => "HIGH",
            SeverityLevel::Medium => "MEDIUM",
            SeverityLevel::Low => "LOW",
        }
    }
}

/// Routing recommendation derived from classification + severity.
///
/// Always awaiting confirmation; the pipeline never auto-commits a
/// routing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub department: String,
    pub confidence: f32,
    pub awaiting_confirmation: bool,
}

impl RoutingDecision {
    /// Derived from classification and severity with no service call;
    /// the recommendation is only as confident as its weakest input.
    pub fn derive(kind: EmergencyKind, kind_confidence: f32, severity_confidence: f32) -> Self {
        Self {
            department: kind.department().to_string(),
            confidence: kind_confidence.min(severity_confidence).clamp(0.0, 1.0),
            awaiting_confirmation: true,
        }
    }
}

/// A stage value together with the confidence and snapshot version it
/// was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Staged<T> {
    pub value: T,
    pub confidence: f32,
    pub version: u64,
}

impl<T> Staged<T> {
    pub fn new(value: T, confidence: f32, version: u64) -> Self {
        Self {
            value,
            confidence: confidence.clamp(0.0, 1.0),
            version,
        }
    }

    /// Last-writer-wins keyed by snapshot version, not arrival time: a
    /// strictly newer snapshot always supersedes; within the same
    /// snapshot, higher confidence wins and confidence 0 never evicts.
    fn supersedes(&self, prior: &Staged<T>) -> bool {
        self.version > prior.version
            || (self.version == prior.version && self.confidence >= prior.confidence)
    }
}

/// One completed stage output, tagged by kind.
#[derive(Debug, Clone)]
pub enum StageResult {
    Transcript(Staged<String>),
    Classification(Staged<EmergencyKind>),
    Severity(Staged<SeverityLevel>),
    Location(Staged<String>),
    Explanation(Staged<String>),
    Routing(Staged<RoutingDecision>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallStatus {
    Open,
    Finalized,
}

/// Sentinel transcript for a call whose transcription stage never
/// produced a usable result.
pub const UNKNOWN_TRANSCRIPT: &str = "unknown";

/// Sentinel location when extraction found nothing.
pub const NO_LOCATION: &str = "Location not specified";

/// The per-call aggregate: current best stage result per stage kind.
///
/// Mutated only by the pipeline for its own call. Stage values move
/// forward in snapshot-version order only; the aggregate version bumps
/// on every accepted merge and orders published snapshots.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub call_id: String,
    pub status: CallStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub settings: CallSettings,
    aggregate_version: u64,
    transcript: Option<Staged<String>>,
    classification: Option<Staged<EmergencyKind>>,
    severity: Option<Staged<SeverityLevel>>,
    location: Option<Staged<String>>,
    explanation: Option<Staged<String>>,
    routing: Option<Staged<RoutingDecision>>,
}

impl CallRecord {
    pub fn new(call_id: impl Into<String>, settings: CallSettings) -> Self {
        let now = Utc::now();
        Self {
            call_id: call_id.into(),
            status: CallStatus::Open,
            created_at: now,
            updated_at: now,
            finalized_at: None,
            settings,
            aggregate_version: 0,
            transcript: None,
            classification: None,
            severity: None,
            location: None,
            explanation: None,
            routing: None,
        }
    }

    pub fn aggregate_version(&self) -> u64 {
        self.aggregate_version
    }

    /// Merge one stage result. Superseded results are discarded, not
    /// errored; returns whether the result was accepted. No merges are
    /// accepted once the record is finalized.
    pub fn merge(&mut self, result: StageResult) -> bool {
        if self.status == CallStatus::Finalized {
            return false;
        }

        let accepted = match result {
            StageResult::Transcript(s) => Self::merge_slot(&mut self.transcript, s),
            StageResult::Classification(s) => Self::merge_slot(&mut self.classification, s),
            StageResult::Severity(s) => Self::merge_slot(&mut self.severity, s),
            StageResult::Location(s) => Self::merge_slot(&mut self.location, s),
            StageResult::Explanation(s) => Self::merge_slot(&mut self.explanation, s),
            StageResult::Routing(s) => Self::merge_slot(&mut self.routing, s),
        };

        if accepted {
            self.aggregate_version += 1;
            self.updated_at = Utc::now();
        }

        accepted
    }

    fn merge_slot<T>(slot: &mut Option<Staged<T>>, incoming: Staged<T>) -> bool {
        match slot {
            Some(prior) if !incoming.supersedes(prior) => false,
            _ => {
                *slot = Some(incoming);
                true
            }
        }
    }

    pub fn update_settings(&mut self, settings: CallSettings) {
        self.settings = settings;
        self.updated_at = Utc::now();
    }

    /// One-way transition to FINALIZED. Empty stages are filled with
    /// zero-confidence sentinels so a call with a fully unavailable
    /// annotation chain still produces a usable record.
    pub fn finalize(&mut self) {
        if self.status == CallStatus::Finalized {
            return;
        }

        if self.transcript.is_none() {
            self.transcript = Some(Staged::new(UNKNOWN_TRANSCRIPT.to_string(), 0.0, 0));
        }
        if self.classification.is_none() {
            self.classification = Some(Staged::new(EmergencyKind::Unknown, 0.0, 0));
        }
        if self.severity.is_none() {
            self.severity = Some(Staged::new(SeverityLevel::Low, 0.0, 0));
        }
        if self.location.is_none() {
            self.location = Some(Staged::new(NO_LOCATION.to_string(), 0.0, 0));
        }
        if self.explanation.is_none() {
            let kind = self.classification.as_ref().map(|s| s.value);
            self.explanation = Some(Staged::new(
                format!(
                    "No annotation results were available before the call ended; \
                     filed as {} pending manual review.",
                    kind.unwrap_or(EmergencyKind::Unknown).as_str()
                ),
                0.0,
                0,
            ));
        }
        if self.routing.is_none() {
            let kind = self
                .classification
                .as_ref()
                .map(|s| s.value)
                .unwrap_or(EmergencyKind::Unknown);
            self.routing = Some(Staged::new(RoutingDecision::derive(kind, 0.0, 0.0), 0.0, 0));
        }

        self.status = CallStatus::Finalized;
        self.finalized_at = Some(Utc::now());
        self.aggregate_version += 1;
        self.updated_at = Utc::now();
    }

    /// Project the aggregate into the flat wire/persisted shape. Stages
    /// with no result yet appear as their empty/unknown defaults.
    pub fn flat(&self) -> FlatCallRecord {
        let classification = self
            .classification
            .clone()
            .unwrap_or(Staged::new(EmergencyKind::Unknown, 0.0, 0));

        FlatCallRecord {
            call_id: self.call_id.clone(),
            timestamp: self.updated_at,
            transcript: self
                .transcript
                .as_ref()
                .map(|s| s.value.clone())
                .unwrap_or_default(),
            predicted_class: classification.value,
            confidence: classification.confidence,
            severity: self
                .severity
                .as_ref()
                .map(|s| s.value)
                .unwrap_or(SeverityLevel::Low),
            location: self
                .location
                .as_ref()
                .map(|s| s.value.clone())
                .unwrap_or_default(),
            routing_decision: self
                .routing
                .as_ref()
                .map(|s| s.value.clone())
                .unwrap_or_else(|| RoutingDecision::derive(classification.value, 0.0, 0.0)),
            explanation: self
                .explanation
                .as_ref()
                .map(|s| s.value.clone())
                .unwrap_or_default(),
            status: self.status,
            aggregate_version: self.aggregate_version,
            finalized_at: self.finalized_at,
        }
    }
}

/// Flat projection of a [`CallRecord`]: every push to an observer is a
/// complete snapshot in this shape, and the persisted format is the same
/// object plus `finalized_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatCallRecord {
    pub call_id: String,
    pub timestamp: DateTime<Utc>,
    pub transcript: String,
    pub predicted_class: EmergencyKind,
    pub confidence: f32,
    pub severity: SeverityLevel,
    pub location: String,
    pub routing_decision: RoutingDecision,
    pub explanation: String,
    pub status: CallStatus,
    pub aggregate_version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}
