use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::annotate::{
    AnnotatorSet, Classification, Explanation, LocatedPlace, SeverityRating, Transcription,
};
use crate::audio::{normalize_pcm, AudioSnapshot, IngestBuffer};
use crate::publish::ResultPublisher;
use crate::session::{
    CallRecord, CallSettings, EmergencyKind, RoutingDecision, SeverityLevel, Staged, StageResult,
    NO_LOCATION, UNKNOWN_TRANSCRIPT,
};

/// Coalescing-scheduler state for one call.
struct RunState {
    running: bool,
    dirty: bool,
    last_run_version: u64,
}

/// Drives the annotation chain for exactly one call.
///
/// `trigger` never queues more than one pending re-run: a trigger that
/// arrives mid-run only marks the state dirty, and the in-flight run
/// re-executes once against the latest snapshot when it finishes, and
/// only if that snapshot is newer than the one it just used. This keeps
/// the chain eventually consistent with the newest audio without
/// concurrent runs or unbounded backlog.
pub struct Orchestrator {
    call_id: String,
    buffer: Arc<Mutex<IngestBuffer>>,
    record: Arc<Mutex<CallRecord>>,
    settings: Arc<RwLock<CallSettings>>,
    publisher: Arc<ResultPublisher>,
    services: AnnotatorSet,
    state: Mutex<RunState>,
    closed: Arc<AtomicBool>,
    stage_timeout: Duration,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        call_id: String,
        buffer: Arc<Mutex<IngestBuffer>>,
        record: Arc<Mutex<CallRecord>>,
        settings: Arc<RwLock<CallSettings>>,
        publisher: Arc<ResultPublisher>,
        services: AnnotatorSet,
        closed: Arc<AtomicBool>,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            call_id,
            buffer,
            record,
            settings,
            publisher,
            services,
            state: Mutex::new(RunState {
                running: false,
                dirty: false,
                last_run_version: 0,
            }),
            closed,
            stage_timeout,
        }
    }

    /// Signal that a new snapshot is available.
    ///
    /// If a run is in flight this only marks the state dirty; otherwise
    /// it spawns the run task for this call.
    pub async fn trigger(self: &Arc<Self>) {
        {
            let mut state = self.state.lock().await;
            if state.running {
                state.dirty = true;
                return;
            }
            state.running = true;
        }

        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.run_until_clean().await;
        });
    }

    /// True while a chain run (or a pending re-run) is outstanding.
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    async fn run_until_clean(self: Arc<Self>) {
        loop {
            let snapshot = self.buffer.lock().await.snapshot();
            self.state.lock().await.last_run_version = snapshot.version;

            let results = self.run_chain(&snapshot).await;

            // A session closed mid-run discards the run's output: no
            // merge, no publish.
            if !self.closed.load(Ordering::SeqCst) {
                let flat = {
                    let mut record = self.record.lock().await;
                    let mut accepted = 0usize;
                    for result in results {
                        if record.merge(result) {
                            accepted += 1;
                        }
                    }
                    debug!(
                        call_id = %self.call_id,
                        version = snapshot.version,
                        accepted,
                        "Annotation chain merged"
                    );
                    record.flat()
                };
                self.publisher.publish(flat).await;
            }

            let mut state = self.state.lock().await;
            if state.dirty && !self.closed.load(Ordering::SeqCst) {
                state.dirty = false;
                // Triggers that raced with this run may all be covered by
                // the snapshot it already used; re-running the chain on
                // the same version would only produce duplicate results.
                // A trigger whose accept lands after this check finds
                // `running` false again and starts its own run.
                if self.buffer.lock().await.version() > state.last_run_version {
                    continue;
                }
            }
            state.running = false;
            state.dirty = false;
            return;
        }
    }

    /// Execute the annotation chain against one snapshot and return the
    /// stage results stamped with its version.
    ///
    /// Transcription runs first; classification feeds severity while
    /// location runs concurrently off the transcript; explanation runs
    /// last; routing is derived with no service call. A stage that fails
    /// or exceeds its budget degrades to a zero-confidence sentinel and
    /// the chain continues with whatever upstream values it has.
    async fn run_chain(&self, snapshot: &AudioSnapshot) -> Vec<StageResult> {
        let version = snapshot.version;
        let settings = self.settings.read().await.clone();

        let audio = if settings.noise_filtering && !snapshot.is_empty() {
            AudioSnapshot {
                version: snapshot.version,
                pcm: Arc::new(normalize_pcm(&snapshot.pcm)),
                duration_ms: snapshot.duration_ms,
            }
        } else {
            snapshot.clone()
        };

        let transcription = self
            .stage(
                "transcription",
                self.services.transcriber.transcribe(&audio, &settings),
                || Transcription {
                    text: UNKNOWN_TRANSCRIPT.to_string(),
                    confidence: 0.0,
                },
            )
            .await;

        let text = transcription.text.clone();

        let classify_then_rate = async {
            let classification = self
                .stage(
                    "classification",
                    self.services.classifier.classify(&text),
                    || Classification {
                        kind: EmergencyKind::Unknown,
                        confidence: 0.0,
                    },
                )
                .await;
            let severity = self
                .stage(
                    "severity",
                    self.services.severity.rate(&text, classification.kind),
                    || SeverityRating {
                        level: SeverityLevel::Low,
                        confidence: 0.0,
                    },
                )
                .await;
            (classification, severity)
        };
        let locate = self.stage("location", self.services.locator.locate(&text), || {
            LocatedPlace {
                place: NO_LOCATION.to_string(),
                confidence: 0.0,
            }
        });

        let ((classification, severity), located) = tokio::join!(classify_then_rate, locate);

        let explanation = self
            .stage(
                "explanation",
                self.services
                    .explainer
                    .explain(&text, classification.kind, severity.level),
                || Explanation {
                    text: format!(
                        "Classified as {} with {} severity.",
                        classification.kind.as_str(),
                        severity.level.as_str()
                    ),
                    confidence: 0.0,
                },
            )
            .await;

        let routing = RoutingDecision::derive(
            classification.kind,
            classification.confidence,
            severity.confidence,
        );
        let routing_confidence = routing.confidence;

        vec![
            StageResult::Transcript(Staged::new(
                transcription.text,
                transcription.confidence,
                version,
            )),
            StageResult::Classification(Staged::new(
                classification.kind,
                classification.confidence,
                version,
            )),
            StageResult::Severity(Staged::new(severity.level, severity.confidence, version)),
            StageResult::Location(Staged::new(located.place, located.confidence, version)),
            StageResult::Explanation(Staged::new(
                explanation.text,
                explanation.confidence,
                version,
            )),
            StageResult::Routing(Staged::new(routing, routing_confidence, version)),
        ]
    }

    /// Run one stage under the per-stage budget, degrading to `fallback`
    /// on error or timeout. Stage failures never abort the chain.
    async fn stage<T, F>(&self, name: &str, fut: F, fallback: impl FnOnce() -> T) -> T
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match timeout(self.stage_timeout, fut).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                warn!(call_id = %self.call_id, stage = name, error = %e, "Annotation stage failed");
                fallback()
            }
            Err(_) => {
                warn!(call_id = %self.call_id, stage = name, "Annotation stage timed out");
                fallback()
            }
        }
    }
}
