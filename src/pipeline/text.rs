use anyhow::Result;
use serde::Serialize;

use crate::annotate::AnnotatorSet;
use crate::session::{EmergencyKind, RoutingDecision, SeverityLevel};

/// Annotation of a plain transcript, bypassing the audio pipeline.
///
/// Used by the text classification endpoint and the scenario simulator;
/// no session, no snapshot versions, no coalescing.
#[derive(Debug, Clone, Serialize)]
pub struct TextAnnotation {
    pub transcript: String,
    pub predicted_class: EmergencyKind,
    pub confidence: f32,
    pub severity: SeverityLevel,
    pub location: String,
    pub routing_decision: RoutingDecision,
    pub explanation: String,
}

/// Run the text-side annotation chain directly against a transcript.
pub async fn annotate_text(services: &AnnotatorSet, text: &str) -> Result<TextAnnotation> {
    let classification = services.classifier.classify(text).await?;
    let severity = services.severity.rate(text, classification.kind).await?;
    let located = services.locator.locate(text).await?;
    let explanation = services
        .explainer
        .explain(text, classification.kind, severity.level)
        .await?;
    let routing = RoutingDecision::derive(
        classification.kind,
        classification.confidence,
        severity.confidence,
    );

    Ok(TextAnnotation {
        transcript: text.to_string(),
        predicted_class: classification.kind,
        confidence: classification.confidence,
        severity: severity.level,
        location: located.place,
        routing_decision: routing,
        explanation: explanation.text,
    })
}
