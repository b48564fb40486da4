use super::state::AppState;
use crate::pipeline::annotate_text;
use crate::session::{CallStatus, FlatCallRecord};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListCallsParams {
    /// Maximum number of records to return (default: 50)
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListCallsResponse {
    pub calls: Vec<FlatCallRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    pub scenario: String,
    pub input_text: String,
    pub expected_class: String,
    pub record: FlatCallRecord,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub open_calls: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "call-triage".to_string(),
        open_calls: state.manager.open_count().await,
    })
}

/// GET /api/calls?limit=N
/// Finalized call records, most recent first
pub async fn list_calls(
    State(state): State<AppState>,
    Query(params): Query<ListCallsParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(50);

    match state.manager.store().list(limit).await {
        Ok(calls) => (StatusCode::OK, Json(ListCallsResponse { calls })).into_response(),
        Err(e) => {
            error!("Failed to list call records: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list call records: {}", e),
            )
        }
    }
}

/// POST /api/classify
/// Annotate raw text directly, bypassing the audio pipeline
pub async fn classify_text(
    State(state): State<AppState>,
    Json(req): Json<ClassifyRequest>,
) -> impl IntoResponse {
    if req.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Text is required");
    }

    match annotate_text(&state.services, &req.text).await {
        Ok(annotation) => (StatusCode::OK, Json(annotation)).into_response(),
        Err(e) => {
            error!("Text annotation failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Annotation failed: {}", e),
            )
        }
    }
}

/// Canned caller utterances for the scenario simulator.
fn scenario_text(scenario: &str) -> Option<(&'static str, &'static str)> {
    match scenario {
        "medical" => Some((
            "Help! My wife is unconscious and not breathing. She collapsed suddenly. \
             Address is 123 Main St, Downtown. Please send an ambulance immediately!",
            "MEDICAL",
        )),
        "fire" => Some((
            "There's a fire at my house! Smoke is everywhere, flames coming from the \
             kitchen. Address is 456 Oak Ave, Suburbia. Need firefighters now!",
            "FIRE",
        )),
        "crime" => Some((
            "Someone is breaking into my house! I hear glass breaking and footsteps. \
             Address is 789 Pine Rd, Residential Area. Gunshots fired. Police needed \
             immediately!",
            "CRIME",
        )),
        "accident" => Some((
            "Car accident on Highway 101 near Exit 15. Multiple cars involved, people \
             injured. Need ambulances and police.",
            "ACCIDENT",
        )),
        "disaster" => Some((
            "Tornado warning! Severe weather approaching downtown. Taking shelter in \
             basement. Large debris flying. Need emergency management.",
            "DISASTER",
        )),
        _ => None,
    }
}

/// GET /api/simulate/:scenario
/// Synthesize a finalized call record from a canned scenario without
/// going through the audio pipeline at all
pub async fn simulate_call(
    State(state): State<AppState>,
    Path(scenario): Path<String>,
) -> impl IntoResponse {
    let Some((text, expected)) = scenario_text(&scenario) else {
        return error_response(StatusCode::NOT_FOUND, "Scenario not found");
    };

    let annotation = match annotate_text(&state.services, text).await {
        Ok(a) => a,
        Err(e) => {
            error!("Scenario annotation failed: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Annotation failed: {}", e),
            );
        }
    };

    let now = Utc::now();
    let record = FlatCallRecord {
        call_id: format!("sim-{}", uuid::Uuid::new_v4()),
        timestamp: now,
        transcript: annotation.transcript,
        predicted_class: annotation.predicted_class,
        confidence: annotation.confidence,
        severity: annotation.severity,
        location: annotation.location,
        routing_decision: annotation.routing_decision,
        explanation: annotation.explanation,
        status: CallStatus::Finalized,
        aggregate_version: 1,
        finalized_at: Some(now),
    };

    info!(%scenario, call_id = %record.call_id, "Simulated call scenario");

    (
        StatusCode::OK,
        Json(SimulateResponse {
            scenario,
            input_text: text.to_string(),
            expected_class: expected.to_string(),
            record,
        }),
    )
        .into_response()
}
