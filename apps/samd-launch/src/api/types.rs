//! # API Response Types
//!
//! JSON structures returned by the HTTP API. Request bodies are raw CSV
//! surveys and need no type of their own.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use samd_launch_core::{
    Decision, MalformedOutputWarning, SamdError, ScoredRow, StageLevels, ValidationError,
};
use serde::{Deserialize, Serialize};

use crate::pipeline::{BatchReport, CompletedAssessment, RecordFailure};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
    pub model: String,
}

// =============================================================================
// SCORE RESPONSE
// =============================================================================

/// The validated survey with both derived scores.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResponse {
    pub count: usize,
    pub records: Vec<ScoredRow>,
}

// =============================================================================
// ASSESS RESPONSE
// =============================================================================

/// One completed assessment as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentJson {
    pub index: usize,
    pub country: String,
    pub risk_score: i32,
    pub readiness_score: i64,
    pub risk_summary: String,
    pub opportunity_summary: String,
    pub readiness_summary: String,
    pub final_decision: String,
    /// Token read from the first line of `final_decision`, if readable.
    pub decision: Option<Decision>,
    pub warning: Option<MalformedOutputWarning>,
    pub levels: StageLevels,
}

impl From<&CompletedAssessment> for AssessmentJson {
    fn from(done: &CompletedAssessment) -> Self {
        let state = &done.state;
        let text = |s: Option<&str>| s.unwrap_or_default().to_string();
        Self {
            index: done.index,
            country: state.country().to_string(),
            risk_score: state.record().risk_score(),
            readiness_score: state.record().readiness_score(),
            risk_summary: text(state.risk_summary()),
            opportunity_summary: text(state.opportunity_summary()),
            readiness_summary: text(state.readiness_summary()),
            final_decision: text(state.final_decision()),
            decision: done.decision.decision(),
            warning: done.decision.warning().cloned(),
            levels: done.levels.clone(),
        }
    }
}

/// Results of `POST /assess`. `results` and `failures` are in input order.
#[derive(Debug, Clone, Serialize)]
pub struct AssessResponse {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub results: Vec<AssessmentJson>,
    pub failures: Vec<RecordFailure>,
}

impl From<&BatchReport> for AssessResponse {
    fn from(report: &BatchReport) -> Self {
        Self {
            total: report.total(),
            completed: report.completed_count(),
            failed: report.failed_count(),
            results: report.completed().map(AssessmentJson::from).collect(),
            failures: report.failures().cloned().collect(),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_columns: Vec<String>,
}

/// An error response: status plus JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl From<SamdError> for ApiError {
    fn from(e: SamdError) -> Self {
        let (status, missing_columns) = match &e {
            SamdError::Validation(v) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                v.missing_columns().to_vec(),
            ),
            SamdError::IoError(_) | SamdError::SerializationError(_) => {
                (StatusCode::BAD_REQUEST, Vec::new())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, Vec::new()),
        };
        Self {
            status,
            body: ErrorResponse {
                error: e.to_string(),
                missing_columns,
            },
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::from(SamdError::Validation(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
