//! # API Endpoint Handlers
//!
//! Every POST endpoint takes a survey as the raw request body: CSV by
//! default, or an Excel workbook when the `Content-Type` says so. The survey
//! is validated as a whole first; an invalid survey is rejected with 422
//! before any generation call is made.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use samd_launch_core::{MarketRecord, ScoredRow, read_batch, read_batch_xlsx};
use std::io::Cursor;

use super::{
    AppState,
    types::{ApiError, AssessResponse, HealthResponse, ScoreResponse},
};

/// Response header carrying the number of records missing from a report.
pub const FAILED_RECORDS_HEADER: &str = "x-samd-failed-records";

/// `Content-Type` of an Excel workbook upload.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Parse a request body as a workbook or CSV, by `Content-Type`.
fn parse_survey(headers: &HeaderMap, body: &[u8]) -> Result<Vec<MarketRecord>, ApiError> {
    let is_workbook = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(XLSX_CONTENT_TYPE));

    let records = if is_workbook {
        read_batch_xlsx(Cursor::new(body))?
    } else {
        read_batch(body)?
    };
    Ok(records)
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.runner.provider_name().to_string(),
        model: state.runner.model().to_string(),
    })
}

// =============================================================================
// SCORE HANDLER
// =============================================================================

/// Validate a survey and return it with both derived scores.
pub async fn score_handler(
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ScoreResponse>, ApiError> {
    let records = parse_survey(&headers, &body)?;
    tracing::info!(records = records.len(), "survey scored");
    Ok(Json(ScoreResponse {
        count: records.len(),
        records: records.iter().map(ScoredRow::from).collect(),
    }))
}

// =============================================================================
// ASSESS HANDLERS
// =============================================================================

/// Run the full assessment and return narratives, decisions and failures.
pub async fn assess_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AssessResponse>, ApiError> {
    let records = parse_survey(&headers, &body)?;
    let report = state.runner.run_batch(records, None).await;
    Ok(Json(AssessResponse::from(&report)))
}

/// Run the full assessment and return the launch report as CSV.
///
/// Failed records are left out of the report; their count is returned in
/// the `x-samd-failed-records` header.
pub async fn assess_report_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let records = parse_survey(&headers, &body)?;
    let report = state.runner.run_batch(records, None).await;
    let csv = report.report_csv()?;

    let failed = HeaderValue::from(report.failed_count());
    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (
                header::CONTENT_DISPOSITION,
                HeaderValue::from_static("attachment; filename=\"launch_report.csv\""),
            ),
            (HeaderName::from_static(FAILED_RECORDS_HEADER), failed),
        ],
        csv,
    ))
}
