use axum::{
    Json,
    extract::State,
    http::{HeaderName, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::validation::{require_text, validate_id};
use super::{ApiError, AppState, DownloadReportRequest};
use crate::report::PatientDetails;
use crate::services::ReportRequest;

pub const SKIPPED_EVENTS_HEADER: &str = "x-report-skipped-events";

/// POST /api/downloadReport
pub async fn download_report(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DownloadReportRequest>,
) -> Result<Response, ApiError> {
    let conversation_id = require_text("conversationId", &payload.conversation_id)?.to_string();
    let operation_id = validate_id("operation", payload.operation_id)?;
    let details = payload.surgery_details;

    let request = ReportRequest {
        conversation_id,
        operation_id,
        patient: PatientDetails {
            first_name: details.patient_first_name,
            last_name: details.patient_last_name,
            procedure: details.operation_type,
            patient_id: details.patient_id,
        },
    };

    let report = state.reports().generate(&request).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.document.filename),
            ),
            (
                HeaderName::from_static(SKIPPED_EVENTS_HEADER),
                report.skipped_events.to_string(),
            ),
        ],
        report.document.bytes,
    )
        .into_response())
}
