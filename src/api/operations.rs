use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tracing::info;

use super::validation::{require_text, validate_id};
use super::{
    ApiError, ApiResponse, AppState, CreateOperationRequest, LastOperationResponse,
    OperationIdResponse, SendNotesRequest, SendNotesResponse, UserIdRequest, UserIdResponse,
};
use crate::models::event::{Event, NewEvent};
use crate::models::operation::{NewOperation, Operation};

fn db_error(e: anyhow::Error) -> ApiError {
    ApiError::DatabaseError(e.to_string())
}

/// POST /api/userId
pub async fn get_user_id(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserIdRequest>,
) -> Result<Json<ApiResponse<UserIdResponse>>, ApiError> {
    let email = require_text("userEmail", &payload.user_email)?;

    let user = state
        .store()
        .get_user_by_email(email)
        .await
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("User", email))?;

    Ok(Json(ApiResponse::success(UserIdResponse { user_id: user.id })))
}

/// POST /api/createOperation
pub async fn create_operation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOperationRequest>,
) -> Result<Json<ApiResponse<OperationIdResponse>>, ApiError> {
    let room_id = validate_id("room", payload.room_id)?;
    let user_id = validate_id("user", payload.user_id)?;
    let new = NewOperation {
        room_id,
        user_id,
        patient_first_name: require_text("patientFirstName", &payload.patient_first_name)?.to_string(),
        patient_last_name: require_text("patientLastName", &payload.patient_last_name)?.to_string(),
        patient_id: require_text("patientId", &payload.patient_id)?.to_string(),
        operation_type: require_text("operationType", &payload.operation_type)?.to_string(),
    };

    let store = state.store();
    if store.get_room(room_id).await.map_err(db_error)?.is_none() {
        return Err(ApiError::not_found("Operating room", room_id));
    }
    if store.get_user(user_id).await.map_err(db_error)?.is_none() {
        return Err(ApiError::not_found("User", user_id));
    }

    let operation_id = store.create_operation(new).await.map_err(db_error)?;
    info!(operation_id, room_id, user_id, "Operation created");

    Ok(Json(ApiResponse::success(OperationIdResponse { operation_id })))
}

/// GET /api/operations/{id}
pub async fn get_operation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Operation>>, ApiError> {
    let id = validate_id("operation", id)?;
    let operation = state
        .store()
        .get_operation(id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("Operation", id))?;

    Ok(Json(ApiResponse::success(operation)))
}

/// POST /api/sendNotes
pub async fn send_notes(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendNotesRequest>,
) -> Result<Json<ApiResponse<SendNotesResponse>>, ApiError> {
    let operation_id = validate_id("operation", payload.operation_id)?;
    let event_type = require_text("eventType", &payload.event_type)?.to_string();
    // Stored as sent; report lookups match the transcript text exactly.
    require_text("eventValue", &payload.event_value)?;
    let event_value = payload.event_value;

    let store = state.store();
    if store.get_operation(operation_id).await.map_err(db_error)?.is_none() {
        return Err(ApiError::not_found("Operation", operation_id));
    }

    let event = store
        .append_event(NewEvent {
            operation_id,
            event_type,
            event_value,
        })
        .await
        .map_err(db_error)?;
    info!(operation_id, event_id = event.id, event_type = %event.event_type, "Event logged");

    Ok(Json(ApiResponse::success(SendNotesResponse {
        event_id: event.id,
        timestamp: event.timestamp,
    })))
}

/// GET /api/operations/{id}/events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<Event>>>, ApiError> {
    let id = validate_id("operation", id)?;
    let store = state.store();
    if store.get_operation(id).await.map_err(db_error)?.is_none() {
        return Err(ApiError::not_found("Operation", id));
    }

    let events = store.list_events(id).await.map_err(db_error)?;
    Ok(Json(ApiResponse::success(events)))
}

/// GET /api/lastOperationId
pub async fn last_operation_id(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<LastOperationResponse>>, ApiError> {
    let operation_id = state.store().last_operation_id().await.map_err(db_error)?;
    Ok(Json(ApiResponse::success(LastOperationResponse { operation_id })))
}
