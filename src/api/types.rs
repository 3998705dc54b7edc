use serde::{Deserialize, Serialize};

use crate::models::room::OperatingRoom;
use crate::models::user::User;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// Absent fields deserialize as blank so they are reported as validation
// errors rather than JSON rejections.

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct RoomDto {
    pub id: i32,
    pub name: String,
    pub status: String,
}

impl From<OperatingRoom> for RoomDto {
    fn from(room: OperatingRoom) -> Self {
        Self {
            id: room.id,
            status: room.status().to_string(),
            name: room.name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserIdRequest {
    pub user_email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdResponse {
    pub user_id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOperationRequest {
    pub room_id: i32,
    pub user_id: i32,
    #[serde(default)]
    pub patient_first_name: String,
    #[serde(default)]
    pub patient_last_name: String,
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub operation_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationIdResponse {
    pub operation_id: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastOperationResponse {
    pub operation_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotesRequest {
    pub operation_id: i32,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub event_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotesResponse {
    pub event_id: i32,
    /// UTC, as stored
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadReportRequest {
    pub conversation_id: String,
    pub operation_id: i32,
    pub surgery_details: SurgeryDetails,
}

/// Patient fields exactly as the frontend sends them (snake case).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SurgeryDetails {
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_id: String,
    pub operation_type: String,
}
