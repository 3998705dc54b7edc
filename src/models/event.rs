use serde::Serialize;

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub operation_id: i32,
    pub event_type: String,
    pub event_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i32,
    pub operation_id: i32,
    /// UTC, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    pub event_type: String,
    pub event_value: String,
}
