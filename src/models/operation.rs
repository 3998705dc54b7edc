use serde::Serialize;

#[derive(Debug, Clone)]
pub struct NewOperation {
    pub room_id: i32,
    pub user_id: i32,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_id: String,
    pub operation_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: i32,
    pub room_id: i32,
    pub user_id: i32,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_id: String,
    pub operation_type: String,
}
