use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatingRoom {
    pub id: i32,
    pub name: String,
    pub is_available: bool,
}

impl OperatingRoom {
    #[must_use]
    pub const fn status(&self) -> &'static str {
        if self.is_available { "available" } else { "occupied" }
    }
}
