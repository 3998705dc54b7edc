pub use super::events::Entity as Events;
pub use super::operating_rooms::Entity as OperatingRooms;
pub use super::operations::Entity as Operations;
pub use super::users::Entity as Users;
