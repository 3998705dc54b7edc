pub mod prelude;

pub mod events;
pub mod operating_rooms;
pub mod operations;
pub mod users;
