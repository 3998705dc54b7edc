pub mod event;
pub mod operation;
pub mod room;
pub mod user;
