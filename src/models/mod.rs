pub mod event;
pub mod operation;
pub mod room;
pub mod transcript;
pub mod user;
