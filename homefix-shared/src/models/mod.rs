pub mod booking;
pub mod events;
pub mod message;
pub mod session;
