pub mod models;
pub mod pii;

pub use models::booking::{Booking, BookingStatus};
pub use models::events::{InboundEvent, OutboundEvent};
pub use models::message::Message;
pub use models::session::{Role, Session};
pub use pii::Masked;
