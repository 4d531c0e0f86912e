pub mod backend;
pub mod cancel;
pub mod channel;
pub mod search;
pub mod status;
pub mod storage;
pub mod wire;

pub use backend::{AuthBackend, BookingBackend, MessageBackend};
pub use cancel::CancelHandle;
pub use channel::{MemoryChannel, RealtimeChannel, Room, Subscription};
pub use storage::SessionStorage;

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
pub const NETWORK_FAILURE: &str = "Network error. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input rejected locally, before any network call.
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    /// Non-2xx response. `message` is the backend's own text when it sent one.
    #[error("Request failed ({status}): {}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Request { status: u16, message: Option<String> },
    #[error("Network error: {0}")]
    Network(String),
    /// Payload did not match the expected shape.
    #[error("Malformed payload: {0}")]
    Schema(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn schema(what: &str, field: &str) -> Self {
        ClientError::Schema(format!("{}: missing or invalid `{}`", what, field))
    }

    /// Text for the transient notification shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(msg) | ClientError::Auth(msg) => msg.clone(),
            ClientError::Request { message: Some(msg), .. } if !msg.trim().is_empty() => msg.clone(),
            ClientError::Network(_) => NETWORK_FAILURE.to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
