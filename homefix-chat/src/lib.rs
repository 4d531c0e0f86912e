pub mod session;
pub mod transcript;

pub use session::{ChatSession, HISTORY_FAILED};
pub use transcript::Transcript;
