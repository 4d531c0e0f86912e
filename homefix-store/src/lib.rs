pub mod account;
pub mod app_config;
#[cfg(any(test, feature = "testing"))]
pub mod fixtures;
pub mod session;
pub mod session_file;

pub use account::AccountService;
pub use app_config::Config;
pub use session::SessionStore;
pub use session_file::{FileSessionStorage, MemorySessionStorage};
