pub mod app;
pub mod codec;
pub mod http;
pub mod socket;

pub use app::HomefixClient;
pub use http::HttpBackend;
pub use socket::{SocketChannel, SocketConfig};
