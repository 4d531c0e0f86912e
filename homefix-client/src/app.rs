use std::sync::Arc;

use homefix_booking::{BookingDesk, BookingSubmitter, TechnicianDashboard, TechnicianSearch};
use homefix_chat::ChatSession;
use homefix_core::{ClientResult, RealtimeChannel};
use homefix_shared::Session;
use homefix_store::{AccountService, Config, FileSessionStorage, SessionStore};

use crate::http::HttpBackend;
use crate::socket::{SocketChannel, SocketConfig};

/// Everything a front end needs, wired from one [`Config`].
pub struct HomefixClient {
    backend: Arc<HttpBackend>,
    session: Arc<SessionStore>,
    channel: Arc<SocketChannel>,
}

impl HomefixClient {
    /// Builds the client and restores a persisted session, if any.
    /// The real-time channel is not opened until [`connect_realtime`](Self::connect_realtime).
    pub fn new(config: &Config) -> ClientResult<Self> {
        let backend = Arc::new(HttpBackend::new(&config.api)?);
        let storage = Arc::new(FileSessionStorage::new(config.session.path.clone()));
        let session = Arc::new(SessionStore::new(backend.clone(), storage));
        session.restore()?;
        let channel = Arc::new(SocketChannel::new(SocketConfig::from_config(config)));

        Ok(Self { backend, session, channel })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        self.session.login(email, password).await
    }

    pub fn logout(&self) -> ClientResult<()> {
        self.session.logout()
    }

    pub fn connect_realtime(&self) {
        self.channel.connect();
    }

    pub fn channel(&self) -> Arc<dyn RealtimeChannel> {
        self.channel.clone()
    }

    pub fn socket(&self) -> &Arc<SocketChannel> {
        &self.channel
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.session.clone())
    }

    pub fn submitter(&self) -> BookingSubmitter {
        BookingSubmitter::new(self.backend.clone(), self.session.clone())
    }

    pub fn search(&self) -> TechnicianSearch {
        TechnicianSearch::new(self.backend.clone(), self.session.clone())
    }

    pub fn desk(&self) -> BookingDesk {
        BookingDesk::new(self.backend.clone(), self.session.clone(), self.channel())
    }

    pub async fn dashboard(&self) -> ClientResult<TechnicianDashboard> {
        TechnicianDashboard::open(self.backend.clone(), self.session.clone(), self.channel()).await
    }

    pub async fn open_chat(&self, booking_id: &str) -> ClientResult<ChatSession> {
        ChatSession::open(
            booking_id,
            self.backend.clone(),
            self.backend.clone(),
            self.session.clone(),
            self.channel(),
        )
        .await
    }
}
