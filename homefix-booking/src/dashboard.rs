use std::sync::Arc;

use tracing::{info, warn};

use homefix_core::{BookingBackend, CancelHandle, ClientResult, RealtimeChannel, Room, Subscription};
use homefix_shared::{Booking, BookingStatus, InboundEvent};
use homefix_store::SessionStore;

use crate::desk::{BookingDesk, TransitionError};

/// A push surfaced to the technician, after the request list was refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardNotice {
    pub message: String,
    pub booking_id: Option<String>,
}

/// Technician's live view of incoming booking requests.
///
/// Holds the user room for as long as it lives.
pub struct TechnicianDashboard {
    desk: BookingDesk,
    session: Arc<SessionStore>,
    channel: Arc<dyn RealtimeChannel>,
    subscription: Subscription,
    requests: Vec<Booking>,
}

impl TechnicianDashboard {
    pub async fn open(
        backend: Arc<dyn BookingBackend>,
        session: Arc<SessionStore>,
        channel: Arc<dyn RealtimeChannel>,
    ) -> ClientResult<Self> {
        let user = session.require()?;
        if !user.is_technician() {
            return Err(TransitionError::NotTechnician.into());
        }

        let subscription = channel.join(Room::User(user.user_id.clone()));
        let mut dashboard = Self {
            desk: BookingDesk::new(backend, session.clone(), channel.clone()),
            session,
            channel,
            subscription,
            requests: Vec::new(),
        };
        dashboard.refresh().await?;
        info!(technician_id = %user.user_id, requests = dashboard.requests.len(), "dashboard opened");
        Ok(dashboard)
    }

    pub fn requests(&self) -> &[Booking] {
        &self.requests
    }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        let bookings = self.desk.my_bookings().await?;
        self.requests = bookings
            .into_iter()
            .filter(|b| b.status != BookingStatus::Rejected)
            .collect();
        Ok(())
    }

    /// Waits for the next booking push. Returns `None` when cancelled or
    /// when the channel shuts down.
    pub async fn next_notification(&mut self, cancel: &CancelHandle) -> Option<DashboardNotice> {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                event = self.subscription.next() => event?,
            };

            let InboundEvent::NewBooking(notice) = event else {
                continue;
            };
            if let Err(e) = self.refresh().await {
                // Keep the stale list; the notice is still worth showing.
                warn!("refresh after new booking failed: {}", e);
            }
            return Some(DashboardNotice { message: notice.message, booking_id: notice.booking_id });
        }
    }

    pub async fn accept(&mut self, booking_id: &str) -> ClientResult<Booking> {
        let booking = self.find(booking_id).await?;
        let updated = self.desk.accept(&booking).await?;
        if let Some(slot) = self.requests.iter_mut().find(|b| b.id == booking_id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    pub async fn reject(&mut self, booking_id: &str) -> ClientResult<Booking> {
        let booking = self.find(booking_id).await?;
        let updated = self.desk.reject(&booking).await?;
        self.requests.retain(|b| b.id != booking_id);
        Ok(updated)
    }

    async fn find(&self, booking_id: &str) -> ClientResult<Booking> {
        match self.requests.iter().find(|b| b.id == booking_id) {
            Some(booking) => Ok(booking.clone()),
            None => self.desk.get(booking_id).await,
        }
    }

    /// Consumes the dashboard; the user room is left on drop.
    pub fn close(self) {}
}

impl Drop for TechnicianDashboard {
    fn drop(&mut self) {
        self.channel.leave(self.subscription.room());
        if let Some(user) = self.session.current() {
            info!(technician_id = %user.user_id, "dashboard closed");
        }
    }
}
