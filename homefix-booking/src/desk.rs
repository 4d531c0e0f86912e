use std::sync::Arc;

use tracing::{error, info};

use homefix_core::backend::IncomeSummary;
use homefix_core::{BookingBackend, ClientError, ClientResult, RealtimeChannel};
use homefix_shared::models::events::BookingResponsePayload;
use homefix_shared::{Booking, BookingStatus, OutboundEvent, Role};
use homefix_store::SessionStore;

/// Booking reads and status changes for both roles.
pub struct BookingDesk {
    backend: Arc<dyn BookingBackend>,
    session: Arc<SessionStore>,
    channel: Arc<dyn RealtimeChannel>,
}

impl BookingDesk {
    pub fn new(
        backend: Arc<dyn BookingBackend>,
        session: Arc<SessionStore>,
        channel: Arc<dyn RealtimeChannel>,
    ) -> Self {
        Self { backend, session, channel }
    }

    pub async fn get(&self, booking_id: &str) -> ClientResult<Booking> {
        let token = self.session.bearer()?;
        self.backend.get_booking(&token, booking_id).await
    }

    /// The caller's own bookings, whichever role they hold.
    pub async fn my_bookings(&self) -> ClientResult<Vec<Booking>> {
        let session = self.session.require()?;
        match session.role {
            Role::Technician => self.backend.technician_bookings(session.bearer(), &session.user_id).await,
            _ => self.backend.customer_bookings(session.bearer(), &session.user_id).await,
        }
    }

    pub async fn income(&self) -> ClientResult<IncomeSummary> {
        let session = self.session.require()?;
        if session.role != Role::Technician {
            return Err(TransitionError::NotTechnician.into());
        }
        self.backend.income(session.bearer()).await
    }

    /// Technician accepts a pending booking.
    pub async fn accept(&self, booking: &Booking) -> ClientResult<Booking> {
        self.respond(booking, BookingStatus::Accepted).await
    }

    /// Technician rejects a pending booking.
    pub async fn reject(&self, booking: &Booking) -> ClientResult<Booking> {
        self.respond(booking, BookingStatus::Rejected).await
    }

    /// Accepted → Completed.
    pub async fn complete(&self, booking: &Booking) -> ClientResult<Booking> {
        self.transition(booking, BookingStatus::Completed).await
    }

    async fn respond(&self, booking: &Booking, status: BookingStatus) -> ClientResult<Booking> {
        let session = self.session.require()?;
        if session.role != Role::Technician {
            return Err(TransitionError::NotTechnician.into());
        }

        let updated = self.transition(booking, status).await?;

        // Fire-and-forget; the REST update above is authoritative.
        self.channel.publish(OutboundEvent::BookingResponse(BookingResponsePayload {
            booking_id: booking.id.clone(),
            technician_id: session.user_id.clone(),
            status,
        }));
        Ok(updated)
    }

    async fn transition(&self, booking: &Booking, next: BookingStatus) -> ClientResult<Booking> {
        if !booking.status.can_transition_to(next) {
            return Err(TransitionError::Invalid { from: booking.status, to: next }.into());
        }
        let token = self.session.bearer()?;

        self.backend
            .update_status(&token, &booking.id, next)
            .await
            .map_err(|e| {
                error!(booking_id = %booking.id, to = %next, "status update failed: {}", e);
                e
            })?;

        info!(booking_id = %booking.id, from = %booking.status, to = %next, "booking status changed");
        let mut updated = booking.clone();
        updated.status = next;
        Ok(updated)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("Invalid state transition from {from} to {to}")]
    Invalid { from: BookingStatus, to: BookingStatus },

    #[error("Only technicians can respond to bookings")]
    NotTechnician,
}

impl From<TransitionError> for ClientError {
    fn from(err: TransitionError) -> Self {
        ClientError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{booking, logged_in_store, FakeBookings};
    use homefix_core::MemoryChannel;

    fn desk(technician: bool, bookings: Vec<Booking>) -> (BookingDesk, Arc<FakeBookings>, Arc<MemoryChannel>) {
        let backend = Arc::new(FakeBookings::with_bookings(bookings));
        let channel = Arc::new(MemoryChannel::new());
        let user = if technician { "tech1" } else { "cust1" };
        let desk = BookingDesk::new(backend.clone(), logged_in_store(user, technician), channel.clone());
        (desk, backend, channel)
    }

    #[tokio::test]
    async fn test_accept_pending_booking_emits_response() {
        let pending = booking("b1", "cust1", Some("tech1"), BookingStatus::Pending);
        let (desk, backend, channel) = desk(true, vec![pending.clone()]);

        let updated = desk.accept(&pending).await.unwrap();
        assert_eq!(updated.status, BookingStatus::Accepted);
        assert_eq!(
            backend.status_updates.lock().unwrap().as_slice(),
            &[("b1".to_string(), BookingStatus::Accepted)]
        );
        assert_eq!(
            channel.published(),
            vec![OutboundEvent::BookingResponse(BookingResponsePayload {
                booking_id: "b1".to_string(),
                technician_id: "tech1".to_string(),
                status: BookingStatus::Accepted,
            })]
        );
    }

    #[tokio::test]
    async fn test_terminal_booking_cannot_be_accepted() {
        let done = booking("b1", "cust1", Some("tech1"), BookingStatus::Rejected);
        let (desk, backend, channel) = desk(true, vec![done.clone()]);

        let err = desk.accept(&done).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(backend.calls(), 0);
        assert!(channel.published().is_empty());
    }

    #[tokio::test]
    async fn test_customers_cannot_respond() {
        let pending = booking("b1", "cust1", Some("tech1"), BookingStatus::Pending);
        let (desk, backend, _) = desk(false, vec![pending.clone()]);

        let err = desk.reject(&pending).await.unwrap_err();
        assert_eq!(err.user_message(), "Only technicians can respond to bookings");
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_complete_accepted_booking() {
        let accepted = booking("b1", "cust1", Some("tech1"), BookingStatus::Accepted);
        let (desk, _, channel) = desk(true, vec![accepted.clone()]);

        let done = desk.complete(&accepted).await.unwrap();
        assert_eq!(done.status, BookingStatus::Completed);
        assert!(channel.published().is_empty());
    }

    #[tokio::test]
    async fn test_my_bookings_follows_role() {
        let bookings = vec![
            booking("b1", "cust1", Some("tech1"), BookingStatus::Pending),
            booking("b2", "cust2", Some("tech1"), BookingStatus::Accepted),
            booking("b3", "cust1", Some("tech2"), BookingStatus::Completed),
        ];
        let (customer_desk, _, _) = desk(false, bookings.clone());
        let ids: Vec<_> = customer_desk.my_bookings().await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["b1", "b3"]);

        let (tech_desk, _, _) = desk(true, bookings);
        let ids: Vec<_> = tech_desk.my_bookings().await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
    }

    #[tokio::test]
    async fn test_income_is_technician_only() {
        let (customer_desk, _, _) = desk(false, vec![]);
        assert!(customer_desk.income().await.is_err());

        let (tech_desk, _, _) = desk(true, vec![]);
        assert_eq!(tech_desk.income().await.unwrap().total_earnings, 5600.0);
    }
}
