use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveTime};
use tracing::{error, info};

use homefix_core::backend::NewBooking;
use homefix_core::{BookingBackend, ClientError, ClientResult};
use homefix_store::SessionStore;

pub const DEFAULT_DESCRIPTION: &str = "Service request";

/// What the customer filled in before confirming a booking.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub technician_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub address: String,
    pub description: Option<String>,
    pub service_type: String,
}

/// Client-side checks. The backend is the authority for everything else.
pub fn validate(draft: &BookingDraft, today: NaiveDate) -> ClientResult<NewBooking> {
    let address = draft.address.trim();
    if address.is_empty() {
        return Err(ClientError::Validation("Please enter your address".to_string()));
    }
    // Same-day bookings are not accepted.
    if draft.date <= today {
        return Err(ClientError::Validation("Please select a date after today".to_string()));
    }

    let description = draft
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DESCRIPTION);

    Ok(NewBooking {
        technician_id: draft.technician_id.clone(),
        scheduled_date: draft.date,
        scheduled_time: draft.time,
        address: address.to_string(),
        description: description.to_string(),
        service_type: draft.service_type.trim().to_string(),
    })
}

pub struct BookingSubmitter {
    backend: Arc<dyn BookingBackend>,
    session: Arc<SessionStore>,
}

impl BookingSubmitter {
    pub fn new(backend: Arc<dyn BookingBackend>, session: Arc<SessionStore>) -> Self {
        Self { backend, session }
    }

    /// Creates the booking and returns its id.
    pub async fn create_booking(&self, draft: &BookingDraft) -> ClientResult<String> {
        self.create_booking_as_of(draft, Local::now().date_naive()).await
    }

    pub async fn create_booking_as_of(&self, draft: &BookingDraft, today: NaiveDate) -> ClientResult<String> {
        let booking = validate(draft, today)?;
        let token = self.session.bearer()?;

        let booking_id = self.backend.create_booking(&token, &booking).await.map_err(|e| {
            error!(technician_id = %booking.technician_id, "booking failed: {}", e);
            e
        })?;

        info!(%booking_id, technician_id = %booking.technician_id, date = %booking.scheduled_date, "booking created");
        Ok(booking_id)
    }
}
