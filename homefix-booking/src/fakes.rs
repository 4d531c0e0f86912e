use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use homefix_core::backend::{IncomeSummary, NewBooking};
use homefix_core::search::{SearchReply, SearchRequest};
use homefix_core::{BookingBackend, ClientError, ClientResult};
use homefix_shared::{Booking, BookingStatus, Role};
use homefix_store::SessionStore;

pub use homefix_store::fixtures::logged_out_store;

pub fn logged_in_store(user_id: &str, technician: bool) -> Arc<SessionStore> {
    let role = if technician { Role::Technician } else { Role::Customer };
    homefix_store::fixtures::logged_in_store(user_id, role)
}

pub fn booking(id: &str, customer: &str, technician: Option<&str>, status: BookingStatus) -> Booking {
    Booking {
        id: id.to_string(),
        customer_id: customer.to_string(),
        technician_id: technician.map(str::to_string),
        service_type: "plumbing".to_string(),
        sub_problem: Some("Leaky Faucet".to_string()),
        description: "Service request".to_string(),
        address: "Kathmandu".to_string(),
        scheduled_date: None,
        scheduled_time: None,
        status,
        estimated_cost: None,
        customer_name: None,
        technician_name: None,
    }
}

#[derive(Clone)]
pub enum SearchScript {
    Match(String),
    NoMatch,
    Unreachable,
    Slow(Duration, String),
}

pub struct FakeBookings {
    calls: AtomicUsize,
    token: Mutex<Option<String>>,
    pub created: Mutex<Vec<NewBooking>>,
    pub create_error: Mutex<Option<String>>,
    pub bookings: Mutex<HashMap<String, Booking>>,
    pub status_updates: Mutex<Vec<(String, BookingStatus)>>,
    pub search: Mutex<SearchScript>,
    pub searches: Mutex<Vec<SearchRequest>>,
}

impl Default for FakeBookings {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            token: Mutex::new(None),
            created: Mutex::new(Vec::new()),
            create_error: Mutex::new(None),
            bookings: Mutex::new(HashMap::new()),
            status_updates: Mutex::new(Vec::new()),
            search: Mutex::new(SearchScript::NoMatch),
            searches: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBookings {
    pub fn with_bookings(bookings: Vec<Booking>) -> Self {
        let fake = Self::default();
        fake.bookings
            .lock()
            .unwrap()
            .extend(bookings.into_iter().map(|b| (b.id.clone(), b)));
        fake
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn hit(&self, token: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.token.lock().unwrap() = Some(token.to_string());
    }
}

#[async_trait]
impl BookingBackend for FakeBookings {
    async fn create_booking(&self, token: &str, booking: &NewBooking) -> ClientResult<String> {
        self.hit(token);
        if let Some(message) = self.create_error.lock().unwrap().clone() {
            return Err(ClientError::Request { status: 400, message: Some(message) });
        }
        let mut created = self.created.lock().unwrap();
        created.push(booking.clone());
        Ok(format!("booking-{}", created.len()))
    }

    async fn get_booking(&self, token: &str, booking_id: &str) -> ClientResult<Booking> {
        self.hit(token);
        self.bookings
            .lock()
            .unwrap()
            .get(booking_id)
            .cloned()
            .ok_or(ClientError::Request { status: 404, message: Some("Booking not found".to_string()) })
    }

    async fn update_status(&self, token: &str, booking_id: &str, status: BookingStatus) -> ClientResult<()> {
        self.hit(token);
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .get_mut(booking_id)
            .ok_or(ClientError::Request { status: 404, message: None })?;
        booking.status = status;
        self.status_updates.lock().unwrap().push((booking_id.to_string(), status));
        Ok(())
    }

    async fn search_technician(&self, token: &str, request: &SearchRequest) -> ClientResult<SearchReply> {
        self.hit(token);
        self.searches.lock().unwrap().push(request.clone());
        let script = self.search.lock().unwrap().clone();
        match script {
            SearchScript::Match(id) => Ok(SearchReply::Matched { booking_id: id }),
            SearchScript::NoMatch => Ok(SearchReply::NoMatch { message: Some("No technician nearby".to_string()) }),
            SearchScript::Unreachable => Err(ClientError::Network("connection refused".to_string())),
            SearchScript::Slow(delay, id) => {
                tokio::time::sleep(delay).await;
                Ok(SearchReply::Matched { booking_id: id })
            }
        }
    }

    async fn customer_bookings(&self, token: &str, customer_id: &str) -> ClientResult<Vec<Booking>> {
        self.hit(token);
        let mut list: Vec<Booking> = self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.customer_id == customer_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(list)
    }

    async fn technician_bookings(&self, token: &str, technician_id: &str) -> ClientResult<Vec<Booking>> {
        self.hit(token);
        let mut list: Vec<Booking> = self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.technician_id.as_deref() == Some(technician_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(list)
    }

    async fn income(&self, token: &str) -> ClientResult<IncomeSummary> {
        self.hit(token);
        Ok(IncomeSummary { total_earnings: 5600.0, payouts: Vec::new() })
    }
}
