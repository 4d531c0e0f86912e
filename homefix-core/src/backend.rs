//! Seams to the remote backend. The HTTP implementation lives in
//! `homefix-client`; tests substitute in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use homefix_shared::{Booking, BookingStatus, Masked, Role, Session};

use crate::search::{SearchReply, SearchRequest};
use crate::ClientResult;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: Masked<String>,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: Masked::new(password.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: Masked<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: Masked<String>,
    pub new_password: Masked<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub profile_picture: Option<String>,
}

/// Body of `POST /api/bookings`, already validated client-side.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub technician_id: String,
    pub scheduled_date: NaiveDate,
    #[serde(serialize_with = "serialize_slot")]
    pub scheduled_time: NaiveTime,
    pub address: String,
    pub description: String,
    pub service_type: String,
}

fn serialize_slot<S: serde::Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.format("%H:%M:00").to_string())
}

/// One prior message from `GET /api/messages/:otherUserId`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncomeSummary {
    pub total_earnings: f64,
    pub payouts: Vec<Payout>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payout {
    pub date: NaiveDate,
    pub amount: f64,
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchanges credentials for a session.
    async fn login(&self, credentials: &Credentials) -> ClientResult<Session>;

    /// Creates a customer account and returns its id.
    async fn register_customer(&self, registration: &Registration) -> ClientResult<String>;

    async fn fetch_me(&self, token: &str) -> ClientResult<UserProfile>;

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> ClientResult<UserProfile>;

    async fn change_password(&self, token: &str, change: &PasswordChange) -> ClientResult<()>;
}

#[async_trait]
pub trait BookingBackend: Send + Sync {
    /// Returns the new booking's id.
    async fn create_booking(&self, token: &str, booking: &NewBooking) -> ClientResult<String>;

    async fn get_booking(&self, token: &str, booking_id: &str) -> ClientResult<Booking>;

    async fn update_status(&self, token: &str, booking_id: &str, status: BookingStatus) -> ClientResult<()>;

    /// Asks the backend to match a technician.
    async fn search_technician(&self, token: &str, request: &SearchRequest) -> ClientResult<SearchReply>;

    async fn customer_bookings(&self, token: &str, customer_id: &str) -> ClientResult<Vec<Booking>>;

    async fn technician_bookings(&self, token: &str, technician_id: &str) -> ClientResult<Vec<Booking>>;

    async fn income(&self, token: &str) -> ClientResult<IncomeSummary>;
}

#[async_trait]
pub trait MessageBackend: Send + Sync {
    /// Prior messages between the caller and `counterpart_id`.
    async fn history(&self, token: &str, counterpart_id: &str) -> ClientResult<Vec<HistoryEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_booking_wire_format() {
        let booking = NewBooking {
            technician_id: "tech1".to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(9, 5, 42).unwrap(),
            address: "Kathmandu".to_string(),
            description: "Service request".to_string(),
            service_type: "plumbing".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&booking).unwrap(),
            json!({
                "technicianId": "tech1",
                "scheduledDate": "2030-01-15",
                "scheduledTime": "09:05:00",
                "address": "Kathmandu",
                "description": "Service request",
                "serviceType": "plumbing"
            })
        );
    }

    #[test]
    fn test_credentials_serialize_password_but_never_debug_it() {
        let creds = Credentials::new(" a@b.com ", "secret1");
        assert_eq!(creds.email, "a@b.com");
        assert!(!format!("{:?}", creds).contains("secret1"));
        assert_eq!(serde_json::to_value(&creds).unwrap()["password"], "secret1");
    }
}
