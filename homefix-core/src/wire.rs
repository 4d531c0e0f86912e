//! Raw payload shapes returned by the backend and their validation into
//! domain types. Every optional-looking field is `Option` here; the
//! `validate` functions decide which ones are actually required and turn
//! gaps into `ClientError::Schema`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use homefix_shared::{Booking, BookingStatus, Masked, Role, Session};

use crate::backend::{HistoryEntry, IncomeSummary, Payout, UserProfile};
use crate::search::SearchReply;
use crate::{ClientError, ClientResult};

/// A user reference that may arrive populated (`{ _id, fullName }`) or bare (`"id"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: Option<String>,
        #[serde(rename = "fullName")]
        full_name: Option<String>,
    },
}

impl UserRef {
    pub fn id(&self) -> Option<&str> {
        match self {
            UserRef::Id(id) => Some(id.as_str()),
            UserRef::Populated { id, .. } => id.as_deref(),
        }
        .filter(|id| !id.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            UserRef::Id(_) => None,
            UserRef::Populated { full_name, .. } => full_name.as_deref(),
        }
    }
}

/// Backend error body: `{ "message": "..." }`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginEnvelope {
    pub user: Option<LoginUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: Option<String>,
    pub role: Option<String>,
    pub token: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
}

impl LoginEnvelope {
    pub fn validate(self) -> ClientResult<Session> {
        let user = self.user.ok_or_else(|| ClientError::schema("login", "user"))?;
        let user_id = required(user.id, "login", "user.id")?;
        let token = required(user.token, "login", "user.token")?;
        let role = user
            .role
            .as_deref()
            .and_then(Role::parse)
            .ok_or_else(|| ClientError::schema("login", "user.role"))?;

        Ok(Session {
            user_id,
            role,
            token: Masked::new(token),
            display_name: user.full_name.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            profile_picture: user.profile_picture.filter(|p| !p.trim().is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterEnvelope {
    pub data: Option<UserDto>,
}

impl RegisterEnvelope {
    pub fn validate(self) -> ClientResult<String> {
        let data = self.data.ok_or_else(|| ClientError::schema("register", "data"))?;
        required(data.id, "register", "data._id")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
    pub profile_picture: Option<String>,
}

impl UserDto {
    pub fn validate(self) -> ClientResult<UserProfile> {
        Ok(UserProfile {
            id: required(self.id, "user", "_id")?,
            full_name: self.full_name.unwrap_or_default(),
            email: required(self.email, "user", "email")?,
            phone: self.phone,
            address: self.address,
            role: self.role.as_deref().and_then(Role::parse),
            profile_picture: self.profile_picture,
        })
    }
}

/// `PUT /api/user/profile` answers `{ message, user }`; `GET /api/user/me`
/// answers with the user itself, sometimes wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserEnvelope {
    Wrapped { user: UserDto },
    Bare(UserDto),
}

impl UserEnvelope {
    pub fn validate(self) -> ClientResult<UserProfile> {
        match self {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => user.validate(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatedBooking {
    #[serde(rename = "_id", alias = "bookingId")]
    pub id: Option<String>,
    pub booking: Option<BookingDto>,
}

impl CreatedBooking {
    pub fn validate(self) -> ClientResult<String> {
        if let Some(id) = self.id.filter(|id| !id.is_empty()) {
            return Ok(id);
        }
        let booking = self.booking.ok_or_else(|| ClientError::schema("create booking", "_id"))?;
        required(booking.id, "create booking", "booking._id")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub customer: Option<UserRef>,
    pub technician: Option<UserRef>,
    pub service_type: Option<String>,
    pub sub_problem: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub scheduled_date: Option<String>,
    pub scheduled_time: Option<String>,
    pub status: Option<String>,
    pub estimated_cost: Option<f64>,
}

impl BookingDto {
    pub fn validate(self) -> ClientResult<Booking> {
        let id = required(self.id, "booking", "_id")?;
        let customer = self.customer.ok_or_else(|| ClientError::schema("booking", "customer"))?;
        let customer_id = customer
            .id()
            .map(str::to_string)
            .ok_or_else(|| ClientError::schema("booking", "customer._id"))?;
        let status = self
            .status
            .as_deref()
            .ok_or_else(|| ClientError::schema("booking", "status"))?
            .parse::<BookingStatus>()
            .map_err(|e| ClientError::Schema(format!("booking: {}", e)))?;
        let scheduled_date = match self.scheduled_date.as_deref() {
            Some(raw) => Some(parse_date(raw).ok_or_else(|| ClientError::schema("booking", "scheduledDate"))?),
            None => None,
        };
        let scheduled_time = match self.scheduled_time.as_deref() {
            Some(raw) => Some(parse_time(raw).ok_or_else(|| ClientError::schema("booking", "scheduledTime"))?),
            None => None,
        };

        Ok(Booking {
            id,
            customer_name: customer.name().map(str::to_string),
            customer_id,
            technician_id: self.technician.as_ref().and_then(|t| t.id()).map(str::to_string),
            technician_name: self.technician.as_ref().and_then(|t| t.name()).map(str::to_string),
            service_type: self.service_type.unwrap_or_default(),
            sub_problem: self.sub_problem,
            description: self.description.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            scheduled_date,
            scheduled_time,
            status,
            estimated_cost: self.estimated_cost,
        })
    }
}

/// `GET /api/bookings/:id` answers with the booking, sometimes wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BookingEnvelope {
    Wrapped { booking: BookingDto },
    Bare(BookingDto),
}

impl BookingEnvelope {
    pub fn validate(self) -> ClientResult<Booking> {
        match self {
            BookingEnvelope::Wrapped { booking } | BookingEnvelope::Bare(booking) => booking.validate(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BookingList {
    #[serde(default)]
    pub bookings: Option<Vec<BookingDto>>,
}

impl BookingList {
    /// A missing list is an empty list.
    pub fn validate(self) -> ClientResult<Vec<Booking>> {
        self.bookings
            .unwrap_or_default()
            .into_iter()
            .map(BookingDto::validate)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReplyDto {
    #[serde(default)]
    pub success: bool,
    pub booking_id: Option<String>,
    pub message: Option<String>,
}

impl SearchReplyDto {
    pub fn validate(self) -> ClientResult<SearchReply> {
        if !self.success {
            return Ok(SearchReply::NoMatch { message: self.message });
        }
        let booking_id = required(self.booking_id, "search", "bookingId")?;
        Ok(SearchReply::Matched { booking_id })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDto {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub sender: Option<UserRef>,
    pub receiver: Option<UserRef>,
}

impl HistoryDto {
    pub fn validate(self) -> ClientResult<HistoryEntry> {
        let sender_id = self
            .sender
            .as_ref()
            .and_then(UserRef::id)
            .map(str::to_string)
            .ok_or_else(|| ClientError::schema("message", "sender._id"))?;
        let receiver_id = self
            .receiver
            .as_ref()
            .and_then(UserRef::id)
            .map(str::to_string)
            .ok_or_else(|| ClientError::schema("message", "receiver._id"))?;

        Ok(HistoryEntry {
            id: required(self.id, "message", "_id")?,
            sender_id,
            receiver_id,
            text: self.message.ok_or_else(|| ClientError::schema("message", "message"))?,
            created_at: self.created_at.ok_or_else(|| ClientError::schema("message", "createdAt"))?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeDto {
    #[serde(default)]
    pub total_earnings: f64,
    #[serde(default)]
    pub payouts: Vec<PayoutDto>,
}

#[derive(Debug, Deserialize)]
pub struct PayoutDto {
    pub date: Option<String>,
    pub amount: Option<f64>,
}

impl IncomeDto {
    pub fn validate(self) -> ClientResult<IncomeSummary> {
        let payouts = self
            .payouts
            .into_iter()
            .map(|p| {
                let date = p
                    .date
                    .as_deref()
                    .and_then(parse_date)
                    .ok_or_else(|| ClientError::schema("payout", "date"))?;
                let amount = p.amount.ok_or_else(|| ClientError::schema("payout", "amount"))?;
                Ok(Payout { date, amount })
            })
            .collect::<ClientResult<Vec<_>>>()?;

        Ok(IncomeSummary { total_earnings: self.total_earnings, payouts })
    }
}

fn required(value: Option<String>, what: &str, field: &str) -> ClientResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ClientError::schema(what, field))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Accepts `HH:MM:SS` or `HH:MM`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .ok()
        .or_else(|| NaiveTime::parse_from_str(raw, "%H:%M").ok())
}
