use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A scheduled service engagement between a customer and a technician.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub customer_id: String,
    /// None until a technician is matched.
    pub technician_id: Option<String>,
    pub service_type: String,
    pub sub_problem: Option<String>,
    pub description: String,
    pub address: String,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub status: BookingStatus,
    pub estimated_cost: Option<f64>,
    pub customer_name: Option<String>,
    pub technician_name: Option<String>,
}

impl Booking {
    /// The other party of the booking, seen from `user_id`.
    pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
        if self.customer_id == user_id {
            self.technician_id.as_deref()
        } else if self.technician_id.as_deref() == Some(user_id) {
            Some(self.customer_id.as_str())
        } else {
            None
        }
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.customer_id == user_id || self.technician_id.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Rejected | BookingStatus::Completed)
    }

    /// Pending → Accepted | Rejected, Accepted → Completed.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Accepted)
                | (BookingStatus::Pending, BookingStatus::Rejected)
                | (BookingStatus::Accepted, BookingStatus::Completed)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown booking status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "accepted" => Ok(BookingStatus::Accepted),
            "rejected" => Ok(BookingStatus::Rejected),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking() -> Booking {
        Booking {
            id: "abc123".to_string(),
            customer_id: "cust1".to_string(),
            technician_id: Some("tech1".to_string()),
            service_type: "plumbing".to_string(),
            sub_problem: Some("Leaky Faucet".to_string()),
            description: "Service request".to_string(),
            address: "Kathmandu".to_string(),
            scheduled_date: None,
            scheduled_time: None,
            status: BookingStatus::Pending,
            estimated_cost: None,
            customer_name: None,
            technician_name: None,
        }
    }

    #[test]
    fn test_counterpart() {
        let b = booking();
        assert_eq!(b.counterpart_of("cust1"), Some("tech1"));
        assert_eq!(b.counterpart_of("tech1"), Some("cust1"));
        assert_eq!(b.counterpart_of("someone"), None);
    }

    #[test]
    fn test_unmatched_booking_has_no_counterpart() {
        let mut b = booking();
        b.technician_id = None;
        assert_eq!(b.counterpart_of("cust1"), None);
        assert!(!b.is_participant("tech1"));
    }

    #[test]
    fn test_status_transitions() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Accepted));
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Rejected));
        assert!(BookingStatus::Accepted.can_transition_to(BookingStatus::Completed));
        assert!(!BookingStatus::Rejected.can_transition_to(BookingStatus::Accepted));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Pending));
        assert!(BookingStatus::Completed.is_terminal());
        assert!(!BookingStatus::Accepted.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Accepted".parse::<BookingStatus>(), Ok(BookingStatus::Accepted));
        assert!("cancelled".parse::<BookingStatus>().is_err());
    }
}
