use serde::{Deserialize, Serialize};
use std::fmt;

/// User-selected matching priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyTier {
    Rapid,
    Slow,
}

impl fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrgencyTier::Rapid => f.write_str("rapid"),
            UrgencyTier::Slow => f.write_str("slow"),
        }
    }
}

/// Body of `POST /api/bookings/search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRequest {
    #[serde(rename = "type")]
    pub problem_type: String,
    #[serde(rename = "sub")]
    pub sub_problem: String,
    pub location: String,
    #[serde(rename = "searchType")]
    pub urgency: UrgencyTier,
}

/// Validated answer to a search request.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchReply {
    Matched { booking_id: String },
    NoMatch { message: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_request_wire_names() {
        let req = SearchRequest {
            problem_type: "plumbing".to_string(),
            sub_problem: "Leaky Faucet".to_string(),
            location: "Kathmandu".to_string(),
            urgency: UrgencyTier::Rapid,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"type": "plumbing", "sub": "Leaky Faucet", "location": "Kathmandu", "searchType": "rapid"})
        );
    }
}
