use homefix_shared::BookingStatus;

/// How a booking status is shown everywhere in the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub color: &'static str,
}

pub fn present(status: BookingStatus) -> StatusBadge {
    match status {
        BookingStatus::Completed => StatusBadge { label: "Completed", color: "#059669" },
        BookingStatus::Accepted => StatusBadge { label: "Accepted", color: "#2563eb" },
        BookingStatus::Pending => StatusBadge { label: "Pending", color: "#f59e0b" },
        BookingStatus::Rejected => StatusBadge { label: "Rejected", color: "#dc2626" },
    }
}
