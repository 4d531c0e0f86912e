pub mod dashboard;
pub mod desk;
pub mod search;
pub mod submitter;

pub use dashboard::{DashboardNotice, TechnicianDashboard};
pub use desk::{BookingDesk, TransitionError};
pub use search::{SearchSession, SearchStatus, TechnicianSearch};
pub use submitter::{BookingDraft, BookingSubmitter};

#[cfg(test)]
pub(crate) mod fakes;
