use std::sync::Arc;

use tracing::{error, info, warn};

use homefix_core::search::{SearchReply, SearchRequest};
use homefix_core::{BookingBackend, CancelHandle};
use homefix_store::SessionStore;

/// searching → found | not-found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    Searching,
    Found { booking_id: String },
    NotFound,
}

impl SearchStatus {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SearchStatus::Searching)
    }
}

/// Client-side record of one search, alive until it resolves.
#[derive(Debug, Clone)]
pub struct SearchSession {
    pub request: SearchRequest,
    status: SearchStatus,
}

impl SearchSession {
    pub fn new(request: SearchRequest) -> Self {
        Self { request, status: SearchStatus::Searching }
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }
}

/// Asks the backend to match a technician. One request, no retry and no
/// client-side timeout: the backend's answer ends the search.
pub struct TechnicianSearch {
    backend: Arc<dyn BookingBackend>,
    session: Arc<SessionStore>,
}

impl TechnicianSearch {
    pub fn new(backend: Arc<dyn BookingBackend>, session: Arc<SessionStore>) -> Self {
        Self { backend, session }
    }

    /// Drives `search` to resolution. Exactly one of `on_success` (with the
    /// matched booking id) or `on_fail` runs, unless `cancel` fires first,
    /// in which case the result is dropped, neither runs and the session
    /// stays `Searching`.
    pub async fn run<S, F>(&self, search: &mut SearchSession, cancel: &CancelHandle, on_success: S, on_fail: F)
    where
        S: FnOnce(&str),
        F: FnOnce(),
    {
        if search.status.is_resolved() {
            warn!(status = ?search.status, "search already resolved");
            return;
        }

        let request = &search.request;
        info!(
            problem = %request.problem_type,
            sub = %request.sub_problem,
            urgency = %request.urgency,
            "searching for technician"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            reply = self.request(request) => Some(reply),
        };

        let Some(status) = outcome else {
            info!("search abandoned by its owner");
            return;
        };
        if cancel.is_cancelled() {
            info!("search resolved after teardown, result dropped");
            return;
        }

        search.status = status;
        match &search.status {
            SearchStatus::Found { booking_id } => {
                info!(%booking_id, "technician found");
                on_success(booking_id);
            }
            _ => on_fail(),
        }
    }

    /// Network failures and negative answers both end as `NotFound`.
    async fn request(&self, request: &SearchRequest) -> SearchStatus {
        let token = match self.session.bearer() {
            Ok(token) => token,
            Err(e) => {
                error!("search error: {}", e);
                return SearchStatus::NotFound;
            }
        };

        match self.backend.search_technician(&token, request).await {
            Ok(SearchReply::Matched { booking_id }) => SearchStatus::Found { booking_id },
            Ok(SearchReply::NoMatch { message }) => {
                info!(reason = message.as_deref().unwrap_or("none given"), "no technician matched");
                SearchStatus::NotFound
            }
            Err(e) => {
                error!("search error: {}", e);
                SearchStatus::NotFound
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{logged_in_store, logged_out_store, FakeBookings, SearchScript};
    use homefix_core::search::UrgencyTier;
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    fn request() -> SearchRequest {
        SearchRequest {
            problem_type: "plumbing".to_string(),
            sub_problem: "Leaky Faucet".to_string(),
            location: "Kathmandu".to_string(),
            urgency: UrgencyTier::Rapid,
        }
    }

    fn workflow(script: SearchScript) -> (TechnicianSearch, Arc<FakeBookings>) {
        let backend = Arc::new(FakeBookings::default());
        *backend.search.lock().unwrap() = script;
        (TechnicianSearch::new(backend.clone(), logged_in_store("cust1", false)), backend)
    }

    #[tokio::test]
    async fn test_match_invokes_on_success_once() {
        let (search, backend) = workflow(SearchScript::Match("abc123".to_string()));
        let mut session = SearchSession::new(request());
        let found = RefCell::new(Vec::new());
        let failed = Cell::new(0);

        search
            .run(&mut session, &CancelHandle::new(), |id| found.borrow_mut().push(id.to_string()), || {
                failed.set(failed.get() + 1)
            })
            .await;

        assert_eq!(session.status(), &SearchStatus::Found { booking_id: "abc123".to_string() });
        assert_eq!(found.into_inner(), vec!["abc123".to_string()]);
        assert_eq!(failed.get(), 0);
        assert_eq!(backend.searches.lock().unwrap().as_slice(), &[request()]);
        assert_eq!(backend.last_token().as_deref(), Some("token-cust1"));
    }

    #[tokio::test]
    async fn test_negative_answer_invokes_on_fail_once() {
        let (search, _) = workflow(SearchScript::NoMatch);
        let mut session = SearchSession::new(request());
        let failed = Cell::new(0);

        search
            .run(&mut session, &CancelHandle::new(), |_| panic!("no match expected"), || {
                failed.set(failed.get() + 1)
            })
            .await;

        assert_eq!(session.status(), &SearchStatus::NotFound);
        assert_eq!(failed.get(), 1);
    }

    #[tokio::test]
    async fn test_network_error_collapses_to_not_found() {
        let (search, _) = workflow(SearchScript::Unreachable);
        let mut session = SearchSession::new(request());
        let failed = Cell::new(0);

        search
            .run(&mut session, &CancelHandle::new(), |_| panic!("no match expected"), || {
                failed.set(failed.get() + 1)
            })
            .await;

        assert_eq!(session.status(), &SearchStatus::NotFound);
        assert_eq!(failed.get(), 1);
    }

    #[tokio::test]
    async fn test_missing_session_is_not_found() {
        let backend = Arc::new(FakeBookings::default());
        let search = TechnicianSearch::new(backend.clone(), logged_out_store());
        let mut session = SearchSession::new(request());
        let failed = Cell::new(false);

        search.run(&mut session, &CancelHandle::new(), |_| {}, || failed.set(true)).await;

        assert!(failed.get());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_search_drops_result() {
        let (search, _) = workflow(SearchScript::Slow(Duration::from_millis(200), "abc123".to_string()));
        let mut session = SearchSession::new(request());
        let cancel = CancelHandle::new();
        let fired = Cell::new(false);

        let teardown = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            teardown.cancel();
        });

        search.run(&mut session, &cancel, |_| fired.set(true), || fired.set(true)).await;

        assert!(!fired.get());
        assert_eq!(session.status(), &SearchStatus::Searching);
    }

    #[tokio::test]
    async fn test_resolved_search_is_not_rerun() {
        let (search, backend) = workflow(SearchScript::Match("abc123".to_string()));
        let mut session = SearchSession::new(request());
        search.run(&mut session, &CancelHandle::new(), |_| {}, || {}).await;

        let fired = Cell::new(false);
        search.run(&mut session, &CancelHandle::new(), |_| fired.set(true), || fired.set(true)).await;

        assert!(!fired.get());
        assert_eq!(backend.calls(), 1);
    }
}
