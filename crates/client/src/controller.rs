//! Debounced search controller.
//!
//! An explicit state machine:
//!
//! ```text
//! Idle -> Debouncing -> Searching -> { ResultsReady | Empty | Error }
//!           ^                                    |
//!           +------------- next keystroke -------+
//! ```
//!
//! One timer handle implements a trailing-edge debounce. Every search that
//! is started takes the next number from a monotonically increasing
//! sequence, and a response is applied only if its number is still the
//! current one. Older responses are dropped, so out-of-order network
//! replies never overwrite newer state.
//!
//! The controller must be used from inside a Tokio runtime: timers and
//! requests run as spawned tasks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use repairdesk_core::search::{
    ActionResponse, SearchRequest, SearchResult, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
    SEARCH_FAILED_MESSAGE,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ClientError;
use crate::executor::{SearchExecutor, DEFAULT_DEBOUNCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// No query.
    Idle,
    /// Waiting for the typing to settle.
    Debouncing,
    /// A request is in flight.
    Searching,
    ResultsReady,
    /// The last search for a non-empty query matched nothing.
    Empty,
    /// The last search failed; previous results are still shown.
    Error,
}

/// Notifications for the owner of the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent<T> {
    /// A search completed with at least one row.
    Results(SearchResult<T>),
    /// A search for `query` completed with zero rows. Sent once per search.
    NoResults { query: String },
    /// The query was cleared. Distinct from a search with no results.
    QueryCleared,
    /// A search failed with a user-facing message.
    Failed { message: String },
}

/// Point-in-time copy of the controller state.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot<T> {
    pub phase: SearchPhase,
    pub query: String,
    pub results: Option<SearchResult<T>>,
    pub error: Option<String>,
}

struct Inner<T> {
    phase: SearchPhase,
    query: String,
    page: i64,
    page_size: i64,
    /// Query of the most recently started search.
    last_searched: Option<String>,
    results: Option<SearchResult<T>>,
    error: Option<String>,
    /// Sequence number of the search whose response may be applied.
    seq: u64,
    /// Bumped on every keystroke; a timer only fires for its own generation.
    input_gen: u64,
    timer: Option<JoinHandle<()>>,
}

impl<T> Inner<T> {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Debounced, latest-request-wins search over a [`SearchExecutor`].
///
/// Cheap to clone; clones share state.
pub struct SearchController<T, X> {
    inner: Arc<Mutex<Inner<T>>>,
    executor: Arc<X>,
    delay: Duration,
    events: mpsc::UnboundedSender<SearchEvent<T>>,
}

impl<T, X> Clone for SearchController<T, X> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            executor: Arc::clone(&self.executor),
            delay: self.delay,
            events: self.events.clone(),
        }
    }
}

impl<T, X> SearchController<T, X>
where
    T: Clone + Send + 'static,
    X: SearchExecutor<T> + 'static,
{
    /// Create a controller and the receiving end of its event stream.
    pub fn new(
        executor: Arc<X>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SearchEvent<T>>) {
        let (events, rx) = mpsc::unbounded_channel();
        let inner = Inner {
            phase: SearchPhase::Idle,
            query: String::new(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            last_searched: None,
            results: None,
            error: None,
            seq: 0,
            input_gen: 0,
            timer: None,
        };
        let controller = Self {
            inner: Arc::new(Mutex::new(inner)),
            executor,
            delay,
            events,
        };
        (controller, rx)
    }

    /// A controller with the default 500 ms debounce.
    pub fn with_default_delay(
        executor: Arc<X>,
    ) -> (Self, mpsc::UnboundedReceiver<SearchEvent<T>>) {
        Self::new(executor, DEFAULT_DEBOUNCE)
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SearchEvent<T>) {
        // The owner may have dropped the receiver; that is not an error.
        let _ = self.events.send(event);
    }

    /// Record a keystroke.
    ///
    /// A non-empty query (re)starts the debounce timer and resets to the
    /// first page. An empty query resets to `Idle` at once, supersedes any
    /// in-flight search and emits [`SearchEvent::QueryCleared`].
    pub fn input(&self, query: impl Into<String>) {
        let query = query.into();
        let mut inner = self.lock();
        inner.cancel_timer();
        inner.input_gen += 1;
        inner.query = query;
        inner.page = DEFAULT_PAGE;

        if inner.query.trim().is_empty() {
            inner.seq += 1;
            inner.phase = SearchPhase::Idle;
            inner.last_searched = None;
            inner.results = None;
            inner.error = None;
            drop(inner);
            tracing::debug!("Search query cleared");
            self.emit(SearchEvent::QueryCleared);
            return;
        }

        inner.phase = SearchPhase::Debouncing;
        let generation = inner.input_gen;
        let this = self.clone();
        let delay = self.delay;
        inner.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = this.lock();
            if inner.input_gen == generation {
                // This task is the timer; let it finish instead of aborting it.
                inner.timer = None;
                this.start_search(&mut inner);
            }
        }));
    }

    /// Search the current query now, skipping the debounce.
    ///
    /// Does nothing (and returns `false`) when the query is empty or was
    /// already the last one searched.
    pub fn submit(&self) -> bool {
        let mut inner = self.lock();
        let query = inner.query.trim();
        if query.is_empty() || inner.last_searched.as_deref() == Some(query) {
            return false;
        }
        inner.cancel_timer();
        self.start_search(&mut inner);
        true
    }

    /// Search the current query again at another page.
    ///
    /// `page` is raised to at least 1 and `page_size` clamped to
    /// `1..=MAX_PAGE_SIZE`, the range the search action accepts.
    pub fn go_to_page(&self, page: i64, page_size: i64) -> bool {
        let mut inner = self.lock();
        if inner.query.trim().is_empty() {
            return false;
        }
        inner.cancel_timer();
        inner.page = page.max(1);
        inner.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self.start_search(&mut inner);
        true
    }

    /// Start a search for the current query and mark it the only one whose
    /// response counts.
    fn start_search(&self, inner: &mut Inner<T>) {
        let query = inner.query.trim().to_string();
        inner.seq += 1;
        inner.phase = SearchPhase::Searching;
        inner.last_searched = Some(query.clone());

        let seq = inner.seq;
        let request = SearchRequest::new(query).with_page(inner.page, inner.page_size);
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.executor.execute(request.clone()).await;
            this.finish(seq, &request.query, outcome);
        });
    }

    fn finish(
        &self,
        seq: u64,
        query: &str,
        outcome: Result<ActionResponse<SearchResult<T>>, ClientError>,
    ) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.seq != seq {
            tracing::debug!(seq, current = inner.seq, query, "Stale search response discarded");
            return;
        }

        let (phase, event) = match outcome {
            Ok(envelope) => match (envelope.data, envelope.server_error, envelope.validation_errors) {
                (Some(result), _, _) => {
                    inner.error = None;
                    if result.is_empty() {
                        inner.results = Some(result);
                        let event = SearchEvent::NoResults {
                            query: query.to_string(),
                        };
                        (SearchPhase::Empty, event)
                    } else {
                        inner.results = Some(result.clone());
                        (SearchPhase::ResultsReady, SearchEvent::Results(result))
                    }
                }
                (None, Some(message), _) => fail(inner, message),
                (None, None, Some(errors)) => {
                    let message = errors
                        .into_values()
                        .flatten()
                        .next()
                        .unwrap_or_else(|| SEARCH_FAILED_MESSAGE.to_string());
                    fail(inner, message)
                }
                (None, None, None) => fail(inner, SEARCH_FAILED_MESSAGE.to_string()),
            },
            Err(e) => {
                tracing::warn!(error = %e, query, "Search request failed");
                fail(inner, SEARCH_FAILED_MESSAGE.to_string())
            }
        };

        // A keystroke after this search started keeps the controller
        // debouncing; the response still updates what is shown.
        if inner.phase != SearchPhase::Debouncing {
            inner.phase = phase;
        }
        drop(guard);

        self.emit(event);
    }

    pub fn phase(&self) -> SearchPhase {
        self.lock().phase
    }

    pub fn snapshot(&self) -> SearchSnapshot<T> {
        let inner = self.lock();
        SearchSnapshot {
            phase: inner.phase,
            query: inner.query.clone(),
            results: inner.results.clone(),
            error: inner.error.clone(),
        }
    }
}

/// Record a failure, keeping whatever results were already shown.
fn fail<T>(inner: &mut Inner<T>, message: String) -> (SearchPhase, SearchEvent<T>) {
    inner.error = Some(message.clone());
    (SearchPhase::Error, SearchEvent::Failed { message })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;

    /// Answers after a per-query latency: queries starting with `slow`
    /// take one second, everything else 50 ms.
    #[derive(Default)]
    struct MockExecutor {
        calls: StdMutex<Vec<String>>,
    }

    impl MockExecutor {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchExecutor<String> for MockExecutor {
        async fn execute(
            &self,
            request: SearchRequest,
        ) -> Result<ActionResponse<SearchResult<String>>, ClientError> {
            self.calls.lock().unwrap().push(request.query.clone());
            let latency = if request.query.starts_with("slow") { 1000 } else { 50 };
            tokio::time::sleep(Duration::from_millis(latency)).await;

            Ok(match request.query.as_str() {
                "boom" => ActionResponse::server_error(SEARCH_FAILED_MESSAGE),
                "xyz" => ActionResponse::success(SearchResult::empty(request.page, request.page_size)),
                q => ActionResponse::success(SearchResult::new(
                    vec![format!("row:{q}")],
                    1,
                    request.page,
                    request.page_size,
                )),
            })
        }
    }

    fn controller() -> (
        SearchController<String, MockExecutor>,
        mpsc::UnboundedReceiver<SearchEvent<String>>,
        Arc<MockExecutor>,
    ) {
        let executor = Arc::new(MockExecutor::default());
        let (controller, events) = SearchController::with_default_delay(Arc::clone(&executor));
        (controller, events, executor)
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn rows(controller: &SearchController<String, MockExecutor>) -> Vec<String> {
        controller
            .snapshot()
            .results
            .map(|r| r.data)
            .unwrap_or_default()
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_keystrokes_runs_one_search() {
        let (controller, mut events, executor) = controller();

        for query in ["j", "ja", "jan", "jane"] {
            controller.input(query);
            assert_eq!(controller.phase(), SearchPhase::Debouncing);
            advance(100).await;
        }
        assert!(executor.calls().is_empty());

        advance(600).await;
        assert_eq!(executor.calls(), vec!["jane".to_string()]);
        assert_eq!(controller.phase(), SearchPhase::ResultsReady);
        assert_matches!(events.try_recv(), Ok(SearchEvent::Results(r)) if r.data == vec!["row:jane".to_string()]);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn searching_phase_while_request_in_flight() {
        let (controller, _events, _executor) = controller();

        controller.input("slow jane");
        advance(510).await;
        assert_eq!(controller.phase(), SearchPhase::Searching);

        advance(1000).await;
        assert_eq!(controller.phase(), SearchPhase::ResultsReady);
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_from_superseded_search_is_discarded() {
        let (controller, mut events, executor) = controller();

        // "slow foo" is in flight until t=1500.
        controller.input("slow foo");
        advance(600).await;
        assert_eq!(controller.phase(), SearchPhase::Searching);

        // "bar" starts at t=1100 and resolves at t=1150.
        controller.input("bar");
        advance(600).await;
        assert_eq!(rows(&controller), vec!["row:bar".to_string()]);

        advance(1000).await;
        assert_eq!(executor.calls(), vec!["slow foo".to_string(), "bar".to_string()]);
        assert_eq!(rows(&controller), vec!["row:bar".to_string()]);
        assert_eq!(controller.phase(), SearchPhase::ResultsReady);

        assert_matches!(events.try_recv(), Ok(SearchEvent::Results(r)) if r.data == vec!["row:bar".to_string()]);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_resets_immediately() {
        let (controller, mut events, executor) = controller();

        controller.input("jane");
        advance(600).await;
        assert_matches!(events.try_recv(), Ok(SearchEvent::Results(_)));

        controller.input("");
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, SearchPhase::Idle);
        assert!(snapshot.results.is_none());
        assert_matches!(events.try_recv(), Ok(SearchEvent::QueryCleared));

        advance(1000).await;
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_supersedes_in_flight_search() {
        let (controller, mut events, _executor) = controller();

        controller.input("slow jane");
        advance(600).await;
        controller.input("   ");
        advance(1000).await;

        assert_eq!(controller.phase(), SearchPhase::Idle);
        assert!(controller.snapshot().results.is_none());
        assert_matches!(events.try_recv(), Ok(SearchEvent::QueryCleared));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_skips_the_debounce() {
        let (controller, _events, executor) = controller();

        controller.input("jane");
        assert!(controller.submit());
        assert_eq!(controller.phase(), SearchPhase::Searching);

        advance(60).await;
        assert_eq!(controller.phase(), SearchPhase::ResultsReady);

        // Same query again is a no-op, and the cancelled timer never fires.
        assert!(!controller.submit());
        advance(1000).await;
        assert_eq!(executor.calls(), vec!["jane".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_rows_is_empty_not_error() {
        let (controller, mut events, _executor) = controller();

        controller.input("xyz");
        advance(600).await;

        assert_eq!(controller.phase(), SearchPhase::Empty);
        assert_matches!(events.try_recv(), Ok(SearchEvent::NoResults { query }) if query == "xyz");
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_previous_results() {
        let (controller, mut events, _executor) = controller();

        controller.input("jane");
        advance(600).await;
        assert_matches!(events.try_recv(), Ok(SearchEvent::Results(_)));

        controller.input("boom");
        advance(600).await;

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.phase, SearchPhase::Error);
        assert_eq!(snapshot.error.as_deref(), Some(SEARCH_FAILED_MESSAGE));
        assert_eq!(rows(&controller), vec!["row:jane".to_string()]);
        assert_matches!(events.try_recv(), Ok(SearchEvent::Failed { message }) if message == SEARCH_FAILED_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn paging_searches_the_same_query() {
        let (controller, _events, executor) = controller();

        assert!(!controller.go_to_page(2, 10));

        controller.input("jane");
        advance(600).await;
        assert!(controller.go_to_page(3, 20));
        advance(60).await;

        let results = controller.snapshot().results.unwrap();
        assert_eq!((results.page, results.page_size), (3, 20));
        assert_eq!(executor.calls(), vec!["jane".to_string(), "jane".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn paging_clamps_to_accepted_range() {
        let (controller, _events, _executor) = controller();

        controller.input("jane");
        advance(600).await;

        assert!(controller.go_to_page(0, 500));
        advance(60).await;
        let results = controller.snapshot().results.unwrap();
        assert_eq!((results.page, results.page_size), (1, MAX_PAGE_SIZE));

        assert!(controller.go_to_page(2, 0));
        advance(60).await;
        let results = controller.snapshot().results.unwrap();
        assert_eq!((results.page, results.page_size), (2, 1));
    }
}
