//! # Catalog Controller
//!
//! Owns the current search/filter/sort query and the accumulated result
//! pages for the product grid.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Catalog Query Lifecycle                             │
//! │                                                                         │
//! │  set_filter(patch)                                                      │
//! │     │  merge patch, generation += 1                                     │
//! │     │  page_index = 0, items = [], has_more = true                      │
//! │     ▼                                                                   │
//! │  ┌──────────┐  response (gen matches)   ┌──────────┐                    │
//! │  │ Loading  │──────────────────────────►│  Idle    │◄──┐                │
//! │  │ page N   │                           │ has_more?│   │ append page    │
//! │  └──────────┘◄──────────────────────────└──────────┘   │                │
//! │     │           load_next_page()              │        │                │
//! │     │           (only if has_more && !loading)└────────┘                │
//! │     │                                                                   │
//! │     └── response (gen superseded) ──► discarded, nothing changes        │
//! │     └── error (gen matches) ────────► last_error set, items kept        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stale Responses
//! Every fetch carries the query generation it was issued under. A filter
//! change bumps the generation; when an older fetch resolves afterwards its
//! result is dropped. The request itself is not cancelled.
//!
//! ## Known Limitation
//! The category facet list is built from the products loaded so far, so a
//! category that only appears on a later page is not offered until that page
//! is loaded.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use storefront_core::validation::normalize_search_query;
use storefront_core::{
    ProductSummary, SortKey, ALL_CATEGORIES, MAX_SEARCH_LENGTH, MAX_SEARCH_LIMIT,
};

use crate::error::{SearchError, SessionResult};
use crate::observer::{Listener, Listeners, Observable, SubscriptionId};
use crate::search::{ProductSearch, SearchRequest};

// =============================================================================
// Query
// =============================================================================

/// The filter state the grid is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub search_term: String,
    /// `"all"` means no category filter.
    pub category: String,
    pub sort: SortKey,
    /// Index of the last page appended to the results.
    pub page_index: u64,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        CatalogQuery {
            search_term: String::new(),
            category: ALL_CATEGORIES.to_string(),
            sort: SortKey::default(),
            page_index: 0,
        }
    }
}

/// A partial filter update. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub search_term: Option<String>,
    pub category: Option<String>,
    pub sort: Option<SortKey>,
}

impl FilterPatch {
    pub fn new() -> Self {
        FilterPatch::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// What listeners receive after every catalog change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub query: CatalogQuery,
    pub items: Vec<ProductSummary>,
    pub has_more: bool,
    pub is_loading: bool,
    /// Message of the last failed fetch for this query, for an error banner.
    pub last_error: Option<String>,
    pub generation: u64,
    /// Bumped on every published change, across generations.
    pub revision: u64,
}

impl CatalogSnapshot {
    /// Result counter text shown above the grid.
    pub fn showing_label(&self) -> String {
        if self.is_loading && self.items.is_empty() {
            return "Loading…".to_string();
        }
        format!(
            "Showing {}{} products",
            self.items.len(),
            if self.has_more { "+" } else { "" }
        )
    }

    /// Category facet list: `"all"` first, then categories in the order
    /// they were first seen among the loaded items.
    pub fn categories(&self) -> Vec<String> {
        facet_categories(&self.items)
    }
}

fn facet_categories(items: &[ProductSummary]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut categories = vec![ALL_CATEGORIES.to_string()];
    for item in items {
        if seen.insert(item.category.as_str()) {
            categories.push(item.category.clone());
        }
    }
    categories
}

// =============================================================================
// Fetch Outcome
// =============================================================================

/// Why a page request was not issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A fetch for the current query is already outstanding.
    Loading,
    /// Every matching product has been loaded.
    Exhausted,
}

/// Result of `set_filter`, `refresh` or `load_next_page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was appended.
    Applied {
        page_index: u64,
        appended: usize,
        has_more: bool,
    },
    /// No request was made.
    Skipped(SkipReason),
    /// The response arrived after the query changed and was discarded.
    Stale,
}

// =============================================================================
// Controller
// =============================================================================

#[derive(Debug)]
struct CatalogState {
    query: CatalogQuery,
    items: Vec<ProductSummary>,
    has_more: bool,
    /// Pages appended for the current generation.
    pages_loaded: u64,
    /// Generation of the outstanding fetch, if any.
    in_flight: Option<u64>,
    generation: u64,
    last_error: Option<SearchError>,
    revision: u64,
}

impl CatalogState {
    fn is_loading(&self) -> bool {
        self.in_flight == Some(self.generation)
    }

    fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            query: self.query.clone(),
            items: self.items.clone(),
            has_more: self.has_more,
            is_loading: self.is_loading(),
            last_error: self.last_error.as_ref().map(ToString::to_string),
            generation: self.generation,
            revision: self.revision,
        }
    }

    fn publish(&mut self) -> CatalogSnapshot {
        self.revision += 1;
        self.snapshot()
    }

    fn request(&self, page: u64, page_size: u32) -> SearchRequest {
        SearchRequest {
            search_term: self.query.search_term.clone(),
            category: self.query.category.clone(),
            sort: self.query.sort,
            limit: page_size,
            offset: page * page_size as u64,
        }
    }
}

impl Default for CatalogState {
    fn default() -> Self {
        CatalogState {
            query: CatalogQuery::default(),
            items: Vec::new(),
            has_more: true,
            pages_loaded: 0,
            in_flight: None,
            generation: 0,
            last_error: None,
            revision: 0,
        }
    }
}

#[derive(Debug, Default)]
struct CatalogShared {
    state: Mutex<CatalogState>,
    listeners: Listeners<CatalogSnapshot>,
}

/// Session-scoped catalog browsing controller.
#[derive(Clone)]
pub struct CatalogController {
    search: Arc<dyn ProductSearch>,
    page_size: u32,
    max_search_length: usize,
    shared: Arc<CatalogShared>,
}

impl std::fmt::Debug for CatalogController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogController")
            .field("page_size", &self.page_size)
            .field("shared", &self.shared)
            .finish()
    }
}

impl CatalogController {
    /// Creates a controller with the default query and no results. Call
    /// [`refresh`](Self::refresh) to load the first page.
    ///
    /// `page_size` is clamped to `1..=100`.
    pub fn new(search: Arc<dyn ProductSearch>, page_size: u32) -> Self {
        CatalogController {
            search,
            page_size: page_size.clamp(1, MAX_SEARCH_LIMIT),
            max_search_length: MAX_SEARCH_LENGTH,
            shared: Arc::default(),
        }
    }

    /// Overrides the longest accepted search term.
    pub fn with_max_search_length(mut self, max: usize) -> Self {
        self.max_search_length = max;
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Merges `patch` into the query and restarts from page 0.
    ///
    /// The reset happens even if the patch changes nothing. Any fetch still
    /// outstanding for the previous query is superseded. A search term longer
    /// than `max_search_length` characters is cut, not refused.
    pub async fn set_filter(&self, patch: FilterPatch) -> SessionResult<FetchOutcome> {
        let search_term = patch.search_term.map(|term| {
            let normalized = normalize_search_query(&term, self.max_search_length);
            if normalized.chars().count() < term.trim().chars().count() {
                warn!(max = self.max_search_length, "search term truncated");
            }
            normalized
        });

        let (generation, request, snapshot) = {
            let mut state = self.lock();
            if let Some(term) = search_term {
                state.query.search_term = term;
            }
            if let Some(category) = patch.category {
                state.query.category = category;
            }
            if let Some(sort) = patch.sort {
                state.query.sort = sort;
            }

            state.generation += 1;
            state.query.page_index = 0;
            state.items.clear();
            state.has_more = true;
            state.pages_loaded = 0;
            state.last_error = None;
            state.in_flight = Some(state.generation);

            (
                state.generation,
                state.request(0, self.page_size),
                state.publish(),
            )
        };

        info!(
            generation,
            term = %snapshot.query.search_term,
            category = %snapshot.query.category,
            sort = %snapshot.query.sort,
            "catalog filter reset"
        );
        self.shared.listeners.notify(&snapshot);

        self.fetch(generation, 0, request).await
    }

    /// Reloads the first page of the current query.
    pub async fn refresh(&self) -> SessionResult<FetchOutcome> {
        self.set_filter(FilterPatch::new()).await
    }

    /// Clears the search term and category, keeping the sort.
    pub async fn clear_filters(&self) -> SessionResult<FetchOutcome> {
        self.set_filter(FilterPatch::new().search("").category(ALL_CATEGORIES))
            .await
    }

    /// Fetches and appends the next page.
    ///
    /// Skipped while a fetch is outstanding or once everything is loaded.
    /// After a failed fetch the same page is requested again.
    pub async fn load_next_page(&self) -> SessionResult<FetchOutcome> {
        let (generation, page, request, snapshot) = {
            let mut state = self.lock();
            if state.is_loading() {
                debug!(generation = state.generation, "next page skipped: loading");
                return Ok(FetchOutcome::Skipped(SkipReason::Loading));
            }
            if !state.has_more {
                debug!(generation = state.generation, "next page skipped: exhausted");
                return Ok(FetchOutcome::Skipped(SkipReason::Exhausted));
            }

            let page = state.pages_loaded;
            state.in_flight = Some(state.generation);
            (
                state.generation,
                page,
                state.request(page, self.page_size),
                state.publish(),
            )
        };

        debug!(generation, page, "loading catalog page");
        self.shared.listeners.notify(&snapshot);

        self.fetch(generation, page, request).await
    }

    async fn fetch(
        &self,
        generation: u64,
        page: u64,
        request: SearchRequest,
    ) -> SessionResult<FetchOutcome> {
        let result = self.search.search(&request).await;

        let (outcome, snapshot) = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!(
                    generation,
                    current = state.generation,
                    "discarding stale catalog response"
                );
                return Ok(FetchOutcome::Stale);
            }
            state.in_flight = None;

            let outcome = match &result {
                Ok(response) => {
                    let known: HashSet<i64> = state.items.iter().map(|p| p.id).collect();
                    let fresh: Vec<ProductSummary> = response
                        .items
                        .iter()
                        .filter(|p| !known.contains(&p.id))
                        .cloned()
                        .collect();
                    let duplicates = response.items.len() - fresh.len();
                    if duplicates > 0 {
                        warn!(generation, page, duplicates, "dropped products already loaded");
                    }

                    let appended = fresh.len();
                    state.items.extend(fresh);
                    state.pages_loaded = page + 1;
                    state.query.page_index = page;
                    state.has_more = state.pages_loaded * u64::from(self.page_size) < response.total;
                    state.last_error = None;

                    Ok(FetchOutcome::Applied {
                        page_index: page,
                        appended,
                        has_more: state.has_more,
                    })
                }
                Err(err) => {
                    state.last_error = Some(err.clone());
                    Err(err.clone())
                }
            };
            (outcome, state.publish())
        };

        match &outcome {
            Ok(FetchOutcome::Applied {
                appended, has_more, ..
            }) => info!(
                generation,
                page,
                appended,
                has_more,
                loaded = snapshot.items.len(),
                "catalog page applied"
            ),
            Err(err) => warn!(generation, page, error = %err, "catalog fetch failed"),
            _ => {}
        }
        self.shared.listeners.notify(&snapshot);

        Ok(outcome?)
    }

    /// Category facet list derived from the loaded items.
    pub fn categories(&self) -> Vec<String> {
        facet_categories(&self.lock().items)
    }

    pub fn query(&self) -> CatalogQuery {
        self.lock().query.clone()
    }

    pub fn items(&self) -> Vec<ProductSummary> {
        self.lock().items.clone()
    }

    pub fn has_more(&self) -> bool {
        self.lock().has_more
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading()
    }

    /// Finds a loaded product by id.
    pub fn product(&self, id: i64) -> Option<ProductSummary> {
        self.lock().items.iter().find(|p| p.id == id).cloned()
    }
}

impl Observable for CatalogController {
    type State = CatalogSnapshot;

    fn snapshot(&self) -> CatalogSnapshot {
        self.lock().snapshot()
    }

    fn on_change(&self, listener: Listener<CatalogSnapshot>) -> SubscriptionId {
        self.shared.listeners.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.listeners.unsubscribe(id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::search::{InMemoryProductSearch, SearchPage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use storefront_core::Money;
    use tokio::sync::oneshot;

    fn product(id: i64, category: &str, cents: i64) -> ProductSummary {
        ProductSummary {
            id,
            slug: format!("p-{}", id),
            name: format!("Product {}", id),
            description: String::new(),
            price: Money::from_cents(cents),
            images: Vec::new(),
            image: None,
            category: category.to_string(),
            rating: 0.0,
            review_count: 0,
            stock: 1,
        }
    }

    fn five_products() -> Arc<InMemoryProductSearch> {
        Arc::new(InMemoryProductSearch::new(vec![
            product(1, "lighting", 100),
            product(2, "furniture", 200),
            product(3, "lighting", 300),
            product(4, "textiles", 400),
            product(5, "furniture", 500),
        ]))
    }

    /// Search whose responses are released by the test, in any order.
    #[derive(Default)]
    struct GatedSearch {
        pending: Mutex<Vec<(SearchRequest, Option<oneshot::Sender<Result<SearchPage, SearchError>>>)>>,
    }

    impl GatedSearch {
        fn requests(&self) -> usize {
            self.pending.lock().unwrap().len()
        }

        fn request(&self, index: usize) -> SearchRequest {
            self.pending.lock().unwrap()[index].0.clone()
        }

        fn resolve(&self, index: usize, result: Result<SearchPage, SearchError>) {
            let sender = self.pending.lock().unwrap()[index].1.take().unwrap();
            let _ = sender.send(result);
        }

        async fn wait_for(&self, count: usize) {
            while self.requests() < count {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl ProductSearch for GatedSearch {
        async fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
            let (tx, rx) = oneshot::channel();
            self.pending
                .lock()
                .unwrap()
                .push((request.clone(), Some(tx)));
            rx.await
                .unwrap_or_else(|_| Err(SearchError::Unavailable("dropped".to_string())))
        }
    }

    /// Delegates to the in-memory catalog unless told to fail.
    struct FlakySearch {
        inner: Arc<InMemoryProductSearch>,
        failing: AtomicBool,
    }

    #[async_trait]
    impl ProductSearch for FlakySearch {
        async fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(SearchError::Unavailable("connection reset".to_string()));
            }
            self.inner.search(request).await
        }
    }

    fn ids(controller: &CatalogController) -> Vec<i64> {
        controller.items().iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_pages_accumulate_until_exhausted() {
        let controller = CatalogController::new(five_products(), 2);

        let outcome = controller.refresh().await.unwrap();
        assert_eq!(
            outcome,
            FetchOutcome::Applied {
                page_index: 0,
                appended: 2,
                has_more: true
            }
        );

        controller.load_next_page().await.unwrap();
        assert_eq!(ids(&controller), vec![1, 2, 3, 4]);
        assert_eq!(controller.query().page_index, 1);
        assert!(controller.has_more());

        controller.load_next_page().await.unwrap();
        assert_eq!(ids(&controller), vec![1, 2, 3, 4, 5]);
        assert!(!controller.has_more());

        assert_eq!(
            controller.load_next_page().await.unwrap(),
            FetchOutcome::Skipped(SkipReason::Exhausted)
        );
        assert_eq!(controller.items().len(), 5);
    }

    #[tokio::test]
    async fn test_has_more_false_on_exact_boundary() {
        let search = Arc::new(InMemoryProductSearch::new(vec![
            product(1, "a", 1),
            product(2, "a", 2),
            product(3, "a", 3),
            product(4, "a", 4),
        ]));
        let controller = CatalogController::new(search, 2);

        controller.refresh().await.unwrap();
        controller.load_next_page().await.unwrap();
        assert!(!controller.has_more());
    }

    #[tokio::test]
    async fn test_set_filter_always_resets() {
        let controller = CatalogController::new(five_products(), 2);
        controller.refresh().await.unwrap();
        controller.load_next_page().await.unwrap();
        assert_eq!(controller.query().page_index, 1);

        // same filter as before
        controller
            .set_filter(FilterPatch::new().category(ALL_CATEGORIES))
            .await
            .unwrap();
        assert_eq!(controller.query().page_index, 0);
        assert_eq!(ids(&controller), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_filter_and_sort_reach_the_search() {
        let controller = CatalogController::new(five_products(), 10);
        controller
            .set_filter(
                FilterPatch::new()
                    .category("furniture")
                    .sort(SortKey::PriceDesc),
            )
            .await
            .unwrap();
        assert_eq!(ids(&controller), vec![5, 2]);

        controller.clear_filters().await.unwrap();
        let query = controller.query();
        assert_eq!(query.category, ALL_CATEGORIES);
        assert_eq!(query.sort, SortKey::PriceDesc);
        assert_eq!(controller.items().len(), 5);
    }

    #[tokio::test]
    async fn test_search_term_is_trimmed_and_truncated() {
        let controller = CatalogController::new(five_products(), 2).with_max_search_length(5);

        controller
            .set_filter(FilterPatch::new().search("  prod "))
            .await
            .unwrap();
        assert_eq!(controller.query().search_term, "prod");

        controller
            .set_filter(FilterPatch::new().search(" products "))
            .await
            .unwrap();
        assert_eq!(controller.query().search_term, "produ");
        assert_eq!(ids(&controller), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_overlong_search_term_still_resets() {
        let controller = CatalogController::new(five_products(), 2);
        controller.refresh().await.unwrap();
        controller.load_next_page().await.unwrap();
        assert_eq!(controller.query().page_index, 1);
        assert_eq!(controller.items().len(), 4);

        let outcome = controller
            .set_filter(FilterPatch::new().search("x".repeat(101)))
            .await
            .unwrap();

        let query = controller.query();
        assert_eq!(query.page_index, 0);
        assert_eq!(query.search_term, "x".repeat(MAX_SEARCH_LENGTH));
        assert!(controller.items().is_empty());
        assert_eq!(
            outcome,
            FetchOutcome::Applied {
                page_index: 0,
                appended: 0,
                has_more: false
            }
        );
    }

    #[tokio::test]
    async fn test_categories_come_from_loaded_items() {
        let controller = CatalogController::new(five_products(), 2);
        controller.refresh().await.unwrap();
        assert_eq!(controller.categories(), vec!["all", "lighting", "furniture"]);

        controller.load_next_page().await.unwrap();
        assert_eq!(
            controller.categories(),
            vec!["all", "lighting", "furniture", "textiles"]
        );
    }

    #[tokio::test]
    async fn test_failed_page_keeps_items_and_can_retry() {
        let flaky = Arc::new(FlakySearch {
            inner: five_products(),
            failing: AtomicBool::new(false),
        });
        let controller = CatalogController::new(flaky.clone(), 2);
        controller.refresh().await.unwrap();

        flaky.failing.store(true, Ordering::SeqCst);
        let err = controller.load_next_page().await.unwrap_err();
        assert!(matches!(err, SessionError::Fetch(_)));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.items.len(), 2);
        assert!(snapshot.has_more);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.query.page_index, 0);
        assert!(snapshot.last_error.is_some());
        // reset, page 0, loading page 1, failure
        assert_eq!(snapshot.revision, 4);

        flaky.failing.store(false, Ordering::SeqCst);
        controller.load_next_page().await.unwrap();
        assert_eq!(ids(&controller), vec![1, 2, 3, 4]);
        assert!(controller.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn test_failed_first_page_is_retried_by_next_page() {
        let flaky = Arc::new(FlakySearch {
            inner: five_products(),
            failing: AtomicBool::new(true),
        });
        let controller = CatalogController::new(flaky.clone(), 2);
        assert!(controller.refresh().await.is_err());

        flaky.failing.store(false, Ordering::SeqCst);
        controller.load_next_page().await.unwrap();
        assert_eq!(ids(&controller), vec![1, 2]);
        assert_eq!(controller.query().page_index, 0);
    }

    #[tokio::test]
    async fn test_next_page_suppressed_while_loading() {
        let gated = Arc::new(GatedSearch::default());
        let controller = CatalogController::new(gated.clone(), 2);

        let first = controller.refresh();
        let second = async {
            gated.wait_for(1).await;
            assert!(controller.is_loading());
            let skipped = controller.load_next_page().await.unwrap();
            gated.resolve(
                0,
                Ok(SearchPage {
                    items: vec![product(1, "a", 1)],
                    total: 1,
                }),
            );
            skipped
        };

        let (first, second) = tokio::join!(first, second);
        assert_eq!(second, FetchOutcome::Skipped(SkipReason::Loading));
        assert!(matches!(first.unwrap(), FetchOutcome::Applied { .. }));
        assert_eq!(gated.requests(), 1);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let gated = Arc::new(GatedSearch::default());
        let controller = CatalogController::new(gated.clone(), 2);

        let old = controller.set_filter(FilterPatch::new().category("lighting"));
        let new = async {
            gated.wait_for(1).await;
            controller
                .set_filter(FilterPatch::new().category("textiles"))
                .await
        };
        let driver = async {
            gated.wait_for(2).await;
            assert_eq!(gated.request(1).category, "textiles");

            // the superseded request answers first...
            gated.resolve(
                0,
                Ok(SearchPage {
                    items: vec![product(1, "lighting", 1)],
                    total: 1,
                }),
            );
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            let snapshot = controller.snapshot();
            assert!(snapshot.items.is_empty());
            assert!(snapshot.is_loading);

            // ...then the current one
            gated.resolve(
                1,
                Ok(SearchPage {
                    items: vec![product(4, "textiles", 4)],
                    total: 1,
                }),
            );
        };

        let (old, new, ()) = tokio::join!(old, new, driver);
        assert_eq!(old.unwrap(), FetchOutcome::Stale);
        assert!(matches!(new.unwrap(), FetchOutcome::Applied { .. }));
        assert_eq!(ids(&controller), vec![4]);
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_stale_failure_is_ignored() {
        let gated = Arc::new(GatedSearch::default());
        let controller = CatalogController::new(gated.clone(), 2);

        let old = controller.refresh();
        let new = async {
            gated.wait_for(1).await;
            controller.refresh().await
        };
        let driver = async {
            gated.wait_for(2).await;
            gated.resolve(1, Ok(SearchPage::default()));
            gated.resolve(0, Err(SearchError::Unavailable("late".to_string())));
        };

        let (old, new, ()) = tokio::join!(old, new, driver);
        assert_eq!(old.unwrap(), FetchOutcome::Stale);
        assert!(new.is_ok());
        assert!(controller.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_products_are_not_appended() {
        let gated = Arc::new(GatedSearch::default());
        let controller = CatalogController::new(gated.clone(), 2);

        let load = async {
            controller.refresh().await.unwrap();
            controller.load_next_page().await.unwrap()
        };
        let driver = async {
            gated.wait_for(1).await;
            gated.resolve(
                0,
                Ok(SearchPage {
                    items: vec![product(1, "a", 1), product(2, "a", 2)],
                    total: 4,
                }),
            );
            gated.wait_for(2).await;
            assert_eq!(gated.request(1).offset, 2);
            // catalog shifted between pages: product 2 shows up again
            gated.resolve(
                1,
                Ok(SearchPage {
                    items: vec![product(2, "a", 2), product(3, "a", 3)],
                    total: 4,
                }),
            );
        };

        let (outcome, ()) = tokio::join!(load, driver);
        assert_eq!(
            outcome,
            FetchOutcome::Applied {
                page_index: 1,
                appended: 1,
                has_more: false
            }
        );
        assert_eq!(ids(&controller), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_listeners_and_showing_label() {
        let controller = CatalogController::new(five_products(), 2);
        let labels = Arc::new(Mutex::new(Vec::new()));
        let l = Arc::clone(&labels);
        controller.on_change(Arc::new(move |s: &CatalogSnapshot| {
            l.lock().unwrap().push(s.showing_label());
        }));

        controller.refresh().await.unwrap();
        controller.load_next_page().await.unwrap();
        controller.load_next_page().await.unwrap();

        let labels = labels.lock().unwrap().clone();
        assert_eq!(labels.first().unwrap(), "Loading…");
        assert!(labels.contains(&"Showing 2+ products".to_string()));
        assert_eq!(labels.last().unwrap(), "Showing 5 products");
    }
}
