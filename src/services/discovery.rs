//! Search session orchestration.
//!
//! [`SupplierDiscoveryController`] owns the current [`SearchFilters`] and a
//! small state machine (`Idle -> Loading -> Success | Error`). Every request
//! is tagged with a sequence number; a response whose number is no longer the
//! latest is dropped without touching state, so the last request always wins
//! even when responses arrive out of order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::domain::filters::{FilterChange, SearchFilters};
use crate::domain::supplier::Supplier;
use crate::domain::types::{CertificationType, ServiceType, SortBy};
use crate::dto::search::{DiscoveryPhase, SearchPageData, SupplierCard};
use crate::models::config::DiscoveryConfig;
use crate::pagination::{PageNavigation, PaginatedResult};
use crate::query;
use crate::repository::SupplierReader;
use crate::services::cache::ResultCache;
use crate::services::saved::SavedStore;
use crate::services::{ServiceError, ServiceResult};

/// Observable state of a search session.
#[derive(Clone, Debug, PartialEq)]
pub enum DiscoveryStatus {
    Idle,
    Loading {
        stale: Option<PaginatedResult<Supplier>>,
    },
    Success(PaginatedResult<Supplier>),
    Error {
        error: ServiceError,
        /// Last successful result, kept visible next to the retry affordance.
        stale: Option<PaginatedResult<Supplier>>,
    },
}

impl DiscoveryStatus {
    pub fn phase(&self) -> DiscoveryPhase {
        match self {
            DiscoveryStatus::Idle => DiscoveryPhase::Idle,
            DiscoveryStatus::Loading { .. } => DiscoveryPhase::Loading,
            DiscoveryStatus::Success(page) if page.is_empty() => DiscoveryPhase::Empty,
            DiscoveryStatus::Success(_) => DiscoveryPhase::Success,
            DiscoveryStatus::Error { .. } => DiscoveryPhase::Error,
        }
    }

    /// Current page if successful, otherwise the stale page if any.
    pub fn result(&self) -> Option<&PaginatedResult<Supplier>> {
        match self {
            DiscoveryStatus::Idle => None,
            DiscoveryStatus::Success(page) => Some(page),
            DiscoveryStatus::Loading { stale } | DiscoveryStatus::Error { stale, .. } => {
                stale.as_ref()
            }
        }
    }

    pub fn error(&self) -> Option<&ServiceError> {
        match self {
            DiscoveryStatus::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, DiscoveryStatus::Loading { .. })
    }
}

/// What happened to one dispatched search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Loaded { total: u64 },
    /// Served from the result cache without a request.
    Cached { total: u64 },
    /// A newer request was issued before this one completed.
    Superseded,
    /// The request failed; the session is now in the error state.
    Failed(ServiceError),
}

/// Side effects the view must perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEffect {
    ScrollToTop,
}

#[derive(Debug)]
struct SessionState {
    filters: SearchFilters,
    status: DiscoveryStatus,
    last_good: Option<PaginatedResult<Supplier>>,
    latest_request: u64,
    cache: ResultCache,
    effects: Vec<ViewEffect>,
}

enum Dispatch {
    Fetch { request: u64, filters: SearchFilters },
    Done(SearchOutcome),
}

pub struct SupplierDiscoveryController<R: ?Sized> {
    reader: Arc<R>,
    saved: Arc<SavedStore>,
    state: Mutex<SessionState>,
}

impl<R> SupplierDiscoveryController<R>
where
    R: SupplierReader + ?Sized,
{
    /// Creates an idle session without result caching.
    pub fn new(reader: Arc<R>, saved: Arc<SavedStore>) -> Self {
        Self {
            reader,
            saved,
            state: Mutex::new(SessionState {
                filters: SearchFilters::default(),
                status: DiscoveryStatus::Idle,
                last_good: None,
                latest_request: 0,
                cache: ResultCache::disabled(),
                effects: Vec::new(),
            }),
        }
    }

    /// Creates an idle session with the cache settings from `config`.
    pub fn from_config(reader: Arc<R>, saved: Arc<SavedStore>, config: &DiscoveryConfig) -> Self {
        let controller = Self::new(reader, saved);
        controller.lock().cache = ResultCache::new(config.cache_ttl(), config.cache_capacity);
        controller
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn filters(&self) -> SearchFilters {
        self.lock().filters.clone()
    }

    pub fn status(&self) -> DiscoveryStatus {
        self.lock().status.clone()
    }

    pub fn saved_store(&self) -> &Arc<SavedStore> {
        &self.saved
    }

    /// Drains pending view effects.
    pub fn take_effects(&self) -> Vec<ViewEffect> {
        std::mem::take(&mut self.lock().effects)
    }

    /// Fetches results for the current filters.
    pub async fn load(&self) -> SearchOutcome {
        let dispatch = {
            let mut state = self.lock();
            let filters = state.filters.clone();
            self.begin(&mut state, filters, true)
        };
        self.run(dispatch).await
    }

    /// Re-issues the current request, bypassing the cache.
    pub async fn retry(&self) -> SearchOutcome {
        let dispatch = {
            let mut state = self.lock();
            let filters = state.filters.clone();
            self.begin(&mut state, filters, false)
        };
        self.run(dispatch).await
    }

    /// Replaces the filters and searches. The page resets to 1 unless the
    /// page is the only thing that changed. Invalid filters are rejected
    /// before anything is dispatched and leave the session untouched.
    pub async fn set_filters(&self, filters: SearchFilters) -> ServiceResult<SearchOutcome> {
        if let Err(err) = filters.validate() {
            log::debug!("Rejected search filters: {err}");
            return Err(ServiceError::from(err));
        }

        let dispatch = {
            let mut state = self.lock();
            let effective = if state.filters.differs_only_in_page(&filters) {
                filters
            } else {
                filters.with(FilterChange::Page(1))
            };
            self.begin(&mut state, effective, true)
        };

        Ok(self.run(dispatch).await)
    }

    /// Adopts `filters` as-is, page included, e.g. when a session is
    /// restored from a shared link.
    pub async fn restore(&self, filters: SearchFilters) -> ServiceResult<SearchOutcome> {
        filters.validate()?;

        let dispatch = {
            let mut state = self.lock();
            self.begin(&mut state, filters, true)
        };

        Ok(self.run(dispatch).await)
    }

    pub async fn apply(&self, change: FilterChange) -> ServiceResult<SearchOutcome> {
        let next = self.filters().with(change);
        self.set_filters(next).await
    }

    pub async fn go_to_page(&self, page: u32) -> ServiceResult<SearchOutcome> {
        self.apply(FilterChange::Page(page)).await
    }

    pub async fn set_sort(&self, sort_by: SortBy) -> ServiceResult<SearchOutcome> {
        self.apply(FilterChange::SortBy(sort_by)).await
    }

    pub async fn toggle_service_type(
        &self,
        service_type: ServiceType,
    ) -> ServiceResult<SearchOutcome> {
        let next = self.filters().toggle_service_type(service_type);
        self.set_filters(next).await
    }

    pub async fn toggle_certification(
        &self,
        certification: CertificationType,
    ) -> ServiceResult<SearchOutcome> {
        let next = self.filters().toggle_certification(certification);
        self.set_filters(next).await
    }

    pub async fn toggle_verified_only(&self) -> ServiceResult<SearchOutcome> {
        let next = self.filters().toggle_verified_only();
        self.set_filters(next).await
    }

    /// Drops every constraint and searches again from page 1.
    pub async fn clear_all(&self) -> SearchOutcome {
        let dispatch = {
            let mut state = self.lock();
            self.begin(&mut state, SearchFilters::default(), true)
        };
        self.run(dispatch).await
    }

    /// Snapshot of everything the results page renders.
    pub fn page_data(&self) -> SearchPageData {
        let state = self.lock();
        let status = &state.status;
        let result = status.result();

        let cards = result
            .map(|page| {
                page.data
                    .iter()
                    .map(|supplier| SupplierCard {
                        supplier: supplier.clone(),
                        is_saved: self.saved.is_saved(supplier.id),
                        save_pending: self.saved.is_pending(supplier.id),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let navigation = result.map_or_else(
            || PageNavigation::new(state.filters.page(), 1),
            PaginatedResult::navigation,
        );

        SearchPageData {
            filters: state.filters.clone(),
            phase: status.phase(),
            cards,
            meta: result.map(|page| page.meta.clone()),
            navigation,
            active_filter_count: query::active_count(&state.filters),
            error: status.error().map(ToString::to_string),
            retryable: status.error().is_some_and(ServiceError::is_retryable),
        }
    }

    fn begin(&self, state: &mut SessionState, filters: SearchFilters, use_cache: bool) -> Dispatch {
        if filters.page() != state.filters.page() {
            state.effects.push(ViewEffect::ScrollToTop);
        }
        state.filters = filters.clone();
        state.latest_request += 1;
        let request = state.latest_request;

        let cached = if use_cache {
            state.cache.get(&filters, Instant::now())
        } else {
            None
        };

        if let Some(page) = cached {
            log::debug!("Serving search #{request} from cache");
            let total = page.meta.total;
            self.saved.seed_from(&page.data);
            state.last_good = Some(page.clone());
            state.status = DiscoveryStatus::Success(page);
            return Dispatch::Done(SearchOutcome::Cached { total });
        }

        state.status = DiscoveryStatus::Loading {
            stale: state.last_good.clone(),
        };
        Dispatch::Fetch { request, filters }
    }

    async fn run(&self, dispatch: Dispatch) -> SearchOutcome {
        let (request, filters) = match dispatch {
            Dispatch::Done(outcome) => return outcome,
            Dispatch::Fetch { request, filters } => (request, filters),
        };

        let result = self.reader.search_suppliers(&filters).await;

        let mut state = self.lock();
        if state.latest_request != request {
            log::debug!(
                "Dropping response of search #{request}, latest is #{}",
                state.latest_request
            );
            return SearchOutcome::Superseded;
        }

        match result {
            Ok(page) => {
                let total = page.meta.total;
                self.saved.seed_from(&page.data);
                state.cache.insert(filters, page.clone(), Instant::now());
                state.last_good = Some(page.clone());
                state.status = DiscoveryStatus::Success(page);
                SearchOutcome::Loaded { total }
            }
            Err(err) => {
                let error = ServiceError::from(err);
                log::error!("Supplier search #{request} failed: {error}");
                state.status = DiscoveryStatus::Error {
                    error: error.clone(),
                    stale: state.last_good.clone(),
                };
                SearchOutcome::Failed(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::{mpsc, oneshot};

    use super::*;
    use crate::domain::types::{CompanyName, SupplierId};
    use crate::pagination::PageMeta;
    use crate::repository::errors::{RepositoryError, RepositoryResult};
    use crate::repository::mock::MockRepository;

    fn supplier(id: i32) -> Supplier {
        Supplier::new(
            SupplierId::new(id).unwrap(),
            CompanyName::new(format!("Supplier {id}")).unwrap(),
            ServiceType::Fabric,
        )
    }

    fn page(ids: &[i32], current_page: u32, total: u64) -> PaginatedResult<Supplier> {
        let data: Vec<Supplier> = ids.iter().copied().map(supplier).collect();
        let meta = PageMeta::for_page(current_page, 10, total, data.len());
        PaginatedResult::new(data, meta)
    }

    fn controller(repo: MockRepository) -> SupplierDiscoveryController<MockRepository> {
        SupplierDiscoveryController::new(Arc::new(repo), Arc::new(SavedStore::new()))
    }

    type Pending = (SearchFilters, oneshot::Sender<RepositoryResult<PaginatedResult<Supplier>>>);

    /// Reader whose responses are released by the test in any order.
    struct ScriptedReader {
        requests: mpsc::UnboundedSender<Pending>,
    }

    #[async_trait]
    impl SupplierReader for ScriptedReader {
        async fn search_suppliers(
            &self,
            filters: &SearchFilters,
        ) -> RepositoryResult<PaginatedResult<Supplier>> {
            let (reply, response) = oneshot::channel();
            self.requests
                .send((filters.clone(), reply))
                .map_err(|_| RepositoryError::Unexpected("test closed".into()))?;
            response
                .await
                .unwrap_or_else(|_| Err(RepositoryError::Unexpected("reply dropped".into())))
        }
    }

    #[tokio::test]
    async fn successful_load_moves_idle_to_success() {
        let mut repo = MockRepository::new();
        repo.expect_search_suppliers()
            .times(1)
            .returning(|_| Ok(page(&[1, 2], 1, 2)));
        let controller = controller(repo);
        assert_eq!(controller.status(), DiscoveryStatus::Idle);

        let outcome = controller.load().await;

        assert_eq!(outcome, SearchOutcome::Loaded { total: 2 });
        assert_eq!(controller.status().phase(), DiscoveryPhase::Success);
        assert_eq!(controller.page_data().cards.len(), 2);
    }

    #[tokio::test]
    async fn zero_total_is_empty_success_not_error() {
        let mut repo = MockRepository::new();
        repo.expect_search_suppliers()
            .returning(|_| Ok(PaginatedResult::empty()));
        let controller = controller(repo);

        controller.load().await;

        let data = controller.page_data();
        assert_eq!(data.phase, DiscoveryPhase::Empty);
        assert!(data.error.is_none());
        assert_eq!(data.navigation.last_page, 1);
    }

    #[tokio::test]
    async fn sort_change_on_page_five_requests_page_one() {
        let mut repo = MockRepository::new();
        repo.expect_search_suppliers()
            .withf(|filters| filters.page() == 5 && filters.sort_by() == SortBy::Relevance)
            .times(1)
            .returning(|_| Ok(page(&[41], 5, 41)));
        repo.expect_search_suppliers()
            .withf(|filters| filters.page() == 1 && filters.sort_by() == SortBy::Newest)
            .times(1)
            .returning(|_| Ok(page(&[1], 1, 41)));
        let controller = controller(repo);

        controller.go_to_page(5).await.unwrap();
        assert_eq!(controller.filters().page(), 5);

        controller.set_sort(SortBy::Newest).await.unwrap();
        assert_eq!(controller.filters().page(), 1);
        assert_eq!(controller.filters().sort_by(), SortBy::Newest);
    }

    #[tokio::test]
    async fn filter_change_resets_page_but_page_change_keeps_filters() {
        let mut repo = MockRepository::new();
        repo.expect_search_suppliers()
            .returning(|filters| Ok(page(&[1], filters.page(), 100)));
        let controller = controller(repo);

        controller.toggle_verified_only().await.unwrap();
        controller.go_to_page(3).await.unwrap();
        assert_eq!(controller.filters().page(), 3);
        assert_eq!(controller.filters().is_verified(), Some(true));

        controller
            .toggle_service_type(ServiceType::Cmt)
            .await
            .unwrap();
        assert_eq!(controller.filters().page(), 1);
        assert_eq!(controller.filters().is_verified(), Some(true));
    }

    #[tokio::test]
    async fn page_change_emits_scroll_to_top() {
        let mut repo = MockRepository::new();
        repo.expect_search_suppliers()
            .returning(|filters| Ok(page(&[1], filters.page(), 100)));
        let controller = controller(repo);

        controller.load().await;
        assert!(controller.take_effects().is_empty());

        controller.go_to_page(2).await.unwrap();
        assert_eq!(controller.take_effects(), vec![ViewEffect::ScrollToTop]);
        assert!(controller.take_effects().is_empty());
    }

    #[tokio::test]
    async fn restore_keeps_requested_page() {
        let mut repo = MockRepository::new();
        repo.expect_search_suppliers()
            .withf(|filters| filters.page() == 4 && filters.service_type() == Some(ServiceType::Cmt))
            .times(1)
            .returning(|_| Ok(page(&[31], 4, 40)));
        let controller = controller(repo);

        let filters = SearchFilters::default()
            .toggle_service_type(ServiceType::Cmt)
            .with(FilterChange::Page(4));
        controller.restore(filters).await.unwrap();

        assert_eq!(controller.filters().page(), 4);
        assert_eq!(controller.page_data().navigation.current_page, 4);
    }

    #[tokio::test]
    async fn invalid_moq_range_is_not_dispatched() {
        let mut repo = MockRepository::new();
        repo.expect_search_suppliers().times(0);
        let controller = controller(repo);

        let filters = SearchFilters::default()
            .with(FilterChange::MinMoq(Some(1000)))
            .with(FilterChange::MaxMoq(Some(10)));
        let result = controller.set_filters(filters).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert_eq!(controller.filters(), SearchFilters::default());
        assert_eq!(controller.status(), DiscoveryStatus::Idle);
    }

    #[tokio::test]
    async fn failure_keeps_last_good_result_and_retry_recovers() {
        let mut repo = MockRepository::new();
        let mut calls = 0;
        repo.expect_search_suppliers().times(3).returning(move |_| {
            calls += 1;
            match calls {
                2 => Err(RepositoryError::Timeout),
                _ => Ok(page(&[1, 2, 3], 1, 3)),
            }
        });
        let controller = controller(repo);

        controller.load().await;
        let outcome = controller.toggle_verified_only().await.unwrap();
        assert!(matches!(outcome, SearchOutcome::Failed(ServiceError::Network(_))));

        let data = controller.page_data();
        assert_eq!(data.phase, DiscoveryPhase::Error);
        assert!(data.retryable);
        assert_eq!(data.cards.len(), 3);

        assert_eq!(controller.retry().await, SearchOutcome::Loaded { total: 3 });
        assert_eq!(controller.status().phase(), DiscoveryPhase::Success);
    }

    #[tokio::test]
    async fn clear_all_resets_filters() {
        let mut repo = MockRepository::new();
        repo.expect_search_suppliers()
            .returning(|filters| Ok(page(&[1], filters.page(), 30)));
        let controller = controller(repo);

        controller
            .toggle_certification(CertificationType::Gots)
            .await
            .unwrap();
        controller.go_to_page(2).await.unwrap();
        controller.clear_all().await;

        assert_eq!(controller.filters(), SearchFilters::default());
        assert_eq!(controller.page_data().active_filter_count, 0);
    }

    #[tokio::test]
    async fn cached_page_is_served_without_request() {
        let mut repo = MockRepository::new();
        repo.expect_search_suppliers()
            .times(2)
            .returning(|filters| Ok(page(&[1], filters.page(), 30)));
        let config = DiscoveryConfig {
            cache_ttl_secs: 60,
            ..DiscoveryConfig::default()
        };
        let controller = SupplierDiscoveryController::from_config(
            Arc::new(repo),
            Arc::new(SavedStore::new()),
            &config,
        );

        controller.load().await;
        controller.go_to_page(2).await.unwrap();
        let back = controller.go_to_page(1).await.unwrap();

        assert_eq!(back, SearchOutcome::Cached { total: 30 });
        assert_eq!(controller.filters().page(), 1);
    }

    #[tokio::test]
    async fn stale_response_is_dropped() {
        let (requests, mut incoming) = mpsc::unbounded_channel();
        let controller = Arc::new(SupplierDiscoveryController::new(
            Arc::new(ScriptedReader { requests }),
            Arc::new(SavedStore::new()),
        ));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.toggle_service_type(ServiceType::Fabric).await }
        });
        let (_, first_reply) = incoming.recv().await.unwrap();

        let second = tokio::spawn({
            let controller = controller.clone();
            async move { controller.toggle_service_type(ServiceType::Cmt).await }
        });
        let (second_filters, second_reply) = incoming.recv().await.unwrap();
        assert_eq!(second_filters.service_type(), Some(ServiceType::Cmt));

        second_reply.send(Ok(page(&[2], 1, 1))).unwrap();
        assert_eq!(second.await.unwrap().unwrap(), SearchOutcome::Loaded { total: 1 });

        first_reply.send(Ok(page(&[1, 9], 1, 2))).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), SearchOutcome::Superseded);

        let status = controller.status();
        let ids: Vec<i32> = status
            .result()
            .unwrap()
            .data
            .iter()
            .map(|s| s.id.get())
            .collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(controller.filters().service_type(), Some(ServiceType::Cmt));
    }

    #[tokio::test]
    async fn retry_bypasses_fresh_cache_entry() {
        let mut repo = MockRepository::new();
        let mut calls = 0;
        repo.expect_search_suppliers().times(2).returning(move |_| {
            calls += 1;
            Ok(page(&[calls], 1, 1))
        });
        let config = DiscoveryConfig {
            cache_ttl_secs: 60,
            ..DiscoveryConfig::default()
        };
        let controller = SupplierDiscoveryController::from_config(
            Arc::new(repo),
            Arc::new(SavedStore::new()),
            &config,
        );

        assert_eq!(controller.load().await, SearchOutcome::Loaded { total: 1 });
        assert_eq!(controller.load().await, SearchOutcome::Cached { total: 1 });
        assert_eq!(controller.retry().await, SearchOutcome::Loaded { total: 1 });

        let status = controller.status();
        assert_eq!(status.result().unwrap().data[0].id.get(), 2);
        assert_eq!(controller.load().await, SearchOutcome::Cached { total: 1 });
    }

    #[tokio::test]
    async fn superseded_failure_keeps_newer_success() {
        let (requests, mut incoming) = mpsc::unbounded_channel();
        let controller = Arc::new(SupplierDiscoveryController::new(
            Arc::new(ScriptedReader { requests }),
            Arc::new(SavedStore::new()),
        ));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.toggle_verified_only().await }
        });
        let (_, first_reply) = incoming.recv().await.unwrap();

        let second = tokio::spawn({
            let controller = controller.clone();
            async move { controller.set_sort(SortBy::Newest).await }
        });
        let (_, second_reply) = incoming.recv().await.unwrap();
        second_reply.send(Ok(page(&[4, 5], 1, 2))).unwrap();
        assert_eq!(second.await.unwrap().unwrap(), SearchOutcome::Loaded { total: 2 });

        first_reply
            .send(Err(RepositoryError::Network("connection reset".into())))
            .unwrap();
        assert_eq!(first.await.unwrap().unwrap(), SearchOutcome::Superseded);

        let data = controller.page_data();
        assert_eq!(data.phase, DiscoveryPhase::Success);
        assert_eq!(data.error, None);
        assert_eq!(data.cards.len(), 2);
    }

    #[tokio::test]
    async fn loading_exposes_previous_result_as_stale() {
        let (requests, mut incoming) = mpsc::unbounded_channel();
        let controller = Arc::new(SupplierDiscoveryController::new(
            Arc::new(ScriptedReader { requests }),
            Arc::new(SavedStore::new()),
        ));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.load().await }
        });
        let (_, reply) = incoming.recv().await.unwrap();
        reply.send(Ok(page(&[1], 1, 1))).unwrap();
        first.await.unwrap();

        let second = tokio::spawn({
            let controller = controller.clone();
            async move { controller.go_to_page(2).await }
        });
        let (_, reply) = incoming.recv().await.unwrap();

        let status = controller.status();
        assert!(status.is_loading());
        assert_eq!(status.result().map(|p| p.data.len()), Some(1));

        reply
            .send(Err(RepositoryError::Network("offline".into())))
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), second)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(controller.status().phase(), DiscoveryPhase::Error);
    }

    #[tokio::test]
    async fn results_seed_saved_store() {
        let mut repo = MockRepository::new();
        repo.expect_search_suppliers().returning(|_| {
            let mut result = page(&[1, 2], 1, 2);
            result.data[1].is_saved = true;
            Ok(result)
        });
        let controller = controller(repo);

        controller.load().await;

        let cards = controller.page_data().cards;
        assert!(!cards[0].is_saved);
        assert!(cards[1].is_saved);
        assert!(controller.saved_store().is_saved(SupplierId::new(2).unwrap()));
    }
}
