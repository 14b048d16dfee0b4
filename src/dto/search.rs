//! DTOs shaped for the supplier search page.

use serde::Serialize;

use crate::domain::filters::SearchFilters;
use crate::domain::supplier::Supplier;
use crate::pagination::{PageMeta, PageNavigation};

/// Coarse state of a discovery session, for choosing what to render.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryPhase {
    Idle,
    Loading,
    Success,
    /// Successful search with `total == 0`.
    Empty,
    Error,
}

/// One supplier card with the canonical saved flag at render time.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SupplierCard {
    pub supplier: Supplier,
    pub is_saved: bool,
    /// A save/unsave mutation is still in flight.
    pub save_pending: bool,
}

/// Aggregated data required to render the search results page.
#[derive(Clone, Debug, Serialize)]
pub struct SearchPageData {
    pub filters: SearchFilters,
    pub phase: DiscoveryPhase,
    /// Cards of the current page, or of the last good page while loading or
    /// after an error.
    pub cards: Vec<SupplierCard>,
    pub meta: Option<PageMeta>,
    pub navigation: PageNavigation,
    pub active_filter_count: usize,
    pub error: Option<String>,
    pub retryable: bool,
}
