//! Short-lived cache of result pages keyed by the exact search criteria.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::domain::filters::SearchFilters;
use crate::domain::supplier::Supplier;
use crate::pagination::PaginatedResult;

#[derive(Debug)]
struct CachedPage {
    fetched_at: Instant,
    page: PaginatedResult<Supplier>,
}

#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    capacity: usize,
    pages: HashMap<SearchFilters, CachedPage>,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            pages: HashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 0)
    }

    fn enabled(&self) -> bool {
        !self.ttl.is_zero() && self.capacity > 0
    }

    pub fn get(&mut self, filters: &SearchFilters, now: Instant) -> Option<PaginatedResult<Supplier>> {
        if !self.enabled() {
            return None;
        }
        let fresh = self
            .pages
            .get(filters)
            .is_some_and(|cached| now.duration_since(cached.fetched_at) < self.ttl);
        if !fresh {
            self.pages.remove(filters);
            return None;
        }
        self.pages.get(filters).map(|cached| cached.page.clone())
    }

    pub fn insert(&mut self, filters: SearchFilters, page: PaginatedResult<Supplier>, now: Instant) {
        if !self.enabled() {
            return;
        }
        let ttl = self.ttl;
        self.pages
            .retain(|_, cached| now.duration_since(cached.fetched_at) < ttl);

        if self.pages.len() >= self.capacity && !self.pages.contains_key(&filters) {
            let oldest = self
                .pages
                .iter()
                .min_by_key(|(_, cached)| cached.fetched_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                self.pages.remove(&oldest);
            }
        }

        self.pages.insert(
            filters,
            CachedPage {
                fetched_at: now,
                page,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
