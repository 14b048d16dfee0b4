use serde::{Deserialize, Serialize, Serializer};

/// Up to this many pages are rendered without any ellipsis.
const MAX_PAGES_WITHOUT_ELLIPSIS: u32 = 7;

/// One slot of the rendered page list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl Serialize for PageItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageItem::Page(page) => serializer.serialize_u32(*page),
            PageItem::Ellipsis => serializer.serialize_str("ellipsis"),
        }
    }
}

/// Page sequence to render for `current_page` out of `last_page`.
pub fn plan(current_page: u32, last_page: u32) -> Vec<PageItem> {
    let last_page = last_page.max(1);

    if last_page <= MAX_PAGES_WITHOUT_ELLIPSIS {
        return (1..=last_page).map(PageItem::Page).collect();
    }

    let mut pages = vec![PageItem::Page(1)];

    if current_page > 3 {
        pages.push(PageItem::Ellipsis);
    }

    let window_start = current_page.saturating_sub(1).max(2);
    let window_end = current_page.saturating_add(1).min(last_page - 1);
    pages.extend((window_start..=window_end).map(PageItem::Page));

    if current_page.saturating_add(2) < last_page {
        pages.push(PageItem::Ellipsis);
    }

    pages.push(PageItem::Page(last_page));
    pages
}

/// Everything a pager widget needs to render.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PageNavigation {
    pub items: Vec<PageItem>,
    pub current_page: u32,
    pub last_page: u32,
    pub has_prev: bool,
    pub has_next: bool,
    pub has_first: bool,
    pub has_last: bool,
}

impl PageNavigation {
    pub fn new(current_page: u32, last_page: u32) -> Self {
        let current_page = current_page.max(1);
        let last_page = last_page.max(1);
        let has_prev = current_page > 1;
        let has_next = current_page < last_page;

        Self {
            items: plan(current_page, last_page),
            current_page,
            last_page,
            has_prev,
            has_next,
            has_first: has_prev,
            has_last: has_next,
        }
    }

    pub fn prev_page(&self) -> Option<u32> {
        self.has_prev.then(|| self.current_page - 1)
    }

    pub fn next_page(&self) -> Option<u32> {
        self.has_next.then(|| self.current_page + 1)
    }
}

/// Pagination metadata reported alongside a result page.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub total: u64,
    #[serde(default)]
    pub from: Option<u64>,
    #[serde(default)]
    pub to: Option<u64>,
}

impl PageMeta {
    /// Computes metadata for `current_page` with `items_on_page` rows out of `total`.
    pub fn for_page(current_page: u32, per_page: u32, total: u64, items_on_page: usize) -> Self {
        let current_page = current_page.max(1);
        let per_page = u64::from(per_page.max(1));
        let last_page = u32::try_from(total.div_ceil(per_page).max(1)).unwrap_or(u32::MAX);

        let (from, to) = if items_on_page == 0 {
            (None, None)
        } else {
            let from = u64::from(current_page - 1) * per_page + 1;
            (Some(from), Some(from + items_on_page as u64 - 1))
        };

        Self {
            current_page,
            last_page,
            total,
            from,
            to,
        }
    }

    /// Restores `last_page >= 1` and `current_page >= 1` on metadata from the wire.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.last_page = self.last_page.max(1);
        self.current_page = self.current_page.max(1);
        self
    }
}

/// One page of results together with its metadata.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, meta: PageMeta) -> Self {
        Self {
            data,
            meta: meta.normalized(),
        }
    }

    /// Empty single page.
    pub fn empty() -> Self {
        Self::new(Vec::new(), PageMeta::for_page(1, 1, 0, 0))
    }

    pub fn is_empty(&self) -> bool {
        self.meta.total == 0
    }

    pub fn navigation(&self) -> PageNavigation {
        PageNavigation::new(self.meta.current_page, self.meta.last_page)
    }
}
