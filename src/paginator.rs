// Paginator - splits an ordered result set into fixed-size pages
//
// The page size is handed in at construction, so the same Paginator is
// shared by every list handler through the application state.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: usize,
}

/// Where a requested page sits inside a result set of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLocation {
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total_count: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
    pub start_index: usize,
    pub end_index: usize,
}

impl Paginator {
    /// `per_page` of zero is bumped to one; the configuration layer rejects it
    /// before it gets here.
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn num_pages(&self, total: usize) -> usize {
        total.div_ceil(self.per_page)
    }

    /// Resolve the raw `page` query value against `total` items.
    ///
    /// Anything that is not a positive integer means page 1. A number past
    /// the end is clamped to the last page.
    pub fn locate(&self, total: usize, requested: Option<&str>) -> PageLocation {
        let num_pages = self.num_pages(total);
        let number = match parse_page_number(requested) {
            Some(n) if n > num_pages => num_pages.max(1),
            Some(n) => n,
            None => 1,
        };

        let offset = (number - 1) * self.per_page;
        let limit = total.saturating_sub(offset).min(self.per_page);

        PageLocation {
            number,
            num_pages,
            per_page: self.per_page,
            total,
            offset,
            limit,
        }
    }

    /// Paginate an in-memory sequence.
    pub fn paginate<T>(&self, items: Vec<T>, requested: Option<&str>) -> Page<T> {
        let location = self.locate(items.len(), requested);
        let window = items
            .into_iter()
            .skip(location.offset)
            .take(location.limit)
            .collect();
        Page::from_window(window, location)
    }
}

impl<T> Page<T> {
    /// Wrap the items of an already-fetched window.
    pub fn from_window(items: Vec<T>, location: PageLocation) -> Self {
        let has_next = location.number < location.num_pages;
        let has_previous = location.number > 1;
        let (start_index, end_index) = if items.is_empty() {
            (0, 0)
        } else {
            (location.offset + 1, location.offset + items.len())
        };

        Self {
            items,
            number: location.number,
            num_pages: location.num_pages,
            per_page: location.per_page,
            total_count: location.total,
            has_next,
            has_previous,
            next_page_number: has_next.then_some(location.number + 1),
            previous_page_number: has_previous.then_some(location.number - 1),
            start_index,
            end_index,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn parse_page_number(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}
