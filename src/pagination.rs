//! Page-number pagination over ordered listings.
//!
//! Listings resolve a [`PageWindow`] from the total row count and the raw
//! `?page=` value, fetch only that window with `LIMIT`/`OFFSET`, then wrap
//! the rows in a [`Page`] for the templates.

use serde::{Deserialize, Serialize};

/// Query string of every paginated listing.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// The slice of a listing a request asked for, clamped to what exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub per_page: u64,
    pub total: u64,
}

pub fn num_pages(total: u64, per_page: u64) -> u64 {
    let per_page = per_page.max(1);
    // An empty listing still has one (empty) page.
    if total == 0 {
        1
    } else {
        total.div_ceil(per_page)
    }
}

impl PageWindow {
    /// Missing or non-numeric page values fall back to page 1; numbers
    /// outside `1..=num_pages` fall back to the last page.
    pub fn resolve(total: u64, per_page: u64, requested: Option<&str>) -> Self {
        let per_page = per_page.max(1);
        let num_pages = num_pages(total, per_page);
        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n < 1 || n as u64 > num_pages => num_pages,
            Some(Ok(n)) => n as u64,
        };

        Self {
            number,
            num_pages,
            per_page,
            total,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

/// A page of results plus the metadata listing templates need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(window: PageWindow, items: Vec<T>) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total: window.total,
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_next() || self.has_previous()
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
