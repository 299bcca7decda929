//! Page-number pagination with a forgiving page-selection policy.

use serde::Serialize;

/// Splits a result set of `total` items into fixed-size pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u64,
    total: u64,
}

impl Paginator {
    pub fn new(total: u64, per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
            total,
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of pages. An empty result set still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    /// Resolve a raw `page` parameter to a valid page number.
    ///
    /// Missing, empty or non-numeric input selects the first page; a number
    /// below 1 or past the end selects the last page.
    pub fn resolve(&self, raw: Option<&str>) -> u64 {
        let raw = match raw.map(str::trim) {
            None | Some("") => return 1,
            Some(raw) => raw,
        };

        match raw.parse::<i64>() {
            Err(_) => 1,
            Ok(n) if n < 1 => self.num_pages(),
            Ok(n) => (n as u64).min(self.num_pages()),
        }
    }

    /// Row offset of the given (already resolved) page.
    pub fn offset(&self, number: u64) -> u64 {
        number.saturating_sub(1) * self.per_page
    }

    pub fn page<T>(&self, number: u64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(),
            total: self.total,
            per_page: self.per_page,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_pages() {
        assert_eq!(Paginator::new(0, 3).num_pages(), 1);
        assert_eq!(Paginator::new(3, 3).num_pages(), 1);
        assert_eq!(Paginator::new(4, 3).num_pages(), 2);
        assert_eq!(Paginator::new(7, 3).num_pages(), 3);
    }

    #[test]
    fn test_resolve_policy() {
        let paginator = Paginator::new(7, 3);
        assert_eq!(paginator.resolve(None), 1);
        assert_eq!(paginator.resolve(Some("")), 1);
        assert_eq!(paginator.resolve(Some("abc")), 1);
        assert_eq!(paginator.resolve(Some("2")), 2);
        assert_eq!(paginator.resolve(Some(" 3 ")), 3);
        assert_eq!(paginator.resolve(Some("9999")), 3);
        assert_eq!(paginator.resolve(Some("0")), 3);
        assert_eq!(paginator.resolve(Some("-1")), 3);
    }

    #[test]
    fn test_offsets_and_neighbours() {
        let paginator = Paginator::new(7, 3);
        assert_eq!(paginator.offset(1), 0);
        assert_eq!(paginator.offset(3), 6);

        let page = paginator.page(2, vec!["d", "e", "f"]);
        assert_eq!(page.previous_page_number(), Some(1));
        assert_eq!(page.next_page_number(), Some(3));

        let last = paginator.page(3, vec!["g"]);
        assert!(!last.has_next());
        assert_eq!(last.next_page_number(), None);
        assert_eq!(last.items, vec!["g"]);
    }
}
