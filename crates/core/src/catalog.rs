//! Catalog listing query: filter, search, sort order, and pagination.
//!
//! The storefront only ever lists products that are in stock; that rule lives
//! in the repository query. This module holds the pieces that do not need a
//! database: parsing the client's choices and shaping the result page.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Slug;

/// Product sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    /// Catalog order (primary key ascending).
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    TitleAsc,
    TitleDesc,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown sort order '{0}'")]
pub struct ParseSortError(String);

impl ProductSort {
    /// `ORDER BY` clause for a query that aliases the product table as `p`.
    ///
    /// Always ends with the primary key so pages never overlap when values tie.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Default => "p.id ASC",
            Self::PriceAsc => "p.price ASC, p.id ASC",
            Self::PriceDesc => "p.price DESC, p.id ASC",
            Self::TitleAsc => "p.title ASC, p.id ASC",
            Self::TitleDesc => "p.title DESC, p.id ASC",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::TitleAsc => "title_asc",
            Self::TitleDesc => "title_desc",
        }
    }
}

impl FromStr for ProductSort {
    type Err = ParseSortError;

    /// Accepts the named orders plus the `ordering=price` / `ordering=-price`
    /// style older frontends send.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "default" => Ok(Self::Default),
            "price_asc" | "price" => Ok(Self::PriceAsc),
            "price_desc" | "-price" => Ok(Self::PriceDesc),
            "title_asc" | "title" => Ok(Self::TitleAsc),
            "title_desc" | "-title" => Ok(Self::TitleDesc),
            other => Err(ParseSortError(other.to_owned())),
        }
    }
}

impl fmt::Display for ProductSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to list: an optional category, an optional search term, and an order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<Slug>,
    pub search: Option<String>,
    pub sort: ProductSort,
}

impl ProductQuery {
    /// `ILIKE` pattern for the search term, or `None` when there is nothing to
    /// search for.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern)
    }
}

/// Wrap a term in `%…%`, escaping the `LIKE` metacharacters so the term is
/// matched literally. Pairs with the default `\` escape character.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// A 1-based page number and a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Page `0` is treated as page `1`; a zero page size as `1`.
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

/// One page of results plus the numbers a pager needs.
///
/// A page past the end has no items but still reports the real totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        let size = u64::from(request.page_size);
        let total_pages = u32::try_from(total_count.div_ceil(size).max(1)).unwrap_or(u32::MAX);

        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_count,
            total_pages,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parse() {
        assert_eq!("".parse::<ProductSort>().unwrap(), ProductSort::Default);
        assert_eq!("price_asc".parse::<ProductSort>().unwrap(), ProductSort::PriceAsc);
        assert_eq!("-price".parse::<ProductSort>().unwrap(), ProductSort::PriceDesc);
        assert_eq!("title".parse::<ProductSort>().unwrap(), ProductSort::TitleAsc);
        assert!("popularity".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_order_by_breaks_ties_on_id() {
        for sort in [
            ProductSort::Default,
            ProductSort::PriceAsc,
            ProductSort::PriceDesc,
            ProductSort::TitleAsc,
            ProductSort::TitleDesc,
        ] {
            assert!(sort.order_by().contains("p.id ASC"), "{sort}");
        }
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("pika"), "%pika%");
        assert_eq!(like_pattern("100%_\\"), "%100\\%\\_\\\\%");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = ProductQuery {
            search: Some("   ".into()),
            ..ProductQuery::default()
        };
        assert_eq!(query.search_pattern(), None);

        let query = ProductQuery {
            search: Some(" Funko ".into()),
            ..ProductQuery::default()
        };
        assert_eq!(query.search_pattern().as_deref(), Some("%Funko%"));
    }

    #[test]
    fn test_page_request_normalizes_zero() {
        let request = PageRequest::new(0, 6);
        assert_eq!(request.page(), 1);
        assert_eq!(request.offset(), 0);

        let request = PageRequest::new(3, 6);
        assert_eq!(request.offset(), 12);
        assert_eq!(request.limit(), 6);
    }

    #[test]
    fn test_page_metadata() {
        let page = Page::new(vec![1, 2, 3, 4, 5, 6], PageRequest::new(1, 6), 13);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(!page.has_prev);

        let last = Page::new(vec![13], PageRequest::new(3, 6), 13);
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn test_out_of_range_page_is_empty_not_error() {
        let page: Page<i32> = Page::new(Vec::new(), PageRequest::new(9, 6), 13);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn test_empty_catalog_has_one_page() {
        let page: Page<i32> = Page::new(Vec::new(), PageRequest::new(1, 6), 0);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2], PageRequest::new(2, 2), 4).map(|n| n * 10);
        assert_eq!(page.items, [10, 20]);
        assert!(page.has_prev);
    }
}
