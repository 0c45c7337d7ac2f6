//! # Product Picker
//!
//! Pagination plus search overlay for picking products on long lists.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  GET /products?page=1 ──► load_page ──┐                                 │
//! │  GET /products?page=2 ──► load_page ──┤  loaded (load order)            │
//! │                                       │                                 │
//! │  user types "tea"                     │                                 │
//! │  GET /products?q=tea ──► apply_search ┤  search results for "tea"       │
//! │                                       ▼                                 │
//! │                          visible("tea")                                 │
//! │                          = search results                               │
//! │                          + loaded items matching "tea"                  │
//! │                          (dedup by id, first occurrence wins)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A product that lives on a page not yet loaded still shows up once the
//! server search returns it.
//!
//! The server only hands out [`Page`]s (`GET /products`) and search hits
//! (`GET /products?q=`). [`Picker`] is the merge a picker client runs over
//! them; [`Page`] and [`PageRequest`] reach the frontend through ts-rs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Product;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Page
// =============================================================================

/// One page of a server-side list.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total rows across all pages.
    pub total: u64,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        (self.page as u64) * (self.page_size as u64) < self.total
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Page request as it arrives in a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PageRequest {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        PageRequest { page, page_size }
    }

    /// Page at least 1, page size within `[1, max_page_size]`.
    pub fn clamped(self, max_page_size: u32) -> Self {
        PageRequest {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, max_page_size.clamp(1, MAX_PAGE_SIZE)),
        }
    }

    /// Row offset for SQL `OFFSET`.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.page_size as u64
    }

    pub fn limit(&self) -> u64 {
        self.page_size as u64
    }
}

// =============================================================================
// Picker
// =============================================================================

/// Something the picker can deduplicate and filter.
pub trait Pickable: Clone {
    fn pick_id(&self) -> &str;
    fn matches(&self, query: &str) -> bool;
}

impl Pickable for Product {
    fn pick_id(&self) -> &str {
        &self.id
    }

    fn matches(&self, query: &str) -> bool {
        self.matches_query(query)
    }
}

#[derive(Debug, Clone)]
struct SearchResults<T> {
    query: String,
    items: Vec<T>,
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Accumulates loaded pages and the latest search results.
#[derive(Debug, Clone)]
pub struct Picker<T> {
    loaded: Vec<T>,
    /// Paging metadata of the latest page; `items` stays empty.
    last_page: Option<Page<()>>,
    search: Option<SearchResults<T>>,
}

pub type ProductPicker = Picker<Product>;

impl<T> Default for Picker<T> {
    fn default() -> Self {
        Picker {
            loaded: Vec::new(),
            last_page: None,
            search: None,
        }
    }
}

impl<T: Pickable> Picker<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a server page.
    pub fn load_page(&mut self, page: Page<T>) {
        let Page {
            items,
            total,
            page,
            page_size,
        } = page;
        self.loaded.extend(items);
        self.last_page = Some(Page {
            items: Vec::new(),
            total,
            page,
            page_size,
        });
    }

    /// Stores the server search results for `query`, replacing earlier ones.
    pub fn apply_search(&mut self, query: &str, results: Vec<T>) {
        self.search = Some(SearchResults {
            query: normalize(query),
            items: results,
        });
    }

    /// Items to show for `query`.
    ///
    /// Search results only count when they were fetched for the same query.
    pub fn visible(&self, query: &str) -> Vec<T> {
        let query = normalize(query);
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();

        let mut push = |item: &T, out: &mut Vec<T>| {
            if seen.insert(item.pick_id().to_string()) {
                out.push(item.clone());
            }
        };

        if query.is_empty() {
            for item in &self.loaded {
                push(item, &mut out);
            }
            return out;
        }

        if let Some(search) = self.search.as_ref().filter(|s| s.query == query) {
            for item in &search.items {
                push(item, &mut out);
            }
        }
        for item in self.loaded.iter().filter(|item| item.matches(&query)) {
            push(item, &mut out);
        }
        out
    }

    /// True until a page reports the end of the list.
    pub fn has_more(&self) -> bool {
        self.last_page.as_ref().map_or(true, Page::has_more)
    }

    /// Page number to request next.
    pub fn next_page(&self) -> u32 {
        self.last_page.as_ref().map_or(1, |last| last.page + 1)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn reset(&mut self) {
        self.loaded.clear();
        self.last_page = None;
        self.search = None;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        name: &'static str,
    }

    impl Pickable for Item {
        fn pick_id(&self) -> &str {
            self.id
        }

        fn matches(&self, query: &str) -> bool {
            self.name.to_lowercase().contains(query)
        }
    }

    fn item(id: &'static str, name: &'static str) -> Item {
        Item { id, name }
    }

    fn page(n: u32, items: Vec<Item>, total: u64) -> Page<Item> {
        Page {
            items,
            total,
            page: n,
            page_size: 2,
        }
    }

    fn ids(items: &[Item]) -> Vec<&'static str> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_page_request_clamps() {
        let req = PageRequest::new(0, 0).clamped(50);
        assert_eq!(req, PageRequest::new(1, 1));
        assert_eq!(PageRequest::new(3, 500).clamped(50), PageRequest::new(3, 50));
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_page_has_more() {
        assert!(page(1, vec![], 5).has_more());
        assert!(page(2, vec![], 5).has_more());
        assert!(!page(3, vec![], 5).has_more());
        assert!(!page(1, vec![], 0).has_more());
    }

    #[test]
    fn test_empty_query_shows_loaded_in_order() {
        let mut picker = Picker::new();
        assert!(picker.has_more());
        assert_eq!(picker.next_page(), 1);

        picker.load_page(page(1, vec![item("a", "Apple"), item("b", "Banana")], 3));
        picker.load_page(page(2, vec![item("b", "Banana"), item("c", "Cherry")], 3));

        assert_eq!(ids(&picker.visible("")), vec!["a", "b", "c"]);
        assert_eq!(ids(&picker.visible("   ")), vec!["a", "b", "c"]);
        assert!(!picker.has_more());
        assert_eq!(picker.next_page(), 3);
    }

    #[test]
    fn test_search_results_come_first_then_local_matches() {
        let mut picker = Picker::new();
        picker.load_page(page(1, vec![item("a", "Green Tea"), item("b", "Coffee")], 10));
        picker.apply_search("Tea", vec![item("z", "Black Tea"), item("a", "Green Tea")]);

        assert_eq!(ids(&picker.visible("tea")), vec!["z", "a"]);
        assert_eq!(ids(&picker.visible("coffee")), vec!["b"]);
    }

    #[test]
    fn test_stale_search_is_ignored() {
        let mut picker = Picker::new();
        picker.load_page(page(1, vec![item("a", "Green Tea")], 1));
        picker.apply_search("tea", vec![item("z", "Black Tea")]);

        assert_eq!(ids(&picker.visible("green")), vec!["a"]);
    }

    #[test]
    fn test_reset() {
        let mut picker = Picker::new();
        picker.load_page(page(1, vec![item("a", "Apple")], 1));
        picker.apply_search("apple", vec![item("a", "Apple")]);
        picker.reset();

        assert_eq!(picker.loaded_count(), 0);
        assert!(picker.visible("apple").is_empty());
        assert!(picker.has_more());
        assert_eq!(picker.next_page(), 1);
    }

    #[test]
    fn test_picker_has_more_follows_last_page() {
        let mut picker = Picker::new();
        let first = page(1, vec![item("a", "Apple"), item("b", "Banana")], 4);
        assert!(first.has_more());
        picker.load_page(first);
        assert!(picker.has_more());

        let last = page(2, vec![item("c", "Cherry"), item("d", "Date")], 4);
        assert!(!last.has_more());
        picker.load_page(last);
        assert!(!picker.has_more());
        assert_eq!(picker.loaded_count(), 4);
    }

    #[test]
    fn test_product_picker_finds_unloaded_product_by_sku() {
        use crate::types::ProductInput;
        use chrono::Utc;

        let product = |id: &str, name: &str| {
            let input = ProductInput {
                sku: format!("SKU-{}", id),
                name: name.to_string(),
                category: "Drinks".to_string(),
                description: None,
                unit: None,
                opening_stock: 0,
                reorder_point: 0,
                purchase_price: None,
                sell_price: None,
                status: None,
            };
            Product::from_input(id.to_string(), &input, Utc::now()).unwrap()
        };

        let mut picker = ProductPicker::new();
        picker.load_page(Page {
            items: vec![product("1", "Green Tea")],
            total: 40,
            page: 1,
            page_size: 1,
        });
        picker.apply_search("sku-9", vec![product("9", "Lemon Soda")]);

        let names: Vec<String> = picker.visible("SKU-9").into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Lemon Soda"]);
        assert_eq!(picker.visible("drinks").len(), 1);
        assert!(picker.has_more());
    }
}
