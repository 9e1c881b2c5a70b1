//! # Product Search Collaborator
//!
//! The catalog controller reaches products only through [`ProductSearch`].
//!
//! ## Request / Response Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SearchRequest                         SearchPage                       │
//! │  ─────────────                         ──────────                       │
//! │  search_term  "lamp"       ──────►     items  ≤ limit products          │
//! │  category     "all" | name             total  matches before paging     │
//! │  sort         price-asc | price-desc | rating                           │
//! │  limit        page size (clamped to 100)                                │
//! │  offset       page_index × page size                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use storefront_core::{ProductSummary, SortKey, ALL_CATEGORIES, MAX_SEARCH_LIMIT};

use crate::error::SearchError;

/// One page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search_term: String,
    pub category: String,
    pub sort: SortKey,
    pub limit: u32,
    pub offset: u64,
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub items: Vec<ProductSummary>,
    /// Number of products matching the filter, across all pages.
    pub total: u64,
}

/// The paginated product-search endpoint.
#[async_trait]
pub trait ProductSearch: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError>;
}

/// A product search over a fixed list, filtering and ordering the way the
/// storefront's product endpoint does.
///
/// ## Semantics
/// - `category` other than `"all"` must match exactly
/// - `search_term` matches name or description, case-insensitively
/// - price ascending / price descending / rating descending
/// - `limit` is clamped to 100
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductSearch {
    products: Vec<ProductSummary>,
}

impl InMemoryProductSearch {
    pub fn new(products: Vec<ProductSummary>) -> Self {
        InMemoryProductSearch { products }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn matches(product: &ProductSummary, request: &SearchRequest, needle: &str) -> bool {
        if request.category != ALL_CATEGORIES && product.category != request.category {
            return false;
        }
        needle.is_empty()
            || product.name.to_lowercase().contains(needle)
            || product.description.to_lowercase().contains(needle)
    }

    fn compare(sort: SortKey, a: &ProductSummary, b: &ProductSummary) -> Ordering {
        match sort {
            SortKey::PriceAsc => a.price.cmp(&b.price),
            SortKey::PriceDesc => b.price.cmp(&a.price),
            SortKey::Rating => b.rating.total_cmp(&a.rating),
        }
    }
}

#[async_trait]
impl ProductSearch for InMemoryProductSearch {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, SearchError> {
        let needle = request.search_term.trim().to_lowercase();
        let limit = request.limit.min(MAX_SEARCH_LIMIT) as usize;

        let mut matching: Vec<&ProductSummary> = self
            .products
            .iter()
            .filter(|p| Self::matches(p, request, &needle))
            .collect();
        matching.sort_by(|a, b| Self::compare(request.sort, a, b));

        let total = matching.len() as u64;
        let offset = usize::try_from(request.offset).unwrap_or(usize::MAX);
        let items: Vec<ProductSummary> = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        debug!(
            term = %needle,
            category = %request.category,
            sort = %request.sort,
            offset = request.offset,
            returned = items.len(),
            total,
            "in-memory product search"
        );

        Ok(SearchPage { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::Money;

    fn product(id: i64, name: &str, category: &str, cents: i64, rating: f64) -> ProductSummary {
        ProductSummary {
            id,
            slug: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            description: format!("A fine {}", category),
            price: Money::from_cents(cents),
            images: Vec::new(),
            image: None,
            category: category.to_string(),
            rating,
            review_count: 0,
            stock: 10,
        }
    }

    fn catalog() -> InMemoryProductSearch {
        InMemoryProductSearch::new(vec![
            product(1, "Desk Lamp", "lighting", 3000, 4.1),
            product(2, "Floor Lamp", "lighting", 8000, 4.8),
            product(3, "Oak Desk", "furniture", 25000, 3.9),
            product(4, "Wool Rug", "textiles", 12000, 4.5),
        ])
    }

    fn request(term: &str, category: &str, sort: SortKey) -> SearchRequest {
        SearchRequest {
            search_term: term.to_string(),
            category: category.to_string(),
            sort,
            limit: 52,
            offset: 0,
        }
    }

    #[tokio::test]
    async fn test_filters_by_category_and_term() {
        let search = catalog();

        let page = search
            .search(&request("", "lighting", SortKey::PriceAsc))
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let page = search
            .search(&request("DESK", ALL_CATEGORIES, SortKey::PriceAsc))
            .await
            .unwrap();
        let ids: Vec<i64> = page.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);

        // description matches too
        let page = search
            .search(&request("textiles", ALL_CATEGORIES, SortKey::PriceAsc))
            .await
            .unwrap();
        assert_eq!(page.items[0].id, 4);
    }

    #[tokio::test]
    async fn test_ordering() {
        let search = catalog();

        let page = search
            .search(&request("", ALL_CATEGORIES, SortKey::PriceDesc))
            .await
            .unwrap();
        assert_eq!(page.items[0].id, 3);

        let page = search
            .search(&request("", ALL_CATEGORIES, SortKey::Rating))
            .await
            .unwrap();
        assert_eq!(page.items[0].id, 2);
    }

    #[tokio::test]
    async fn test_paging_and_limit_clamp() {
        let search = catalog();
        let mut req = request("", ALL_CATEGORIES, SortKey::PriceAsc);
        req.limit = 3;
        req.offset = 3;

        let page = search.search(&req).await.unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.items.len(), 1);

        req.offset = 40;
        assert!(search.search(&req).await.unwrap().items.is_empty());

        let many: Vec<ProductSummary> = (0..150)
            .map(|i| product(i, "Item", "misc", i, 0.0))
            .collect();
        let mut req = request("", ALL_CATEGORIES, SortKey::PriceAsc);
        req.limit = 500;
        let page = InMemoryProductSearch::new(many).search(&req).await.unwrap();
        assert_eq!(page.items.len(), MAX_SEARCH_LIMIT as usize);
        assert_eq!(page.total, 150);
    }
}
