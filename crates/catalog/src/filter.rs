//! Catalog query filters and pagination.

use serde::{Deserialize, Serialize};

use bazaar_core::CategoryId;

use crate::product::Product;

/// Filter for catalog-visible product queries.
///
/// Approval filtering is applied by the caller (the store only ever returns
/// approved listings for these queries); this struct covers the remaining
/// axes: substring search, category, featured flag and stock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring match against name or description.
    pub query: Option<String>,
    pub category: Option<CategoryId>,
    pub featured_only: bool,
    pub in_stock_only: bool,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if self.featured_only && !product.is_featured {
            return false;
        }
        if self.in_stock_only && !product.is_in_stock() {
            return false;
        }
        if let Some(category) = self.category {
            if product.category != category {
                return false;
            }
        }
        if let Some(q) = &self.query {
            let q = q.to_lowercase();
            if !q.is_empty()
                && !product.name.to_lowercase().contains(&q)
                && !product.description.to_lowercase().contains(&q)
            {
                return false;
            }
        }
        true
    }
}

/// Page request. Pages are 1-based; `per_page` is clamped to 1..=100.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 12,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.per_page as usize
    }

    pub fn limit(&self) -> usize {
        self.per_page as usize
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Slice an already-filtered, ordered collection into one page.
    pub fn slice(items: Vec<T>, pagination: Pagination) -> Self {
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit())
            .collect();
        Self {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::{Money, ProductId, UserId};
    use chrono::Utc;

    use crate::product::ProductDraft;

    fn product(name: &str, description: &str) -> Product {
        Product::submit(
            ProductId::new(),
            UserId::new(),
            ProductDraft {
                name: name.to_string(),
                description: description.to_string(),
                price: Money::from_major(10),
                quantity: 4,
                category: CategoryId::new(),
                is_featured: false,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn query_matches_name_or_description_case_insensitively() {
        let p = product("Walnut Desk", "Solid wood, oiled finish");
        let mut filter = ProductFilter {
            query: Some("walnut".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&p));

        filter.query = Some("OILED".to_string());
        assert!(filter.matches(&p));

        filter.query = Some("plastic".to_string());
        assert!(!filter.matches(&p));
    }

    #[test]
    fn category_and_stock_filters_compose() {
        let mut p = product("Walnut Desk", "Solid wood");
        let filter = ProductFilter {
            category: Some(p.category),
            in_stock_only: true,
            ..Default::default()
        };
        assert!(filter.matches(&p));

        p.quantity = 0;
        p.stock_status = crate::product::StockStatus::OutOfStock;
        assert!(!filter.matches(&p));
    }

    #[test]
    fn pagination_slices_and_reports_total() {
        let items: Vec<i32> = (0..30).collect();
        let page = Page::slice(items, Pagination::new(2, 12));
        assert_eq!(page.total, 30);
        assert_eq!(page.items.first(), Some(&12));
        assert_eq!(page.items.len(), 12);
    }

    #[test]
    fn pagination_clamps_degenerate_input() {
        let p = Pagination::new(0, 0);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 1);
        assert_eq!(p.offset(), 0);
    }
}
