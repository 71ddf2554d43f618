//! Catalog browsing and listing management.

use chrono::Utc;

use bazaar_auth::{require_owner, require_seller, Principal};
use bazaar_catalog::{Category, Page, Pagination, Product, ProductDraft, ProductEdit, ProductFilter};
use bazaar_core::{CategoryId, DomainError, ProductId};
use bazaar_reviews::{can_review, Review};

use super::{ServiceError, ServiceResult};
use crate::store::Store;

/// Product page payload: the listing, its reviews and whether the viewer is
/// currently allowed to post one.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub reviews: Vec<Review>,
    pub viewer_can_review: bool,
}

#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Home page listing: featured approved products, falling back to the
    /// most recent approved products when nothing is featured. Listing pages
    /// only show what can actually be bought, so sold-out stock is excluded.
    pub async fn home(&self) -> ServiceResult<Vec<Product>> {
        let featured = self
            .store
            .approved_products(
                &ProductFilter {
                    featured_only: true,
                    in_stock_only: true,
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await?;
        if !featured.items.is_empty() {
            return Ok(featured.items);
        }
        let recent = self
            .store
            .approved_products(
                &ProductFilter {
                    in_stock_only: true,
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await?;
        Ok(recent.items)
    }

    /// Substring search over approved listings. A blank query returns an
    /// empty page rather than the whole catalog.
    pub async fn search(&self, query: &str, page: Pagination) -> ServiceResult<Page<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Page {
                items: vec![],
                total: 0,
                page: page.page,
                per_page: page.per_page,
            });
        }
        let filter = ProductFilter {
            query: Some(query.to_string()),
            in_stock_only: true,
            ..Default::default()
        };
        Ok(self.store.approved_products(&filter, page).await?)
    }

    pub async fn categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.store.categories().await?)
    }

    /// Approved listings under a category, addressed by slug.
    pub async fn category_products(
        &self,
        slug: &str,
        page: Pagination,
    ) -> ServiceResult<(Category, Page<Product>)> {
        let category = self
            .store
            .category_by_slug(slug)
            .await?
            .ok_or(DomainError::NotFound)?;
        let filter = ProductFilter {
            category: Some(category.id),
            in_stock_only: true,
            ..Default::default()
        };
        let products = self.store.approved_products(&filter, page).await?;
        Ok((category, products))
    }

    /// Product page. Unapproved listings are visible only to their seller;
    /// everyone else gets a 404-shaped `NotFound` rather than a 403, so the
    /// listing's existence is not leaked.
    pub async fn product_detail(
        &self,
        viewer: Option<&Principal>,
        id: ProductId,
    ) -> ServiceResult<ProductDetail> {
        let product = self.store.product(id).await?.ok_or(DomainError::NotFound)?;
        if !product.visible_to(viewer.map(|p| p.user_id)) {
            return Err(DomainError::NotFound.into());
        }
        let reviews = self.store.reviews_for_product(id).await?;
        let viewer_can_review = match viewer {
            None => false,
            Some(principal) => {
                let purchased = self
                    .store
                    .has_purchased(principal.user_id, id)
                    .await?;
                can_review(principal.user_id, product.seller, purchased)
            }
        };
        Ok(ProductDetail {
            product,
            reviews,
            viewer_can_review,
        })
    }

    /// Seller's own listings, any approval status.
    pub async fn seller_dashboard(&self, principal: &Principal) -> ServiceResult<Vec<Product>> {
        require_seller(principal)?;
        Ok(self.store.products_by_seller(principal.user_id).await?)
    }

    /// Create a listing. It enters the approval queue as `pending`.
    pub async fn create_product(
        &self,
        principal: &Principal,
        draft: ProductDraft,
    ) -> ServiceResult<Product> {
        require_seller(principal)?;
        self.require_category(draft.category).await?;
        let product = Product::submit(ProductId::new(), principal.user_id, draft, Utc::now())?;
        self.store.insert_product(product.clone()).await?;
        tracing::info!(product = %product.id, seller = %product.seller, "product submitted");
        Ok(product)
    }

    /// Edit a listing. Only the owning seller may edit, and the edit drops
    /// the listing back to `pending`.
    pub async fn update_product(
        &self,
        principal: &Principal,
        id: ProductId,
        edit: ProductEdit,
    ) -> ServiceResult<Product> {
        require_seller(principal)?;
        let mut product = self.store.product(id).await?.ok_or(DomainError::NotFound)?;
        require_owner(principal, product.seller)?;
        self.require_category(edit.category).await?;
        product.apply_edit(edit, Utc::now())?;
        self.store.update_product(product.clone()).await?;
        tracing::info!(product = %product.id, "product edited, re-entering approval queue");
        Ok(product)
    }

    /// Delete a listing (owner only). Cart lines, wishlist entries and
    /// reviews go with it; past orders keep their snapshots.
    pub async fn delete_product(&self, principal: &Principal, id: ProductId) -> ServiceResult<()> {
        require_seller(principal)?;
        let product = self.store.product(id).await?.ok_or(DomainError::NotFound)?;
        require_owner(principal, product.seller)?;
        self.store.delete_product(id).await?;
        tracing::info!(product = %id, "product deleted");
        Ok(())
    }

    /// Create a category (sellers only). The slug is derived from the name
    /// and must be unique.
    pub async fn create_category(
        &self,
        principal: &Principal,
        name: &str,
        description: &str,
    ) -> ServiceResult<Category> {
        require_seller(principal)?;
        let category = Category::new(CategoryId::new(), name, description, Utc::now())?;
        self.store.insert_category(category.clone()).await?;
        Ok(category)
    }

    async fn require_category(&self, id: CategoryId) -> ServiceResult<()> {
        let known = self
            .store
            .categories()
            .await?
            .iter()
            .any(|c| c.id == id);
        if known {
            Ok(())
        } else {
            Err(ServiceError::Domain(DomainError::validation(
                "unknown category",
            )))
        }
    }
}
