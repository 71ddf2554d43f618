//! Purchase-gated product reviews.

use chrono::Utc;

use bazaar_auth::Principal;
use bazaar_core::{DomainError, ProductId, ReviewId};
use bazaar_reviews::{average_rating_centi, can_review, Review};

use super::ServiceResult;
use crate::store::Store;

#[derive(Clone)]
pub struct ReviewService<S> {
    store: S,
}

impl<S: Store> ReviewService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Submit (or resubmit) a review.
    ///
    /// The caller must have purchased the product and must not be its
    /// seller. A resubmission revises the existing review in place. The
    /// product's denormalized average rating is recomputed afterwards.
    pub async fn submit(
        &self,
        principal: &Principal,
        product_id: ProductId,
        rating: u8,
        comment: &str,
    ) -> ServiceResult<Review> {
        let mut product = self
            .store
            .product(product_id)
            .await?
            .ok_or(DomainError::NotFound)?;

        let purchased = self.store.has_purchased(principal.user_id, product_id).await?;
        if !can_review(principal.user_id, product.seller, purchased) {
            return Err(DomainError::PermissionDenied.into());
        }

        let now = Utc::now();
        let review = match self.store.review_by(principal.user_id, product_id).await? {
            Some(mut existing) => {
                existing.revise(rating, comment, now)?;
                existing
            }
            None => Review::new(
                ReviewId::new(),
                principal.user_id,
                product_id,
                rating,
                comment,
                now,
            )?,
        };
        self.store.upsert_review(review.clone()).await?;

        let ratings: Vec<u8> = self
            .store
            .reviews_for_product(product_id)
            .await?
            .iter()
            .map(|r| r.rating)
            .collect();
        product.set_rating(average_rating_centi(&ratings), now);
        self.store.update_product(product).await?;

        tracing::info!(product = %product_id, reviewer = %principal.user_id, rating, "review recorded");
        Ok(review)
    }

    pub async fn for_product(&self, product_id: ProductId) -> ServiceResult<Vec<Review>> {
        Ok(self.store.reviews_for_product(product_id).await?)
    }
}
