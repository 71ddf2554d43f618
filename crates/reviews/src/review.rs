use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, Entity, ProductId, ReviewId, UserId};
use bazaar_orders::OrderStatus;

/// One review per (user, product) pair. Resubmission updates the existing
/// review in place (upsert keyed on the pair).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user: UserId,
    pub product: ProductId,
    /// 1..=5 stars.
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        id: ReviewId,
        user: UserId,
        product: ProductId,
        rating: u8,
        comment: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_rating(rating)?;
        Ok(Self {
            id,
            user,
            product,
            rating,
            comment: comment.into(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Overwrite rating and text, keeping identity and creation time.
    pub fn revise(
        &mut self,
        rating: u8,
        comment: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        validate_rating(rating)?;
        self.rating = rating;
        self.comment = comment.into();
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Review {
    type Id = ReviewId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_rating(rating: u8) -> DomainResult<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(DomainError::validation("rating must be between 1 and 5"))
    }
}

/// Orders in these states confer review eligibility; pending and cancelled
/// orders do not.
pub fn confers_eligibility(status: OrderStatus) -> bool {
    matches!(
        status,
        OrderStatus::Confirmed | OrderStatus::Shipped | OrderStatus::Delivered
    )
}

/// Proof-of-purchase gate: the reviewer must have bought the product and
/// must not be its seller.
pub fn can_review(reviewer: UserId, product_seller: UserId, has_purchased: bool) -> bool {
    has_purchased && product_seller != reviewer
}

/// Average rating in hundredths of a star (rounded half up), for the
/// product's denormalized rating field. Empty input averages to zero.
pub fn average_rating_centi(ratings: &[u8]) -> u16 {
    if ratings.is_empty() {
        return 0;
    }
    let sum: u64 = ratings.iter().map(|r| u64::from(*r) * 100).sum();
    let count = ratings.len() as u64;
    ((sum + count / 2) / count) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds_are_enforced() {
        for bad in [0u8, 6, 200] {
            assert!(Review::new(
                ReviewId::new(),
                UserId::new(),
                ProductId::new(),
                bad,
                "",
                Utc::now()
            )
            .is_err());
        }
        assert!(
            Review::new(ReviewId::new(), UserId::new(), ProductId::new(), 5, "", Utc::now())
                .is_ok()
        );
    }

    #[test]
    fn revise_keeps_identity_and_creation_time() {
        let mut review = Review::new(
            ReviewId::new(),
            UserId::new(),
            ProductId::new(),
            4,
            "good",
            Utc::now(),
        )
        .unwrap();
        let (id, created) = (review.id, review.created_at);

        review.revise(2, "broke after a week", Utc::now()).unwrap();
        assert_eq!(review.id, id);
        assert_eq!(review.created_at, created);
        assert_eq!(review.rating, 2);
    }

    #[test]
    fn eligibility_excludes_pending_and_cancelled() {
        assert!(confers_eligibility(OrderStatus::Confirmed));
        assert!(confers_eligibility(OrderStatus::Shipped));
        assert!(confers_eligibility(OrderStatus::Delivered));
        assert!(!confers_eligibility(OrderStatus::Pending));
        assert!(!confers_eligibility(OrderStatus::Cancelled));
    }

    #[test]
    fn sellers_never_review_their_own_product() {
        let seller = UserId::new();
        assert!(!can_review(seller, seller, true));
        assert!(can_review(UserId::new(), seller, true));
        assert!(!can_review(UserId::new(), seller, false));
    }

    #[test]
    fn average_rounds_half_up_in_hundredths() {
        assert_eq!(average_rating_centi(&[]), 0);
        assert_eq!(average_rating_centi(&[5]), 500);
        assert_eq!(average_rating_centi(&[4, 5]), 450);
        assert_eq!(average_rating_centi(&[1, 2, 2]), 167);
    }
}
