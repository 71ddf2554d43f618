//! End-to-end service tests over the in-memory store.

use std::sync::Arc;

use bazaar_auth::{AuthzError, Principal, Role};
use bazaar_catalog::{ApprovalStatus, Pagination, ProductDraft, ProductFilter};
use bazaar_core::{CategoryId, Money, ProductId, UserId};
use bazaar_orders::{CheckoutDraft, CheckoutError, OrderStatus, PaymentMethod};

use crate::services::{ServiceError, Services};
use crate::store::{InMemoryStore, Store};

struct Fixture {
    store: Arc<dyn Store>,
    services: Services,
    staff: Principal,
    category: CategoryId,
}

async fn fixture() -> Fixture {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let services = Services::new(store.clone());
    let staff = Principal::staff(UserId::new(), Role::Buyer);
    let category = services
        .catalog
        .create_category(&seller(), "General", "everything else")
        .await
        .unwrap()
        .id;
    Fixture {
        store,
        services,
        staff,
        category,
    }
}

impl Fixture {
    /// Create a listing through the real seller flow and approve it.
    async fn approved_product(
        &self,
        seller: &Principal,
        name: &str,
        price_major: u64,
        quantity: u32,
    ) -> ProductId {
        let product = self
            .services
            .catalog
            .create_product(
                seller,
                ProductDraft {
                    name: name.to_string(),
                    description: "test listing".to_string(),
                    price: Money::from_major(price_major),
                    quantity,
                    category: self.category,
                    is_featured: false,
                },
            )
            .await
            .unwrap();
        self.services
            .approval
            .approve(&self.staff, product.id)
            .await
            .unwrap();
        product.id
    }
}

fn seller() -> Principal {
    Principal::new(UserId::new(), Role::Seller)
}

fn buyer() -> Principal {
    Principal::new(UserId::new(), Role::Buyer)
}

fn shipping() -> CheckoutDraft {
    CheckoutDraft {
        address: "12 Canal Street".to_string(),
        pin_code: "560001".to_string(),
        payment_method: PaymentMethod::CashOnDelivery,
    }
}

#[tokio::test]
async fn checkout_prices_decrements_and_empties_the_cart() {
    let fx = fixture().await;
    let (seller, buyer) = (seller(), buyer());
    let a = fx.approved_product(&seller, "Product A", 100, 5).await;
    let b = fx.approved_product(&seller, "Product B", 50, 3).await;

    fx.services.cart.add(&buyer, a, 2).await.unwrap();
    fx.services.cart.add(&buyer, b, 1).await.unwrap();

    let order = fx.services.checkout.checkout(&buyer, shipping()).await.unwrap();
    assert_eq!(order.total_amount, "250.00".parse().unwrap());
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.items.len(), 2);
    assert!(order.order_number.as_str().starts_with("ORD"));

    // Stock moved, sales counted.
    let a_after = fx.store.product(a).await.unwrap().unwrap();
    let b_after = fx.store.product(b).await.unwrap().unwrap();
    assert_eq!(a_after.quantity, 3);
    assert_eq!(a_after.total_sells, 2);
    assert_eq!(b_after.quantity, 2);

    // Cart emptied in the same commit.
    let view = fx.services.cart.view(&buyer).await.unwrap();
    assert!(view.lines.is_empty());
    assert_eq!(view.total, Money::ZERO);

    // And the order is visible in history.
    let history = fx.services.orders.my_orders(&buyer).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, order.id);
}

#[tokio::test]
async fn failed_checkout_changes_nothing() {
    let fx = fixture().await;
    let (seller, buyer) = (seller(), buyer());
    let a = fx.approved_product(&seller, "Scarce", 10, 5).await;
    fx.services.cart.add(&buyer, a, 4).await.unwrap();

    // Stock shrinks after the line was carted.
    let mut product = fx.store.product(a).await.unwrap().unwrap();
    product.quantity = 1;
    fx.store.update_product(product).await.unwrap();

    let err = fx
        .services
        .checkout
        .checkout(&buyer, shipping())
        .await
        .unwrap_err();
    match err {
        ServiceError::Checkout(CheckoutError::InsufficientStock { shortages }) => {
            assert_eq!(shortages.len(), 1);
            assert_eq!(shortages[0].requested, 4);
            assert_eq!(shortages[0].available, 1);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Nothing moved: stock, cart and order history are untouched.
    assert_eq!(fx.store.product(a).await.unwrap().unwrap().quantity, 1);
    assert_eq!(fx.services.cart.view(&buyer).await.unwrap().lines.len(), 1);
    assert!(fx.services.orders.my_orders(&buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn sellers_cannot_check_out_their_own_listings() {
    let fx = fixture().await;
    let seller = seller();
    let own = fx.approved_product(&seller, "Own teapot", 35, 5).await;

    // The cart service refuses up front,
    let err = fx.services.cart.add(&seller, own, 1).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(_)));

    // and checkout re-checks even if a line sneaks in underneath.
    fx.store.add_to_cart(seller.user_id, own, 1).await.unwrap();
    let err = fx
        .services
        .checkout
        .checkout(&seller, shipping())
        .await
        .unwrap_err();
    match err {
        ServiceError::Checkout(CheckoutError::SelfPurchase { products }) => {
            assert_eq!(products, vec!["Own teapot".to_string()]);
        }
        other => panic!("expected SelfPurchase, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_checkouts_never_oversell_the_last_unit() {
    let fx = fixture().await;
    let seller = seller();
    let last_unit = fx.approved_product(&seller, "Last unit", 20, 1).await;

    let (first, second) = (buyer(), buyer());
    fx.services.cart.add(&first, last_unit, 1).await.unwrap();
    fx.services.cart.add(&second, last_unit, 1).await.unwrap();

    let (r1, r2) = tokio::join!(
        fx.services.checkout.checkout(&first, shipping()),
        fx.services.checkout.checkout(&second, shipping()),
    );

    let successes = [r1.is_ok(), r2.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "exactly one checkout may win: {r1:?} {r2:?}");
    for result in [r1, r2] {
        if let Err(err) = result {
            assert!(matches!(
                err,
                ServiceError::Checkout(CheckoutError::InsufficientStock { .. })
            ));
        }
    }

    let product = fx.store.product(last_unit).await.unwrap().unwrap();
    assert_eq!(product.quantity, 0);
    assert_eq!(product.total_sells, 1);
}

#[tokio::test]
async fn order_snapshots_are_immune_to_later_price_edits() {
    let fx = fixture().await;
    let (seller, buyer) = (seller(), buyer());
    let id = fx.approved_product(&seller, "Lamp", 40, 5).await;
    fx.services.cart.add(&buyer, id, 1).await.unwrap();
    let order = fx.services.checkout.checkout(&buyer, shipping()).await.unwrap();

    let mut product = fx.store.product(id).await.unwrap().unwrap();
    product.price = Money::from_major(99);
    fx.store.update_product(product).await.unwrap();

    let reread = fx.services.orders.order_detail(&buyer, order.id).await.unwrap();
    assert_eq!(reread.total_amount, Money::from_major(40));
    assert_eq!(reread.items[0].price, Money::from_major(40));
}

#[tokio::test]
async fn editing_a_listing_resets_approval_and_hides_it() {
    let fx = fixture().await;
    let seller = seller();
    let id = fx.approved_product(&seller, "Desk", 120, 2).await;

    let edited = fx
        .services
        .catalog
        .update_product(
            &seller,
            id,
            ProductDraft {
                name: "Desk (oiled)".to_string(),
                description: "now with finish".to_string(),
                price: Money::from_major(130),
                quantity: 2,
                category: fx.category,
                is_featured: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.approval_status, ApprovalStatus::Pending);

    // Gone from the public catalog,
    let page = fx
        .store
        .approved_products(&ProductFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert!(page.items.iter().all(|p| p.id != id));
    assert!(fx
        .services
        .catalog
        .product_detail(None, id)
        .await
        .is_err());

    // but still visible to its owner, and back in the staff queue.
    assert!(fx
        .services
        .catalog
        .product_detail(Some(&seller), id)
        .await
        .is_ok());
    let queue = fx.services.approval.pending(&fx.staff).await.unwrap();
    assert!(queue.iter().any(|p| p.id == id));
}

#[tokio::test]
async fn reviews_are_purchase_gated_and_update_the_average() {
    let fx = fixture().await;
    let (seller, buyer) = (seller(), buyer());
    let id = fx.approved_product(&seller, "Kettle", 25, 5).await;

    // No purchase yet.
    let err = fx
        .services
        .reviews
        .submit(&buyer, id, 5, "great")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(_)));

    fx.services.cart.add(&buyer, id, 1).await.unwrap();
    fx.services.checkout.checkout(&buyer, shipping()).await.unwrap();

    let review = fx.services.reviews.submit(&buyer, id, 4, "good").await.unwrap();
    assert_eq!(review.rating, 4);
    assert_eq!(fx.store.product(id).await.unwrap().unwrap().rating, 400);

    // Resubmission revises in place and recomputes.
    let revised = fx
        .services
        .reviews
        .submit(&buyer, id, 2, "broke after a week")
        .await
        .unwrap();
    assert_eq!(revised.id, review.id);
    assert_eq!(fx.services.reviews.for_product(id).await.unwrap().len(), 1);
    assert_eq!(fx.store.product(id).await.unwrap().unwrap().rating, 200);

    // The detail page reflects eligibility.
    let detail = fx
        .services
        .catalog
        .product_detail(Some(&buyer), id)
        .await
        .unwrap();
    assert!(detail.viewer_can_review);
    let detail = fx
        .services
        .catalog
        .product_detail(Some(&seller), id)
        .await
        .unwrap();
    assert!(!detail.viewer_can_review);
}

#[tokio::test]
async fn cart_lines_accumulate_overwrite_and_remove_at_zero() {
    let fx = fixture().await;
    let (seller, buyer) = (seller(), buyer());
    let id = fx.approved_product(&seller, "Mug", 8, 50).await;

    fx.services.cart.add(&buyer, id, 2).await.unwrap();
    let line = fx.services.cart.add(&buyer, id, 3).await.unwrap();
    assert_eq!(line.quantity, 5);

    fx.services.cart.update(&buyer, line.id, 1).await.unwrap();
    let view = fx.services.cart.view(&buyer).await.unwrap();
    assert_eq!(view.lines[0].0.quantity, 1);
    assert_eq!(view.total, Money::from_major(8));

    fx.services.cart.update(&buyer, line.id, 0).await.unwrap();
    assert!(fx.services.cart.view(&buyer).await.unwrap().lines.is_empty());

    // Other users cannot touch the line even by id.
    fx.services.cart.add(&buyer, id, 1).await.unwrap();
    let line = fx.services.cart.view(&buyer).await.unwrap().lines[0].0.clone();
    let err = fx.services.cart.remove(&seller, line.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Domain(_)));
}

#[tokio::test]
async fn deleting_a_listing_cascades_but_keeps_order_snapshots() {
    let fx = fixture().await;
    let (seller, buyer) = (seller(), buyer());
    let id = fx.approved_product(&seller, "Rug", 60, 5).await;

    fx.services.cart.add(&buyer, id, 1).await.unwrap();
    let order = fx.services.checkout.checkout(&buyer, shipping()).await.unwrap();

    fx.services.cart.add(&buyer, id, 2).await.unwrap();
    fx.services.cart.wishlist_add(&buyer, id).await.unwrap();
    fx.services.reviews.submit(&buyer, id, 5, "soft").await.unwrap();

    fx.services.catalog.delete_product(&seller, id).await.unwrap();

    assert!(fx.store.product(id).await.unwrap().is_none());
    assert!(fx.services.cart.view(&buyer).await.unwrap().lines.is_empty());
    assert!(fx.services.cart.wishlist(&buyer).await.unwrap().is_empty());
    assert!(fx.services.reviews.for_product(id).await.unwrap().is_empty());

    // Historical order still carries the frozen item.
    let kept = fx.services.orders.order_detail(&buyer, order.id).await.unwrap();
    assert_eq!(kept.items[0].product, id);
    assert_eq!(kept.items[0].product_name, "Rug");
}

#[tokio::test]
async fn approval_workflow_is_staff_only() {
    let fx = fixture().await;
    let seller = seller();
    let product = fx
        .services
        .catalog
        .create_product(
            &seller,
            ProductDraft {
                name: "Chair".to_string(),
                description: "oak".to_string(),
                price: Money::from_major(70),
                quantity: 3,
                category: fx.category,
                is_featured: false,
            },
        )
        .await
        .unwrap();

    let err = fx
        .services
        .approval
        .approve(&buyer(), product.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Authz(AuthzError::StaffRequired)
    ));

    let approved = fx.services.approval.approve(&fx.staff, product.id).await.unwrap();
    assert_eq!(approved.approval_status, ApprovalStatus::Approved);

    // Rejection hides the listing again.
    let rejected = fx.services.approval.reject(&fx.staff, product.id).await.unwrap();
    assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);
}

#[tokio::test]
async fn order_lifecycle_permissions() {
    let fx = fixture().await;
    let (seller, buyer) = (seller(), buyer());
    let id = fx.approved_product(&seller, "Stool", 30, 5).await;
    fx.services.cart.add(&buyer, id, 1).await.unwrap();
    let order = fx.services.checkout.checkout(&buyer, shipping()).await.unwrap();

    // The owner may not advance fulfilment,
    let err = fx
        .services
        .orders
        .update_status(&buyer, order.id, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(_)));

    // but may cancel while the order is still cancellable.
    let cancelled = fx
        .services
        .orders
        .update_status(&buyer, order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // Staff drive the rest of the lifecycle on another order.
    fx.services.cart.add(&buyer, id, 1).await.unwrap();
    let order = fx.services.checkout.checkout(&buyer, shipping()).await.unwrap();
    let shipped = fx
        .services
        .orders
        .update_status(&fx.staff, order.id, OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);

    // Illegal edges are conflicts even for staff.
    let err = fx
        .services
        .orders
        .update_status(&fx.staff, order.id, OrderStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(_)));

    // Strangers cannot see the order at all.
    let err = fx
        .services
        .orders
        .order_detail(&seller, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(_)));
}

#[tokio::test]
async fn listing_pages_hide_out_of_stock_products() {
    let fx = fixture().await;
    let seller = seller();
    let in_stock = fx.approved_product(&seller, "Walnut desk", 200, 2).await;
    let sold_out = fx.approved_product(&seller, "Walnut stool", 80, 0).await;

    let home = fx.services.catalog.home().await.unwrap();
    assert!(home.iter().any(|p| p.id == in_stock));
    assert!(home.iter().all(|p| p.id != sold_out));

    let hits = fx
        .services
        .catalog
        .search("walnut", Pagination::default())
        .await
        .unwrap();
    assert_eq!(hits.items.len(), 1);
    assert_eq!(hits.items[0].id, in_stock);

    let (_, page) = fx
        .services
        .catalog
        .category_products("general", Pagination::default())
        .await
        .unwrap();
    assert!(page.items.iter().all(|p| p.id != sold_out));

    // The product page itself stays reachable, it just cannot be bought.
    let detail = fx
        .services
        .catalog
        .product_detail(None, sold_out)
        .await
        .unwrap();
    assert!(!detail.product.is_in_stock());
}

#[tokio::test]
async fn category_creation_is_seller_only() {
    let fx = fixture().await;

    let err = fx
        .services
        .catalog
        .create_category(&buyer(), "Garden", "")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Authz(AuthzError::SellerRequired)
    ));

    // A staff flag on a buyer account does not help either.
    let err = fx
        .services
        .catalog
        .create_category(&fx.staff, "Garden", "")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Authz(AuthzError::SellerRequired)
    ));

    let category = fx
        .services
        .catalog
        .create_category(&seller(), "Garden Tools", "rakes and spades")
        .await
        .unwrap();
    assert_eq!(category.slug, "garden-tools");
}

#[tokio::test]
async fn search_requires_a_query_and_category_pages_filter() {
    let fx = fixture().await;
    let seller = seller();
    fx.approved_product(&seller, "Walnut desk", 200, 2).await;
    fx.approved_product(&seller, "Oak shelf", 90, 2).await;

    let empty = fx
        .services
        .catalog
        .search("  ", Pagination::default())
        .await
        .unwrap();
    assert!(empty.items.is_empty());
    assert_eq!(empty.total, 0);

    let hits = fx
        .services
        .catalog
        .search("walnut", Pagination::default())
        .await
        .unwrap();
    assert_eq!(hits.items.len(), 1);
    assert_eq!(hits.items[0].name, "Walnut desk");

    let (category, page) = fx
        .services
        .catalog
        .category_products("general", Pagination::default())
        .await
        .unwrap();
    assert_eq!(category.slug, "general");
    assert_eq!(page.total, 2);
}
