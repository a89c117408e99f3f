//! Behaviour of the in-memory storage backends.

use std::sync::Arc;

use chrono::{Duration, Utc};
use domain::{
    AddressSnapshot, Cart, Money, NewOrder, NewPayment, Order, OrderId, OrderLine, OrderNumber,
    OrderStatus, Payment, PaymentMethod, PaymentStatus, Product, ProductId, UserId,
};
use store::{
    CartStore, InMemoryCartStore, InMemoryOrderRepository, InMemoryPaymentLedger,
    InMemoryProductStore, InventoryLedger, OrderFilter, OrderRepository, PaymentFilter,
    PaymentLedger, ProductCatalog, SortField, StoreError,
};

fn address() -> AddressSnapshot {
    AddressSnapshot {
        street: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        postal_code: "62701".to_string(),
        country: "US".to_string(),
    }
}

fn order_for(user_id: UserId, unit_cents: i64, quantity: u32, age_minutes: i64) -> Order {
    let placed_at = Utc::now() - Duration::minutes(age_minutes);
    Order::place(NewOrder {
        id: OrderId::new(),
        user_id,
        order_number: OrderNumber::generate(placed_at),
        lines: vec![
            OrderLine::new(
                ProductId::new(),
                "Widget",
                "W-1",
                Money::from_cents(unit_cents),
                quantity,
            )
            .unwrap(),
        ],
        tax: Money::zero(),
        shipping: Money::zero(),
        discount: Money::zero(),
        currency: "USD".to_string(),
        shipping_address: address(),
        billing_address: address(),
        notes: None,
        placed_at,
    })
    .unwrap()
}

fn payment_for(order: &Order) -> Payment {
    Payment::start(
        NewPayment {
            order_id: order.id(),
            user_id: order.user_id(),
            amount: order.total(),
            currency: "USD".to_string(),
            method: PaymentMethod::CreditCard,
            transaction_ref: Some(format!("txn-{}", order.id())),
            gateway_response: None,
        },
        Utc::now(),
    )
}

// ── Inventory ledger ──

#[tokio::test]
async fn test_reserve_and_restore_adjust_stock() {
    let store = InMemoryProductStore::new();
    let id = store
        .insert(Product::new("Widget", "W-1", Money::from_cents(1000), 5))
        .await;

    let level = store.reserve(id, 2).await.unwrap();
    assert_eq!(level.stock, 3);

    let level = store.restore(id, 2).await.unwrap();
    assert_eq!(level.stock, 5);
}

#[tokio::test]
async fn test_reserve_rejects_insufficient_stock_without_mutation() {
    let store = InMemoryProductStore::new();
    let id = store
        .insert(Product::new("Widget", "W-1", Money::from_cents(1000), 1))
        .await;

    let err = store.reserve(id, 2).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::InsufficientStock {
            requested: 2,
            available: 1,
            ..
        }
    ));
    assert_eq!(store.stock_of(id).await, Some(1));
}

#[tokio::test]
async fn test_reserve_rejects_inactive_and_unknown_products() {
    let store = InMemoryProductStore::new();
    let id = store
        .insert(Product::new("Widget", "W-1", Money::from_cents(1000), 5).inactive())
        .await;

    assert!(matches!(
        store.reserve(id, 1).await,
        Err(StoreError::ProductInactive(_))
    ));
    assert!(matches!(
        store.reserve(ProductId::new(), 1).await,
        Err(StoreError::ProductNotFound(_))
    ));
}

#[tokio::test]
async fn test_restore_is_unconditional_for_inactive_products() {
    let store = InMemoryProductStore::new();
    let id = store
        .insert(Product::new("Widget", "W-1", Money::from_cents(1000), 5))
        .await;
    store.reserve(id, 3).await.unwrap();
    store.set_active(id, false).await.unwrap();

    let level = store.restore(id, 3).await.unwrap();
    assert_eq!(level.stock, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_never_oversell() {
    let store = InMemoryProductStore::new();
    let id = store
        .insert(Product::new("Widget", "W-1", Money::from_cents(1000), 10))
        .await;

    let mut handles = Vec::new();
    for _ in 0..50 {
        let store = store.clone();
        handles.push(tokio::spawn(async move { store.reserve(id, 1).await }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(store.stock_of(id).await, Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_unit_goes_to_exactly_one_caller() {
    let store = Arc::new(InMemoryProductStore::new());
    let id = store
        .insert(Product::new("Widget", "W-1", Money::from_cents(1000), 1))
        .await;

    let (a, b) = tokio::join!(
        {
            let store = store.clone();
            tokio::spawn(async move { store.reserve(id, 1).await })
        },
        {
            let store = store.clone();
            tokio::spawn(async move { store.reserve(id, 1).await })
        }
    );

    let results = [a.unwrap(), b.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(StoreError::InsufficientStock { .. })))
    );
    assert_eq!(store.stock_of(id).await, Some(0));
}

#[tokio::test]
async fn test_catalog_returns_current_values() {
    let store = InMemoryProductStore::new();
    let id = store
        .insert(Product::new("Widget", "W-1", Money::from_cents(1000), 5))
        .await;
    store.set_price(id, Money::from_cents(1200)).await.unwrap();

    let product = store.get_product(id).await.unwrap();
    assert_eq!(product.price, Money::from_cents(1200));
}

// ── Order repository ──

#[tokio::test]
async fn test_create_rejects_duplicate_order_number() {
    let repo = InMemoryOrderRepository::new();
    let user = UserId::new();
    let first = order_for(user, 1000, 1, 0);
    repo.create(&first).await.unwrap();

    let now = Utc::now();
    let clash = Order::place(NewOrder {
        id: OrderId::new(),
        user_id: user,
        order_number: first.order_number().clone(),
        lines: first.lines().to_vec(),
        tax: Money::zero(),
        shipping: Money::zero(),
        discount: Money::zero(),
        currency: "USD".to_string(),
        shipping_address: address(),
        billing_address: address(),
        notes: None,
        placed_at: now,
    })
    .unwrap();

    let err = repo.create(&clash).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateOrderNumber(_)));
    assert_eq!(repo.order_count().await, 1);
}

#[tokio::test]
async fn test_lookups_by_id_and_number() {
    let repo = InMemoryOrderRepository::new();
    let order = order_for(UserId::new(), 1000, 1, 0);
    repo.create(&order).await.unwrap();

    assert_eq!(repo.get_by_id(order.id()).await.unwrap(), order);
    assert_eq!(
        repo.get_by_order_number(order.order_number()).await.unwrap(),
        order
    );
    assert!(repo.order_number_exists(order.order_number()).await.unwrap());

    assert!(matches!(
        repo.get_by_id(OrderId::new()).await,
        Err(StoreError::OrderNotFound(_))
    ));
    let unknown = OrderNumber::parse("ORD-20240101-00000000").unwrap();
    assert!(!repo.order_number_exists(&unknown).await.unwrap());
}

#[tokio::test]
async fn test_stale_update_is_a_concurrency_conflict() {
    let repo = InMemoryOrderRepository::new();
    let order = order_for(UserId::new(), 1000, 1, 0);
    repo.create(&order).await.unwrap();

    let mut first = repo.get_by_id(order.id()).await.unwrap();
    let mut second = repo.get_by_id(order.id()).await.unwrap();

    first.cancel(Utc::now()).unwrap();
    repo.update(&mut first).await.unwrap();
    assert_eq!(first.version(), 1);

    second.cancel(Utc::now()).unwrap();
    let err = repo.update(&mut second).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::ConcurrencyConflict {
            expected: 0,
            actual: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn test_list_filters_sorts_and_pages() {
    let repo = InMemoryOrderRepository::new();
    let user = UserId::new();
    let other = UserId::new();

    let oldest = order_for(user, 500, 1, 30);
    let middle = order_for(user, 3000, 1, 20);
    let newest = order_for(user, 1500, 1, 10);
    for order in [&oldest, &middle, &newest, &order_for(other, 9999, 1, 5)] {
        repo.create(order).await.unwrap();
    }

    let mine = repo
        .get_by_user_id(user, &OrderFilter::new())
        .await
        .unwrap();
    let ids: Vec<_> = mine.iter().map(|o| o.id()).collect();
    assert_eq!(ids, vec![newest.id(), middle.id(), oldest.id()]);

    let by_total = repo
        .list(
            &OrderFilter::new()
                .user_id(user)
                .sort_by(SortField::Total, false),
        )
        .await
        .unwrap();
    assert_eq!(by_total[0].id(), oldest.id());

    let expensive = repo
        .list(&OrderFilter::new().total_between(Money::from_cents(1000), Money::from_cents(5000)))
        .await
        .unwrap();
    assert_eq!(expensive.len(), 2);

    let second_page = repo
        .get_by_user_id(user, &OrderFilter::new().page(2, 2))
        .await
        .unwrap();
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].id(), oldest.id());

    let window = repo
        .list(&OrderFilter::new().ordered_between(
            Utc::now() - Duration::minutes(25),
            Utc::now() - Duration::minutes(15),
        ))
        .await
        .unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].id(), middle.id());
}

#[tokio::test]
async fn test_orders_to_process_need_payment_and_status() {
    let repo = InMemoryOrderRepository::new();
    let now = Utc::now();

    let mut ready = order_for(UserId::new(), 1000, 1, 0);
    ready.transition_to(OrderStatus::Confirmed, now).unwrap();
    ready.set_payment_status(PaymentStatus::Processing, now).unwrap();
    ready.set_payment_status(PaymentStatus::Completed, now).unwrap();

    let mut unpaid = order_for(UserId::new(), 1000, 1, 0);
    unpaid.transition_to(OrderStatus::Confirmed, now).unwrap();

    let pending_paid = {
        let mut order = order_for(UserId::new(), 1000, 1, 0);
        order.set_payment_status(PaymentStatus::Processing, now).unwrap();
        order.set_payment_status(PaymentStatus::Completed, now).unwrap();
        order
    };

    for order in [&ready, &unpaid, &pending_paid] {
        repo.create(order).await.unwrap();
    }

    let to_process = repo.get_orders_to_process().await.unwrap();
    assert_eq!(to_process.len(), 1);
    assert_eq!(to_process[0].id(), ready.id());
}

// ── Payment ledger ──

#[tokio::test]
async fn test_only_one_completed_payment_per_order() {
    let ledger = InMemoryPaymentLedger::new();
    let order = order_for(UserId::new(), 1000, 1, 0);

    let mut first = payment_for(&order);
    first.complete(Utc::now()).unwrap();
    ledger.record(&first).await.unwrap();

    let mut second = payment_for(&order);
    ledger.record(&second).await.unwrap();
    second.complete(Utc::now()).unwrap();

    let err = ledger.update(&second).await.unwrap_err();
    assert!(matches!(err, StoreError::PaymentAlreadyCompleted(_)));
    assert!(ledger.has_completed(order.id()).await.unwrap());
}

#[tokio::test]
async fn test_payments_listed_newest_first_and_found_by_reference() {
    let ledger = InMemoryPaymentLedger::new();
    let order = order_for(UserId::new(), 1000, 1, 0);

    let mut failed = payment_for(&order);
    failed.fail("declined", Utc::now()).unwrap();
    ledger.record(&failed).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let mut retry = payment_for(&order);
    retry.set_transaction_ref("txn-retry");
    ledger.record(&retry).await.unwrap();

    let payments = ledger.list_for_order(order.id()).await.unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0].id(), retry.id());

    let found = ledger.get_by_transaction_ref("txn-retry").await.unwrap();
    assert_eq!(found.map(|p| p.id()), Some(retry.id()));
    assert!(!ledger.has_completed(order.id()).await.unwrap());
}

#[tokio::test]
async fn test_payment_listing_filters_across_orders() {
    let ledger = InMemoryPaymentLedger::new();
    let user = UserId::new();
    let first_order = order_for(user, 1000, 1, 10);
    let second_order = order_for(user, 500, 1, 0);
    let stranger_order = order_for(UserId::new(), 700, 1, 0);

    let mut completed = payment_for(&first_order);
    completed.complete(Utc::now()).unwrap();
    ledger.record(&completed).await.unwrap();
    ledger.record(&payment_for(&second_order)).await.unwrap();
    ledger.record(&payment_for(&stranger_order)).await.unwrap();

    let mine = ledger.list(&PaymentFilter::new().user_id(user)).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|p| p.user_id() == user));

    let done = ledger
        .list(&PaymentFilter::new().status(PaymentStatus::Completed))
        .await
        .unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id(), completed.id());

    let paypal = ledger
        .list(&PaymentFilter::new().method(PaymentMethod::Paypal))
        .await
        .unwrap();
    assert!(paypal.is_empty());
    assert_eq!(
        ledger.list(&PaymentFilter::new().page(1, 2)).await.unwrap().len(),
        2
    );
}

// ── Carts ──

#[tokio::test]
async fn test_clearing_a_cart_keeps_it_but_empties_lines() {
    let carts = InMemoryCartStore::new();
    let user = UserId::new();
    let cart_id = carts
        .put(Cart::new(user).with_line(ProductId::new(), 2))
        .await;

    carts.clear_cart(cart_id).await.unwrap();
    let cart = carts.get_cart_for_user(user).await.unwrap().unwrap();
    assert!(cart.is_empty());
}
