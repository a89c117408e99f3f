//! PostgreSQL integration tests
//!
//! These tests share one PostgreSQL container and truncate the tables before
//! each test. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use domain::{
    AddressSnapshot, Money, NewOrder, NewPayment, Order, OrderId, OrderLine, OrderNumber,
    OrderStatus, Payment, PaymentMethod, PaymentStatus, Product, ProductId, UserId,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    InventoryLedger, OrderFilter, OrderRepository, PaymentFilter, PaymentLedger,
    PostgresOrderRepository, PostgresPaymentLedger, PostgresProductStore, ProductCatalog,
    StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_fulfillment_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

struct Stores {
    products: PostgresProductStore,
    orders: PostgresOrderRepository,
    payments: PostgresPaymentLedger,
}

async fn get_test_stores() -> Stores {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE payments, orders, products")
        .execute(&pool)
        .await
        .unwrap();

    Stores {
        products: PostgresProductStore::new(pool.clone()),
        orders: PostgresOrderRepository::new(pool.clone()),
        payments: PostgresPaymentLedger::new(pool),
    }
}

fn address() -> AddressSnapshot {
    AddressSnapshot {
        street: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        postal_code: "62701".to_string(),
        country: "US".to_string(),
    }
}

fn order_for(user_id: UserId, product: &Product, quantity: u32) -> Order {
    let now = Utc::now();
    Order::place(NewOrder {
        id: OrderId::new(),
        user_id,
        order_number: OrderNumber::generate(now),
        lines: vec![
            OrderLine::new(product.id, &product.name, &product.sku, product.price, quantity)
                .unwrap(),
        ],
        tax: Money::from_cents(160),
        shipping: Money::zero(),
        discount: Money::zero(),
        currency: "USD".to_string(),
        shipping_address: address(),
        billing_address: address(),
        notes: Some("leave at the door".to_string()),
        placed_at: now,
    })
    .unwrap()
}

fn completed_payment(order: &Order) -> Payment {
    let mut payment = Payment::start(
        NewPayment {
            order_id: order.id(),
            user_id: order.user_id(),
            amount: order.total(),
            currency: "USD".to_string(),
            method: PaymentMethod::Stripe,
            transaction_ref: Some(format!("txn-{}", order.id())),
            gateway_response: Some(serde_json::json!({"approved": true})),
        },
        Utc::now(),
    );
    payment.complete(Utc::now()).unwrap();
    payment
}

#[tokio::test]
#[serial]
async fn test_reserve_and_restore_round_trip() {
    let stores = get_test_stores().await;
    let product = Product::new("Widget", "W-1", Money::from_cents(1000), 5);
    stores.products.insert(&product).await.unwrap();

    let level = stores.products.reserve(product.id, 2).await.unwrap();
    assert_eq!(level.stock, 3);

    let level = stores.products.restore(product.id, 2).await.unwrap();
    assert_eq!(level.stock, 5);

    let loaded = stores.products.get_product(product.id).await.unwrap();
    assert_eq!(loaded.stock, 5);
    assert_eq!(loaded.price, Money::from_cents(1000));
}

#[tokio::test]
#[serial]
async fn test_reserve_reports_the_reason_for_refusal() {
    let stores = get_test_stores().await;
    let product = Product::new("Widget", "W-1", Money::from_cents(1000), 1);
    stores.products.insert(&product).await.unwrap();

    let err = stores.products.reserve(product.id, 2).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::InsufficientStock {
            requested: 2,
            available: 1,
            ..
        }
    ));

    stores.products.set_active(product.id, false).await.unwrap();
    let err = stores.products.reserve(product.id, 1).await.unwrap_err();
    assert!(matches!(err, StoreError::ProductInactive(_)));

    let err = stores.products.reserve(ProductId::new(), 1).await.unwrap_err();
    assert!(matches!(err, StoreError::ProductNotFound(_)));
}

#[tokio::test]
#[serial]
async fn test_concurrent_reservations_never_oversell() {
    let stores = get_test_stores().await;
    let product = Product::new("Widget", "W-1", Money::from_cents(1000), 5);
    stores.products.insert(&product).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let ledger = stores.products.clone();
        let id = product.id;
        handles.push(tokio::spawn(async move { ledger.reserve(id, 1).await }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 5);
    let level = stores.products.stock_level(product.id).await.unwrap();
    assert_eq!(level.stock, 0);
}

#[tokio::test]
#[serial]
async fn test_order_round_trip_and_duplicate_number() {
    let stores = get_test_stores().await;
    let product = Product::new("Widget", "W-1", Money::from_cents(1000), 5);
    let order = order_for(UserId::new(), &product, 2);

    stores.orders.create(&order).await.unwrap();
    let loaded = stores.orders.get_by_id(order.id()).await.unwrap();
    assert_eq!(loaded, order);
    assert_eq!(loaded.total(), Money::from_cents(2160));

    let by_number = stores
        .orders
        .get_by_order_number(order.order_number())
        .await
        .unwrap();
    assert_eq!(by_number.id(), order.id());

    let clash = Order::place(NewOrder {
        id: OrderId::new(),
        user_id: order.user_id(),
        order_number: order.order_number().clone(),
        lines: order.lines().to_vec(),
        tax: Money::zero(),
        shipping: Money::zero(),
        discount: Money::zero(),
        currency: "USD".to_string(),
        shipping_address: address(),
        billing_address: address(),
        notes: None,
        placed_at: Utc::now(),
    })
    .unwrap();
    let err = stores.orders.create(&clash).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateOrderNumber(_)));
}

#[tokio::test]
#[serial]
async fn test_update_checks_version() {
    let stores = get_test_stores().await;
    let product = Product::new("Widget", "W-1", Money::from_cents(1000), 5);
    let order = order_for(UserId::new(), &product, 1);
    stores.orders.create(&order).await.unwrap();

    let mut first = stores.orders.get_by_id(order.id()).await.unwrap();
    let mut stale = first.clone();

    first.transition_to(OrderStatus::Confirmed, Utc::now()).unwrap();
    stores.orders.update(&mut first).await.unwrap();
    assert_eq!(first.version(), 1);

    stale.cancel(Utc::now()).unwrap();
    let err = stores.orders.update(&mut stale).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::ConcurrencyConflict {
            expected: 0,
            actual: 1,
            ..
        }
    ));

    let loaded = stores.orders.get_by_id(order.id()).await.unwrap();
    assert_eq!(loaded.status(), OrderStatus::Confirmed);
    assert_eq!(loaded.version(), 1);
}

#[tokio::test]
#[serial]
async fn test_list_applies_filters() {
    let stores = get_test_stores().await;
    let product = Product::new("Widget", "W-1", Money::from_cents(1000), 50);
    let user = UserId::new();

    let small = order_for(user, &product, 1);
    let large = order_for(user, &product, 5);
    let foreign = order_for(UserId::new(), &product, 3);
    for order in [&small, &large, &foreign] {
        stores.orders.create(order).await.unwrap();
    }

    let mine = stores
        .orders
        .get_by_user_id(user, &OrderFilter::new())
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);

    let big = stores
        .orders
        .list(&OrderFilter::new().total_between(Money::from_cents(3000), Money::from_cents(10_000)))
        .await
        .unwrap();
    let mut ids: Vec<_> = big.iter().map(|o| o.id()).collect();
    ids.sort();
    let mut expected = vec![large.id(), foreign.id()];
    expected.sort();
    assert_eq!(ids, expected);

    let pending = stores
        .orders
        .list(&OrderFilter::new().status(OrderStatus::Pending).page(1, 1))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
#[serial]
async fn test_one_completed_payment_per_order() {
    let stores = get_test_stores().await;
    let product = Product::new("Widget", "W-1", Money::from_cents(1000), 5);
    let mut order = order_for(UserId::new(), &product, 2);
    stores.orders.create(&order).await.unwrap();

    let first = completed_payment(&order);
    stores.payments.record(&first).await.unwrap();

    let second = completed_payment(&order);
    let err = stores.payments.record(&second).await.unwrap_err();
    assert!(matches!(err, StoreError::PaymentAlreadyCompleted(_)));

    assert!(stores.payments.has_completed(order.id()).await.unwrap());
    let loaded = stores.payments.get(first.id()).await.unwrap();
    assert_eq!(loaded.status(), PaymentStatus::Completed);
    assert!(loaded.processed_at().is_some());

    let by_ref = stores
        .payments
        .get_by_transaction_ref(first.transaction_ref().unwrap())
        .await
        .unwrap();
    assert_eq!(by_ref.map(|p| p.id()), Some(first.id()));

    order.transition_to(OrderStatus::Confirmed, Utc::now()).unwrap();
    order
        .set_payment_status(PaymentStatus::Processing, Utc::now())
        .unwrap();
    order
        .set_payment_status(PaymentStatus::Completed, Utc::now())
        .unwrap();
    stores.orders.update(&mut order).await.unwrap();

    let to_process = stores.orders.get_orders_to_process().await.unwrap();
    assert_eq!(to_process.len(), 1);
    assert_eq!(to_process[0].id(), order.id());
}

#[tokio::test]
#[serial]
async fn test_payment_listing_filters_by_user_and_method() {
    let stores = get_test_stores().await;
    let product = Product::new("Widget", "W-1", Money::from_cents(1000), 5);
    let user = UserId::new();
    let order = order_for(user, &product, 1);
    stores.orders.create(&order).await.unwrap();

    let payment = completed_payment(&order);
    stores.payments.record(&payment).await.unwrap();

    let mine = stores
        .payments
        .list(&PaymentFilter::new().user_id(user).method(PaymentMethod::Stripe))
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id(), payment.id());

    let cards = stores
        .payments
        .list(&PaymentFilter::new().user_id(user).method(PaymentMethod::CreditCard))
        .await
        .unwrap();
    assert!(cards.is_empty());

    let for_order = stores
        .payments
        .list(&PaymentFilter::new().order_id(order.id()).status(PaymentStatus::Completed))
        .await
        .unwrap();
    assert_eq!(for_order.len(), 1);
}
