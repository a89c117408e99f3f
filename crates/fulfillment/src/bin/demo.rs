//! Runs a checkout against the in-memory stores and prints the collected
//! metrics in Prometheus text format.

use std::sync::Arc;

use common::{AddressId, UserId};
use domain::{Address, Cart, Money, PaymentMethod, Product};
use fulfillment::{
    CancelOrder, Collaborators, CreateOrderFromCart, FulfillmentConfig, OrderWorkflow,
    ProcessPayment,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use outbox::ChannelEventSink;
use store::{
    InMemoryAddressBook, InMemoryCartStore, InMemoryOrderRepository, InMemoryPaymentLedger,
    InMemoryProductStore,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FulfillmentConfig::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire the workflow over in-memory stores
    let products = InMemoryProductStore::new();
    let addresses = InMemoryAddressBook::new();
    let carts = InMemoryCartStore::new();
    let (sink, mut receiver) = ChannelEventSink::new(64);

    let consumer = tokio::spawn(async move {
        while let Some(envelope) = receiver.recv().await {
            tracing::info!(
                event_type = %envelope.event_type,
                aggregate_id = %envelope.aggregate_id,
                "event published"
            );
        }
    });

    let user_id = UserId::new();
    let address_id = addresses
        .insert(Address {
            id: AddressId::new(),
            user_id,
            street: "221B Baker Street".to_string(),
            city: "London".to_string(),
            state: "Greater London".to_string(),
            postal_code: "NW1 6XE".to_string(),
            country: "GB".to_string(),
        })
        .await;
    let widget = products
        .insert(Product::new("Widget", "WID-001", Money::from_cents(1000), 5).with_min_stock(3))
        .await;
    carts.put(Cart::new(user_id).with_line(widget, 2)).await;

    let workflow = OrderWorkflow::new(
        Collaborators {
            catalog: Arc::new(products.clone()),
            ledger: Arc::new(products.clone()),
            orders: Arc::new(InMemoryOrderRepository::new()),
            payments: Arc::new(InMemoryPaymentLedger::new()),
            addresses: Arc::new(addresses),
            carts: Arc::new(carts),
            events: Arc::new(sink),
        },
        &config,
    );

    // 4. Checkout, a short payment, a full payment, then a cancellation
    let order = workflow
        .create_order_from_cart(CreateOrderFromCart::new(user_id, address_id, address_id))
        .await?;
    tracing::info!(
        order_number = %order.order_number(),
        total = %order.total(),
        "checkout complete"
    );

    let short = ProcessPayment::approved(
        order.id(),
        Money::from_cents(order.total().cents() - 1),
        PaymentMethod::CreditCard,
    );
    if let Err(e) = workflow.process_payment(short).await {
        tracing::info!(error = %e, kind = ?e.kind(), "short payment rejected");
    }

    workflow
        .process_payment(ProcessPayment::approved(
            order.id(),
            order.total(),
            PaymentMethod::CreditCard,
        ))
        .await?;
    workflow
        .cancel_order(CancelOrder::new(order.id(), user_id, "demo run"))
        .await?;
    tracing::info!(stock = ?products.stock_of(widget).await, "stock after cancellation");

    // 5. Close the sink so the consumer drains and exits
    drop(workflow);
    consumer.await?;

    println!("{}", metrics_handle.render());
    Ok(())
}
