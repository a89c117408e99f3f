use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    AddressSnapshot, DomainEvent, FlatRateTax, FulfillmentEvent, Money, NewOrder, Order,
    OrderCreatedData, OrderId, OrderLine, OrderNumber, OrderStatus, ProductId, TaxPolicy, UserId,
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

fn new_order(line_count: u32) -> NewOrder {
    let now = Utc::now();
    let lines: Vec<OrderLine> = (1..=line_count)
        .map(|i| {
            OrderLine::new(
                ProductId::new(),
                format!("Product {i}"),
                format!("SKU-{i}"),
                Money::from_cents(999),
                i,
            )
            .unwrap()
        })
        .collect();
    let subtotal: Money = lines.iter().map(|l| l.line_total).sum();

    NewOrder {
        id: OrderId::new(),
        user_id: UserId::new(),
        order_number: OrderNumber::generate(now),
        lines,
        tax: FlatRateTax::default().tax_for(subtotal),
        shipping: Money::zero(),
        discount: Money::zero(),
        currency: "USD".to_string(),
        shipping_address: address(),
        billing_address: address(),
        notes: None,
        placed_at: now,
    }
}

fn bench_place_order(c: &mut Criterion) {
    c.bench_function("domain/place_order_10_lines", |b| {
        b.iter(|| Order::place(new_order(10)).unwrap());
    });
}

fn bench_status_walk(c: &mut Criterion) {
    c.bench_function("domain/status_walk", |b| {
        b.iter(|| {
            let mut order = Order::place(new_order(1)).unwrap();
            let now = Utc::now();
            order.transition_to(OrderStatus::Confirmed, now).unwrap();
            order.transition_to(OrderStatus::Processing, now).unwrap();
            order.check_invariants().unwrap();
        });
    });
}

fn bench_event_envelope(c: &mut Criterion) {
    let order = Order::place(new_order(3)).unwrap();

    c.bench_function("domain/order_created_envelope", |b| {
        b.iter(|| {
            FulfillmentEvent::OrderCreated(OrderCreatedData {
                order_id: order.id(),
                user_id: order.user_id(),
                order_number: order.order_number().clone(),
                total: order.total(),
                currency: order.currency().to_string(),
                item_count: order.item_count(),
                created_at: order.created_at(),
            })
            .to_envelope()
            .unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_place_order,
    bench_status_walk,
    bench_event_envelope
);
criterion_main!(benches);
