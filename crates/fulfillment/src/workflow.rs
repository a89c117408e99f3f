//! The order fulfillment workflow.

use std::sync::Arc;

use chrono::Utc;
use common::{AddressId, ProductId, UserId};
use domain::{
    AddressSnapshot, CartClearedData, DomainEvent, FulfillmentEvent, NewPayment, Order,
    OrderCancelledData, OrderCreatedData, OrderNumber, OrderStatus, OrderStatusChangedData,
    Payment, PaymentProcessedData, PaymentStatus, PaymentStatusUpdatedData, Shipment,
    ShipmentCreatedData, ShipmentStatusChangedData, StockLevel, StockLowData,
};
use outbox::EventSink;
use store::filter::MAX_PAGE_SIZE;
use store::{
    AddressBook, CartStore, InventoryLedger, OrderFilter, OrderRepository, PaymentLedger,
    ProductCatalog,
};

use crate::builder::{LineRequest, OrderBuilder, OrderDraft};
use crate::config::FulfillmentConfig;
use crate::error::{FulfillmentError, Result};
use crate::requests::{
    CancelOrder, CreateOrder, CreateOrderFromCart, CreateShipment, GetOrder, GetOrderByNumber,
    GetOrderPayments, GetOrderSummary, GetOrdersToProcess, GetPayment, GetPaymentByTransactionRef,
    GetUserOrders, ListOrders, ListPayments, PaymentOutcome, ProcessPayment, UpdateOrderStatus,
    UpdatePaymentStatus, UpdateShipmentStatus,
};
use crate::summary::OrderSummary;

/// The ports the workflow talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn ProductCatalog>,
    pub ledger: Arc<dyn InventoryLedger>,
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentLedger>,
    pub addresses: Arc<dyn AddressBook>,
    pub carts: Arc<dyn CartStore>,
    pub events: Arc<dyn EventSink>,
}

/// Coordinates checkout, payment, shipping and cancellation.
///
/// Stock is reserved line by line through the inventory ledger. When a later
/// line or the order insert fails, every line reserved so far is restored in
/// reverse order before the error is returned. Reservation and persistence
/// run on a spawned task, so dropping the caller's future never strands
/// reserved stock.
///
/// Events are published after the state change is persisted. Publication
/// failures are logged and counted, never returned.
#[derive(Clone)]
pub struct OrderWorkflow {
    deps: Collaborators,
    builder: Arc<OrderBuilder>,
}

impl OrderWorkflow {
    pub fn new(deps: Collaborators, config: &FulfillmentConfig) -> Self {
        Self::with_builder(deps, OrderBuilder::from_config(config))
    }

    pub fn with_builder(deps: Collaborators, builder: OrderBuilder) -> Self {
        Self {
            deps,
            builder: Arc::new(builder),
        }
    }

    /// Validates, reserves stock for and persists a new order.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id, lines = request.lines.len()))]
    pub async fn create_order(&self, request: CreateOrder) -> Result<Order> {
        let started = std::time::Instant::now();

        let result = self.place_order(request).await;
        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total").increment(1);
                metrics::histogram!("order_creation_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(
                    order_id = %order.id(),
                    order_number = %order.order_number(),
                    total = %order.total(),
                    "order created"
                );
            }
            Err(e) => {
                metrics::counter!("order_creation_failed_total").increment(1);
                tracing::warn!(error = %e, "order creation rejected");
            }
        }
        result
    }

    async fn place_order(&self, request: CreateOrder) -> Result<Order> {
        let shipping_address = self
            .owned_address(request.user_id, request.shipping_address_id)
            .await?;
        let billing_address = self
            .owned_address(request.user_id, request.billing_address_id)
            .await?;

        let order_number = match request.order_number.as_deref() {
            Some(raw) => {
                let number = OrderNumber::parse(raw)?;
                if self.deps.orders.order_number_exists(&number).await? {
                    return Err(FulfillmentError::DuplicateOrderNumber(number));
                }
                Some(number)
            }
            None => None,
        };

        let draft = OrderDraft {
            user_id: request.user_id,
            lines: request.lines,
            shipping_address,
            billing_address,
            notes: request.notes,
            order_number,
        };
        let order = self
            .builder
            .build(self.deps.catalog.as_ref(), draft, Utc::now())
            .await?;

        let workflow = self.clone();
        let (order, levels) =
            tokio::spawn(async move { workflow.reserve_and_persist(order).await }).await??;

        self.emit(FulfillmentEvent::OrderCreated(OrderCreatedData {
            order_id: order.id(),
            user_id: order.user_id(),
            order_number: order.order_number().clone(),
            total: order.total(),
            currency: order.currency().to_string(),
            item_count: order.item_count(),
            created_at: order.created_at(),
        }))
        .await;

        for level in levels.into_iter().filter(StockLevel::is_low) {
            tracing::info!(product_id = %level.product_id, stock = level.stock, "stock low");
            self.emit(FulfillmentEvent::StockLow(StockLowData {
                product_id: level.product_id,
                stock: level.stock,
                min_stock: level.min_stock,
                observed_at: Utc::now(),
            }))
            .await;
        }

        Ok(order)
    }

    /// Reserves every line, then inserts the order.
    ///
    /// Returns the stock level after each reservation.
    async fn reserve_and_persist(&self, order: Order) -> Result<(Order, Vec<StockLevel>)> {
        let mut reserved: Vec<(ProductId, u32)> = Vec::with_capacity(order.lines().len());
        let mut levels = Vec::with_capacity(order.lines().len());

        for line in order.lines() {
            match self.deps.ledger.reserve(line.product_id, line.quantity).await {
                Ok(level) => {
                    reserved.push((line.product_id, line.quantity));
                    levels.push(level);
                }
                Err(e) => {
                    tracing::warn!(
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        error = %e,
                        "reservation failed, releasing earlier lines"
                    );
                    self.release(&reserved).await;
                    return Err(e.into());
                }
            }
        }

        if let Err(e) = self.deps.orders.create(&order).await {
            tracing::warn!(order_id = %order.id(), error = %e, "order insert failed, releasing stock");
            self.release(&reserved).await;
            return Err(e.into());
        }

        Ok((order, levels))
    }

    /// Gives reserved stock back, newest reservation first.
    async fn release(&self, reserved: &[(ProductId, u32)]) {
        if reserved.is_empty() {
            return;
        }
        metrics::counter!("stock_reservations_rolled_back_total").increment(1);

        for (product_id, quantity) in reserved.iter().rev() {
            self.restore_stock(*product_id, *quantity).await;
        }
    }

    async fn restore_stock(&self, product_id: ProductId, quantity: u32) {
        if let Err(e) = self.deps.ledger.restore(product_id, quantity).await {
            metrics::counter!("stock_restore_failures_total").increment(1);
            tracing::error!(%product_id, quantity, error = %e, "failed to restore stock");
        }
    }

    async fn owned_address(&self, user_id: UserId, address_id: AddressId) -> Result<AddressSnapshot> {
        let address = self.deps.addresses.get_address(address_id).await?;
        if !address.belongs_to(user_id) {
            return Err(FulfillmentError::AddressNotOwned(address_id));
        }
        Ok(address.snapshot())
    }

    /// Places an order from the user's cart.
    ///
    /// The cart is cleared only after the order exists. A failure to clear it
    /// is logged and does not fail the checkout.
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_order_from_cart(&self, request: CreateOrderFromCart) -> Result<Order> {
        let cart = self
            .deps
            .carts
            .get_cart_for_user(request.user_id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(FulfillmentError::CartEmpty(request.user_id))?;

        let lines = cart
            .lines
            .iter()
            .map(|line| LineRequest::new(line.product_id, line.quantity))
            .collect();
        let mut create = CreateOrder::new(
            request.user_id,
            lines,
            request.shipping_address_id,
            request.billing_address_id,
        );
        create.notes = request.notes;

        let order = self.create_order(create).await?;

        match self.deps.carts.clear_cart(cart.id).await {
            Ok(()) => {
                self.emit(FulfillmentEvent::CartCleared(CartClearedData {
                    cart_id: cart.id,
                    user_id: cart.user_id,
                    reason: "order_created".to_string(),
                    cleared_at: Utc::now(),
                }))
                .await;
            }
            Err(e) => {
                tracing::warn!(cart_id = %cart.id, order_id = %order.id(), error = %e, "failed to clear cart");
            }
        }

        Ok(order)
    }

    /// Cancels an order on behalf of its owner and gives its stock back.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn cancel_order(&self, request: CancelOrder) -> Result<Order> {
        let order = self.deps.orders.get_by_id(request.order_id).await?;
        if order.user_id() != request.user_id {
            return Err(FulfillmentError::NotOrderOwner {
                order_id: order.id(),
                user_id: request.user_id,
            });
        }
        self.cancel_and_restore(order, request.reason).await
    }

    async fn cancel_and_restore(&self, mut order: Order, reason: String) -> Result<Order> {
        order.cancel(Utc::now())?;

        let workflow = self.clone();
        let order = tokio::spawn(async move {
            workflow.deps.orders.update(&mut order).await?;
            for line in order.lines() {
                workflow.restore_stock(line.product_id, line.quantity).await;
            }
            Ok::<_, FulfillmentError>(order)
        })
        .await??;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order.id(), %reason, "order cancelled");

        let refund_required = order.is_paid();
        self.emit(FulfillmentEvent::OrderCancelled(OrderCancelledData {
            order_id: order.id(),
            user_id: order.user_id(),
            order_number: order.order_number().clone(),
            reason,
            refund_required,
            refund_amount: order.refund_amount(),
            cancelled_at: order.cancelled_at().unwrap_or_else(Utc::now),
        }))
        .await;

        Ok(order)
    }

    /// Moves an order to a new status.
    ///
    /// Cancelling this way restores stock exactly like [`Self::cancel_order`]
    /// but skips the ownership check.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, status = %request.status))]
    pub async fn update_order_status(&self, request: UpdateOrderStatus) -> Result<Order> {
        let mut order = self.deps.orders.get_by_id(request.order_id).await?;
        let previous = order.status();

        let order = if request.status == OrderStatus::Cancelled {
            if !previous.can_transition_to(OrderStatus::Cancelled) {
                return Err(FulfillmentError::InvalidStatusTransition {
                    from: previous,
                    to: OrderStatus::Cancelled,
                });
            }
            let reason = request
                .reason
                .clone()
                .unwrap_or_else(|| "status_update".to_string());
            self.cancel_and_restore(order, reason).await?
        } else {
            order.transition_to(request.status, Utc::now())?;
            self.deps.orders.update(&mut order).await?;
            order
        };

        tracing::info!(from = %previous, to = %order.status(), "order status changed");
        self.emit(FulfillmentEvent::OrderStatusChanged(OrderStatusChangedData {
            order_id: order.id(),
            user_id: order.user_id(),
            old_status: previous,
            new_status: order.status(),
            reason: request.reason,
            changed_at: order.updated_at(),
        }))
        .await;

        Ok(order)
    }

    /// Records a payment attempt with the outcome the gateway reported.
    ///
    /// A declined attempt is recorded and returned as a failed payment. An
    /// amount that does not match the order total is rejected before anything
    /// is recorded.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, amount = %request.amount))]
    pub async fn process_payment(&self, request: ProcessPayment) -> Result<Payment> {
        let order = self.deps.orders.get_by_id(request.order_id).await?;

        if request.amount != order.total() {
            metrics::counter!("payments_processed_total", "outcome" => "rejected").increment(1);
            tracing::warn!(expected = %order.total(), "payment amount does not match order total");
            return Err(FulfillmentError::PaymentFailed {
                order_id: order.id(),
                expected: order.total(),
                received: request.amount,
            });
        }
        ensure_payable(&order)?;
        if order.is_paid() || self.deps.payments.has_completed(order.id()).await? {
            return Err(FulfillmentError::PaymentAlreadyCompleted(order.id()));
        }

        let now = Utc::now();
        let mut payment = Payment::start(
            NewPayment {
                order_id: order.id(),
                user_id: order.user_id(),
                amount: request.amount,
                currency: order.currency().to_string(),
                method: request.method,
                transaction_ref: request.transaction_ref,
                gateway_response: request.gateway_response,
            },
            now,
        );

        let outcome = match request.outcome {
            PaymentOutcome::Approved => {
                payment.complete(now)?;
                "approved"
            }
            PaymentOutcome::Declined { reason } => {
                payment.fail(reason, now)?;
                "declined"
            }
        };
        let mut updated = order.clone();
        sync_payment_status(&mut updated, payment.status(), now)?;
        let order = self
            .commit_payment(order, updated, payment.clone(), PaymentWrite::Record)
            .await?;

        metrics::counter!("payments_processed_total", "outcome" => outcome).increment(1);
        tracing::info!(payment_id = %payment.id(), status = %payment.status(), "payment processed");

        self.emit(FulfillmentEvent::PaymentProcessed(PaymentProcessedData {
            payment_id: payment.id(),
            order_id: order.id(),
            user_id: order.user_id(),
            amount: payment.amount(),
            method: payment.method(),
            status: payment.status(),
            transaction_ref: payment.transaction_ref().map(str::to_string),
            occurred_at: now,
        }))
        .await;

        Ok(payment)
    }

    /// Moves a recorded payment and keeps the order's payment status in step.
    #[tracing::instrument(skip(self, request), fields(payment_id = %request.payment_id, status = %request.status))]
    pub async fn update_payment_status(&self, request: UpdatePaymentStatus) -> Result<Payment> {
        let mut payment = self.deps.payments.get(request.payment_id).await?;
        let order = self.deps.orders.get_by_id(payment.order_id()).await?;
        if matches!(
            request.status,
            PaymentStatus::Processing | PaymentStatus::Completed
        ) {
            ensure_payable(&order)?;
        }
        let now = Utc::now();

        let previous = match request.status {
            PaymentStatus::Failed => payment.fail(
                request
                    .failure_reason
                    .unwrap_or_else(|| "unspecified".to_string()),
                now,
            )?,
            status => payment.transition_to(status, now)?,
        };
        if let Some(transaction_ref) = request.transaction_ref {
            payment.set_transaction_ref(transaction_ref);
        }
        if let Some(response) = request.gateway_response {
            payment.set_gateway_response(response);
        }

        let mut updated = order.clone();
        sync_payment_status(&mut updated, payment.status(), now)?;
        self.commit_payment(order, updated, payment.clone(), PaymentWrite::Update)
            .await?;

        tracing::info!(from = %previous, to = %payment.status(), "payment status changed");
        self.emit(FulfillmentEvent::PaymentStatusUpdated(PaymentStatusUpdatedData {
            payment_id: payment.id(),
            order_id: payment.order_id(),
            old_status: previous,
            new_status: payment.status(),
            updated_at: now,
        }))
        .await;

        Ok(payment)
    }

    /// Persists a payment change together with the order it moves.
    ///
    /// The version-checked order update is the commit point. The payment is
    /// written only after it succeeds, and a failed payment write puts the
    /// order back as it was loaded.
    async fn commit_payment(
        &self,
        original: Order,
        mut order: Order,
        payment: Payment,
        write: PaymentWrite,
    ) -> Result<Order> {
        let workflow = self.clone();
        tokio::spawn(async move {
            workflow.deps.orders.update(&mut order).await?;

            let written = match write {
                PaymentWrite::Record => workflow.deps.payments.record(&payment).await,
                PaymentWrite::Update => workflow.deps.payments.update(&payment).await,
            };
            if let Err(e) = written {
                tracing::warn!(
                    order_id = %order.id(),
                    payment_id = %payment.id(),
                    error = %e,
                    "payment write failed, restoring order"
                );
                workflow.restore_order(original, order.version()).await;
                return Err(e.into());
            }
            Ok(order)
        })
        .await?
    }

    async fn restore_order(&self, mut original: Order, version: u64) {
        metrics::counter!("payment_rollbacks_total").increment(1);
        original.set_version(version);
        if let Err(e) = self.deps.orders.update(&mut original).await {
            metrics::counter!("order_restore_failures_total").increment(1);
            tracing::error!(order_id = %original.id(), error = %e, "failed to restore order");
        }
    }

    /// Attaches a shipment to a paid order that is being processed.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_shipment(&self, request: CreateShipment) -> Result<Shipment> {
        let mut order = self.deps.orders.get_by_id(request.order_id).await?;
        let shipment = order
            .add_shipment(
                request.tracking_number,
                request.carrier,
                request.estimated_delivery,
                Utc::now(),
            )?
            .clone();
        self.deps.orders.update(&mut order).await?;

        tracing::info!(shipment_id = %shipment.id, tracking_number = %shipment.tracking_number, "shipment created");
        self.emit(FulfillmentEvent::ShipmentCreated(ShipmentCreatedData {
            order_id: order.id(),
            shipment_id: shipment.id,
            tracking_number: shipment.tracking_number.clone(),
            carrier: shipment.carrier.clone(),
            created_at: shipment.created_at,
        }))
        .await;

        Ok(shipment)
    }

    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, shipment_id = %request.shipment_id))]
    pub async fn update_shipment_status(&self, request: UpdateShipmentStatus) -> Result<Order> {
        let mut order = self.deps.orders.get_by_id(request.order_id).await?;
        let now = Utc::now();
        let previous = order.update_shipment_status(request.shipment_id, request.status, now)?;
        self.deps.orders.update(&mut order).await?;

        self.emit(FulfillmentEvent::ShipmentStatusChanged(ShipmentStatusChangedData {
            order_id: order.id(),
            shipment_id: request.shipment_id,
            old_status: previous,
            new_status: request.status,
            changed_at: now,
        }))
        .await;

        Ok(order)
    }

    pub async fn get_order(&self, request: GetOrder) -> Result<Order> {
        Ok(self.deps.orders.get_by_id(request.order_id).await?)
    }

    pub async fn get_order_by_number(&self, request: GetOrderByNumber) -> Result<Order> {
        let number = OrderNumber::parse(&request.order_number)?;
        Ok(self.deps.orders.get_by_order_number(&number).await?)
    }

    pub async fn list_orders(&self, request: ListOrders) -> Result<Vec<Order>> {
        Ok(self.deps.orders.list(&request.filter).await?)
    }

    pub async fn get_user_orders(&self, request: GetUserOrders) -> Result<Vec<Order>> {
        Ok(self
            .deps
            .orders
            .get_by_user_id(request.user_id, &request.filter)
            .await?)
    }

    pub async fn get_orders_to_process(&self, _request: GetOrdersToProcess) -> Result<Vec<Order>> {
        Ok(self.deps.orders.get_orders_to_process().await?)
    }

    /// Payments of an order, newest first.
    pub async fn get_order_payments(&self, request: GetOrderPayments) -> Result<Vec<Payment>> {
        Ok(self.deps.payments.list_for_order(request.order_id).await?)
    }

    pub async fn get_payment(&self, request: GetPayment) -> Result<Payment> {
        Ok(self.deps.payments.get(request.payment_id).await?)
    }

    /// Resolves a gateway reference to the newest payment carrying it.
    pub async fn get_payment_by_transaction_ref(
        &self,
        request: GetPaymentByTransactionRef,
    ) -> Result<Payment> {
        self.deps
            .payments
            .get_by_transaction_ref(&request.transaction_ref)
            .await?
            .ok_or(FulfillmentError::PaymentReferenceNotFound(request.transaction_ref))
    }

    pub async fn list_payments(&self, request: ListPayments) -> Result<Vec<Payment>> {
        Ok(self.deps.payments.list(&request.filter).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order_summary(&self, request: GetOrderSummary) -> Result<OrderSummary> {
        let mut filter = OrderFilter {
            user_id: request.user_id,
            ordered_from: request.from,
            ordered_to: request.to,
            ..OrderFilter::default()
        }
        .page(1, MAX_PAGE_SIZE);

        let mut orders = Vec::new();
        loop {
            let page = self.deps.orders.list(&filter).await?;
            let last = page.len() < filter.limit() as usize;
            orders.extend(page);
            if last {
                break;
            }
            filter.page += 1;
        }

        Ok(OrderSummary::from_orders(&orders)?)
    }

    async fn emit(&self, event: FulfillmentEvent) {
        let event_type = event.event_type();
        let published = match event.to_envelope() {
            Ok(envelope) => self.deps.events.publish(envelope).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = published {
            metrics::counter!("event_publish_failures_total", "event_type" => event_type)
                .increment(1);
            tracing::warn!(event_type, error = %e, "failed to publish event");
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PaymentWrite {
    Record,
    Update,
}

/// Cancelled and refunded orders take no further payments.
fn ensure_payable(order: &Order) -> Result<()> {
    if matches!(order.status(), OrderStatus::Cancelled | OrderStatus::Refunded) {
        return Err(FulfillmentError::OrderNotPayable {
            order_id: order.id(),
            status: order.status(),
        });
    }
    Ok(())
}

/// Moves the order's payment status to `target`, passing through
/// `Processing` when the order has not seen an attempt yet.
fn sync_payment_status(
    order: &mut Order,
    target: PaymentStatus,
    at: chrono::DateTime<Utc>,
) -> Result<()> {
    let current = order.payment_status();
    if current == target {
        return Ok(());
    }
    if !current.can_transition_to(target)
        && current.can_transition_to(PaymentStatus::Processing)
        && PaymentStatus::Processing.can_transition_to(target)
    {
        order.set_payment_status(PaymentStatus::Processing, at)?;
    }
    order.set_payment_status(target, at)?;
    Ok(())
}
