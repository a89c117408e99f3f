use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{Money, Order, OrderStatus, Payment, PaymentMethod, PaymentStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Field an order listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    OrderedAt,
    Total,
    OrderNumber,
    Status,
}

impl SortField {
    /// Column name in the orders table.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::OrderedAt => "ordered_at",
            SortField::Total => "total_cents",
            SortField::OrderNumber => "order_number",
            SortField::Status => "status",
        }
    }

    fn compare(&self, a: &Order, b: &Order) -> Ordering {
        match self {
            SortField::OrderedAt => a.ordered_at().cmp(&b.ordered_at()),
            SortField::Total => a.total().cmp(&b.total()),
            SortField::OrderNumber => a.order_number().cmp(b.order_number()),
            SortField::Status => a.status().as_str().cmp(b.status().as_str()),
        }
    }
}

/// Criteria for listing orders.
///
/// Pages are 1-based. Sorting defaults to newest first.
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub user_id: Option<UserId>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub ordered_from: Option<DateTime<Utc>>,
    pub ordered_to: Option<DateTime<Utc>>,
    pub min_total: Option<Money>,
    pub max_total: Option<Money>,
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortField,
    pub descending: bool,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            status: None,
            payment_status: None,
            ordered_from: None,
            ordered_to: None,
            min_total: None,
            max_total: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortField::OrderedAt,
            descending: true,
        }
    }
}

impl OrderFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn payment_status(mut self, payment_status: PaymentStatus) -> Self {
        self.payment_status = Some(payment_status);
        self
    }

    /// Restricts to orders placed within `[from, to]`.
    pub fn ordered_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.ordered_from = Some(from);
        self.ordered_to = Some(to);
        self
    }

    /// Restricts to orders whose total lies within `[min, max]`.
    pub fn total_between(mut self, min: Money, max: Money) -> Self {
        self.min_total = Some(min);
        self.max_total = Some(max);
        self
    }

    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn sort_by(mut self, field: SortField, descending: bool) -> Self {
        self.sort_by = field;
        self.descending = descending;
        self
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> u32 {
        page_limit(self.page_size)
    }

    /// Rows to skip for the requested page. Page 0 is treated as page 1.
    pub fn offset(&self) -> u64 {
        page_offset(self.page, self.page_size)
    }

    /// Returns true if the order passes every criterion. Paging is ignored.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(user_id) = self.user_id
            && order.user_id() != user_id
        {
            return false;
        }
        if let Some(status) = self.status
            && order.status() != status
        {
            return false;
        }
        if let Some(payment_status) = self.payment_status
            && order.payment_status() != payment_status
        {
            return false;
        }
        if let Some(from) = self.ordered_from
            && order.ordered_at() < from
        {
            return false;
        }
        if let Some(to) = self.ordered_to
            && order.ordered_at() > to
        {
            return false;
        }
        if let Some(min) = self.min_total
            && order.total() < min
        {
            return false;
        }
        if let Some(max) = self.max_total
            && order.total() > max
        {
            return false;
        }
        true
    }

    /// Filters, sorts and paginates an in-memory collection.
    pub fn apply<'a>(&self, orders: impl IntoIterator<Item = &'a Order>) -> Vec<Order> {
        let mut matching: Vec<&Order> = orders.into_iter().filter(|o| self.matches(o)).collect();

        matching.sort_by(|a, b| {
            let ordering = self
                .sort_by
                .compare(a, b)
                .then_with(|| a.id().cmp(&b.id()));
            if self.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        matching
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit() as usize)
            .cloned()
            .collect()
    }
}

fn page_limit(page_size: u32) -> u32 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

fn page_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.max(1) - 1) * u64::from(page_limit(page_size))
}

/// Criteria for listing payments. Results are newest first.
#[derive(Debug, Clone)]
pub struct PaymentFilter {
    pub order_id: Option<OrderId>,
    pub user_id: Option<UserId>,
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for PaymentFilter {
    fn default() -> Self {
        Self {
            order_id: None,
            user_id: None,
            status: None,
            method: None,
            created_from: None,
            created_to: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaymentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn status(mut self, status: PaymentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Restricts to payments created within `[from, to]`.
    pub fn created_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self.created_to = Some(to);
        self
    }

    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn limit(&self) -> u32 {
        page_limit(self.page_size)
    }

    pub fn offset(&self) -> u64 {
        page_offset(self.page, self.page_size)
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        self.order_id.is_none_or(|id| payment.order_id() == id)
            && self.user_id.is_none_or(|id| payment.user_id() == id)
            && self.status.is_none_or(|status| payment.status() == status)
            && self.method.is_none_or(|method| payment.method() == method)
            && self.created_from.is_none_or(|from| payment.created_at() >= from)
            && self.created_to.is_none_or(|to| payment.created_at() <= to)
    }

    /// Filters, sorts newest first and paginates.
    pub fn apply<'a>(&self, payments: impl IntoIterator<Item = &'a Payment>) -> Vec<Payment> {
        let mut matching: Vec<&Payment> =
            payments.into_iter().filter(|p| self.matches(p)).collect();
        matching.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        matching
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit() as usize)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let filter = OrderFilter::new();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(filter.offset(), 0);
        assert_eq!(filter.sort_by, SortField::OrderedAt);
        assert!(filter.descending);
    }

    #[test]
    fn test_offset_and_clamping() {
        assert_eq!(OrderFilter::new().page(3, 10).offset(), 20);
        assert_eq!(OrderFilter::new().page(0, 10).offset(), 0);
        assert_eq!(OrderFilter::new().page(1, 0).limit(), 1);
        assert_eq!(OrderFilter::new().page(1, 5000).limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_sort_columns() {
        assert_eq!(SortField::OrderedAt.column(), "ordered_at");
        assert_eq!(SortField::Total.column(), "total_cents");
    }

    #[test]
    fn test_payment_filter_matches_and_pages() {
        let now = Utc::now();
        let order_id = OrderId::new();
        let user_id = UserId::new();
        let payments: Vec<Payment> = (0..3)
            .map(|i| {
                Payment::start(
                    domain::NewPayment {
                        order_id,
                        user_id,
                        amount: Money::from_cents(2160),
                        currency: "USD".to_string(),
                        method: if i == 0 {
                            PaymentMethod::Paypal
                        } else {
                            PaymentMethod::CreditCard
                        },
                        transaction_ref: None,
                        gateway_response: None,
                    },
                    now + chrono::Duration::seconds(i),
                )
            })
            .collect();

        let cards = PaymentFilter::new()
            .order_id(order_id)
            .method(PaymentMethod::CreditCard)
            .apply(&payments);
        assert_eq!(cards.len(), 2);
        assert!(cards[0].created_at() > cards[1].created_at());

        let second_page = PaymentFilter::new().user_id(user_id).page(2, 2).apply(&payments);
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].method(), PaymentMethod::Paypal);

        assert!(PaymentFilter::new().user_id(UserId::new()).apply(&payments).is_empty());
        assert!(
            PaymentFilter::new()
                .status(PaymentStatus::Completed)
                .apply(&payments)
                .is_empty()
        );
    }
}
