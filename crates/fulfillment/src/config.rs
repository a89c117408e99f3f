//! Workflow configuration loaded from environment variables.

use std::sync::Arc;

use domain::{FlatRateTax, Money, TaxPolicy};

/// Pricing and logging settings with sensible defaults.
///
/// Reads from environment variables:
/// - `FULFILLMENT_TAX_RATE_BPS`: flat tax rate in basis points (default: `800`)
/// - `FULFILLMENT_SHIPPING_FEE_CENTS`: flat shipping fee (default: `0`)
/// - `FULFILLMENT_CURRENCY`: currency code stamped on orders (default: `"USD"`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct FulfillmentConfig {
    pub tax_rate_bps: u32,
    pub shipping_fee_cents: i64,
    pub currency: String,
    pub log_level: String,
}

impl FulfillmentConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    ///
    /// Unparseable numbers fall back to the default as well.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tax_rate_bps: std::env::var("FULFILLMENT_TAX_RATE_BPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.tax_rate_bps),
            shipping_fee_cents: std::env::var("FULFILLMENT_SHIPPING_FEE_CENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|fee: &i64| *fee >= 0)
                .unwrap_or(defaults.shipping_fee_cents),
            currency: std::env::var("FULFILLMENT_CURRENCY").unwrap_or(defaults.currency),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    pub fn tax_policy(&self) -> Arc<dyn TaxPolicy> {
        Arc::new(FlatRateTax::new(self.tax_rate_bps))
    }

    pub fn shipping_fee(&self) -> Money {
        Money::from_cents(self.shipping_fee_cents)
    }
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            tax_rate_bps: FlatRateTax::DEFAULT_BASIS_POINTS,
            shipping_fee_cents: 0,
            currency: "USD".to_string(),
            log_level: "info".to_string(),
        }
    }
}
