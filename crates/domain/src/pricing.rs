//! Tax computation.

use crate::money::Money;

/// Deterministic tax computation over an order subtotal.
pub trait TaxPolicy: Send + Sync {
    fn tax_for(&self, subtotal: Money) -> Money;
}

/// Flat percentage of the subtotal, in basis points (800 = 8%).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRateTax {
    basis_points: u32,
}

impl FlatRateTax {
    pub const DEFAULT_BASIS_POINTS: u32 = 800;

    pub fn new(basis_points: u32) -> Self {
        Self { basis_points }
    }

    pub fn basis_points(&self) -> u32 {
        self.basis_points
    }
}

impl Default for FlatRateTax {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASIS_POINTS)
    }
}

impl TaxPolicy for FlatRateTax {
    fn tax_for(&self, subtotal: Money) -> Money {
        subtotal.apply_basis_points(self.basis_points)
    }
}
