//! Value objects for the order domain.

use common::ProductId;
use serde::{Deserialize, Serialize};

use super::OrderError;

/// Money amount represented in cents to avoid floating point issues.
///
/// Serializes as the bare number of cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Multiplies by a quantity, saturating at the bounds of `i64`.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents.saturating_mul(i64::from(quantity)),
        }
    }

    /// Multiplies by a quantity. Returns `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts. Returns `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: ProductId,

    /// Display name captured when the order was placed.
    pub product_name: Option<String>,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit.
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order item without a product name.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: None,
            quantity,
            unit_price,
        }
    }

    /// Sets the product name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    /// Returns the total for this line (quantity * unit_price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Checks the line on its own: a product id, at least one unit, a
    /// positive unit price and a line total that fits in `i64` cents.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.product_id.is_blank() {
            return Err(OrderError::ProductIdRequired);
        }
        if self.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                product_id: self.product_id.to_string(),
                quantity: self.quantity,
            });
        }
        if !self.unit_price.is_positive() {
            return Err(OrderError::InvalidPrice {
                product_id: self.product_id.to_string(),
                price: self.unit_price.cents(),
            });
        }
        if self.unit_price.checked_multiply(self.quantity).is_none() {
            return Err(OrderError::AmountOverflow);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert_eq!(money.dollars(), 12);
        assert_eq!(money.cents_part(), 34);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn test_money_arithmetic() {
        let mut total = Money::from_cents(1000) + Money::from_cents(500);
        total += Money::from_cents(1);
        assert_eq!(total.cents(), 1501);
        assert_eq!(Money::from_cents(250).multiply(4).cents(), 1000);
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [100, 250, 50].into_iter().map(Money::from_cents).sum();
        assert_eq!(total, Money::from_cents(400));
        assert_eq!(std::iter::empty::<Money>().sum::<Money>(), Money::zero());
    }

    #[test]
    fn test_money_serializes_as_cents() {
        assert_eq!(serde_json::to_string(&Money::from_cents(999)).unwrap(), "999");
        let money: Money = serde_json::from_str("42").unwrap();
        assert_eq!(money.cents(), 42);
    }

    #[test]
    fn test_money_checked_arithmetic() {
        let half = Money::from_cents(i64::MAX / 2);
        assert_eq!(half.checked_multiply(2), Some(Money::from_cents(i64::MAX - 1)));
        assert_eq!(half.checked_multiply(3), None);
        assert_eq!(half.checked_add(half), Some(Money::from_cents(i64::MAX - 1)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(half.multiply(3), Money::from_cents(i64::MAX));
    }

    #[test]
    fn test_order_item_with_overflowing_total_is_invalid() {
        let item = OrderItem::new("SKU-001", 3, Money::from_cents(i64::MAX / 2));
        assert_eq!(item.validate(), Err(OrderError::AmountOverflow));
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem::new("SKU-001", 3, Money::from_cents(1000));
        assert_eq!(item.line_total().cents(), 3000);
    }

    #[test]
    fn test_order_item_validation() {
        assert!(
            OrderItem::new("SKU-001", 1, Money::from_cents(1))
                .with_name("Widget")
                .validate()
                .is_ok()
        );
        assert!(matches!(
            OrderItem::new("SKU-001", 0, Money::from_cents(100)).validate(),
            Err(OrderError::InvalidQuantity { quantity: 0, .. })
        ));
        assert!(matches!(
            OrderItem::new("SKU-001", 1, Money::zero()).validate(),
            Err(OrderError::InvalidPrice { price: 0, .. })
        ));
        assert!(matches!(
            OrderItem::new("  ", 1, Money::from_cents(100)).validate(),
            Err(OrderError::ProductIdRequired)
        ));
    }
}
