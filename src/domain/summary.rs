//! Order financials derived from a line-item collection.
//!
//! All arithmetic is exact decimal. Rates and thresholds:
//! lines priced above 500 get a 10% discount on their line value, shipping is
//! free once the subtotal exceeds 500 and costs 15 otherwise, and tax is 8% of
//! the subtotal.

use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;

use super::order::{LineItem, OrderItem};

fn free_shipping_threshold() -> BigDecimal {
    BigDecimal::from(500)
}

fn discount_threshold() -> BigDecimal {
    BigDecimal::from(500)
}

fn discount_rate() -> BigDecimal {
    BigDecimal::new(BigInt::from(10), 2)
}

fn tax_rate() -> BigDecimal {
    BigDecimal::new(BigInt::from(8), 2)
}

fn flat_shipping_fee() -> BigDecimal {
    BigDecimal::from(15)
}

/// Anything with a unit price and a quantity.
pub trait Priced {
    fn unit_price(&self) -> &BigDecimal;
    fn units(&self) -> u32;
}

impl Priced for LineItem {
    fn unit_price(&self) -> &BigDecimal {
        &self.price
    }
    fn units(&self) -> u32 {
        self.quantity
    }
}

impl Priced for OrderItem {
    fn unit_price(&self) -> &BigDecimal {
        &self.price
    }
    fn units(&self) -> u32 {
        self.quantity
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub subtotal: BigDecimal,
    pub total_items: u64,
    pub total_products: usize,
    pub average_price: BigDecimal,
    pub most_expensive: BigDecimal,
    pub cheapest: BigDecimal,
    pub estimated_discount: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub estimated_tax: BigDecimal,
    pub grand_total: BigDecimal,
}

impl OrderSummary {
    /// Summary of an empty collection: every figure is zero, shipping included.
    pub fn empty() -> Self {
        let zero = BigDecimal::from(0);
        Self {
            subtotal: zero.clone(),
            total_items: 0,
            total_products: 0,
            average_price: zero.clone(),
            most_expensive: zero.clone(),
            cheapest: zero.clone(),
            estimated_discount: zero.clone(),
            shipping_fee: zero.clone(),
            estimated_tax: zero.clone(),
            grand_total: zero,
        }
    }

    pub fn from_items<P: Priced>(items: &[P]) -> Self {
        if items.is_empty() {
            return Self::empty();
        }

        let line_value = |item: &P| item.unit_price() * BigDecimal::from(item.units());

        let subtotal: BigDecimal = items.iter().map(line_value).sum();
        let total_items: u64 = items.iter().map(|i| u64::from(i.units())).sum();

        let average_price = if total_items > 0 {
            subtotal.clone() / BigDecimal::from(total_items)
        } else {
            BigDecimal::from(0)
        };

        // Non-empty, so both folds see at least one price.
        let most_expensive = items
            .iter()
            .map(|i| i.unit_price())
            .max()
            .cloned()
            .unwrap_or_default();
        let cheapest = items
            .iter()
            .map(|i| i.unit_price())
            .min()
            .cloned()
            .unwrap_or_default();

        let discount_threshold = discount_threshold();
        let estimated_discount: BigDecimal = items
            .iter()
            .filter(|i| *i.unit_price() > discount_threshold)
            .map(|i| line_value(i) * discount_rate())
            .sum();

        let shipping_fee = if subtotal > free_shipping_threshold() {
            BigDecimal::from(0)
        } else {
            flat_shipping_fee()
        };
        let estimated_tax = &subtotal * tax_rate();
        let grand_total = &subtotal + &estimated_tax + &shipping_fee - &estimated_discount;

        Self {
            subtotal,
            total_items,
            total_products: items.len(),
            average_price,
            most_expensive,
            cheapest,
            estimated_discount,
            shipping_fee,
            estimated_tax,
            grand_total,
        }
    }

    /// Copy with every money figure rounded to `scale` decimal places.
    pub fn rounded(&self, scale: i64) -> Self {
        Self {
            subtotal: self.subtotal.round(scale),
            total_items: self.total_items,
            total_products: self.total_products,
            average_price: self.average_price.round(scale),
            most_expensive: self.most_expensive.round(scale),
            cheapest: self.cheapest.round(scale),
            estimated_discount: self.estimated_discount.round(scale),
            shipping_fee: self.shipping_fee.round(scale),
            estimated_tax: self.estimated_tax.round(scale),
            grand_total: self.grand_total.round(scale),
        }
    }
}
