use std::sync::Arc;

use crate::domain::order::{any_active, Delivery, Order, OrderStatus, Payment, Shipping};
use crate::domain::ports::OrderApi;

use super::Derived;

/// Which order-mutating actions are currently allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockStatus {
    pub has_payment: bool,
    pub has_shipping: bool,
    pub has_delivery: bool,
    pub is_canceled: bool,
    pub is_completed: bool,
    /// Most recently created canceled payment, kept for audit display.
    pub canceled_payment: Option<Payment>,
}

impl LockStatus {
    pub fn from_records(
        order: &Order,
        payments: &[Payment],
        shippings: &[Shipping],
        deliveries: &[Delivery],
    ) -> Self {
        let canceled_payment = payments
            .iter()
            .filter(|p| p.canceled)
            .max_by_key(|p| p.created_at)
            .cloned();

        Self {
            has_payment: any_active(payments),
            has_shipping: any_active(shippings),
            has_delivery: any_active(deliveries),
            is_canceled: order.status == OrderStatus::Canceled,
            is_completed: order.status == OrderStatus::Completed,
            canceled_payment,
        }
    }

    pub fn can_edit(&self) -> bool {
        !self.is_canceled && !self.has_payment
    }

    pub fn can_pay(&self) -> bool {
        !self.is_canceled && !self.has_payment
    }
}

pub struct LockStatusResolver<A> {
    api: Arc<A>,
}

impl<A: OrderApi> LockStatusResolver<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Reads the order and its three dependent collections concurrently.
    ///
    /// A single failed read fails the whole derivation: every flag comes back
    /// false and the error is reported.
    pub async fn resolve(&self, order_id: i64) -> Derived<LockStatus> {
        let api = &self.api;
        let fetched = tokio::try_join!(
            api.get_order(order_id),
            api.list_payments(order_id),
            api.list_shippings(order_id),
            api.list_deliveries(order_id),
        );

        match fetched {
            Ok((order, payments, shippings, deliveries)) => Derived::ok(LockStatus::from_records(
                &order,
                &payments,
                &shippings,
                &deliveries,
            )),
            Err(e) => {
                log::error!("Failed to check lock status of order {}: {}", order_id, e);
                Derived::failed(e)
            }
        }
    }

    pub async fn has_active_payment(&self, order_id: i64) -> Derived<bool> {
        match self.api.list_payments(order_id).await {
            Ok(payments) => Derived::ok(any_active(&payments)),
            Err(e) => {
                log::error!("Failed to check payment status of order {}: {}", order_id, e);
                Derived::failed(e)
            }
        }
    }
}
