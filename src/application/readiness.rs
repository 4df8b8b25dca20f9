use std::sync::Arc;

use crate::domain::ports::OrderApi;

use super::Derived;

/// Gate for the "make payment" action: the order needs items, a shipping
/// and a delivery on record. Canceled records still count.
pub struct ReadinessCheck<A> {
    api: Arc<A>,
}

impl<A: OrderApi> ReadinessCheck<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn check(&self, order_id: i64) -> Derived<bool> {
        let api = &self.api;
        let fetched = tokio::try_join!(
            api.get_order(order_id),
            api.list_shippings(order_id),
            api.list_deliveries(order_id),
        );

        match fetched {
            Ok((order, shippings, deliveries)) => Derived::ok(
                !order.items.is_empty() && !shippings.is_empty() && !deliveries.is_empty(),
            ),
            Err(e) => {
                log::error!("Failed to check readiness of order {} for payment: {}", order_id, e);
                Derived::failed(e)
            }
        }
    }
}
