use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    any_active, Carrier, Order, OrderStatus, Payment, Wallet, WalletStatus,
};
use crate::domain::ports::OrderApi;

use super::cancellation::DependencyCanceller;
use super::lock_status::LockStatusResolver;
use super::readiness::ReadinessCheck;

/// Everything the order detail view needs in one round.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSnapshot {
    pub wallets: Vec<Wallet>,
    pub order: Order,
    /// An active payment exists; the order can no longer be edited.
    pub locked: bool,
}

pub struct OrderService<A> {
    api: Arc<A>,
}

impl<A: OrderApi> OrderService<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub fn lock_status(&self) -> LockStatusResolver<A> {
        LockStatusResolver::new(self.api.clone())
    }

    pub fn readiness(&self) -> ReadinessCheck<A> {
        ReadinessCheck::new(self.api.clone())
    }

    pub fn canceller(&self) -> DependencyCanceller<A> {
        DependencyCanceller::new(self.api.clone())
    }

    pub async fn get_order(&self, order_id: i64) -> Result<Order, DomainError> {
        self.api.get_order(order_id).await
    }

    /// Wallets are scoped to the authenticated user by the backend.
    pub async fn refresh(&self, order_id: i64) -> Result<OrderSnapshot, DomainError> {
        let api = &self.api;
        let (wallets, order, payments) = tokio::try_join!(
            api.list_wallets(),
            api.get_order(order_id),
            api.list_payments(order_id),
        )?;

        Ok(OrderSnapshot {
            wallets,
            order,
            locked: any_active(&payments),
        })
    }

    /// Active carriers for delivery selection, the default one first.
    pub async fn active_carriers(&self) -> Result<Vec<Carrier>, DomainError> {
        let mut carriers: Vec<Carrier> = self
            .api
            .list_carriers()
            .await?
            .into_iter()
            .filter(|c| c.is_active)
            .collect();
        carriers.sort_by_key(|c| !c.is_default);
        Ok(carriers)
    }

    /// Status the backend should report given the order's dependent records.
    pub async fn expected_status(&self, order_id: i64) -> Result<OrderStatus, DomainError> {
        let api = &self.api;
        let (payments, shippings, deliveries) = tokio::try_join!(
            api.list_payments(order_id),
            api.list_shippings(order_id),
            api.list_deliveries(order_id),
        )?;
        Ok(OrderStatus::derive(&payments, &shippings, &deliveries))
    }

    /// Marks the order completed once it is fully paid, shipped and delivered.
    pub async fn complete(&self, order_id: i64) -> Result<Order, DomainError> {
        let api = &self.api;
        let (order, payments, shippings, deliveries) = tokio::try_join!(
            api.get_order(order_id),
            api.list_payments(order_id),
            api.list_shippings(order_id),
            api.list_deliveries(order_id),
        )?;

        if order.status.is_final() {
            return Err(DomainError::InvalidInput(format!(
                "Order {} is already {}.",
                order_id, order.status
            )));
        }
        let missing = [
            ("payment", any_active(&payments)),
            ("delivery", any_active(&deliveries)),
            ("shipping", any_active(&shippings)),
        ];
        if let Some((what, _)) = missing.iter().find(|(_, present)| !present) {
            return Err(DomainError::InvalidInput(format!(
                "Cannot complete order: missing valid {}.",
                what
            )));
        }

        let completed = api.update_order_status(order_id, OrderStatus::Completed).await?;
        log::info!("Order {} completed", order_id);
        Ok(completed)
    }

    /// Pays the order with the given wallet.
    pub async fn pay(&self, order_id: i64, wallet_id: i64) -> Result<Payment, DomainError> {
        let ready = self.readiness().check(order_id).await;
        if let Some(e) = ready.error {
            return Err(e);
        }
        if !ready.data {
            return Err(DomainError::InvalidInput(format!(
                "Order {} needs items, a shipping and a delivery before payment.",
                order_id
            )));
        }

        let lock = self.lock_status().resolve(order_id).await;
        if let Some(e) = lock.error {
            return Err(e);
        }
        if !lock.data.can_pay() {
            return Err(DomainError::InvalidInput(format!(
                "Order {} cannot be paid.",
                order_id
            )));
        }

        let payment = self.api.create_payment(order_id, wallet_id).await?;
        log::info!("Payment {} created for order {}", payment.id, order_id);
        Ok(payment)
    }
}

/// Active primary wallet, falling back to the first active one.
pub fn primary_wallet(wallets: &[Wallet]) -> Option<&Wallet> {
    wallets
        .iter()
        .find(|w| w.is_primary && w.status == WalletStatus::Active)
        .or_else(|| wallets.iter().find(|w| w.status == WalletStatus::Active))
}
