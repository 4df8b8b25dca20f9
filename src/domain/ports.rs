use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::DomainError;
use super::order::{Carrier, Delivery, LineItem, Order, OrderStatus, Payment, Shipping, Wallet};

/// Remote order backend.
#[async_trait]
pub trait OrderApi: Send + Sync + 'static {
    async fn get_order(&self, order_id: i64) -> Result<Order, DomainError>;
    async fn list_payments(&self, order_id: i64) -> Result<Vec<Payment>, DomainError>;
    async fn list_shippings(&self, order_id: i64) -> Result<Vec<Shipping>, DomainError>;
    async fn list_deliveries(&self, order_id: i64) -> Result<Vec<Delivery>, DomainError>;

    async fn cancel_payment(&self, payment_id: i64) -> Result<(), DomainError>;
    async fn cancel_shipping(&self, shipping_id: i64) -> Result<(), DomainError>;
    async fn cancel_delivery(&self, delivery_id: i64) -> Result<(), DomainError>;
    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<Order, DomainError>;

    async fn create_order(&self, items: &[LineItem]) -> Result<Order, DomainError>;
    async fn create_payment(&self, order_id: i64, wallet_id: i64) -> Result<Payment, DomainError>;

    async fn list_wallets(&self) -> Result<Vec<Wallet>, DomainError>;
    async fn list_carriers(&self) -> Result<Vec<Carrier>, DomainError>;
}

/// String-keyed store of JSON-encoded values.
pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, DomainError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;
    fn remove(&self, key: &str) -> Result<(), DomainError>;

    /// Reads and decodes `key`. Missing, unreadable and corrupt values all
    /// come back as `None`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T>
    where
        Self: Sized,
    {
        let raw = match self.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::error!("Error reading '{}' from store: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring corrupt value under '{}': {}", key, e);
                None
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DomainError>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value).map_err(|e| DomainError::Internal(e.to_string()))?;
        self.set(key, &raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Default,
    Info,
    Success,
    Warning,
    Error,
}

/// Fire-and-forget user notification transport.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity, duration: Duration);
}

/// One live realtime connection.
#[async_trait]
pub trait ChannelSession: Send {
    /// Next text frame, `None` once the connection is closed.
    async fn next_text(&mut self) -> Option<Result<String, DomainError>>;
    async fn close(&mut self);
}

#[async_trait]
pub trait ChannelConnector: Send + Sync + 'static {
    async fn connect(&self, bearer: &str) -> Result<Box<dyn ChannelSession>, DomainError>;
}
