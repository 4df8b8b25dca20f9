use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    Carrier, Delivery, LineItem, Order, OrderStatus, Payment, Shipping, Wallet,
};
use crate::domain::ports::OrderApi;
use crate::domain::session::Session;

use super::models::{
    CancelPatch, ListEnvelope, NewOrderBody, NewOrderItemBody, NewPaymentBody, StatusPatch,
};

const ORDERS: &str = "orders";
const ORDER_PAYMENT: &str = "order-payment";
const ORDER_SHIPPING: &str = "order-shipping";
const ORDER_DELIVERY: &str = "order-delivery";
const WALLETS: &str = "wallets";
const CARRIERS: &str = "carrier";

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DomainError::Decode(e.to_string())
        } else {
            DomainError::Network(e.to_string())
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────────────

/// `OrderApi` over the backend's REST endpoints.
///
/// Every request carries the session's bearer credential; a session without
/// one fails fast with `MissingCredential` instead of hitting the network.
pub struct HttpOrderApi {
    client: Client,
    base_url: String,
    session: Session,
}

impl HttpOrderApi {
    pub fn new(base_url: &str, session: Session, timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn collection(&self, resource: &str) -> String {
        format!("{}/{}/", self.base_url, resource)
    }

    fn member(&self, resource: &str, id: i64) -> String {
        format!("{}/{}/{}/", self.base_url, resource, id)
    }

    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, DomainError> {
        let token = self.session.bearer().ok_or(DomainError::MissingCredential)?;
        Ok(req.bearer_auth(token))
    }

    async fn execute(&self, req: RequestBuilder) -> Result<reqwest::Response, DomainError> {
        let resp = self.authorized(req)?.send().await.map_err(|e| {
            log::error!("Network/unknown error: {}", e);
            DomainError::from(e)
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let err = DomainError::from_status(status.as_u16(), body);
        if status.is_server_error() {
            log::error!("Server error {}: {}", status, err);
        } else {
            log::warn!("Request rejected with {}: {}", status, err);
        }
        Err(err)
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, DomainError> {
        Ok(self.execute(req).await?.json::<T>().await?)
    }

    async fn list_for_order<T: DeserializeOwned>(
        &self,
        resource: &str,
        order_id: i64,
    ) -> Result<Vec<T>, DomainError> {
        let req = self
            .client
            .get(self.collection(resource))
            .query(&[("order", order_id)]);
        let envelope: ListEnvelope<T> = self.fetch(req).await?;
        Ok(envelope.into_vec())
    }

    async fn cancel_record(&self, resource: &str, id: i64) -> Result<(), DomainError> {
        log::debug!("Canceling {} {}", resource, id);
        let req = self
            .client
            .patch(self.member(resource, id))
            .json(&CancelPatch { canceled: true });
        self.execute(req).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    async fn get_order(&self, order_id: i64) -> Result<Order, DomainError> {
        self.fetch(self.client.get(self.member(ORDERS, order_id)))
            .await
    }

    async fn list_payments(&self, order_id: i64) -> Result<Vec<Payment>, DomainError> {
        self.list_for_order(ORDER_PAYMENT, order_id).await
    }

    async fn list_shippings(&self, order_id: i64) -> Result<Vec<Shipping>, DomainError> {
        self.list_for_order(ORDER_SHIPPING, order_id).await
    }

    async fn list_deliveries(&self, order_id: i64) -> Result<Vec<Delivery>, DomainError> {
        self.list_for_order(ORDER_DELIVERY, order_id).await
    }

    async fn cancel_payment(&self, payment_id: i64) -> Result<(), DomainError> {
        self.cancel_record(ORDER_PAYMENT, payment_id).await
    }

    async fn cancel_shipping(&self, shipping_id: i64) -> Result<(), DomainError> {
        self.cancel_record(ORDER_SHIPPING, shipping_id).await
    }

    async fn cancel_delivery(&self, delivery_id: i64) -> Result<(), DomainError> {
        self.cancel_record(ORDER_DELIVERY, delivery_id).await
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        log::debug!("Setting order {} status to {}", order_id, status);
        let req = self
            .client
            .patch(self.member(ORDERS, order_id))
            .json(&StatusPatch { status });
        self.fetch(req).await
    }

    async fn create_order(&self, items: &[LineItem]) -> Result<Order, DomainError> {
        let body = NewOrderBody {
            items: items
                .iter()
                .map(|i| NewOrderItemBody {
                    product_id: i.id,
                    quantity: i.quantity,
                    price: i.price.clone(),
                })
                .collect(),
            status: OrderStatus::Pending,
        };
        self.fetch(self.client.post(self.collection(ORDERS)).json(&body))
            .await
    }

    async fn create_payment(&self, order_id: i64, wallet_id: i64) -> Result<Payment, DomainError> {
        let body = NewPaymentBody {
            order: order_id,
            wallet: wallet_id,
        };
        self.fetch(self.client.post(self.collection(ORDER_PAYMENT)).json(&body))
            .await
    }

    async fn list_wallets(&self) -> Result<Vec<Wallet>, DomainError> {
        let envelope: ListEnvelope<Wallet> =
            self.fetch(self.client.get(self.collection(WALLETS))).await?;
        Ok(envelope.into_vec())
    }

    async fn list_carriers(&self) -> Result<Vec<Carrier>, DomainError> {
        let envelope: ListEnvelope<Carrier> =
            self.fetch(self.client.get(self.collection(CARRIERS))).await?;
        Ok(envelope.into_vec())
    }
}
