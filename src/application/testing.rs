//! In-memory `OrderApi` for application tests.
//!
//! Every call is recorded as `"method"` or `"method:id"`; methods named in
//! `fail` answer with a 500.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};

use crate::domain::errors::DomainError;
use crate::domain::order::{
    Carrier, Delivery, LineItem, Order, OrderItem, OrderStatus, Payment, Shipping, Wallet,
    WalletStatus,
};
use crate::domain::ports::OrderApi;

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, minute, 0).unwrap()
}

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

pub fn order(id: i64, status: OrderStatus, item_count: usize) -> Order {
    Order {
        id,
        code: Some(format!("{:04}", id)),
        status,
        created_at: at(0),
        completed_at: None,
        canceled_at: None,
        user: None,
        items: (0..item_count)
            .map(|i| OrderItem {
                id: Some(i as i64 + 1),
                product_id: 100 + i as i64,
                quantity: 1,
                price: dec("10.00"),
            })
            .collect(),
        total: None,
    }
}

pub fn payment(id: i64, minute: u32, canceled: bool) -> Payment {
    Payment {
        id,
        order: 1,
        wallet: Some(1),
        created_at: at(minute),
        canceled,
        canceled_at: None,
    }
}

pub fn shipping(id: i64, canceled: bool) -> Shipping {
    Shipping {
        id,
        order: 1,
        address: Some(1),
        created_at: at(1),
        canceled,
        canceled_at: None,
    }
}

pub fn delivery(id: i64, canceled: bool) -> Delivery {
    Delivery {
        id,
        order: 1,
        carrier: Some(1),
        speed: Some("standard".to_string()),
        tracking: None,
        created_at: at(2),
        canceled,
        canceled_at: None,
    }
}

pub fn carrier(id: i64, is_active: bool, is_default: bool) -> Carrier {
    Carrier {
        id,
        name: format!("carrier {}", id),
        slug: format!("carrier-{}", id),
        prefix: format!("C{}", id),
        is_active,
        is_default,
    }
}

pub fn wallet(id: i64, status: WalletStatus, is_primary: bool) -> Wallet {
    Wallet {
        id,
        name: format!("card {}", id),
        brand: Some("visa".to_string()),
        status,
        is_primary,
    }
}

#[derive(Default)]
pub struct FakeOrderApi {
    pub order: Mutex<Option<Order>>,
    pub payments: Mutex<Vec<Payment>>,
    pub shippings: Mutex<Vec<Shipping>>,
    pub deliveries: Mutex<Vec<Delivery>>,
    pub wallets: Mutex<Vec<Wallet>>,
    pub carriers: Mutex<Vec<Carrier>>,
    fail: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<String>>,
}

impl FakeOrderApi {
    pub fn with_order(order: Order) -> Self {
        let api = Self::default();
        *api.order.lock().unwrap() = Some(order);
        api
    }

    pub fn payments(self, records: Vec<Payment>) -> Self {
        *self.payments.lock().unwrap() = records;
        self
    }

    pub fn shippings(self, records: Vec<Shipping>) -> Self {
        *self.shippings.lock().unwrap() = records;
        self
    }

    pub fn deliveries(self, records: Vec<Delivery>) -> Self {
        *self.deliveries.lock().unwrap() = records;
        self
    }

    pub fn wallets(self, records: Vec<Wallet>) -> Self {
        *self.wallets.lock().unwrap() = records;
        self
    }

    pub fn carriers(self, records: Vec<Carrier>) -> Self {
        *self.carriers.lock().unwrap() = records;
        self
    }

    pub fn failing(self, method: &'static str) -> Self {
        self.fail.lock().unwrap().insert(method);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String, method: &'static str) -> Result<(), DomainError> {
        self.calls.lock().unwrap().push(call);
        if self.fail.lock().unwrap().contains(method) {
            return Err(DomainError::Server {
                status: 500,
                body: format!("{} failed", method),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrderApi for FakeOrderApi {
    async fn get_order(&self, order_id: i64) -> Result<Order, DomainError> {
        self.record(format!("get_order:{}", order_id), "get_order")?;
        self.order
            .lock()
            .unwrap()
            .clone()
            .filter(|o| o.id == order_id)
            .ok_or_else(|| DomainError::NotFound(format!("order {}", order_id)))
    }

    async fn list_payments(&self, _order_id: i64) -> Result<Vec<Payment>, DomainError> {
        self.record("list_payments".to_string(), "list_payments")?;
        Ok(self.payments.lock().unwrap().clone())
    }

    async fn list_shippings(&self, _order_id: i64) -> Result<Vec<Shipping>, DomainError> {
        self.record("list_shippings".to_string(), "list_shippings")?;
        Ok(self.shippings.lock().unwrap().clone())
    }

    async fn list_deliveries(&self, _order_id: i64) -> Result<Vec<Delivery>, DomainError> {
        self.record("list_deliveries".to_string(), "list_deliveries")?;
        Ok(self.deliveries.lock().unwrap().clone())
    }

    async fn cancel_payment(&self, payment_id: i64) -> Result<(), DomainError> {
        self.record(format!("cancel_payment:{}", payment_id), "cancel_payment")?;
        for p in self.payments.lock().unwrap().iter_mut().filter(|p| p.id == payment_id) {
            p.canceled = true;
        }
        Ok(())
    }

    async fn cancel_shipping(&self, shipping_id: i64) -> Result<(), DomainError> {
        self.record(format!("cancel_shipping:{}", shipping_id), "cancel_shipping")?;
        for s in self.shippings.lock().unwrap().iter_mut().filter(|s| s.id == shipping_id) {
            s.canceled = true;
        }
        Ok(())
    }

    async fn cancel_delivery(&self, delivery_id: i64) -> Result<(), DomainError> {
        self.record(format!("cancel_delivery:{}", delivery_id), "cancel_delivery")?;
        for d in self.deliveries.lock().unwrap().iter_mut().filter(|d| d.id == delivery_id) {
            d.canceled = true;
        }
        Ok(())
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        self.record(
            format!("update_order_status:{}:{}", order_id, status),
            "update_order_status",
        )?;
        let mut slot = self.order.lock().unwrap();
        let order = slot
            .as_mut()
            .filter(|o| o.id == order_id)
            .ok_or_else(|| DomainError::NotFound(format!("order {}", order_id)))?;
        order.status = status;
        Ok(order.clone())
    }

    async fn create_order(&self, items: &[LineItem]) -> Result<Order, DomainError> {
        self.record("create_order".to_string(), "create_order")?;
        let mut created = order(500, OrderStatus::Pending, 0);
        created.items = items
            .iter()
            .map(|i| OrderItem {
                id: None,
                product_id: i.id,
                quantity: i.quantity,
                price: i.price.clone(),
            })
            .collect();
        *self.order.lock().unwrap() = Some(created.clone());
        Ok(created)
    }

    async fn create_payment(&self, order_id: i64, wallet_id: i64) -> Result<Payment, DomainError> {
        self.record(format!("create_payment:{}:{}", order_id, wallet_id), "create_payment")?;
        let mut payments = self.payments.lock().unwrap();
        let created = Payment {
            id: payments.len() as i64 + 1,
            order: order_id,
            wallet: Some(wallet_id),
            created_at: at(30),
            canceled: false,
            canceled_at: None,
        };
        payments.push(created.clone());
        Ok(created)
    }

    async fn list_wallets(&self) -> Result<Vec<Wallet>, DomainError> {
        self.record("list_wallets".to_string(), "list_wallets")?;
        Ok(self.wallets.lock().unwrap().clone())
    }

    async fn list_carriers(&self) -> Result<Vec<Carrier>, DomainError> {
        self.record("list_carriers".to_string(), "list_carriers")?;
        Ok(self.carriers.lock().unwrap().clone())
    }
}
