use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Completed and canceled orders accept no further mutation.
    pub fn is_final(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Canceled)
    }

    /// Status implied by the active dependent records of an order.
    ///
    /// The most recently created active record decides: a payment means
    /// `paid`, a delivery `processing`, a shipping `shipped`. A shipped order
    /// whose active delivery names a carrier is `delivered`.
    pub fn derive(payments: &[Payment], shippings: &[Shipping], deliveries: &[Delivery]) -> Self {
        let mut events: Vec<(OrderStatus, DateTime<Utc>)> = Vec::new();
        if let Some(p) = latest_active(payments) {
            events.push((OrderStatus::Paid, p.created_at));
        }
        if let Some(d) = latest_active(deliveries) {
            events.push((OrderStatus::Processing, d.created_at));
        }
        if let Some(s) = latest_active(shippings) {
            events.push((OrderStatus::Shipped, s.created_at));
        }

        // On equal timestamps the earlier entry wins: paid, then processing, then shipped.
        let mut newest: Option<(OrderStatus, DateTime<Utc>)> = None;
        for &(status, at) in &events {
            if newest.map_or(true, |(_, best)| at > best) {
                newest = Some((status, at));
            }
        }
        let Some((latest, _)) = newest else {
            return OrderStatus::Pending;
        };

        let carrier_assigned = deliveries
            .iter()
            .any(|d| !d.canceled && d.carrier.is_some());
        if latest == OrderStatus::Shipped && carrier_assigned {
            OrderStatus::Delivered
        } else {
            latest
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common view over payment, shipping and delivery records.
pub trait DependentRecord {
    fn id(&self) -> i64;
    fn is_canceled(&self) -> bool;
    fn created_at(&self) -> DateTime<Utc>;
}

fn latest_active<R: DependentRecord>(records: &[R]) -> Option<&R> {
    records
        .iter()
        .filter(|r| !r.is_canceled())
        .max_by_key(|r| r.created_at())
}

/// True if any record in the slice is not canceled.
pub fn any_active<R: DependentRecord>(records: &[R]) -> bool {
    records.iter().any(|r| !r.is_canceled())
}

macro_rules! dependent_record {
    ($ty:ty) => {
        impl DependentRecord for $ty {
            fn id(&self) -> i64 {
                self.id
            }
            fn is_canceled(&self) -> bool {
                self.canceled
            }
            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order: i64,
    #[serde(default)]
    pub wallet: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub canceled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipping {
    pub id: i64,
    pub order: i64,
    #[serde(default)]
    pub address: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub canceled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: i64,
    pub order: i64,
    #[serde(default)]
    pub carrier: Option<i64>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub tracking: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub canceled_at: Option<DateTime<Utc>>,
}

dependent_record!(Payment);
dependent_record!(Shipping);
dependent_record!(Delivery);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub product_id: i64,
    pub quantity: u32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub code: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total: Option<BigDecimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    Active,
    Inactive,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub status: WalletStatus,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub prefix: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
}

/// Line of the locally persisted draft order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identifier; lines merge on it.
    pub id: i64,
    pub quantity: u32,
    pub price: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LineItem {
    pub fn new(product_id: i64, quantity: u32, price: BigDecimal) -> Self {
        Self {
            id: product_id,
            quantity,
            price,
            title: None,
            sku: None,
            image: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.quantity > 0 && self.price > BigDecimal::from(0)
    }

    pub fn line_total(&self) -> BigDecimal {
        &self.price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub id: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub total: BigDecimal,
    pub items: Vec<LineItem>,
}
