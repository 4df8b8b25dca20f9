use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::OrderStatus;

/// List endpoints answer either with a bare array or a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Paged {
        #[serde(default = "Vec::new")]
        results: Vec<T>,
    },
}

impl<T> ListEnvelope<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) | ListEnvelope::Paged { results: items } => items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancelPatch {
    pub canceled: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusPatch {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct NewOrderItemBody {
    pub product_id: i64,
    pub quantity: u32,
    pub price: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct NewOrderBody {
    pub items: Vec<NewOrderItemBody>,
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct NewPaymentBody {
    pub order: i64,
    pub wallet: i64,
}
