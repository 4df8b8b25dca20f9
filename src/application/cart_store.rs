use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;

use crate::domain::errors::DomainError;
use crate::domain::order::{DraftOrder, LineItem, Order, OrderStatus};
use crate::domain::ports::{KeyValueStore, OrderApi};
use crate::domain::summary::OrderSummary;

pub const DRAFT_KEY: &str = "order";
pub const SEQUENCE_KEY: &str = "order_last_id";

/// The locally persisted, not yet submitted order.
///
/// Mutations are read-modify-write against the store without locking;
/// two writers racing on the same store resolve last-write-wins.
pub struct CartStore<S> {
    store: Arc<S>,
}

impl<S: KeyValueStore> CartStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The persisted draft; missing or corrupt data reads as `None`.
    pub fn load(&self) -> Option<DraftOrder> {
        self.store.get_json(DRAFT_KEY)
    }

    /// Merges `items` into the draft, creating it on first use.
    ///
    /// Items without a positive price and quantity are dropped; if none
    /// remain, nothing is written and `None` is returned. Lines sharing a
    /// product id are merged by summing quantities.
    pub fn save(
        &self,
        status: OrderStatus,
        items: Vec<LineItem>,
    ) -> Result<Option<DraftOrder>, DomainError> {
        let valid: Vec<LineItem> = items.into_iter().filter(LineItem::is_valid).collect();
        if valid.is_empty() {
            log::warn!("No valid items to save in the draft order");
            return Ok(None);
        }

        let existing = self.load();
        let mut merged = existing
            .as_ref()
            .map(|d| d.items.clone())
            .unwrap_or_default();
        for item in valid {
            match merged.iter_mut().find(|m| m.id == item.id) {
                Some(line) => {
                    line.quantity = line.quantity.checked_add(item.quantity).ok_or_else(|| {
                        DomainError::InvalidInput(format!(
                            "quantity of product {} is too large",
                            item.id
                        ))
                    })?
                }
                None => merged.push(item),
            }
        }

        let draft = match &existing {
            Some(d) => DraftOrder {
                id: d.id.clone(),
                status: d.status,
                created_at: d.created_at,
                total: total_of(&merged),
                items: merged,
            },
            None => DraftOrder {
                id: self.next_id()?,
                status,
                created_at: Utc::now(),
                total: total_of(&merged),
                items: merged,
            },
        };

        if existing.as_ref() == Some(&draft) {
            log::debug!("Draft order {} unchanged; skipping write", draft.id);
            return Ok(existing);
        }

        self.store.set_json(DRAFT_KEY, &draft)?;
        log::info!("Draft order {} saved with total {}", draft.id, draft.total);
        Ok(Some(draft))
    }

    /// Drops a product line. An emptied draft is deleted.
    pub fn remove_item(&self, product_id: i64) -> Result<Option<DraftOrder>, DomainError> {
        self.rewrite(|items| items.retain(|i| i.id != product_id))
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn set_quantity(
        &self,
        product_id: i64,
        quantity: u32,
    ) -> Result<Option<DraftOrder>, DomainError> {
        self.rewrite(|items| {
            if quantity == 0 {
                items.retain(|i| i.id != product_id);
            } else if let Some(line) = items.iter_mut().find(|i| i.id == product_id) {
                line.quantity = quantity;
            }
        })
    }

    /// Deletes the draft but keeps the id sequence running.
    pub fn discard(&self) -> Result<(), DomainError> {
        self.store.remove(DRAFT_KEY)
    }

    /// Deletes the draft and resets the id sequence.
    pub fn clear(&self) -> Result<(), DomainError> {
        self.store.remove(DRAFT_KEY)?;
        self.store.remove(SEQUENCE_KEY)?;
        log::info!("Draft order removed");
        Ok(())
    }

    pub fn summary(&self) -> OrderSummary {
        self.load()
            .map(|d| OrderSummary::from_items(&d.items))
            .unwrap_or_else(OrderSummary::empty)
    }

    /// Submits the draft as a new pending order and discards it on success.
    pub async fn checkout<A: OrderApi>(&self, api: &A) -> Result<Order, DomainError> {
        let draft = self
            .load()
            .filter(|d| !d.items.is_empty())
            .ok_or_else(|| DomainError::InvalidInput("no draft order to submit".to_string()))?;

        let order = api.create_order(&draft.items).await?;
        self.discard()?;
        log::info!("Draft order {} placed as order {}", draft.id, order.id);
        Ok(order)
    }

    fn rewrite(
        &self,
        edit: impl FnOnce(&mut Vec<LineItem>),
    ) -> Result<Option<DraftOrder>, DomainError> {
        let Some(mut draft) = self.load() else {
            return Ok(None);
        };
        edit(&mut draft.items);

        if draft.items.is_empty() {
            self.discard()?;
            return Ok(None);
        }
        draft.total = total_of(&draft.items);
        self.store.set_json(DRAFT_KEY, &draft)?;
        Ok(Some(draft))
    }

    fn next_id(&self) -> Result<String, DomainError> {
        let last: u64 = self.store.get_json(SEQUENCE_KEY).unwrap_or(0);
        let next = last + 1;
        self.store.set(SEQUENCE_KEY, &next.to_string())?;
        Ok(format!("{:04}", next))
    }
}

fn total_of(items: &[LineItem]) -> BigDecimal {
    items.iter().map(LineItem::line_total).sum()
}
