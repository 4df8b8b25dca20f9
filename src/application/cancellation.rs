use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::order::{DependentRecord, OrderStatus};
use crate::domain::ports::OrderApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelStage {
    Payments,
    Shippings,
    Deliveries,
    Order,
}

/// What has been committed server-side so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancellationProgress {
    pub payments: Vec<i64>,
    pub shippings: Vec<i64>,
    pub deliveries: Vec<i64>,
    pub order_canceled: bool,
}

#[derive(Debug, Error)]
#[error("cancellation of order {order_id} stopped at {stage:?}: {source}")]
pub struct CancellationError {
    pub order_id: i64,
    pub stage: CancelStage,
    pub progress: CancellationProgress,
    #[source]
    pub source: DomainError,
}

/// Cancels an order together with its payments, shippings and deliveries.
///
/// Steps run strictly in order: payments, shippings, deliveries, then the
/// order status. There is no transaction; the first failure stops the sequence
/// and the error carries everything canceled up to that point. The order
/// itself is only marked canceled once every dependent record is.
pub struct DependencyCanceller<A> {
    api: Arc<A>,
}

impl<A: OrderApi> DependencyCanceller<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn cancel(&self, order_id: i64) -> Result<CancellationProgress, CancellationError> {
        let api = &self.api;
        let mut progress = CancellationProgress::default();

        let step = cancel_active(api.list_payments(order_id), &mut progress.payments, |id| {
            api.cancel_payment(id)
        })
        .await;
        if let Err(source) = step {
            return Err(self.abort(order_id, CancelStage::Payments, progress, source));
        }

        let step = cancel_active(api.list_shippings(order_id), &mut progress.shippings, |id| {
            api.cancel_shipping(id)
        })
        .await;
        if let Err(source) = step {
            return Err(self.abort(order_id, CancelStage::Shippings, progress, source));
        }

        let step = cancel_active(
            api.list_deliveries(order_id),
            &mut progress.deliveries,
            |id| api.cancel_delivery(id),
        )
        .await;
        if let Err(source) = step {
            return Err(self.abort(order_id, CancelStage::Deliveries, progress, source));
        }

        if let Err(source) = api.update_order_status(order_id, OrderStatus::Canceled).await {
            return Err(self.abort(order_id, CancelStage::Order, progress, source));
        }
        progress.order_canceled = true;

        log::info!(
            "Order {} canceled along with {} payment(s), {} shipping(s), {} delivery(ies)",
            order_id,
            progress.payments.len(),
            progress.shippings.len(),
            progress.deliveries.len()
        );
        Ok(progress)
    }

    fn abort(
        &self,
        order_id: i64,
        stage: CancelStage,
        progress: CancellationProgress,
        source: DomainError,
    ) -> CancellationError {
        log::error!(
            "Failed to cancel order {} and its dependencies at {:?}: {}",
            order_id,
            stage,
            source
        );
        CancellationError {
            order_id,
            stage,
            progress,
            source,
        }
    }
}

/// Lists one record kind and cancels each active record, one call at a time.
async fn cancel_active<R, L, C, F>(
    list: L,
    canceled: &mut Vec<i64>,
    cancel: C,
) -> Result<(), DomainError>
where
    R: DependentRecord,
    L: Future<Output = Result<Vec<R>, DomainError>>,
    C: Fn(i64) -> F,
    F: Future<Output = Result<(), DomainError>>,
{
    for record in list.await?.iter().filter(|r| !r.is_canceled()) {
        cancel(record.id()).await?;
        canceled.push(record.id());
    }
    Ok(())
}
