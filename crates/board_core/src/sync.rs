//! Persists board transitions and reconciles the store with the backend.

use std::sync::Arc;

use shared::domain::{Order, OrderId, OrderStatus};
use tracing::{error, info, warn};

use crate::{
    api::OrderBackend,
    board::BoardError,
    draft::OrderDraft,
    drag::{apply_drag, DragEnd, DragLocation},
    error::{ClientError, ClientResult},
    store::{BoardEvent, BoardStore},
    transitions::{self, Direction, TransitionError, TransitionRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The backend accepted the move to this status.
    Applied(OrderStatus),
    /// Nothing to persist: cancelled drop, same-column drop or same-status
    /// menu pick.
    Unchanged,
}

pub struct BoardSync {
    backend: Arc<dyn OrderBackend>,
    store: BoardStore,
}

impl BoardSync {
    pub fn new(backend: Arc<dyn OrderBackend>, store: BoardStore) -> Self {
        Self { backend, store }
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    /// Replaces the board with the backend's full order list. On failure the
    /// board is left as it was.
    pub async fn refresh(&self) -> ClientResult<usize> {
        match self.backend.list_orders().await {
            Ok(orders) => {
                let count = orders.len();
                let inconsistent = orders
                    .iter()
                    .filter(|order| !order.has_consistent_total())
                    .count();
                if inconsistent > 0 {
                    warn!(inconsistent, "orders with totals that do not match their items");
                }
                self.store.replace(orders).await;
                info!(orders = count, "board refreshed");
                Ok(count)
            }
            Err(err) => {
                error!(error = %err, "failed to refresh board");
                self.store.publish(BoardEvent::SyncFailed(err.notice()));
                Err(err)
            }
        }
    }

    /// Persists a status change decided elsewhere, then refetches.
    pub async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> ClientResult<()> {
        self.persist(order_id, status, None).await
    }

    pub async fn transition(
        &self,
        order_id: OrderId,
        request: TransitionRequest,
    ) -> ClientResult<TransitionOutcome> {
        let current = self
            .store
            .order(order_id)
            .await
            .map(|order| order.status)
            .ok_or(BoardError::UnknownOrder(order_id))?;

        let target = match transitions::resolve(current, request) {
            Ok(target) => target,
            Err(TransitionError::SameStatus(_)) => return Ok(TransitionOutcome::Unchanged),
            Err(err) => {
                warn!(%order_id, error = %err, "transition not offered");
                return Err(err.into());
            }
        };

        self.persist(order_id, target, None).await?;
        Ok(TransitionOutcome::Applied(target))
    }

    pub async fn advance(&self, order_id: OrderId) -> ClientResult<TransitionOutcome> {
        self.transition(order_id, TransitionRequest::Arrow(Direction::Forward))
            .await
    }

    pub async fn retreat(&self, order_id: OrderId) -> ClientResult<TransitionOutcome> {
        self.transition(order_id, TransitionRequest::Arrow(Direction::Back))
            .await
    }

    pub async fn move_to(
        &self,
        order_id: OrderId,
        target: OrderStatus,
    ) -> ClientResult<TransitionOutcome> {
        self.transition(order_id, TransitionRequest::Menu(target))
            .await
    }

    /// Applies the drop optimistically, then persists it.
    pub async fn drag_end(&self, event: DragEnd) -> ClientResult<TransitionOutcome> {
        let outcome = self
            .store
            .update(|board| apply_drag(board, &event))
            .await;
        let Some(outcome) = outcome? else {
            return Ok(TransitionOutcome::Unchanged);
        };
        if !outcome.changes_status() {
            self.store.publish(BoardEvent::Reordered {
                order_id: outcome.order_id,
                column: outcome.to,
            });
            return Ok(TransitionOutcome::Unchanged);
        }

        self.store.publish(BoardEvent::OptimisticMove {
            order_id: outcome.order_id,
            from: outcome.from,
            to: outcome.to,
        });
        self.persist(outcome.order_id, outcome.to, Some(event.source))
            .await?;
        Ok(TransitionOutcome::Applied(outcome.to))
    }

    /// One status write, followed by a full refetch when accepted. A
    /// rejected write only touches the store when the order was moved
    /// optimistically from `dragged_from`; then that one order goes back.
    async fn persist(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        dragged_from: Option<DragLocation>,
    ) -> ClientResult<()> {
        let acknowledged = match self.backend.update_status(order_id, status).await {
            Ok(acknowledged) => acknowledged,
            Err(err) => {
                error!(%order_id, %status, error = %err, "status update rejected");
                if let Some(source) = dragged_from {
                    let reverted = self
                        .store
                        .undo_move(order_id, source.column, source.index, status)
                        .await;
                    if !reverted {
                        warn!(%order_id, "board changed since the drop, keeping fetched state");
                    }
                }
                self.store.publish(BoardEvent::SyncFailed(err.notice()));
                return Err(err);
            }
        };

        info!(%order_id, %status, "status update acknowledged");
        self.store.publish(BoardEvent::Acknowledged { order_id, status });

        if let Err(err) = self.refresh().await {
            if let Some(order) = acknowledged {
                warn!(%order_id, "refetch failed, applying acknowledged order");
                self.apply_acknowledged(order).await;
            }
            return Err(err);
        }
        Ok(())
    }

    async fn apply_acknowledged(&self, order: Order) {
        self.store
            .update(move |board| board.apply_acknowledged(order))
            .await;
    }

    pub async fn create_order(&self, draft: &OrderDraft) -> ClientResult<Order> {
        let payload = draft.to_payload()?;
        let order = self.backend.create_order(&payload).await.inspect_err(|err| {
            self.store.publish(BoardEvent::SyncFailed(err.notice()));
        })?;
        info!(order_id = %order.id, total = order.total_amount, "order created");
        self.refresh().await?;
        Ok(order)
    }

    /// Full edit of an existing order.
    pub async fn save_order(&self, order_id: OrderId, draft: &OrderDraft) -> ClientResult<Order> {
        let payload = draft.to_payload()?;
        let order = self
            .backend
            .update_order(order_id, &payload)
            .await
            .inspect_err(|err| {
                self.store.publish(BoardEvent::SyncFailed(err.notice()));
            })?;
        info!(%order_id, "order updated");
        self.refresh().await?;
        Ok(order)
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
