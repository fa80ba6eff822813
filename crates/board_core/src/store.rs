use std::sync::Arc;

use shared::{
    domain::{Order, OrderId, OrderStatus},
    error::ApiError,
};
use tokio::sync::{broadcast, RwLock};

use crate::{board::Board, filter::DeliveryFilter};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    /// The board was replaced by a full fetch.
    Replaced { orders: usize },
    OptimisticMove {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
    Acknowledged {
        order_id: OrderId,
        status: OrderStatus,
    },
    /// A same-column drop changed display order only.
    Reordered {
        order_id: OrderId,
        column: OrderStatus,
    },
    /// A rejected drag was undone by moving the order back.
    RolledBack { order_id: OrderId },
    SyncFailed(ApiError),
}

/// Shared handle to the board. Clones point at the same board and event
/// channel; every write goes through this type.
#[derive(Clone)]
pub struct BoardStore {
    board: Arc<RwLock<Board>>,
    events: broadcast::Sender<BoardEvent>,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            board: Arc::new(RwLock::new(Board::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: BoardEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub async fn snapshot(&self) -> Board {
        self.board.read().await.clone()
    }

    pub async fn column(&self, status: OrderStatus) -> Vec<Order> {
        self.board.read().await.column(status).to_vec()
    }

    pub async fn order(&self, order_id: OrderId) -> Option<Order> {
        self.board.read().await.get(order_id).cloned()
    }

    pub async fn filtered(&self, filter: DeliveryFilter) -> Board {
        self.board.read().await.filtered(filter)
    }

    /// Replaces the whole board with a fetched order list.
    pub async fn replace(&self, orders: Vec<Order>) {
        let board = Board::from_orders(orders);
        let count = board.len();
        *self.board.write().await = board;
        self.publish(BoardEvent::Replaced { orders: count });
    }

    /// Undoes one optimistic drag. Other orders are left alone.
    pub(crate) async fn undo_move(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        from_index: usize,
        to: OrderStatus,
    ) -> bool {
        let reverted = self
            .board
            .write()
            .await
            .undo_move(order_id, from, from_index, to);
        if reverted {
            self.publish(BoardEvent::RolledBack { order_id });
        }
        reverted
    }

    /// Runs `f` under the write lock.
    pub(crate) async fn update<R>(&self, f: impl FnOnce(&mut Board) -> R) -> R {
        let mut guard = self.board.write().await;
        f(&mut guard)
    }
}
