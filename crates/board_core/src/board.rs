use shared::domain::{Order, OrderId, OrderStatus};
use thiserror::Error;

use crate::filter::DeliveryFilter;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("order {0} is not on the board")]
    UnknownOrder(OrderId),
    #[error("no order at index {index} of column {column} ({len} orders)")]
    IndexOutOfRange {
        column: OrderStatus,
        index: usize,
        len: usize,
    },
}

/// Orders partitioned by status. Position inside a column is display order
/// only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    columns: [Vec<Order>; 3],
}

impl Board {
    /// Partitions a fetched order list, keeping the fetch order inside each
    /// column.
    pub fn from_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let mut board = Board::default();
        for order in orders {
            board.columns[order.status.column_index()].push(order);
        }
        board
    }

    pub fn column(&self, status: OrderStatus) -> &[Order] {
        &self.columns[status.column_index()]
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Vec::is_empty)
    }

    /// Every order, column by column.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.columns.iter().flatten()
    }

    pub fn locate(&self, order_id: OrderId) -> Option<(OrderStatus, usize)> {
        OrderStatus::ALL.into_iter().find_map(|status| {
            self.column(status)
                .iter()
                .position(|order| order.id == order_id)
                .map(|index| (status, index))
        })
    }

    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        self.locate(order_id)
            .map(|(status, index)| &self.column(status)[index])
    }

    /// Removes the order at `from_index` of `from` and inserts it into `to`
    /// at `to_index` (clamped to the column length), stamping the new status.
    pub fn move_order(
        &mut self,
        from: OrderStatus,
        from_index: usize,
        to: OrderStatus,
        to_index: usize,
    ) -> Result<&Order, BoardError> {
        let source = &mut self.columns[from.column_index()];
        if from_index >= source.len() {
            return Err(BoardError::IndexOutOfRange {
                column: from,
                index: from_index,
                len: source.len(),
            });
        }
        let mut order = source.remove(from_index);
        order.status = to;

        let destination = &mut self.columns[to.column_index()];
        let index = to_index.min(destination.len());
        destination.insert(index, order);
        Ok(&destination[index])
    }

    /// Puts an optimistically moved order back at its source position. Does
    /// nothing unless the order still sits in `to` with status `to`, so a
    /// refetch that landed in between is kept.
    pub fn undo_move(
        &mut self,
        order_id: OrderId,
        from: OrderStatus,
        from_index: usize,
        to: OrderStatus,
    ) -> bool {
        let Some((column, index)) = self.locate(order_id) else {
            return false;
        };
        if column != to || self.columns[column.column_index()][index].status != to {
            return false;
        }
        let mut order = self.columns[column.column_index()].remove(index);
        order.status = from;
        let source = &mut self.columns[from.column_index()];
        let index = from_index.min(source.len());
        source.insert(index, order);
        true
    }

    /// Replaces an order by id with a server-acknowledged copy. Applying the
    /// same copy twice leaves the board unchanged.
    pub fn apply_acknowledged(&mut self, order: Order) {
        match self.locate(order.id) {
            Some((status, index)) if status == order.status => {
                self.columns[status.column_index()][index] = order;
            }
            Some((status, index)) => {
                self.columns[status.column_index()].remove(index);
                self.columns[order.status.column_index()].push(order);
            }
            None => self.columns[order.status.column_index()].push(order),
        }
    }

    pub fn filtered(&self, filter: DeliveryFilter) -> Board {
        Board {
            columns: self
                .columns
                .clone()
                .map(|column| crate::filter::filter_by_delivery_type(&column, filter)),
        }
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
