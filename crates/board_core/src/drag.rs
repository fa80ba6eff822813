use shared::domain::{OrderId, OrderStatus};

use crate::board::{Board, BoardError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragLocation {
    pub column: OrderStatus,
    pub index: usize,
}

impl DragLocation {
    pub fn new(column: OrderStatus, index: usize) -> Self {
        Self { column, index }
    }
}

/// End of a drag gesture. `destination` is `None` when the drop was
/// cancelled outside any column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragEnd {
    pub source: DragLocation,
    pub destination: Option<DragLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragOutcome {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl DragOutcome {
    /// Reordering inside one column does not change the status and needs no
    /// backend call.
    pub fn changes_status(&self) -> bool {
        self.from != self.to
    }
}

/// Applies the drop to `board` in place. Returns `None` for a cancelled drop.
pub fn apply_drag(board: &mut Board, event: &DragEnd) -> Result<Option<DragOutcome>, BoardError> {
    let Some(destination) = event.destination else {
        return Ok(None);
    };
    let moved = board.move_order(
        event.source.column,
        event.source.index,
        destination.column,
        destination.index,
    )?;
    Ok(Some(DragOutcome {
        order_id: moved.id,
        from: event.source.column,
        to: destination.column,
    }))
}

#[cfg(test)]
mod tests {
    use shared::domain::Order;

    use super::*;

    fn order(id: i64, status: OrderStatus) -> Order {
        serde_json::from_value(serde_json::json!({ "id": id, "status": status }))
            .expect("order")
    }

    #[test]
    fn cancelled_drop_is_a_no_op() {
        let mut board = Board::from_orders(vec![order(4, OrderStatus::InAnalysis)]);
        let before = board.clone();

        let outcome = apply_drag(
            &mut board,
            &DragEnd {
                source: DragLocation::new(OrderStatus::InAnalysis, 0),
                destination: None,
            },
        )
        .expect("drag");

        assert_eq!(outcome, None);
        assert_eq!(board, before);
    }

    #[test]
    fn drop_moves_order_between_columns() {
        let mut board = Board::from_orders(vec![
            order(4, OrderStatus::InAnalysis),
            order(5, OrderStatus::InProduction),
        ]);

        let outcome = apply_drag(
            &mut board,
            &DragEnd {
                source: DragLocation::new(OrderStatus::InAnalysis, 0),
                destination: Some(DragLocation::new(OrderStatus::InProduction, 0)),
            },
        )
        .expect("drag")
        .expect("outcome");

        assert_eq!(outcome.order_id, OrderId(4));
        assert!(outcome.changes_status());
        let column: Vec<OrderId> = board
            .column(OrderStatus::InProduction)
            .iter()
            .map(|order| order.id)
            .collect();
        assert_eq!(column, vec![OrderId(4), OrderId(5)]);
    }

    #[test]
    fn same_column_drop_only_reorders() {
        let mut board = Board::from_orders(vec![
            order(1, OrderStatus::Ready),
            order(2, OrderStatus::Ready),
        ]);

        let outcome = apply_drag(
            &mut board,
            &DragEnd {
                source: DragLocation::new(OrderStatus::Ready, 0),
                destination: Some(DragLocation::new(OrderStatus::Ready, 1)),
            },
        )
        .expect("drag")
        .expect("outcome");

        assert!(!outcome.changes_status());
        assert_eq!(board.column(OrderStatus::Ready)[1].id, OrderId(1));
    }
}
