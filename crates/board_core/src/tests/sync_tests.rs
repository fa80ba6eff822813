use async_trait::async_trait;
use shared::{
    error::ErrorCode,
    protocol::OrderPayload,
};
use tokio::sync::{Mutex, Notify};

use super::*;
use crate::drag::DragLocation;

#[derive(Default)]
struct TestOrderBackend {
    orders: Mutex<Vec<Order>>,
    reject_status_with: Option<u16>,
    reject_orders: Vec<OrderId>,
    held: Option<(OrderId, Arc<Notify>)>,
    fail_list_after_write: bool,
    writes: Mutex<u32>,
    status_calls: Mutex<Vec<(OrderId, OrderStatus)>>,
    create_calls: Mutex<u32>,
}

impl TestOrderBackend {
    fn with_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: Mutex::new(orders),
            ..Self::default()
        }
    }

    fn rejecting(mut self, status: u16) -> Self {
        self.reject_status_with = Some(status);
        self
    }

    /// Rejects writes for `order_id` only, after `gate` is notified.
    fn holding_then_rejecting(mut self, order_id: OrderId, gate: Arc<Notify>) -> Self {
        self.reject_orders.push(order_id);
        self.held = Some((order_id, gate));
        self
    }

    fn failing_refetch(mut self) -> Self {
        self.fail_list_after_write = true;
        self
    }
}

#[async_trait]
impl OrderBackend for TestOrderBackend {
    async fn list_orders(&self) -> ClientResult<Vec<Order>> {
        if self.fail_list_after_write && *self.writes.lock().await > 0 {
            return Err(ClientError::Status {
                context: "fetch orders".into(),
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(self.orders.lock().await.clone())
    }

    async fn create_order(&self, _payload: &OrderPayload) -> ClientResult<Order> {
        *self.create_calls.lock().await += 1;
        Err(ClientError::NotFound("create".into()))
    }

    async fn update_order(
        &self,
        order_id: OrderId,
        _payload: &OrderPayload,
    ) -> ClientResult<Order> {
        Err(ClientError::NotFound(format!("order {order_id}")))
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> ClientResult<Option<Order>> {
        self.status_calls.lock().await.push((order_id, status));
        if let Some((held_id, gate)) = &self.held {
            if *held_id == order_id {
                gate.notified().await;
            }
        }
        if self.reject_orders.contains(&order_id) {
            return Err(ClientError::Status {
                context: "update order status".into(),
                status: 409,
                body: String::new(),
            });
        }
        if let Some(code) = self.reject_status_with {
            return Err(ClientError::Status {
                context: "update order status".into(),
                status: code,
                body: String::new(),
            });
        }
        *self.writes.lock().await += 1;
        let mut orders = self.orders.lock().await;
        let order = orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or_else(|| ClientError::NotFound(format!("order {order_id}")))?;
        order.status = status;
        Ok(Some(order.clone()))
    }
}

fn order(id: i64, status: OrderStatus) -> Order {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "customerName": "Ana",
        "status": status,
        "totalAmount": 0.0
    }))
    .expect("order")
}

async fn loaded(backend: TestOrderBackend) -> (BoardSync, Arc<TestOrderBackend>) {
    let backend = Arc::new(backend);
    let sync = BoardSync::new(backend.clone(), BoardStore::new());
    sync.refresh().await.expect("initial refresh");
    (sync, backend)
}

fn drag(from: OrderStatus, to: Option<OrderStatus>) -> DragEnd {
    DragEnd {
        source: DragLocation::new(from, 0),
        destination: to.map(|column| DragLocation::new(column, 0)),
    }
}

#[tokio::test]
async fn dragged_order_lands_in_destination_after_refetch() {
    let (sync, backend) =
        loaded(TestOrderBackend::with_orders(vec![order(4, OrderStatus::InAnalysis)])).await;

    let outcome = sync
        .drag_end(drag(OrderStatus::InAnalysis, Some(OrderStatus::InProduction)))
        .await
        .expect("drag");

    assert_eq!(outcome, TransitionOutcome::Applied(OrderStatus::InProduction));
    assert_eq!(
        *backend.status_calls.lock().await,
        vec![(OrderId(4), OrderStatus::InProduction)]
    );
    let board = sync.store().snapshot().await;
    assert!(board.column(OrderStatus::InAnalysis).is_empty());
    assert!(board.column(OrderStatus::Ready).is_empty());
    assert_eq!(board.column(OrderStatus::InProduction).len(), 1);
    assert_eq!(board.column(OrderStatus::InProduction)[0].id, OrderId(4));
}

#[tokio::test]
async fn rejected_drag_restores_previous_board() {
    let (sync, _backend) = loaded(
        TestOrderBackend::with_orders(vec![
            order(4, OrderStatus::InAnalysis),
            order(5, OrderStatus::Ready),
        ])
        .rejecting(400),
    )
    .await;
    let before = sync.store().snapshot().await;
    let mut events = sync.store().subscribe();

    let err = sync
        .drag_end(drag(OrderStatus::InAnalysis, Some(OrderStatus::Ready)))
        .await
        .expect_err("rejected");

    assert!(matches!(err, ClientError::Status { status: 400, .. }));
    assert_eq!(sync.store().snapshot().await, before);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(matches!(seen[0], BoardEvent::OptimisticMove { .. }));
    assert!(seen.contains(&BoardEvent::RolledBack {
        order_id: OrderId(4)
    }));
    assert!(seen.iter().any(|event| matches!(
        event,
        BoardEvent::SyncFailed(notice) if notice.code == ErrorCode::Rejected
    )));
}

#[tokio::test]
async fn rejected_arrow_move_keeps_board() {
    let (sync, _backend) = loaded(
        TestOrderBackend::with_orders(vec![order(7, OrderStatus::InProduction)]).rejecting(500),
    )
    .await;
    let before = sync.store().snapshot().await;
    let mut events = sync.store().subscribe();

    sync.advance(OrderId(7)).await.expect_err("rejected");

    assert_eq!(sync.store().snapshot().await, before);
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen.len(), 1);
    assert!(matches!(seen[0], BoardEvent::SyncFailed(_)));
}

#[tokio::test]
async fn rejected_arrow_move_keeps_concurrent_refetch() {
    let gate = Arc::new(Notify::new());
    let (sync, _backend) = loaded(
        TestOrderBackend::with_orders(vec![
            order(1, OrderStatus::InAnalysis),
            order(2, OrderStatus::InAnalysis),
        ])
        .holding_then_rejecting(OrderId(1), gate.clone()),
    )
    .await;

    let (first, second) = tokio::join!(sync.advance(OrderId(1)), async {
        let outcome = sync.advance(OrderId(2)).await;
        gate.notify_one();
        outcome
    });

    first.expect_err("order 1 rejected");
    assert_eq!(
        second.expect("order 2 accepted"),
        TransitionOutcome::Applied(OrderStatus::InProduction)
    );
    let board = sync.store().snapshot().await;
    assert_eq!(board.locate(OrderId(1)), Some((OrderStatus::InAnalysis, 0)));
    assert_eq!(board.locate(OrderId(2)), Some((OrderStatus::InProduction, 0)));
}

#[tokio::test]
async fn rejected_drag_only_undoes_the_dragged_order() {
    let gate = Arc::new(Notify::new());
    let (sync, _backend) = loaded(
        TestOrderBackend::with_orders(vec![
            order(1, OrderStatus::InAnalysis),
            order(2, OrderStatus::InAnalysis),
        ])
        .holding_then_rejecting(OrderId(1), gate.clone()),
    )
    .await;

    let dragged = sync.drag_end(drag(OrderStatus::InAnalysis, Some(OrderStatus::Ready)));
    let (first, second) = tokio::join!(dragged, async {
        let outcome = sync.advance(OrderId(2)).await;
        gate.notify_one();
        outcome
    });

    first.expect_err("drag rejected");
    second.expect("order 2 accepted");
    let board = sync.store().snapshot().await;
    assert_eq!(board.locate(OrderId(1)), Some((OrderStatus::InAnalysis, 0)));
    assert_eq!(board.locate(OrderId(2)), Some((OrderStatus::InProduction, 0)));
    assert!(board.column(OrderStatus::Ready).is_empty());
}

#[tokio::test]
async fn arrows_cannot_leave_the_chain() {
    let (sync, backend) = loaded(TestOrderBackend::with_orders(vec![
        order(1, OrderStatus::Ready),
        order(2, OrderStatus::InAnalysis),
    ]))
    .await;

    let err = sync.advance(OrderId(1)).await.expect_err("no forward");
    assert!(matches!(
        err,
        ClientError::Transition(TransitionError::NoStep { .. })
    ));
    sync.retreat(OrderId(2)).await.expect_err("no back");
    assert!(backend.status_calls.lock().await.is_empty());

    let outcome = sync.retreat(OrderId(1)).await.expect("back");
    assert_eq!(outcome, TransitionOutcome::Applied(OrderStatus::InProduction));
}

#[tokio::test]
async fn menu_jump_and_same_status_pick() {
    let (sync, backend) =
        loaded(TestOrderBackend::with_orders(vec![order(3, OrderStatus::InAnalysis)])).await;

    let unchanged = sync
        .move_to(OrderId(3), OrderStatus::InAnalysis)
        .await
        .expect("no-op");
    assert_eq!(unchanged, TransitionOutcome::Unchanged);
    assert!(backend.status_calls.lock().await.is_empty());

    let applied = sync
        .move_to(OrderId(3), OrderStatus::Ready)
        .await
        .expect("jump");
    assert_eq!(applied, TransitionOutcome::Applied(OrderStatus::Ready));
    assert_eq!(
        sync.store().order(OrderId(3)).await.map(|order| order.status),
        Some(OrderStatus::Ready)
    );
}

#[tokio::test]
async fn cancelled_or_same_column_drop_skips_backend() {
    let (sync, backend) = loaded(TestOrderBackend::with_orders(vec![
        order(8, OrderStatus::Ready),
        order(9, OrderStatus::Ready),
    ]))
    .await;
    let mut events = sync.store().subscribe();

    let cancelled = sync
        .drag_end(drag(OrderStatus::Ready, None))
        .await
        .expect("cancelled");
    let same = sync
        .drag_end(DragEnd {
            source: DragLocation::new(OrderStatus::Ready, 0),
            destination: Some(DragLocation::new(OrderStatus::Ready, 1)),
        })
        .await
        .expect("same column");

    assert_eq!(cancelled, TransitionOutcome::Unchanged);
    assert_eq!(same, TransitionOutcome::Unchanged);
    assert!(backend.status_calls.lock().await.is_empty());
    assert_eq!(
        events.try_recv().expect("reorder event"),
        BoardEvent::Reordered {
            order_id: OrderId(8),
            column: OrderStatus::Ready
        }
    );
    assert!(events.try_recv().is_err());
    let ready = sync.store().column(OrderStatus::Ready).await;
    assert_eq!(ready[1].id, OrderId(8));
}

#[tokio::test]
async fn failed_refetch_after_write_applies_acknowledged_order() {
    let (sync, _backend) = loaded(
        TestOrderBackend::with_orders(vec![order(6, OrderStatus::InAnalysis)]).failing_refetch(),
    )
    .await;

    let err = sync.advance(OrderId(6)).await.expect_err("refetch failed");

    assert!(matches!(err, ClientError::Status { status: 503, .. }));
    let board = sync.store().snapshot().await;
    assert_eq!(board.locate(OrderId(6)), Some((OrderStatus::InProduction, 0)));
}

#[tokio::test]
async fn unknown_order_is_reported() {
    let (sync, _backend) = loaded(TestOrderBackend::default()).await;

    let err = sync.advance(OrderId(99)).await.expect_err("unknown");
    assert!(matches!(
        err,
        ClientError::Board(BoardError::UnknownOrder(OrderId(99)))
    ));
}

#[tokio::test]
async fn invalid_draft_never_reaches_backend() {
    let (sync, backend) = loaded(TestOrderBackend::default()).await;

    let err = sync
        .create_order(&OrderDraft::new())
        .await
        .expect_err("invalid");

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(*backend.create_calls.lock().await, 0);
}
