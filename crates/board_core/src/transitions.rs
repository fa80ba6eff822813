//! Order status state machine.
//!
//! Arrow controls move one column at a time along
//! `EM ANÁLISE -> EM PRODUÇÃO -> PRONTO` and back. The "move to" menu may
//! target any other column.

use shared::domain::OrderStatus;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRequest {
    /// Arrow button on an order card.
    Arrow(Direction),
    /// Entry of the "move to" menu.
    Menu(OrderStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("order is already {0}")]
    SameStatus(OrderStatus),
    #[error("no {direction:?} step from {from}")]
    NoStep {
        from: OrderStatus,
        direction: Direction,
    },
}

/// Arrow control offered on a card in a given column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowControl {
    pub direction: Direction,
    pub target: OrderStatus,
    pub tooltip: &'static str,
}

pub fn next_status(current: OrderStatus) -> Option<OrderStatus> {
    match current {
        OrderStatus::InAnalysis => Some(OrderStatus::InProduction),
        OrderStatus::InProduction => Some(OrderStatus::Ready),
        OrderStatus::Ready => None,
    }
}

pub fn previous_status(current: OrderStatus) -> Option<OrderStatus> {
    match current {
        OrderStatus::InAnalysis => None,
        OrderStatus::InProduction => Some(OrderStatus::InAnalysis),
        OrderStatus::Ready => Some(OrderStatus::InProduction),
    }
}

pub fn step(current: OrderStatus, direction: Direction) -> Result<OrderStatus, TransitionError> {
    let target = match direction {
        Direction::Forward => next_status(current),
        Direction::Back => previous_status(current),
    };
    target.ok_or(TransitionError::NoStep {
        from: current,
        direction,
    })
}

/// Menu path: any column except the current one.
pub fn menu_move(
    current: OrderStatus,
    target: OrderStatus,
) -> Result<OrderStatus, TransitionError> {
    if current == target {
        return Err(TransitionError::SameStatus(current));
    }
    Ok(target)
}

pub fn resolve(
    current: OrderStatus,
    request: TransitionRequest,
) -> Result<OrderStatus, TransitionError> {
    match request {
        TransitionRequest::Arrow(direction) => step(current, direction),
        TransitionRequest::Menu(target) => menu_move(current, target),
    }
}

/// Arrow controls shown for a column, back arrow first.
pub fn arrow_controls(current: OrderStatus) -> Vec<ArrowControl> {
    let mut controls = Vec::with_capacity(2);
    if let Some(target) = previous_status(current) {
        controls.push(ArrowControl {
            direction: Direction::Back,
            target,
            tooltip: match target {
                OrderStatus::InProduction => "Voltar para Produção",
                _ => "Voltar para Análise",
            },
        });
    }
    if let Some(target) = next_status(current) {
        controls.push(ArrowControl {
            direction: Direction::Forward,
            target,
            tooltip: match target {
                OrderStatus::Ready => "Mover para Pronto",
                _ => "Mover para Produção",
            },
        });
    }
    controls
}

/// Entries of the "move to" menu with their enabled flag.
pub fn menu_options(current: OrderStatus) -> Vec<(OrderStatus, bool)> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| (status, status != current))
        .collect()
}

#[cfg(test)]
#[path = "tests/transitions_tests.rs"]
mod tests;
