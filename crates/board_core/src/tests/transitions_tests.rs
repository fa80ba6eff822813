use super::*;

#[test]
fn forward_chain_advances_one_column_at_a_time() {
    let mut status = OrderStatus::InAnalysis;
    let mut visited = vec![status];
    while let Ok(next) = step(status, Direction::Forward) {
        visited.push(next);
        status = next;
    }
    assert_eq!(visited, OrderStatus::ALL.to_vec());
}

#[test]
fn backward_moves_one_step() {
    assert_eq!(
        step(OrderStatus::Ready, Direction::Back),
        Ok(OrderStatus::InProduction)
    );
    assert_eq!(
        step(OrderStatus::InProduction, Direction::Back),
        Ok(OrderStatus::InAnalysis)
    );
    assert_eq!(
        step(OrderStatus::InAnalysis, Direction::Back),
        Err(TransitionError::NoStep {
            from: OrderStatus::InAnalysis,
            direction: Direction::Back,
        })
    );
}

#[test]
fn arrows_never_offer_a_skip() {
    for status in OrderStatus::ALL {
        for control in arrow_controls(status) {
            let distance =
                (control.target.column_index() as i64 - status.column_index() as i64).abs();
            assert_eq!(distance, 1, "{status} offers {:?}", control);
        }
    }
}

#[test]
fn arrow_controls_per_column() {
    let directions = |status| {
        arrow_controls(status)
            .into_iter()
            .map(|control| control.direction)
            .collect::<Vec<_>>()
    };
    assert_eq!(directions(OrderStatus::InAnalysis), vec![Direction::Forward]);
    assert_eq!(
        directions(OrderStatus::InProduction),
        vec![Direction::Back, Direction::Forward]
    );
    assert_eq!(directions(OrderStatus::Ready), vec![Direction::Back]);
}

#[test]
fn menu_allows_jumps_but_rejects_same_status() {
    assert_eq!(
        resolve(
            OrderStatus::InAnalysis,
            TransitionRequest::Menu(OrderStatus::Ready)
        ),
        Ok(OrderStatus::Ready)
    );
    assert_eq!(
        resolve(
            OrderStatus::Ready,
            TransitionRequest::Menu(OrderStatus::Ready)
        ),
        Err(TransitionError::SameStatus(OrderStatus::Ready))
    );
}

#[test]
fn menu_disables_current_column_only() {
    let options = menu_options(OrderStatus::InProduction);
    assert_eq!(
        options,
        vec![
            (OrderStatus::InAnalysis, true),
            (OrderStatus::InProduction, false),
            (OrderStatus::Ready, true),
        ]
    );
}
