use crate::orders::OrderStatus;

/// Service for managing order status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Placed, Cancelled
    /// - Placed → Completed, Cancelled
    /// - Completed → Cancelled (refund scenario)
    /// - Cancelled → (no transitions allowed except to itself)
    /// - Any status → Same status (idempotent)
    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        // Same status is always valid (idempotent)
        if from == to {
            return true;
        }

        match (from, to) {
            (OrderStatus::Pending, OrderStatus::Placed) => true,
            (OrderStatus::Pending, OrderStatus::Cancelled) => true,

            (OrderStatus::Placed, OrderStatus::Completed) => true,
            (OrderStatus::Placed, OrderStatus::Cancelled) => true,

            (OrderStatus::Completed, OrderStatus::Cancelled) => true,

            // From Cancelled - no transitions allowed (same status handled above)
            (OrderStatus::Cancelled, _) => false,

            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// Returns `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_can_be_placed_or_cancelled() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Placed
        ));
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Cancelled
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Completed
        ));
    }

    #[test]
    fn test_placed_can_complete_or_cancel() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Placed,
            OrderStatus::Completed
        ));
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Placed,
            OrderStatus::Cancelled
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Placed,
            OrderStatus::Pending
        ));
    }

    #[test]
    fn test_completed_can_only_cancel() {
        assert!(StatusMachine::is_valid_transition(
            OrderStatus::Completed,
            OrderStatus::Cancelled
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Completed,
            OrderStatus::Pending
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Completed,
            OrderStatus::Placed
        ));
    }

    #[test]
    fn test_cancelled_is_terminal() {
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Cancelled,
            OrderStatus::Pending
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Cancelled,
            OrderStatus::Placed
        ));
        assert!(!StatusMachine::is_valid_transition(
            OrderStatus::Cancelled,
            OrderStatus::Completed
        ));
    }

    #[test]
    fn test_transition_returns_target_status() {
        let result = StatusMachine::transition(OrderStatus::Pending, OrderStatus::Placed);
        assert_eq!(result.unwrap(), OrderStatus::Placed);
    }

    #[test]
    fn test_transition_reports_invalid_moves() {
        let result = StatusMachine::transition(OrderStatus::Pending, OrderStatus::Completed);
        assert!(result.unwrap_err().contains("Invalid status transition"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop_oneof![
            Just(OrderStatus::Pending),
            Just(OrderStatus::Placed),
            Just(OrderStatus::Completed),
            Just(OrderStatus::Cancelled),
        ]
    }

    /// Same-status transitions are always valid (idempotent)
    #[test]
    fn prop_same_status_is_valid() {
        proptest!(|(status in order_status_strategy())| {
            prop_assert!(StatusMachine::is_valid_transition(status, status));
        });
    }

    /// Cancelled can be reached from any other state
    #[test]
    fn prop_can_always_cancel() {
        proptest!(|(from in order_status_strategy())| {
            if from != OrderStatus::Cancelled {
                prop_assert!(StatusMachine::is_valid_transition(
                    from,
                    OrderStatus::Cancelled
                ));
            }
        });
    }

    /// transition() and is_valid_transition() agree
    #[test]
    fn prop_transition_consistency() {
        proptest!(|(
            from in order_status_strategy(),
            to in order_status_strategy()
        )| {
            let is_valid = StatusMachine::is_valid_transition(from, to);
            let result = StatusMachine::transition(from, to);

            if is_valid {
                prop_assert_eq!(result.unwrap(), to);
            } else {
                prop_assert!(result.is_err());
            }
        });
    }
}
