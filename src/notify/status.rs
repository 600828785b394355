use crate::entity::order::OrderStatus;

/// Title and body of a customer-facing status toast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub title: &'static str,
    pub message: String,
}

/// Map a status value to the toast shown to the customer.
///
/// Only confirmed, preparing, ready, out_for_delivery and completed produce a
/// message; anything else returns `None`.
pub fn status_message(status: &str, order_number: i64) -> Option<StatusMessage> {
    let (title, message) = match OrderStatus::parse(status)? {
        OrderStatus::Confirmed => (
            "Order confirmed!",
            format!("Order #{} has been confirmed by the restaurant.", order_number),
        ),
        OrderStatus::Preparing => (
            "Order in preparation",
            format!("Order #{} is being prepared.", order_number),
        ),
        OrderStatus::Ready => (
            "Order ready!",
            format!("Order #{} is ready.", order_number),
        ),
        OrderStatus::OutForDelivery => (
            "Out for delivery",
            format!("Order #{} is on its way to you.", order_number),
        ),
        OrderStatus::Completed => (
            "Order completed",
            format!("Order #{} has been delivered. Enjoy your meal!", order_number),
        ),
        OrderStatus::Pending | OrderStatus::Cancelled => return None,
    };

    Some(StatusMessage { title, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses() {
        let known = ["confirmed", "preparing", "ready", "out_for_delivery", "completed"];
        for status in known {
            let msg = status_message(status, 42).unwrap();
            assert!(msg.message.contains("#42"), "{status}: {}", msg.message);
        }
        assert_eq!(status_message("ready", 7).unwrap().title, "Order ready!");
    }

    #[test]
    fn test_unknown_statuses_are_ignored() {
        assert_eq!(status_message("pending", 1), None);
        assert_eq!(status_message("cancelled", 1), None);
        assert_eq!(status_message("READY", 1), None);
        assert_eq!(status_message("", 1), None);
    }
}
