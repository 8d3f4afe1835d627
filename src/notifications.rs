// Notification triggers
//
// The engine only decides WHEN a notification fires (an order transitioning
// to paid) and WHICH template it uses; composing and sending mail belongs to
// the external notification subsystem. Template fields come from an explicit
// per-kind mapping rather than assembling config key names from strings.

use rust_decimal::Decimal;
use std::fmt;

use crate::orders::Order;

/// The kinds of customer notification the shop sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    OrderConfirmation,
    OrderCancelled,
}

/// The configuration keys holding a notification's subject and body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub subject: &'static str,
    pub body: &'static str,
}

impl NotificationKind {
    /// The template fields for this kind
    pub fn template(&self) -> NotificationTemplate {
        match self {
            NotificationKind::OrderConfirmation => NotificationTemplate {
                subject: "email_order_confirmation_subject",
                body: "email_order_confirmation_body",
            },
            NotificationKind::OrderCancelled => NotificationTemplate {
                subject: "email_order_cancelled_subject",
                body: "email_order_cancelled_body",
            },
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::OrderConfirmation => write!(f, "order confirmation"),
            NotificationKind::OrderCancelled => write!(f, "order cancelled"),
        }
    }
}

/// A notification payload handed to the external mailer
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub order_no: String,
    pub customer_id: Option<i32>,
    pub total: Decimal,
}

/// The purchase-confirmation notification for a paid order
pub fn confirmation_for(order: &Order) -> Notification {
    Notification {
        kind: NotificationKind::OrderConfirmation,
        order_no: order.order_no.clone(),
        customer_id: order.customer_id,
        total: order.total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_distinct_template_fields() {
        let kinds = [
            NotificationKind::OrderConfirmation,
            NotificationKind::OrderCancelled,
        ];

        for kind in kinds {
            let template = kind.template();
            assert!(template.subject.starts_with("email_"));
            assert!(template.subject.ends_with("_subject"));
            assert!(template.body.ends_with("_body"));
        }

        assert_ne!(
            NotificationKind::OrderConfirmation.template(),
            NotificationKind::OrderCancelled.template()
        );
    }
}
