//! The order state machine.
//!
//! Every status change in the system goes through the two functions in this
//! module: [`next_status`] answers "does this transition exist", and
//! [`authorize`] answers "may this actor perform it on this order". Handlers
//! never compare status strings themselves.
//!
//! | From      | Action  | To        | Who                                      |
//! |-----------|---------|-----------|------------------------------------------|
//! | Draft     | Submit  | Submitted | the order's client                       |
//! | Submitted | Confirm | Approved  | admin, or the assigned seller            |
//! | Submitted | Reject  | Rejected  | admin, or the assigned seller            |
//! | Draft, Submitted, Approved, Assigned | Cancel | Canceled | admin / assigned seller; the client only from Draft or Submitted |
//! | Approved  | Assign  | Assigned  | admin                                    |
//! | Assigned  | Fulfill | Fulfilled | admin, or the assigned seller            |
//! | Fulfilled | Ship    | Shipped   | admin, or the assigned seller            |
//! | Shipped   | Deliver | Delivered | admin, or the assigned seller            |
//!
//! `Canceled`, `Delivered` and `Rejected` are terminal: no action leads out of
//! them, including cancel.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatus, Role, UserInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Submit,
    Confirm,
    Reject,
    Cancel,
    Assign,
    Fulfill,
    Ship,
    Deliver,
}

impl Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecycleAction::Submit => "submit",
            LifecycleAction::Confirm => "confirm",
            LifecycleAction::Reject => "reject",
            LifecycleAction::Cancel => "cancel",
            LifecycleAction::Assign => "assign",
            LifecycleAction::Fulfill => "fulfill",
            LifecycleAction::Ship => "ship",
            LifecycleAction::Deliver => "deliver",
        };
        write!(f, "{s}")
    }
}

/// The transition table. Returns the target status when `action` is valid
/// from `current`, and `None` otherwise. Terminal states return `None` for
/// every action.
pub fn next_status(current: OrderStatus, action: LifecycleAction) -> Option<OrderStatus> {
    use LifecycleAction::*;
    use OrderStatus::*;
    match (current, action) {
        (Draft, Submit) => Some(Submitted),
        (Submitted, Confirm) => Some(Approved),
        (Submitted, Reject) => Some(Rejected),
        (Draft | Submitted | Approved | Assigned, Cancel) => Some(Canceled),
        (Approved, Assign) => Some(Assigned),
        (Assigned, Fulfill) => Some(Fulfilled),
        (Fulfilled, Ship) => Some(Shipped),
        (Shipped, Deliver) => Some(Delivered),
        (_, _) => None,
    }
}

/// Why an actor was turned away. Distinct from "the transition does not
/// exist" so the HTTP layer can answer 403 rather than 409.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    NotStaff,
    AdminOnly,
    ClientsOnly,
    NotAssignedSeller,
    NotOrderOwner,
    ClientCannotActAfterSubmission,
}

impl Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Denial::NotStaff => "only administrators or the assigned seller may perform this action",
            Denial::AdminOnly => "only administrators may perform this action",
            Denial::ClientsOnly => "only client accounts hold a cart",
            Denial::NotAssignedSeller => "this order is assigned to a different seller",
            Denial::NotOrderOwner => "the order belongs to a different client",
            Denial::ClientCannotActAfterSubmission => {
                "clients may only cancel orders that are still in draft or submitted state"
            },
        };
        write!(f, "{s}")
    }
}

/// Role and ownership gate, evaluated identically for every action:
///
/// * Admin may act on any order.
/// * Seller may act only on orders assigned to them.
/// * Client may submit their own draft, and cancel their own order while it
///   is still Draft or Submitted. Nothing else.
pub fn authorize(actor: &UserInfo, order: &Order, action: LifecycleAction) -> Result<(), Denial> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Seller => {
            if action == LifecycleAction::Assign {
                Err(Denial::AdminOnly)
            } else if order.seller_id == Some(actor.id) {
                Ok(())
            } else {
                Err(Denial::NotAssignedSeller)
            }
        },
        Role::Client => {
            if order.client_id != Some(actor.id) {
                return Err(Denial::NotOrderOwner);
            }
            match action {
                LifecycleAction::Submit => Ok(()),
                LifecycleAction::Cancel
                    if matches!(order.status, OrderStatus::Draft | OrderStatus::Submitted) =>
                {
                    Ok(())
                },
                LifecycleAction::Cancel => Err(Denial::ClientCannotActAfterSubmission),
                _ => Err(Denial::NotStaff),
            }
        },
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use voltio_common::Money;

    use super::*;
    use crate::db_types::{Currency, OrderId, OrderType, UserId};

    fn order(status: OrderStatus, client: i64, seller: Option<i64>) -> Order {
        Order {
            id: OrderId(1),
            code: None,
            order_type: OrderType::Order,
            status,
            currency: Currency::Ars,
            subtotal: Money::ZERO,
            tax_total: Money::ZERO,
            total: Money::ZERO,
            client_id: Some(UserId(client)),
            seller_id: seller.map(UserId),
            contact_name: None,
            contact_email: None,
            contact_phone: None,
            contact_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            submitted_at: None,
        }
    }

    fn user(id: i64, role: Role) -> UserInfo {
        UserInfo { id: UserId(id), role, email: format!("u{id}@example.com"), name: format!("u{id}") }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        use LifecycleAction::*;
        for status in [OrderStatus::Canceled, OrderStatus::Delivered, OrderStatus::Rejected] {
            for action in [Submit, Confirm, Reject, Cancel, Assign, Fulfill, Ship, Deliver] {
                assert_eq!(next_status(status, action), None, "{status} must not allow {action}");
            }
        }
    }

    #[test]
    fn fulfillment_chain_is_linear() {
        use LifecycleAction::*;
        assert_eq!(next_status(OrderStatus::Approved, Assign), Some(OrderStatus::Assigned));
        assert_eq!(next_status(OrderStatus::Assigned, Fulfill), Some(OrderStatus::Fulfilled));
        assert_eq!(next_status(OrderStatus::Fulfilled, Ship), Some(OrderStatus::Shipped));
        assert_eq!(next_status(OrderStatus::Shipped, Deliver), Some(OrderStatus::Delivered));
        // no skipping ahead
        assert_eq!(next_status(OrderStatus::Approved, Ship), None);
        assert_eq!(next_status(OrderStatus::Assigned, Deliver), None);
    }

    #[test]
    fn fulfilled_and_shipped_orders_cannot_be_canceled() {
        for status in [OrderStatus::Fulfilled, OrderStatus::Shipped] {
            assert_eq!(next_status(status, LifecycleAction::Cancel), None);
        }
        for status in
            [OrderStatus::Draft, OrderStatus::Submitted, OrderStatus::Approved, OrderStatus::Assigned]
        {
            assert_eq!(next_status(status, LifecycleAction::Cancel), Some(OrderStatus::Canceled));
        }
    }

    #[test]
    fn sellers_act_only_on_their_orders() {
        let o = order(OrderStatus::Submitted, 10, Some(20));
        assert!(authorize(&user(20, Role::Seller), &o, LifecycleAction::Confirm).is_ok());
        assert_eq!(
            authorize(&user(21, Role::Seller), &o, LifecycleAction::Confirm),
            Err(Denial::NotAssignedSeller)
        );
        let unassigned = order(OrderStatus::Submitted, 10, None);
        assert_eq!(
            authorize(&user(20, Role::Seller), &unassigned, LifecycleAction::Confirm),
            Err(Denial::NotAssignedSeller)
        );
    }

    #[test]
    fn clients_cancel_only_their_own_early_orders() {
        let submitted = order(OrderStatus::Submitted, 10, Some(20));
        assert!(authorize(&user(10, Role::Client), &submitted, LifecycleAction::Cancel).is_ok());
        assert_eq!(
            authorize(&user(11, Role::Client), &submitted, LifecycleAction::Cancel),
            Err(Denial::NotOrderOwner)
        );
        let approved = order(OrderStatus::Approved, 10, Some(20));
        assert_eq!(
            authorize(&user(10, Role::Client), &approved, LifecycleAction::Cancel),
            Err(Denial::ClientCannotActAfterSubmission)
        );
        // admin can still cancel the approved order
        assert!(authorize(&user(1, Role::Admin), &approved, LifecycleAction::Cancel).is_ok());
        // but clients never confirm anything
        assert_eq!(
            authorize(&user(10, Role::Client), &submitted, LifecycleAction::Confirm),
            Err(Denial::NotStaff)
        );
    }
}
