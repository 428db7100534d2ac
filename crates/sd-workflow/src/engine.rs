//! Order transition rules.
//!
//! # Design
//!
//! Pure business rules for the order lifecycle. Every operation validates
//! role-based authorization and current-state eligibility before touching the
//! order; on error the order is untouched. No I/O, no clock reads, no
//! randomness: the service layer supplies timestamps and applies effects.
//!
//! Each successful call returns a [`Transition`] describing the realized
//! change: the status pair for the audit row, a human-readable cause, and
//! the notices to hand to the notification dispatcher.
//!
//! # State diagram
//!
//! ```text
//!            assign              start               complete
//!   new ──────────► assigned ──────────► in_progress ──────────► done (terminal)
//!    │                  │                     │
//!    │ cancel           │ cancel              │ cancel
//!    ▼                  ▼                     ▼
//! cancelled ◄─────────────────────────────────┘
//!    │
//!    │ assign (re-open)
//!    └────────────► assigned
//! ```
//!
//! Re-assigning an `assigned` or `in_progress` order is rejected; it must be
//! cancelled first. A dispatcher may force-complete an in-progress order.

use chrono::{DateTime, Utc};

use sd_notify::{Notice, NoticeEvent};
use sd_schemas::{NewOrder, Order, OrderStatus, Role, User};

use crate::error::WorkflowError;

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// Outcome of one realized transition, consumed by the service layer:
/// the audit-row material plus the notices to dispatch.
#[derive(Debug, Clone)]
pub struct Transition {
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub comment: String,
    pub notices: Vec<Notice>,
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Validate a public submission before it reaches the store.
pub fn validate_submission(new_order: &NewOrder) -> Result<(), WorkflowError> {
    for (field, value) in [
        ("category", &new_order.category),
        ("description", &new_order.description),
        ("customer_name", &new_order.customer_name),
        ("customer_contact", &new_order.customer_contact),
    ] {
        if value.trim().is_empty() {
            return Err(WorkflowError::Validation(format!("{field} must not be empty")));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// assign
// ---------------------------------------------------------------------------

/// Assign a master to a `new` or `cancelled` order (re-opening a cancelled
/// job is permitted).
///
/// # Errors
/// `Authorization` unless the actor is a dispatcher; `Validation` when the
/// assignee is not an active master or the order is not in an assignable
/// state.
pub fn assign(
    order: &mut Order,
    actor: &User,
    master: &User,
    planned_at: Option<DateTime<Utc>>,
) -> Result<Transition, WorkflowError> {
    match actor.role {
        Role::Dispatcher => {}
        Role::Master => {
            return Err(WorkflowError::Authorization(
                "only a dispatcher may assign a master".to_string(),
            ));
        }
    }
    match master.role {
        Role::Master => {}
        Role::Dispatcher => {
            return Err(WorkflowError::Validation(format!(
                "user {} is not a master",
                master.username
            )));
        }
    }
    if !master.active {
        return Err(WorkflowError::Validation(format!(
            "master {} is not active",
            master.username
        )));
    }
    if !matches!(order.status, OrderStatus::New | OrderStatus::Cancelled) {
        return Err(WorkflowError::Validation(format!(
            "cannot assign an order in status {}; only new or cancelled orders are assignable",
            order.status.as_str()
        )));
    }

    let old = order.status;
    order.status = OrderStatus::Assigned;
    order.assigned_master = Some(master.user_id);
    order.dispatcher = Some(actor.user_id);
    order.planned_at_utc = planned_at;
    // A re-opened job is a fresh engagement: stale completion time must not
    // survive into the new lifecycle.
    order.completed_at_utc = None;

    Ok(Transition {
        old_status: old,
        new_status: order.status,
        comment: format!("master assigned: {}", master.username),
        notices: vec![
            Notice {
                order_id: order.order_id,
                event: NoticeEvent::Assigned,
                contact: order.customer_contact.clone(),
                text: format!(
                    "Your order {} was accepted. A master has been assigned.",
                    order.order_id
                ),
            },
            Notice {
                order_id: order.order_id,
                event: NoticeEvent::Assigned,
                contact: master.username.clone(),
                text: format!(
                    "You are assigned order {} (address: {}).",
                    order.order_id, order.address
                ),
            },
        ],
    })
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

/// The assigned master starts work on an `assigned` order.
///
/// # Errors
/// `Authorization` unless the actor is the assigned master; `Validation`
/// when the order is not in status `assigned`.
pub fn start(order: &mut Order, actor: &User) -> Result<Transition, WorkflowError> {
    match actor.role {
        Role::Master => {}
        Role::Dispatcher => {
            return Err(WorkflowError::Authorization(
                "only the assigned master may start work".to_string(),
            ));
        }
    }
    if order.assigned_master != Some(actor.user_id) {
        return Err(WorkflowError::Authorization(
            "order is assigned to a different master".to_string(),
        ));
    }
    if order.status != OrderStatus::Assigned {
        return Err(WorkflowError::Validation(format!(
            "cannot start an order in status {}; it must be assigned",
            order.status.as_str()
        )));
    }

    let old = order.status;
    order.status = OrderStatus::InProgress;

    Ok(Transition {
        old_status: old,
        new_status: order.status,
        comment: "master started work".to_string(),
        notices: vec![Notice {
            order_id: order.order_id,
            event: NoticeEvent::InProgress,
            contact: order.customer_contact.clone(),
            text: format!("Work on your order {} has started.", order.order_id),
        }],
    })
}

// ---------------------------------------------------------------------------
// complete
// ---------------------------------------------------------------------------

/// Complete an `in_progress` order. The assigned master may complete their
/// own order; a dispatcher may force-complete any order (operational
/// override). Sets the completion timestamp to `now`.
///
/// # Errors
/// `Authorization` when a master completes someone else's order;
/// `Validation` when the order is not in progress.
pub fn complete(
    order: &mut Order,
    actor: &User,
    now: DateTime<Utc>,
) -> Result<Transition, WorkflowError> {
    match actor.role {
        Role::Master if order.assigned_master != Some(actor.user_id) => {
            return Err(WorkflowError::Authorization(
                "order is assigned to a different master".to_string(),
            ));
        }
        Role::Master | Role::Dispatcher => {}
    }
    if order.status != OrderStatus::InProgress {
        return Err(WorkflowError::Validation(format!(
            "cannot complete an order in status {}; it must be in progress",
            order.status.as_str()
        )));
    }

    let old = order.status;
    order.status = OrderStatus::Done;
    order.completed_at_utc = Some(now);

    Ok(Transition {
        old_status: old,
        new_status: order.status,
        comment: "order completed".to_string(),
        notices: vec![Notice {
            order_id: order.order_id,
            event: NoticeEvent::Done,
            contact: order.customer_contact.clone(),
            text: format!("Your order {} is done.", order.order_id),
        }],
    })
}

// ---------------------------------------------------------------------------
// cancel
// ---------------------------------------------------------------------------

/// Cancel an order. Allowed for any role from every state except `done`;
/// cancellation is a status, not removal, and a cancelled order may later be
/// re-assigned. A cancelling dispatcher is recorded on the order.
///
/// # Errors
/// `Validation` when the order is already done.
pub fn cancel(order: &mut Order, actor: &User) -> Result<Transition, WorkflowError> {
    if order.status == OrderStatus::Done {
        return Err(WorkflowError::Validation(
            "a completed order cannot be cancelled".to_string(),
        ));
    }

    let old = order.status;
    order.status = OrderStatus::Cancelled;
    let comment = match actor.role {
        Role::Dispatcher => {
            order.dispatcher = Some(actor.user_id);
            "cancelled by dispatcher"
        }
        Role::Master => "cancelled by master",
    };

    Ok(Transition {
        old_status: old,
        new_status: order.status,
        comment: comment.to_string(),
        // No notification event exists for cancellation.
        notices: Vec::new(),
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
