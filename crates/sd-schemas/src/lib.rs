//! Shared entity types for the service-desk core.
//!
//! Plain data only: no I/O, no business rules. Weak references
//! (`assigned_master`, `dispatcher`, `changed_by`) are bare optional ids
//! resolved through the store at read time, never embedded object graphs.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Closed set of user roles. A dispatcher assigns and oversees orders; a
/// master (field technician) executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Dispatcher,
    Master,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Dispatcher => "dispatcher",
            Role::Master => "master",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "dispatcher" => Ok(Role::Dispatcher),
            "master" => Ok(Role::Master),
            other => Err(anyhow!("invalid role: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of an order. Storage never observes any value outside
/// this set (enforced again by a CHECK constraint in the schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Assigned,
    InProgress,
    Done,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Assigned => "assigned",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Done => "done",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "new" => Ok(OrderStatus::New),
            "assigned" => Ok(OrderStatus::Assigned),
            "in_progress" => Ok(OrderStatus::InProgress),
            "done" => Ok(OrderStatus::Done),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(anyhow!("invalid order status: {}", other)),
        }
    }

    /// Returns `true` if no further transitions are possible. `cancelled` is
    /// NOT terminal: a cancelled order may be re-assigned (job re-opened).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Done)
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    /// Login name; for masters this doubles as the notification contact.
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub active: bool,
    pub created_at_utc: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// Public-submission payload. The store assigns id, status and creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub category: String,
    pub description: String,
    pub address: String,
    pub customer_name: String,
    /// Phone or email.
    pub customer_contact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub category: String,
    pub description: String,
    pub address: String,
    pub customer_name: String,
    pub customer_contact: String,
    pub status: OrderStatus,
    pub created_at_utc: DateTime<Utc>,
    /// Weak reference to the assigned master (role `master`).
    pub assigned_master: Option<Uuid>,
    /// Weak reference to the dispatcher who assigned or cancelled the order.
    pub dispatcher: Option<Uuid>,
    pub planned_at_utc: Option<DateTime<Utc>>,
    pub completed_at_utc: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// OrderHistory
// ---------------------------------------------------------------------------

/// One immutable audit record of a realized transition. Append-only: the
/// store exposes no update or delete for these rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHistory {
    pub history_id: Uuid,
    pub order_id: Uuid,
    /// Acting user; `None` for system-initiated changes.
    pub changed_by: Option<Uuid>,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    /// Store-assigned creation time.
    pub ts_utc: DateTime<Utc>,
    pub comment: String,
}
