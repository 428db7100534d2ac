//! Best-effort notification dispatch.
//!
//! # Design
//!
//! Callers hand a [`Notice`] to a [`Notifier`] and move on: delivery is
//! advisory, never a precondition or postcondition of a transition. `notify`
//! never blocks and never surfaces an error; failures are logged and
//! swallowed. Retries may duplicate messages; idempotency is NOT guaranteed
//! and that is acceptable for the domain.
//!
//! Two channels exist:
//! - short-message: synchronous log stub ([`send_sms`]);
//! - email: a log stub as well ([`send_email`]), optionally deferred to a
//!   background worker via [`QueuedNotifier`] so the request path is never
//!   blocked by a slow channel.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// Transition events that produce customer/master notifications.
/// Cancellation intentionally has no event at this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeEvent {
    Assigned,
    InProgress,
    Done,
}

impl NoticeEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeEvent::Assigned => "assigned",
            NoticeEvent::InProgress => "in_progress",
            NoticeEvent::Done => "done",
        }
    }
}

/// One channel-agnostic, human-readable message about an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub order_id: Uuid,
    pub event: NoticeEvent,
    /// Phone or email of the recipient (customer contact or master login).
    pub contact: String,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Injected notification capability. Implementations must not block the
/// caller and must not let delivery failures escape.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Synchronous stub: both channels go straight to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        send_sms(&notice.contact, &notice.text);
        send_email(&notice.contact, &subject_for(notice), &notice.text);
    }
}

fn subject_for(notice: &Notice) -> String {
    format!("Order {}: {}", notice.order_id, notice.event.as_str())
}

/// Short-message delivery stub.
pub fn send_sms(contact: &str, text: &str) {
    info!(target: "sd_notify::sms", contact, text, "sms");
}

/// Email delivery stub.
pub fn send_email(contact: &str, subject: &str, text: &str) {
    info!(target: "sd_notify::email", contact, subject, text, "email");
}

// ---------------------------------------------------------------------------
// QueuedNotifier
// ---------------------------------------------------------------------------

/// Defers delivery to a spawned worker task through an unbounded channel.
///
/// At-least-once, no ordering guarantee relative to other notices for the
/// same order. `notify` only enqueues; if the worker is gone the notice is
/// dropped with a warning (fire-and-forget, per the domain contract).
pub struct QueuedNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl QueuedNotifier {
    /// Spawn the worker draining the queue into `inner`. The handle resolves
    /// once every sender is dropped and the queue is empty.
    pub fn spawn(inner: Arc<dyn Notifier>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notice>();

        let handle = tokio::spawn(async move {
            while let Some(notice) = rx.recv().await {
                inner.notify(&notice);
            }
        });

        (Self { tx }, handle)
    }
}

impl Notifier for QueuedNotifier {
    fn notify(&self, notice: &Notice) {
        if self.tx.send(notice.clone()).is_err() {
            warn!(
                order_id = %notice.order_id,
                event = notice.event.as_str(),
                "notification worker gone; notice dropped"
            );
        }
    }
}
