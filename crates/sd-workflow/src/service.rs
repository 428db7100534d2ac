//! Order workflow service.
//!
//! Orchestrates one transition as a single logical unit from the caller's
//! perspective: load entities, run the pure rule, persist the partial
//! update, then append the audit row and dispatch notices. Once the status
//! update is persisted the transition is committed; auditing and
//! notification are advisory and never undo it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use sd_db::{self as db, NewHistory, OrderFilter};
use sd_notify::Notifier;
use sd_schemas::{NewOrder, Order, OrderHistory, OrderStatus, User};

use crate::engine::{self, Transition};
use crate::error::WorkflowError;

/// Core-facing interface consumed by the presentation layer.
///
/// Concurrency: each transition is a read-modify-write on one order row with
/// no version check; concurrent transitions on the same order race at the
/// storage layer and the last write wins (accepted limitation).
pub struct OrderService {
    pool: PgPool,
    notifier: Arc<dyn Notifier>,
}

impl OrderService {
    pub fn new(pool: PgPool, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, notifier }
    }

    // -- submissions --------------------------------------------------------

    /// Public submission: creates an order in status `new`.
    pub async fn submit(&self, new_order: &NewOrder) -> Result<Order, WorkflowError> {
        engine::validate_submission(new_order)?;
        let order = db::insert_order(&self.pool, Uuid::new_v4(), new_order).await?;
        Ok(order)
    }

    // -- transitions --------------------------------------------------------

    /// Assign `master_id` to the order, optionally with a planned visit time.
    pub async fn assign(
        &self,
        order_id: Uuid,
        acting_user_id: Uuid,
        master_id: Uuid,
        planned_at: Option<DateTime<Utc>>,
    ) -> Result<Order, WorkflowError> {
        let mut order = self.load_order(order_id).await?;
        let actor = self.load_user(acting_user_id).await?;
        let master = self.load_user(master_id).await?;

        let transition = engine::assign(&mut order, &actor, &master, planned_at)?;
        db::update_assignment(&self.pool, &order).await?;

        self.finish(&order, &actor, transition).await;
        Ok(order)
    }

    /// The assigned master starts work.
    pub async fn start(
        &self,
        order_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<Order, WorkflowError> {
        let mut order = self.load_order(order_id).await?;
        let actor = self.load_user(acting_user_id).await?;

        let transition = engine::start(&mut order, &actor)?;
        db::update_status(&self.pool, order.order_id, order.status).await?;

        self.finish(&order, &actor, transition).await;
        Ok(order)
    }

    /// Complete an in-progress order (assigned master, or dispatcher
    /// override).
    pub async fn complete(
        &self,
        order_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<Order, WorkflowError> {
        let mut order = self.load_order(order_id).await?;
        let actor = self.load_user(acting_user_id).await?;

        let transition = engine::complete(&mut order, &actor, Utc::now())?;
        db::update_completion(&self.pool, &order).await?;

        self.finish(&order, &actor, transition).await;
        Ok(order)
    }

    /// Cancel an order (any state except `done`).
    pub async fn cancel(
        &self,
        order_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<Order, WorkflowError> {
        let mut order = self.load_order(order_id).await?;
        let actor = self.load_user(acting_user_id).await?;

        let transition = engine::cancel(&mut order, &actor)?;
        db::update_cancellation(&self.pool, &order).await?;

        self.finish(&order, &actor, transition).await;
        Ok(order)
    }

    // -- queries ------------------------------------------------------------

    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, WorkflowError> {
        Ok(db::list_orders(&self.pool, filter).await?)
    }

    /// A master's worklist: their orders that are not yet done.
    pub async fn open_orders_for_master(
        &self,
        master_id: Uuid,
    ) -> Result<Vec<Order>, WorkflowError> {
        Ok(db::list_open_for_master(&self.pool, master_id).await?)
    }

    /// Audit trail for one order, newest first.
    pub async fn history(&self, order_id: Uuid) -> Result<Vec<OrderHistory>, WorkflowError> {
        // Distinguish "no history yet" from "no such order".
        self.load_order(order_id).await?;
        Ok(db::list_history(&self.pool, order_id).await?)
    }

    /// Order counts grouped by status (dispatcher dashboard).
    pub async fn status_counts(&self) -> Result<Vec<(OrderStatus, i64)>, WorkflowError> {
        Ok(db::count_by_status(&self.pool).await?)
    }

    // -- internals ----------------------------------------------------------

    /// Post-commit effects of a realized transition: exactly one audit row,
    /// then notices. A failed history append is logged and swallowed; the
    /// persisted status change stays authoritative.
    async fn finish(&self, order: &Order, actor: &User, transition: Transition) {
        let entry = NewHistory {
            order_id: order.order_id,
            changed_by: Some(actor.user_id),
            old_status: transition.old_status,
            new_status: transition.new_status,
            comment: transition.comment,
        };
        if let Err(err) = db::insert_history(&self.pool, &entry).await {
            warn!(
                order_id = %order.order_id,
                error = %err,
                "history append failed; transition remains committed"
            );
        }

        for notice in &transition.notices {
            self.notifier.notify(notice);
        }
    }

    async fn load_order(&self, order_id: Uuid) -> Result<Order, WorkflowError> {
        db::fetch_order(&self.pool, order_id)
            .await?
            .ok_or(WorkflowError::NotFound("order", order_id))
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, WorkflowError> {
        db::fetch_user(&self.pool, user_id)
            .await?
            .ok_or(WorkflowError::NotFound("user", user_id))
    }
}
