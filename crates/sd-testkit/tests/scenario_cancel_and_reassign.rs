//! Scenario: cancel re-opens an order for assignment.
//!
//! # Invariant under test
//!
//! Cancellation is a status, not removal: a cancelled order may be
//! re-assigned (job re-opened), and re-assignment clears the stale planned
//! date and completion time. Once done, cancellation is rejected and the
//! status stays `done`. Re-assigning an order that is merely `assigned` is
//! rejected; it must be cancelled first.
//!
//! DB-backed test. Skips if `SD_DATABASE_URL` is not set.

use std::sync::Arc;

use sd_schemas::OrderStatus;
use sd_testkit::RecordingNotifier;
use sd_workflow::OrderService;

#[tokio::test]
async fn cancelled_order_reopens_and_done_order_stays_done() -> anyhow::Result<()> {
    let url = match std::env::var(sd_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: SD_DATABASE_URL not set");
            return Ok(());
        }
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await?;
    sd_db::migrate(&pool).await?;

    let disp = sd_testkit::dispatcher("disp_reopen");
    let first = sd_testkit::master("mast_reopen_first");
    let second = sd_testkit::master("mast_reopen_second");
    sd_db::insert_user(&pool, &disp).await?;
    sd_db::insert_user(&pool, &first).await?;
    sd_db::insert_user(&pool, &second).await?;

    let service = OrderService::new(pool.clone(), Arc::new(RecordingNotifier::new()));

    let order = service.submit(&sd_testkit::sample_order()).await?;
    let planned = chrono::Utc::now() + chrono::Duration::hours(2);
    service
        .assign(order.order_id, disp.user_id, first.user_id, Some(planned))
        .await?;

    // Direct re-assignment of an assigned order is rejected.
    let err = service
        .assign(order.order_id, disp.user_id, second.user_id, None)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    // Cancel, then re-assign: the order re-opens with stale fields cleared.
    let order = service.cancel(order.order_id, disp.user_id).await?;
    assert_eq!(order.status, OrderStatus::Cancelled);

    let order = service
        .assign(order.order_id, disp.user_id, second.user_id, None)
        .await?;
    assert_eq!(order.status, OrderStatus::Assigned);
    assert_eq!(order.assigned_master, Some(second.user_id));
    assert!(order.planned_at_utc.is_none(), "stale planned date survives");
    assert!(order.completed_at_utc.is_none());

    // Run the re-opened job to done; then cancellation is rejected for good.
    service.start(order.order_id, second.user_id).await?;
    service.complete(order.order_id, second.user_id).await?;

    let err = service
        .cancel(order.order_id, disp.user_id)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let history = service.history(order.order_id).await?;
    assert_eq!(history[0].new_status, OrderStatus::Done);
    assert_eq!(history.len(), 5, "assign, cancel, assign, start, complete");

    Ok(())
}
