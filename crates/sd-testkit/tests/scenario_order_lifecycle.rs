//! Scenario: full order lifecycle (submit → assign → start → complete).
//!
//! # Invariant under test
//!
//! Every successful transition persists the new status, appends exactly one
//! history row with the matching status pair, and dispatches its notices.
//! History reads back newest first.
//!
//! DB-backed test. Skips if `SD_DATABASE_URL` is not set.

use std::sync::Arc;

use sd_schemas::OrderStatus;
use sd_testkit::RecordingNotifier;
use sd_workflow::OrderService;
use uuid::Uuid;

#[tokio::test]
async fn lifecycle_runs_to_done_with_full_audit_trail() -> anyhow::Result<()> {
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

    let disp = sd_testkit::dispatcher("disp_lifecycle");
    let mast = sd_testkit::master("mast_lifecycle");
    sd_db::insert_user(&pool, &disp).await?;
    sd_db::insert_user(&pool, &mast).await?;

    let recorder = Arc::new(RecordingNotifier::new());
    let service = OrderService::new(pool.clone(), recorder.clone());

    // Public submission lands in `new` with a store-assigned creation time.
    let order = service.submit(&sd_testkit::sample_order()).await?;
    assert_eq!(order.status, OrderStatus::New);
    assert!(order.assigned_master.is_none());

    // Assign: status, both weak references and the planned date are set.
    let planned = chrono::Utc::now() + chrono::Duration::hours(4);
    let order = service
        .assign(order.order_id, disp.user_id, mast.user_id, Some(planned))
        .await?;
    assert_eq!(order.status, OrderStatus::Assigned);
    assert_eq!(order.assigned_master, Some(mast.user_id));
    assert_eq!(order.dispatcher, Some(disp.user_id));
    assert!(order.planned_at_utc.is_some());

    let history = service.history(order.order_id).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_status, OrderStatus::New);
    assert_eq!(history[0].new_status, OrderStatus::Assigned);
    assert_eq!(history[0].changed_by, Some(disp.user_id));
    assert_eq!(history[0].comment, "master assigned: mast_lifecycle");

    // Assign notified the customer and the master.
    assert_eq!(recorder.take().len(), 2);

    // Start by the assigned master.
    let order = service.start(order.order_id, mast.user_id).await?;
    assert_eq!(order.status, OrderStatus::InProgress);
    assert_eq!(recorder.take().len(), 1);

    // Complete by the assigned master; completion time is set.
    let order = service.complete(order.order_id, mast.user_id).await?;
    assert_eq!(order.status, OrderStatus::Done);
    assert!(order.completed_at_utc.is_some());
    assert_eq!(recorder.take().len(), 1);

    // Audit trail: one row per realized transition, newest first.
    let history = service.history(order.order_id).await?;
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].new_status, OrderStatus::Done);
    assert_eq!(history[2].new_status, OrderStatus::Assigned);
    assert!(history[0].ts_utc >= history[2].ts_utc);

    Ok(())
}

#[tokio::test]
async fn transition_on_unknown_entities_is_not_found() -> anyhow::Result<()> {
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

    let service = OrderService::new(pool.clone(), Arc::new(RecordingNotifier::new()));

    let err = service
        .assign(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = service.history(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());

    Ok(())
}
