//! Scenario: dispatcher force-complete.
//!
//! # Invariant under test
//!
//! `complete` is permitted for the assigned master or for any dispatcher
//! (operational override) and rejected for every other master. A failed
//! attempt leaves the order and its audit trail untouched.
//!
//! DB-backed test. Skips if `SD_DATABASE_URL` is not set.

use std::sync::Arc;

use sd_schemas::OrderStatus;
use sd_testkit::RecordingNotifier;
use sd_workflow::OrderService;

#[tokio::test]
async fn dispatcher_may_force_complete_but_other_master_may_not() -> anyhow::Result<()> {
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

    let disp = sd_testkit::dispatcher("disp_force");
    let mast = sd_testkit::master("mast_force");
    let other = sd_testkit::master("mast_force_other");
    sd_db::insert_user(&pool, &disp).await?;
    sd_db::insert_user(&pool, &mast).await?;
    sd_db::insert_user(&pool, &other).await?;

    let recorder = Arc::new(RecordingNotifier::new());
    let service = OrderService::new(pool.clone(), recorder.clone());

    let order = service.submit(&sd_testkit::sample_order()).await?;
    service
        .assign(order.order_id, disp.user_id, mast.user_id, None)
        .await?;
    service.start(order.order_id, mast.user_id).await?;
    let trail_before = service.history(order.order_id).await?.len();
    recorder.take();

    // A master who is not the assignee is rejected; nothing changes.
    let err = service
        .complete(order.order_id, other.user_id)
        .await
        .unwrap_err();
    assert!(err.is_authorization());

    let unchanged = service
        .list_orders(&sd_db::OrderFilter {
            assigned_master: Some(mast.user_id),
            ..Default::default()
        })
        .await?;
    assert_eq!(unchanged[0].status, OrderStatus::InProgress);
    assert_eq!(service.history(order.order_id).await?.len(), trail_before);
    assert!(recorder.notices().is_empty());

    // The dispatcher override goes through.
    let order = service.complete(order.order_id, disp.user_id).await?;
    assert_eq!(order.status, OrderStatus::Done);
    assert!(order.completed_at_utc.is_some());

    let history = service.history(order.order_id).await?;
    assert_eq!(history[0].old_status, OrderStatus::InProgress);
    assert_eq!(history[0].new_status, OrderStatus::Done);
    assert_eq!(history[0].changed_by, Some(disp.user_id));

    Ok(())
}
