use anyhow::{Context, Result};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use sd_schemas::{NewOrder, Order, OrderHistory, OrderStatus, Role, User};

pub const ENV_DB_URL: &str = "SD_DATABASE_URL";

/// Connect to Postgres using SD_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='orders'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok,
        has_orders_table: exists,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_orders_table: bool,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub active: bool,
}

/// Insert a new user row. (created_at_utc defaults to now() in schema)
pub async fn insert_user(pool: &PgPool, user: &NewUser) -> Result<()> {
    sqlx::query(
        r#"
        insert into users (user_id, username, full_name, role, active)
        values ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user.user_id)
    .bind(&user.username)
    .bind(&user.full_name)
    .bind(user.role.as_str())
    .bind(user.active)
    .execute(pool)
    .await
    .context("insert_user failed")?;

    Ok(())
}

/// Point read; `None` when the user does not exist.
pub async fn fetch_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        select user_id, username, full_name, role, active, created_at_utc
        from users
        where user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("fetch_user failed")?;

    row.as_ref().map(user_from_row).transpose()
}

/// Masters eligible for assignment, ordered by username.
pub async fn list_active_masters(pool: &PgPool) -> Result<Vec<User>> {
    let rows = sqlx::query(
        r#"
        select user_id, username, full_name, role, active, created_at_utc
        from users
        where role = 'master' and active
        order by username
        "#,
    )
    .fetch_all(pool)
    .await
    .context("list_active_masters failed")?;

    rows.iter().map(user_from_row).collect()
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        full_name: row.try_get("full_name")?,
        role: Role::parse(&role)?,
        active: row.try_get("active")?,
        created_at_utc: row.try_get("created_at_utc")?,
    })
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

const ORDER_COLUMNS: &str = r#"
    order_id, category, description, address, customer_name, customer_contact,
    status, created_at_utc, assigned_master, dispatcher, planned_at_utc,
    completed_at_utc
"#;

/// Insert a public submission in status `new` and return the stored row
/// (created_at_utc is assigned by the store).
pub async fn insert_order(pool: &PgPool, order_id: Uuid, new_order: &NewOrder) -> Result<Order> {
    sqlx::query(
        r#"
        insert into orders (
          order_id, category, description, address, customer_name, customer_contact
        ) values (
          $1, $2, $3, $4, $5, $6
        )
        "#,
    )
    .bind(order_id)
    .bind(&new_order.category)
    .bind(&new_order.description)
    .bind(&new_order.address)
    .bind(&new_order.customer_name)
    .bind(&new_order.customer_contact)
    .execute(pool)
    .await
    .context("insert_order failed")?;

    fetch_order(pool, order_id)
        .await?
        .context("order missing immediately after insert")
}

/// Point read; `None` when the order does not exist.
pub async fn fetch_order(pool: &PgPool, order_id: Uuid) -> Result<Option<Order>> {
    let sql = format!("select {ORDER_COLUMNS} from orders where order_id = $1");
    let row = sqlx::query(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await
        .context("fetch_order failed")?;

    row.as_ref().map(order_from_row).transpose()
}

/// Optional filters for [`list_orders`]. Empty filter lists everything.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub assigned_master: Option<Uuid>,
}

/// Filtered list, newest first.
pub async fn list_orders(pool: &PgPool, filter: &OrderFilter) -> Result<Vec<Order>> {
    let sql = format!(
        r#"
        select {ORDER_COLUMNS}
        from orders
        where ($1::text is null or status = $1)
          and ($2::uuid is null or assigned_master = $2)
        order by created_at_utc desc
        "#
    );
    let rows = sqlx::query(&sql)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.assigned_master)
        .fetch_all(pool)
        .await
        .context("list_orders failed")?;

    rows.iter().map(order_from_row).collect()
}

/// A master's worklist: orders assigned to them that are not yet done.
pub async fn list_open_for_master(pool: &PgPool, master_id: Uuid) -> Result<Vec<Order>> {
    let sql = format!(
        r#"
        select {ORDER_COLUMNS}
        from orders
        where assigned_master = $1 and status <> 'done'
        order by created_at_utc desc
        "#
    );
    let rows = sqlx::query(&sql)
        .bind(master_id)
        .fetch_all(pool)
        .await
        .context("list_open_for_master failed")?;

    rows.iter().map(order_from_row).collect()
}

/// Persist the fields the assign transition touches (and nothing else).
pub async fn update_assignment(pool: &PgPool, order: &Order) -> Result<()> {
    sqlx::query(
        r#"
        update orders
        set status = $2,
            assigned_master = $3,
            dispatcher = $4,
            planned_at_utc = $5,
            completed_at_utc = $6
        where order_id = $1
        "#,
    )
    .bind(order.order_id)
    .bind(order.status.as_str())
    .bind(order.assigned_master)
    .bind(order.dispatcher)
    .bind(order.planned_at_utc)
    .bind(order.completed_at_utc)
    .execute(pool)
    .await
    .context("update_assignment failed")?;

    Ok(())
}

/// Persist a status-only change (the start transition).
pub async fn update_status(pool: &PgPool, order_id: Uuid, status: OrderStatus) -> Result<()> {
    sqlx::query("update orders set status = $2 where order_id = $1")
        .bind(order_id)
        .bind(status.as_str())
        .execute(pool)
        .await
        .context("update_status failed")?;

    Ok(())
}

/// Persist the fields the complete transition touches.
pub async fn update_completion(pool: &PgPool, order: &Order) -> Result<()> {
    sqlx::query(
        r#"
        update orders
        set status = $2,
            completed_at_utc = $3
        where order_id = $1
        "#,
    )
    .bind(order.order_id)
    .bind(order.status.as_str())
    .bind(order.completed_at_utc)
    .execute(pool)
    .await
    .context("update_completion failed")?;

    Ok(())
}

/// Persist the fields the cancel transition touches.
pub async fn update_cancellation(pool: &PgPool, order: &Order) -> Result<()> {
    sqlx::query(
        r#"
        update orders
        set status = $2,
            dispatcher = $3
        where order_id = $1
        "#,
    )
    .bind(order.order_id)
    .bind(order.status.as_str())
    .bind(order.dispatcher)
    .execute(pool)
    .await
    .context("update_cancellation failed")?;

    Ok(())
}

fn order_from_row(row: &PgRow) -> Result<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        order_id: row.try_get("order_id")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        address: row.try_get("address")?,
        customer_name: row.try_get("customer_name")?,
        customer_contact: row.try_get("customer_contact")?,
        status: OrderStatus::parse(&status)?,
        created_at_utc: row.try_get("created_at_utc")?,
        assigned_master: row.try_get("assigned_master")?,
        dispatcher: row.try_get("dispatcher")?,
        planned_at_utc: row.try_get("planned_at_utc")?,
        completed_at_utc: row.try_get("completed_at_utc")?,
    })
}

// ---------------------------------------------------------------------------
// Order history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewHistory {
    pub order_id: Uuid,
    pub changed_by: Option<Uuid>,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub comment: String,
}

/// Append one history row (append-only semantics: no update/delete exists).
/// ts_utc is assigned by the store.
pub async fn insert_history(pool: &PgPool, entry: &NewHistory) -> Result<()> {
    sqlx::query(
        r#"
        insert into order_history (
          history_id, order_id, changed_by, old_status, new_status, comment
        ) values (
          $1, $2, $3, $4, $5, $6
        )
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.order_id)
    .bind(entry.changed_by)
    .bind(entry.old_status.as_str())
    .bind(entry.new_status.as_str())
    .bind(&entry.comment)
    .execute(pool)
    .await
    .context("insert_history failed")?;

    Ok(())
}

/// Audit trail for one order, newest first.
pub async fn list_history(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderHistory>> {
    let rows = sqlx::query(
        r#"
        select history_id, order_id, changed_by, old_status, new_status, ts_utc, comment
        from order_history
        where order_id = $1
        order by ts_utc desc
        "#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
    .context("list_history failed")?;

    rows.iter().map(history_from_row).collect()
}

fn history_from_row(row: &PgRow) -> Result<OrderHistory> {
    let old_status: String = row.try_get("old_status")?;
    let new_status: String = row.try_get("new_status")?;
    Ok(OrderHistory {
        history_id: row.try_get("history_id")?,
        order_id: row.try_get("order_id")?,
        changed_by: row.try_get("changed_by")?,
        old_status: OrderStatus::parse(&old_status)?,
        new_status: OrderStatus::parse(&new_status)?,
        ts_utc: row.try_get("ts_utc")?,
        comment: row.try_get("comment")?,
    })
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Order counts grouped by status (dispatcher dashboard).
pub async fn count_by_status(pool: &PgPool) -> Result<Vec<(OrderStatus, i64)>> {
    let rows = sqlx::query(
        r#"
        select status, count(*)::bigint as n
        from orders
        group by status
        order by status
        "#,
    )
    .fetch_all(pool)
    .await
    .context("count_by_status failed")?;

    rows.iter()
        .map(|row| {
            let status: String = row.try_get("status")?;
            let n: i64 = row.try_get("n")?;
            Ok((OrderStatus::parse(&status)?, n))
        })
        .collect()
}
