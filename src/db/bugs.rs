//! Bug store queries.
//!
//! Every query is scoped to one project namespace and constrained by a
//! `BugFilter` rendered to SQL.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::bug::{BugRecord, BugRow};
use crate::services::query_builder::BugFilter;

const BUG_COLUMNS: &str = "namespace, id, title, status, importance, milestone, tags, assignee, web_link, \
     created_at, fixed_at, created_within_week, fixed_within_week, created_within_month, fixed_within_month";

/// Fetch every bug of a namespace matching the filter, ordered by bug id.
///
/// A row with a malformed tags column fails the whole query.
pub async fn find_bugs(
    pool: &DbPool,
    namespace: &str,
    filter: &BugFilter,
) -> Result<Vec<BugRecord>, AppError> {
    let sql = filter.to_sql();
    let query = format!(
        "SELECT {} FROM bugs WHERE namespace = ? AND {} ORDER BY id",
        BUG_COLUMNS, sql.condition
    );
    log::debug!("find_bugs[{}]: {} {:?}", namespace, sql.condition, sql.binds);

    let mut q = sqlx::query_as::<_, BugRow>(&query).bind(namespace);
    for value in &sql.binds {
        q = q.bind(value);
    }

    let rows = q
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "find_bugs"))?;

    rows.into_iter().map(BugRecord::try_from).collect()
}

/// Count the bugs of a namespace matching the filter.
pub async fn count_bugs(
    pool: &DbPool,
    namespace: &str,
    filter: &BugFilter,
) -> Result<i64, AppError> {
    let sql = filter.to_sql();
    let query = format!(
        "SELECT COUNT(*) FROM bugs WHERE namespace = ? AND {}",
        sql.condition
    );
    log::debug!("count_bugs[{}]: {} {:?}", namespace, sql.condition, sql.binds);

    let mut q = sqlx::query_scalar::<_, i64>(&query).bind(namespace);
    for value in &sql.binds {
        q = q.bind(value);
    }

    q.fetch_one(pool)
        .await
        .map_err(|e| AppError::database_with_op(e.to_string(), "count_bugs"))
}

/// Insert or replace a bug snapshot in a namespace.
pub async fn upsert_bug(pool: &DbPool, namespace: &str, bug: &BugRecord) -> Result<(), AppError> {
    let tags = serde_json::to_string(&bug.tags)?;

    sqlx::query(
        r#"
        INSERT INTO bugs (
            namespace, id, title, status, importance, milestone, tags, assignee, web_link,
            created_at, fixed_at, created_within_week, fixed_within_week, created_within_month, fixed_within_month
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(namespace, id) DO UPDATE SET
            title = excluded.title,
            status = excluded.status,
            importance = excluded.importance,
            milestone = excluded.milestone,
            tags = excluded.tags,
            assignee = excluded.assignee,
            web_link = excluded.web_link,
            created_at = excluded.created_at,
            fixed_at = excluded.fixed_at,
            created_within_week = excluded.created_within_week,
            fixed_within_week = excluded.fixed_within_week,
            created_within_month = excluded.created_within_month,
            fixed_within_month = excluded.fixed_within_month
        "#,
    )
    .bind(namespace)
    .bind(bug.id)
    .bind(&bug.title)
    .bind(&bug.status)
    .bind(&bug.importance)
    .bind(&bug.milestone)
    .bind(&tags)
    .bind(&bug.assignee)
    .bind(&bug.web_link)
    .bind(bug.created_at)
    .bind(bug.fixed_at)
    .bind(bug.recency.created_within_week)
    .bind(bug.recency.fixed_within_week)
    .bind(bug.recency.created_within_month)
    .bind(bug.recency.fixed_within_month)
    .execute(pool)
    .await?;

    Ok(())
}

/// Namespaces that hold at least one bug.
pub async fn list_namespaces(pool: &DbPool) -> Result<Vec<String>, AppError> {
    let names: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT namespace FROM bugs ORDER BY namespace")
            .fetch_all(pool)
            .await?;
    Ok(names)
}
