//! Activity log repository.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use lucky_draw_core::{ActivityLogId, AdminId};

use super::RepositoryError;
use crate::models::activity::{ActivityAction, ActivityEntry};

/// Upper bound on rows returned by a single listing.
pub const MAX_LIST_LIMIT: i64 = 500;

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: i32,
    admin_id: Option<i32>,
    action: String,
    target_admin_id: Option<i32>,
    details: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityEntry {
    type Error = RepositoryError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        let action = row
            .action
            .parse::<ActivityAction>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: ActivityLogId::new(row.id),
            admin_id: row.admin_id.map(AdminId::new),
            action,
            target_admin_id: row.target_admin_id.map(AdminId::new),
            details: row.details.0,
            created_at: row.created_at,
        })
    }
}

/// Repository for the admin activity log.
pub struct ActivityLogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ActivityLogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append a row.
    ///
    /// Pass the transaction of the change being logged so the row commits
    /// with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record<'e, E: PgExecutor<'e>>(
        executor: E,
        actor: Option<AdminId>,
        action: ActivityAction,
        target: Option<AdminId>,
        details: serde_json::Value,
    ) -> Result<ActivityLogId, RepositoryError> {
        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO admin.admin_activity_log (admin_id, action, target_admin_id, details)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(actor.map(|a| a.as_i32()))
        .bind(action.as_str())
        .bind(target.map(|t| t.as_i32()))
        .bind(Json(details))
        .fetch_one(executor)
        .await?;

        Ok(ActivityLogId::new(id))
    }

    /// Most recent rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` on an unknown action.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ActivityEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r"
            SELECT id, admin_id, action, target_admin_id, details, created_at
            FROM admin.admin_activity_log
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(clamp_limit(limit))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Rows where the admin acted or was acted upon, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` on an unknown action.
    pub async fn list_for_admin(
        &self,
        admin_id: AdminId,
        limit: i64,
    ) -> Result<Vec<ActivityEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r"
            SELECT id, admin_id, action, target_admin_id, details, created_at
            FROM admin.admin_activity_log
            WHERE admin_id = $1 OR target_admin_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(admin_id.as_i32())
        .bind(clamp_limit(limit))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

const fn clamp_limit(limit: i64) -> i64 {
    if limit < 1 {
        1
    } else if limit > MAX_LIST_LIMIT {
        MAX_LIST_LIMIT
    } else {
        limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(-5), 1);
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(50), 50);
        assert_eq!(clamp_limit(10_000), MAX_LIST_LIMIT);
    }
}
