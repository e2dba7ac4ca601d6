//! Assignment storage

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::instrument;

use crate::models::{Assignment, AssignmentState};

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Insert every assignment in one statement.
    ///
    /// All assignments must carry a resolved `user_id`; the statement either
    /// writes every row or none.
    async fn insert_multiple_natively(&self, assignments: &[Assignment]) -> sqlx::Result<u64>;

    /// The most recently created assignment of a user, whatever its state
    async fn find_last_for_user(&self, user_id: i64) -> sqlx::Result<Option<Assignment>>;

    /// Cancel the user's open assignments and create a fresh `ready` one on
    /// `line_item_id`, in one transaction. Returns the new assignment id.
    async fn reassign(&self, user_id: i64, line_item_id: i64) -> sqlx::Result<i64>;

    /// Cancel every assignment of the user. Returns the number of rows changed.
    async fn cancel_all_for_user(&self, user_id: i64) -> sqlx::Result<u64>;
}

pub struct PgAssignmentRepository {
    pool: PgPool,
}

impl PgAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn assignment_from_row(row: &PgRow) -> sqlx::Result<Assignment> {
    let state: String = row.try_get("state")?;
    let state = state
        .parse::<AssignmentState>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Assignment {
        id: Some(row.try_get("id")?),
        state,
        line_item_id: row.try_get("line_item_id")?,
        username: row.try_get("username")?,
        user_id: Some(row.try_get("user_id")?),
    })
}

#[async_trait]
impl AssignmentRepository for PgAssignmentRepository {
    #[instrument(skip(self, assignments), fields(count = assignments.len()))]
    async fn insert_multiple_natively(&self, assignments: &[Assignment]) -> sqlx::Result<u64> {
        if assignments.is_empty() {
            return Ok(0);
        }

        if let Some(unresolved) = assignments.iter().find(|a| !a.is_resolved()) {
            return Err(sqlx::Error::Protocol(format!(
                "assignment for '{}' has no resolved user id",
                unresolved.username
            )));
        }

        let user_ids: Vec<i64> = assignments.iter().filter_map(|a| a.user_id).collect();
        let line_item_ids: Vec<i64> = assignments.iter().map(|a| a.line_item_id).collect();
        let states: Vec<String> = assignments
            .iter()
            .map(|a| a.state.as_str().to_string())
            .collect();

        let result = sqlx::query(
            "INSERT INTO assignments (user_id, line_item_id, state) \
             SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::text[])",
        )
        .bind(&user_ids)
        .bind(&line_item_ids)
        .bind(&states)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn find_last_for_user(&self, user_id: i64) -> sqlx::Result<Option<Assignment>> {
        sqlx::query(
            "SELECT a.id, a.state, a.line_item_id, a.user_id, u.username \
             FROM assignments a \
             JOIN users u ON u.id = a.user_id \
             WHERE a.user_id = $1 \
             ORDER BY a.created_at DESC, a.id DESC \
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(assignment_from_row)
        .transpose()
    }

    #[instrument(skip(self))]
    async fn reassign(&self, user_id: i64, line_item_id: i64) -> sqlx::Result<i64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE assignments SET state = $1 WHERE user_id = $2 AND state <> $1")
            .bind(AssignmentState::Cancelled.as_str())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO assignments (user_id, line_item_id, state) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(user_id)
        .bind(line_item_id)
        .bind(AssignmentState::Ready.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(id)
    }

    #[instrument(skip(self))]
    async fn cancel_all_for_user(&self, user_id: i64) -> sqlx::Result<u64> {
        let result =
            sqlx::query("UPDATE assignments SET state = $1 WHERE user_id = $2 AND state <> $1")
                .bind(AssignmentState::Cancelled.as_str())
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
