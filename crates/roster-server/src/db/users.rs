//! User storage

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::models::{NewUser, User};

/// Raw `(id, username)` pair as returned by a username lookup.
///
/// Both columns are nullable at the query level; callers must treat a record
/// missing either field as corrupt data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameRecord {
    pub id: Option<i64>,
    pub username: Option<String>,
}

impl UsernameRecord {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            username: Some(username.into()),
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up the ids of the given usernames. Unknown names are simply absent.
    async fn find_usernames(&self, usernames: &[String]) -> sqlx::Result<Vec<UsernameRecord>>;

    async fn find_by_username(&self, username: &str) -> sqlx::Result<Option<User>>;

    /// Insert all users in a single statement. Returns the number of rows written.
    async fn insert_multiple_natively(&self, users: &[NewUser]) -> sqlx::Result<u64>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self, usernames), fields(count = usernames.len()))]
    async fn find_usernames(&self, usernames: &[String]) -> sqlx::Result<Vec<UsernameRecord>> {
        if usernames.is_empty() {
            return Ok(vec![]);
        }

        let rows = sqlx::query("SELECT id, username FROM users WHERE username = ANY($1)")
            .bind(usernames)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(UsernameRecord {
                    id: row.try_get("id")?,
                    username: row.try_get("username")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> sqlx::Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, group_id FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(User {
                id: row.try_get("id")?,
                username: row.try_get("username")?,
                password_hash: row.try_get("password_hash")?,
                group_id: row.try_get("group_id")?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self, users), fields(count = users.len()))]
    async fn insert_multiple_natively(&self, users: &[NewUser]) -> sqlx::Result<u64> {
        if users.is_empty() {
            return Ok(0);
        }

        let usernames: Vec<String> = users.iter().map(|u| u.username.clone()).collect();
        let hashes: Vec<String> = users.iter().map(|u| u.password_hash.clone()).collect();
        let groups: Vec<Option<String>> = users.iter().map(|u| u.group_id.clone()).collect();

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, group_id) \
             SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[])",
        )
        .bind(&usernames)
        .bind(&hashes)
        .bind(&groups)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
