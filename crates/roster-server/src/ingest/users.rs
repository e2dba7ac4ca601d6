//! User rows: `username`, `password` and an optional `groupId`

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use super::ingester::{optional, required, IngestError, RowIngester};
use super::password::hash_password;
use super::source::SourceRow;
use crate::db::UserRepository;
use crate::models::NewUser;

/// A validated user row; the password is hashed only when persisting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    pub group_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct UserContext {
    existing: HashSet<String>,
    seen: HashSet<String>,
}

pub struct UserRowIngester {
    users: Arc<dyn UserRepository>,
}

impl UserRowIngester {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl RowIngester for UserRowIngester {
    type Context = UserContext;
    type Record = UserRecord;

    fn type_name(&self) -> &'static str {
        "user"
    }

    async fn load_context(&self, rows: &[SourceRow]) -> Result<UserContext, IngestError> {
        let usernames: Vec<String> = rows
            .iter()
            .filter_map(|row| optional(row, "username"))
            .map(str::to_string)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let existing = self
            .users
            .find_usernames(&usernames)
            .await?
            .into_iter()
            .filter_map(|record| record.username)
            .collect();

        Ok(UserContext {
            existing,
            seen: HashSet::new(),
        })
    }

    fn parse_row(&self, context: &mut UserContext, row: &SourceRow) -> Result<UserRecord, String> {
        let username = required(row, "username")?;
        let password = required(row, "password")?;

        if context.existing.contains(username) {
            return Err(format!("user '{}' already exists", username));
        }
        if !context.seen.insert(username.to_string()) {
            return Err(format!("duplicate username '{}' in file", username));
        }

        Ok(UserRecord {
            username: username.to_string(),
            password: password.to_string(),
            group_id: optional(row, "groupId").map(str::to_string),
        })
    }

    async fn persist(&self, records: Vec<UserRecord>) -> Result<usize, IngestError> {
        let users = records
            .into_iter()
            .map(|record| -> Result<NewUser, IngestError> {
                Ok(NewUser {
                    password_hash: hash_password(&record.password)
                        .map_err(|e| IngestError::PasswordHash(e.to_string()))?,
                    username: record.username,
                    group_id: record.group_id,
                })
            })
            .collect::<Result<Vec<_>, IngestError>>()?;

        let written = self.users.insert_multiple_natively(&users).await?;
        Ok(written as usize)
    }
}
