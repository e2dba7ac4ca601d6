//! Shared fakes for integration tests
//!
//! `InMemoryDb` implements every repository trait over one mutex-guarded
//! store and records each multi-row insert, so tests can assert how many
//! statements a run issued.
#![allow(dead_code)]

use async_trait::async_trait;
use roster_server::db::{
    AssignmentRepository, LineItemRepository, Repositories, UserRepository, UsernameRecord,
};
use roster_server::models::{Assignment, AssignmentState, LineItem, NewLineItem, NewUser, User};
use roster_server::storage::ObjectStorage;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct Store {
    pub users: Vec<User>,
    pub line_items: Vec<LineItem>,
    pub assignments: Vec<Assignment>,
    next_id: i64,
    /// Row count of every assignment insert statement
    pub assignment_inserts: Vec<usize>,
    pub user_inserts: Vec<usize>,
    pub line_item_inserts: Vec<usize>,
    /// Users whose writes fail with a database error
    pub failing_users: HashSet<i64>,
    /// Return a record without id from `find_usernames`
    pub corrupt_username_lookup: bool,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDb {
    store: Arc<Mutex<Store>>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(self.clone()),
            line_items: Arc::new(self.clone()),
            assignments: Arc::new(self.clone()),
        }
    }

    pub fn add_user(&self, username: &str) -> i64 {
        let mut store = self.store();
        let id = store.next_id();
        store.users.push(User {
            id,
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            group_id: None,
        });
        id
    }

    pub fn add_line_item(&self, slug: &str) -> i64 {
        let mut store = self.store();
        let id = store.next_id();
        store.line_items.push(LineItem {
            id,
            slug: slug.to_string(),
            label: slug.to_uppercase(),
            uri: format!("https://tests.example.org/{}", slug),
        });
        id
    }

    pub fn add_assignment(&self, user_id: i64, line_item_id: i64, state: AssignmentState) -> i64 {
        let mut store = self.store();
        let id = store.next_id();
        let username = store
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap();
        store.assignments.push(Assignment {
            id: Some(id),
            state,
            line_item_id,
            username,
            user_id: Some(user_id),
        });
        id
    }

    pub fn fail_writes_for(&self, user_id: i64) {
        self.store().failing_users.insert(user_id);
    }

    pub fn assignments_of(&self, user_id: i64) -> Vec<Assignment> {
        self.store()
            .assignments
            .iter()
            .filter(|a| a.user_id == Some(user_id))
            .cloned()
            .collect()
    }

    pub fn assignment_count(&self) -> usize {
        self.store().assignments.len()
    }
}

fn injected_failure() -> sqlx::Error {
    sqlx::Error::Protocol("injected failure".to_string())
}

#[async_trait]
impl UserRepository for InMemoryDb {
    async fn find_usernames(&self, usernames: &[String]) -> sqlx::Result<Vec<UsernameRecord>> {
        let store = self.store();
        let mut records: Vec<UsernameRecord> = store
            .users
            .iter()
            .filter(|u| usernames.contains(&u.username))
            .map(|u| UsernameRecord::new(u.id, u.username.clone()))
            .collect();
        if store.corrupt_username_lookup {
            records.push(UsernameRecord {
                id: None,
                username: usernames.first().cloned(),
            });
        }
        Ok(records)
    }

    async fn find_by_username(&self, username: &str) -> sqlx::Result<Option<User>> {
        Ok(self.store().users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_multiple_natively(&self, users: &[NewUser]) -> sqlx::Result<u64> {
        let mut store = self.store();
        if users
            .iter()
            .any(|new| store.users.iter().any(|u| u.username == new.username))
        {
            return Err(injected_failure());
        }
        for new in users {
            let id = store.next_id();
            store.users.push(User {
                id,
                username: new.username.clone(),
                password_hash: new.password_hash.clone(),
                group_id: new.group_id.clone(),
            });
        }
        store.user_inserts.push(users.len());
        Ok(users.len() as u64)
    }
}

#[async_trait]
impl LineItemRepository for InMemoryDb {
    async fn find_by_slug(&self, slug: &str) -> sqlx::Result<Option<LineItem>> {
        Ok(self.store().line_items.iter().find(|l| l.slug == slug).cloned())
    }

    async fn find_by_slugs(&self, slugs: &[String]) -> sqlx::Result<Vec<LineItem>> {
        Ok(self
            .store()
            .line_items
            .iter()
            .filter(|l| slugs.contains(&l.slug))
            .cloned()
            .collect())
    }

    async fn insert_multiple_natively(&self, line_items: &[NewLineItem]) -> sqlx::Result<u64> {
        let mut store = self.store();
        for new in line_items {
            let id = store.next_id();
            store.line_items.push(LineItem {
                id,
                slug: new.slug.clone(),
                label: new.label.clone(),
                uri: new.uri.clone(),
            });
        }
        store.line_item_inserts.push(line_items.len());
        Ok(line_items.len() as u64)
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryDb {
    async fn insert_multiple_natively(&self, assignments: &[Assignment]) -> sqlx::Result<u64> {
        let mut store = self.store();
        // Same guarantees as the single INSERT statement: all rows or none
        let known: HashSet<i64> = store.users.iter().map(|u| u.id).collect();
        if assignments
            .iter()
            .any(|a| !a.is_resolved() || a.user_id.is_some_and(|id| !known.contains(&id)))
        {
            return Err(injected_failure());
        }
        for assignment in assignments {
            let id = store.next_id();
            let mut stored = assignment.clone();
            stored.id = Some(id);
            store.assignments.push(stored);
        }
        store.assignment_inserts.push(assignments.len());
        Ok(assignments.len() as u64)
    }

    async fn find_last_for_user(&self, user_id: i64) -> sqlx::Result<Option<Assignment>> {
        Ok(self
            .store()
            .assignments
            .iter()
            .filter(|a| a.user_id == Some(user_id))
            .max_by_key(|a| a.id)
            .cloned())
    }

    async fn reassign(&self, user_id: i64, line_item_id: i64) -> sqlx::Result<i64> {
        let mut store = self.store();
        if store.failing_users.contains(&user_id) {
            return Err(injected_failure());
        }
        let username = store
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .ok_or(sqlx::Error::RowNotFound)?;
        for assignment in store
            .assignments
            .iter_mut()
            .filter(|a| a.user_id == Some(user_id))
        {
            assignment.state = AssignmentState::Cancelled;
        }
        let id = store.next_id();
        store.assignments.push(Assignment {
            id: Some(id),
            state: AssignmentState::Ready,
            line_item_id,
            username,
            user_id: Some(user_id),
        });
        Ok(id)
    }

    async fn cancel_all_for_user(&self, user_id: i64) -> sqlx::Result<u64> {
        let mut store = self.store();
        if store.failing_users.contains(&user_id) {
            return Err(injected_failure());
        }
        let mut changed = 0;
        for assignment in store.assignments.iter_mut().filter(|a| {
            a.user_id == Some(user_id) && a.state != AssignmentState::Cancelled
        }) {
            assignment.state = AssignmentState::Cancelled;
            changed += 1;
        }
        Ok(changed)
    }
}

/// Object storage serving fixed bodies and recording every request
#[derive(Default)]
pub struct InMemoryObjectStorage {
    objects: HashMap<(String, String), Vec<u8>>,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl InMemoryObjectStorage {
    pub const BUCKET: &'static str = "roster-imports";

    pub fn with_object(mut self, bucket: &str, key: &str, body: &str) -> Self {
        self.objects
            .insert((bucket.to_string(), key.to_string()), body.as_bytes().to_vec());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    fn default_bucket(&self) -> &str {
        Self::BUCKET
    }

    async fn get_object(&self, bucket: &str, key: &str) -> anyhow::Result<Vec<u8>> {
        self.requests
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("NoSuchKey: {}", key))
    }
}

/// Object storage whose every request fails
pub struct FailingObjectStorage;

#[async_trait]
impl ObjectStorage for FailingObjectStorage {
    fn default_bucket(&self) -> &str {
        "unreachable"
    }

    async fn get_object(&self, _bucket: &str, _key: &str) -> anyhow::Result<Vec<u8>> {
        anyhow::bail!("connection refused")
    }
}

/// Write `contents` to a temporary CSV file
pub fn csv_file(contents: &str) -> tempfile::NamedTempFile {
    use std::io::Write;

    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
