mod common;

use common::InMemoryDb;
use roster_server::ingest::{AssignmentIngester, AssignmentIngesterError};
use roster_server::models::{Assignment, AssignmentCollection, AssignmentState};

fn ingester(db: &InMemoryDb) -> AssignmentIngester {
    let repos = db.repositories();
    AssignmentIngester::new(repos.users, repos.assignments)
}

#[tokio::test]
async fn test_resolves_usernames_and_inserts_once() {
    let db = InMemoryDb::new();
    let alice = db.add_user("alice");
    let bob = db.add_user("bob");
    let algebra = db.add_line_item("algebra");

    let collection: AssignmentCollection = vec![
        Assignment::pending("alice", algebra, AssignmentState::Ready),
        Assignment::pending("bob", algebra, AssignmentState::Started),
        Assignment::pending("alice", algebra, AssignmentState::Completed),
    ]
    .into_iter()
    .collect();

    let written = ingester(&db).ingest(collection).await.unwrap();

    assert_eq!(written, 3);
    assert_eq!(db.store().assignment_inserts, vec![3]);

    let alice_assignments = db.assignments_of(alice);
    assert_eq!(alice_assignments.len(), 2);
    assert_eq!(alice_assignments[0].state, AssignmentState::Ready);
    assert_eq!(alice_assignments[1].state, AssignmentState::Completed);
    assert_eq!(db.assignments_of(bob)[0].username, "bob");
}

#[tokio::test]
async fn test_unknown_user_aborts_the_whole_batch() {
    let db = InMemoryDb::new();
    db.add_user("alice");
    let algebra = db.add_line_item("algebra");

    let collection: AssignmentCollection = vec![
        Assignment::pending("alice", algebra, AssignmentState::Ready),
        Assignment::pending("ghost", algebra, AssignmentState::Ready),
    ]
    .into_iter()
    .collect();

    let err = ingester(&db).ingest(collection).await.unwrap_err();

    assert!(matches!(err, AssignmentIngesterError::UserNotFound(ref name) if name == "ghost"));
    assert_eq!(db.assignment_count(), 0);
    assert!(db.store().assignment_inserts.is_empty());
}

#[tokio::test]
async fn test_empty_collection_writes_nothing() {
    let db = InMemoryDb::new();

    let written = ingester(&db).ingest(AssignmentCollection::new()).await.unwrap();

    assert_eq!(written, 0);
    assert!(db.store().assignment_inserts.is_empty());
}

#[tokio::test]
async fn test_incomplete_lookup_record_is_invalid_data() {
    let db = InMemoryDb::new();
    db.add_user("alice");
    let algebra = db.add_line_item("algebra");
    db.store().corrupt_username_lookup = true;

    let mut collection = AssignmentCollection::new();
    collection.add(Assignment::pending("alice", algebra, AssignmentState::Ready));

    let err = ingester(&db).ingest(collection).await.unwrap_err();

    assert!(matches!(err, AssignmentIngesterError::InvalidData(_)));
    assert_eq!(db.assignment_count(), 0);
}

#[tokio::test]
async fn test_resolve_sets_user_ids_without_writing() {
    let db = InMemoryDb::new();
    let alice = db.add_user("alice");
    let algebra = db.add_line_item("algebra");

    let mut collection: AssignmentCollection = vec![
        Assignment::pending("alice", algebra, AssignmentState::Ready),
        Assignment::pending("alice", algebra, AssignmentState::Started),
    ]
    .into_iter()
    .collect();

    let users = ingester(&db).resolve(&mut collection).await.unwrap();

    assert_eq!(users, 1);
    assert!(collection.iter().all(|a| a.user_id == Some(alice)));
    assert!(db.store().assignment_inserts.is_empty());
}

#[tokio::test]
async fn test_resolve_reports_unknown_user() {
    let db = InMemoryDb::new();
    let algebra = db.add_line_item("algebra");

    let mut collection = AssignmentCollection::new();
    collection.add(Assignment::pending("ghost", algebra, AssignmentState::Ready));

    let err = ingester(&db).resolve(&mut collection).await.unwrap_err();

    assert!(matches!(err, AssignmentIngesterError::UserNotFound(ref name) if name == "ghost"));
    assert_eq!(db.assignment_count(), 0);
}
