//! Tests for the SQLite and in-memory match stores.

use tempfile::NamedTempFile;

use strictly_matches::{
    Actor, InMemoryMatchStore, Match, MatchId, MatchStore, Phase, SqliteMatchStore,
};

/// Creates a temporary database file and opens a store on it. The file
/// handle must stay in scope to keep the file alive.
fn setup_test_db() -> (NamedTempFile, SqliteMatchStore) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let store = SqliteMatchStore::open(&db_path).expect("Failed to open store");
    (db_file, store)
}

fn human_match(id: &str) -> Match {
    let mut record = Match::new(MatchId::from(id), "Ana".to_string(), false);
    record.seat_opponent("Bo").expect("Seat failed");
    record
}

#[test]
fn test_sqlite_round_trip() {
    let (_db, store) = setup_test_db();
    let mut record = human_match("m-1");
    record
        .apply_move(Actor::Participant("Ana"), 4)
        .expect("Move failed");

    store.put(record.match_id(), &record).expect("Put failed");
    let loaded = store.get(record.match_id()).expect("Get failed");

    assert_eq!(loaded, Some(record));
}

#[test]
fn test_sqlite_automated_match_round_trip() {
    let (_db, store) = setup_test_db();
    let record = Match::new(MatchId::from("m-ai"), "Ana".to_string(), true);

    store.put(record.match_id(), &record).expect("Put failed");
    let loaded = store
        .get(record.match_id())
        .expect("Get failed")
        .expect("Record missing");

    assert_eq!(loaded, record);
    assert!(!loaded.awaits_automated_move());
}

#[test]
fn test_sqlite_get_unknown_returns_none() {
    let (_db, store) = setup_test_db();
    let loaded = store.get(&MatchId::from("missing")).expect("Get failed");
    assert_eq!(loaded, None);
}

#[test]
fn test_sqlite_put_replaces_existing_record() {
    let (_db, store) = setup_test_db();
    let mut record = human_match("m-1");
    store.put(record.match_id(), &record).expect("Put failed");

    record
        .apply_move(Actor::Participant("Ana"), 0)
        .expect("Move failed");
    store.put(record.match_id(), &record).expect("Put failed");

    let loaded = store
        .get(record.match_id())
        .expect("Get failed")
        .expect("Record missing");
    assert_eq!(loaded.version(), record.version());
    assert_eq!(loaded.board().occupied(), 1);
}

#[test]
fn test_sqlite_rejects_mismatched_key() {
    let (_db, store) = setup_test_db();
    let record = human_match("m-1");
    let result = store.put(&MatchId::from("m-2"), &record);
    assert!(result.is_err());
}

#[test]
fn test_sqlite_list_in_phase() {
    let (_db, store) = setup_test_db();
    let open = Match::new(MatchId::from("m-open"), "Ana".to_string(), false);
    let active = human_match("m-active");
    store.put(open.match_id(), &open).expect("Put failed");
    store.put(active.match_id(), &active).expect("Put failed");

    let awaiting = store
        .list_in_phase(Phase::AwaitingOpponent)
        .expect("List failed");
    assert_eq!(awaiting, vec![MatchId::from("m-open")]);

    let playing = store.list_in_phase(Phase::Active).expect("List failed");
    assert_eq!(playing, vec![MatchId::from("m-active")]);

    let finished = store.list_in_phase(Phase::Concluded).expect("List failed");
    assert!(finished.is_empty());
}

#[test]
fn test_sqlite_survives_reopen() {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let record = human_match("m-1");

    {
        let store = SqliteMatchStore::open(&db_path).expect("Failed to open store");
        store.put(record.match_id(), &record).expect("Put failed");
    }

    let reopened = SqliteMatchStore::open(&db_path).expect("Failed to reopen store");
    let loaded = reopened.get(record.match_id()).expect("Get failed");
    assert_eq!(loaded, Some(record));
}

#[test]
fn test_memory_store_matches_sqlite_behavior() {
    let store = InMemoryMatchStore::new();
    let open = Match::new(MatchId::from("m-open"), "Ana".to_string(), false);
    store.put(open.match_id(), &open).expect("Put failed");

    assert_eq!(
        store.get(open.match_id()).expect("Get failed"),
        Some(open.clone())
    );
    assert_eq!(
        store
            .list_in_phase(Phase::AwaitingOpponent)
            .expect("List failed"),
        vec![open.match_id().clone()]
    );
    assert_eq!(store.get(&MatchId::from("missing")).expect("Get failed"), None);
}
