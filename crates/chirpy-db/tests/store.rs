use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;
use std::thread;

use chirpy_crypto::verify_password;
use chirpy_db::{Database, RecordKind, SortOrder, StoreError};
use tempfile::TempDir;

fn open_temp() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("database.json")).unwrap();
    (dir, db)
}

#[test]
fn user_ids_follow_creation_order() {
    let (_dir, db) = open_temp();

    for (i, email) in ["a@x.com", "b@x.com", "c@x.com"].iter().enumerate() {
        let user = db.create_user(email, "pw").unwrap();
        assert_eq!(user.id, i as u64 + 1);
        assert!(!user.is_chirpy_red);
    }
}

#[test]
fn duplicate_email_is_rejected_without_mutation() {
    let (dir, db) = open_temp();
    db.create_user("a@x.com", "pw1").unwrap();
    let before = fs::read_to_string(dir.path().join("database.json")).unwrap();

    let err = db.create_user("a@x.com", "pw2").unwrap_err();
    assert!(matches!(err, StoreError::DuplicateEmail));

    assert_eq!(db.list_users().unwrap().len(), 1);
    let after = fs::read_to_string(dir.path().join("database.json")).unwrap();
    assert_eq!(before, after);

    // Matching is case-sensitive.
    assert_eq!(db.create_user("A@x.com", "pw").unwrap().id, 2);
}

#[test]
fn stored_credential_is_a_verifiable_hash() {
    let (_dir, db) = open_temp();
    let created = db.create_user("a@x.com", "pw1").unwrap();

    let user = db.get_user(created.id).unwrap();
    assert_eq!(user.email, "a@x.com");
    assert_ne!(user.password_hash, "pw1");
    assert!(verify_password("pw1", &user.password_hash));
    assert!(!verify_password("pw2", &user.password_hash));
}

#[test]
fn update_user_rehashes_and_checks_email() {
    let (_dir, db) = open_temp();
    let a = db.create_user("a@x.com", "pw1").unwrap();
    db.create_user("b@x.com", "pw2").unwrap();

    let updated = db.update_user(a.id, "a2@x.com", "pw1").unwrap();
    assert_eq!(updated.email, "a2@x.com");
    assert_ne!(updated.password_hash, a.password_hash);
    assert!(verify_password("pw1", &updated.password_hash));

    // Keeping one's own email is fine, taking another user's is not.
    assert!(db.update_user(a.id, "a2@x.com", "pw3").is_ok());
    assert!(matches!(
        db.update_user(a.id, "b@x.com", "pw3"),
        Err(StoreError::DuplicateEmail)
    ));

    assert!(matches!(
        db.update_user(99, "z@x.com", "pw"),
        Err(StoreError::NotFound { kind: RecordKind::User, id: 99 })
    ));
    // A missing user is reported as such even when the email is taken.
    assert!(matches!(
        db.update_user(99, "b@x.com", "pw"),
        Err(StoreError::NotFound { kind: RecordKind::User, id: 99 })
    ));
}

#[test]
fn upgrade_is_idempotent() {
    let (_dir, db) = open_temp();
    let user = db.create_user("a@x.com", "pw").unwrap();

    db.upgrade_user(user.id).unwrap();
    db.upgrade_user(user.id).unwrap();
    assert!(db.get_user(user.id).unwrap().is_chirpy_red);

    assert!(matches!(
        db.upgrade_user(7),
        Err(StoreError::NotFound { kind: RecordKind::User, .. })
    ));
}

#[test]
fn find_user_by_email_is_exact() {
    let (_dir, db) = open_temp();
    db.create_user("a@x.com", "pw").unwrap();

    assert_eq!(db.find_user_by_email("a@x.com").unwrap().unwrap().id, 1);
    assert!(db.find_user_by_email("A@X.COM").unwrap().is_none());
}

#[test]
fn chirp_length_is_checked_before_filtering() {
    let (_dir, db) = open_temp();

    let at_limit = "a".repeat(140);
    assert_eq!(db.create_chirp(&at_limit, 1).unwrap().body, at_limit);

    // Would fit after censoring, but the raw body is over the limit.
    let over = format!("{} kerfuffle", "a".repeat(131));
    assert_eq!(over.chars().count(), 141);
    assert!(matches!(
        db.create_chirp(&over, 1),
        Err(StoreError::TooLong { len: 141 })
    ));

    assert_eq!(db.list_chirps(SortOrder::Asc).unwrap().len(), 1);
}

#[test]
fn chirp_ids_are_max_plus_one() {
    let (_dir, db) = open_temp();
    for _ in 0..3 {
        db.create_chirp("hi", 1).unwrap();
    }

    db.delete_chirp(2).unwrap();
    assert_eq!(db.create_chirp("again", 1).unwrap().id, 4);

    db.delete_chirp(4).unwrap();
    assert_eq!(db.create_chirp("reuse", 1).unwrap().id, 4);
}

#[test]
fn chirps_by_unknown_author_are_accepted() {
    let (_dir, db) = open_temp();
    let chirp = db.create_chirp("nobody wrote this", 42).unwrap();
    assert_eq!(chirp.author_id, 42);
}

#[test]
fn list_orders_are_reverses() {
    let (_dir, db) = open_temp();
    db.create_chirp("one", 1).unwrap();
    db.create_chirp("two", 2).unwrap();
    db.create_chirp("three", 1).unwrap();

    let asc = db.list_chirps(SortOrder::Asc).unwrap();
    let mut desc = db.list_chirps(SortOrder::Desc).unwrap();
    assert_eq!(asc.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    desc.reverse();
    assert_eq!(asc, desc);

    let by_one = db.list_chirps_by_author(1, SortOrder::Desc).unwrap();
    assert_eq!(by_one.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 1]);
    assert!(db.list_chirps_by_author(9, SortOrder::Asc).unwrap().is_empty());
}

#[test]
fn delete_missing_chirp_is_not_found() {
    let (_dir, db) = open_temp();
    assert!(matches!(
        db.delete_chirp(1),
        Err(StoreError::NotFound { kind: RecordKind::Chirp, id: 1 })
    ));
}

#[test]
fn failed_write_leaves_state_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store_dir = dir.path().join("store");
    let db = Database::open(&store_dir.join("database.json")).unwrap();
    db.create_chirp("first", 1).unwrap();

    fs::remove_dir_all(&store_dir).unwrap();

    assert!(matches!(db.create_chirp("second", 1), Err(StoreError::Io(_))));
    assert!(matches!(db.create_user("a@x.com", "pw"), Err(StoreError::Io(_))));
    assert_eq!(db.list_chirps(SortOrder::Asc).unwrap().len(), 1);
    assert!(db.list_users().unwrap().is_empty());

    // Once the directory is back the next id picks up where memory left off.
    fs::create_dir_all(&store_dir).unwrap();
    assert_eq!(db.create_chirp("second", 1).unwrap().id, 2);
    assert_eq!(db.list_chirps(SortOrder::Asc).unwrap().len(), 2);
}

#[test]
fn revocation_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.json");

    {
        let db = Database::open(&path).unwrap();
        assert!(db.is_refresh_token_valid("tok-a").unwrap());
        db.revoke_refresh_token("tok-a").unwrap();
        db.revoke_refresh_token("tok-a").unwrap();
        assert!(!db.is_refresh_token_valid("tok-a").unwrap());
        db.close().unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert!(!db.is_refresh_token_valid("tok-a").unwrap());
    assert!(db.is_refresh_token_valid("tok-b").unwrap());
}

#[test]
fn state_round_trips_through_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("database.json");

    let db = Database::open(&path).unwrap();
    db.create_user("a@x.com", "pw").unwrap();
    db.upgrade_user(1).unwrap();
    db.create_chirp("hello fornax", 1).unwrap();
    db.close().unwrap();

    let db = Database::open(&path).unwrap();
    let user = db.get_user(1).unwrap();
    assert!(user.is_chirpy_red);
    assert_eq!(db.get_chirp(1).unwrap().body, "hello ****");
    assert_eq!(db.create_user("b@x.com", "pw").unwrap().id, 2);
}

#[test]
fn file_layout_is_stable() {
    let (dir, db) = open_temp();
    db.create_chirp("b", 1).unwrap();
    db.revoke_refresh_token("zzz").unwrap();
    db.revoke_refresh_token("aaa").unwrap();

    let raw = fs::read_to_string(dir.path().join("database.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["chirps"]["1"]["body"], "b");
    assert_eq!(value["revoked_refresh_tokens"], serde_json::json!(["aaa", "zzz"]));
    assert!(value["users"].as_object().unwrap().is_empty());

    let users_at = raw.find("\"users\"").unwrap();
    let chirps_at = raw.find("\"chirps\"").unwrap();
    let revoked_at = raw.find("\"revoked_refresh_tokens\"").unwrap();
    assert!(users_at < chirps_at && chirps_at < revoked_at);
}

#[test]
fn truncated_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.json");

    let db = Database::open(&path).unwrap();
    db.create_user("a@x.com", "pw").unwrap();
    db.close().unwrap();

    // A crash between truncate and write leaves a zero-length file.
    fs::write(&path, b"").unwrap();

    let db = Database::open(&path).unwrap();
    assert!(db.list_users().unwrap().is_empty());
    assert_eq!(db.create_user("a@x.com", "pw").unwrap().id, 1);
}

#[test]
fn corrupt_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.json");
    fs::write(&path, b"{ not json").unwrap();

    assert!(matches!(Database::open(&path), Err(StoreError::Serde(_))));
}

#[test]
fn scenario_create_censor_and_delete() {
    let (_dir, db) = open_temp();

    let user = db.create_user("a@x.com", "pw1").unwrap();
    assert_eq!(user.id, 1);

    let chirp = db.create_chirp("this is a kerfuffle", user.id).unwrap();
    assert_eq!(chirp.id, 1);
    assert_eq!(chirp.body, "this is a ****");

    db.delete_chirp(1).unwrap();
    assert!(matches!(
        db.get_chirp(1),
        Err(StoreError::NotFound { kind: RecordKind::Chirp, id: 1 })
    ));
}

#[test]
fn concurrent_writers_get_unique_ids() {
    let (dir, db) = open_temp();
    let db = Arc::new(db);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let db = db.clone();
            thread::spawn(move || {
                (0..3)
                    .map(|i| {
                        let user = db.create_user(&format!("u{t}-{i}@x.com"), "pw").unwrap();
                        let chirp = db.create_chirp("hi", user.id).unwrap();
                        // Readers run alongside the writers.
                        assert!(db.get_chirp(chirp.id).is_ok());
                        (user.id, chirp.id)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut user_ids = BTreeSet::new();
    let mut chirp_ids = BTreeSet::new();
    for handle in handles {
        for (user_id, chirp_id) in handle.join().unwrap() {
            user_ids.insert(user_id);
            chirp_ids.insert(chirp_id);
        }
    }

    let expected: BTreeSet<u64> = (1..=12).collect();
    assert_eq!(user_ids, expected);
    assert_eq!(chirp_ids, expected);

    let reloaded = Database::open(&dir.path().join("database.json")).unwrap();
    assert_eq!(reloaded.list_users().unwrap().len(), 12);
    assert_eq!(reloaded.list_chirps(SortOrder::Asc).unwrap().len(), 12);
}
