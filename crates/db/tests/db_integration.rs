//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p engage-db --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `engage_test`)
//!   `TEST_DB_PASSWORD` (default: `engage_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use engage_common::AppError;
use engage_db::entities::note;
use engage_db::repositories::{
    FollowingRepository, NoteFavoriteRepository, NoteHistoryRepository, NoteRepository,
    ReactionRepository, ReactionToggle,
};
use engage_db::test_utils::TestDatabase;
use futures::future::join_all;
use sea_orm::{DatabaseConnection, Set};
use serde_json::json;

async fn create_note(db: &Arc<DatabaseConnection>, user_id: i64) -> note::Model {
    NoteRepository::new(db.clone())
        .create(note::ActiveModel {
            user_id: Set(user_id),
            content: Set("hello".to_string()),
            is_private: Set(false),
            favorite_count: Set(0),
            reaction_counts: Set(json!({})),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_favorite_add_is_idempotent() {
    let test_db = TestDatabase::create_unique().await.expect("Failed to create database");
    let db = test_db.shared();
    let note = create_note(&db, 1).await;
    let favorites = NoteFavoriteRepository::new(db.clone());

    assert!(favorites.add(2, note.id).await.unwrap());
    assert!(!favorites.add(2, note.id).await.unwrap());

    let stored = NoteRepository::new(db.clone()).get_by_id(note.id).await.unwrap();
    assert_eq!(stored.favorite_count, 1);
    assert_eq!(favorites.count_by_note(note.id).await.unwrap(), 1);

    assert!(favorites.remove(2, note.id).await.unwrap());
    assert!(!favorites.remove(2, note.id).await.unwrap());
    let stored = NoteRepository::new(db).get_by_id(note.id).await.unwrap();
    assert_eq!(stored.favorite_count, 0);

    test_db.teardown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_favorite_on_missing_note_is_not_found() {
    let test_db = TestDatabase::create_unique().await.expect("Failed to create database");
    let favorites = NoteFavoriteRepository::new(test_db.shared());

    let err = favorites.add(2, 424_242).await.unwrap_err();
    assert!(matches!(err, AppError::NoteNotFound(424_242)));

    test_db.teardown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_reactions_do_not_lose_updates() {
    const USERS: i64 = 40;

    let test_db = TestDatabase::create_unique().await.expect("Failed to create database");
    let db = test_db.shared();
    let note = create_note(&db, 1).await;
    let reactions = ReactionRepository::new(db.clone());
    let note_id = note.id;

    let adds = (1..=USERS).map(|user| {
        let reactions = reactions.clone();
        let emoji = if user % 2 == 0 { "🔥" } else { "👍" };
        tokio::spawn(async move { reactions.toggle(user, note_id, emoji).await })
    });
    for result in join_all(adds).await {
        assert_eq!(result.unwrap().unwrap(), ReactionToggle::Added);
    }

    let stored = NoteRepository::new(db.clone()).get_by_id(note.id).await.unwrap();
    assert_eq!(stored.reaction_counts, json!({ "🔥": 20, "👍": 20 }));
    assert_eq!(stored.updated_at, None);

    let edges = reactions.count_by_note(note.id).await.unwrap();
    let tally: BTreeMap<String, i64> = serde_json::from_value(stored.reaction_counts).unwrap();
    assert_eq!(edges, tally);

    let removals = (1..=USERS).map(|user| {
        let reactions = reactions.clone();
        let emoji = if user % 2 == 0 { "🔥" } else { "👍" };
        tokio::spawn(async move { reactions.toggle(user, note_id, emoji).await })
    });
    for result in join_all(removals).await {
        assert_eq!(result.unwrap().unwrap(), ReactionToggle::Removed);
    }

    let stored = NoteRepository::new(db).get_by_id(note.id).await.unwrap();
    assert_eq!(stored.reaction_counts, json!({}));

    test_db.teardown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_reaction_switch_moves_count() {
    let test_db = TestDatabase::create_unique().await.expect("Failed to create database");
    let db = test_db.shared();
    let note = create_note(&db, 1).await;
    let reactions = ReactionRepository::new(db.clone());

    reactions.toggle(2, note.id, "👍").await.unwrap();
    reactions.toggle(3, note.id, "👍").await.unwrap();
    let outcome = reactions.toggle(2, note.id, "🔥").await.unwrap();
    assert_eq!(
        outcome,
        ReactionToggle::Switched {
            previous: "👍".to_string()
        }
    );

    let stored = NoteRepository::new(db).get_by_id(note.id).await.unwrap();
    assert_eq!(stored.reaction_counts, json!({ "👍": 1, "🔥": 1 }));

    test_db.teardown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_history_upsert_converges() {
    let test_db = TestDatabase::create_unique().await.expect("Failed to create database");
    let db = test_db.shared();
    let note = create_note(&db, 1).await;
    let history = NoteHistoryRepository::new(db);

    let first = Utc::now() - Duration::minutes(5);
    let last = Utc::now();
    history.upsert(7, note.id, first).await.unwrap();
    history.upsert(7, note.id, last).await.unwrap();
    history.upsert(7, note.id, last).await.unwrap();

    let entries = history.find_recent(7, 10).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].viewed_at.timestamp(), last.timestamp());

    test_db.teardown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_follower_pages_cover_every_follower() {
    let test_db = TestDatabase::create_unique().await.expect("Failed to create database");
    let following = FollowingRepository::new(test_db.shared());

    for follower in 100..125 {
        assert!(following.follow(follower, 1).await.unwrap());
    }
    following.follow(200, 2).await.unwrap();

    let mut seen = Vec::new();
    let mut after = None;
    loop {
        let page = following.find_follower_ids(1, after, 10).await.unwrap();
        if page.is_empty() {
            break;
        }
        after = page.last().copied();
        seen.extend(page);
    }

    assert_eq!(seen, (100..125).collect::<Vec<_>>());
    assert_eq!(following.count_followers(1).await.unwrap(), 25);

    test_db.teardown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_unfollowed_user_leaves_fan_out_pages() {
    let test_db = TestDatabase::create_unique().await.expect("Failed to create database");
    let following = FollowingRepository::new(test_db.shared());

    for follower in [10, 11, 12] {
        following.follow(follower, 1).await.unwrap();
    }

    assert!(following.unfollow(11, 1).await.unwrap());
    assert!(!following.unfollow(11, 1).await.unwrap());

    let page = following.find_follower_ids(1, None, 100).await.unwrap();
    assert_eq!(page, vec![10, 12]);
    assert_eq!(following.count_followers(1).await.unwrap(), 2);

    test_db.teardown().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_following_timeline_fallback_skips_private_notes() {
    let test_db = TestDatabase::create_unique().await.expect("Failed to create database");
    let db = test_db.shared();
    let following = FollowingRepository::new(db.clone());
    let notes = NoteRepository::new(db.clone());

    following.follow(10, 1).await.unwrap();
    let visible = create_note(&db, 1).await;
    notes
        .create(note::ActiveModel {
            user_id: Set(1),
            content: Set("secret".to_string()),
            is_private: Set(true),
            favorite_count: Set(0),
            reaction_counts: Set(json!({})),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await
        .unwrap();
    create_note(&db, 3).await;

    let timeline = notes.find_following_timeline(10, 0, 20).await.unwrap();
    let ids: Vec<i64> = timeline.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![visible.id]);

    test_db.teardown().await.unwrap();
}
