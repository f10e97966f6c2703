//! Store integration tests against a real `PostgreSQL`.
//!
//! Run with:
//! ```bash
//! docker-compose -f docker-compose.test.yml up -d test-db
//! cargo test -p social-db --features postgres-tests --test store_integration
//! ```
//!
//! Environment variables: `TEST_DB_HOST`, `TEST_DB_PORT`, `TEST_DB_USER`,
//! `TEST_DB_PASSWORD`, `TEST_DB_NAME` (see `TestDbConfig`).

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![cfg(feature = "postgres-tests")]

use std::collections::HashSet;

use social_common::AppError;
use social_db::repositories::{
    FeedPredicate, FeedRepository, FollowerRepository, NewPost, PostRepository, SortDirection,
};
use social_db::test_utils::TestDatabase;

async fn post(repo: &PostRepository, user_id: i64, title: &str, tags: &[&str]) -> i64 {
    repo.create(NewPost {
        user_id,
        title: title.to_string(),
        content: format!("{title} body"),
        tags: tags.iter().map(ToString::to_string).collect(),
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn test_follow_twice_is_conflict_with_single_edge() {
    let db = TestDatabase::create_unique().await.expect("test database");
    let a = db.insert_user("alice").await.unwrap();
    let viewer = db.insert_user("viewer").await.unwrap();
    let repo = FollowerRepository::new(db.connection());

    repo.follow(a, viewer).await.unwrap();
    let second = repo.follow(a, viewer).await;

    assert!(matches!(second, Err(AppError::Conflict(_))));
    assert_eq!(repo.count_followers(a).await.unwrap(), 1);

    repo.unfollow(a, viewer).await.unwrap();
    repo.unfollow(a, viewer).await.unwrap();
    assert!(!repo.is_following(a, viewer).await.unwrap());

    db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_updates_exactly_one_wins() {
    let db = TestDatabase::create_unique().await.expect("test database");
    let author = db.insert_user("author").await.unwrap();
    let repo = PostRepository::new(db.connection());
    let id = post(&repo, author, "Draft", &[]).await;

    let original = repo.get_by_id(id).await.unwrap();
    let mut first = original.clone();
    first.title = "First".to_string();
    let mut second = original.clone();
    second.title = "Second".to_string();

    let (a, b) = tokio::join!(repo.update(&first), repo.update(&second));
    let outcomes = [a, b];

    let winners: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].version, 2);
    assert!(outcomes.iter().any(|r| matches!(
        r,
        Err(AppError::VersionConflict { expected: 1, .. })
    )));

    let stored = repo.get_by_id(id).await.unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.title, winners[0].title);

    db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_feed_example_and_pagination() {
    let db = TestDatabase::create_unique().await.expect("test database");
    let a = db.insert_user("artist_a").await.unwrap();
    let b = db.insert_user("artist_b").await.unwrap();
    let stranger = db.insert_user("stranger").await.unwrap();
    let viewer = db.insert_user("viewer").await.unwrap();

    let followers = FollowerRepository::new(db.connection());
    followers.follow(a, viewer).await.unwrap();
    followers.follow(b, viewer).await.unwrap();

    let posts = PostRepository::new(db.connection());
    for title in ["a1", "a2", "a3"] {
        post(&posts, a, title, &["music"]).await;
    }
    post(&posts, b, "b1", &["music", "live"]).await;
    post(&posts, b, "b2", &["food"]).await;
    post(&posts, stranger, "s1", &["music"]).await;

    let feed = FeedRepository::new(db.connection());
    let music = [
        FeedPredicate::FollowedBy(viewer),
        FeedPredicate::HasAllTags(vec!["music".to_string()]),
    ];

    let page = feed.fetch(&music, SortDirection::Desc, 2, 0).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].title, "b1");
    assert_eq!(page[1].title, "a3");
    assert!(page.iter().all(|row| row.comment_count == 0));

    // Pages over unchanged data never repeat an item
    let mut seen = HashSet::new();
    for offset in (0..6).step_by(2) {
        let rows = feed
            .fetch(&[FeedPredicate::FollowedBy(viewer)], SortDirection::Asc, 2, offset)
            .await
            .unwrap();
        for row in rows {
            assert!(seen.insert(row.id), "post {} repeated", row.id);
        }
    }
    assert_eq!(seen.len(), 5);

    // Adding a tag never widens the result
    let narrower = [
        FeedPredicate::FollowedBy(viewer),
        FeedPredicate::HasAllTags(vec!["music".to_string(), "live".to_string()]),
    ];
    let wide: HashSet<_> = feed
        .fetch(&music, SortDirection::Asc, 20, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    let narrow: HashSet<_> = feed
        .fetch(&narrower, SortDirection::Asc, 20, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert!(narrow.is_subset(&wide));
    assert_eq!(narrow.len(), 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_feed_search_is_literal_and_case_insensitive() {
    let db = TestDatabase::create_unique().await.expect("test database");
    let a = db.insert_user("writer").await.unwrap();
    let viewer = db.insert_user("reader").await.unwrap();
    FollowerRepository::new(db.connection())
        .follow(a, viewer)
        .await
        .unwrap();

    let posts = PostRepository::new(db.connection());
    post(&posts, a, "Summer SALE 50% off", &[]).await;
    post(&posts, a, "50 ways to cook", &[]).await;

    let feed = FeedRepository::new(db.connection());
    let rows = feed
        .fetch(
            &[
                FeedPredicate::FollowedBy(viewer),
                FeedPredicate::TextContains("sale 50%".to_string()),
            ],
            SortDirection::Asc,
            20,
            0,
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    let rows = feed
        .fetch(
            &[
                FeedPredicate::FollowedBy(viewer),
                FeedPredicate::TextContains("50%".to_string()),
            ],
            SortDirection::Asc,
            20,
            0,
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
async fn test_follow_missing_user_is_not_found() {
    let db = TestDatabase::create_unique().await.expect("test database");
    let a = db.insert_user("alice").await.unwrap();
    let repo = FollowerRepository::new(db.connection());

    let missing_follower = repo.follow(a, a + 1000).await;
    assert!(matches!(
        missing_follower,
        Err(AppError::UserNotFound(id)) if id == (a + 1000).to_string()
    ));

    let missing_target = repo.follow(a + 1000, a).await;
    assert!(matches!(
        missing_target,
        Err(AppError::UserNotFound(id)) if id == (a + 1000).to_string()
    ));
    assert_eq!(repo.count_following(a).await.unwrap(), 0);

    db.drop_database().await.unwrap();
}
