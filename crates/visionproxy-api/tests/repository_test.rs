//! Repository integration tests against a real Postgres.
//!
//! Run with: `cargo test -p visionproxy-api --test repository_test`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use helpers::setup_test_app;
use visionproxy_core::constants::DEFAULT_DESCRIPTION;
use visionproxy_core::models::{NewBlocker, Platform, VideoRef};
use visionproxy_core::PersistenceError;
use visionproxy_db::{BlockerRepository, VideoRepository};

fn new_blocker(start_time_ms: i64, end_time_ms: i64, description: Option<&str>) -> NewBlocker {
    NewBlocker {
        start_time_ms,
        end_time_ms,
        description: description.map(String::from),
    }
}

#[tokio::test]
async fn save_description_updates_exactly_one_blocker() {
    let app = setup_test_app().await;
    let videos = VideoRepository::new(app.pool().clone());
    let blockers = BlockerRepository::new(app.pool().clone());
    let video = VideoRef::new(Platform::Youtube, "dQw4w9WgXcQ").unwrap();

    let (video_pk, inserted) = blockers
        .add_for_video(
            &videos,
            &video,
            &[new_blocker(0, 6_000, None), new_blocker(10_000, 16_000, None)],
        )
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    let stored = blockers.list_for_video(video_pk).await.unwrap();
    blockers
        .save_description(stored[0].id, "A dog runs across a field.")
        .await
        .unwrap();

    let stored = blockers.list_for_video(video_pk).await.unwrap();
    assert_eq!(stored[0].description, "A dog runs across a field.");
    assert_eq!(stored[1].description, DEFAULT_DESCRIPTION);
    assert_eq!(stored[0].start_time_ms, 0);
    assert_eq!(stored[0].end_time_ms, 6_000);
}

#[tokio::test]
async fn save_description_on_missing_blocker_reports_no_row() {
    let app = setup_test_app().await;
    let blockers = BlockerRepository::new(app.pool().clone());

    let err = blockers
        .save_description(987_654, "Nobody will read this.")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PersistenceError::NoRowAffected {
            blocker_id: 987_654
        }
    ));
}

#[tokio::test]
async fn adding_to_a_known_video_reuses_its_row() {
    let app = setup_test_app().await;
    let videos = VideoRepository::new(app.pool().clone());
    let blockers = BlockerRepository::new(app.pool().clone());
    let video = VideoRef::new(Platform::Youtube, "dQw4w9WgXcQ").unwrap();

    assert_eq!(videos.find_id(&video).await.unwrap(), None);

    let (first_pk, _) = blockers
        .add_for_video(&videos, &video, &[new_blocker(0, 6_000, None)])
        .await
        .unwrap();
    let (second_pk, _) = blockers
        .add_for_video(&videos, &video, &[new_blocker(20_000, 26_000, Some("A cat sleeps."))])
        .await
        .unwrap();

    assert_eq!(first_pk, second_pk);
    assert_eq!(videos.find_id(&video).await.unwrap(), Some(first_pk));

    let stored = blockers.list_for_video(first_pk).await.unwrap();
    let descriptions: Vec<&str> = stored.iter().map(|b| b.description.as_str()).collect();
    assert_eq!(descriptions, vec![DEFAULT_DESCRIPTION, "A cat sleeps."]);
}

#[tokio::test]
async fn invalid_blocker_rolls_back_the_whole_batch() {
    let app = setup_test_app().await;
    let videos = VideoRepository::new(app.pool().clone());
    let blockers = BlockerRepository::new(app.pool().clone());
    let video = VideoRef::new(Platform::Youtube, "dQw4w9WgXcQ").unwrap();

    let result = blockers
        .add_for_video(
            &videos,
            &video,
            &[new_blocker(0, 6_000, None), new_blocker(9_000, 8_000, None)],
        )
        .await;

    assert!(result.is_err());
    assert_eq!(videos.find_id(&video).await.unwrap(), None);
}
