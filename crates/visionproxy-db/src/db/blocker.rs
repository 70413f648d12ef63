//! Blocker repository: listing, ingestion and description updates for the
//! `blocker` table.

use sqlx::{PgPool, Postgres};
use visionproxy_core::models::{Blocker, NewBlocker, VideoRef};
use visionproxy_core::{AppError, PersistenceError};

use super::video::VideoRepository;

/// Repository for the `blocker` table.
#[derive(Clone)]
pub struct BlockerRepository {
    pool: PgPool,
}

impl BlockerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Blockers of a video in insertion order.
    #[tracing::instrument(skip(self), fields(db.table = "blocker", db.video_pk = video_pk))]
    pub async fn list_for_video(&self, video_pk: i64) -> Result<Vec<Blocker>, AppError> {
        let blockers = sqlx::query_as::<Postgres, Blocker>(
            r#"
            SELECT id, start_time_ms, end_time_ms, description
            FROM blocker
            WHERE video_id = $1
            ORDER BY id
            "#,
        )
        .bind(video_pk)
        .fetch_all(&self.pool)
        .await?;
        Ok(blockers)
    }

    /// Record a video (if new) and append its blockers in one transaction.
    ///
    /// Returns the video's primary key and the number of blockers inserted.
    #[tracing::instrument(skip(self, videos, video, blockers), fields(db.table = "blocker", video_ref = %video, count = blockers.len()))]
    pub async fn add_for_video(
        &self,
        videos: &VideoRepository,
        video: &VideoRef,
        blockers: &[NewBlocker],
    ) -> Result<(i64, usize), AppError> {
        for blocker in blockers {
            blocker.validate()?;
        }

        let mut tx = self.pool.begin().await?;
        let video_pk = videos.upsert_tx(&mut tx, video).await?;

        for blocker in blockers {
            sqlx::query(
                r#"
                INSERT INTO blocker (video_id, start_time_ms, end_time_ms, description)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(video_pk)
            .bind(blocker.start_time_ms)
            .bind(blocker.end_time_ms)
            .bind(blocker.description_or_default())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            video = %video,
            video_pk,
            inserted = blockers.len(),
            "Blockers recorded"
        );
        Ok((video_pk, blockers.len()))
    }

    /// Store a generated description on exactly one blocker.
    ///
    /// Only `description` is written, so concurrent updates to different rows
    /// never conflict. Zero affected rows is reported, not ignored.
    #[tracing::instrument(skip(self, description), fields(db.table = "blocker", db.record_id = blocker_id))]
    pub async fn save_description(
        &self,
        blocker_id: i64,
        description: &str,
    ) -> Result<(), PersistenceError> {
        let result = sqlx::query("UPDATE blocker SET description = $1 WHERE id = $2")
            .bind(description)
            .bind(blocker_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::NoRowAffected { blocker_id });
        }
        Ok(())
    }
}
