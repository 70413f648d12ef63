//! Video repository: identity lookups for the `video` table.

use sqlx::{PgPool, Postgres, Transaction};
use visionproxy_core::models::VideoRef;
use visionproxy_core::AppError;

/// Repository for the `video` table.
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Primary key of a known video, if it has been recorded.
    #[tracing::instrument(skip(self, video), fields(db.table = "video", video_ref = %video))]
    pub async fn find_id(&self, video: &VideoRef) -> Result<Option<i64>, AppError> {
        let id = sqlx::query_scalar::<Postgres, i64>(
            "SELECT id FROM video WHERE platform = $1 AND video_id = $2",
        )
        .bind(video.platform.as_str())
        .bind(&video.video_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    /// Insert the video if it is new and return its primary key either way.
    #[tracing::instrument(skip(self, tx, video), fields(db.table = "video", video_ref = %video))]
    pub async fn upsert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        video: &VideoRef,
    ) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<Postgres, i64>(
            r#"
            INSERT INTO video (platform, video_id)
            VALUES ($1, $2)
            ON CONFLICT (platform, video_id) DO UPDATE SET platform = EXCLUDED.platform
            RETURNING id
            "#,
        )
        .bind(video.platform.as_str())
        .bind(&video.video_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }
}
