use chrono::Utc;
use sqlx::SqlitePool;

/// Fixed-window request counter keyed by an arbitrary string
/// (`invite:<company>`, `accept:<user>`).
pub struct RateLimit;

impl RateLimit {
    /// Counts one call against `key`. Returns `false` once `max_requests` calls
    /// have already been made in the current `window_seconds` window.
    pub async fn check(
        pool: &SqlitePool,
        key: &str,
        max_requests: i64,
        window_seconds: i64,
    ) -> Result<bool, sqlx::Error> {
        Self::check_at(pool, key, max_requests, window_seconds, Utc::now().timestamp()).await
    }

    pub async fn check_at(
        pool: &SqlitePool,
        key: &str,
        max_requests: i64,
        window_seconds: i64,
        now: i64,
    ) -> Result<bool, sqlx::Error> {
        // Expired window restarts at 1.
        let count: i64 = sqlx::query_scalar(
            r#"INSERT INTO rate_limits (key, window_start, count)
               VALUES ($1, $2, 1)
               ON CONFLICT(key) DO UPDATE SET
                   window_start = CASE WHEN rate_limits.window_start + $3 <= $2
                                       THEN $2 ELSE rate_limits.window_start END,
                   count = CASE WHEN rate_limits.window_start + $3 <= $2
                                THEN 1 ELSE rate_limits.count + 1 END
               RETURNING count"#,
        )
        .bind(key)
        .bind(now)
        .bind(window_seconds)
        .fetch_one(pool)
        .await?;
        Ok(count <= max_requests)
    }
}
