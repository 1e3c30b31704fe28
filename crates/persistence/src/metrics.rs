//! Database metrics collection.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record database connection pool metrics.
///
/// Called from the health endpoint so the gauges stay fresh without a
/// background job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times a query and records its duration and outcome.
///
/// ```ignore
/// let timer = QueryTimer::new("find_webhook_subscribers");
/// let result = sqlx::query_as::<_, WebhookSubscriberEntity>(...).fetch_all(&pool).await;
/// timer.finish(&result);
/// ```
pub struct QueryTimer {
    query_name: String,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration and whether the query failed.
    pub fn finish<T, E>(self, result: &Result<T, E>) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(&self.query_name, duration);

        if result.is_err() {
            counter!(
                "database_query_errors_total",
                "query" => self.query_name
            )
            .increment(1);
        }
    }
}
