use std::time::Instant;

use chrono::NaiveDate;

use crate::{db::RecommendationStore, error::AppResult, models::RankingRecord};

/// Replaces the store's rows for `run_date` with `records` in one transaction
///
/// This is the idempotency boundary of a run: calling it again with the same
/// date and records leaves the store in the same state.
pub async fn materialize(
    store: &dyn RecommendationStore,
    run_date: NaiveDate,
    records: &[RankingRecord],
) -> AppResult<u64> {
    let start = Instant::now();

    let written = store.replace_day(run_date, records).await.map_err(|e| {
        tracing::error!(run_date = %run_date, error = %e, "Materialization failed, day left unchanged");
        e
    })?;

    tracing::info!(
        run_date = %run_date,
        rows = written,
        elapsed_ms = start.elapsed().as_millis(),
        "Recommendations materialized"
    );

    Ok(written)
}
