//! Recommendation store
//!
//! The store is an explicit handle passed to whoever needs it; nothing here
//! keeps global connection state.

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{Model, RankingRecord},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};

/// Persistence contract shared by the pipeline and the serving API
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Atomically replaces every row of `date` with `records`
    ///
    /// Readers observe either the previous rows or the new ones. On error
    /// nothing changes. Returns the number of rows written.
    async fn replace_day(&self, date: NaiveDate, records: &[RankingRecord]) -> AppResult<u64>;

    /// Most recent date holding rows for the advertiser and model
    async fn latest_date(&self, advertiser_id: &str, model: Model)
        -> AppResult<Option<NaiveDate>>;

    /// Most recent date holding any rows
    async fn latest_stored_date(&self) -> AppResult<Option<NaiveDate>>;

    /// Rows of one (date, advertiser, model), rank ascending
    async fn fetch_day(
        &self,
        date: NaiveDate,
        advertiser_id: &str,
        model: Model,
    ) -> AppResult<Vec<RankingRecord>>;

    /// Rows of an advertiser with `from <= date <= to`, ordered by date
    /// descending, then model, then rank
    async fn fetch_history(
        &self,
        advertiser_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<RankingRecord>>;

    /// Every row of a date, ordered by advertiser, model, rank
    async fn fetch_all_for_day(&self, date: NaiveDate) -> AppResult<Vec<RankingRecord>>;

    /// Checks the store is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// Rejects records stamped with a date other than the one being replaced
pub(crate) fn ensure_dated(date: NaiveDate, records: &[RankingRecord]) -> AppResult<()> {
    match records.iter().find(|r| r.date != date) {
        Some(r) => Err(AppError::InvalidInput(format!(
            "record dated {} written to {}",
            r.date, date
        ))),
        None => Ok(()),
    }
}
