use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::{
    db::{ensure_dated, RecommendationStore},
    error::{AppError, AppResult},
    models::{Model, RankingRecord},
};

/// In-process store with the same replace semantics as `PgStore`
///
/// A day's rows are swapped under the write lock, so readers never see a
/// half-replaced day. Used for dry runs and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    days: Arc<RwLock<BTreeMap<NaiveDate, Vec<RankingRecord>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything stored, keyed by date
    pub async fn snapshot(&self) -> BTreeMap<NaiveDate, Vec<RankingRecord>> {
        self.days.read().await.clone()
    }

    /// Enforces the uniqueness keys of the recommendations table
    fn check_unique(records: &[RankingRecord]) -> AppResult<()> {
        let mut ranks = HashSet::new();
        let mut products = HashSet::new();

        for r in records {
            if !ranks.insert((r.date, r.advertiser_id.as_str(), r.model, r.rank)) {
                return Err(AppError::Internal(format!(
                    "duplicate rank {} for {}/{} on {}",
                    r.rank, r.advertiser_id, r.model, r.date
                )));
            }
            if !products.insert((r.date, r.advertiser_id.as_str(), r.model, r.product_id.as_str())) {
                return Err(AppError::Internal(format!(
                    "duplicate product {} for {}/{} on {}",
                    r.product_id, r.advertiser_id, r.model, r.date
                )));
            }
        }

        Ok(())
    }
}

fn sort_key(r: &RankingRecord) -> (&str, &'static str, i32) {
    (r.advertiser_id.as_str(), r.model.as_str(), r.rank)
}

#[async_trait::async_trait]
impl RecommendationStore for MemoryStore {
    async fn replace_day(&self, date: NaiveDate, records: &[RankingRecord]) -> AppResult<u64> {
        ensure_dated(date, records)?;
        Self::check_unique(records)?;

        let mut days = self.days.write().await;
        if records.is_empty() {
            days.remove(&date);
        } else {
            days.insert(date, records.to_vec());
        }

        Ok(records.len() as u64)
    }

    async fn latest_date(
        &self,
        advertiser_id: &str,
        model: Model,
    ) -> AppResult<Option<NaiveDate>> {
        let days = self.days.read().await;
        Ok(days
            .iter()
            .rev()
            .find(|(_, rows)| {
                rows.iter()
                    .any(|r| r.advertiser_id == advertiser_id && r.model == model)
            })
            .map(|(date, _)| *date))
    }

    async fn latest_stored_date(&self) -> AppResult<Option<NaiveDate>> {
        let days = self.days.read().await;
        Ok(days.keys().next_back().copied())
    }

    async fn fetch_day(
        &self,
        date: NaiveDate,
        advertiser_id: &str,
        model: Model,
    ) -> AppResult<Vec<RankingRecord>> {
        let days = self.days.read().await;
        let mut rows: Vec<RankingRecord> = days
            .get(&date)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.advertiser_id == advertiser_id && r.model == model)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by_key(|r| r.rank);
        Ok(rows)
    }

    async fn fetch_history(
        &self,
        advertiser_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<RankingRecord>> {
        if from > to {
            return Ok(Vec::new());
        }

        let days = self.days.read().await;
        let mut rows = Vec::new();
        for (_, day_rows) in days.range(from..=to).rev() {
            let mut day: Vec<RankingRecord> = day_rows
                .iter()
                .filter(|r| r.advertiser_id == advertiser_id)
                .cloned()
                .collect();
            day.sort_by(|a, b| (a.model.as_str(), a.rank).cmp(&(b.model.as_str(), b.rank)));
            rows.extend(day);
        }
        Ok(rows)
    }

    async fn fetch_all_for_day(&self, date: NaiveDate) -> AppResult<Vec<RankingRecord>> {
        let days = self.days.read().await;
        let mut rows = days.get(&date).cloned().unwrap_or_default();
        rows.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        Ok(rows)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
    }

    fn record(date: NaiveDate, adv: &str, model: Model, product: &str, rank: i32) -> RankingRecord {
        RankingRecord {
            date,
            advertiser_id: adv.to_string(),
            model,
            product_id: product.to_string(),
            rank,
            views: (model == Model::TopProduct).then_some(10 - rank as i64),
            impressions: None,
            clicks: None,
            ctr: None,
        }
    }

    #[tokio::test]
    async fn test_replace_day_swaps_only_that_day() {
        let store = MemoryStore::new();
        store
            .replace_day(day(1), &[record(day(1), "A1", Model::TopProduct, "P1", 1)])
            .await
            .unwrap();
        store
            .replace_day(day(2), &[record(day(2), "A1", Model::TopProduct, "P2", 1)])
            .await
            .unwrap();
        store
            .replace_day(day(2), &[record(day(2), "A1", Model::TopProduct, "P3", 1)])
            .await
            .unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot[&day(1)][0].product_id, "P1");
        assert_eq!(snapshot[&day(2)].len(), 1);
        assert_eq!(snapshot[&day(2)][0].product_id, "P3");
    }

    #[tokio::test]
    async fn test_replace_with_nothing_clears_the_day() {
        let store = MemoryStore::new();
        store
            .replace_day(day(1), &[record(day(1), "A1", Model::TopCtr, "P1", 1)])
            .await
            .unwrap();
        store.replace_day(day(1), &[]).await.unwrap();

        assert!(store.snapshot().await.is_empty());
        assert_eq!(store.latest_stored_date().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_rank_is_rejected_and_store_unchanged() {
        let store = MemoryStore::new();
        let original = vec![record(day(1), "A1", Model::TopProduct, "P1", 1)];
        store.replace_day(day(1), &original).await.unwrap();

        let bad = vec![
            record(day(1), "A1", Model::TopProduct, "P1", 1),
            record(day(1), "A1", Model::TopProduct, "P2", 1),
        ];
        assert!(store.replace_day(day(1), &bad).await.is_err());
        assert_eq!(store.snapshot().await[&day(1)], original);
    }

    #[tokio::test]
    async fn test_record_of_another_date_is_rejected() {
        let store = MemoryStore::new();
        let original = vec![record(day(1), "A1", Model::TopProduct, "P1", 1)];
        store.replace_day(day(1), &original).await.unwrap();

        let misdated = vec![record(day(2), "A1", Model::TopProduct, "P2", 1)];
        let err = store.replace_day(day(1), &misdated).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(store.snapshot().await.len(), 1);
        assert_eq!(store.snapshot().await[&day(1)], original);
    }

    #[tokio::test]
    async fn test_history_ordering() {
        let store = MemoryStore::new();
        store
            .replace_day(
                day(1),
                &[
                    record(day(1), "A1", Model::TopProduct, "P1", 1),
                    record(day(1), "A1", Model::TopCtr, "P9", 1),
                ],
            )
            .await
            .unwrap();
        store
            .replace_day(
                day(2),
                &[
                    record(day(2), "A1", Model::TopProduct, "P2", 2),
                    record(day(2), "A1", Model::TopProduct, "P1", 1),
                    record(day(2), "B1", Model::TopProduct, "P1", 1),
                ],
            )
            .await
            .unwrap();

        let history = store.fetch_history("A1", day(1), day(2)).await.unwrap();
        let summary: Vec<(u32, &str, i32)> = history
            .iter()
            .map(|r| (chrono::Datelike::day(&r.date), r.model.as_str(), r.rank))
            .collect();
        assert_eq!(
            summary,
            vec![
                (2, "top_product", 1),
                (2, "top_product", 2),
                (1, "top_ctr", 1),
                (1, "top_product", 1),
            ]
        );

        assert_eq!(
            store.latest_date("A1", Model::TopCtr).await.unwrap(),
            Some(day(1))
        );
        assert_eq!(
            store.latest_date("A1", Model::TopProduct).await.unwrap(),
            Some(day(2))
        );
        assert_eq!(store.latest_date("ZZ", Model::TopProduct).await.unwrap(), None);
    }
}
