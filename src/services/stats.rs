use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    db::RecommendationStore,
    error::AppResult,
    models::{finite_or_null, Model, RankingRecord},
};

/// Number of advertisers listed at each end of the similarity ranking
const SIMILARITY_LIST_LEN: usize = 5;

/// Overlap between an advertiser's top_product and top_ctr product sets
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdvertiserOverlap {
    pub advertiser_id: String,
    pub intersection_size: usize,
    pub union_size: usize,
    pub jaccard: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct StatsResponse {
    pub date: Option<NaiveDate>,
    pub num_advertisers: usize,
    pub total_recommendations: usize,
    pub avg_jaccard_top_product_vs_top_ctr: Option<f64>,
    pub most_similar: Vec<AdvertiserOverlap>,
    pub least_similar: Vec<AdvertiserOverlap>,
}

#[derive(Default)]
struct ModelSets<'a> {
    top_product: HashSet<&'a str>,
    top_ctr: HashSet<&'a str>,
}

/// Jaccard overlap per advertiser that has rows for both models
///
/// An empty union counts as similarity 0. Sorted by Jaccard descending,
/// ties by advertiser id.
pub fn compute_overlaps(rows: &[RankingRecord]) -> Vec<AdvertiserOverlap> {
    let mut sets: BTreeMap<&str, ModelSets<'_>> = BTreeMap::new();

    for row in rows {
        let entry = sets.entry(row.advertiser_id.as_str()).or_default();
        match row.model {
            Model::TopProduct => entry.top_product.insert(row.product_id.as_str()),
            Model::TopCtr => entry.top_ctr.insert(row.product_id.as_str()),
        };
    }

    let mut overlaps: Vec<AdvertiserOverlap> = sets
        .into_iter()
        .filter(|(_, s)| !s.top_product.is_empty() && !s.top_ctr.is_empty())
        .map(|(advertiser_id, s)| {
            let intersection_size = s.top_product.intersection(&s.top_ctr).count();
            let union_size = s.top_product.union(&s.top_ctr).count();
            let jaccard = if union_size == 0 {
                0.0
            } else {
                intersection_size as f64 / union_size as f64
            };
            AdvertiserOverlap {
                advertiser_id: advertiser_id.to_string(),
                intersection_size,
                union_size,
                jaccard,
            }
        })
        .collect();

    overlaps.sort_by(|a, b| {
        b.jaccard
            .partial_cmp(&a.jaccard)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.advertiser_id.cmp(&b.advertiser_id))
    });

    overlaps
}

/// Builds the summary of one day, defaulting to the latest stored day
pub async fn daily_stats(
    store: &dyn RecommendationStore,
    date: Option<NaiveDate>,
) -> AppResult<StatsResponse> {
    let date = match date {
        Some(d) => Some(d),
        None => store.latest_stored_date().await?,
    };

    let rows = match date {
        Some(d) => store.fetch_all_for_day(d).await?,
        None => Vec::new(),
    };

    let num_advertisers = rows
        .iter()
        .map(|r| r.advertiser_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let overlaps = compute_overlaps(&rows);
    let avg_jaccard = if overlaps.is_empty() {
        Some(0.0)
    } else {
        finite_or_null(Some(
            overlaps.iter().map(|o| o.jaccard).sum::<f64>() / overlaps.len() as f64,
        ))
    };

    let most_similar: Vec<AdvertiserOverlap> =
        overlaps.iter().take(SIMILARITY_LIST_LEN).cloned().collect();
    let least_similar: Vec<AdvertiserOverlap> = overlaps
        .iter()
        .rev()
        .take(SIMILARITY_LIST_LEN)
        .cloned()
        .collect();

    Ok(StatsResponse {
        date,
        num_advertisers,
        total_recommendations: rows.len(),
        avg_jaccard_top_product_vs_top_ctr: avg_jaccard,
        most_similar,
        least_similar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 3).unwrap()
    }

    fn row(adv: &str, model: Model, product: &str, rank: i32) -> RankingRecord {
        RankingRecord {
            date: day(),
            advertiser_id: adv.to_string(),
            model,
            product_id: product.to_string(),
            rank,
            views: None,
            impressions: None,
            clicks: None,
            ctr: None,
        }
    }

    fn sample_rows() -> Vec<RankingRecord> {
        vec![
            // A: {P1, P2} vs {P2, P3} → 1/3
            row("A", Model::TopProduct, "P1", 1),
            row("A", Model::TopProduct, "P2", 2),
            row("A", Model::TopCtr, "P2", 1),
            row("A", Model::TopCtr, "P3", 2),
            // B: identical sets → 1
            row("B", Model::TopProduct, "P1", 1),
            row("B", Model::TopCtr, "P1", 1),
            // C: only one model, left out
            row("C", Model::TopProduct, "P1", 1),
        ]
    }

    #[test]
    fn test_overlaps_sorted_by_similarity() {
        let overlaps = compute_overlaps(&sample_rows());
        assert_eq!(overlaps.len(), 2);
        assert_eq!(overlaps[0].advertiser_id, "B");
        assert_eq!(overlaps[0].jaccard, 1.0);
        assert_eq!(overlaps[1].advertiser_id, "A");
        assert_eq!(overlaps[1].intersection_size, 1);
        assert_eq!(overlaps[1].union_size, 3);
        assert!((overlaps[1].jaccard - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ties_ordered_by_advertiser() {
        let rows = vec![
            row("Z", Model::TopProduct, "P1", 1),
            row("Z", Model::TopCtr, "P2", 1),
            row("M", Model::TopProduct, "P1", 1),
            row("M", Model::TopCtr, "P2", 1),
        ];
        let overlaps = compute_overlaps(&rows);
        let ids: Vec<&str> = overlaps.iter().map(|o| o.advertiser_id.as_str()).collect();
        assert_eq!(ids, vec!["M", "Z"]);
        assert!(overlaps.iter().all(|o| o.jaccard == 0.0));
    }

    #[tokio::test]
    async fn test_daily_stats_uses_latest_day() {
        let store = MemoryStore::new();
        store.replace_day(day(), &sample_rows()).await.unwrap();

        let stats = daily_stats(&store, None).await.unwrap();
        assert_eq!(stats.date, Some(day()));
        assert_eq!(stats.num_advertisers, 3);
        assert_eq!(stats.total_recommendations, 7);
        let avg = stats.avg_jaccard_top_product_vs_top_ctr.unwrap();
        assert!((avg - (1.0 + 1.0 / 3.0) / 2.0).abs() < 1e-12);
        assert_eq!(stats.most_similar[0].advertiser_id, "B");
        assert_eq!(stats.least_similar[0].advertiser_id, "A");
    }

    #[tokio::test]
    async fn test_daily_stats_on_empty_store() {
        let store = MemoryStore::new();
        let stats = daily_stats(&store, None).await.unwrap();
        assert_eq!(stats.date, None);
        assert_eq!(stats.num_advertisers, 0);
        assert_eq!(stats.total_recommendations, 0);
        assert_eq!(stats.avg_jaccard_top_product_vs_top_ctr, Some(0.0));
        assert!(stats.most_similar.is_empty());
    }
}
