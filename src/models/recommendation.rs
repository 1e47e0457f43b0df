use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// Maximum number of ranked products kept per advertiser and model
pub const TOP_N: usize = 20;

/// Ranking model that produced a recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    /// Most viewed products
    TopProduct,
    /// Highest click-through rate on ads
    TopCtr,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::TopProduct => "top_product",
            Model::TopCtr => "top_ctr",
        }
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top_product" => Ok(Model::TopProduct),
            "top_ctr" => Ok(Model::TopCtr),
            _ => Err(AppError::InvalidInput(
                "Invalid model. Use 'top_product' or 'top_ctr'.".to_string(),
            )),
        }
    }
}

/// Output row of the view-count ranker
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopProductEntry {
    pub advertiser_id: String,
    pub product_id: String,
    pub rank: i32,
    pub views: i64,
}

/// Output row of the click-through-rate ranker
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopCtrEntry {
    pub advertiser_id: String,
    pub product_id: String,
    pub rank: i32,
    pub impressions: i64,
    pub clicks: i64,
    pub ctr: f64,
}

/// A persisted recommendation row, the unit the store reads and writes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingRecord {
    pub date: NaiveDate,
    pub advertiser_id: String,
    pub model: Model,
    pub product_id: String,
    pub rank: i32,
    pub views: Option<i64>,
    pub impressions: Option<i64>,
    pub clicks: Option<i64>,
    #[serde(serialize_with = "serialize_finite")]
    pub ctr: Option<f64>,
}

impl RankingRecord {
    pub fn from_top_product(date: NaiveDate, entry: TopProductEntry) -> Self {
        Self {
            date,
            advertiser_id: entry.advertiser_id,
            model: Model::TopProduct,
            product_id: entry.product_id,
            rank: entry.rank,
            views: Some(entry.views),
            impressions: None,
            clicks: None,
            ctr: None,
        }
    }

    pub fn from_top_ctr(date: NaiveDate, entry: TopCtrEntry) -> Self {
        Self {
            date,
            advertiser_id: entry.advertiser_id,
            model: Model::TopCtr,
            product_id: entry.product_id,
            rank: entry.rank,
            views: None,
            impressions: Some(entry.impressions),
            clicks: Some(entry.clicks),
            ctr: finite_or_null(Some(entry.ctr)),
        }
    }
}

/// Maps NaN and infinities to `None` so they never reach clients or the store
pub fn finite_or_null(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn serialize_finite<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match finite_or_null(*value) {
        Some(v) => serializer.serialize_some(&v),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 3).unwrap()
    }

    #[test]
    fn test_model_parse() {
        assert_eq!("TOP_PRODUCT".parse::<Model>().unwrap(), Model::TopProduct);
        assert_eq!("top_ctr".parse::<Model>().unwrap(), Model::TopCtr);
        assert!(matches!(
            "top_views".parse::<Model>(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_model_serialization() {
        assert_eq!(serde_json::to_string(&Model::TopProduct).unwrap(), "\"top_product\"");
        assert_eq!(serde_json::to_string(&Model::TopCtr).unwrap(), "\"top_ctr\"");
    }

    #[test]
    fn test_top_product_record_has_no_ad_metrics() {
        let record = RankingRecord::from_top_product(
            day(),
            TopProductEntry {
                advertiser_id: "A1".to_string(),
                product_id: "P1".to_string(),
                rank: 1,
                views: 3,
            },
        );
        assert_eq!(record.model, Model::TopProduct);
        assert_eq!(record.views, Some(3));
        assert_eq!(record.impressions, None);
        assert_eq!(record.clicks, None);
        assert_eq!(record.ctr, None);
    }

    #[test]
    fn test_top_ctr_record_has_no_views() {
        let record = RankingRecord::from_top_ctr(
            day(),
            TopCtrEntry {
                advertiser_id: "A1".to_string(),
                product_id: "P2".to_string(),
                rank: 1,
                impressions: 4,
                clicks: 4,
                ctr: 1.0,
            },
        );
        assert_eq!(record.model, Model::TopCtr);
        assert_eq!(record.views, None);
        assert_eq!(record.impressions, Some(4));
        assert_eq!(record.ctr, Some(1.0));
    }

    #[test]
    fn test_non_finite_ctr_serializes_as_null() {
        let mut record = RankingRecord::from_top_product(
            day(),
            TopProductEntry {
                advertiser_id: "A1".to_string(),
                product_id: "P1".to_string(),
                rank: 1,
                views: 3,
            },
        );
        record.ctr = Some(f64::NAN);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["ctr"].is_null());
        assert_eq!(json["date"], "2025-12-03");
    }
}
