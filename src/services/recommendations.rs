use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::{
    db::RecommendationStore,
    error::{AppError, AppResult},
    models::{Model, RankingRecord},
};

/// Recommendations of one advertiser and model for a single day
#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub date: NaiveDate,
    pub advertiser_id: String,
    pub model: Model,
    pub num_recommendations: usize,
    pub recommendations: Vec<RankingRecord>,
}

/// Recommendations of one advertiser over a trailing window
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub advertiser_id: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub num_records: usize,
    pub history: Vec<RankingRecord>,
}

/// Fetches the ranked list for `date`, or for the latest materialized date
/// of the advertiser and model when no date is given
pub async fn get_recommendations(
    store: &dyn RecommendationStore,
    advertiser_id: &str,
    model: Model,
    date: Option<NaiveDate>,
) -> AppResult<RecommendationsResponse> {
    let date = match date {
        Some(d) => d,
        None => store.latest_date(advertiser_id, model).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "No recommendations for advertiser={}, model={}",
                advertiser_id, model
            ))
        })?,
    };

    let recommendations = store.fetch_day(date, advertiser_id, model).await?;
    if recommendations.is_empty() {
        return Err(AppError::NotFound(format!(
            "No recommendations for advertiser={}, model={} on {}",
            advertiser_id, model, date
        )));
    }

    tracing::debug!(
        advertiser_id = %advertiser_id,
        model = %model,
        date = %date,
        count = recommendations.len(),
        "Served recommendations"
    );

    Ok(RecommendationsResponse {
        date,
        advertiser_id: advertiser_id.to_string(),
        model,
        num_recommendations: recommendations.len(),
        recommendations,
    })
}

/// Fetches every row of the advertiser with `until - days <= date <= until`
pub async fn get_history(
    store: &dyn RecommendationStore,
    advertiser_id: &str,
    days: u32,
    until: NaiveDate,
) -> AppResult<HistoryResponse> {
    let from = until
        .checked_sub_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "History window of {} days before {} is out of range",
                days, until
            ))
        })?;
    let history = store.fetch_history(advertiser_id, from, until).await?;

    if history.is_empty() {
        return Err(AppError::NotFound(format!(
            "No recommendation history for advertiser={} between {} and {}",
            advertiser_id, from, until
        )));
    }

    Ok(HistoryResponse {
        advertiser_id: advertiser_id.to_string(),
        from_date: from,
        to_date: until,
        num_records: history.len(),
        history,
    })
}
