use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    routes::AppState,
    services::recommendations::{self, HistoryResponse},
};

/// Longest window a client may request
const MAX_HISTORY_DAYS: u32 = 366;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<u32>,
    pub until: Option<NaiveDate>,
}

/// Handler for an advertiser's recommendations over a trailing window
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(advertiser_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<HistoryResponse>> {
    let days = query.days.unwrap_or(state.history_days);
    if days > MAX_HISTORY_DAYS {
        return Err(AppError::InvalidInput(format!(
            "days must be at most {}",
            MAX_HISTORY_DAYS
        )));
    }
    let until = query.until.unwrap_or_else(|| Utc::now().date_naive());

    let response =
        recommendations::get_history(state.store.as_ref(), &advertiser_id, days, until).await?;

    Ok(Json(response))
}
