use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    routes::AppState,
    services::stats::{self, StatsResponse},
};

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub date: Option<NaiveDate>,
}

/// Handler for the daily overlap summary
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<StatsResponse>> {
    let response = stats::daily_stats(state.store.as_ref(), query.date).await?;
    Ok(Json(response))
}
