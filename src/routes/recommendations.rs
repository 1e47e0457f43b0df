use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::Model,
    routes::AppState,
    services::recommendations::{self, RecommendationsResponse},
};

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub date: Option<NaiveDate>,
}

/// Handler for an advertiser's ranked list under one model
pub async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path((advertiser_id, model)): Path<(String, String)>,
    Query(query): Query<RecommendationsQuery>,
) -> AppResult<Json<RecommendationsResponse>> {
    let model: Model = model.parse()?;

    tracing::info!(
        request_id = %request_id,
        advertiser_id = %advertiser_id,
        model = %model,
        date = ?query.date,
        "Fetching recommendations"
    );

    let response =
        recommendations::get_recommendations(state.store.as_ref(), &advertiser_id, model, query.date)
            .await?;

    Ok(Json(response))
}
