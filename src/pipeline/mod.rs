//! Daily recommendation pipeline
//!
//! Loader → Filter → {TopProduct, TopCtr} → Merger → Materializer, all for
//! one explicitly supplied run date.

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    db::RecommendationStore,
    error::{AppError, AppResult},
    sources::RawSource,
};

pub mod artifacts;
pub mod filter;
pub mod loader;
pub mod materializer;
pub mod merger;
pub mod top_ctr;
pub mod top_product;

use artifacts::{write_artifacts, RunArtifacts};
use filter::{filter_active, FilteredLogs};

/// Knobs of a single run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Write intermediate CSVs under this directory
    pub artifacts_dir: Option<PathBuf>,
    /// Compute everything but leave the store alone
    pub skip_store: bool,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunReport {
    pub run_date: NaiveDate,
    pub active_advertisers: usize,
    pub product_views: usize,
    pub ad_views: usize,
    pub dropped_rows: usize,
    /// Products left out of top_ctr for reporting more clicks than impressions
    pub excluded_inconsistent_ctr: usize,
    pub top_product_rows: usize,
    pub top_ctr_rows: usize,
    /// `None` when the store was skipped
    pub stored_rows: Option<u64>,
}

/// Runs the whole pipeline for `run_date`
///
/// Any error leaves the store as it was; the caller retries the whole date.
pub async fn run(
    source: &dyn RawSource,
    store: &dyn RecommendationStore,
    run_date: NaiveDate,
    options: &RunOptions,
) -> AppResult<RunReport> {
    let start = Instant::now();
    tracing::info!(run_date = %run_date, "Starting pipeline run");

    let loaded = loader::load(source).await?;
    let dropped_rows = loaded.dropped.total();

    let filtered = filter_active(&loaded.advertisers, loaded.product_views, loaded.ad_views);
    let FilteredLogs {
        active_advertisers,
        product_views,
        ad_views,
    } = filtered;

    // The rankers share nothing, so they run side by side off the async threads
    let top_product_task = tokio::task::spawn_blocking(move || {
        let ranked = top_product::rank_top_products(&product_views);
        (product_views, ranked)
    });
    let top_ctr_task = tokio::task::spawn_blocking(move || {
        let ranked = top_ctr::rank_top_ctr(&ad_views);
        (ad_views, ranked)
    });
    let (top_product_out, top_ctr_out) = tokio::try_join!(top_product_task, top_ctr_task)
        .map_err(|e| AppError::Internal(format!("ranking task failed: {}", e)))?;
    let (product_views, top_product) = top_product_out;
    let (ad_views, ctr_ranking) = top_ctr_out;
    let excluded_inconsistent_ctr = ctr_ranking.excluded_inconsistent;
    let top_ctr = ctr_ranking.entries;

    let filtered = FilteredLogs {
        active_advertisers,
        product_views,
        ad_views,
    };

    let top_product_rows = top_product.len();
    let top_ctr_rows = top_ctr.len();
    let merged = merger::merge(run_date, top_product.clone(), top_ctr.clone());

    if let Some(root) = &options.artifacts_dir {
        let artifacts = RunArtifacts {
            filtered: &filtered,
            top_product: &top_product,
            top_ctr: &top_ctr,
            merged: &merged,
        };
        if let Err(e) = write_artifacts(root, run_date, &artifacts) {
            tracing::warn!(error = %e, "Failed to write run artifacts, continuing");
        }
    }

    let stored_rows = if options.skip_store {
        tracing::info!(run_date = %run_date, "Store skipped for this run");
        None
    } else {
        Some(materializer::materialize(store, run_date, &merged).await?)
    };

    let report = RunReport {
        run_date,
        active_advertisers: filtered.active_advertisers.len(),
        product_views: filtered.product_views.len(),
        ad_views: filtered.ad_views.len(),
        dropped_rows,
        excluded_inconsistent_ctr,
        top_product_rows,
        top_ctr_rows,
        stored_rows,
    };

    tracing::info!(
        run_date = %run_date,
        active_advertisers = report.active_advertisers,
        dropped_rows = report.dropped_rows,
        excluded_inconsistent_ctr = report.excluded_inconsistent_ctr,
        top_product_rows = report.top_product_rows,
        top_ctr_rows = report.top_ctr_rows,
        elapsed_ms = start.elapsed().as_millis(),
        "Pipeline run completed"
    );

    Ok(report)
}
