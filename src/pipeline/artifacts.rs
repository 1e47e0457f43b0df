use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{RankingRecord, TopCtrEntry, TopProductEntry},
    pipeline::filter::FilteredLogs,
};

/// Intermediate outputs of one run, as written to disk
pub struct RunArtifacts<'a> {
    pub filtered: &'a FilteredLogs,
    pub top_product: &'a [TopProductEntry],
    pub top_ctr: &'a [TopCtrEntry],
    pub merged: &'a [RankingRecord],
}

/// Writes the run's intermediate CSVs under `<root>/<run_date>/`
///
/// Returns the directory written to.
pub fn write_artifacts(
    root: &Path,
    run_date: NaiveDate,
    artifacts: &RunArtifacts<'_>,
) -> AppResult<PathBuf> {
    let dir = root.join(run_date.to_string());
    std::fs::create_dir_all(&dir)
        .map_err(|e| AppError::Internal(format!("create {}: {}", dir.display(), e)))?;

    write_csv(&dir.join("product_views_filtered.csv"), &artifacts.filtered.product_views)?;
    write_csv(&dir.join("ads_views_filtered.csv"), &artifacts.filtered.ad_views)?;
    write_csv(&dir.join("top_product.csv"), artifacts.top_product)?;
    write_csv(&dir.join("top_ctr.csv"), artifacts.top_ctr)?;
    write_csv(&dir.join("recommendations.csv"), artifacts.merged)?;

    tracing::info!(dir = %dir.display(), "Run artifacts written");

    Ok(dir)
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> AppResult<()> {
    let to_err = |e: csv::Error| AppError::Internal(format!("write {}: {}", path.display(), e));

    let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
    for row in rows {
        writer.serialize(row).map_err(to_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::Internal(format!("flush {}: {}", path.display(), e)))?;

    Ok(())
}
