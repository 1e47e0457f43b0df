use chrono::NaiveDate;

use crate::models::{RankingRecord, TopCtrEntry, TopProductEntry};

/// Unions both rankings into store records stamped with the run date
pub fn merge(
    run_date: NaiveDate,
    top_product: Vec<TopProductEntry>,
    top_ctr: Vec<TopCtrEntry>,
) -> Vec<RankingRecord> {
    let mut merged = Vec::with_capacity(top_product.len() + top_ctr.len());

    merged.extend(
        top_product
            .into_iter()
            .map(|entry| RankingRecord::from_top_product(run_date, entry)),
    );
    merged.extend(
        top_ctr
            .into_iter()
            .map(|entry| RankingRecord::from_top_ctr(run_date, entry)),
    );

    merged
}
