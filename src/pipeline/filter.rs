use std::collections::HashSet;

use crate::models::{AdView, AdvertiserRecord, ProductView};

/// Log datasets restricted to active advertisers
#[derive(Debug, Clone, Default)]
pub struct FilteredLogs {
    pub active_advertisers: HashSet<String>,
    pub product_views: Vec<ProductView>,
    pub ad_views: Vec<AdView>,
}

/// Distinct advertiser ids of the registry
pub fn active_advertisers(registry: &[AdvertiserRecord]) -> HashSet<String> {
    registry.iter().map(|a| a.advertiser_id.clone()).collect()
}

/// Keeps only log rows whose advertiser is in the registry
///
/// Rows of unknown advertisers are dropped silently. An empty registry yields
/// empty logs.
pub fn filter_active(
    registry: &[AdvertiserRecord],
    product_views: Vec<ProductView>,
    ad_views: Vec<AdView>,
) -> FilteredLogs {
    let active = active_advertisers(registry);

    let product_views: Vec<ProductView> = product_views
        .into_iter()
        .filter(|v| active.contains(&v.advertiser_id))
        .collect();

    let ad_views: Vec<AdView> = ad_views
        .into_iter()
        .filter(|v| active.contains(&v.advertiser_id))
        .collect();

    tracing::info!(
        active_advertisers = active.len(),
        product_views = product_views.len(),
        ad_views = ad_views.len(),
        "Filtered logs to active advertisers"
    );

    FilteredLogs {
        active_advertisers: active,
        product_views,
        ad_views,
    }
}
