use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::models::{AdEventType, AdView, TopCtrEntry, TOP_N};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AdCounts {
    impressions: i64,
    clicks: i64,
}

impl AdCounts {
    /// Orders by click-through rate using exact cross multiplication
    fn cmp_ctr(&self, other: &AdCounts) -> Ordering {
        let lhs = self.clicks as i128 * other.impressions as i128;
        let rhs = other.clicks as i128 * self.impressions as i128;
        lhs.cmp(&rhs)
    }

    fn ctr(&self) -> f64 {
        self.clicks as f64 / self.impressions as f64
    }
}

/// Result of the click-through-rate ranker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CtrRanking {
    pub entries: Vec<TopCtrEntry>,
    /// Products left out because they report more clicks than impressions
    pub excluded_inconsistent: usize,
}

/// Ranks each advertiser's products by click-through rate
///
/// Products without impressions have no defined CTR and are left out, as are
/// products reporting more clicks than impressions. Ties on CTR are broken by
/// ascending product id. Output is ordered by advertiser id, then rank.
pub fn rank_top_ctr(ad_views: &[AdView]) -> CtrRanking {
    let mut counts_by_advertiser: BTreeMap<&str, HashMap<&str, AdCounts>> = BTreeMap::new();

    for view in ad_views {
        let counts = counts_by_advertiser
            .entry(view.advertiser_id.as_str())
            .or_default()
            .entry(view.product_id.as_str())
            .or_default();

        match view.event_type {
            AdEventType::Impression => counts.impressions += 1,
            AdEventType::Click => counts.clicks += 1,
        }
    }

    let mut ranked = Vec::new();
    let mut inconsistent = 0usize;

    for (advertiser_id, counts_by_product) in counts_by_advertiser {
        let mut products: Vec<(&str, AdCounts)> = counts_by_product
            .into_iter()
            .filter(|(_, c)| c.impressions > 0 && c.ctr().is_finite())
            .filter(|(product_id, c)| {
                if c.clicks > c.impressions {
                    inconsistent += 1;
                    tracing::warn!(
                        advertiser_id = %advertiser_id,
                        product_id = %product_id,
                        impressions = c.impressions,
                        clicks = c.clicks,
                        "More clicks than impressions, excluding from top_ctr"
                    );
                    false
                } else {
                    true
                }
            })
            .collect();

        products.sort_by(|(pa, ca), (pb, cb)| cb.cmp_ctr(ca).then_with(|| pa.cmp(pb)));

        ranked.extend(
            products
                .into_iter()
                .take(TOP_N)
                .enumerate()
                .map(|(idx, (product_id, counts))| TopCtrEntry {
                    advertiser_id: advertiser_id.to_string(),
                    product_id: product_id.to_string(),
                    rank: idx as i32 + 1,
                    impressions: counts.impressions,
                    clicks: counts.clicks,
                    ctr: counts.ctr(),
                }),
        );
    }

    tracing::info!(
        rows = ranked.len(),
        excluded_inconsistent = inconsistent,
        "Computed top_ctr ranking"
    );

    CtrRanking {
        entries: ranked,
        excluded_inconsistent: inconsistent,
    }
}
