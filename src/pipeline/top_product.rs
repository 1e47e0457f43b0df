use std::collections::{BTreeMap, HashMap};

use crate::models::{ProductView, TopProductEntry, TOP_N};

/// Ranks each advertiser's products by view count
///
/// Ties on views are broken by ascending product id so reruns are stable.
/// Output is ordered by advertiser id, then rank.
pub fn rank_top_products(product_views: &[ProductView]) -> Vec<TopProductEntry> {
    let mut views_by_advertiser: BTreeMap<&str, HashMap<&str, i64>> = BTreeMap::new();

    for view in product_views {
        *views_by_advertiser
            .entry(view.advertiser_id.as_str())
            .or_default()
            .entry(view.product_id.as_str())
            .or_insert(0) += 1;
    }

    let mut ranked = Vec::new();

    for (advertiser_id, views_by_product) in views_by_advertiser {
        let mut products: Vec<(&str, i64)> = views_by_product.into_iter().collect();
        products.sort_by(|(pa, va), (pb, vb)| vb.cmp(va).then_with(|| pa.cmp(pb)));

        ranked.extend(
            products
                .into_iter()
                .take(TOP_N)
                .enumerate()
                .map(|(idx, (product_id, views))| TopProductEntry {
                    advertiser_id: advertiser_id.to_string(),
                    product_id: product_id.to_string(),
                    rank: idx as i32 + 1,
                    views,
                }),
        );
    }

    tracing::info!(rows = ranked.len(), "Computed top_product ranking");

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn views(adv: &str, product: &str, count: usize) -> Vec<ProductView> {
        (0..count)
            .map(|_| ProductView {
                advertiser_id: adv.to_string(),
                product_id: product.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_ranks_by_views_with_product_id_tiebreak() {
        let mut input = views("A1", "P2", 3);
        input.extend(views("A1", "P3", 1));
        input.extend(views("A1", "P1", 3));

        let ranked = rank_top_products(&input);
        let summary: Vec<(&str, i32, i64)> = ranked
            .iter()
            .map(|e| (e.product_id.as_str(), e.rank, e.views))
            .collect();

        assert_eq!(summary, vec![("P1", 1, 3), ("P2", 2, 3), ("P3", 3, 1)]);
    }

    #[test]
    fn test_keeps_at_most_twenty_per_advertiser() {
        let mut input = Vec::new();
        for i in 0..25 {
            input.extend(views("A1", &format!("P{:02}", i), i + 1));
        }
        input.extend(views("A2", "X", 1));

        let ranked = rank_top_products(&input);
        let a1: Vec<&TopProductEntry> = ranked.iter().filter(|e| e.advertiser_id == "A1").collect();
        let a2: Vec<&TopProductEntry> = ranked.iter().filter(|e| e.advertiser_id == "A2").collect();

        assert_eq!(a1.len(), 20);
        assert_eq!(a2.len(), 1);
        assert_eq!(a1[0].product_id, "P24");
        assert_eq!(a1[0].views, 25);
        assert_eq!(a1[19].product_id, "P05");

        let ranks: Vec<i32> = a1.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, (1..=20).collect::<Vec<i32>>());
        assert!(a1.windows(2).all(|w| w[0].views >= w[1].views));
    }

    #[test]
    fn test_advertisers_are_ranked_independently() {
        let mut input = views("B", "P1", 1);
        input.extend(views("A", "P1", 2));
        input.extend(views("A", "P2", 5));

        let ranked = rank_top_products(&input);
        let summary: Vec<(&str, &str, i32)> = ranked
            .iter()
            .map(|e| (e.advertiser_id.as_str(), e.product_id.as_str(), e.rank))
            .collect();

        assert_eq!(summary, vec![("A", "P2", 1), ("A", "P1", 2), ("B", "P1", 1)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_top_products(&[]).is_empty());
    }
}
