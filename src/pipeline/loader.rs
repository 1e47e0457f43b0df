use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    error::{AppError, AppResult},
    models::{AdEventType, AdView, AdvertiserRecord, ProductView},
    sources::{Dataset, RawSource},
};

/// Rows dropped per dataset because they failed validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DroppedRows {
    pub advertisers: usize,
    pub product_views: usize,
    pub ad_views: usize,
}

impl DroppedRows {
    pub fn total(&self) -> usize {
        self.advertisers + self.product_views + self.ad_views
    }
}

/// The three raw datasets of a run, fully parsed
#[derive(Debug, Clone, Default)]
pub struct LoadedDatasets {
    pub advertisers: Vec<AdvertiserRecord>,
    pub product_views: Vec<ProductView>,
    pub ad_views: Vec<AdView>,
    pub dropped: DroppedRows,
}

#[derive(Debug, Deserialize)]
struct AdvertiserRow {
    advertiser_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProductViewRow {
    advertiser_id: Option<String>,
    product_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdViewRow {
    advertiser_id: Option<String>,
    product_id: Option<String>,
    #[serde(rename = "type")]
    event_type: Option<String>,
}

/// Fetches all three datasets and parses them
///
/// Either every dataset is returned or the whole load fails.
pub async fn load(source: &dyn RawSource) -> AppResult<LoadedDatasets> {
    tracing::info!(source = source.name(), "Loading raw datasets");

    let (advertisers_raw, product_views_raw, ad_views_raw) = tokio::try_join!(
        source.fetch(Dataset::Advertisers),
        source.fetch(Dataset::ProductViews),
        source.fetch(Dataset::AdViews),
    )?;

    let (advertisers, dropped_advertisers) = parse_csv(
        Dataset::Advertisers,
        &advertisers_raw,
        &["advertiser_id"],
        |row: AdvertiserRow| {
            Ok(AdvertiserRecord {
                advertiser_id: required(row.advertiser_id, "advertiser_id")?,
            })
        },
    )?;

    let (product_views, dropped_product_views) = parse_csv(
        Dataset::ProductViews,
        &product_views_raw,
        &["advertiser_id", "product_id"],
        |row: ProductViewRow| {
            Ok(ProductView {
                advertiser_id: required(row.advertiser_id, "advertiser_id")?,
                product_id: required(row.product_id, "product_id")?,
            })
        },
    )?;

    let (ad_views, dropped_ad_views) = parse_csv(
        Dataset::AdViews,
        &ad_views_raw,
        &["advertiser_id", "product_id", "type"],
        |row: AdViewRow| {
            Ok(AdView {
                advertiser_id: required(row.advertiser_id, "advertiser_id")?,
                product_id: required(row.product_id, "product_id")?,
                event_type: required(row.event_type, "type")?.parse::<AdEventType>()?,
            })
        },
    )?;

    let loaded = LoadedDatasets {
        advertisers,
        product_views,
        ad_views,
        dropped: DroppedRows {
            advertisers: dropped_advertisers,
            product_views: dropped_product_views,
            ad_views: dropped_ad_views,
        },
    };

    tracing::info!(
        advertisers = loaded.advertisers.len(),
        product_views = loaded.product_views.len(),
        ad_views = loaded.ad_views.len(),
        dropped = loaded.dropped.total(),
        "Raw datasets loaded"
    );

    Ok(loaded)
}

fn required(value: Option<String>, column: &str) -> Result<String, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(format!("missing {}", column)),
    }
}

/// Parses one CSV dataset, dropping and counting rows that fail validation
///
/// A missing required column means the source itself is unusable and fails
/// the load.
fn parse_csv<R, T, F>(
    dataset: Dataset,
    bytes: &[u8],
    required_columns: &[&str],
    convert: F,
) -> AppResult<(Vec<T>, usize)>
where
    R: DeserializeOwned,
    F: Fn(R) -> Result<T, String>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::source_unavailable(dataset.as_str(), e))?
        .clone();

    for column in required_columns {
        if !headers.iter().any(|h| h == *column) {
            return Err(AppError::source_unavailable(
                dataset.as_str(),
                format!("missing required column '{}'", column),
            ));
        }
    }

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for (idx, result) in reader.deserialize::<R>().enumerate() {
        // records start on line 2, after the header
        let line = idx + 2;
        let parsed = result.map_err(|e| e.to_string()).and_then(&convert);

        match parsed {
            Ok(row) => rows.push(row),
            Err(reason) => {
                dropped += 1;
                tracing::debug!(dataset = %dataset, line, reason = %reason, "Dropping malformed row");
            }
        }
    }

    if dropped > 0 {
        tracing::warn!(dataset = %dataset, dropped, kept = rows.len(), "Malformed rows dropped");
    }

    Ok((rows, dropped))
}
