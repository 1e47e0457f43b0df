use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};

use crate::{
    db::{ensure_dated, RecommendationStore},
    error::{AppError, AppResult},
    models::{finite_or_null, Model, RankingRecord},
};

/// Rows per INSERT statement; 9 binds each keeps well under the 65535 limit
const INSERT_CHUNK_ROWS: usize = 5_000;

const SELECT_COLUMNS: &str =
    "SELECT date, advertiser_id, model, product_id, rank, views, impressions, clicks, ctr FROM recommendations";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

#[derive(Debug, sqlx::FromRow)]
struct RecommendationRow {
    date: NaiveDate,
    advertiser_id: String,
    model: String,
    product_id: String,
    rank: i32,
    views: Option<i64>,
    impressions: Option<i64>,
    clicks: Option<i64>,
    ctr: Option<f64>,
}

impl TryFrom<RecommendationRow> for RankingRecord {
    type Error = AppError;

    fn try_from(row: RecommendationRow) -> Result<Self, Self::Error> {
        let model = row
            .model
            .parse::<Model>()
            .map_err(|_| AppError::Internal(format!("unknown model '{}' in store", row.model)))?;

        Ok(RankingRecord {
            date: row.date,
            advertiser_id: row.advertiser_id,
            model,
            product_id: row.product_id,
            rank: row.rank,
            views: row.views,
            impressions: row.impressions,
            clicks: row.clicks,
            ctr: finite_or_null(row.ctr),
        })
    }
}

fn into_records(rows: Vec<RecommendationRow>) -> AppResult<Vec<RankingRecord>> {
    rows.into_iter().map(RankingRecord::try_from).collect()
}

/// PostgreSQL-backed store
///
/// Connections are checked out of the pool per operation and returned when
/// the operation ends, whether it succeeds or not. `replace_day` runs inside
/// a transaction that is rolled back if it is dropped before commit.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Releases every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl RecommendationStore for PgStore {
    async fn replace_day(&self, date: NaiveDate, records: &[RankingRecord]) -> AppResult<u64> {
        ensure_dated(date, records)?;

        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM recommendations WHERE date = $1")
            .bind(date)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let mut inserted = 0u64;
        for chunk in records.chunks(INSERT_CHUNK_ROWS) {
            let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
                "INSERT INTO recommendations (date, advertiser_id, model, product_id, rank, views, impressions, clicks, ctr) ",
            );
            qb.push_values(chunk, |mut b, record| {
                b.push_bind(date)
                    .push_bind(record.advertiser_id.clone())
                    .push_bind(record.model.as_str())
                    .push_bind(record.product_id.clone())
                    .push_bind(record.rank)
                    .push_bind(record.views)
                    .push_bind(record.impressions)
                    .push_bind(record.clicks)
                    .push_bind(finite_or_null(record.ctr));
            });
            inserted += qb.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;

        tracing::debug!(date = %date, deleted, inserted, "Replaced recommendations for date");

        Ok(inserted)
    }

    async fn latest_date(
        &self,
        advertiser_id: &str,
        model: Model,
    ) -> AppResult<Option<NaiveDate>> {
        let latest = sqlx::query_scalar::<_, Option<NaiveDate>>(
            "SELECT MAX(date) FROM recommendations WHERE advertiser_id = $1 AND model = $2",
        )
        .bind(advertiser_id)
        .bind(model.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(latest)
    }

    async fn latest_stored_date(&self) -> AppResult<Option<NaiveDate>> {
        let latest =
            sqlx::query_scalar::<_, Option<NaiveDate>>("SELECT MAX(date) FROM recommendations")
                .fetch_one(&self.pool)
                .await?;

        Ok(latest)
    }

    async fn fetch_day(
        &self,
        date: NaiveDate,
        advertiser_id: &str,
        model: Model,
    ) -> AppResult<Vec<RankingRecord>> {
        let sql = format!(
            "{} WHERE date = $1 AND advertiser_id = $2 AND model = $3 ORDER BY rank ASC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, RecommendationRow>(&sql)
            .bind(date)
            .bind(advertiser_id)
            .bind(model.as_str())
            .fetch_all(&self.pool)
            .await?;

        into_records(rows)
    }

    async fn fetch_history(
        &self,
        advertiser_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<RankingRecord>> {
        let sql = format!(
            "{} WHERE advertiser_id = $1 AND date >= $2 AND date <= $3 ORDER BY date DESC, model ASC, rank ASC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, RecommendationRow>(&sql)
            .bind(advertiser_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        into_records(rows)
    }

    async fn fetch_all_for_day(&self, date: NaiveDate) -> AppResult<Vec<RankingRecord>> {
        let sql = format!(
            "{} WHERE date = $1 ORDER BY advertiser_id ASC, model ASC, rank ASC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, RecommendationRow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        into_records(rows)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
