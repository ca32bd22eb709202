//! PostgreSQL store implementation.
//!
//! Backed by the `countries` table (see `migrations/`), which carries a unique
//! index over `LOWER(TRIM(name))` so case- or padding-variant names cannot
//! coexist. Names are stored as given and always compared through that key.
//!
//! This module uses dynamic queries (sqlx::query) instead of compile-time
//! checked macros (sqlx::query!) to allow compilation without DATABASE_URL.

use crate::error::StoreError;
use crate::repository::{CountryRepository, Store};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orbis_domain::{Country, CountryId, CountryQuery, CountrySort, MergedCountry};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::debug;

const COUNTRY_COLUMNS: &str = "id, name, capital, region, population, currency_code, \
     exchange_rate, estimated_gdp, flag_url, last_refreshed_at";

/// PostgreSQL-backed country store.
#[derive(Clone)]
pub struct PgStore {
    /// PostgreSQL connection pool
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn population_to_db(population: u64) -> Result<i64, StoreError> {
    i64::try_from(population)
        .map_err(|_| StoreError::Serialization(format!("population {} exceeds BIGINT", population)))
}

/// Parse a row selected with `COUNTRY_COLUMNS`.
fn parse_country_row(row: &PgRow) -> Result<Country, StoreError> {
    let population: i64 = row.try_get("population")?;
    let population = u64::try_from(population)
        .map_err(|_| StoreError::Deserialization(format!("negative population: {}", population)))?;

    Ok(Country {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        capital: row.try_get("capital")?,
        region: row.try_get("region")?,
        population,
        currency_code: row.try_get("currency_code")?,
        exchange_rate: row.try_get("exchange_rate")?,
        estimated_gdp: row.try_get("estimated_gdp")?,
        flag_url: row.try_get("flag_url")?,
        last_refreshed_at: row.try_get("last_refreshed_at")?,
    })
}

#[async_trait]
impl CountryRepository for PgStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, StoreError> {
        let sql = format!(
            "SELECT {} FROM countries WHERE LOWER(TRIM(name)) = LOWER($1) ORDER BY id LIMIT 1",
            COUNTRY_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_country_row).transpose()
    }

    async fn create(&self, country: &MergedCountry) -> Result<Country, StoreError> {
        country.key()?;
        let sql = format!(
            r#"
            INSERT INTO countries (
                name, capital, region, population, currency_code,
                exchange_rate, estimated_gdp, flag_url, last_refreshed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            COUNTRY_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&country.name)
            .bind(&country.capital)
            .bind(&country.region)
            .bind(population_to_db(country.population)?)
            .bind(&country.currency_code)
            .bind(country.exchange_rate)
            .bind(country.estimated_gdp)
            .bind(&country.flag_url)
            .bind(country.last_refreshed_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::Duplicate { entity_type, .. } => StoreError::Duplicate {
                    entity_type,
                    id: country.name.clone(),
                },
                other => other,
            })?;

        let stored = parse_country_row(&row)?;
        debug!(id = stored.id, name = %stored.name, "Country inserted");
        Ok(stored)
    }

    async fn update(&self, id: CountryId, country: &MergedCountry) -> Result<Country, StoreError> {
        let sql = format!(
            r#"
            UPDATE countries SET
                capital = $2,
                region = $3,
                population = $4,
                currency_code = $5,
                exchange_rate = $6,
                estimated_gdp = $7,
                flag_url = $8,
                last_refreshed_at = $9
            WHERE id = $1
            RETURNING {}
            "#,
            COUNTRY_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&country.capital)
            .bind(&country.region)
            .bind(population_to_db(country.population)?)
            .bind(&country.currency_code)
            .bind(country.exchange_rate)
            .bind(country.estimated_gdp)
            .bind(&country.flag_url)
            .bind(country.last_refreshed_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("country", id.to_string()))?;

        parse_country_row(&row)
    }

    async fn delete_by_name(&self, name: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM countries WHERE LOWER(TRIM(name)) = LOWER($1)")
            .bind(name.trim())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn list(&self, query: &CountryQuery) -> Result<Vec<Country>, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM countries WHERE TRUE", COUNTRY_COLUMNS));

        if let Some(region) = &query.region {
            builder.push(" AND region = ").push_bind(region.clone());
        }
        if let Some(currency) = &query.currency {
            builder.push(" AND currency_code = ").push_bind(currency.clone());
        }
        match query.sort {
            Some(CountrySort::GdpDesc) => {
                builder.push(" ORDER BY estimated_gdp DESC NULLS LAST, id ASC")
            },
            None => builder.push(" ORDER BY id ASC"),
        };

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(parse_country_row).collect()
    }

    async fn top_by_gdp(&self, limit: usize) -> Result<Vec<Country>, StoreError> {
        let sql = format!(
            "SELECT {} FROM countries ORDER BY estimated_gdp DESC NULLS LAST, id ASC LIMIT $1",
            COUNTRY_COLUMNS
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        rows.iter().map(parse_country_row).collect()
    }

    async fn latest_refresh(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let latest: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(last_refreshed_at) FROM countries")
                .fetch_one(&self.pool)
                .await?;
        Ok(latest)
    }
}

impl Store for PgStore {
    fn countries(&self) -> &dyn CountryRepository {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(name: &str, gdp: Option<f64>) -> MergedCountry {
        MergedCountry {
            name: name.to_string(),
            capital: "Capital".to_string(),
            region: "Europe".to_string(),
            population: 1000,
            currency_code: "EUR".to_string(),
            exchange_rate: gdp.map(|_| 1.0),
            estimated_gdp: gdp,
            flag_url: String::new(),
            last_refreshed_at: Utc::now(),
        }
    }

    /// Run with: `cargo test -p orbis-store --features postgres`
    #[sqlx::test(migrations = "../migrations")]
    async fn test_upsert_cycle_is_case_insensitive(pool: PgPool) {
        let store = PgStore::new(pool);

        let created = store.create(&merged("France", Some(2.0))).await.unwrap();
        let found = store.find_by_name("FRANCE").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        let duplicate = store.create(&merged("france", None)).await;
        assert!(matches!(duplicate, Err(StoreError::Duplicate { .. })));

        let updated = store.update(created.id, &merged("france", None)).await.unwrap();
        assert_eq!(updated.name, "France");
        assert!(updated.estimated_gdp.is_none());

        assert_eq!(store.delete_by_name("FrAnCe").await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_padded_name_matches_trimmed_lookup(pool: PgPool) {
        let store = PgStore::new(pool);

        let created = store.create(&merged(" France ", Some(2.0))).await.unwrap();
        let found = store.find_by_name("france").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, " France ");

        let duplicate = store.create(&merged("FRANCE", None)).await;
        assert!(matches!(duplicate, Err(StoreError::Duplicate { .. })));

        assert_eq!(store.delete_by_name("France").await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_gdp_sort_puts_nulls_last(pool: PgPool) {
        let store = PgStore::new(pool);
        store.create(&merged("Unknown", None)).await.unwrap();
        store.create(&merged("Small", Some(1.0))).await.unwrap();
        store.create(&merged("Large", Some(10.0))).await.unwrap();

        let top = store.top_by_gdp(5).await.unwrap();
        let names: Vec<_> = top.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Large", "Small", "Unknown"]);

        assert!(store.latest_refresh().await.unwrap().is_some());
    }
}
