//! Schema management for the Orbis `countries` store.
//!
//! `migrate` applies the embedded migrations from the workspace `migrations`
//! directory. `status` inspects what has been applied so the `db status`
//! command can report it.

use sqlx::{PgPool, Row};
use tracing::{info, warn};

/// Result type for DB operations.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Postgres code for a missing relation.
const UNDEFINED_TABLE: &str = "42P01";

/// Apply every pending migration. Already-applied ones are skipped.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Applying countries schema migrations");
    sqlx::migrate!("../migrations").run(pool).await?;
    info!("Schema is up to date");
    Ok(())
}

/// One row of the sqlx migration ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub installed_on: Option<String>,
    pub success: bool,
}

/// What `status` found in the database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaStatus {
    /// Newest first
    pub migrations: Vec<AppliedMigration>,
    /// `None` when the countries table could not be read
    pub countries: Option<i64>,
}

impl SchemaStatus {
    /// At least one migration ran and none failed.
    pub fn is_migrated(&self) -> bool {
        !self.migrations.is_empty() && self.migrations.iter().all(|m| m.success)
    }

    /// Log the status in the `db status` format.
    pub fn log(&self) {
        if self.migrations.is_empty() {
            warn!("No migrations applied (run `orbisd db migrate` first)");
            return;
        }

        for migration in &self.migrations {
            info!(
                version = migration.version,
                description = %migration.description,
                installed_on = migration.installed_on.as_deref().unwrap_or("N/A"),
                success = migration.success,
                "Migration"
            );
        }
        match self.countries {
            Some(count) => info!(count, "Stored countries"),
            None => warn!("countries table not readable"),
        }
    }
}

/// Check connectivity, then read the migration ledger and the country count.
pub async fn status(pool: &PgPool) -> Result<SchemaStatus> {
    let ping: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    if ping != 1 {
        return Err(anyhow::anyhow!("Database connectivity check failed"));
    }
    info!("Database connectivity: OK");

    let rows = sqlx::query(
        r#"
        SELECT version, description, installed_on::text AS installed_on, success
        FROM _sqlx_migrations
        ORDER BY version DESC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await;

    let rows = match rows {
        Ok(rows) => rows,
        Err(e) if is_undefined_table(&e) => return Ok(SchemaStatus::default()),
        Err(e) => return Err(e.into()),
    };

    let migrations = rows
        .iter()
        .map(|row| {
            Ok(AppliedMigration {
                version: row.try_get("version")?,
                description: row.try_get("description")?,
                installed_on: row.try_get("installed_on")?,
                success: row.try_get::<Option<bool>, _>("success")?.unwrap_or(true),
            })
        })
        .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

    let countries = match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM countries")
        .fetch_one(pool)
        .await
    {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(error = %e, "Counting countries failed");
            None
        },
    };

    Ok(SchemaStatus {
        migrations,
        countries,
    })
}

fn is_undefined_table(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNDEFINED_TABLE)
}
