//! Embedded schema: creation and validation.

use serde::Serialize;

use crate::db::DbPool;
use crate::error::AppResult;

/// Schema holding every Tripdesk table.
pub const SCHEMA_NAME: &str = "tripdesk";

/// Idempotent DDL for the whole schema.
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Tables the service expects to find.
pub const REQUIRED_TABLES: [&str; 7] = [
    "agencies",
    "contacts",
    "trips",
    "trip_travelers",
    "itinerary_days",
    "activities",
    "bookings",
];

/// Outcome of a schema operation.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub status: String,
    pub message: String,
    pub valid: bool,
    pub tables: Vec<String>,
    pub missing: Vec<String>,
}

impl SchemaReport {
    fn from_tables(tables: Vec<String>) -> Self {
        let missing = missing_tables(&tables);
        let valid = missing.is_empty();
        Self {
            status: "ok".to_string(),
            message: if valid {
                "Database schema is valid".to_string()
            } else {
                format!("Missing tables: {}", missing.join(", "))
            },
            valid,
            tables,
            missing,
        }
    }
}

fn missing_tables(existing: &[String]) -> Vec<String> {
    REQUIRED_TABLES
        .iter()
        .filter(|t| !existing.iter().any(|e| e == *t))
        .map(|t| t.to_string())
        .collect()
}

async fn existing_tables(pool: &DbPool) -> AppResult<Vec<String>> {
    let mut tables: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables WHERE table_schema = $1",
    )
    .bind(SCHEMA_NAME)
    .fetch_all(pool)
    .await?;
    tables.sort();
    Ok(tables)
}

/// Apply the embedded DDL and report the resulting tables.
pub async fn init_schema(pool: &DbPool) -> AppResult<SchemaReport> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    tracing::info!(schema = SCHEMA_NAME, "Database schema applied");

    let mut report = SchemaReport::from_tables(existing_tables(pool).await?);
    if report.valid {
        report.message = format!("Schema '{}' is initialized", SCHEMA_NAME);
    }
    Ok(report)
}

/// Check that every required table exists.
pub async fn validate_schema(pool: &DbPool) -> AppResult<SchemaReport> {
    Ok(SchemaReport::from_tables(existing_tables(pool).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_sql_creates_required_tables() {
        for table in REQUIRED_TABLES {
            let ddl = format!("CREATE TABLE IF NOT EXISTS tripdesk.{} (", table);
            assert!(SCHEMA_SQL.contains(&ddl), "missing DDL for {}", table);
        }
    }

    #[test]
    fn test_report_lists_missing_tables() {
        let report = SchemaReport::from_tables(vec!["agencies".to_string(), "trips".to_string()]);
        assert!(!report.valid);
        assert!(report.missing.contains(&"bookings".to_string()));
        assert!(!report.missing.contains(&"trips".to_string()));
    }

    #[test]
    fn test_report_valid_when_complete() {
        let tables = REQUIRED_TABLES.iter().map(|t| t.to_string()).collect();
        let report = SchemaReport::from_tables(tables);
        assert!(report.valid);
        assert_eq!(report.message, "Database schema is valid");
    }
}
