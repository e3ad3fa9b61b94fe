//! PostgreSQL-backed table store. One table per entity kind in the schema from `TABLE_SCHEMA` (default `vocard`),
//! keyed by (partition_key, row_key) with all other fields in a JSONB `properties` column.

use super::{
    new_etag, scan_start_row, ContinuationToken, EntityPage, NewEntity, StoreError, Table, TableEntity,
    TableStore, MAX_PAGE_SIZE,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

type EntityRow = (String, String, Value, String, DateTime<Utc>);

const RETURNING: &str = "RETURNING partition_key, row_key, properties, etag, updated_at";

#[derive(Clone)]
pub struct PgTableStore {
    pool: PgPool,
    schema: String,
}

impl PgTableStore {
    /// Create the database if needed, open a pool and ensure the entity tables exist.
    pub async fn connect(database_url: &str, schema: &str, max_connections: u32) -> Result<Self, StoreError> {
        ensure_database_exists(database_url).await?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = PgTableStore::new(pool, schema);
        store.ensure_tables().await?;
        Ok(store)
    }

    pub fn new(pool: PgPool, schema: &str) -> Self {
        PgTableStore {
            pool,
            schema: schema.to_string(),
        }
    }

    fn qualified(&self, table: Table) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(table.name()))
    }

    /// Create the schema and the Modules/Topics/Cards tables if missing. Keys use the "C" collation so
    /// scans follow byte order regardless of the database locale.
    pub async fn ensure_tables(&self) -> Result<(), StoreError> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(&self.schema)))
            .execute(&self.pool)
            .await?;
        for table in Table::ALL {
            let ddl = format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    partition_key TEXT COLLATE "C" NOT NULL,
                    row_key TEXT COLLATE "C" NOT NULL,
                    properties JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                    etag TEXT NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    PRIMARY KEY (partition_key, row_key)
                )
                "#,
                self.qualified(table)
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    fn row_to_entity(table: Table, row: EntityRow) -> Result<TableEntity, StoreError> {
        let (partition_key, row_key, properties, etag, timestamp) = row;
        let properties = match properties {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Corrupt {
                    table,
                    message: format!("properties of {}/{} is not an object: {}", partition_key, row_key, other),
                })
            }
        };
        Ok(TableEntity {
            partition_key,
            row_key,
            timestamp,
            etag,
            properties,
        })
    }
}

#[async_trait]
impl TableStore for PgTableStore {
    async fn create_entity(&self, table: Table, entity: NewEntity) -> Result<TableEntity, StoreError> {
        let NewEntity {
            partition_key,
            row_key,
            properties,
        } = entity;
        let sql = format!(
            "INSERT INTO {} (partition_key, row_key, properties, etag, updated_at) VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (partition_key, row_key) DO NOTHING {}",
            self.qualified(table),
            RETURNING
        );
        tracing::debug!(sql = %sql, %partition_key, %row_key, "insert");
        let row: Option<EntityRow> = sqlx::query_as(&sql)
            .bind(&partition_key)
            .bind(&row_key)
            .bind(Value::Object(properties))
            .bind(new_etag())
            .fetch_optional(&self.pool)
            .await?;
        inserted_or_conflict(table, partition_key, row_key, row)
    }

    async fn get_entity(
        &self,
        table: Table,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, StoreError> {
        let sql = format!(
            "SELECT partition_key, row_key, properties, etag, updated_at FROM {} WHERE partition_key = $1 AND row_key = $2",
            self.qualified(table)
        );
        tracing::debug!(sql = %sql, %partition_key, %row_key, "select");
        let row: Option<EntityRow> = sqlx::query_as(&sql)
            .bind(partition_key)
            .bind(row_key)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::row_to_entity(table, r)).transpose()
    }

    async fn update_entity(&self, table: Table, entity: NewEntity) -> Result<TableEntity, StoreError> {
        let NewEntity {
            partition_key,
            row_key,
            properties,
        } = entity;
        let sql = format!(
            "UPDATE {} SET properties = $3, etag = $4, updated_at = NOW() WHERE partition_key = $1 AND row_key = $2 {}",
            self.qualified(table),
            RETURNING
        );
        tracing::debug!(sql = %sql, %partition_key, %row_key, "update");
        let row: Option<EntityRow> = sqlx::query_as(&sql)
            .bind(&partition_key)
            .bind(&row_key)
            .bind(Value::Object(properties))
            .bind(new_etag())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Self::row_to_entity(table, row),
            None => Err(StoreError::NotFound {
                table,
                partition_key,
                row_key,
            }),
        }
    }

    async fn delete_entity(&self, table: Table, partition_key: &str, row_key: &str) -> Result<(), StoreError> {
        let sql = format!(
            "DELETE FROM {} WHERE partition_key = $1 AND row_key = $2",
            self.qualified(table)
        );
        tracing::debug!(sql = %sql, %partition_key, %row_key, "delete");
        let result = sqlx::query(&sql)
            .bind(partition_key)
            .bind(row_key)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                table,
                partition_key: partition_key.to_string(),
                row_key: row_key.to_string(),
            });
        }
        Ok(())
    }

    async fn query_partition(
        &self,
        table: Table,
        partition_key: &str,
        page_size: u32,
        start: Option<&ContinuationToken>,
    ) -> Result<EntityPage, StoreError> {
        let Some(start_row) = scan_start_row(partition_key, start) else {
            return Ok(EntityPage::default());
        };
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        // One extra row tells us where the next page starts.
        let sql = format!(
            "SELECT partition_key, row_key, properties, etag, updated_at FROM {} \
             WHERE partition_key = $1 AND row_key >= $2 ORDER BY row_key LIMIT $3",
            self.qualified(table)
        );
        tracing::debug!(sql = %sql, %partition_key, %start_row, page_size, "scan");
        let rows: Vec<EntityRow> = sqlx::query_as(&sql)
            .bind(partition_key)
            .bind(&start_row)
            .bind(i64::from(page_size) + 1)
            .fetch_all(&self.pool)
            .await?;

        let entities = rows
            .into_iter()
            .map(|r| Self::row_to_entity(table, r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(split_overfetch(entities, page_size))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// `INSERT .. ON CONFLICT DO NOTHING RETURNING ..` yields no row when the key was already taken.
fn inserted_or_conflict(
    table: Table,
    partition_key: String,
    row_key: String,
    row: Option<EntityRow>,
) -> Result<TableEntity, StoreError> {
    match row {
        Some(row) => PgTableStore::row_to_entity(table, row),
        None => Err(StoreError::Conflict {
            table,
            partition_key,
            row_key,
        }),
    }
}

/// Scans fetch `page_size + 1` rows; the extra row, if any, is not returned and its keys
/// become the next-page markers.
fn split_overfetch(mut entities: Vec<TableEntity>, page_size: u32) -> EntityPage {
    let next = if entities.len() > page_size as usize {
        entities.truncate(page_size as usize + 1);
        entities.pop()
    } else {
        None
    };
    EntityPage {
        entities,
        next_partition_key: next.as_ref().map(|e| e.partition_key.clone()),
        next_row_key: next.map(|e| e.row_key),
    }
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = PgConnectOptions::from_str(&admin_url)
        .map_err(|e| StoreError::Unavailable(format!("invalid connection string: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), StoreError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| StoreError::Unavailable("connection string has no database path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
