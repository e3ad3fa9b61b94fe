//! Partitioned table store: records addressed by (partition key, row key), paged partition scans.

mod memory;
mod postgres;

pub use memory::MemoryTableStore;
pub use postgres::{ensure_database_exists, PgTableStore};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

pub const PARTITION_KEY_FIELD: &str = "PartitionKey";
pub const ROW_KEY_FIELD: &str = "RowKey";
pub const TIMESTAMP_FIELD: &str = "Timestamp";
pub const ETAG_FIELD: &str = "etag";

/// Property names owned by the store; never persisted from a payload.
const RESERVED_FIELDS: &[&str] = &[PARTITION_KEY_FIELD, ROW_KEY_FIELD, TIMESTAMP_FIELD, ETAG_FIELD];

/// Largest page a single scan may return.
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Modules,
    Topics,
    Cards,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Modules, Table::Topics, Table::Cards];

    pub fn name(self) -> &'static str {
        match self {
            Table::Modules => "Modules",
            Table::Topics => "Topics",
            Table::Cards => "Cards",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("entity already exists in {table}: {partition_key}/{row_key}")]
    Conflict {
        table: Table,
        partition_key: String,
        row_key: String,
    },
    #[error("entity not found in {table}: {partition_key}/{row_key}")]
    NotFound {
        table: Table,
        partition_key: String,
        row_key: String,
    },
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt record in {table}: {message}")]
    Corrupt { table: Table, message: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A record as written: keys plus free-form properties.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEntity {
    pub partition_key: String,
    pub row_key: String,
    pub properties: Map<String, Value>,
}

impl NewEntity {
    /// Drops reserved property names so keys and metadata always come from the store.
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>, mut properties: Map<String, Value>) -> Self {
        for field in RESERVED_FIELDS {
            properties.remove(*field);
        }
        NewEntity {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties,
        }
    }
}

/// A stored record with server-assigned metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct TableEntity {
    pub partition_key: String,
    pub row_key: String,
    pub timestamp: DateTime<Utc>,
    pub etag: String,
    pub properties: Map<String, Value>,
}

impl TableEntity {
    pub(crate) fn stamped(entity: NewEntity) -> Self {
        TableEntity {
            partition_key: entity.partition_key,
            row_key: entity.row_key,
            timestamp: Utc::now(),
            etag: new_etag(),
            properties: entity.properties,
        }
    }
}

/// Serialized flat, the way table rows come back to callers: properties plus key and metadata fields.
impl Serialize for TableEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len() + RESERVED_FIELDS.len()))?;
        map.serialize_entry(PARTITION_KEY_FIELD, &self.partition_key)?;
        map.serialize_entry(ROW_KEY_FIELD, &self.row_key)?;
        map.serialize_entry(
            TIMESTAMP_FIELD,
            &self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        )?;
        map.serialize_entry(ETAG_FIELD, &self.etag)?;
        for (k, v) in &self.properties {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

pub(crate) fn new_etag() -> String {
    format!("W/\"{}\"", uuid::Uuid::new_v4())
}

/// Resume point of a partition scan. Either marker may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken {
    #[serde(rename = "PartitionKey", default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(rename = "RowKey", default, skip_serializing_if = "Option::is_none")]
    pub row_key: Option<String>,
}

/// One page of a partition scan and the low-level markers of the first record not returned.
#[derive(Clone, Debug, Default)]
pub struct EntityPage {
    pub entities: Vec<TableEntity>,
    pub next_partition_key: Option<String>,
    pub next_row_key: Option<String>,
}

/// Where a scan of `partition` starts given an optional resume token.
/// Returns None when the token points past the partition (nothing left to read).
pub(crate) fn scan_start_row(partition: &str, start: Option<&ContinuationToken>) -> Option<String> {
    let Some(token) = start else {
        return Some(String::new());
    };
    match token.partition_key.as_deref() {
        Some(pk) if pk > partition => None,
        Some(pk) if pk < partition => Some(String::new()),
        _ => Some(token.row_key.clone().unwrap_or_default()),
    }
}

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Insert a new record. Fails with `StoreError::Conflict` if the key exists.
    async fn create_entity(&self, table: Table, entity: NewEntity) -> Result<TableEntity, StoreError>;

    async fn get_entity(
        &self,
        table: Table,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, StoreError>;

    /// Replace all properties of an existing record. Fails with `StoreError::NotFound` if absent.
    async fn update_entity(&self, table: Table, entity: NewEntity) -> Result<TableEntity, StoreError>;

    /// Fails with `StoreError::NotFound` if absent.
    async fn delete_entity(&self, table: Table, partition_key: &str, row_key: &str) -> Result<(), StoreError>;

    /// Records of one partition in ascending row key order, starting at `start`.
    async fn query_partition(
        &self,
        table: Table,
        partition_key: &str,
        page_size: u32,
        start: Option<&ContinuationToken>,
    ) -> Result<EntityPage, StoreError>;

    /// Cheap liveness check for readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;
}
