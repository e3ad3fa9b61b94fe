//! In-process table store: one ordered map per table. Used by tests and `STORAGE_CONNECTION_STRING=memory`.

use super::{
    scan_start_row, ContinuationToken, EntityPage, NewEntity, StoreError, Table, TableEntity, TableStore,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

type Rows = BTreeMap<(String, String), TableEntity>;

#[derive(Default)]
pub struct MemoryTableStore {
    tables: RwLock<HashMap<Table, Rows>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_err() -> StoreError {
        StoreError::Unavailable("memory store lock poisoned".into())
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn create_entity(&self, table: Table, entity: NewEntity) -> Result<TableEntity, StoreError> {
        let mut tables = self.tables.write().map_err(|_| Self::lock_err())?;
        let rows = tables.entry(table).or_default();
        let key = (entity.partition_key.clone(), entity.row_key.clone());
        if rows.contains_key(&key) {
            return Err(StoreError::Conflict {
                table,
                partition_key: key.0,
                row_key: key.1,
            });
        }
        let stored = TableEntity::stamped(entity);
        rows.insert(key, stored.clone());
        Ok(stored)
    }

    async fn get_entity(
        &self,
        table: Table,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableEntity>, StoreError> {
        let tables = self.tables.read().map_err(|_| Self::lock_err())?;
        Ok(tables
            .get(&table)
            .and_then(|rows| rows.get(&(partition_key.to_string(), row_key.to_string())))
            .cloned())
    }

    async fn update_entity(&self, table: Table, entity: NewEntity) -> Result<TableEntity, StoreError> {
        let mut tables = self.tables.write().map_err(|_| Self::lock_err())?;
        let key = (entity.partition_key.clone(), entity.row_key.clone());
        let slot = tables
            .get_mut(&table)
            .and_then(|rows| rows.get_mut(&key))
            .ok_or_else(|| StoreError::NotFound {
                table,
                partition_key: key.0.clone(),
                row_key: key.1.clone(),
            })?;
        *slot = TableEntity::stamped(entity);
        Ok(slot.clone())
    }

    async fn delete_entity(&self, table: Table, partition_key: &str, row_key: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| Self::lock_err())?;
        let removed = tables
            .get_mut(&table)
            .and_then(|rows| rows.remove(&(partition_key.to_string(), row_key.to_string())));
        match removed {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                table,
                partition_key: partition_key.to_string(),
                row_key: row_key.to_string(),
            }),
        }
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
        let tables = self.tables.read().map_err(|_| Self::lock_err())?;
        let Some(rows) = tables.get(&table) else {
            return Ok(EntityPage::default());
        };
        let mut matching = rows
            .range((partition_key.to_string(), start_row)..)
            .take_while(|((pk, _), _)| pk == partition_key)
            .map(|(_, e)| e);

        let entities: Vec<TableEntity> = matching.by_ref().take(page_size as usize).cloned().collect();
        let next = matching.next();
        Ok(EntityPage {
            entities,
            next_partition_key: next.map(|e| e.partition_key.clone()),
            next_row_key: next.map(|e| e.row_key.clone()),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.tables.read().map(|_| ()).map_err(|_| Self::lock_err())
    }
}
