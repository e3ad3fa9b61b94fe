//! Generic entity CRUD over the table store: validate, derive keys, single point writes.

use crate::error::AppError;
use crate::model::Entity;
use crate::service::pagination::{Page, PageRequest};
use crate::service::validation::RequestValidator;
use crate::store::{NewEntity, StoreError, TableEntity, TableStore};
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

pub struct EntityService<E> {
    store: Arc<dyn TableStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        EntityService {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> EntityService<E> {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        EntityService {
            store,
            _entity: PhantomData,
        }
    }

    /// Validate, derive the key and insert. An existing record at the key is a conflict.
    pub async fn create(&self, fields: Map<String, Value>) -> Result<TableEntity, AppError> {
        RequestValidator::validate(&fields, &E::SCHEMA)?;
        let entity = Self::typed(fields)?;
        let key = entity.derive_key();
        let properties = entity.into_properties()?;
        let stored = self
            .store
            .create_entity(E::TABLE, NewEntity::new(key.partition_key, key.row_key, properties))
            .await
            .map_err(|e| match e {
                conflict @ StoreError::Conflict { .. } => AppError::Conflict(conflict.to_string()),
                other => AppError::Store(other),
            })?;
        tracing::info!(
            table = %E::TABLE,
            partition_key = %stored.partition_key,
            row_key = %stored.row_key,
            "created"
        );
        Ok(stored)
    }

    /// One page of the records stored under `partition_key`, in row key order.
    pub async fn list_partition(&self, partition_key: &str, request: &PageRequest) -> Result<Page, AppError> {
        let page = self
            .store
            .query_partition(
                E::TABLE,
                partition_key,
                request.page_size,
                request.continuation.as_ref(),
            )
            .await?;
        Ok(page.into())
    }

    /// Replace the non-key fields of an existing record.
    /// The existence check and the write are separate store calls; a record removed in between
    /// surfaces as an internal error.
    pub async fn update(
        &self,
        partition_key: &str,
        row_key: &str,
        fields: Map<String, Value>,
    ) -> Result<TableEntity, AppError> {
        self.update_with(partition_key, row_key, || Ok(fields)).await
    }

    /// Like `update`, but the payload is only produced once the record is known to exist,
    /// so a missing record is reported before anything about the body.
    pub async fn update_with<F>(&self, partition_key: &str, row_key: &str, fields: F) -> Result<TableEntity, AppError>
    where
        F: FnOnce() -> Result<Map<String, Value>, AppError>,
    {
        let existing = self.require_existing(partition_key, row_key).await?;
        tracing::debug!(table = %E::TABLE, existing = ?existing.properties, "replacing");
        let fields = fields()?;
        RequestValidator::validate(&fields, &E::SCHEMA)?;
        let entity = Self::typed(fields)?;
        entity.check_update(row_key)?;
        let properties = entity.into_properties()?;
        let stored = self
            .store
            .update_entity(E::TABLE, NewEntity::new(partition_key, row_key, properties))
            .await
            .map_err(|e| {
                tracing::warn!(table = %E::TABLE, %partition_key, %row_key, error = %e, "update failed");
                AppError::Internal(e.to_string())
            })?;
        tracing::info!(table = %E::TABLE, %partition_key, %row_key, "updated");
        Ok(stored)
    }

    pub async fn delete(&self, partition_key: &str, row_key: &str) -> Result<(), AppError> {
        self.require_existing(partition_key, row_key).await?;
        self.store
            .delete_entity(E::TABLE, partition_key, row_key)
            .await
            .map_err(|e| {
                tracing::warn!(table = %E::TABLE, %partition_key, %row_key, error = %e, "delete failed");
                AppError::Internal(e.to_string())
            })?;
        tracing::info!(table = %E::TABLE, %partition_key, %row_key, "deleted");
        Ok(())
    }

    async fn require_existing(&self, partition_key: &str, row_key: &str) -> Result<TableEntity, AppError> {
        self.store
            .get_entity(E::TABLE, partition_key, row_key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}/{}", E::TABLE, partition_key, row_key)))
    }

    fn typed(fields: Map<String, Value>) -> Result<E, AppError> {
        serde_json::from_value(Value::Object(fields)).map_err(|e| AppError::Validation(e.to_string()))
    }
}
