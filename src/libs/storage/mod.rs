/*!
 * Collection-based record storage. Two backends share the same contract:
 * SQLite when it can be opened, a single JSON blob otherwise. The choice is
 * made once by `Storage::open` and callers never look at it again.
 */
pub mod fallback;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use strum::Display;

use crate::libs::config::Config;
use crate::libs::error::AnyResult;

pub use fallback::{FallbackBackend, LocalStore};
pub use schema::*;
pub use sqlite::SqliteBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BackendKind {
    #[strum(serialize = "sqlite")]
    Sqlite,
    #[strum(serialize = "fallback")]
    Fallback,
}

#[async_trait]
pub trait StorageBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Create collections and their indices, a no-op when they already exist
    async fn create_collections(&mut self) -> AnyResult<()>;

    async fn get(&mut self, collection: &CollectionSchema, key: &str) -> AnyResult<Option<Value>>;

    async fn get_all(&mut self, collection: &CollectionSchema) -> AnyResult<Vec<Value>>;

    /// All records sorted on indexed fields, optionally truncated to `limit`
    async fn get_all_ordered(
        &mut self,
        collection: &CollectionSchema,
        order: &[OrderBy],
        limit: Option<usize>,
    ) -> AnyResult<Vec<Value>>;

    async fn count(&mut self, collection: &CollectionSchema) -> AnyResult<usize>;

    /// Insert or replace, keyed by the collection's key path
    async fn put(&mut self, collection: &CollectionSchema, record: Value) -> AnyResult<()>;

    async fn delete(&mut self, collection: &CollectionSchema, key: &str) -> AnyResult<()>;

    async fn clear(&mut self, collection: &CollectionSchema) -> AnyResult<()>;

    /// Empty `cleared` and upsert `record` into `collection` as one unit:
    /// either both writes land or none does.
    async fn clear_and_put(
        &mut self,
        cleared: &CollectionSchema,
        collection: &CollectionSchema,
        record: Value,
    ) -> AnyResult<()>;
}

/**
 * The storage selected at startup
 */
pub enum Storage {
    Sqlite(SqliteBackend),
    Fallback(FallbackBackend),
}

impl Storage {
    /// Probe SQLite, and fall back to the single-blob store if it can't be used
    pub async fn open(config: &Config) -> AnyResult<Storage> {
        if config.force_fallback {
            info!("Fallback storage forced by config");
            return Storage::open_fallback(config).await;
        }

        match SqliteBackend::open(&config.database_path()).await {
            Ok(backend) => Ok(Storage::Sqlite(backend)),
            Err(err) => {
                warn!(
                    "SQLite storage unavailable ({}), falling back to {:?}",
                    err,
                    config.fallback_path()
                );
                Storage::open_fallback(config).await
            }
        }
    }

    async fn open_fallback(config: &Config) -> AnyResult<Storage> {
        let mut backend = FallbackBackend::open(&config.fallback_path()).await?;
        backend.create_collections().await?;
        Ok(Storage::Fallback(backend))
    }

    fn backend(&mut self) -> &mut dyn StorageBackend {
        match self {
            Storage::Sqlite(backend) => backend,
            Storage::Fallback(backend) => backend,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Storage::Fallback(_))
    }

    pub async fn get_as<R: DeserializeOwned>(
        &mut self,
        collection: &CollectionSchema,
        key: &str,
    ) -> AnyResult<Option<R>> {
        match self.get(collection, key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn get_all_as<R: DeserializeOwned>(
        &mut self,
        collection: &CollectionSchema,
    ) -> AnyResult<Vec<R>> {
        let values = self.get_all(collection).await?;
        decode_all(values)
    }

    pub async fn get_all_ordered_as<R: DeserializeOwned>(
        &mut self,
        collection: &CollectionSchema,
        order: &[OrderBy],
        limit: Option<usize>,
    ) -> AnyResult<Vec<R>> {
        let values = self.get_all_ordered(collection, order, limit).await?;
        decode_all(values)
    }

    pub async fn put_as<R: Serialize>(
        &mut self,
        collection: &CollectionSchema,
        record: &R,
    ) -> AnyResult<()> {
        let value = serde_json::to_value(record)?;
        self.put(collection, value).await
    }
}

fn decode_all<R: DeserializeOwned>(values: Vec<Value>) -> AnyResult<Vec<R>> {
    values
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(Into::into))
        .collect()
}

#[async_trait]
impl StorageBackend for Storage {
    fn kind(&self) -> BackendKind {
        match self {
            Storage::Sqlite(backend) => backend.kind(),
            Storage::Fallback(backend) => backend.kind(),
        }
    }

    async fn create_collections(&mut self) -> AnyResult<()> {
        self.backend().create_collections().await
    }

    async fn get(&mut self, collection: &CollectionSchema, key: &str) -> AnyResult<Option<Value>> {
        self.backend().get(collection, key).await
    }

    async fn get_all(&mut self, collection: &CollectionSchema) -> AnyResult<Vec<Value>> {
        self.backend().get_all(collection).await
    }

    async fn get_all_ordered(
        &mut self,
        collection: &CollectionSchema,
        order: &[OrderBy],
        limit: Option<usize>,
    ) -> AnyResult<Vec<Value>> {
        self.backend().get_all_ordered(collection, order, limit).await
    }

    async fn count(&mut self, collection: &CollectionSchema) -> AnyResult<usize> {
        self.backend().count(collection).await
    }

    async fn put(&mut self, collection: &CollectionSchema, record: Value) -> AnyResult<()> {
        self.backend().put(collection, record).await
    }

    async fn delete(&mut self, collection: &CollectionSchema, key: &str) -> AnyResult<()> {
        self.backend().delete(collection, key).await
    }

    async fn clear(&mut self, collection: &CollectionSchema) -> AnyResult<()> {
        self.backend().clear(collection).await
    }

    async fn clear_and_put(
        &mut self,
        cleared: &CollectionSchema,
        collection: &CollectionSchema,
        record: Value,
    ) -> AnyResult<()> {
        self.backend()
            .clear_and_put(cleared, collection, record)
            .await
    }
}
