use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;

use crate::libs::constants::{LEGACY_USER_DATA_KEY, USER_DATA_KEY};
use crate::libs::error::{AnyResult, ReddensError};
use crate::libs::user_state::{LegacyUserData, UserState};

use super::schema::{compare_records, CollectionName, CollectionSchema, OrderBy};
use super::{BackendKind, StorageBackend};

const SETTING_ITEM_PREFIX: &str = "reddensSetting.";

/// "local_storage.json" is backed up as "local_storage.json.corrupted"
pub fn backup_path(path: &Path) -> PathBuf {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".corrupted");
    PathBuf::from(backup)
}

/**
 * A string-to-string map persisted as one JSON file, the moral equivalent of
 * the browser's localStorage.
 */
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl LocalStore {
    /// Read the file if it exists. An unreadable file is treated as empty, and
    /// a copy of it is kept next to it since the next write replaces it.
    pub async fn open(path: &Path) -> AnyResult<Self> {
        let items = match tokio::fs::read_to_string(path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(items) => items,
                Err(err) => {
                    let backup = backup_path(path);
                    warn!(
                        "Ignoring corrupted local store {:?} ({}), copied to {:?}",
                        path, err, backup
                    );
                    tokio::fs::write(&backup, raw).await?;
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(LocalStore {
            path: path.to_path_buf(),
            items,
        })
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub async fn set_item(&mut self, key: &str, value: String) -> AnyResult<()> {
        self.items.insert(key.to_owned(), value);
        self.persist().await
    }

    pub async fn remove_item(&mut self, key: &str) -> AnyResult<()> {
        if self.items.remove(key).is_some() {
            self.persist().await?;
        }
        Ok(())
    }

    fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.items.keys().filter(move |key| key.starts_with(prefix))
    }

    async fn persist(&self) -> AnyResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string(&self.items)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }

    /// The legacy user blob, if one was ever written
    pub fn legacy_user_data(&self) -> AnyResult<Option<LegacyUserData>> {
        match self.get_item(LEGACY_USER_DATA_KEY) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }
}

/**
 * Fallback storage, used when SQLite can't be opened. It only knows how to
 * keep the user record (as the legacy blob) and settings. Play statistics are
 * not available: reads come back empty and writes are dropped.
 */
pub struct FallbackBackend {
    local: LocalStore,
}

impl FallbackBackend {
    pub async fn open(path: &Path) -> AnyResult<Self> {
        info!("Using fallback storage at {:?}", path);
        let local = LocalStore::open(path).await?;
        Ok(FallbackBackend { local })
    }

    pub fn local_store(&self) -> &LocalStore {
        &self.local
    }

    fn user_record(&self) -> AnyResult<Option<Value>> {
        match self.local.legacy_user_data()? {
            Some(blob) => {
                let state = blob.into_user_state(None);
                Ok(Some(serde_json::to_value(state)?))
            }
            None => Ok(None),
        }
    }

    fn setting_item_key(key: &str) -> String {
        format!("{}{}", SETTING_ITEM_PREFIX, key)
    }

    fn settings(&self) -> AnyResult<Vec<Value>> {
        self.local
            .keys_with_prefix(SETTING_ITEM_PREFIX)
            .filter_map(|key| self.local.get_item(key))
            .map(|raw| serde_json::from_str(raw).map_err(Into::into))
            .collect()
    }
}

fn only_user_key(key: &str) -> AnyResult<()> {
    if key == USER_DATA_KEY {
        Ok(())
    } else {
        Err(ReddensError::StorageUnavailable(format!(
            "fallback storage only holds the \"{}\" user record, not \"{}\"",
            USER_DATA_KEY, key
        )))
    }
}

#[async_trait]
impl StorageBackend for FallbackBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    async fn create_collections(&mut self) -> AnyResult<()> {
        // Nothing to create, the blob appears on first write
        Ok(())
    }

    async fn get(&mut self, collection: &CollectionSchema, key: &str) -> AnyResult<Option<Value>> {
        match collection.name {
            CollectionName::UserData if key == USER_DATA_KEY => self.user_record(),
            CollectionName::UserData | CollectionName::PlayStats => Ok(None),
            CollectionName::Settings => match self.local.get_item(&Self::setting_item_key(key)) {
                Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
                None => Ok(None),
            },
        }
    }

    async fn get_all(&mut self, collection: &CollectionSchema) -> AnyResult<Vec<Value>> {
        match collection.name {
            CollectionName::UserData => Ok(self.user_record()?.into_iter().collect()),
            CollectionName::PlayStats => Ok(Vec::new()),
            CollectionName::Settings => self.settings(),
        }
    }

    async fn get_all_ordered(
        &mut self,
        collection: &CollectionSchema,
        order: &[OrderBy],
        limit: Option<usize>,
    ) -> AnyResult<Vec<Value>> {
        // No indices here, sort in memory
        let mut records = self.get_all(collection).await?;
        records.sort_by(|a, b| compare_records(order, a, b));
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn count(&mut self, collection: &CollectionSchema) -> AnyResult<usize> {
        Ok(self.get_all(collection).await?.len())
    }

    async fn put(&mut self, collection: &CollectionSchema, record: Value) -> AnyResult<()> {
        let key = collection.key_of(&record)?;

        match collection.name {
            CollectionName::UserData => {
                only_user_key(&key)?;
                let state: UserState = serde_json::from_value(record)?;
                let blob = serde_json::to_string(&LegacyUserData::from(state))?;
                self.local.set_item(LEGACY_USER_DATA_KEY, blob).await
            }
            CollectionName::PlayStats => {
                debug!("Play stats unavailable in fallback storage, dropped record {}", key);
                Ok(())
            }
            CollectionName::Settings => {
                let raw = serde_json::to_string(&record)?;
                self.local.set_item(&Self::setting_item_key(&key), raw).await
            }
        }
    }

    async fn delete(&mut self, collection: &CollectionSchema, key: &str) -> AnyResult<()> {
        match collection.name {
            CollectionName::UserData if key == USER_DATA_KEY => {
                self.local.remove_item(LEGACY_USER_DATA_KEY).await
            }
            CollectionName::UserData | CollectionName::PlayStats => Ok(()),
            CollectionName::Settings => self.local.remove_item(&Self::setting_item_key(key)).await,
        }
    }

    async fn clear(&mut self, collection: &CollectionSchema) -> AnyResult<()> {
        match collection.name {
            CollectionName::UserData => self.local.remove_item(LEGACY_USER_DATA_KEY).await,
            CollectionName::PlayStats => Ok(()),
            CollectionName::Settings => {
                let keys: Vec<String> = self
                    .local
                    .keys_with_prefix(SETTING_ITEM_PREFIX)
                    .cloned()
                    .collect();
                for key in keys {
                    self.local.remove_item(&key).await?;
                }
                Ok(())
            }
        }
    }

    async fn clear_and_put(
        &mut self,
        cleared: &CollectionSchema,
        collection: &CollectionSchema,
        record: Value,
    ) -> AnyResult<()> {
        // Validate before touching anything so a bad record leaves both collections alone
        collection.key_of(&record)?;
        self.clear(cleared).await?;
        self.put(collection, record).await
    }
}
