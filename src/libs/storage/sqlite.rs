use std::path::Path;

use async_trait::async_trait;
use log::{debug, info};
use ormlite::sqlite::{SqliteConnectOptions, SqliteConnection};
use ormlite::Connection;
use serde_json::Value;

use crate::libs::error::{AnyResult, ReddensError};
use crate::libs::utils::TimeLogger;

use super::schema::{CollectionSchema, OrderBy, ALL_COLLECTIONS};
use super::{BackendKind, StorageBackend};

/**
 * Primary storage: one SQLite table per collection. Records are kept as JSON
 * documents next to their key, secondary indices are expression indices on
 * the document fields.
 */
pub struct SqliteBackend {
    pub connection: SqliteConnection,
}

impl SqliteBackend {
    /// Open (or create) the database file and make sure every collection exists
    pub async fn open(database_path: &Path) -> AnyResult<Self> {
        if let Some(parent) = database_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!("Opening connection to database: {:?}", database_path);

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .optimize_on_close(true, None)
            .auto_vacuum(ormlite::sqlite::SqliteAutoVacuum::Incremental)
            .journal_mode(ormlite::sqlite::SqliteJournalMode::Wal);

        let connection = SqliteConnection::connect_with(&options)
            .await
            .map_err(|err| ReddensError::StorageUnavailable(err.to_string()))?;

        let mut backend = SqliteBackend { connection };
        backend.create_collections().await?;

        Ok(backend)
    }
}

fn json_field(key_path: &str) -> String {
    format!("json_extract(body, '$.{}')", key_path)
}

fn order_clause(order: &[OrderBy]) -> String {
    if order.is_empty() {
        return "rowid ASC".to_owned();
    }

    order
        .iter()
        .map(|o| format!("{} {}", json_field(o.key_path), o.direction.as_sql()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn decode_rows(rows: Vec<(String,)>) -> AnyResult<Vec<Value>> {
    rows.into_iter()
        .map(|(body,)| serde_json::from_str(&body).map_err(Into::into))
        .collect()
}

async fn upsert(
    connection: &mut SqliteConnection,
    collection: &CollectionSchema,
    record: &Value,
) -> AnyResult<()> {
    let key = collection.key_of(record)?;
    let body = serde_json::to_string(record)?;
    let query = format!(
        "INSERT INTO {} (key, body) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET body = excluded.body;",
        collection.table
    );

    ormlite::query(&query)
        .bind(key)
        .bind(body)
        .execute(connection)
        .await?;

    Ok(())
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn create_collections(&mut self) -> AnyResult<()> {
        for collection in ALL_COLLECTIONS {
            let create_table = format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    key TEXT PRIMARY KEY NOT NULL,
                    body JSON NOT NULL
                );",
                collection.table
            );
            ormlite::query(&create_table)
                .execute(&mut self.connection)
                .await?;

            for index in collection.indices {
                let create_index = format!(
                    "CREATE INDEX IF NOT EXISTS index_{}_{} ON {} ({});",
                    collection.table,
                    index.name,
                    collection.table,
                    json_field(index.key_path)
                );
                ormlite::query(&create_index)
                    .execute(&mut self.connection)
                    .await?;
            }
        }

        Ok(())
    }

    async fn get(&mut self, collection: &CollectionSchema, key: &str) -> AnyResult<Option<Value>> {
        let query = format!("SELECT body FROM {} WHERE key = ?;", collection.table);
        let row: Option<(String,)> = ormlite::query_as(&query)
            .bind(key)
            .fetch_optional(&mut self.connection)
            .await?;

        match row {
            Some((body,)) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn get_all(&mut self, collection: &CollectionSchema) -> AnyResult<Vec<Value>> {
        let timer = TimeLogger::new(format!("Retrieved and decoded {}", collection.name));
        let query = format!("SELECT body FROM {} ORDER BY rowid ASC;", collection.table);
        let rows: Vec<(String,)> = ormlite::query_as(&query)
            .fetch_all(&mut self.connection)
            .await?;

        let records = decode_rows(rows)?;
        timer.complete();
        Ok(records)
    }

    async fn get_all_ordered(
        &mut self,
        collection: &CollectionSchema,
        order: &[OrderBy],
        limit: Option<usize>,
    ) -> AnyResult<Vec<Value>> {
        // A negative LIMIT means no limit in SQLite
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let query = format!(
            "SELECT body FROM {} ORDER BY {} LIMIT ?;",
            collection.table,
            order_clause(order)
        );

        let rows: Vec<(String,)> = ormlite::query_as(&query)
            .bind(limit)
            .fetch_all(&mut self.connection)
            .await?;

        decode_rows(rows)
    }

    async fn count(&mut self, collection: &CollectionSchema) -> AnyResult<usize> {
        let query = format!("SELECT COUNT(*) FROM {};", collection.table);
        let (count,): (i64,) = ormlite::query_as(&query)
            .fetch_one(&mut self.connection)
            .await?;
        Ok(count as usize)
    }

    async fn put(&mut self, collection: &CollectionSchema, record: Value) -> AnyResult<()> {
        upsert(&mut self.connection, collection, &record).await
    }

    async fn delete(&mut self, collection: &CollectionSchema, key: &str) -> AnyResult<()> {
        let query = format!("DELETE FROM {} WHERE key = ?;", collection.table);
        ormlite::query(&query)
            .bind(key)
            .execute(&mut self.connection)
            .await?;
        Ok(())
    }

    async fn clear(&mut self, collection: &CollectionSchema) -> AnyResult<()> {
        let query = format!("DELETE FROM {};", collection.table);
        let result = ormlite::query(&query)
            .execute(&mut self.connection)
            .await?;
        debug!(
            "Cleared {} record(s) from {}",
            result.rows_affected(),
            collection.name
        );
        Ok(())
    }

    async fn clear_and_put(
        &mut self,
        cleared: &CollectionSchema,
        collection: &CollectionSchema,
        record: Value,
    ) -> AnyResult<()> {
        let mut transaction = self.connection.begin().await?;

        let query = format!("DELETE FROM {};", cleared.table);
        ormlite::query(&query).execute(&mut *transaction).await?;
        upsert(&mut *transaction, collection, &record).await?;

        // Dropping the transaction on any early return above rolls both writes back
        transaction.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::storage::schema::{
        SortDirection, MOST_PLAYED_ORDER, PLAY_STATS, SETTINGS, USER_DATA,
    };
    use serde_json::json;
    use tempfile::TempDir;

    async fn create_tmp_backend() -> (SqliteBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend = SqliteBackend::open(&temp_dir.path().join("reddens.db"))
            .await
            .unwrap();
        (backend, temp_dir)
    }

    #[test]
    fn order_clause_follows_declared_fields() {
        assert_eq!(
            order_clause(MOST_PLAYED_ORDER),
            "json_extract(body, '$.playCount') DESC, json_extract(body, '$.lastPlayed') DESC, json_extract(body, '$.songId') ASC"
        );
        assert_eq!(order_clause(&[]), "rowid ASC");
        assert_eq!(
            order_clause(&[OrderBy {
                key_path: "key",
                direction: SortDirection::Asc
            }]),
            "json_extract(body, '$.key') ASC"
        );
    }

    #[test]
    fn every_collection_has_its_own_table() {
        let tables: Vec<&str> = ALL_COLLECTIONS.iter().map(|c| c.table).collect();
        assert_eq!(tables, vec![USER_DATA.table, PLAY_STATS.table, SETTINGS.table]);
    }

    #[tokio::test]
    async fn put_replaces_records_with_the_same_key() {
        let (mut backend, _temp_dir) = create_tmp_backend().await;

        backend
            .put(&PLAY_STATS, json!({ "songId": 1, "playCount": 1 }))
            .await
            .unwrap();
        backend
            .put(&PLAY_STATS, json!({ "songId": 1, "playCount": 2 }))
            .await
            .unwrap();
        backend
            .put(&PLAY_STATS, json!({ "songId": 2, "playCount": 1 }))
            .await
            .unwrap();

        let records = backend.get_all(&PLAY_STATS).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["playCount"], 2);
    }

    #[tokio::test]
    async fn delete_and_clear() {
        let (mut backend, _temp_dir) = create_tmp_backend().await;

        for song_id in [1, 2] {
            backend
                .put(&PLAY_STATS, json!({ "songId": song_id, "playCount": 1 }))
                .await
                .unwrap();
        }
        backend
            .put(&SETTINGS, json!({ "key": "theme", "value": "dark" }))
            .await
            .unwrap();

        backend.delete(&PLAY_STATS, "1").await.unwrap();
        backend.delete(&PLAY_STATS, "404").await.unwrap();
        let remaining = backend.get_all(&PLAY_STATS).await.unwrap();
        assert_eq!(remaining, vec![json!({ "songId": 2, "playCount": 1 })]);

        backend.clear(&PLAY_STATS).await.unwrap();
        assert_eq!(backend.count(&PLAY_STATS).await.unwrap(), 0);
        assert_eq!(backend.count(&SETTINGS).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reopening_keeps_tables_and_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reddens.db");

        {
            let mut backend = SqliteBackend::open(&path).await.unwrap();
            backend
                .put(&USER_DATA, json!({ "id": "user", "likedSongs": [3] }))
                .await
                .unwrap();
        }

        let mut backend = SqliteBackend::open(&path).await.unwrap();
        let record = backend.get(&USER_DATA, "user").await.unwrap().unwrap();
        assert_eq!(record["likedSongs"], json!([3]));
    }
}
