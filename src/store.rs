//! # Content Store
//!
//! [`Store`] is the storage layer the rest of the crate talks to. It maps
//! content records either to rows of a relational database ([`Database`]) or,
//! when no database is configured, to an in-process [`MemoryStore`].

pub mod memory;

use crate::{
    database::{Database, DatabaseError},
    schema::{ContentRecord, ContentType, NewContent},
};
pub use memory::MemoryStore;
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum Store {
    Database(Database),
    Memory(MemoryStore),
}

impl Store {
    /// Opens the store for the given database URL.
    ///
    /// `None` selects the in-memory fallback.
    pub async fn connect(database_url: Option<&str>) -> Result<Self, StoreError> {
        match database_url {
            Some(url) => {
                let db = Database::connect(url).await?;
                tracing::info!("using database content store");
                Ok(Store::Database(db))
            }
            None => {
                tracing::warn!("DATABASE_URL is not set; content is kept in memory only");
                Ok(Store::Memory(MemoryStore::new()))
            }
        }
    }

    pub async fn create_content(&self, content: NewContent) -> Result<ContentRecord, StoreError> {
        let record = match self {
            Store::Database(db) => db.create_content(content).await?,
            Store::Memory(mem) => mem.create_content(content).await,
        };

        tracing::info!(id = %record.id, content_type = %record.content_type, "stored content");
        Ok(record)
    }

    pub async fn get_content(&self, id: &str) -> Result<Option<ContentRecord>, StoreError> {
        match self {
            Store::Database(db) => Ok(db.get_content(id).await?),
            Store::Memory(mem) => Ok(mem.get_content(id).await),
        }
    }

    /// Returns every record of the given type, newest first.
    pub async fn get_content_by_type(
        &self,
        content_type: ContentType,
    ) -> Result<Vec<ContentRecord>, StoreError> {
        match self {
            Store::Database(db) => Ok(db.get_content_by_type(content_type).await?),
            Store::Memory(mem) => Ok(mem.get_content_by_type(content_type).await),
        }
    }

    /// Deletes a record, returning whether it existed.
    pub async fn delete_content(&self, id: &str) -> Result<bool, StoreError> {
        let deleted = match self {
            Store::Database(db) => db.delete_content(id).await?,
            Store::Memory(mem) => mem.delete_content(id).await,
        };

        if deleted {
            tracing::info!(%id, "deleted content");
        }
        Ok(deleted)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::Store;
    use crate::schema::{ContentType, NewContent};
    use serde_json::json;

    #[tokio::test]
    async fn test_connect_without_url_uses_memory() {
        let store = Store::connect(None).await.unwrap();
        assert!(matches!(store, Store::Memory(_)));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_backends_behave_alike() {
        let stores = [
            Store::connect(None).await.unwrap(),
            Store::connect(Some("sqlite::memory:")).await.unwrap(),
        ];

        for store in stores {
            let record = store
                .create_content(
                    NewContent::new(ContentType::Hashtags, json!({ "niche": ["#latteart"] }))
                        .with_prompt("latte art"),
                )
                .await
                .unwrap();

            assert_eq!(
                Some(record.clone()),
                store.get_content(&record.id).await.unwrap().map(|mut r| {
                    r.created_at = record.created_at;
                    r
                })
            );
            assert_eq!(
                1,
                store
                    .get_content_by_type(ContentType::Hashtags)
                    .await
                    .unwrap()
                    .len()
            );
            assert!(store.delete_content(&record.id).await.unwrap());
            assert!(!store.delete_content(&record.id).await.unwrap());
        }
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_sqlite_file_is_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("content.db").display());

        let store = Store::connect(Some(&url)).await.unwrap();
        assert!(matches!(store, Store::Database(_)));
        assert!(dir.path().join("content.db").exists());
    }
}
