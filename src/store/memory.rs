use crate::schema::{ContentRecord, ContentType, NewContent};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process content store used when no database is configured.
///
/// Records are kept in insertion order, so listing by type can return the
/// newest first without relying on timestamp resolution. Contents are lost
/// when the process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<ContentRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_content(&self, content: NewContent) -> ContentRecord {
        let record = content.into_record(Uuid::new_v4().to_string(), Utc::now());
        self.records.write().await.push(record.clone());
        record
    }

    pub async fn get_content(&self, id: &str) -> Option<ContentRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub async fn get_content_by_type(&self, content_type: ContentType) -> Vec<ContentRecord> {
        self.records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.content_type == content_type)
            .cloned()
            .collect()
    }

    pub async fn delete_content(&self, id: &str) -> bool {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        records.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::schema::{ContentType, NewContent};
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemoryStore::new();

        let a = store
            .create_content(NewContent::new(ContentType::Caption, json!({ "captions": ["a"] })))
            .await;
        let b = store
            .create_content(NewContent::new(ContentType::Caption, json!({ "captions": ["b"] })))
            .await;
        store
            .create_content(NewContent::new(ContentType::Bio, json!({ "bios": [] })))
            .await;

        assert_ne!(a.id, b.id);
        assert_eq!(Some(a.clone()), store.get_content(&a.id).await);

        let captions = store.get_content_by_type(ContentType::Caption).await;
        assert_eq!(vec![b.clone(), a.clone()], captions);

        assert!(store.delete_content(&a.id).await);
        assert!(!store.delete_content(&a.id).await);
        assert_eq!(None, store.get_content(&a.id).await);
        assert_eq!(vec![b], store.get_content_by_type(ContentType::Caption).await);
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let store = MemoryStore::new();
        let other = store.clone();

        let record = store
            .create_content(NewContent::new(ContentType::Grid, json!({})))
            .await;

        assert_eq!(Some(record.clone()), other.get_content(&record.id).await);
    }
}
