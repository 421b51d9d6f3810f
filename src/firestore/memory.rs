use super::{DocumentStore, Fields};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<BTreeMap<String, Fields>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &str) -> Result<Option<Fields>> {
        Ok(self.docs.lock().await.get(path).cloned())
    }

    async fn set(&self, path: &str, fields: Fields) -> Result<()> {
        self.docs.lock().await.insert(path.to_string(), fields);
        Ok(())
    }

    async fn merge(&self, path: &str, fields: Fields) -> Result<()> {
        let mut docs = self.docs.lock().await;
        let doc = docs.entry(path.to_string()).or_default();
        for (k, v) in fields {
            doc.insert(k, v);
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.docs.lock().await.remove(path);
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Fields>> {
        let prefix = format!("{}/", collection);
        let docs = self.docs.lock().await;
        Ok(docs
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| !k[prefix.len()..].contains('/'))
            .map(|(_, v)| v.clone())
            .collect())
    }
}
