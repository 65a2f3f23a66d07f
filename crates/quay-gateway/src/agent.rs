use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by a cluster agent.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("bucket '{0}' was not found")]
    BucketNotFound(String),
    #[error("bucket '{0}' already exists")]
    BucketExists(String),
    #[error("document '{0}' was not found")]
    DocumentNotFound(String),
    #[error("document '{0}' already exists")]
    DocumentExists(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("cluster error: {0}")]
    Other(String),
}

/// A document read from the cluster.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: Value,
    pub cas: u64,
}

/// The outcome of a mutation.
#[derive(Debug, Clone, Copy)]
pub struct MutationResult {
    pub cas: u64,
}

#[derive(Debug, Clone)]
pub struct BucketInfo {
    pub name: String,
    pub ram_quota_mb: u64,
    pub num_documents: usize,
}

/// The cluster-side collaborator every data and admin RPC routes through.
#[async_trait]
pub trait ClusterAgent: Send + Sync {
    async fn get_document(&self, bucket: &str, key: &str) -> Result<Document, AgentError>;
    async fn upsert_document(
        &self,
        bucket: &str,
        key: &str,
        content: Value,
    ) -> Result<MutationResult, AgentError>;
    async fn remove_document(&self, bucket: &str, key: &str) -> Result<MutationResult, AgentError>;

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, AgentError>;
    async fn create_bucket(&self, name: &str, ram_quota_mb: u64) -> Result<(), AgentError>;
    async fn delete_bucket(&self, name: &str) -> Result<(), AgentError>;
}

struct StoredDocument {
    content: Value,
    cas: u64,
}

struct MemoryBucket {
    ram_quota_mb: u64,
    documents: DashMap<String, StoredDocument>,
}

/// In-process agent over concurrent maps, used by tests and by deployments
/// that run the gateway without a linked cluster.
pub struct MemoryAgent {
    buckets: DashMap<String, MemoryBucket>,
    cas_source: AtomicU64,
}

impl MemoryAgent {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
            cas_source: AtomicU64::new(1),
        }
    }

    /// An agent with one pre-provisioned bucket, the common test setup.
    pub fn with_bucket(name: &str) -> Self {
        let agent = Self::new();
        agent.buckets.insert(
            name.to_string(),
            MemoryBucket {
                ram_quota_mb: 128,
                documents: DashMap::new(),
            },
        );
        agent
    }

    fn next_cas(&self) -> u64 {
        self.cas_source.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MemoryAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterAgent for MemoryAgent {
    async fn get_document(&self, bucket: &str, key: &str) -> Result<Document, AgentError> {
        let bucket = self
            .buckets
            .get(bucket)
            .ok_or_else(|| AgentError::BucketNotFound(bucket.to_string()))?;
        let document = bucket
            .documents
            .get(key)
            .ok_or_else(|| AgentError::DocumentNotFound(key.to_string()))?;
        Ok(Document {
            content: document.content.clone(),
            cas: document.cas,
        })
    }

    async fn upsert_document(
        &self,
        bucket: &str,
        key: &str,
        content: Value,
    ) -> Result<MutationResult, AgentError> {
        let bucket = self
            .buckets
            .get(bucket)
            .ok_or_else(|| AgentError::BucketNotFound(bucket.to_string()))?;
        let cas = self.next_cas();
        bucket
            .documents
            .insert(key.to_string(), StoredDocument { content, cas });
        Ok(MutationResult { cas })
    }

    async fn remove_document(&self, bucket: &str, key: &str) -> Result<MutationResult, AgentError> {
        let bucket = self
            .buckets
            .get(bucket)
            .ok_or_else(|| AgentError::BucketNotFound(bucket.to_string()))?;
        match bucket.documents.remove(key) {
            Some(_) => Ok(MutationResult {
                cas: self.next_cas(),
            }),
            None => Err(AgentError::DocumentNotFound(key.to_string())),
        }
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>, AgentError> {
        let mut buckets: Vec<BucketInfo> = self
            .buckets
            .iter()
            .map(|entry| BucketInfo {
                name: entry.key().clone(),
                ram_quota_mb: entry.value().ram_quota_mb,
                num_documents: entry.value().documents.len(),
            })
            .collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }

    async fn create_bucket(&self, name: &str, ram_quota_mb: u64) -> Result<(), AgentError> {
        match self.buckets.entry(name.to_string()) {
            dashmap::Entry::Occupied(_) => Err(AgentError::BucketExists(name.to_string())),
            dashmap::Entry::Vacant(slot) => {
                slot.insert(MemoryBucket {
                    ram_quota_mb,
                    documents: DashMap::new(),
                });
                Ok(())
            }
        }
    }

    async fn delete_bucket(&self, name: &str) -> Result<(), AgentError> {
        match self.buckets.remove(name) {
            Some(_) => Ok(()),
            None => Err(AgentError::BucketNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_document_round_trip() {
        let agent = MemoryAgent::with_bucket("main");

        let mutation = agent
            .upsert_document("main", "k1", json!({"v": 1}))
            .await
            .unwrap();
        let document = agent.get_document("main", "k1").await.unwrap();
        assert_eq!(document.content, json!({"v": 1}));
        assert_eq!(document.cas, mutation.cas);

        agent.remove_document("main", "k1").await.unwrap();
        assert!(matches!(
            agent.get_document("main", "k1").await,
            Err(AgentError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_bucket_is_reported_as_such() {
        let agent = MemoryAgent::new();
        assert!(matches!(
            agent.get_document("ghost", "k1").await,
            Err(AgentError::BucketNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_bucket_admin_operations() {
        let agent = MemoryAgent::new();

        agent.create_bucket("main", 256).await.unwrap();
        assert!(matches!(
            agent.create_bucket("main", 256).await,
            Err(AgentError::BucketExists(_))
        ));

        let buckets = agent.list_buckets().await.unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].name, "main");
        assert_eq!(buckets[0].ram_quota_mb, 256);

        agent.delete_bucket("main").await.unwrap();
        assert!(matches!(
            agent.delete_bucket("main").await,
            Err(AgentError::BucketNotFound(_))
        ));
    }
}
