use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create hooks session response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Document read response
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub content: serde_json::Value,
    pub cas: u64,
}

/// Document write request
#[derive(Debug, Deserialize)]
pub struct UpsertDocumentRequest {
    pub content: serde_json::Value,
}

/// Mutation outcome response
#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    pub cas: u64,
}

/// Bucket creation request
#[derive(Debug, Deserialize)]
pub struct CreateBucketRequest {
    pub bucket_name: String,
    #[serde(default = "default_ram_quota_mb")]
    pub ram_quota_mb: u64,
}

fn default_ram_quota_mb() -> u64 {
    128
}

/// One bucket in a listing
#[derive(Debug, Serialize, Deserialize)]
pub struct BucketSummary {
    pub bucket_name: String,
    pub ram_quota_mb: u64,
    pub num_documents: usize,
}

/// Bucket listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct ListBucketsResponse {
    pub buckets: Vec<BucketSummary>,
}
