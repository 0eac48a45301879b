use serde::{Deserialize, Serialize};
use crate::core::batch::BatchSummary;
use crate::models::domain::{FlatTable, ValuationResult};

/// Response for the valuations endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ValuationResponse {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ValuationResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<FlatTable>,
    pub summary: BatchSummary,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
