use serde::{Deserialize, Serialize};
use validator::Validate;

/// One entry of the comps feed: the subject's raw attributes plus its
/// retrieved comps, each an arbitrarily nested JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompsFeedEntry {
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default)]
    pub comps: Vec<serde_json::Value>,
}

/// Shape of the rendered results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    #[default]
    Nested,
    Flat,
}

/// Request to value a batch of subjects
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ValuationRequest {
    #[validate(length(min = 1))]
    pub subjects: Vec<CompsFeedEntry>,
    /// Property-details records used to fill gaps in the subjects
    #[serde(default)]
    pub enrichment: Vec<serde_json::Value>,
    #[serde(default)]
    pub format: ResultFormat,
}
