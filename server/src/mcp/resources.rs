//! MCP Resource Definitions
//!
//! Defines resources available through the MCP protocol.

use super::protocol::{Resource, ResourceContent, ResourceReadResult};
use crate::retrieval::RetrievalManager;

pub const INDEX_STATS_URI: &str = "vidsearch://index/stats";

const JSON_MIME: &str = "application/json";

/// Get all available resources
pub fn get_all_resources() -> Vec<Resource> {
    vec![Resource {
        uri: INDEX_STATS_URI,
        name: "Index Statistics",
        description: "Serving index status: generation, video count, embedding model and build time",
        mime_type: JSON_MIME,
    }]
}

/// Read a resource by URI
pub async fn read_resource(uri: &str, manager: &RetrievalManager) -> Option<ResourceReadResult> {
    match uri {
        INDEX_STATS_URI => {
            let stats = manager.stats().await;
            Some(ResourceReadResult {
                contents: vec![ResourceContent {
                    uri: uri.to_string(),
                    mime_type: JSON_MIME,
                    text: serde_json::to_string_pretty(&stats).unwrap_or_default(),
                }],
            })
        }
        _ => None,
    }
}
