//! MCP Tool Definitions
//!
//! Defines the vidsearch tools for the MCP protocol.

use super::protocol::{PropertySchema, Tool, ToolInputSchema};
use serde_json::json;
use std::collections::BTreeMap;
use vidsearch_core::search::DEFAULT_LIMIT;

pub const SEARCH_TOOL: &str = "vidsearch_search";
pub const INDEX_STATS_TOOL: &str = "vidsearch_index_stats";

/// Get all available vidsearch tools
pub fn get_all_tools() -> Vec<Tool> {
    vec![search_tool(), index_stats_tool()]
}

fn prop(property_type: &'static str, description: &str) -> PropertySchema {
    PropertySchema {
        property_type,
        description: description.to_string(),
        default: None,
        minimum: None,
    }
}

fn search_tool() -> Tool {
    let mut properties = BTreeMap::new();
    properties.insert(
        "query".to_string(),
        prop(
            "string",
            "Natural language description of the video you are looking for",
        ),
    );
    properties.insert(
        "limit".to_string(),
        PropertySchema {
            default: Some(json!(DEFAULT_LIMIT)),
            minimum: Some(0.0),
            ..prop("integer", "Maximum results to return")
        },
    );
    properties.insert(
        "includeDistance".to_string(),
        PropertySchema {
            default: Some(json!(false)),
            ..prop(
                "boolean",
                "Include the L1 distance and the matching field for each result",
            )
        },
    );

    Tool {
        name: SEARCH_TOOL.to_string(),
        description: "Finds videos whose title or transcript is semantically close to the query. Results are ordered best match first; videos beyond the distance cutoff are left out, so fewer than `limit` results is normal.".to_string(),
        input_schema: ToolInputSchema::object(properties, &["query"]),
    }
}

fn index_stats_tool() -> Tool {
    Tool {
        name: INDEX_STATS_TOOL.to_string(),
        description: "Get the state of the serving index: readiness, video count, model and build time"
            .to_string(),
        input_schema: ToolInputSchema::no_arguments(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_all_tools() {
        let tools = get_all_tools();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![SEARCH_TOOL, INDEX_STATS_TOOL]);
    }

    #[test]
    fn test_tools_have_required_fields() {
        for tool in get_all_tools() {
            assert!(!tool.name.is_empty(), "Tool name should not be empty");
            assert!(
                !tool.description.is_empty(),
                "Tool {} should have description",
                tool.name
            );
        }
    }

    #[test]
    fn test_search_tool_schema() {
        let value = serde_json::to_value(search_tool()).unwrap();
        assert_eq!(value["inputSchema"]["required"], serde_json::json!(["query"]));
        assert_eq!(
            value["inputSchema"]["properties"]["limit"]["default"],
            serde_json::json!(10)
        );
        assert_eq!(
            value["inputSchema"]["properties"]["query"]["type"],
            serde_json::json!("string")
        );
        assert_eq!(
            value["inputSchema"]["properties"]["includeDistance"]["default"],
            serde_json::json!(false)
        );
    }

    #[test]
    fn test_stats_tool_takes_no_arguments() {
        let value = serde_json::to_value(index_stats_tool()).unwrap();
        assert_eq!(value["inputSchema"], serde_json::json!({ "type": "object" }));
    }
}
