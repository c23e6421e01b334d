//! Tool selection
//!
//! Narrows the discovered catalog to the tools the classifier named, so
//! follow-up calls carry only the relevant schemas.

use crate::types::ToolDefinition;

/// Pick catalog entries whose names the classifier selected.
///
/// Selection order follows `names`; duplicates keep the first catalog
/// match; names with no catalog entry are dropped silently.
pub fn select_tools(catalog: &[ToolDefinition], names: &[String]) -> Vec<ToolDefinition> {
    names
        .iter()
        .filter_map(|name| catalog.iter().find(|tool| tool.name() == name))
        .cloned()
        .collect()
}
