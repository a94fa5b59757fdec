use crate::block::FieldValue;
use crate::error::GraphError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// The complete, canonical document form of a block graph.
/// This is the target structure for any custom format conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDefinition {
    #[serde(default)]
    pub blocks: Vec<BlockDefinition>,
}

/// Defines a single block and its outgoing connections by block id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub fields: AHashMap<String, FieldValue>,
    /// Value socket name -> id of the connected expression block.
    #[serde(default)]
    pub inputs: AHashMap<String, String>,
    /// Statement socket name -> id of the first block in the nested chain.
    #[serde(default)]
    pub statements: AHashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl BlockDefinition {
    pub fn new(id: &str, block_type: &str) -> Self {
        Self {
            id: id.to_string(),
            block_type: block_type.to_string(),
            fields: AHashMap::new(),
            inputs: AHashMap::new(),
            statements: AHashMap::new(),
            next: None,
        }
    }
}

impl GraphDefinition {
    /// Parses a graph document from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::JsonParseError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(|e| GraphError::JsonParseError(e.to_string()))
    }
}
