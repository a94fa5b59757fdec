use crate::graph::NodeId;
use thiserror::Error;

/// Errors that can occur while loading a graph document or building a snapshot from it.
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("Failed to parse graph JSON: {0}")]
    JsonParseError(String),

    #[error("Block id '{0}' is defined more than once")]
    DuplicateBlockId(String),
}

/// Errors raised inside a single generation rule.
///
/// These never escape `Generator::generate`: the rule boundary turns them into an
/// inline comment so the rest of the unit is still produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("block {node} ('{block_type}') is connected back into its own subtree")]
    Cycle { node: NodeId, block_type: String },

    #[error("block {node} ('{block_type}') has more than one parent; only its first use is generated")]
    SharedBlock { node: NodeId, block_type: String },

    #[error("nesting exceeds the depth limit of {limit}")]
    DepthExceeded { limit: usize },
}

/// Errors that can occur when converting a custom document format into a `GraphDefinition`.
#[derive(Error, Debug, Clone)]
pub enum ConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),
}
