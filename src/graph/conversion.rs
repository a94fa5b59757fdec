use super::definition::GraphDefinition;
use crate::error::ConversionError;

/// A trait for custom document models that can be converted into a `GraphDefinition`.
///
/// This is the extension point that keeps the generator agnostic to how a graph was
/// persisted. Implement it on your own deserialization structs to feed any editor's
/// export format into the generator.
///
/// # Example
///
/// ```rust,no_run
/// use kumitate::prelude::*;
/// use kumitate::error::ConversionError;
///
/// struct MyBlock { id: String, kind: String }
/// struct MyDocument { blocks: Vec<MyBlock> }
///
/// impl IntoGraph for MyDocument {
///     fn into_graph(self) -> Result<GraphDefinition, ConversionError> {
///         let blocks = self
///             .blocks
///             .into_iter()
///             .map(|b| BlockDefinition::new(&b.id, &b.kind))
///             .collect();
///         Ok(GraphDefinition { blocks })
///     }
/// }
/// ```
pub trait IntoGraph {
    /// Consumes the object and converts it into the canonical graph document.
    fn into_graph(self) -> Result<GraphDefinition, ConversionError>;
}
