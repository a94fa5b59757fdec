//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the kumitate crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use kumitate::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let json = std::fs::read_to_string("path/to/graph.json")?;
//! let definition = GraphDefinition::from_json(&json)?;
//! let graph = GraphSnapshot::from_definition(&definition)?;
//!
//! let source = Generator::new().generate(&graph);
//! println!("{}", source);
//! # Ok(())
//! # }
//! ```

// Generation
pub use crate::generator::{GenContext, GeneratedUnit, Generator, GeneratorBuilder};

// Graph input
pub use crate::graph::{
    BlockDefinition, BlockSource, GraphDefinition, GraphSnapshot, IntoGraph, NodeId,
};

// Block vocabulary
pub use crate::block::{BlockKind, FieldValue, JavaType};

// Error types
pub use crate::error::{ConversionError, GenerateError, GraphError};

// Result type alias for convenience
pub type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;
