//! # Kumitate - Block Graph to App Inventor Extension Generator
//!
//! **Kumitate** turns a visual program, assembled as a tree of typed, connected blocks,
//! into the Java source of an App Inventor 2 extension. Generation is a pure, synchronous
//! walk over a read-only snapshot of the graph: it never fails, and anything it cannot
//! translate becomes a comment or a safe literal in the output.
//!
//! ## Core Workflow
//!
//! The generator is format-agnostic. It reads blocks through the [`graph::BlockSource`]
//! trait, and ships one implementation, the arena-backed [`graph::GraphSnapshot`]. The
//! usual workflow is:
//!
//! 1.  **Load Your Document**: Parse the editor's export into your own Rust structs, or
//!     straight into the canonical [`graph::GraphDefinition`] JSON model.
//! 2.  **Convert**: Implement [`graph::IntoGraph`] for your structs when the format differs.
//! 3.  **Snapshot**: Resolve the document into a `GraphSnapshot`.
//! 4.  **Generate**: Build a [`generator::Generator`] and call `generate` (source text) or
//!     `generate_unit` (source plus the file path it belongs at).
//!
//! ## Quick Start
//!
//! ```rust
//! use kumitate::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let mut graph = GraphSnapshot::new();
//! let root = graph.add_block("ai2_extension");
//! graph
//!     .set_field(root, "PACKAGE", "com.example.ext")
//!     .set_field(root, "CLASSNAME", "Demo");
//!
//! let method = graph.add_block("ai2_method");
//! graph
//!     .set_field(method, "RET", "int")
//!     .set_field(method, "NAME", "Answer");
//! graph.connect_statement(root, "METHODS", method);
//!
//! let generator = Generator::builder().with_max_depth(64).build();
//! let unit = generator.generate_unit(&graph).expect("graph has a unit root");
//!
//! assert_eq!(unit.file_path(), std::path::Path::new("com/example/ext/Demo.java"));
//! assert!(unit.source.contains("public int answer() throws Exception {"));
//! assert!(unit.source.contains("return 0;"));
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod error;
pub mod generator;
pub mod graph;
pub mod prelude;
pub mod sanitize;
