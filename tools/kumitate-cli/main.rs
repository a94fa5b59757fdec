use ahash::AHashMap;
use clap::{Parser, ValueEnum};
use kumitate::block::{BlockKind, BlockRole};
use kumitate::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

// --- JSON Deserialization Structs (Editor Format Specific) ---
// These structs match the block editor's nested workspace serialization and are only
// used here for conversion.

#[derive(Deserialize)]
struct RawWorkspace {
    blocks: RawBlockList,
    #[serde(default)]
    variables: Vec<RawVariable>,
}

#[derive(Deserialize)]
struct RawVariable {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct RawBlockList {
    #[serde(default)]
    blocks: Vec<RawBlock>,
}

#[derive(Deserialize)]
struct RawBlock {
    #[serde(rename = "type")]
    block_type: String,
    id: Option<String>,
    #[serde(default)]
    fields: AHashMap<String, serde_json::Value>,
    #[serde(default)]
    inputs: AHashMap<String, RawConnection>,
    next: Option<RawConnection>,
    #[serde(default, alias = "extraState")]
    extra_state: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawConnection {
    block: Option<Box<RawBlock>>,
    shadow: Option<Box<RawBlock>>,
}

impl RawConnection {
    /// The connected block, falling back to the shadow block the editor shows in its place.
    fn into_block(self) -> Option<RawBlock> {
        self.block.or(self.shadow).map(|b| *b)
    }
}

/// Socket names that always hold statement chains, whatever block is plugged in.
const STATEMENT_SOCKETS: &[&str] = &[
    "PROPERTIES",
    "METHODS",
    "EVENTS",
    "BODY",
    "DO",
    "ELSE",
    "TRY",
    "CATCH",
    "ON_SUCCESS",
    "ON_ERROR",
    "STACK",
];

fn is_statement_socket(socket: &str, child_type: &str) -> bool {
    let by_name = STATEMENT_SOCKETS.contains(&socket)
        || socket
            .strip_prefix("DO")
            .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()));
    let by_role = BlockKind::from_tag(child_type).is_some_and(|k| k.role() != BlockRole::Expression);
    by_name || by_role
}

// --- Converter Implementation ---
// Flattens the nested editor tree into the canonical id-linked GraphDefinition.

struct Flattener {
    blocks: Vec<BlockDefinition>,
    variables: AHashMap<String, String>,
    next_auto_id: usize,
}

impl Flattener {
    /// Appends `raw` and everything below it in pre-order, returning its id.
    fn flatten(&mut self, raw: RawBlock) -> String {
        let id = raw.id.clone().unwrap_or_else(|| {
            self.next_auto_id += 1;
            format!("auto-{}", self.next_auto_id)
        });
        let index = self.blocks.len();
        self.blocks.push(BlockDefinition::new(&id, &raw.block_type));

        let mut fields: AHashMap<String, FieldValue> = raw
            .fields
            .into_iter()
            .filter_map(|(name, value)| self.field_value(value).map(|v| (name, v)))
            .collect();
        if let Some(count) = raw
            .extra_state
            .as_ref()
            .and_then(|state| state.get("itemCount"))
            .and_then(serde_json::Value::as_f64)
        {
            fields.insert("ITEMS".to_string(), FieldValue::Number(count));
        }

        let mut inputs = AHashMap::new();
        let mut statements = AHashMap::new();
        for (socket, connection) in raw.inputs {
            let Some(child) = connection.into_block() else {
                continue;
            };
            let statement = is_statement_socket(&socket, &child.block_type);
            let child_id = self.flatten(child);
            if statement {
                statements.insert(socket, child_id);
            } else {
                inputs.insert(socket, child_id);
            }
        }
        let next = raw
            .next
            .and_then(RawConnection::into_block)
            .map(|block| self.flatten(block));

        let block = &mut self.blocks[index];
        block.fields = fields;
        block.inputs = inputs;
        block.statements = statements;
        block.next = next;
        id
    }

    /// Variable fields are serialized as `{"id": ...}` references into the workspace's
    /// variable list; everything else is a plain scalar.
    fn field_value(&self, value: serde_json::Value) -> Option<FieldValue> {
        match value {
            serde_json::Value::String(s) => Some(FieldValue::Text(s)),
            serde_json::Value::Number(n) => n.as_f64().map(FieldValue::Number),
            serde_json::Value::Bool(b) => Some(FieldValue::Bool(b)),
            serde_json::Value::Object(map) => {
                if let Some(name) = map.get("name").and_then(serde_json::Value::as_str) {
                    return Some(FieldValue::Text(name.to_string()));
                }
                let id = map.get("id").and_then(serde_json::Value::as_str)?;
                self.variables.get(id).cloned().map(FieldValue::Text)
            }
            _ => None,
        }
    }
}

impl IntoGraph for RawWorkspace {
    fn into_graph(self) -> Result<GraphDefinition, ConversionError> {
        if self.blocks.blocks.is_empty() {
            return Err(ConversionError::ValidationError(
                "workspace contains no blocks".to_string(),
            ));
        }
        let mut flattener = Flattener {
            blocks: Vec::new(),
            variables: self
                .variables
                .into_iter()
                .map(|v| (v.id, v.name))
                .collect(),
            next_auto_id: 0,
        };
        for top in self.blocks.blocks {
            flattener.flatten(top);
        }
        Ok(GraphDefinition {
            blocks: flattener.blocks,
        })
    }
}

/// Define a CLI-specific enum for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatCli {
    /// The canonical id-linked graph document
    Canonical,
    /// The block editor's nested workspace serialization
    Blockly,
}

/// Generates App Inventor extension Java source from a block graph
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the graph JSON file
    graph_path: String,

    /// The input document format
    #[arg(short, long, value_enum, default_value = "canonical")]
    format: FormatCli,

    /// Directory to write the generated unit into, at its package path. Prints to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum block nesting depth before generation of a subtree is skipped
    #[arg(long)]
    max_depth: Option<usize>,

    /// Treat a custom block type as a built-in one, as `user_type=builtin_type`
    #[arg(short, long = "map", value_name = "USER=BUILTIN")]
    mappings: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run_generation(cli);
}

fn run_generation(cli: Cli) {
    let total_start = Instant::now();

    // --- 1. File Loading ---
    let json = fs::read_to_string(&cli.graph_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read graph file '{}': {}",
            &cli.graph_path, e
        ))
    });

    // --- 2. Parsing and Conversion ---
    let definition = match cli.format {
        FormatCli::Canonical => GraphDefinition::from_json(&json)
            .unwrap_or_else(|e| exit_with_error(&e.to_string())),
        FormatCli::Blockly => {
            let raw: RawWorkspace = serde_json::from_str(&json).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to parse workspace JSON: {}", e))
            });
            raw.into_graph().unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to convert workspace to graph: {}", e))
            })
        }
    };
    let graph = GraphSnapshot::from_definition(&definition)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid graph: {}", e)));
    debug!(blocks = graph.len(), "graph loaded");

    // --- 3. Generation ---
    let mut builder = Generator::builder();
    if let Some(depth) = cli.max_depth {
        builder = builder.with_max_depth(depth);
    }
    for mapping in &cli.mappings {
        let Some((user, builtin)) = mapping.split_once('=') else {
            exit_with_error(&format!(
                "Invalid mapping '{}', expected USER=BUILTIN",
                mapping
            ));
        };
        builder = builder.with_type_mapping(user.trim(), builtin.trim());
    }
    let generator = builder.build();

    let Some(unit) = generator.generate_unit(&graph) else {
        warn!("graph has no extension block");
        println!("{}", generator.generate(&graph));
        return;
    };

    // --- 4. Output ---
    match cli.output {
        Some(dir) => {
            let path = dir.join(unit.file_path());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap_or_else(|e| {
                    exit_with_error(&format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                });
            }
            fs::write(&path, &unit.source).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to write '{}': {}", path.display(), e))
            });
            info!(path = %path.display(), "wrote generated unit");
            println!("{}", path.display());
        }
        None => print!("{}", unit.source),
    }

    debug!(elapsed = ?total_start.elapsed(), "generation finished");
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
