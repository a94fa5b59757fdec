use super::definition::GraphDefinition;
use crate::block::FieldValue;
use crate::error::GraphError;
use ahash::{AHashMap, AHashSet};
use std::fmt;
use tracing::warn;

/// Index of a block inside a `GraphSnapshot` (or any other `BlockSource`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only traversal over a block graph.
///
/// This is everything the generator needs from a host: it never mutates the graph
/// and never assumes how the graph is stored.
pub trait BlockSource {
    /// Blocks that are not connected under any other block, in a stable order.
    fn top_blocks(&self) -> Vec<NodeId>;
    fn block_type(&self, id: NodeId) -> Option<&str>;
    fn field(&self, id: NodeId, name: &str) -> Option<&FieldValue>;
    /// The expression block connected to a value socket.
    fn input(&self, id: NodeId, name: &str) -> Option<NodeId>;
    /// The first block of the chain connected to a statement socket.
    fn statement(&self, id: NodeId, name: &str) -> Option<NodeId>;
    /// The block following `id` in its statement chain.
    fn next(&self, id: NodeId) -> Option<NodeId>;
}

#[derive(Debug, Clone, Default)]
struct SnapshotBlock {
    block_type: String,
    fields: AHashMap<String, FieldValue>,
    inputs: AHashMap<String, NodeId>,
    statements: AHashMap<String, NodeId>,
    next: Option<NodeId>,
}

/// An arena of blocks addressed by `NodeId`.
///
/// Links are stored exactly as given, so self references and cycles are representable;
/// the generator guards against them instead of the snapshot rejecting them.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    blocks: Vec<SnapshotBlock>,
}

impl GraphSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn add_block(&mut self, block_type: &str) -> NodeId {
        self.blocks.push(SnapshotBlock {
            block_type: block_type.to_string(),
            ..SnapshotBlock::default()
        });
        NodeId(self.blocks.len() - 1)
    }

    pub fn set_field(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> &mut Self {
        if let Some(block) = self.block_mut(id) {
            block.fields.insert(name.to_string(), value.into());
        }
        self
    }

    pub fn connect_input(&mut self, parent: NodeId, socket: &str, child: NodeId) -> &mut Self {
        if let Some(block) = self.block_mut(parent) {
            block.inputs.insert(socket.to_string(), child);
        }
        self
    }

    pub fn connect_statement(&mut self, parent: NodeId, socket: &str, head: NodeId) -> &mut Self {
        if let Some(block) = self.block_mut(parent) {
            block.statements.insert(socket.to_string(), head);
        }
        self
    }

    pub fn set_next(&mut self, previous: NodeId, next: NodeId) -> &mut Self {
        if let Some(block) = self.block_mut(previous) {
            block.next = Some(next);
        }
        self
    }

    /// Builds a snapshot from a graph document, resolving string ids to `NodeId`s.
    ///
    /// Links to ids that do not exist are dropped, matching what an editor shows
    /// for a dangling connection.
    pub fn from_definition(definition: &GraphDefinition) -> Result<Self, GraphError> {
        let mut ids: AHashMap<&str, NodeId> = AHashMap::new();
        let mut snapshot = Self::new();
        for block in &definition.blocks {
            let id = snapshot.add_block(&block.block_type);
            if ids.insert(block.id.as_str(), id).is_some() {
                return Err(GraphError::DuplicateBlockId(block.id.clone()));
            }
        }

        let resolve = |target: &str, owner: &str| -> Option<NodeId> {
            let resolved = ids.get(target).copied();
            if resolved.is_none() {
                warn!(owner = owner, missing = target, "dropping link to unknown block id");
            }
            resolved
        };

        for (index, block) in definition.blocks.iter().enumerate() {
            let mut resolved = SnapshotBlock {
                block_type: block.block_type.clone(),
                fields: block.fields.clone(),
                ..SnapshotBlock::default()
            };
            for (socket, target) in &block.inputs {
                if let Some(child) = resolve(target, &block.id) {
                    resolved.inputs.insert(socket.clone(), child);
                }
            }
            for (socket, target) in &block.statements {
                if let Some(head) = resolve(target, &block.id) {
                    resolved.statements.insert(socket.clone(), head);
                }
            }
            resolved.next = block
                .next
                .as_deref()
                .and_then(|target| resolve(target, &block.id));
            snapshot.blocks[index] = resolved;
        }

        Ok(snapshot)
    }

    fn block(&self, id: NodeId) -> Option<&SnapshotBlock> {
        self.blocks.get(id.0)
    }

    fn block_mut(&mut self, id: NodeId) -> Option<&mut SnapshotBlock> {
        let block = self.blocks.get_mut(id.0);
        if block.is_none() {
            warn!(%id, "ignoring edit of a block outside the snapshot");
        }
        block
    }
}

impl BlockSource for GraphSnapshot {
    fn top_blocks(&self) -> Vec<NodeId> {
        let referenced: AHashSet<NodeId> = self
            .blocks
            .iter()
            .flat_map(|b| {
                b.inputs
                    .values()
                    .chain(b.statements.values())
                    .chain(b.next.iter())
                    .copied()
            })
            .collect();
        (0..self.blocks.len())
            .map(NodeId)
            .filter(|id| !referenced.contains(id))
            .collect()
    }

    fn block_type(&self, id: NodeId) -> Option<&str> {
        self.block(id).map(|b| b.block_type.as_str())
    }

    fn field(&self, id: NodeId, name: &str) -> Option<&FieldValue> {
        self.block(id).and_then(|b| b.fields.get(name))
    }

    fn input(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.block(id).and_then(|b| b.inputs.get(name).copied())
    }

    fn statement(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.block(id).and_then(|b| b.statements.get(name).copied())
    }

    fn next(&self, id: NodeId) -> Option<NodeId> {
        self.block(id).and_then(|b| b.next)
    }
}
