use crate::block::BlockKind;
use ahash::AHashMap;

/// Maps editor tags to built-in block kinds.
///
/// Owned by the `Generator` that uses it; there is no process-wide table. Hosts with
/// their own tag names alias them onto built-in kinds with [`BlockRegistry::map_tag`].
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    kinds: AHashMap<String, BlockKind>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        register_default_kinds(&mut registry);
        registry
    }
}

impl BlockRegistry {
    /// A registry with every built-in tag registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that recognizes nothing.
    pub fn empty() -> Self {
        Self {
            kinds: AHashMap::new(),
        }
    }

    pub fn register(&mut self, tag: &str, kind: BlockKind) {
        self.kinds.insert(tag.to_string(), kind);
    }

    /// Makes `user_tag` behave like the built-in `builtin_tag`.
    /// Returns `false` (and changes nothing) when `builtin_tag` is not a built-in tag.
    pub fn map_tag(&mut self, user_tag: &str, builtin_tag: &str) -> bool {
        match BlockKind::from_tag(builtin_tag) {
            Some(kind) => {
                self.register(user_tag, kind);
                true
            }
            None => false,
        }
    }

    pub fn resolve(&self, tag: &str) -> Option<BlockKind> {
        self.kinds.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

fn register_default_kinds(registry: &mut BlockRegistry) {
    for kind in BlockKind::ALL {
        for tag in kind.tags() {
            registry.register(tag, *kind);
        }
    }
}
