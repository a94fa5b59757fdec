mod context;
mod expression;
mod registry;
mod statement;
mod unit;

pub use context::GenContext;
pub use registry::BlockRegistry;
pub use unit::GeneratedUnit;

use crate::block::{BlockKind, FieldValue};
use crate::error::GenerateError;
use crate::graph::{BlockSource, NodeId};
use ahash::AHashSet;
use tracing::{trace, warn};

/// Recursion limit used when the builder is not given one.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Output of a pass over a graph that has no unit root.
pub const MISSING_ROOT_PLACEHOLDER: &str = "// Add an 'AI2 Extension' block to begin";

/// One level of indentation in emitted Java.
pub(crate) const INDENT: &str = "  ";

/// Members of the class skeleton that a property field must not shadow.
const RESERVED_MEMBERS: &[&str] = &["context"];

/// The field a property named `name` is stored in. Names taken by the skeleton get a
/// trailing underscore.
pub(crate) fn storage_field(name: &str) -> String {
    if RESERVED_MEMBERS.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Configures a `Generator`.
pub struct GeneratorBuilder {
    registry: BlockRegistry,
    max_depth: usize,
}

impl Default for GeneratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorBuilder {
    pub fn new() -> Self {
        Self {
            registry: BlockRegistry::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Treats blocks tagged `user_type_name` like the built-in `builtin_type_name`.
    /// Unknown built-in names are ignored.
    pub fn with_type_mapping(mut self, user_type_name: &str, builtin_type_name: &str) -> Self {
        if !self.registry.map_tag(user_type_name, builtin_type_name) {
            warn!(
                user = user_type_name,
                builtin = builtin_type_name,
                "ignoring mapping onto an unknown block type"
            );
        }
        self
    }

    /// Maximum nesting of blocks below the unit root. Values below 1 are raised to 1.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn with_registry(mut self, registry: BlockRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> Generator {
        Generator {
            registry: self.registry,
            max_depth: self.max_depth,
        }
    }
}

/// Turns a block graph into the Java source of one App Inventor extension.
///
/// A `Generator` holds configuration only. Every call runs a fresh pass with its own
/// synthetic name counter, so the same graph always produces the same text and one
/// generator can be shared across threads.
#[derive(Debug, Clone)]
pub struct Generator {
    registry: BlockRegistry,
    max_depth: usize,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        GeneratorBuilder::new().build()
    }

    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::new()
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Generates the complete source text, or the placeholder comment when the graph
    /// has no unit root. Never fails.
    pub fn generate<S: BlockSource + ?Sized>(&self, source: &S) -> String {
        match self.generate_unit(source) {
            Some(unit) => unit.source,
            None => MISSING_ROOT_PLACEHOLDER.to_string(),
        }
    }

    /// Generates the unit rooted at the first top-level extension block, if there is one.
    pub fn generate_unit<S: BlockSource + ?Sized>(&self, source: &S) -> Option<GeneratedUnit> {
        let root = self.find_root(source)?;
        trace!(%root, "starting generation pass");
        let mut pass = Pass::new(self, source);
        let unit = pass.unit(root);
        trace!(class = %unit.class_name, synthetic = pass.counter, "finished generation pass");
        Some(unit)
    }

    /// Generates a single expression in a fresh pass.
    pub fn expression<S: BlockSource + ?Sized>(&self, source: &S, node: NodeId) -> String {
        Pass::new(self, source).expr(Some(node))
    }

    /// Generates the statement chain starting at `head` in a fresh pass.
    ///
    /// Lines are unindented and newline terminated. `ctx` is copied, so declarations made
    /// by the chain do not leak back to the caller.
    pub fn statements<S: BlockSource + ?Sized>(
        &self,
        source: &S,
        head: NodeId,
        ctx: &GenContext,
    ) -> String {
        let mut scope = ctx.clone();
        Pass::new(self, source).chain(Some(head), &mut scope)
    }

    fn find_root<S: BlockSource + ?Sized>(&self, source: &S) -> Option<NodeId> {
        source.top_blocks().into_iter().find(|id| {
            source
                .block_type(*id)
                .and_then(|tag| self.registry.resolve(tag))
                == Some(BlockKind::Extension)
        })
    }
}

/// State owned by one generation pass.
///
/// The counter names synthetic locals (`__i0`, `__handler1`, ...) and starts at zero for
/// every pass. `active` holds the blocks on the current recursion path and `emitted`
/// every block generated so far, so a block linked from two parents is emitted once.
/// `exits` holds the emitted statements whose code returns on every path.
pub(crate) struct Pass<'g, S: ?Sized> {
    source: &'g S,
    registry: &'g BlockRegistry,
    max_depth: usize,
    depth: usize,
    active: AHashSet<NodeId>,
    emitted: AHashSet<NodeId>,
    exits: AHashSet<NodeId>,
    counter: usize,
    class_name: Option<String>,
    anonymous_depth: usize,
    properties: AHashSet<String>,
    routine_params: AHashSet<String>,
}

impl<'g, S: BlockSource + ?Sized> Pass<'g, S> {
    fn new(generator: &'g Generator, source: &'g S) -> Self {
        Self {
            source,
            registry: &generator.registry,
            max_depth: generator.max_depth,
            depth: 0,
            active: AHashSet::new(),
            emitted: AHashSet::new(),
            exits: AHashSet::new(),
            counter: 0,
            class_name: None,
            anonymous_depth: 0,
            properties: AHashSet::new(),
            routine_params: AHashSet::new(),
        }
    }

    fn kind(&self, id: NodeId) -> Option<BlockKind> {
        self.source
            .block_type(id)
            .and_then(|tag| self.registry.resolve(tag))
    }

    fn block_type(&self, id: NodeId) -> &'g str {
        self.source.block_type(id).unwrap_or("")
    }

    fn field(&self, id: NodeId, name: &str) -> Option<&'g FieldValue> {
        self.source.field(id, name)
    }

    /// The first non-blank field among `names`, as text.
    fn text_field(&self, id: NodeId, names: &[&str]) -> Option<String> {
        names
            .iter()
            .filter_map(|name| self.field(id, name))
            .find(|value| !value.is_blank())
            .map(|value| value.to_string())
    }

    fn text_field_or(&self, id: NodeId, names: &[&str], default: &str) -> String {
        self.text_field(id, names)
            .unwrap_or_else(|| default.to_string())
    }

    /// The first connected value socket among `names`.
    fn socket(&self, id: NodeId, names: &[&str]) -> Option<NodeId> {
        names.iter().find_map(|name| self.source.input(id, name))
    }

    fn next_synthetic(&mut self, prefix: &str) -> String {
        let name = format!("{}{}", prefix, self.counter);
        self.counter += 1;
        name
    }

    /// How generated code refers to the extension instance. Inside an anonymous
    /// `Runnable`, plain `this` would be the runnable.
    fn this_ref(&self) -> String {
        match &self.class_name {
            Some(class_name) if self.anonymous_depth > 0 => format!("{}.this", class_name),
            _ => "this".to_string(),
        }
    }

    /// How generated code names the variable `name`. A property renamed away from a
    /// skeleton member is reached through its storage field unless a parameter of the
    /// current routine shadows it.
    fn variable_ref(&self, name: &str) -> String {
        let field = storage_field(name);
        if field != name
            && self.properties.contains(&field)
            && !self.routine_params.contains(name)
        {
            field
        } else {
            name.to_string()
        }
    }

    /// Runs `rule` for block `id` with the depth and cycle guards in place.
    fn guarded<T>(
        &mut self,
        id: NodeId,
        rule: impl FnOnce(&mut Self) -> T,
    ) -> Result<T, GenerateError> {
        if self.depth >= self.max_depth {
            warn!(node = %id, limit = self.max_depth, "depth limit reached");
            return Err(GenerateError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        if !self.active.insert(id) {
            warn!(node = %id, "block is connected into its own subtree");
            return Err(GenerateError::Cycle {
                node: id,
                block_type: self.block_type(id).to_string(),
            });
        }
        if !self.emitted.insert(id) {
            self.active.remove(&id);
            warn!(node = %id, "block is connected under more than one parent");
            return Err(GenerateError::SharedBlock {
                node: id,
                block_type: self.block_type(id).to_string(),
            });
        }
        self.depth += 1;
        let out = rule(self);
        self.depth -= 1;
        self.active.remove(&id);
        Ok(out)
    }
}

/// Prefixes every non-empty line of `code` with `levels` indents.
pub(crate) fn indent(code: &str, levels: usize) -> String {
    let pad = INDENT.repeat(levels);
    let mut out = String::with_capacity(code.len() + pad.len() * 8);
    for line in code.lines() {
        if !line.trim().is_empty() {
            out.push_str(&pad);
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

/// Wraps `code` in parentheses unless it already binds tighter than any operator it
/// could be placed next to.
pub(crate) fn operand(code: String) -> String {
    if is_tight(&code) {
        code
    } else {
        format!("({})", code)
    }
}

/// Strips one pair of parentheses enclosing the whole of `code`, for `if (...)` heads.
pub(crate) fn unwrap_parens(code: &str) -> &str {
    let trimmed = code.trim();
    if trimmed.starts_with('(') && trimmed.ends_with(')') && closes_at_end(trimmed) {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// True when the `(` at the start of `code` is matched by its final character.
fn closes_at_end(code: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let last = code.len() - 1;
    for (i, c) in code.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == last;
                }
            }
            _ => {}
        }
    }
    false
}

fn is_tight(code: &str) -> bool {
    let code = code.trim();
    if code.is_empty() || code.starts_with(['-', '+', '!', '~']) {
        return false;
    }
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in code.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ if depth == 0 && (c.is_whitespace() || "+-*/%<>=!&|^?:".contains(c)) => {
                return false;
            }
            _ => {}
        }
    }
    depth == 0 && quote.is_none()
}
