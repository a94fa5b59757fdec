//! Common test utilities for building block graphs.
use kumitate::prelude::*;

/// Adds an extension root with the given package and class name.
#[allow(dead_code)]
pub fn add_extension(graph: &mut GraphSnapshot, package: &str, class_name: &str) -> NodeId {
    let root = graph.add_block("ai2_extension");
    graph
        .set_field(root, "PACKAGE", package)
        .set_field(root, "CLASSNAME", class_name);
    root
}

#[allow(dead_code)]
pub fn add_number(graph: &mut GraphSnapshot, value: f64) -> NodeId {
    let id = graph.add_block("math_number");
    graph.set_field(id, "NUM", value);
    id
}

#[allow(dead_code)]
pub fn add_text(graph: &mut GraphSnapshot, value: &str) -> NodeId {
    let id = graph.add_block("text");
    graph.set_field(id, "TEXT", value);
    id
}

#[allow(dead_code)]
pub fn add_variable(graph: &mut GraphSnapshot, name: &str) -> NodeId {
    let id = graph.add_block("variables_get");
    graph.set_field(id, "VAR", name);
    id
}

/// Adds a two-operand block with an `OP` field and `A`/`B` sockets.
#[allow(dead_code)]
pub fn add_binary(
    graph: &mut GraphSnapshot,
    block_type: &str,
    op: &str,
    a: NodeId,
    b: NodeId,
) -> NodeId {
    let id = graph.add_block(block_type);
    graph
        .set_field(id, "OP", op)
        .connect_input(id, "A", a)
        .connect_input(id, "B", b);
    id
}

/// Links `blocks` into one statement chain, in order.
#[allow(dead_code)]
pub fn link_chain(graph: &mut GraphSnapshot, blocks: &[NodeId]) {
    for pair in blocks.windows(2) {
        graph.set_next(pair[0], pair[1]);
    }
}

/// Adds a routine declaration under `root` (after any routines already there).
#[allow(dead_code)]
pub fn add_method(
    graph: &mut GraphSnapshot,
    root: NodeId,
    name: &str,
    return_type: &str,
    params: &str,
) -> NodeId {
    let method = graph.add_block("ai2_method");
    graph
        .set_field(method, "NAME", name)
        .set_field(method, "RET", return_type)
        .set_field(method, "PARAMS", params);
    append_declaration(graph, root, "METHODS", method);
    method
}

/// Appends a declaration block to the end of a root container chain.
#[allow(dead_code)]
pub fn append_declaration(graph: &mut GraphSnapshot, root: NodeId, socket: &str, block: NodeId) {
    match graph.statement(root, socket) {
        None => {
            graph.connect_statement(root, socket, block);
        }
        Some(mut last) => {
            while let Some(next) = graph.next(last) {
                last = next;
            }
            graph.set_next(last, block);
        }
    }
}

/// Generates one expression in a fresh pass with the default generator.
#[allow(dead_code)]
pub fn expr(graph: &GraphSnapshot, id: NodeId) -> String {
    Generator::new().expression(graph, id)
}

/// Generates a statement chain in a fresh pass with an empty context.
#[allow(dead_code)]
pub fn stmts(graph: &GraphSnapshot, head: NodeId) -> String {
    Generator::new().statements(graph, head, &GenContext::new())
}

/// Asserts `text` matches `[A-Za-z_$][A-Za-z0-9_$]*`.
#[allow(dead_code)]
pub fn assert_valid_identifier(text: &str) {
    let mut chars = text.chars();
    let first = chars.next().expect("identifier must not be empty");
    assert!(
        first.is_ascii_alphabetic() || first == '_' || first == '$',
        "bad first character in {:?}",
        text
    );
    assert!(
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
        "bad character in {:?}",
        text
    );
}
