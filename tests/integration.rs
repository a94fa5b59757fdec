//! End-to-end tests: complete graphs in, complete Java units out.
mod common;
use common::{add_extension, add_method, add_number, add_text, add_variable, append_declaration};
use kumitate::generator::MISSING_ROOT_PLACEHOLDER;
use kumitate::prelude::*;
use std::path::Path;

fn generate_unit(graph: &GraphSnapshot) -> GeneratedUnit {
    Generator::new()
        .generate_unit(graph)
        .expect("graph should have an extension root")
}

fn add_property(
    graph: &mut GraphSnapshot,
    root: NodeId,
    name: &str,
    ty: &str,
    default: &str,
) -> NodeId {
    let property = graph.add_block("ai2_property");
    graph
        .set_field(property, "NAME", name)
        .set_field(property, "TYPE", ty)
        .set_field(property, "DEFAULT", default);
    append_declaration(graph, root, "PROPERTIES", property);
    property
}

#[test]
fn test_empty_extension() {
    let mut graph = GraphSnapshot::new();
    add_extension(&mut graph, "com.example.ext", "Demo");

    let unit = generate_unit(&graph);
    assert_eq!(unit.package, "com.example.ext");
    assert_eq!(unit.class_name, "Demo");
    assert!(unit.source.starts_with("package com.example.ext;\n\nimport android.content.Context;\n"));
    assert!(unit.source.contains("public class Demo extends AndroidNonvisibleComponent {"));
    assert!(unit.source.ends_with(
        "  public Demo(ComponentContainer container) {\n    super(container.$form());\n    this.context = container.$context();\n  }\n}\n"
    ));
    assert!(!unit.source.contains("@SimpleProperty"));
    assert!(!unit.source.contains("@SimpleFunction"));
    assert!(!unit.source.contains("@SimpleEvent"));
}

#[test]
fn test_text_property_gets_field_getter_and_setter() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    add_property(&mut graph, root, "Greeting", "text", "Hello");

    let source = generate_unit(&graph).source;
    assert!(source.contains("  private String greeting = \"Hello\";\n"));
    assert!(source.contains(
        "  @SimpleProperty(description = \"Greeting value\")\n  public String Greeting() {\n    return this.greeting;\n  }\n"
    ));
    assert!(source.contains(
        "  @SimpleProperty(description = \"Set Greeting\")\n  public void Greeting(String value) {\n    this.greeting = value;\n  }\n"
    ));
}

#[test]
fn test_read_only_property_has_no_setter() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let property = add_property(&mut graph, root, "Limit", "int", "10");
    graph.set_field(property, "READONLY", true);

    let source = generate_unit(&graph).source;
    assert!(source.contains("  private int limit = 10;\n"));
    assert!(source.contains("public int Limit() {"));
    assert!(!source.contains("public void Limit("));
}

#[test]
fn test_property_named_context_does_not_clash() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    add_property(&mut graph, root, "context", "String", "");

    let source = generate_unit(&graph).source;
    assert!(source.contains("  private String context_ = \"\";\n"));
    assert!(source.contains("    return this.context_;\n"));
}

#[test]
fn test_property_named_context_is_read_and_written_through_its_field() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    add_property(&mut graph, root, "context", "String", "");
    let method = add_method(&mut graph, root, "Rename", "String", "");

    let first = add_text(&mut graph, "x");
    let set = graph.add_block("ai2_set");
    graph
        .set_field(set, "NAME", "context")
        .connect_input(set, "VALUE", first);
    let second = add_text(&mut graph, "y");
    let assign = graph.add_block("variables_set");
    graph
        .set_field(assign, "VAR", "context")
        .connect_input(assign, "VALUE", second);
    let read = add_variable(&mut graph, "context");
    let ret = graph.add_block("ai2_return");
    graph.connect_input(ret, "VALUE", read);
    graph
        .set_next(set, assign)
        .set_next(assign, ret);
    graph.connect_statement(method, "BODY", set);

    let echo = add_method(&mut graph, root, "Echo", "Object", "context:Object");
    let param = add_variable(&mut graph, "context");
    let echo_ret = graph.add_block("ai2_return");
    graph.connect_input(echo_ret, "VALUE", param);
    graph.connect_statement(echo, "BODY", echo_ret);

    let source = generate_unit(&graph).source;
    assert!(source.contains(
        "    this.context_ = \"x\";\n    context_ = \"y\";\n    return String.valueOf(context_);\n  }\n"
    ));
    assert!(source.contains("  public Object echo(Object context) throws Exception {\n    return context;\n  }\n"));
    assert!(!source.contains("this.context = \"x\""));
}

#[test]
fn test_text_routine_wraps_collection_return() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let method = add_method(&mut graph, root, "Shout", "text", "");
    let a = add_text(&mut graph, "a");
    let b = add_text(&mut graph, "b");
    let list = graph.add_block("lists_create_with");
    graph
        .set_field(list, "ITEMS", 2)
        .connect_input(list, "ADD0", a)
        .connect_input(list, "ADD1", b);
    let ret = graph.add_block("ai2_return");
    graph.connect_input(ret, "VALUE", list);
    graph.connect_statement(method, "BODY", ret);

    let source = generate_unit(&graph).source;
    assert!(source.contains(
        "  @SimpleFunction(description = \"Shout function\")\n  public String shout() throws Exception {\n"
    ));
    assert!(source.contains(
        "    return String.valueOf(new java.util.ArrayList<Object>(java.util.Arrays.asList(\"a\", \"b\")));\n"
    ));
    assert_eq!(source.matches("return ").count(), 1);
}

#[test]
fn test_empty_typed_routine_returns_default_once() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    add_method(&mut graph, root, "Answer", "int", "");

    let source = generate_unit(&graph).source;
    assert!(source.contains("  public int answer() throws Exception {\n    return 0;\n  }\n"));
    assert_eq!(source.matches("return ").count(), 1);
}

#[test]
fn test_void_routine_has_no_default_return() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    add_method(&mut graph, root, "Reset", "", "");

    let source = generate_unit(&graph).source;
    assert!(source.contains("  public void reset() throws Exception {\n  }\n"));
    assert!(!source.contains("return"));
}

#[test]
fn test_routine_parameters_are_known_names() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let method = add_method(&mut graph, root, "Add", "int", "a:int, b:int");
    let a = add_variable(&mut graph, "a");
    let one = add_number(&mut graph, 1.0);
    let assign = graph.add_block("variables_set");
    graph
        .set_field(assign, "VAR", "a")
        .connect_input(assign, "VALUE", one);
    let b = add_variable(&mut graph, "b");
    let sum = graph.add_block("math_arithmetic");
    graph
        .set_field(sum, "OP", "ADD")
        .connect_input(sum, "A", a)
        .connect_input(sum, "B", b);
    let ret = graph.add_block("ai2_return");
    graph.connect_input(ret, "VALUE", sum);
    graph.set_next(assign, ret);
    graph.connect_statement(method, "BODY", assign);

    let source = generate_unit(&graph).source;
    assert!(source.contains(
        "  public int add(int a, int b) throws Exception {\n    a = 1;\n    return (a + b);\n  }\n"
    ));
}

#[test]
fn test_routine_returning_on_every_branch_gets_no_default() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let method = add_method(&mut graph, root, "Sign", "int", "x:int");

    let x = add_variable(&mut graph, "x");
    let zero = add_number(&mut graph, 0.0);
    let cond = graph.add_block("logic_compare");
    graph
        .set_field(cond, "OP", "GT")
        .connect_input(cond, "A", x)
        .connect_input(cond, "B", zero);
    let one = add_number(&mut graph, 1.0);
    let positive = graph.add_block("ai2_return");
    graph.connect_input(positive, "VALUE", one);
    let minus_one = add_number(&mut graph, -1.0);
    let negative = graph.add_block("ai2_return");
    graph.connect_input(negative, "VALUE", minus_one);
    let branch = graph.add_block("controls_if");
    graph
        .connect_input(branch, "IF0", cond)
        .connect_statement(branch, "DO0", positive)
        .connect_statement(branch, "ELSE", negative);
    graph.connect_statement(method, "BODY", branch);

    let source = generate_unit(&graph).source;
    assert!(source.contains(
        "    if (x > 0) {\n      return 1;\n    } else {\n      return -1;\n    }\n  }\n"
    ));
    assert!(!source.contains("return 0;"));
}

#[test]
fn test_routine_with_partial_return_gets_default() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let method = add_method(&mut graph, root, "Maybe", "boolean", "flag:boolean");
    let flag = add_variable(&mut graph, "flag");
    let yes = graph.add_block("logic_boolean");
    graph.set_field(yes, "BOOL", "TRUE");
    let ret = graph.add_block("ai2_return");
    graph.connect_input(ret, "VALUE", yes);
    let branch = graph.add_block("controls_if");
    graph
        .connect_input(branch, "IF0", flag)
        .connect_statement(branch, "DO0", ret);
    graph.connect_statement(method, "BODY", branch);

    let source = generate_unit(&graph).source;
    assert!(source.contains("      return true;\n    }\n    return false;\n  }\n"));
}

#[test]
fn test_event_trigger_method() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let event = graph.add_block("ai2_event");
    graph
        .set_field(event, "NAME", "data ready")
        .set_field(event, "PARAMS", "value:String");
    append_declaration(&mut graph, root, "EVENTS", event);

    let source = generate_unit(&graph).source;
    assert!(source.contains(
        "  @SimpleEvent(description = \"data ready event\")\n  public void DataReady(String value) {\n    EventDispatcher.dispatchEvent(this, \"DataReady\", value);\n  }\n"
    ));
}

#[test]
fn test_members_follow_declaration_order() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let event = graph.add_block("ai2_event");
    graph.set_field(event, "NAME", "Done");
    append_declaration(&mut graph, root, "EVENTS", event);
    add_method(&mut graph, root, "First", "", "");
    add_method(&mut graph, root, "Second", "", "");
    add_property(&mut graph, root, "Name", "String", "");

    let source = generate_unit(&graph).source;
    let property = source.find("public String Name()").unwrap();
    let first = source.find("public void first()").unwrap();
    let second = source.find("public void second()").unwrap();
    let trigger = source.find("public void Done()").unwrap();
    assert!(property < first);
    assert!(first < second);
    assert!(second < trigger);
}

#[test]
fn test_wrong_kind_in_container_is_skipped() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let stray = graph.add_block("ai2_method");
    graph.set_field(stray, "NAME", "Stray");
    append_declaration(&mut graph, root, "PROPERTIES", stray);
    add_property(&mut graph, root, "Kept", "String", "");

    let source = generate_unit(&graph).source;
    assert!(!source.contains("stray"));
    assert!(source.contains("public String Kept()"));
}

#[test]
fn test_metadata_annotations() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    graph
        .set_field(root, "DESC", "Says \"hi\"")
        .set_field(root, "VERSION", 3)
        .set_field(root, "AUTHOR", "Jo")
        .set_field(root, "HELP_URL", "https://example.com/help")
        .set_field(root, "LIBRARIES", "a.jar, b.jar");

    let source = generate_unit(&graph).source;
    assert!(source.contains("/**\n * Says \"hi\"\n *\n * @author Jo\n */\n"));
    assert!(source.contains(
        "@DesignerComponent(version = 3, description = \"Says \\\"hi\\\"\", category = ComponentCategory.EXTENSION, nonVisible = true, iconName = \"\", helpUrl = \"https://example.com/help\")\n@UsesLibraries(libraries = \"a.jar, b.jar\")\n@SimpleObject(external = true)\n"
    ));
}

#[test]
fn test_blank_metadata_is_omitted() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    graph
        .set_field(root, "HELP_URL", "  ")
        .set_field(root, "LIBRARIES", "");

    let source = generate_unit(&graph).source;
    assert!(source.contains(
        "@DesignerComponent(version = 1, description = \"An App Inventor 2 extension\", category = ComponentCategory.EXTENSION, nonVisible = true, iconName = \"\")\n@SimpleObject(external = true)\n"
    ));
    assert!(!source.contains("helpUrl"));
    assert!(!source.contains("@UsesLibraries"));
    assert!(!source.contains("@author"));
}

#[test]
fn test_extra_imports_are_deduplicated() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    graph.set_field(root, "IMPORTS", "java.util.*, android.graphics.Color;");

    let source = generate_unit(&graph).source;
    assert_eq!(source.matches("import java.util.*;\n").count(), 1);
    assert!(source.contains("import android.graphics.Color;\n"));
}

#[test]
fn test_background_code_refers_to_outer_instance() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    add_property(&mut graph, root, "Counter", "int", "0");
    let method = add_method(&mut graph, root, "Start", "", "");
    let one = add_number(&mut graph, 1.0);
    let set = graph.add_block("ai2_set");
    graph
        .set_field(set, "NAME", "Counter")
        .connect_input(set, "VALUE", one);
    let thread = graph.add_block("thread_run");
    graph.connect_statement(thread, "DO", set);
    graph.connect_statement(method, "BODY", thread);

    let source = generate_unit(&graph).source;
    assert!(source.contains("        Demo.this.counter = 1;\n"));
}

#[test]
fn test_missing_root_yields_placeholder() {
    let generator = Generator::new();
    let empty = GraphSnapshot::new();
    assert_eq!(generator.generate(&empty), MISSING_ROOT_PLACEHOLDER);
    assert!(generator.generate_unit(&empty).is_none());

    let mut stray = GraphSnapshot::new();
    stray.add_block("text_print");
    stray.add_block("mystery");
    assert_eq!(generator.generate(&stray), MISSING_ROOT_PLACEHOLDER);
}

#[test]
fn test_root_found_after_other_top_blocks() {
    let mut graph = GraphSnapshot::new();
    graph.add_block("text_print");
    add_extension(&mut graph, "com.example.ext", "Second");

    assert_eq!(generate_unit(&graph).class_name, "Second");
}

#[test]
fn test_unknown_blocks_everywhere_still_generate() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    for socket in ["PROPERTIES", "METHODS", "EVENTS"] {
        let unknown = graph.add_block("mystery");
        append_declaration(&mut graph, root, socket, unknown);
    }
    let method = add_method(&mut graph, root, "Work", "String", "");
    let body_unknown = graph.add_block("mystery");
    let value_unknown = graph.add_block("mystery");
    let ret = graph.add_block("ai2_return");
    graph
        .connect_input(ret, "VALUE", value_unknown)
        .set_next(body_unknown, ret);
    graph.connect_statement(method, "BODY", body_unknown);
    let cond_unknown = graph.add_block("mystery");
    let branch = graph.add_block("controls_if");
    graph.connect_input(branch, "IF0", cond_unknown);
    let loop_body = graph.add_block("mystery");
    graph.connect_statement(branch, "DO0", loop_body);
    graph.set_next(ret, branch);

    let source = Generator::new().generate(&graph);
    assert!(source.contains("    // unsupported block: mystery\n"));
    assert!(source.contains("    return String.valueOf(null);\n"));
    assert!(source.contains("    // unreachable after return: controls_if\n"));
    assert!(source.ends_with("}\n"));
}

#[test]
fn test_generation_is_deterministic() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let method = add_method(&mut graph, root, "Loop", "", "");
    let first = graph.add_block("controls_repeat");
    graph.set_field(first, "TIMES", 3);
    let second = graph.add_block("timer_delay");
    graph.set_next(first, second);
    graph.connect_statement(method, "BODY", first);

    let generator = Generator::new();
    let once = generator.generate(&graph);
    let twice = generator.generate(&graph);
    assert_eq!(once, twice);
    assert!(once.contains("__i0"));
    assert!(once.contains("__handler1"));
}

#[test]
fn test_cyclic_routine_body_terminates() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let method = add_method(&mut graph, root, "Spin", "", "");
    let repeat = graph.add_block("controls_repeat");
    graph
        .set_field(repeat, "TIMES", 2)
        .connect_statement(repeat, "DO", repeat);
    graph.connect_statement(method, "BODY", repeat);

    let source = Generator::new().generate(&graph);
    assert!(source.contains("connected back into its own subtree"));
}

#[test]
fn test_depth_limit_applies_to_routine_bodies() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let method = add_method(&mut graph, root, "Deep", "", "");
    let print = graph.add_block("text_print");
    graph.connect_statement(method, "BODY", print);

    let generator = Generator::builder().with_max_depth(1).build();
    let source = generator.generate(&graph);
    assert!(source.contains("public void deep() throws Exception {"));
    assert!(source.contains("depth limit of 1"));
}

#[test]
fn test_typed_routine_keeps_a_return_when_its_return_is_cut_off() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let method = add_method(&mut graph, root, "Answer", "int", "");
    let seven = add_number(&mut graph, 7.0);
    let ret = graph.add_block("ai2_return");
    graph.connect_input(ret, "VALUE", seven);
    graph.connect_statement(method, "BODY", ret);

    let generator = Generator::builder().with_max_depth(1).build();
    let source = generator.generate(&graph);
    assert!(source.contains(
        "  public int answer() throws Exception {\n    // generation skipped for block 'ai2_return': nesting exceeds the depth limit of 1\n    return 0;\n  }\n"
    ));
}

#[test]
fn test_routines_sharing_a_return_each_return() {
    let mut graph = GraphSnapshot::new();
    let root = add_extension(&mut graph, "com.example.ext", "Demo");
    let first = add_method(&mut graph, root, "First", "int", "");
    let second = add_method(&mut graph, root, "Second", "int", "");
    let seven = add_number(&mut graph, 7.0);
    let ret = graph.add_block("ai2_return");
    graph.connect_input(ret, "VALUE", seven);
    graph
        .connect_statement(first, "BODY", ret)
        .connect_statement(second, "BODY", ret);

    let source = generate_unit(&graph).source;
    assert!(source.contains("  public int first() throws Exception {\n    return 7;\n  }\n"));
    let tail = source
        .split("public int second() throws Exception {\n")
        .nth(1)
        .expect("second routine is generated");
    assert!(tail.starts_with("    // generation skipped for block 'ai2_return'"));
    assert!(tail.contains("more than one parent"));
    assert!(tail.contains("\n    return 0;\n  }\n"));
}

#[test]
fn test_file_path_follows_package() {
    let mut graph = GraphSnapshot::new();
    add_extension(&mut graph, "com.example.ext", "Demo");
    assert_eq!(
        generate_unit(&graph).file_path(),
        Path::new("com/example/ext/Demo.java")
    );

    let mut bare = GraphSnapshot::new();
    bare.add_block("ai2_extension");
    let unit = generate_unit(&bare);
    assert_eq!(unit.package, "com.example");
    assert_eq!(unit.class_name, "MyExtension");
    assert_eq!(unit.file_path(), Path::new("com/example/MyExtension.java"));
}

#[test]
fn test_json_document_round_trip() {
    let json = r#"{
        "blocks": [
            {
                "id": "root",
                "type": "ai2_extension",
                "fields": { "PACKAGE": "com.example.ext", "CLASSNAME": "Demo" },
                "statements": { "METHODS": "m1" }
            },
            {
                "id": "m1",
                "type": "ai2_method",
                "fields": { "NAME": "Twice", "RET": "int", "PARAMS": "n:int" },
                "statements": { "BODY": "r1" }
            },
            {
                "id": "r1",
                "type": "ai2_return",
                "inputs": { "VALUE": "mul" }
            },
            {
                "id": "mul",
                "type": "math_arithmetic",
                "fields": { "OP": "MULTIPLY" },
                "inputs": { "A": "n", "B": "two", "C": "missing" }
            },
            { "id": "n", "type": "variables_get", "fields": { "VAR": "n" } },
            { "id": "two", "type": "math_number", "fields": { "NUM": 2 } }
        ]
    }"#;

    let definition = GraphDefinition::from_json(json).unwrap();
    let graph = GraphSnapshot::from_definition(&definition).unwrap();
    assert_eq!(graph.len(), 6);

    let source = Generator::new().generate(&graph);
    assert!(source.contains(
        "  public int twice(int n) throws Exception {\n    return (n * 2);\n  }\n"
    ));

    let reparsed = GraphDefinition::from_json(&definition.to_json().unwrap()).unwrap();
    let regraph = GraphSnapshot::from_definition(&reparsed).unwrap();
    assert_eq!(Generator::new().generate(&regraph), source);
}

#[test]
fn test_duplicate_block_ids_are_rejected() {
    let json = r#"{ "blocks": [
        { "id": "a", "type": "text" },
        { "id": "a", "type": "math_number" }
    ] }"#;
    let definition = GraphDefinition::from_json(json).unwrap();
    match GraphSnapshot::from_definition(&definition) {
        Err(GraphError::DuplicateBlockId(id)) => assert_eq!(id, "a"),
        other => panic!("expected a duplicate id error, got {:?}", other.map(|g| g.len())),
    }
}

#[test]
fn test_malformed_json_is_an_error() {
    assert!(matches!(
        GraphDefinition::from_json("{ not json"),
        Err(GraphError::JsonParseError(_))
    ));
}
