//! Unit tests for the sanitizer, block vocabulary and registry.
mod common;
use common::assert_valid_identifier;
use kumitate::block::{BlockRole, TypeClass};
use kumitate::generator::BlockRegistry;
use kumitate::prelude::*;
use kumitate::sanitize::{
    Casing, comment_text, decode_html_entities, escape_quotes, java_string, parse_params,
    render_default, sanitize_package, to_identifier,
};

#[test]
fn test_identifier_casing() {
    assert_eq!(to_identifier("my variable", Casing::Camel), "myVariable");
    assert_eq!(to_identifier("my variable", Casing::Pascal), "MyVariable");
    assert_eq!(to_identifier("Greeting", Casing::Camel), "greeting");
    assert_eq!(to_identifier("greeting", Casing::Pascal), "Greeting");
    assert_eq!(to_identifier("user_name", Casing::Camel), "user_name");
    assert_eq!(to_identifier("$price", Casing::Camel), "$price");
}

#[test]
fn test_identifier_fallbacks() {
    assert_eq!(to_identifier("", Casing::Camel), "_id");
    assert_eq!(to_identifier("!!!", Casing::Camel), "_id");
    assert_eq!(to_identifier("   ", Casing::Pascal), "MyIdentifier");
    assert_eq!(to_identifier("123abc", Casing::Camel), "_123abc");
    assert_eq!(to_identifier("class", Casing::Camel), "class_");
    assert_eq!(to_identifier("&lt;tag&gt;", Casing::Camel), "tag");
}

#[test]
fn test_identifier_collapses_foreign_characters() {
    assert_eq!(to_identifier("café au lait", Casing::Camel), "caf_AuLait");
}

#[test]
fn test_identifier_is_always_valid() {
    let inputs = [
        "",
        "0",
        "42 things",
        "---",
        "__",
        "hello-world",
        "ünïcödé",
        "a.b.c",
        "null",
        "for each",
        "&amp;&amp;",
        "\t\n",
        "日本語",
    ];
    for input in inputs {
        assert_valid_identifier(&to_identifier(input, Casing::Camel));
        assert_valid_identifier(&to_identifier(input, Casing::Pascal));
    }
}

#[test]
fn test_entity_decoding_is_single_pass() {
    assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
    assert_eq!(decode_html_entities("&#65;&#x42;"), "AB");
    assert_eq!(decode_html_entities("AT&T"), "AT&T");
    assert_eq!(decode_html_entities("&quot;hi&quot;"), "\"hi\"");
}

#[test]
fn test_escaping() {
    assert_eq!(escape_quotes("say \"hi\"\n"), "say \\\"hi\\\"\\n");
    assert_eq!(escape_quotes("C:\\temp"), "C:\\\\temp");
    assert_eq!(java_string("a&amp;b"), "\"a&b\"");
    assert_eq!(comment_text("a */ b\nc"), "a * / b c");
}

#[test]
fn test_render_default_by_type() {
    let render = |ty: &str, literal: &str| render_default(&JavaType::parse(ty, "Object"), literal);

    assert_eq!(render("String", "Hello"), "\"Hello\"");
    assert_eq!(render("String", "say \"x\""), "\"say \\\"x\\\"\"");
    assert_eq!(render("boolean", "TRUE"), "true");
    assert_eq!(render("boolean", "yes"), "false");
    assert_eq!(render("int", "42"), "42");
    assert_eq!(render("int", "4.5"), "0");
    assert_eq!(render("int", "abc"), "0");
    assert_eq!(render("float", "1.5"), "1.5f");
    assert_eq!(render("float", ""), "0f");
    assert_eq!(render("double", "x"), "0.0");
    assert_eq!(render("List", ""), "new java.util.ArrayList<>()");
    assert_eq!(render("Object", ""), "null");
    assert_eq!(render("Object", "new Object()"), "new Object()");
}

#[test]
fn test_parse_params() {
    let params = parse_params("a:String, b:int");
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].name, "a");
    assert_eq!(params[0].ty.name(), "String");
    assert_eq!(params[1].name, "b");
    assert_eq!(params[1].ty.class(), TypeClass::Int);

    let untyped = parse_params("count, :int, first name:String");
    assert_eq!(untyped[0].name, "count");
    assert_eq!(untyped[0].ty.name(), "Object");
    assert_eq!(untyped[1].name, "param");
    assert_eq!(untyped[2].name, "firstName");

    assert!(parse_params("").is_empty());
    assert!(parse_params(" , ,").is_empty());
}

#[test]
fn test_sanitize_package() {
    assert_eq!(sanitize_package("com.example.ext"), "com.example.ext");
    assert_eq!(sanitize_package(""), "com.example");
    assert_eq!(sanitize_package("!!!"), "com.example");
    assert_eq!(sanitize_package("com.1st.class"), "com._1st.class_");
    assert_eq!(sanitize_package("com..example!"), "com.example");
}

#[test]
fn test_field_value_interpretation() {
    assert_eq!(FieldValue::Number(5.0).to_string(), "5");
    assert_eq!(FieldValue::Number(2.5).to_string(), "2.5");
    assert_eq!(FieldValue::Bool(true).to_string(), "TRUE");
    assert!(FieldValue::from("TRUE").is_true());
    assert!(!FieldValue::from("no").is_true());
    assert_eq!(FieldValue::from(" 3.5 ").as_f64(), Some(3.5));
    assert_eq!(FieldValue::Number(f64::NAN).as_f64(), None);
    assert_eq!(FieldValue::from("abc").as_f64(), None);
    assert!(FieldValue::from("  ").is_blank());
    assert!(!FieldValue::Number(0.0).is_blank());
}

#[test]
fn test_field_value_deserialization() {
    let number: FieldValue = serde_json::from_str("42").unwrap();
    let text: FieldValue = serde_json::from_str("\"x\"").unwrap();
    let flag: FieldValue = serde_json::from_str("true").unwrap();
    assert_eq!(number, FieldValue::Number(42.0));
    assert_eq!(text, FieldValue::Text("x".to_string()));
    assert_eq!(flag, FieldValue::Bool(true));
}

#[test]
fn test_java_type_classes() {
    assert!(JavaType::parse("String", "Object").is_text());
    assert!(JavaType::parse(" java.lang.String ", "Object").is_text());
    assert!(JavaType::parse("", "void").is_void());
    assert_eq!(JavaType::parse("text", "Object").name(), "String");
    assert_eq!(JavaType::parse("bool", "Object").name(), "boolean");
    assert_eq!(JavaType::parse("List<String>", "Object").class(), TypeClass::List);
    assert_eq!(JavaType::parse("String[]", "Object").class(), TypeClass::Other);
    assert_eq!(JavaType::parse("Integer", "Object").class(), TypeClass::Int);
}

#[test]
fn test_java_type_return_defaults() {
    let default_for = |ty: &str| JavaType::parse(ty, "Object").return_default();
    assert_eq!(default_for("int"), "0");
    assert_eq!(default_for("boolean"), "false");
    assert_eq!(default_for("float"), "0f");
    assert_eq!(default_for("double"), "0.0");
    assert_eq!(default_for("String"), "\"\"");
    assert_eq!(default_for("List"), "null");
    assert_eq!(default_for("Object"), "null");
}

#[test]
fn test_block_kind_tags() {
    assert_eq!(BlockKind::from_tag("math_trig"), Some(BlockKind::MathTrig));
    assert_eq!(BlockKind::MathTrig.tag(), "math_trig_simple");
    assert_eq!(BlockKind::from_tag("toast_show"), Some(BlockKind::Toast));
    assert_eq!(BlockKind::from_tag("no_such_block"), None);
    assert_eq!(BlockKind::ControlsIf.to_string(), "controls_if");
    assert_eq!(BlockKind::Extension.role(), BlockRole::Declaration);
    assert_eq!(BlockKind::Text.role(), BlockRole::Expression);
    assert_eq!(BlockKind::ControlsRepeat.role(), BlockRole::Statement);
}

#[test]
fn test_registry_defaults_cover_every_tag() {
    let registry = BlockRegistry::new();
    for kind in BlockKind::ALL {
        for tag in kind.tags() {
            assert_eq!(registry.resolve(tag), Some(*kind), "tag {}", tag);
        }
    }
    assert!(registry.len() >= BlockKind::ALL.len());
    assert!(BlockRegistry::empty().is_empty());
}

#[test]
fn test_registry_mapping() {
    let mut registry = BlockRegistry::new();
    assert!(registry.map_tag("my_if", "controls_if"));
    assert_eq!(registry.resolve("my_if"), Some(BlockKind::ControlsIf));
    assert!(!registry.map_tag("other", "not_a_block"));
    assert_eq!(registry.resolve("other"), None);
}

#[test]
fn test_error_display() {
    let err = GenerateError::Cycle {
        node: NodeId(3),
        block_type: "controls_if".to_string(),
    };
    assert!(err.to_string().contains("#3"));
    assert!(err.to_string().contains("controls_if"));

    let depth = GenerateError::DepthExceeded { limit: 8 };
    assert!(depth.to_string().contains('8'));

    let graph_err = GraphError::DuplicateBlockId("b1".to_string());
    assert!(graph_err.to_string().contains("b1"));
}
