use crate::sanitize::decode_html_entities;

/// The broad class of a declared type, which decides literal syntax and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Void,
    Text,
    Bool,
    Int,
    Float,
    Double,
    List,
    Other,
}

/// A declared Java type as entered in a property, routine or parameter declaration.
///
/// The spelling is preserved (`Integer` stays `Integer`); the class drives generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JavaType {
    name: String,
    class: TypeClass,
}

impl JavaType {
    /// Parses a type tag. Whitespace is removed and entities decoded; an empty tag
    /// falls back to `fallback`. The short vocabulary (`text`, `bool`, `object`, `list`)
    /// maps onto the Java names.
    pub fn parse(raw: &str, fallback: &str) -> Self {
        let cleaned: String = decode_html_entities(raw)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let name = match cleaned.to_ascii_lowercase().as_str() {
            "" => fallback.to_string(),
            "text" => "String".to_string(),
            "bool" => "boolean".to_string(),
            "object" => "Object".to_string(),
            "list" => "List".to_string(),
            _ => cleaned,
        };
        let class = classify(&name);
        Self { name, class }
    }

    pub fn void() -> Self {
        Self {
            name: "void".to_string(),
            class: TypeClass::Void,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> TypeClass {
        self.class
    }

    pub fn is_void(&self) -> bool {
        self.class == TypeClass::Void
    }

    pub fn is_text(&self) -> bool {
        self.class == TypeClass::Text
    }

    /// The literal returned by a routine of this type when no explicit return ends its body.
    pub fn return_default(&self) -> &'static str {
        match self.class {
            TypeClass::Text => "\"\"",
            TypeClass::Bool => "false",
            TypeClass::Int => "0",
            TypeClass::Float => "0f",
            TypeClass::Double => "0.0",
            TypeClass::Void | TypeClass::List | TypeClass::Other => "null",
        }
    }
}

fn classify(name: &str) -> TypeClass {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "void" => TypeClass::Void,
        "boolean" | "java.lang.boolean" => TypeClass::Bool,
        "int" | "integer" | "java.lang.integer" => TypeClass::Int,
        "float" | "java.lang.float" => TypeClass::Float,
        "double" | "java.lang.double" => TypeClass::Double,
        _ if name.contains("[]") => TypeClass::Other,
        _ if lower == "list"
            || lower.starts_with("list<")
            || lower.starts_with("java.util.list")
            || lower.starts_with("arraylist")
            || lower.starts_with("java.util.arraylist") =>
        {
            TypeClass::List
        }
        _ if lower.ends_with("string") => TypeClass::Text,
        _ => TypeClass::Other,
    }
}
