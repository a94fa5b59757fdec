//! Pure string transforms shared by every generation rule.
//!
//! Nothing in here can fail: malformed input is coerced into something the Java
//! compiler accepts, so a half-finished block never stops generation.

use crate::block::{JavaType, TypeClass};

/// Placeholder for an identifier that sanitizes down to nothing (camelCase positions).
pub const CAMEL_PLACEHOLDER: &str = "_id";
/// Placeholder for an identifier that sanitizes down to nothing (PascalCase positions).
pub const PASCAL_PLACEHOLDER: &str = "MyIdentifier";

const JAVA_KEYWORDS: &[&str] = &[
    "abstract",
    "assert",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extends",
    "false",
    "final",
    "finally",
    "float",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "int",
    "interface",
    "long",
    "native",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "strictfp",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "true",
    "try",
    "void",
    "volatile",
    "while",
];

/// Identifier casing convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casing {
    /// Routines, variables and storage fields.
    Camel,
    /// Class names and property accessors.
    Pascal,
}

/// A routine or event parameter parsed from a `name:type, ...` literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: JavaType,
}

/// Decodes the HTML entities editors leave behind in serialized field text.
///
/// Single pass, so `&amp;lt;` decodes to `&lt;` rather than `<`.
pub fn decode_html_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match decode_entity(rest) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(s: &str) -> Option<(char, usize)> {
    let end = s.find(';')?;
    if end > 10 {
        return None;
    }
    let body = &s[1..end];
    let ch = match body {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)?
        }
    };
    Some((ch, end + 1))
}

/// Coerces arbitrary user text into a valid Java identifier in the requested casing.
///
/// The result always matches `[A-Za-z_$][A-Za-z0-9_$]*` and is never a reserved word.
pub fn to_identifier(raw: &str, casing: Casing) -> String {
    let decoded = decode_html_entities(raw);
    let mut ident = String::new();
    let words = decoded
        .split(|c: char| c.is_whitespace() || (c.is_ascii_punctuation() && c != '_' && c != '$'))
        .filter(|w| !w.is_empty())
        .map(collapse_foreign_runs);

    for (i, word) in words.enumerate() {
        if i == 0 && casing == Casing::Camel {
            ident.push_str(&lower_first(&word));
        } else {
            ident.push_str(&upper_first(&word));
        }
    }

    if ident.chars().all(|c| c == '_') {
        return match casing {
            Casing::Camel => CAMEL_PLACEHOLDER.to_string(),
            Casing::Pascal => PASCAL_PLACEHOLDER.to_string(),
        };
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if JAVA_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

fn collapse_foreign_runs(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut in_run = false;
    for c in word.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn lower_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Backslash-escapes text for embedding between double quotes in Java source.
pub fn escape_quotes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// A complete Java string literal for `s`, entities decoded and quotes escaped.
pub fn java_string(s: &str) -> String {
    format!("\"{}\"", escape_quotes(&decode_html_entities(s)))
}

/// Renders the initializer for a declared field of type `ty` from the user's default text.
pub fn render_default(ty: &JavaType, literal: &str) -> String {
    let trimmed = literal.trim();
    match ty.class() {
        TypeClass::Text => java_string(literal),
        TypeClass::Bool => {
            if trimmed.eq_ignore_ascii_case("true") {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        TypeClass::Int => trimmed
            .parse::<i32>()
            .map(|n| n.to_string())
            .unwrap_or_else(|_| "0".to_string()),
        TypeClass::Float => {
            let digits = trimmed.trim_end_matches(['f', 'F']);
            match digits.parse::<f64>() {
                Ok(n) if n.is_finite() && !digits.is_empty() => format!("{}f", digits),
                _ => "0f".to_string(),
            }
        }
        TypeClass::Double => match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => trimmed.to_string(),
            _ => "0.0".to_string(),
        },
        TypeClass::List => "new java.util.ArrayList<>()".to_string(),
        TypeClass::Void | TypeClass::Other => {
            if trimmed.is_empty() {
                "null".to_string()
            } else {
                decode_html_entities(trimmed)
            }
        }
    }
}

/// Parses a `name:type, name:type` parameter literal. Missing types default to `Object`.
pub fn parse_params(text: &str) -> Vec<Param> {
    split_list(text)
        .into_iter()
        .map(|pair| {
            let (name_raw, type_raw) = match pair.split_once(':') {
                Some((name, ty)) => (name.trim(), ty.trim()),
                None => (pair.as_str(), ""),
            };
            let name_raw = if name_raw.is_empty() { "param" } else { name_raw };
            Param {
                name: to_identifier(name_raw, Casing::Camel),
                ty: JavaType::parse(type_raw, "Object"),
            }
        })
        .collect()
}

/// Splits a comma separated literal, dropping blank entries.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|s| decode_html_entities(s.trim()).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Coerces a package clause into dotted valid identifiers, falling back to `com.example`.
pub fn sanitize_package(raw: &str) -> String {
    let decoded = decode_html_entities(raw);
    let filtered: String = decoded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
        .collect();
    let segments: Vec<String> = filtered
        .split('.')
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut segment = s.to_string();
            if segment.starts_with(|c: char| c.is_ascii_digit()) {
                segment.insert(0, '_');
            }
            if JAVA_KEYWORDS.contains(&segment.as_str()) {
                segment.push('_');
            }
            segment
        })
        .collect();
    if segments.is_empty() {
        "com.example".to_string()
    } else {
        segments.join(".")
    }
}

/// Makes text safe to embed in a `//` or `/* */` comment.
pub fn comment_text(s: &str) -> String {
    s.replace(['\r', '\n'], " ").replace("*/", "* /")
}
