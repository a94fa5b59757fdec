use super::{GenContext, INDENT, Pass, indent, storage_field};
use crate::block::{BlockKind, FieldValue, JavaType};
use crate::graph::{BlockSource, NodeId};
use crate::sanitize::{
    Casing, comment_text, decode_html_entities, escape_quotes, parse_params, render_default,
    sanitize_package, split_list, to_identifier,
};
use ahash::AHashSet;
use itertools::Itertools;
use std::path::PathBuf;
use tracing::debug;

/// Imports every generated unit carries. Generated code may rely on any of them.
const FIXED_IMPORTS: &[&str] = &[
    "android.content.Context",
    "com.google.appinventor.components.annotations.*",
    "com.google.appinventor.components.runtime.*",
    "com.google.appinventor.components.runtime.util.*",
    "java.util.*",
    "java.net.*",
    "java.io.*",
    "org.json.*",
    "android.os.Handler",
    "android.os.Looper",
    "android.util.Base64",
    "java.text.SimpleDateFormat",
    "java.security.MessageDigest",
    "java.util.regex.*",
    "android.os.Build",
    "android.widget.Toast",
    "android.content.Intent",
    "android.net.Uri",
    "android.content.ClipData",
    "android.content.ClipboardManager",
    "android.os.Vibrator",
];

/// One generated Java compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub package: String,
    pub class_name: String,
    pub source: String,
}

impl GeneratedUnit {
    /// `com/example/ext/Demo.java` for package `com.example.ext` and class `Demo`.
    pub fn file_path(&self) -> PathBuf {
        let mut path: PathBuf = self.package.split('.').collect();
        path.push(format!("{}.java", self.class_name));
        path
    }
}

/// Declared property, resolved before any routine is generated so routines know the
/// property field names.
struct PropertySpec {
    raw_name: String,
    field: String,
    accessor: String,
    ty: JavaType,
    default: String,
    read_only: bool,
}

impl<'g, S: BlockSource + ?Sized> Pass<'g, S> {
    pub(super) fn unit(&mut self, root: NodeId) -> GeneratedUnit {
        let package = sanitize_package(&self.text_field_or(root, &["PACKAGE"], "com.example"));
        let class_name = to_identifier(
            &self.text_field_or(root, &["CLASSNAME"], "MyExtension"),
            Casing::Pascal,
        );
        self.class_name = Some(class_name.clone());

        let properties: Vec<PropertySpec> = self
            .declarations(root, "PROPERTIES", BlockKind::Property)
            .into_iter()
            .map(|id| self.property_spec(id))
            .collect();
        let prop_fields: Vec<String> = properties.iter().map(|p| p.field.clone()).collect();
        self.properties = prop_fields.iter().cloned().collect();

        let mut members: Vec<String> = properties.iter().map(render_property).collect();
        for id in self.declarations(root, "METHODS", BlockKind::Method) {
            members.push(self.declaration(id, |pass| pass.method(id, &prop_fields)));
        }
        for id in self.declarations(root, "EVENTS", BlockKind::Event) {
            members.push(self.declaration(id, |pass| pass.event(id)));
        }

        let mut source = String::new();
        source.push_str(&format!("package {};\n\n", package));
        source.push_str(&self.imports(root));
        source.push('\n');
        source.push_str(&self.javadoc(root));
        source.push_str(&self.annotations(root));
        source.push_str(&format!(
            "public class {c} extends AndroidNonvisibleComponent {{\n\n{i}private final Context context;\n\n{i}public {c}(ComponentContainer container) {{\n{i}{i}super(container.$form());\n{i}{i}this.context = container.$context();\n{i}}}\n",
            c = class_name,
            i = INDENT
        ));
        for member in &members {
            source.push('\n');
            source.push_str(member);
        }
        source.push_str("}\n");

        GeneratedUnit {
            package,
            class_name,
            source,
        }
    }

    /// The declarations of `kind` in the `socket` container of the root. Blocks of any
    /// other kind are skipped.
    fn declarations(&self, root: NodeId, socket: &str, kind: BlockKind) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut seen = AHashSet::new();
        let mut current = self.source.statement(root, socket);
        while let Some(id) = current {
            if !seen.insert(id) {
                break;
            }
            if self.kind(id) == Some(kind) {
                found.push(id);
            } else {
                debug!(
                    container = socket,
                    block_type = self.block_type(id),
                    "skipping block of the wrong kind"
                );
            }
            current = self.source.next(id);
        }
        found
    }

    /// Runs a member renderer behind the cycle and depth guards.
    fn declaration(&mut self, id: NodeId, render: impl FnOnce(&mut Self) -> String) -> String {
        match self.guarded(id, render) {
            Ok(member) => member,
            Err(err) => format!(
                "{}// declaration skipped: {}\n",
                INDENT,
                comment_text(&err.to_string())
            ),
        }
    }

    fn imports(&self, root: NodeId) -> String {
        let mut imports: Vec<String> = FIXED_IMPORTS.iter().map(|i| i.to_string()).collect();
        for extra in split_list(&self.text_field_or(root, &["IMPORTS"], "")) {
            let name: String = extra
                .trim()
                .trim_start_matches("import ")
                .trim_end_matches(';')
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '*'))
                .collect();
            if !name.is_empty() && !imports.contains(&name) {
                imports.push(name);
            }
        }
        imports
            .iter()
            .map(|name| format!("import {};\n", name))
            .join("")
    }

    fn javadoc(&self, root: NodeId) -> String {
        let description = self.text_field_or(root, &["DESC"], "An App Inventor 2 extension");
        let mut doc = format!("/**\n * {}\n", comment_text(&decode_html_entities(&description)));
        if let Some(author) = self.text_field(root, &["AUTHOR"]) {
            doc.push_str(&format!(
                " *\n * @author {}\n",
                comment_text(&decode_html_entities(&author))
            ));
        }
        doc.push_str(" */\n");
        doc
    }

    fn annotations(&self, root: NodeId) -> String {
        let description = self.text_field_or(root, &["DESC"], "An App Inventor 2 extension");
        let version = self
            .field(root, "VERSION")
            .and_then(FieldValue::as_f64)
            .map(|v| v.floor().clamp(1.0, i32::MAX as f64) as i64)
            .unwrap_or(1);
        let help_url = match self.text_field(root, &["HELP_URL"]) {
            Some(url) => format!(", helpUrl = \"{}\"", escape_quotes(&decode_html_entities(&url))),
            None => String::new(),
        };
        let mut out = format!(
            "@DesignerComponent(version = {}, description = \"{}\", category = ComponentCategory.EXTENSION, nonVisible = true, iconName = \"\"{})\n",
            version,
            escape_quotes(&decode_html_entities(&description)),
            help_url
        );
        let libraries = split_list(&self.text_field_or(root, &["LIBRARIES"], ""));
        if !libraries.is_empty() {
            out.push_str(&format!(
                "@UsesLibraries(libraries = \"{}\")\n",
                escape_quotes(&libraries.iter().join(", "))
            ));
        }
        out.push_str("@SimpleObject(external = true)\n");
        out
    }

    fn property_spec(&self, id: NodeId) -> PropertySpec {
        let raw_name = self.text_field_or(id, &["NAME"], "Property");
        let field = storage_field(&to_identifier(&raw_name, Casing::Camel));
        let ty = JavaType::parse(&self.text_field_or(id, &["TYPE"], ""), "String");
        let ty = if ty.is_void() {
            JavaType::parse("Object", "Object")
        } else {
            ty
        };
        let default = render_default(&ty, &self.text_field_or(id, &["DEFAULT"], ""));
        PropertySpec {
            accessor: to_identifier(&raw_name, Casing::Pascal),
            field,
            ty,
            default,
            read_only: self.field(id, "READONLY").is_some_and(FieldValue::is_true),
            raw_name: decode_html_entities(&raw_name),
        }
    }

    fn method(&mut self, id: NodeId, prop_fields: &[String]) -> String {
        let raw_name = self.text_field_or(id, &["NAME"], "method");
        let name = to_identifier(&raw_name, Casing::Camel);
        let return_type = JavaType::parse(&self.text_field_or(id, &["RET"], ""), "void");
        let params = parse_params(&self.text_field_or(id, &["PARAMS"], ""));
        let signature = params
            .iter()
            .map(|p| format!("{} {}", p.ty.name(), p.name))
            .join(", ");

        let mut ctx = GenContext::new()
            .with_props(prop_fields.iter().cloned())
            .with_params(params.iter().map(|p| p.name.clone()))
            .with_return_type(return_type.clone());
        self.routine_params = params.iter().map(|p| p.name.clone()).collect();
        let (mut body, exits) = self.chain_exits(self.source.statement(id, "BODY"), &mut ctx);
        self.routine_params.clear();
        if !return_type.is_void() && !exits {
            body.push_str(&format!("return {};\n", return_type.return_default()));
        }

        format!(
            "{i}@SimpleFunction(description = \"{} function\")\n{i}public {} {}({}) throws Exception {{\n{}{i}}}\n",
            escape_quotes(&decode_html_entities(&raw_name)),
            return_type.name(),
            name,
            signature,
            indent(&body, 2),
            i = INDENT
        )
    }

    fn event(&mut self, id: NodeId) -> String {
        let raw_name = self.text_field_or(id, &["NAME"], "Event");
        let name = to_identifier(&raw_name, Casing::Pascal);
        let params = parse_params(&self.text_field_or(id, &["PARAMS"], ""));
        let signature = params
            .iter()
            .map(|p| format!("{} {}", p.ty.name(), p.name))
            .join(", ");
        let mut dispatch_args = vec!["this".to_string(), format!("\"{}\"", name)];
        dispatch_args.extend(params.iter().map(|p| p.name.clone()));

        format!(
            "{i}@SimpleEvent(description = \"{} event\")\n{i}public void {}({}) {{\n{i}{i}EventDispatcher.dispatchEvent({});\n{i}}}\n",
            escape_quotes(&decode_html_entities(&raw_name)),
            name,
            signature,
            dispatch_args.iter().join(", "),
            i = INDENT
        )
    }
}

fn render_property(property: &PropertySpec) -> String {
    let i = INDENT;
    let mut out = format!(
        "{i}private {} {} = {};\n\n",
        property.ty.name(),
        property.field,
        property.default
    );
    out.push_str(&format!(
        "{i}@SimpleProperty(description = \"{} value\")\n{i}public {} {}() {{\n{i}{i}return this.{};\n{i}}}\n",
        escape_quotes(&property.raw_name),
        property.ty.name(),
        property.accessor,
        property.field
    ));
    if !property.read_only {
        out.push_str(&format!(
            "\n{i}@SimpleProperty(description = \"Set {}\")\n{i}public void {}({} value) {{\n{i}{i}this.{} = value;\n{i}}}\n",
            escape_quotes(&property.raw_name),
            property.accessor,
            property.ty.name(),
            property.field
        ));
    }
    out
}
