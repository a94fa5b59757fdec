use super::{GenContext, Pass, indent, operand, storage_field, unwrap_parens};
use crate::block::{BlockKind, BlockRole, FieldValue};
use crate::graph::{BlockSource, NodeId};
use crate::sanitize::{Casing, comment_text, parse_params, to_identifier};
use ahash::AHashSet;
use itertools::Itertools;
use tracing::{debug, warn};

impl<'g, S: BlockSource + ?Sized> Pass<'g, S> {
    /// Generates a statement chain starting at `head`, following `next` links until
    /// the chain ends or loops back on itself. Returned lines are unindented.
    pub(super) fn chain(&mut self, head: Option<NodeId>, ctx: &mut GenContext) -> String {
        self.chain_exits(head, ctx).0
    }

    /// Like `chain`, also reporting whether the emitted code returns on every path.
    /// A statement that degraded to a comment never counts as returning.
    pub(super) fn chain_exits(
        &mut self,
        head: Option<NodeId>,
        ctx: &mut GenContext,
    ) -> (String, bool) {
        let mut out = String::new();
        let mut seen = AHashSet::new();
        let mut returned = false;
        let mut current = head;
        while let Some(id) = current {
            if !seen.insert(id) {
                warn!(node = %id, "statement chain loops back on itself");
                out.push_str("// statement chain loops back on itself; remaining blocks skipped\n");
                break;
            }
            if returned {
                out.push_str(&format!(
                    "// unreachable after return: {}\n",
                    comment_text(self.block_type(id))
                ));
            } else {
                let (code, exits) = self.stmt(id, ctx);
                out.push_str(&code);
                returned = exits;
            }
            current = self.source.next(id);
        }
        (out, returned)
    }

    /// A nested body: generated in a copy of `ctx` and indented one level.
    fn body(&mut self, head: Option<NodeId>, ctx: &GenContext) -> String {
        self.body_exits(head, ctx).0
    }

    fn body_exits(&mut self, head: Option<NodeId>, ctx: &GenContext) -> (String, bool) {
        let mut scope = ctx.clone();
        let (code, exits) = self.chain_exits(head, &mut scope);
        (indent(&code, 1), exits)
    }

    /// A body that runs on another thread or later: it sees no parameters or locals,
    /// and `this` must name the extension explicitly.
    fn background_body(&mut self, head: Option<NodeId>, levels: usize) -> String {
        let mut scope = GenContext::new();
        self.anonymous_depth += 1;
        let code = self.chain(head, &mut scope);
        self.anonymous_depth -= 1;
        indent(&code, levels)
    }

    fn stmt(&mut self, id: NodeId, ctx: &mut GenContext) -> (String, bool) {
        match self.guarded(id, |pass| pass.stmt_rule(id, ctx)) {
            Ok(code) => (code, self.exits.contains(&id)),
            Err(err) => (
                format!(
                    "// generation skipped for block '{}': {}\n",
                    comment_text(self.block_type(id)),
                    comment_text(&err.to_string())
                ),
                false,
            ),
        }
    }

    fn stmt_rule(&mut self, id: NodeId, ctx: &mut GenContext) -> String {
        let Some(kind) = self.kind(id) else {
            debug!(block_type = self.block_type(id), "unsupported block in statement position");
            return format!("// unsupported block: {}\n", comment_text(self.block_type(id)));
        };
        match kind {
            BlockKind::SetProperty => {
                let name = storage_field(&self.variable_name(id, "prop"));
                let value = self.arg_or_null(id, &["VALUE"]);
                format!("{}.{} = {};\n", self.this_ref(), name, value)
            }
            BlockKind::VariablesSet => {
                let name = self.variable_ref(&self.variable_name(id, "var"));
                let value = self.arg_or_null(id, &["VALUE"]);
                self.bind(ctx, &name, value)
            }
            BlockKind::MathChange => {
                let name = self.variable_ref(&self.variable_name(id, "var"));
                let delta = match self.socket(id, &["DELTA", "NUM", "VALUE"]) {
                    Some(child) => self.expr(Some(child)),
                    None => self
                        .field(id, "DELTA")
                        .and_then(FieldValue::as_f64)
                        .map(|n| FieldValue::Number(n).to_string())
                        .unwrap_or_else(|| "0".to_string()),
                };
                if ctx.knows(&name) {
                    format!("{} = {} + {};\n", name, name, operand(delta))
                } else {
                    self.bind(ctx, &name, delta)
                }
            }
            BlockKind::Return => {
                self.exits.insert(id);
                self.return_stmt(id, ctx)
            }
            BlockKind::Dispatch => {
                let name = to_identifier(&self.text_field_or(id, &["NAME"], "Event"), Casing::Pascal);
                let args = parse_params(&self.text_field_or(id, &["ARGS"], ""));
                let mut call_args = vec![self.this_ref(), format!("\"{}\"", name)];
                call_args.extend(args.into_iter().map(|p| p.name));
                format!("EventDispatcher.dispatchEvent({});\n", call_args.iter().join(", "))
            }

            BlockKind::ControlsIf => self.if_chain(id, ctx),
            BlockKind::ControlsRepeat => {
                let times = match self.socket(id, &["TIMES", "NUM"]) {
                    Some(child) => operand(self.expr(Some(child))),
                    None => self
                        .field(id, "TIMES")
                        .and_then(FieldValue::as_f64)
                        .map(count_literal)
                        .unwrap_or_else(|| "0".to_string()),
                };
                let counter = self.next_synthetic("__i");
                let body = self.body(self.source.statement(id, "DO"), ctx);
                format!(
                    "for (int {c} = 0; {c} < {}; {c}++) {{\n{}}}\n",
                    times,
                    body,
                    c = counter
                )
            }
            BlockKind::ControlsFor => {
                let var = self.variable_name(id, "i");
                let from = self.arg(id, &["FROM"], "0");
                let to = operand(self.arg(id, &["TO"], "0"));
                let by = self.arg(id, &["BY"], "1");
                let init = if ctx.knows(&var) {
                    format!("{} = {}", var, from)
                } else {
                    format!("int {} = {}", var, from)
                };
                let mut scope = ctx.clone();
                scope.declare(&var);
                let body = self.body(self.source.statement(id, "DO"), &scope);
                format!(
                    "for ({}; {} <= {}; {} += {}) {{\n{}}}\n",
                    init,
                    var,
                    to,
                    var,
                    operand(by),
                    body
                )
            }
            BlockKind::ControlsForEach => {
                let var = self.variable_name(id, "item");
                let list = self.arg(id, &["LIST"], "new java.util.ArrayList<Object>()");
                let mut scope = ctx.clone();
                scope.declare(&var);
                let body = self.body(self.source.statement(id, "DO"), &scope);
                format!("for (Object {} : {}) {{\n{}}}\n", var, operand(list), body)
            }
            BlockKind::ControlsWhileUntil => {
                let cond = self.arg(id, &["BOOL", "COND"], "false");
                let head = match self.op(id, "MODE", "WHILE").as_str() {
                    "UNTIL" => format!("!{}", operand(cond)),
                    _ => unwrap_parens(&cond).to_string(),
                };
                let body = self.body(self.source.statement(id, "DO"), ctx);
                format!("while ({}) {{\n{}}}\n", head, body)
            }
            BlockKind::TryCatch => {
                let error_name = if ctx.knows("e") {
                    self.next_synthetic("__e")
                } else {
                    "e".to_string()
                };
                let (attempt, attempt_exits) =
                    self.body_exits(self.source.statement(id, "TRY"), ctx);
                let mut scope = ctx.clone();
                scope.declare(&error_name);
                let (recovery, recovery_exits) =
                    self.body_exits(self.source.statement(id, "CATCH"), &scope);
                if attempt_exits && recovery_exits {
                    self.exits.insert(id);
                }
                format!(
                    "try {{\n{}}} catch (Exception {e}) {{\n{}android.util.Log.e(\"AI2\", \"Error: \" + {e}.getMessage());\n{}}}\n",
                    attempt,
                    super::INDENT,
                    recovery,
                    e = error_name
                )
            }
            BlockKind::ThreadRun => {
                let body = self.background_body(self.source.statement(id, "DO"), 2);
                format!(
                    "new Thread(new Runnable() {{\n{i}public void run() {{\n{}{i}}}\n}}).start();\n",
                    body,
                    i = super::INDENT
                )
            }
            BlockKind::TimerDelay => {
                let delay = self
                    .field(id, "MS")
                    .and_then(FieldValue::as_f64)
                    .map(count_literal)
                    .unwrap_or_else(|| "1000".to_string());
                let handler = self.next_synthetic("__handler");
                let body = self.background_body(self.source.statement(id, "DO"), 2);
                format!(
                    "final Handler {h} = new Handler(Looper.getMainLooper());\n{h}.postDelayed(new Runnable() {{\n{i}public void run() {{\n{}{i}}}\n}}, {});\n",
                    body,
                    delay,
                    h = handler,
                    i = super::INDENT
                )
            }
            BlockKind::HttpGet => self.http_get(id),

            BlockKind::MapPut => {
                let Some(map) = self.socket(id, &["MAP"]) else {
                    return "// map_put skipped: no map connected\n".to_string();
                };
                let assignable = self.is_assignable(map);
                let map_code = operand(self.expr(Some(map)));
                let key = self.arg(id, &["KEY"], "\"\"");
                let value = self.arg_or_null(id, &["VALUE"]);
                if assignable {
                    format!(
                        "if ({m} == null) {m} = new java.util.HashMap<Object, Object>();\n{m}.put({}, {});\n",
                        key,
                        value,
                        m = map_code
                    )
                } else {
                    format!("if ({m} != null) {m}.put({}, {});\n", key, value, m = map_code)
                }
            }
            BlockKind::MapRemove => {
                let Some(map) = self.socket(id, &["MAP"]) else {
                    return "// map_remove skipped: no map connected\n".to_string();
                };
                let map_code = operand(self.expr(Some(map)));
                let key = self.arg(id, &["KEY"], "\"\"");
                format!("if ({m} != null) {m}.remove({});\n", key, m = map_code)
            }
            BlockKind::MapClear => {
                let Some(map) = self.socket(id, &["MAP"]) else {
                    return "// map_clear skipped: no map connected\n".to_string();
                };
                let map_code = operand(self.expr(Some(map)));
                format!("if ({m} != null) {m}.clear();\n", m = map_code)
            }
            BlockKind::ListsAppend => {
                let Some(list) = self.socket(id, &["LIST"]) else {
                    return "// lists_append skipped: no list connected\n".to_string();
                };
                let assignable = self.is_assignable(list);
                let list_code = operand(self.expr(Some(list)));
                let item = self.arg_or_null(id, &["ITEM", "VALUE"]);
                if assignable {
                    format!(
                        "if ({l} == null) {l} = new java.util.ArrayList<Object>();\n{l}.add({});\n",
                        item,
                        l = list_code
                    )
                } else {
                    format!("if ({l} != null) {l}.add({});\n", item, l = list_code)
                }
            }
            BlockKind::ListsRemoveAt => {
                let Some(list) = self.socket(id, &["LIST"]) else {
                    return "// lists_remove_at skipped: no list connected\n".to_string();
                };
                let list_code = operand(self.expr(Some(list)));
                let index = operand(self.arg(id, &["INDEX", "AT"], "0"));
                format!(
                    "if ({l} != null && {i} >= 0 && {i} < {l}.size()) {l}.remove((int) {i});\n",
                    l = list_code,
                    i = index
                )
            }
            BlockKind::ListsSort => self.lists_sort(id),
            BlockKind::ListsReverse => self.collections_call(id, "reverse"),
            BlockKind::ListsShuffle => self.collections_call(id, "shuffle"),

            BlockKind::TextPrint => {
                let text = self.arg(id, &["TEXT", "VALUE"], "\"\"");
                format!("System.out.println({});\n", text)
            }
            BlockKind::FileWrite => {
                let name = self.file_name(id);
                let content = self.arg(id, &["CONTENT", "TEXT"], "\"\"");
                let writer = self.next_synthetic("__writer");
                let error = self.next_synthetic("__e");
                format!(
                    "try (java.io.OutputStreamWriter {w} = new java.io.OutputStreamWriter({}.openFileOutput({}, Context.MODE_PRIVATE))) {{\n{i}{w}.write(String.valueOf({}));\n}} catch (Exception {e}) {{\n{i}throw new RuntimeException({e});\n}}\n",
                    self.context_ref(),
                    name,
                    content,
                    w = writer,
                    e = error,
                    i = super::INDENT
                )
            }
            BlockKind::NativeFieldSet => {
                let target = self.receiver(id);
                let field = self.member_name(id, "FIELD", "field");
                let value = self.arg_or_null(id, &["VALUE"]);
                format!("{}.{} = {};\n", target, field, value)
            }
            BlockKind::Vibrate => {
                let millis = match self.socket(id, &["MS", "MILLIS", "DURATION"]) {
                    Some(child) => self.expr(Some(child)),
                    None => self
                        .field(id, "MS")
                        .and_then(FieldValue::as_f64)
                        .map(count_literal)
                        .unwrap_or_else(|| "500".to_string()),
                };
                format!(
                    "((android.os.Vibrator) {}.getSystemService(Context.VIBRATOR_SERVICE)).vibrate((long) ({}));\n",
                    self.context_ref(),
                    millis
                )
            }
            BlockKind::PrefsStore => {
                let key = self.arg(id, &["KEY"], "\"\"");
                let value = self.arg(id, &["VALUE"], "\"\"");
                format!(
                    "{}.getSharedPreferences(\"AI2_Extension_Prefs\", Context.MODE_PRIVATE).edit().putString(String.valueOf({}), String.valueOf({})).apply();\n",
                    self.context_ref(),
                    key,
                    value
                )
            }
            BlockKind::Toast => {
                let message = self.arg(id, &["MSG", "MESSAGE", "TEXT"], "\"\"");
                let length = match self.op(id, "DURATION", "SHORT").as_str() {
                    "LONG" | "1" => "LENGTH_LONG",
                    _ => "LENGTH_SHORT",
                };
                format!(
                    "android.widget.Toast.makeText({}, String.valueOf({}), android.widget.Toast.{}).show();\n",
                    self.context_ref(),
                    message,
                    length
                )
            }
            BlockKind::Log => {
                let level = match self.text_field_or(id, &["LEVEL"], "d").trim() {
                    "v" | "V" => "v",
                    "i" | "I" => "i",
                    "w" | "W" => "w",
                    "e" | "E" => "e",
                    _ => "d",
                };
                let tag = self.arg(id, &["TAG"], "\"AI2\"");
                let message = self.arg(id, &["MSG", "MESSAGE", "TEXT"], "\"\"");
                format!(
                    "android.util.Log.{}(String.valueOf({}), String.valueOf({}));\n",
                    level, tag, message
                )
            }
            BlockKind::ClipboardSet => {
                let text = self.arg(id, &["TEXT", "VALUE"], "\"\"");
                let manager = self.next_synthetic("__clipboard");
                format!(
                    "android.content.ClipboardManager {c} = (android.content.ClipboardManager) {}.getSystemService(Context.CLIPBOARD_SERVICE);\nif ({c} != null) {c}.setPrimaryClip(android.content.ClipData.newPlainText(\"text\", String.valueOf({})));\n",
                    self.context_ref(),
                    text,
                    c = manager
                )
            }
            BlockKind::OpenUrl => {
                let url = self.arg(id, &["URL"], "\"\"");
                let intent = self.next_synthetic("__intent");
                format!(
                    "android.content.Intent {n} = new android.content.Intent(android.content.Intent.ACTION_VIEW, android.net.Uri.parse(String.valueOf({})));\n{n}.addFlags(android.content.Intent.FLAG_ACTIVITY_NEW_TASK);\n{}.startActivity({n});\n",
                    url,
                    self.context_ref(),
                    n = intent
                )
            }
            BlockKind::ShareText => {
                let text = self.arg(id, &["TEXT", "VALUE"], "\"\"");
                let intent = self.next_synthetic("__intent");
                format!(
                    "android.content.Intent {n} = new android.content.Intent(android.content.Intent.ACTION_SEND);\n{n}.setType(\"text/plain\");\n{n}.putExtra(android.content.Intent.EXTRA_TEXT, String.valueOf({}));\n{n}.addFlags(android.content.Intent.FLAG_ACTIVITY_NEW_TASK);\n{}.startActivity(android.content.Intent.createChooser({n}, \"Share\").addFlags(android.content.Intent.FLAG_ACTIVITY_NEW_TASK));\n",
                    text,
                    self.context_ref(),
                    n = intent
                )
            }
            BlockKind::CustomCode => match self.field(id, "CODE") {
                Some(code) if !code.is_blank() => {
                    let mut code = code.to_string();
                    if !code.ends_with('\n') {
                        code.push('\n');
                    }
                    code
                }
                _ => String::new(),
            },

            _ if kind.is_call_like() => format!("{};\n", self.expr_rule(id)),
            _ if kind.role() == BlockRole::Expression => {
                debug!(block_type = self.block_type(id), "value block in statement position");
                format!(
                    "// block '{}' produces a value and cannot stand alone as a statement\n",
                    comment_text(self.block_type(id))
                )
            }
            _ => {
                debug!(block_type = self.block_type(id), "declaration block in statement position");
                format!(
                    "// declaration block '{}' belongs directly under the extension block\n",
                    comment_text(self.block_type(id))
                )
            }
        }
    }

    fn arg_or_null(&mut self, id: NodeId, names: &[&str]) -> String {
        match self.socket(id, names) {
            Some(child) => self.expr(Some(child)),
            None => "null".to_string(),
        }
    }

    fn variable_name(&self, id: NodeId, default: &str) -> String {
        to_identifier(&self.text_field_or(id, &["VAR", "NAME"], default), Casing::Camel)
    }

    /// Assigns `value` to `name`, declaring it as a new local first if it is not in scope.
    fn bind(&self, ctx: &mut GenContext, name: &str, value: String) -> String {
        if ctx.knows(name) {
            format!("{} = {};\n", name, value)
        } else {
            ctx.declare(name);
            format!("Object {} = {};\n", name, value)
        }
    }

    /// Whether the expression for `id` may appear on the left of `=`.
    fn is_assignable(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            Some(BlockKind::VariablesGet | BlockKind::NativeFieldGet)
        )
    }

    fn return_stmt(&mut self, id: NodeId, ctx: &GenContext) -> String {
        let expected = ctx.return_type().cloned();
        let Some(expected) = expected.filter(|ty| !ty.is_void()) else {
            return "return;\n".to_string();
        };
        let Some(child) = self.socket(id, &["VALUE"]) else {
            return format!("return {};\n", expected.return_default());
        };
        let child_kind = self.kind(child);
        let code = self.expr(Some(child));
        let already_text = child_kind.is_some_and(BlockKind::produces_text)
            || code.starts_with('"')
            || code.starts_with("String.valueOf(");
        if expected.is_text() && !already_text {
            format!("return String.valueOf({});\n", code)
        } else {
            format!("return {};\n", code)
        }
    }

    fn if_chain(&mut self, id: NodeId, ctx: &GenContext) -> String {
        let branches = self.branch_count(id);
        let mut out = String::new();
        let mut every_branch_exits = true;
        for i in 0..branches {
            let cond_socket = format!("IF{}", i);
            let cond = self.arg(id, &[cond_socket.as_str()], "false");
            let do_socket = format!("DO{}", i);
            let (body, exits) = self.body_exits(self.source.statement(id, &do_socket), ctx);
            every_branch_exits &= exits;
            let keyword = if i == 0 { "if" } else { " else if" };
            out.push_str(&format!("{} ({}) {{\n{}}}", keyword, unwrap_parens(&cond), body));
        }
        if let Some(otherwise) = self.source.statement(id, "ELSE") {
            let (body, exits) = self.body_exits(Some(otherwise), ctx);
            out.push_str(&format!(" else {{\n{}}}", body));
            if every_branch_exits && exits {
                self.exits.insert(id);
            }
        }
        out.push('\n');
        out
    }

    /// Number of `IFn`/`DOn` pairs: at least one, then every index with either half present.
    fn branch_count(&self, id: NodeId) -> usize {
        let mut count = 1;
        while count < 1024
            && (self.source.input(id, &format!("IF{}", count)).is_some()
                || self.source.statement(id, &format!("DO{}", count)).is_some())
        {
            count += 1;
        }
        count
    }

    fn http_get(&mut self, id: NodeId) -> String {
        let url = self.arg(id, &["URL"], "\"\"");
        let success = self.background_body(self.source.statement(id, "ON_SUCCESS"), 5);
        let failure = self.background_body(self.source.statement(id, "ON_ERROR"), 5);
        let i = super::INDENT;
        let mut out = String::new();
        out.push_str("new Thread(new Runnable() {\n");
        out.push_str(&format!("{i}public void run() {{\n"));
        out.push_str(&format!("{i}{i}try {{\n"));
        out.push_str(&format!(
            "{i}{i}{i}java.net.HttpURLConnection __conn = (java.net.HttpURLConnection) new java.net.URL(String.valueOf({})).openConnection();\n",
            url
        ));
        out.push_str(&format!(
            "{i}{i}{i}java.util.Scanner __scanner = new java.util.Scanner(__conn.getInputStream(), \"UTF-8\").useDelimiter(\"\\\\A\");\n"
        ));
        out.push_str(&format!(
            "{i}{i}{i}final String __resp = __scanner.hasNext() ? __scanner.next() : \"\";\n"
        ));
        out.push_str(&format!("{i}{i}{i}__conn.disconnect();\n"));
        out.push_str(&format!(
            "{i}{i}{i}new Handler(Looper.getMainLooper()).post(new Runnable() {{\n"
        ));
        out.push_str(&format!("{i}{i}{i}{i}public void run() {{\n"));
        out.push_str(&success);
        out.push_str(&format!("{i}{i}{i}{i}}}\n{i}{i}{i}}});\n"));
        out.push_str(&format!("{i}{i}}} catch (final Exception __e) {{\n"));
        out.push_str(&format!(
            "{i}{i}{i}new Handler(Looper.getMainLooper()).post(new Runnable() {{\n"
        ));
        out.push_str(&format!("{i}{i}{i}{i}public void run() {{\n"));
        out.push_str(&failure);
        out.push_str(&format!("{i}{i}{i}{i}}}\n{i}{i}{i}}});\n"));
        out.push_str(&format!("{i}{i}}}\n"));
        out.push_str(&format!("{i}}}\n"));
        out.push_str("}).start();\n");
        out
    }

    fn lists_sort(&mut self, id: NodeId) -> String {
        let Some(list) = self.socket(id, &["LIST"]) else {
            return "// lists_sort skipped: no list connected\n".to_string();
        };
        let list_code = operand(self.expr(Some(list)));
        let comparator = match self.op(id, "TYPE", "NUMERIC").as_str() {
            "IGNORE_CASE" => "String.CASE_INSENSITIVE_ORDER",
            _ => "null",
        };
        let descending = matches!(
            self.field(id, "DIRECTION"),
            Some(value) if value.as_f64() == Some(-1.0)
        );
        let error = self.next_synthetic("__e");
        let i = super::INDENT;
        let mut out = format!("if ({} != null) {{\n", list_code);
        out.push_str(&format!("{i}try {{\n"));
        out.push_str(&format!(
            "{i}{i}java.util.Collections.sort((java.util.List) {}, {});\n",
            list_code, comparator
        ));
        out.push_str(&format!("{i}}} catch (Exception {}) {{\n", error));
        out.push_str(&format!(
            "{i}{i}android.util.Log.w(\"AI2\", \"Sort failed: \" + {}.getMessage());\n",
            error
        ));
        out.push_str(&format!("{i}}}\n"));
        if descending {
            out.push_str(&format!(
                "{i}java.util.Collections.reverse((java.util.List) {});\n",
                list_code
            ));
        }
        out.push_str("}\n");
        out
    }

    fn collections_call(&mut self, id: NodeId, method: &str) -> String {
        let Some(list) = self.socket(id, &["LIST"]) else {
            return format!(
                "// {} skipped: no list connected\n",
                comment_text(self.block_type(id))
            );
        };
        let list_code = operand(self.expr(Some(list)));
        format!(
            "if ({l} != null) java.util.Collections.{}((java.util.List) {l});\n",
            method,
            l = list_code
        )
    }
}

/// A non-negative whole count that fits a Java `int` literal.
fn count_literal(value: f64) -> String {
    (value.clamp(0.0, f64::from(i32::MAX)).floor() as i32).to_string()
}
