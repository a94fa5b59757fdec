use super::{Pass, operand};
use crate::block::{BlockKind, FieldValue};
use crate::graph::{BlockSource, NodeId};
use crate::sanitize::{Casing, comment_text, java_string, to_identifier};
use itertools::Itertools;
use tracing::debug;

/// Upper bound on `ADD0..ADDn` style sockets probed on one block.
const MAX_ITEMS: usize = 1024;

const EMPTY_LIST: &str = "new java.util.ArrayList<>()";
const DEFAULT_DATE_PATTERN: &str = "\"yyyy-MM-dd HH:mm:ss\"";

impl<'g, S: BlockSource + ?Sized> Pass<'g, S> {
    /// Generates the Java expression for `node`. An empty socket is `null`.
    pub(super) fn expr(&mut self, node: Option<NodeId>) -> String {
        let Some(id) = node else {
            return "null".to_string();
        };
        match self.guarded(id, |pass| pass.expr_rule(id)) {
            Ok(code) => code,
            Err(err) => format!("null /* {} */", comment_text(&err.to_string())),
        }
    }

    /// The expression in the first connected socket among `names`, or `fallback`.
    pub(super) fn arg(&mut self, id: NodeId, names: &[&str], fallback: &str) -> String {
        match self.socket(id, names) {
            Some(child) => self.expr(Some(child)),
            None => fallback.to_string(),
        }
    }

    fn operand_arg(&mut self, id: NodeId, names: &[&str], fallback: &str) -> String {
        operand(self.arg(id, names, fallback))
    }

    /// `String.valueOf(..)` around a socket, so object-typed children feed string APIs.
    fn text_arg(&mut self, id: NodeId, names: &[&str]) -> String {
        match self.socket(id, names) {
            Some(child) => {
                let child_kind = self.kind(child);
                let code = self.expr(Some(child));
                if child_kind.is_some_and(BlockKind::produces_text) {
                    operand(code)
                } else {
                    format!("String.valueOf({})", code)
                }
            }
            None => "\"\"".to_string(),
        }
    }

    pub(super) fn context_ref(&self) -> String {
        format!("{}.context", self.this_ref())
    }

    /// Slots `prefix0..prefixN`. The count is the larger of the `ITEMS` field and the
    /// run of connected sockets following it.
    pub(super) fn indexed_inputs(&self, id: NodeId, prefix: &str) -> Vec<Option<NodeId>> {
        let declared = self
            .field(id, "ITEMS")
            .and_then(FieldValue::as_f64)
            .map(|n| n.clamp(0.0, MAX_ITEMS as f64) as usize)
            .unwrap_or(0);
        let mut slots: Vec<Option<NodeId>> = (0..declared)
            .map(|i| self.source.input(id, &format!("{}{}", prefix, i)))
            .collect();
        while slots.len() < MAX_ITEMS {
            match self.source.input(id, &format!("{}{}", prefix, slots.len())) {
                Some(child) => slots.push(Some(child)),
                None => break,
            }
        }
        slots
    }

    pub(super) fn expr_rule(&mut self, id: NodeId) -> String {
        let Some(kind) = self.kind(id) else {
            debug!(block_type = self.block_type(id), "unsupported block in expression position");
            return self.unknown_expr(id);
        };
        match kind {
            BlockKind::MathNumber => self.number_literal(id),
            BlockKind::Text => java_string(&self.text_field_or(id, &["TEXT"], "")),
            BlockKind::LogicBoolean => {
                let value = self.field(id, "BOOL").is_some_and(FieldValue::is_true);
                value.to_string()
            }
            BlockKind::LogicNull => "null".to_string(),
            BlockKind::VariablesGet => self.variable_ref(&to_identifier(
                &self.text_field_or(id, &["VAR", "NAME"], "var"),
                Casing::Camel,
            )),

            BlockKind::LogicCompare => self.compare(id),
            BlockKind::LogicOperation => {
                let op = match self.op(id, "OP", "AND").as_str() {
                    "OR" => "||",
                    _ => "&&",
                };
                let a = self.operand_arg(id, &["A"], "false");
                let b = self.operand_arg(id, &["B"], "false");
                format!("({} {} {})", a, op, b)
            }
            BlockKind::LogicNegate => format!("(!{})", self.operand_arg(id, &["BOOL"], "false")),
            BlockKind::LogicTernary => {
                let cond = self.operand_arg(id, &["IF"], "false");
                let then = self.operand_arg(id, &["THEN"], "null");
                let otherwise = self.operand_arg(id, &["ELSE"], "null");
                format!("({} ? {} : {})", cond, then, otherwise)
            }

            BlockKind::MathArithmetic => self.arithmetic(id),
            BlockKind::MathSingle => self.math_single(id),
            BlockKind::MathRound => {
                let func = match self.op(id, "OP", "ROUND").as_str() {
                    "ROUNDUP" => "Math.ceil",
                    "ROUNDDOWN" => "Math.floor",
                    _ => "Math.round",
                };
                format!("{}({})", func, self.arg(id, &["NUM"], "0"))
            }
            BlockKind::MathTrig => self.math_trig(id),
            BlockKind::MathModulo => {
                let a = self.operand_arg(id, &["DIVIDEND", "A"], "0");
                let b = self.operand_arg(id, &["DIVISOR", "B"], "1");
                format!("({} == 0 ? 0 : {} % {})", b, a, b)
            }
            BlockKind::MathRandomInt => {
                let from = self.operand_arg(id, &["FROM"], "0");
                let to = self.operand_arg(id, &["TO"], "100");
                format!(
                    "((int) ({} + Math.random() * ({} - {} + 1)))",
                    from, to, from
                )
            }
            BlockKind::MathRandomFloat => "Math.random()".to_string(),
            BlockKind::MathMinMax => {
                let func = match self.op(id, "MODE", "MAX").as_str() {
                    "MIN" => "Math.min",
                    _ => "Math.max",
                };
                let a = self.arg(id, &["A"], "0");
                let b = self.arg(id, &["B"], "0");
                format!("{}({}, {})", func, a, b)
            }
            BlockKind::MathConstrain => {
                let value = self.arg(id, &["VALUE"], "0");
                let low = self.arg(id, &["LOW"], "0");
                let high = self.arg(id, &["HIGH"], "100");
                format!("Math.max({}, Math.min({}, {}))", low, value, high)
            }
            BlockKind::MathIsNumber => format!(
                r#"{}.matches("-?\\d+(\\.\\d+)?")"#,
                self.text_arg(id, &["TEXT", "VALUE"])
            ),
            BlockKind::MathParseInt => {
                let text = self.text_arg(id, &["TEXT", "VALUE"]);
                let fallback = self.arg(id, &["DEFAULT"], "0");
                format!(
                    "(new Object() {{ int parse(String s, int d) {{ try {{ return Integer.parseInt(s.trim()); }} catch (Exception e) {{ return d; }} }} }}).parse({}, {})",
                    text, fallback
                )
            }
            BlockKind::MathParseFloat => {
                let text = self.text_arg(id, &["TEXT", "VALUE"]);
                let fallback = self.arg(id, &["DEFAULT"], "0f");
                format!(
                    "(new Object() {{ float parse(String s, float d) {{ try {{ return Float.parseFloat(s.trim()); }} catch (Exception e) {{ return d; }} }} }}).parse({}, {})",
                    text, fallback
                )
            }

            BlockKind::TextJoin => self.text_join(id),
            BlockKind::TextLength => match self.socket(id, &["VALUE", "TEXT"]) {
                Some(child) => {
                    let text = operand(self.expr(Some(child)));
                    format!("({} == null ? 0 : String.valueOf({}).length())", text, text)
                }
                None => "0".to_string(),
            },
            BlockKind::TextIsEmpty => match self.socket(id, &["VALUE", "TEXT"]) {
                Some(child) => {
                    let text = operand(self.expr(Some(child)));
                    format!("({} == null || String.valueOf({}).isEmpty())", text, text)
                }
                None => "true".to_string(),
            },
            BlockKind::TextIndexOf => {
                let text = self.text_arg(id, &["VALUE", "TEXT"]);
                let find = self.text_arg(id, &["FIND", "SEARCH"]);
                let method = match self.op(id, "END", "FIRST").as_str() {
                    "LAST" => "lastIndexOf",
                    _ => "indexOf",
                };
                format!("{}.{}({})", text, method, find)
            }
            BlockKind::TextCharAt => {
                let text = self.text_arg(id, &["VALUE", "TEXT"]);
                let at = self.arg(id, &["AT"], "0");
                format!("String.valueOf({}.charAt({}))", text, at)
            }
            BlockKind::TextGetSubstring => {
                let text = self.text_arg(id, &["STRING", "TEXT"]);
                let from = self.arg(id, &["AT1"], "0");
                let to = self.arg(id, &["AT2"], "0");
                format!("{}.substring({}, {})", text, from, to)
            }
            BlockKind::TextChangeCase => {
                let text = self.text_arg(id, &["TEXT"]);
                match self.op(id, "CASE", "UPPERCASE").as_str() {
                    "LOWERCASE" => format!("{}.toLowerCase()", text),
                    "TITLECASE" => text,
                    _ => format!("{}.toUpperCase()", text),
                }
            }
            BlockKind::TextContains => self.text_test(id, "contains"),
            BlockKind::TextStartsWith => self.text_test(id, "startsWith"),
            BlockKind::TextEndsWith => self.text_test(id, "endsWith"),
            BlockKind::TextReverse => format!(
                "new StringBuilder({}).reverse().toString()",
                self.text_arg(id, &["TEXT"])
            ),
            BlockKind::TextTrim => format!("{}.trim()", self.text_arg(id, &["TEXT"])),
            BlockKind::TextSplit => {
                let text = self.text_arg(id, &["TEXT"]);
                let at = self.text_arg(id, &["AT", "DELIMITER"]);
                format!(
                    "new java.util.ArrayList<Object>(java.util.Arrays.asList({}.split(java.util.regex.Pattern.quote({}))))",
                    text, at
                )
            }
            BlockKind::TextJoinList => {
                let list = self.arg(id, &["LIST"], EMPTY_LIST);
                let separator = self.text_arg(id, &["SEPARATOR", "DELIM"]);
                format!("android.text.TextUtils.join({}, {})", separator, list)
            }
            BlockKind::TextReplaceAll => {
                let text = self.text_arg(id, &["TEXT"]);
                let replacement = self.text_arg(id, &["REPLACEMENT"]);
                if self.socket(id, &["REGEX"]).is_some() {
                    let regex = self.text_arg(id, &["REGEX"]);
                    format!("{}.replaceAll({}, {})", text, regex, replacement)
                } else {
                    let segment = self.text_arg(id, &["SEGMENT", "FROM"]);
                    format!("{}.replace({}, {})", text, segment, replacement)
                }
            }
            BlockKind::TextReplaceRegex => {
                let text = self.text_arg(id, &["TEXT"]);
                let regex = self.text_arg(id, &["REGEX", "PATTERN"]);
                let replacement = self.text_arg(id, &["REPLACEMENT"]);
                format!("{}.replaceAll({}, {})", text, regex, replacement)
            }
            BlockKind::RegexMatch => {
                let text = self.text_arg(id, &["TEXT"]);
                let pattern = self.text_arg(id, &["PATTERN", "REGEX"]);
                format!(
                    "java.util.regex.Pattern.compile({}).matcher({}).matches()",
                    pattern, text
                )
            }

            BlockKind::ListsCreateWith => {
                let items: Vec<String> = self
                    .indexed_inputs(id, "ADD")
                    .into_iter()
                    .map(|slot| self.expr(slot))
                    .collect();
                if items.is_empty() {
                    EMPTY_LIST.to_string()
                } else {
                    format!(
                        "new java.util.ArrayList<Object>(java.util.Arrays.asList({}))",
                        items.iter().join(", ")
                    )
                }
            }
            BlockKind::ListsLength => self.guarded_collection(id, &["VALUE", "LIST"], "0", |l| {
                format!("({} == null ? 0 : {}.size())", l, l)
            }),
            BlockKind::ListsIsEmpty => {
                self.guarded_collection(id, &["VALUE", "LIST"], "true", |l| {
                    format!("({} == null || {}.isEmpty())", l, l)
                })
            }
            BlockKind::ListsGetIndex => match self.socket(id, &["VALUE", "LIST"]) {
                Some(child) => {
                    let list = operand(self.expr(Some(child)));
                    let index = self.operand_arg(id, &["AT", "INDEX"], "0");
                    format!(
                        "(({} != null && {} >= 0 && {} < {}.size()) ? {}.get({}) : null)",
                        list, index, index, list, list, index
                    )
                }
                None => "null".to_string(),
            },
            BlockKind::ListsIndexOf => match self.socket(id, &["LIST", "VALUE"]) {
                Some(child) => {
                    let list = operand(self.expr(Some(child)));
                    let item = self.arg(id, &["ITEM", "FIND"], "null");
                    format!("({} == null ? -1 : {}.indexOf({}))", list, list, item)
                }
                None => "-1".to_string(),
            },
            BlockKind::ListsPickRandom => {
                self.guarded_collection(id, &["LIST", "VALUE"], "null", |l| {
                    format!(
                        "(({} == null || {}.isEmpty()) ? null : {}.get(new java.util.Random().nextInt({}.size())))",
                        l, l, l, l
                    )
                })
            }
            BlockKind::ListsCopy => {
                self.guarded_collection(id, &["LIST", "VALUE"], EMPTY_LIST, |l| {
                    format!(
                        "({} == null ? new java.util.ArrayList<Object>() : new java.util.ArrayList<Object>({}))",
                        l, l
                    )
                })
            }

            BlockKind::MapsCreateWith => "new java.util.HashMap<Object, Object>()".to_string(),
            BlockKind::MapGet => match self.socket(id, &["MAP"]) {
                Some(child) => {
                    let map = operand(self.expr(Some(child)));
                    let key = self.arg(id, &["KEY"], "\"\"");
                    format!("({} == null ? null : {}.get({}))", map, map, key)
                }
                None => "null".to_string(),
            },
            BlockKind::MapKeys => self.guarded_collection(id, &["MAP"], EMPTY_LIST, |m| {
                format!(
                    "({} == null ? new java.util.ArrayList<Object>() : new java.util.ArrayList<Object>({}.keySet()))",
                    m, m
                )
            }),
            BlockKind::MapValues => self.guarded_collection(id, &["MAP"], EMPTY_LIST, |m| {
                format!(
                    "({} == null ? new java.util.ArrayList<Object>() : new java.util.ArrayList<Object>({}.values()))",
                    m, m
                )
            }),
            BlockKind::MapContainsKey => match self.socket(id, &["MAP"]) {
                Some(child) => {
                    let map = operand(self.expr(Some(child)));
                    let key = self.arg(id, &["KEY"], "\"\"");
                    format!("({} != null && {}.containsKey({}))", map, map, key)
                }
                None => "false".to_string(),
            },
            BlockKind::MapSize => self.guarded_collection(id, &["MAP"], "0", |m| {
                format!("({} == null ? 0 : {}.size())", m, m)
            }),
            BlockKind::MapIsEmpty => self.guarded_collection(id, &["MAP"], "true", |m| {
                format!("({} == null || {}.isEmpty())", m, m)
            }),

            BlockKind::JsonParse => format!(
                "new org.json.JSONTokener({}).nextValue()",
                self.text_arg(id, &["JSON", "TEXT"])
            ),
            BlockKind::JsonGet => {
                let json = operand(self.arg(id, &["JSON", "OBJECT"], "null"));
                let key = self.text_arg(id, &["KEY"]);
                format!(
                    "({} instanceof org.json.JSONObject ? ((org.json.JSONObject) {}).opt({}) : null)",
                    json, json, key
                )
            }
            BlockKind::Base64Encode => format!(
                "android.util.Base64.encodeToString({}.getBytes(), android.util.Base64.NO_WRAP)",
                self.text_arg(id, &["TEXT"])
            ),
            BlockKind::Base64Decode => format!(
                "new String(android.util.Base64.decode({}, android.util.Base64.DEFAULT))",
                self.text_arg(id, &["TEXT"])
            ),
            BlockKind::CryptoHash => {
                let algorithm: String = self
                    .text_field_or(id, &["ALGO", "ALGORITHM"], "MD5")
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
                    .collect();
                let algorithm = if algorithm.is_empty() {
                    "MD5".to_string()
                } else {
                    algorithm
                };
                format!(
                    "new java.math.BigInteger(1, java.security.MessageDigest.getInstance(\"{}\").digest({}.getBytes())).toString(16)",
                    algorithm,
                    self.text_arg(id, &["TEXT"])
                )
            }
            BlockKind::DateNow => "System.currentTimeMillis()".to_string(),
            BlockKind::DateFormat => {
                let millis = self.arg(id, &["MILLIS", "TIME"], "System.currentTimeMillis()");
                let pattern = match self.socket(id, &["PATTERN", "FORMAT"]) {
                    Some(_) => self.text_arg(id, &["PATTERN", "FORMAT"]),
                    None => DEFAULT_DATE_PATTERN.to_string(),
                };
                format!(
                    "new java.text.SimpleDateFormat({}).format(new java.util.Date((long) ({})))",
                    pattern, millis
                )
            }
            BlockKind::DateParse => {
                let date = self.text_arg(id, &["DATE", "TEXT"]);
                let pattern = match self.socket(id, &["PATTERN", "FORMAT"]) {
                    Some(_) => self.text_arg(id, &["PATTERN", "FORMAT"]),
                    None => DEFAULT_DATE_PATTERN.to_string(),
                };
                format!(
                    "new java.text.SimpleDateFormat({}).parse({}).getTime()",
                    pattern, date
                )
            }
            BlockKind::DeviceInfo => device_info(&self.op(id, "INFO", "")),
            BlockKind::DeviceLanguage => "java.util.Locale.getDefault().getLanguage()".to_string(),
            BlockKind::DeviceDarkMode => format!(
                "(({}.getResources().getConfiguration().uiMode & android.content.res.Configuration.UI_MODE_NIGHT_MASK) == android.content.res.Configuration.UI_MODE_NIGHT_YES)",
                self.context_ref()
            ),
            BlockKind::DeviceOnline => format!(
                "(new Object() {{ boolean check(Context c) {{ android.net.ConnectivityManager cm = (android.net.ConnectivityManager) c.getSystemService(Context.CONNECTIVITY_SERVICE); android.net.NetworkInfo info = cm == null ? null : cm.getActiveNetworkInfo(); return info != null && info.isConnected(); }} }}).check({})",
                self.context_ref()
            ),
            BlockKind::DeviceBattery => format!(
                "((android.os.BatteryManager) {}.getSystemService(Context.BATTERY_SERVICE)).getIntProperty(android.os.BatteryManager.BATTERY_PROPERTY_CAPACITY)",
                self.context_ref()
            ),
            BlockKind::UrlEncode => format!(
                "java.net.URLEncoder.encode({}, \"UTF-8\")",
                self.text_arg(id, &["TEXT"])
            ),
            BlockKind::UrlDecode => format!(
                "java.net.URLDecoder.decode({}, \"UTF-8\")",
                self.text_arg(id, &["TEXT"])
            ),
            BlockKind::HtmlDecode => format!(
                "android.text.Html.fromHtml({}).toString()",
                self.text_arg(id, &["TEXT"])
            ),
            BlockKind::PrefsGet => {
                let key = self.text_arg(id, &["KEY"]);
                let fallback = self.text_arg(id, &["DEFAULT"]);
                format!(
                    "{}.getSharedPreferences(\"AI2_Extension_Prefs\", Context.MODE_PRIVATE).getString({}, {})",
                    self.context_ref(),
                    key,
                    fallback
                )
            }
            BlockKind::NetworkGet => format!(
                r#"(new Object() {{ String fetch(String u) throws Exception {{ java.net.HttpURLConnection c = (java.net.HttpURLConnection) new java.net.URL(u).openConnection(); c.setRequestMethod("GET"); java.util.Scanner s = new java.util.Scanner(c.getInputStream(), "UTF-8").useDelimiter("\\A"); String body = s.hasNext() ? s.next() : ""; c.disconnect(); return body; }} }}).fetch({})"#,
                self.text_arg(id, &["URL"])
            ),
            BlockKind::NetworkPost => {
                let url = self.text_arg(id, &["URL"]);
                let body = self.text_arg(id, &["DATA", "BODY"]);
                format!(
                    r#"(new Object() {{ String post(String u, String data) throws Exception {{ java.net.HttpURLConnection c = (java.net.HttpURLConnection) new java.net.URL(u).openConnection(); c.setRequestMethod("POST"); c.setDoOutput(true); java.io.OutputStream o = c.getOutputStream(); o.write(data.getBytes("UTF-8")); o.close(); java.util.Scanner s = new java.util.Scanner(c.getInputStream(), "UTF-8").useDelimiter("\\A"); String body = s.hasNext() ? s.next() : ""; c.disconnect(); return body; }} }}).post({}, {})"#,
                    url, body
                )
            }
            BlockKind::FileRead => {
                let name = self.file_name(id);
                format!(
                    r#"new java.util.Scanner({}.openFileInput({}), "UTF-8").useDelimiter("\\A").next()"#,
                    self.context_ref(),
                    name
                )
            }
            BlockKind::FileExists => format!(
                "new java.io.File({}).exists()",
                self.text_arg(id, &["PATH", "FILENAME"])
            ),
            BlockKind::FileDelete => format!(
                "new java.io.File({}).delete()",
                self.text_arg(id, &["PATH", "FILENAME"])
            ),
            BlockKind::FileList => {
                let path = self.text_arg(id, &["PATH", "DIR"]);
                format!(
                    "new java.util.ArrayList<Object>(java.util.Arrays.asList(new java.io.File({}).list()))",
                    path
                )
            }
            BlockKind::ClipboardGet => format!(
                "(new Object() {{ String read(Context c) {{ android.content.ClipboardManager cm = (android.content.ClipboardManager) c.getSystemService(Context.CLIPBOARD_SERVICE); if (cm == null || !cm.hasPrimaryClip() || cm.getPrimaryClip().getItemCount() == 0) return \"\"; CharSequence t = cm.getPrimaryClip().getItemAt(0).getText(); return t == null ? \"\" : t.toString(); }} }}).read({})",
                self.context_ref()
            ),

            BlockKind::CustomExpression => match self.field(id, "CODE") {
                Some(code) if !code.is_blank() => code.to_string(),
                _ => "null".to_string(),
            },
            BlockKind::NativeFieldGet => {
                let target = self.receiver(id);
                let field = self.member_name(id, "FIELD", "field");
                format!("{}.{}", target, field)
            }
            BlockKind::NativeCall => {
                let target = self.receiver(id);
                let method = self.member_name(id, "METHOD", "method");
                let args = self.call_args(id);
                format!("{}.{}({})", target, method, args)
            }

            _ => {
                debug!(
                    block_type = self.block_type(id),
                    role = ?kind.role(),
                    "statement or declaration block in expression position"
                );
                self.unknown_expr(id)
            }
        }
    }

    fn unknown_expr(&self, id: NodeId) -> String {
        match self.text_field(id, &["TEXT"]) {
            Some(text) => java_string(&text),
            None => "null".to_string(),
        }
    }

    /// Upper-cased operator field, or `default` when blank.
    pub(super) fn op(&self, id: NodeId, name: &str, default: &str) -> String {
        self.text_field_or(id, &[name], default)
            .trim()
            .to_ascii_uppercase()
    }

    fn number_literal(&self, id: NodeId) -> String {
        let text = match self.field(id, "NUM") {
            Some(FieldValue::Text(raw)) => {
                let trimmed = raw.trim();
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() && !trimmed.ends_with(['f', 'F', 'd', 'D']) => {
                        trimmed.to_string()
                    }
                    _ => return "0".to_string(),
                }
            }
            Some(value) => match value.as_f64() {
                Some(n) => FieldValue::Number(n).to_string(),
                None => return "0".to_string(),
            },
            None => return "0".to_string(),
        };
        let digits = text.trim_start_matches(['-', '+']);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return text;
        }
        // Java reads a leading zero as octal.
        let sign = &text[..text.len() - digits.len()];
        let significant = match digits.trim_start_matches('0') {
            "" => "0",
            rest => rest,
        };
        let text = format!("{}{}", sign, significant);
        if text.parse::<i32>().is_err() {
            format!("{}.0", text)
        } else {
            text
        }
    }

    fn compare(&mut self, id: NodeId) -> String {
        let op = self.op(id, "OP", "EQ");
        let symbol = match op.as_str() {
            "LT" => "<",
            "LTE" => "<=",
            "GT" => ">",
            "GTE" => ">=",
            "NEQ" => {
                let a = self.arg(id, &["A"], "null");
                let b = self.arg(id, &["B"], "null");
                return format!("(!java.util.Objects.equals({}, {}))", a, b);
            }
            _ => {
                let a = self.arg(id, &["A"], "null");
                let b = self.arg(id, &["B"], "null");
                return format!("java.util.Objects.equals({}, {})", a, b);
            }
        };
        let a = self.operand_arg(id, &["A"], "0");
        let b = self.operand_arg(id, &["B"], "0");
        format!("({} {} {})", a, symbol, b)
    }

    fn arithmetic(&mut self, id: NodeId) -> String {
        let op = self.op(id, "OP", "ADD");
        let a = self.operand_arg(id, &["A"], "0");
        let b = self.operand_arg(id, &["B"], "0");
        match op.as_str() {
            "MINUS" => format!("({} - {})", a, b),
            "MULTIPLY" => format!("({} * {})", a, b),
            "DIVIDE" => format!("({} == 0 ? 0 : {} / {})", b, a, b),
            "POWER" => format!("Math.pow({}, {})", a, b),
            _ => format!("({} + {})", a, b),
        }
    }

    fn math_single(&mut self, id: NodeId) -> String {
        let op = self.op(id, "OP", "ROOT");
        let num = self.arg(id, &["NUM"], "0");
        match op.as_str() {
            "ABS" => format!("Math.abs({})", num),
            "NEG" => format!("(-{})", operand(num)),
            "LN" => format!("Math.log({})", num),
            "LOG10" => format!("Math.log10({})", num),
            "EXP" => format!("Math.exp({})", num),
            "POW10" => format!("Math.pow(10, {})", num),
            "ROUND" => format!("Math.round({})", num),
            _ => format!("Math.sqrt({})", num),
        }
    }

    fn math_trig(&mut self, id: NodeId) -> String {
        let op = self.op(id, "OP", "SIN");
        let num = self.arg(id, &["NUM"], "0");
        let func = match op.as_str() {
            "COS" => "Math.cos",
            "TAN" => "Math.tan",
            "ASIN" => "Math.asin",
            "ACOS" => "Math.acos",
            "ATAN" => "Math.atan",
            "TO_DEG" => "Math.toDegrees",
            "TO_RAD" => "Math.toRadians",
            _ => "Math.sin",
        };
        format!("{}({})", func, num)
    }

    fn text_join(&mut self, id: NodeId) -> String {
        let parts: Vec<String> = self
            .indexed_inputs(id, "ADD")
            .into_iter()
            .map(|slot| match slot {
                Some(child) => format!("String.valueOf({})", self.expr(Some(child))),
                None => "\"\"".to_string(),
            })
            .collect();
        match parts.len() {
            0 => "\"\"".to_string(),
            1 => parts.into_iter().join(""),
            _ => format!("({})", parts.iter().join(" + ")),
        }
    }

    fn text_test(&mut self, id: NodeId, method: &str) -> String {
        match self.socket(id, &["TEXT", "VALUE"]) {
            Some(child) => {
                let text = operand(self.expr(Some(child)));
                let search = self.text_arg(id, &["SEARCH", "FIND", "SUB"]);
                format!(
                    "({} != null && String.valueOf({}).{}({}))",
                    text, text, method, search
                )
            }
            None => "false".to_string(),
        }
    }

    /// Applies `build` to the collection in `names`, or returns `empty` when nothing is
    /// connected, which is what the operation yields on an empty collection anyway.
    fn guarded_collection(
        &mut self,
        id: NodeId,
        names: &[&str],
        empty: &str,
        build: impl FnOnce(&str) -> String,
    ) -> String {
        match self.socket(id, names) {
            Some(child) => {
                let code = operand(self.expr(Some(child)));
                build(&code)
            }
            None => empty.to_string(),
        }
    }

    pub(super) fn file_name(&mut self, id: NodeId) -> String {
        match self.socket(id, &["FILENAME", "PATH", "FILE"]) {
            Some(_) => self.text_arg(id, &["FILENAME", "PATH", "FILE"]),
            None => "\"file.txt\"".to_string(),
        }
    }

    /// The receiver of a native member access. Empty means the extension itself.
    pub(super) fn receiver(&mut self, id: NodeId) -> String {
        match self.socket(id, &["TARGET", "OBJECT"]) {
            Some(child) => operand(self.expr(Some(child))),
            None => self.this_ref(),
        }
    }

    pub(super) fn member_name(&self, id: NodeId, field: &str, default: &str) -> String {
        let raw = self.text_field_or(id, &[field], default);
        let name: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
            .collect();
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            to_identifier(&raw, Casing::Camel)
        } else {
            name
        }
    }

    /// Arguments of a native call. Only a literal list block is spread into separate
    /// arguments; any other expression is passed through as one argument.
    fn call_args(&mut self, id: NodeId) -> String {
        let Some(args) = self.socket(id, &["ARGS"]) else {
            return String::new();
        };
        if self.kind(args) != Some(BlockKind::ListsCreateWith) {
            return self.expr(Some(args));
        }
        let spread = self.guarded(args, |pass| {
            let slots = pass.indexed_inputs(args, "ADD");
            slots.into_iter().map(|slot| pass.expr(slot)).join(", ")
        });
        match spread {
            Ok(code) => code,
            Err(err) => format!("null /* {} */", comment_text(&err.to_string())),
        }
    }
}

fn device_info(info: &str) -> String {
    let field = match info {
        "MODEL" => "android.os.Build.MODEL",
        "MANUFACTURER" => "android.os.Build.MANUFACTURER",
        "BRAND" => "android.os.Build.BRAND",
        "DEVICE" => "android.os.Build.DEVICE",
        "PRODUCT" => "android.os.Build.PRODUCT",
        "BOARD" => "android.os.Build.BOARD",
        "HARDWARE" => "android.os.Build.HARDWARE",
        "ANDROID_VERSION" | "VERSION" => "android.os.Build.VERSION.RELEASE",
        "SDK_LEVEL" | "SDK" => return "String.valueOf(android.os.Build.VERSION.SDK_INT)".to_string(),
        _ => {
            let summary = [
                ("model", "android.os.Build.MODEL"),
                ("manufacturer", "android.os.Build.MANUFACTURER"),
                ("version", "android.os.Build.VERSION.RELEASE"),
                ("sdk", "android.os.Build.VERSION.SDK_INT"),
            ]
            .iter()
            .map(|(key, value)| format!("\"\\\"{}\\\":\\\"\" + {} + \"\\\"\"", key, value))
            .join(" + \",\" + ");
            return format!("(\"{{\" + {} + \"}}\")", summary);
        }
    };
    field.to_string()
}
