use std::fmt;

/// Where a block may legally appear in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockRole {
    /// Unit root and the three declaration kinds it contains.
    Declaration,
    /// Produces a value; lives in a value socket.
    Expression,
    /// Chains through `next`; lives in a statement socket.
    Statement,
}

/// Master macro to define every built-in block kind, its role and the editor tags that select it.
macro_rules! define_block_kinds {
    ( $( $variant:ident : $role:ident => [ $( $tag:literal ),+ $(,)? ] ),* $(,)? ) => {
        /// The closed set of block kinds the generator knows how to emit.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum BlockKind {
            $( $variant, )*
        }

        impl BlockKind {
            /// Every built-in kind, in table order.
            pub const ALL: &'static [BlockKind] = &[ $( BlockKind::$variant, )* ];

            /// Resolves an editor tag to its built-in kind.
            pub fn from_tag(tag: &str) -> Option<Self> {
                match tag {
                    $( $( $tag )|+ => Some(BlockKind::$variant), )*
                    _ => None,
                }
            }

            /// The editor tags that select this kind. The first one is canonical.
            pub fn tags(self) -> &'static [&'static str] {
                match self {
                    $( BlockKind::$variant => &[ $( $tag ),+ ], )*
                }
            }

            pub fn role(self) -> BlockRole {
                match self {
                    $( BlockKind::$variant => BlockRole::$role, )*
                }
            }
        }
    };
}

define_block_kinds! {
    // Unit root and declarations
    Extension: Declaration => ["ai2_extension"],
    Property: Declaration => ["ai2_property"],
    Method: Declaration => ["ai2_method"],
    Event: Declaration => ["ai2_event"],

    // Literals and references
    MathNumber: Expression => ["math_number"],
    Text: Expression => ["text"],
    LogicBoolean: Expression => ["logic_boolean"],
    LogicNull: Expression => ["logic_null"],
    VariablesGet: Expression => ["variables_get"],

    // Logic
    LogicCompare: Expression => ["logic_compare"],
    LogicOperation: Expression => ["logic_operation"],
    LogicNegate: Expression => ["logic_negate"],
    LogicTernary: Expression => ["logic_ternary"],

    // Math
    MathArithmetic: Expression => ["math_arithmetic"],
    MathSingle: Expression => ["math_single"],
    MathRound: Expression => ["math_round"],
    MathTrig: Expression => ["math_trig_simple", "math_trig"],
    MathModulo: Expression => ["math_modulo"],
    MathRandomInt: Expression => ["math_random_int"],
    MathRandomFloat: Expression => ["math_random_float"],
    MathMinMax: Expression => ["math_min_max"],
    MathConstrain: Expression => ["math_constrain"],
    MathIsNumber: Expression => ["math_is_number"],
    MathParseInt: Expression => ["math_parse_int"],
    MathParseFloat: Expression => ["math_parse_float"],

    // Text
    TextJoin: Expression => ["text_join"],
    TextLength: Expression => ["text_length"],
    TextIsEmpty: Expression => ["text_isEmpty"],
    TextIndexOf: Expression => ["text_indexOf"],
    TextCharAt: Expression => ["text_charAt"],
    TextGetSubstring: Expression => ["text_getSubstring"],
    TextChangeCase: Expression => ["text_changeCase"],
    TextContains: Expression => ["text_contains"],
    TextStartsWith: Expression => ["text_startswith"],
    TextEndsWith: Expression => ["text_endswith"],
    TextReverse: Expression => ["text_reverse"],
    TextTrim: Expression => ["text_trim"],
    TextSplit: Expression => ["text_split"],
    TextJoinList: Expression => ["text_join_list"],
    TextReplaceAll: Expression => ["text_replace_all"],
    TextReplaceRegex: Expression => ["text_replace_regex", "regex_replace"],
    RegexMatch: Expression => ["regex_match"],

    // Lists
    ListsCreateWith: Expression => ["lists_create_with"],
    ListsLength: Expression => ["lists_length"],
    ListsIsEmpty: Expression => ["lists_isEmpty"],
    ListsGetIndex: Expression => ["lists_getIndex"],
    ListsIndexOf: Expression => ["lists_index_of", "lists_indexOf"],
    ListsPickRandom: Expression => ["lists_pick_random"],
    ListsCopy: Expression => ["lists_copy"],

    // Maps
    MapsCreateWith: Expression => ["maps_create_with"],
    MapGet: Expression => ["map_get"],
    MapKeys: Expression => ["map_keys"],
    MapValues: Expression => ["map_values"],
    MapContainsKey: Expression => ["map_contains_key"],
    MapSize: Expression => ["map_size"],
    MapIsEmpty: Expression => ["map_is_empty"],

    // Platform helpers
    JsonParse: Expression => ["json_parse"],
    JsonGet: Expression => ["json_get"],
    Base64Encode: Expression => ["base64_encode"],
    Base64Decode: Expression => ["base64_decode"],
    CryptoHash: Expression => ["crypto_hash"],
    DateNow: Expression => ["date_now_millis", "date_current_millis"],
    DateFormat: Expression => ["date_format"],
    DateParse: Expression => ["date_parse"],
    DeviceInfo: Expression => ["device_info"],
    DeviceLanguage: Expression => ["device_get_language"],
    DeviceDarkMode: Expression => ["device_is_dark_mode"],
    DeviceOnline: Expression => ["device_is_online"],
    DeviceBattery: Expression => ["device_battery_level"],
    UrlEncode: Expression => ["web_url_encode"],
    UrlDecode: Expression => ["web_url_decode"],
    HtmlDecode: Expression => ["web_html_decode"],
    PrefsGet: Expression => ["prefs_get"],
    NetworkGet: Expression => ["network_get"],
    NetworkPost: Expression => ["network_post"],
    FileRead: Expression => ["file_read"],
    FileExists: Expression => ["file_exists"],
    FileDelete: Expression => ["file_delete"],
    FileList: Expression => ["file_list"],
    ClipboardGet: Expression => ["android_clipboard_get"],

    // Escape hatch and reflection-style access
    CustomExpression: Expression => ["ai2_custom_expression"],
    NativeFieldGet: Expression => ["native_field_get"],
    NativeCall: Expression => ["native_call"],

    // Assignment-like statements
    SetProperty: Statement => ["ai2_set"],
    VariablesSet: Statement => ["variables_set"],
    MathChange: Statement => ["math_change"],
    Return: Statement => ["ai2_return"],
    Dispatch: Statement => ["ai2_dispatch"],

    // Control flow
    ControlsIf: Statement => ["controls_if"],
    ControlsRepeat: Statement => ["controls_repeat", "controls_repeat_ext"],
    ControlsFor: Statement => ["controls_for"],
    ControlsForEach: Statement => ["controls_forEach"],
    ControlsWhileUntil: Statement => ["controls_whileUntil"],
    TryCatch: Statement => ["controls_try_catch"],
    ThreadRun: Statement => ["thread_run"],
    TimerDelay: Statement => ["timer_delay"],
    HttpGet: Statement => ["http_get"],

    // Collection mutation
    MapPut: Statement => ["map_put"],
    MapRemove: Statement => ["map_remove"],
    MapClear: Statement => ["map_clear"],
    ListsAppend: Statement => ["lists_append"],
    ListsRemoveAt: Statement => ["lists_remove_at"],
    ListsSort: Statement => ["lists_sort"],
    ListsReverse: Statement => ["lists_reverse"],
    ListsShuffle: Statement => ["lists_shuffle"],

    // Platform side effects
    TextPrint: Statement => ["text_print"],
    FileWrite: Statement => ["file_write"],
    NativeFieldSet: Statement => ["native_field_set"],
    Vibrate: Statement => ["device_vibrate", "vibrator_vibrate"],
    PrefsStore: Statement => ["prefs_store"],
    Toast: Statement => ["android_toast", "toast_show"],
    Log: Statement => ["android_log"],
    ClipboardSet: Statement => ["android_clipboard_set", "clipboard_copy"],
    OpenUrl: Statement => ["android_open_url", "intent_open"],
    ShareText: Statement => ["android_share_text"],
    CustomCode: Statement => ["ai2_custom_code"],
}

impl BlockKind {
    pub fn tag(self) -> &'static str {
        self.tags()[0]
    }

    /// Value blocks whose generated expression is also a valid Java expression statement.
    pub fn is_call_like(self) -> bool {
        matches!(
            self,
            BlockKind::NativeCall | BlockKind::CustomExpression | BlockKind::FileDelete
        )
    }

    /// Value blocks that always evaluate to a `String`.
    pub fn produces_text(self) -> bool {
        matches!(
            self,
            BlockKind::Text
                | BlockKind::TextJoin
                | BlockKind::TextChangeCase
                | BlockKind::TextReverse
                | BlockKind::TextTrim
                | BlockKind::TextGetSubstring
                | BlockKind::TextReplaceAll
                | BlockKind::TextReplaceRegex
                | BlockKind::TextJoinList
                | BlockKind::Base64Encode
                | BlockKind::Base64Decode
                | BlockKind::CryptoHash
                | BlockKind::DateFormat
                | BlockKind::DeviceLanguage
                | BlockKind::UrlEncode
                | BlockKind::UrlDecode
                | BlockKind::HtmlDecode
                | BlockKind::PrefsGet
                | BlockKind::NetworkGet
                | BlockKind::NetworkPost
                | BlockKind::FileRead
                | BlockKind::ClipboardGet
        )
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
