//! Configuration validation engine.
//!
//! Checks a config file for syntax errors, unknown or misspelled fields,
//! type mismatches and settings that would stop the selected bot from
//! working (missing token, too few devices, zero intervals).

use std::{
    collections::{HashMap, HashSet},
    net::IpAddr,
    path::{Path, PathBuf},
};

use crate::{
    env_subst::{substitute_env, unresolved_placeholders},
    loader::{find_config_file, parse_config},
    schema::{KNOWN_DEVICE_CLASSES, KNOWN_PLAY_ORDERS, PixelbotConfig},
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "missing",
    /// "devices", "value", "env", "security", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "player.interval_ms"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration.
enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Array(Box<KnownKeys>),
    Leaf,
}

/// Mirrors every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Struct};

    Struct(HashMap::from([
        (
            "telegram",
            Struct(HashMap::from([
                ("account", Leaf),
                ("token", Leaf),
                ("poll_timeout_secs", Leaf),
                ("retry_delay_ms", Leaf),
                ("register_commands", Leaf),
            ])),
        ),
        ("bot", Struct(HashMap::from([("kind", Leaf)]))),
        (
            "devices",
            Array(Box::new(Struct(HashMap::from([
                ("id", Leaf),
                ("class", Leaf),
                ("sessions", Leaf),
            ])))),
        ),
        (
            "bridge",
            Struct(HashMap::from([
                ("url", Leaf),
                ("token", Leaf),
                ("timeout_ms", Leaf),
            ])),
        ),
        (
            "server",
            Struct(HashMap::from([
                ("bind", Leaf),
                ("port", Leaf),
                ("token", Leaf),
            ])),
        ),
        (
            "player",
            Struct(HashMap::from([
                ("playlist", Leaf),
                ("interval_ms", Leaf),
                ("order", Leaf),
            ])),
        ),
        (
            "content",
            Struct(HashMap::from([
                ("max_bytes", Leaf),
                ("width", Leaf),
                ("height", Leaf),
                ("fetch_timeout_ms", Leaf),
            ])),
        ),
    ]))
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Entry points ────────────────────────────────────────────────────────────

/// Validate the config at `path`, or the discovered one when `path` is `None`.
///
/// `${VAR}` placeholders are substituted first, the same way the loader does.
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            )],
            config_path: None,
        };
    };

    let content = match std::fs::read_to_string(actual_path) {
        Ok(content) => content,
        Err(e) => {
            return ValidationResult {
                diagnostics: vec![Diagnostic::new(
                    Severity::Error,
                    "file-ref",
                    "",
                    format!("failed to read config file: {e}"),
                )],
                config_path,
            };
        },
    };

    let substituted = substitute_env(&content);
    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|e| e == "toml");
    let mut result = if is_toml {
        validate_toml_str(&substituted)
    } else {
        validate_other(&substituted, actual_path)
    };
    for name in unresolved_placeholders(&substituted) {
        result.diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "env",
            "",
            format!("environment variable {name} is not set; ${{{name}}} left as-is"),
        ));
    }
    result.config_path = config_path;
    result
}

/// Validate TOML text: syntax, unknown fields, types, then semantics.
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    if let Ok(tree) = serde_json::to_value(&toml_value) {
        check_unknown_fields(&tree, &build_schema_map(), "", &mut diagnostics);
    }

    match toml::from_str::<PixelbotConfig>(toml_str) {
        Ok(config) => diagnostics.extend(validate_config(&config)),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// YAML and JSON: the same checks, on the generic value tree.
fn validate_other(raw: &str, path: &Path) -> ValidationResult {
    let mut diagnostics = Vec::new();
    let tree: Result<serde_json::Value, String> = match path.extension().and_then(|e| e.to_str())
    {
        Some("json") => serde_json::from_str(raw).map_err(|e| e.to_string()),
        _ => serde_yaml::from_str(raw).map_err(|e| e.to_string()),
    };
    match tree {
        Ok(tree) => check_unknown_fields(&tree, &build_schema_map(), "", &mut diagnostics),
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    }

    match parse_config(raw, path) {
        Ok(config) => diagnostics.extend(validate_config(&config)),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            e.to_string(),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (value, schema) {
        (serde_json::Value::Object(table), KnownKeys::Struct(fields)) => {
            let mut known_keys: Vec<&str> = fields.keys().copied().collect();
            known_keys.sort_unstable();
            for (key, child_value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child_value, child_schema, &path, diagnostics);
                    continue;
                }
                let level = if prefix.is_empty() {
                    " at top level"
                } else {
                    ""
                };
                let message = match suggest(key, &known_keys, 3) {
                    Some(s) => format!("unknown field{level} (did you mean \"{s}\"?)"),
                    None => format!("unknown field{level}"),
                };
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "unknown-field",
                    path,
                    message,
                ));
            }
        },
        (serde_json::Value::Array(items), KnownKeys::Array(item_schema)) => {
            for (i, item) in items.iter().enumerate() {
                let path = format!("{prefix}[{i}]");
                check_unknown_fields(item, item_schema, &path, diagnostics);
            }
        },
        // Leaf or type mismatch, caught by deserialization.
        _ => {},
    }
}

/// Semantic checks on a parsed config.
pub fn validate_config(config: &PixelbotConfig) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let kind = config.bot.kind;

    if config.telegram.token_str().is_none() {
        out.push(Diagnostic::new(
            Severity::Error,
            "missing",
            "telegram.token",
            "telegram bot token is not set",
        ));
    }
    if config.telegram.account.trim().is_empty() {
        out.push(Diagnostic::new(
            Severity::Error,
            "missing",
            "telegram.account",
            "account id must not be empty",
        ));
    }
    if config.telegram.poll_timeout_secs == 0 {
        out.push(Diagnostic::new(
            Severity::Warning,
            "value",
            "telegram.poll_timeout_secs",
            "a zero poll timeout turns long polling into busy polling",
        ));
    }

    check_devices(config, &mut out);

    let needs_devices = kind.required_devices() > 0;
    if needs_devices && config.bridge.url.as_deref().is_none_or(|u| u.trim().is_empty()) {
        out.push(Diagnostic::new(
            Severity::Error,
            "missing",
            "bridge.url",
            format!("bot kind {kind} drives devices but no device gateway url is set"),
        ));
    }
    if let Some(url) = config.bridge.url.as_deref()
        && !url.trim().is_empty()
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        out.push(Diagnostic::new(
            Severity::Error,
            "value",
            "bridge.url",
            format!("expected an http(s) url, got {url:?}"),
        ));
    }
    if config.bridge.timeout_ms == 0 {
        out.push(Diagnostic::new(
            Severity::Error,
            "value",
            "bridge.timeout_ms",
            "reply timeout must be greater than zero",
        ));
    }

    check_player(config, &mut out);

    let content = &config.content;
    if content.max_bytes == 0 || content.width == 0 || content.height == 0 {
        out.push(Diagnostic::new(
            Severity::Error,
            "value",
            "content",
            "max_bytes, width and height must all be greater than zero",
        ));
    }
    if content.fetch_timeout_ms == 0 {
        out.push(Diagnostic::new(
            Severity::Error,
            "value",
            "content.fetch_timeout_ms",
            "fetch timeout must be greater than zero",
        ));
    }

    if config.server.port == 0 {
        out.push(Diagnostic::new(
            Severity::Info,
            "value",
            "server.port",
            "port 0 picks a random port; the device gateway cannot be pointed at it",
        ));
    }
    let loopback = config.server.bind == "localhost"
        || config
            .server
            .bind
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback());
    if !loopback && config.server.token.is_none() {
        out.push(Diagnostic::new(
            Severity::Warning,
            "security",
            "server.token",
            format!(
                "callback endpoint binds {} without a token; anyone on the network can post frames",
                config.server.bind
            ),
        ));
    }

    out
}

fn check_devices(config: &PixelbotConfig, out: &mut Vec<Diagnostic>) {
    let kind = config.bot.kind;
    let required = kind.required_devices();
    if config.devices.len() < required {
        let message = if config.devices.is_empty() {
            format!("bot kind {kind} needs {required} device(s) but none are configured")
        } else {
            format!(
                "bot kind {kind} needs {required} device(s), found {}",
                config.devices.len()
            )
        };
        out.push(Diagnostic::new(Severity::Error, "devices", "devices", message));
    }

    let mut seen = HashSet::new();
    for (i, device) in config.devices.iter().enumerate() {
        let path = format!("devices[{i}]");
        if device.id.trim().is_empty() {
            out.push(Diagnostic::new(
                Severity::Error,
                "devices",
                format!("{path}.id"),
                "device id must not be empty",
            ));
        } else if !seen.insert(device.id.as_str()) {
            out.push(Diagnostic::new(
                Severity::Error,
                "devices",
                format!("{path}.id"),
                format!("duplicate device id {:?}", device.id),
            ));
        }
        if !KNOWN_DEVICE_CLASSES.contains(&device.class.as_str()) {
            let hint = suggest(&device.class, KNOWN_DEVICE_CLASSES, 3)
                .map(|s| format!(" (did you mean \"{s}\"?)"))
                .unwrap_or_default();
            out.push(Diagnostic::new(
                Severity::Error,
                "devices",
                format!("{path}.class"),
                format!("unknown device class {:?}{hint}", device.class),
            ));
        }
        if device.sessions.iter().any(|s| s.trim().is_empty()) {
            out.push(Diagnostic::new(
                Severity::Error,
                "devices",
                format!("{path}.sessions"),
                "session ids must not be empty",
            ));
        }
    }
}

fn check_player(config: &PixelbotConfig, out: &mut Vec<Diagnostic>) {
    let player = &config.player;
    if !KNOWN_PLAY_ORDERS.contains(&player.order.to_ascii_lowercase().as_str()) {
        out.push(Diagnostic::new(
            Severity::Error,
            "value",
            "player.order",
            format!(
                "unknown play order {:?}; expected sequential or random",
                player.order
            ),
        ));
    }
    if player.interval_ms == 0 {
        out.push(Diagnostic::new(
            Severity::Error,
            "value",
            "player.interval_ms",
            "interval must be greater than zero",
        ));
    } else if player.interval_ms < 1_000 {
        out.push(Diagnostic::new(
            Severity::Warning,
            "value",
            "player.interval_ms",
            "intervals under one second flood the device with plays",
        ));
    }
    if config.bot.kind == crate::schema::BotKind::GifPlayer && player.playlist.is_empty() {
        out.push(Diagnostic::new(
            Severity::Warning,
            "value",
            "player.playlist",
            "playlist is empty; the player will have nothing to show",
        ));
    }
    for (i, url) in player.playlist.iter().enumerate() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            out.push(Diagnostic::new(
                Severity::Warning,
                "value",
                format!("player.playlist[{i}]"),
                format!("{url:?} is not an http(s) url"),
            ));
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    const VALID: &str = r#"
        [telegram]
        token = "123:abc"

        [bot]
        kind = "gif_player"

        [[devices]]
        id = "mug-1"

        [bridge]
        url = "http://127.0.0.1:9000"

        [player]
        playlist = ["https://example.com/a.gif"]
        interval_ms = 30000
        order = "random"
    "#;

    fn paths(result: &ValidationResult, severity: Severity) -> Vec<String> {
        result
            .diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.path.clone())
            .collect()
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("kind", "kind"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kind", "knd"), 1);
        assert_eq!(levenshtein("°F", "°C"), 1);
    }

    #[test]
    fn suggest_finds_close_match() {
        assert_eq!(suggest("plyer", &["player", "server"], 3), Some("player"));
        assert_eq!(suggest("zzzzzzzz", &["player", "server"], 3), None);
    }

    #[test]
    fn full_valid_config_has_no_diagnostics() {
        let result = validate_toml_str(VALID);
        assert!(
            result.diagnostics.is_empty(),
            "unexpected: {:?}",
            result.diagnostics
        );
    }

    #[test]
    fn syntax_error_detected() {
        let result = validate_toml_str("[bot\nkind = ");
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn unknown_top_level_key_with_suggestion() {
        let result = validate_toml_str(&format!("{VALID}\n[plyer]\norder = \"seq\"\n"));
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field")
            .unwrap();
        assert_eq!(diag.path, "plyer");
        assert!(diag.message.contains("did you mean \"player\""));
    }

    #[test]
    fn unknown_field_inside_device_entry() {
        let result = validate_toml_str(
            r#"
            [telegram]
            token = "t"
            [bridge]
            url = "http://gw"
            [bot]
            kind = "hello"
            [[devices]]
            id = "mug-1"
            clas = "pixelmug"
            "#,
        );
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field")
            .unwrap();
        assert_eq!(diag.path, "devices[0].clas");
        assert!(diag.message.contains("\"class\""));
    }

    #[test]
    fn wrong_type_is_a_type_error() {
        let result = validate_toml_str("[player]\ninterval_ms = \"soon\"\n");
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "type-error")
        );
    }

    #[test]
    fn missing_token_is_an_error() {
        let result = validate_toml_str("[bot]\nkind = \"echo\"\n");
        assert_eq!(paths(&result, Severity::Error), vec!["telegram.token"]);
    }

    #[rstest]
    #[case("hello", 0, "devices")]
    #[case("wordby", 1, "devices")]
    #[case("control_panel", 0, "devices")]
    fn too_few_devices(#[case] kind: &str, #[case] devices: usize, #[case] path: &str) {
        let mut toml = format!(
            "[telegram]\ntoken = \"t\"\n[bridge]\nurl = \"http://gw\"\n[bot]\nkind = \"{kind}\"\n"
        );
        for i in 0..devices {
            toml.push_str(&format!("[[devices]]\nid = \"mug-{i}\"\n"));
        }
        let result = validate_toml_str(&toml);
        assert_eq!(paths(&result, Severity::Error), vec![path.to_string()]);
    }

    #[test]
    fn wordby_with_two_devices_is_fine() {
        let result = validate_toml_str(
            r#"
            [telegram]
            token = "t"
            [bridge]
            url = "http://gw"
            [bot]
            kind = "wordby"
            [[devices]]
            id = "mug-1"
            [[devices]]
            id = "mug-2"
            "#,
        );
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
    }

    #[test]
    fn device_bot_without_bridge_url() {
        let result = validate_toml_str(
            "[telegram]\ntoken = \"t\"\n[bot]\nkind = \"hello\"\n[[devices]]\nid = \"m\"\n",
        );
        assert_eq!(paths(&result, Severity::Error), vec!["bridge.url"]);
    }

    #[test]
    fn duplicate_and_unknown_devices() {
        let result = validate_toml_str(
            r#"
            [telegram]
            token = "t"
            [[devices]]
            id = "m"
            [[devices]]
            id = "m"
            class = "pixelmugg"
            "#,
        );
        let errors = paths(&result, Severity::Error);
        assert!(errors.contains(&"devices[1].id".to_string()));
        let class = result
            .diagnostics
            .iter()
            .find(|d| d.path == "devices[1].class")
            .unwrap();
        assert!(class.message.contains("did you mean \"pixelmug\""));
    }

    #[test]
    fn zero_interval_and_bad_order() {
        let result = validate_toml_str(&VALID.replace("30000", "0").replace("random", "shuffle"));
        let errors = paths(&result, Severity::Error);
        assert!(errors.contains(&"player.interval_ms".to_string()));
        assert!(errors.contains(&"player.order".to_string()));
    }

    #[test]
    fn seq_alias_is_accepted() {
        let result = validate_toml_str(&VALID.replace("random", "seq"));
        assert!(!result.has_errors());
    }

    #[test]
    fn empty_playlist_warns_for_gif_player() {
        let result = validate_toml_str(
            &VALID.replace("playlist = [\"https://example.com/a.gif\"]", "playlist = []"),
        );
        assert_eq!(paths(&result, Severity::Warning), vec!["player.playlist"]);
    }

    #[test]
    fn open_endpoint_on_public_bind_warns() {
        let result = validate_toml_str(&format!("{VALID}\n[server]\nbind = \"0.0.0.0\"\n"));
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.category == "security")
            .unwrap();
        assert_eq!(diag.path, "server.token");

        let with_token = validate_toml_str(&format!(
            "{VALID}\n[server]\nbind = \"0.0.0.0\"\ntoken = \"s\"\n"
        ));
        assert!(
            !with_token
                .diagnostics
                .iter()
                .any(|d| d.category == "security")
        );
    }

    #[test]
    fn validate_file_reports_unset_env_var() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixelbot.toml");
        std::fs::write(
            &path,
            "[telegram]\ntoken = \"${PIXELBOT_SURELY_UNSET_TOKEN_VAR}\"\n",
        )
        .unwrap();
        let result = validate(Some(&path));
        assert_eq!(result.config_path.as_deref(), Some(path.as_path()));
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "env"
                    && d.message.contains("PIXELBOT_SURELY_UNSET_TOKEN_VAR"))
        );
    }

    #[test]
    fn validate_yaml_file_checks_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixelbot.yaml");
        std::fs::write(&path, "telegram:\n  token: t\nbot:\n  knd: echo\n").unwrap();
        let result = validate(Some(&path));
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field")
            .unwrap();
        assert_eq!(diag.path, "bot.knd");
    }

    #[test]
    fn validate_missing_file_is_an_error() {
        let result = validate(Some(Path::new("/nonexistent/pixelbot.toml")));
        assert!(result.has_errors());
    }
}
