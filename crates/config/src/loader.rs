use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::PixelbotConfig,
};

/// Standard config file names, checked in order.
pub const CONFIG_FILENAMES: &[&str] = &[
    "pixelbot.toml",
    "pixelbot.yaml",
    "pixelbot.yml",
    "pixelbot.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<PixelbotConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./pixelbot.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/pixelbot/pixelbot.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PixelbotConfig::default()` if no config file is found or the
/// file fails to load.
pub fn discover_and_load() -> PixelbotConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    PixelbotConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/pixelbot/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pixelbot").map(|d| d.config_dir().to_path_buf())
}

/// Parse already-substituted config text, choosing the format by extension.
pub fn parse_config(raw: &str, path: &Path) -> Result<PixelbotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse("TOML", e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse("YAML", e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse("JSON", e)),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::schema::BotKind};

    #[test]
    fn loads_each_format() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("pixelbot.toml");
        std::fs::write(&toml_path, "[bot]\nkind = \"hello\"\n").unwrap();
        assert_eq!(load_config(&toml_path).unwrap().bot.kind, BotKind::Hello);

        let yaml_path = dir.path().join("pixelbot.yaml");
        std::fs::write(&yaml_path, "bot:\n  kind: scoreboard\n").unwrap();
        assert_eq!(
            load_config(&yaml_path).unwrap().bot.kind,
            BotKind::Scoreboard
        );

        let json_path = dir.path().join("pixelbot.json");
        std::fs::write(&json_path, r#"{"bot": {"kind": "wordby"}}"#).unwrap();
        assert_eq!(load_config(&json_path).unwrap().bot.kind, BotKind::Wordby);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixelbot.ini");
        std::fs::write(&path, "kind=echo").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/pixelbot.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pixelbot.toml"));
    }

    #[test]
    fn syntax_error_names_format() {
        let err = parse_config("[bot\n", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, Error::Parse { format: "TOML", .. }));
    }
}
