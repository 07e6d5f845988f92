//! Config schema types (telegram, bot, devices, bridge, server, player, content).
use std::{fmt, str::FromStr};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelbotConfig {
    pub telegram: TelegramConfig,
    pub bot: BotConfig,
    pub devices: Vec<DeviceConfig>,
    pub bridge: BridgeConfig,
    pub server: ServerConfig,
    pub player: PlayerConfig,
    pub content: ContentConfig,
}

/// Telegram account settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Local account id used in logs and for outbound routing.
    pub account: String,
    /// Bot API token. Usually `${TELEGRAM_BOT_TOKEN}`.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    /// Long-poll timeout in seconds.
    pub poll_timeout_secs: u32,
    /// Delay before re-polling after a transport error.
    pub retry_delay_ms: u64,
    /// Publish the bot's command table through `setMyCommands` at startup.
    pub register_commands: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            account: "default".into(),
            token: None,
            poll_timeout_secs: 30,
            retry_delay_ms: 5_000,
            register_commands: true,
        }
    }
}

impl TelegramConfig {
    /// The token with surrounding whitespace removed, if one is set.
    pub fn token_str(&self) -> Option<&str> {
        self.token
            .as_ref()
            .map(|t| t.expose_secret().trim())
            .filter(|t| !t.is_empty())
    }
}

/// Which bot this process runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub kind: BotKind,
}

/// The bots shipped with pixelbot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotKind {
    #[default]
    Echo,
    Hello,
    PowerNotify,
    ControlPanel,
    GifPlayer,
    Scoreboard,
    Wordby,
}

impl BotKind {
    pub const ALL: [Self; 7] = [
        Self::Echo,
        Self::Hello,
        Self::PowerNotify,
        Self::ControlPanel,
        Self::GifPlayer,
        Self::Scoreboard,
        Self::Wordby,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Echo => "echo",
            Self::Hello => "hello",
            Self::PowerNotify => "power_notify",
            Self::ControlPanel => "control_panel",
            Self::GifPlayer => "gif_player",
            Self::Scoreboard => "scoreboard",
            Self::Wordby => "wordby",
        }
    }

    /// Number of devices the bot drives.
    pub fn required_devices(self) -> usize {
        match self {
            Self::Echo => 0,
            Self::Wordby => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for BotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| format!("unknown bot kind: {s}"))
    }
}

/// A device the bot may drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: String,
    #[serde(default = "default_device_class")]
    pub class: String,
    /// Sessions (chat ids) the device is bound to. Empty binds it globally.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sessions: Vec<String>,
}

fn default_device_class() -> String {
    "pixelmug".into()
}

/// Device classes this build knows how to drive.
pub const KNOWN_DEVICE_CLASSES: &[&str] = &["pixelmug"];

/// How RPCs reach the device gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the device gateway (`POST {url}/rpc`).
    pub url: Option<String>,
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    /// Per-call reply deadline.
    pub timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_ms: 10_000,
        }
    }
}

/// The local endpoint where the device gateway posts notify frames and replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Bearer token the gateway must present. Unset leaves the routes open.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 18_790,
            token: None,
        }
    }
}

/// GIF player settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub playlist: Vec<String>,
    /// Initial interval between automatic plays.
    pub interval_ms: u64,
    /// `sequential` (alias `seq`) or `random`.
    pub order: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            playlist: Vec::new(),
            interval_ms: 120_000,
            order: "sequential".into(),
        }
    }
}

/// Accepted spellings of [`PlayerConfig::order`].
pub const KNOWN_PLAY_ORDERS: &[&str] = &["sequential", "seq", "random"];

/// Content validation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub max_bytes: usize,
    pub width: u16,
    pub height: u16,
    pub fetch_timeout_ms: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_bytes: 40 * 1024,
            width: 32,
            height: 16,
            fetch_timeout_ms: 15_000,
        }
    }
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
