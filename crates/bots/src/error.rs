use pixelbot_config::BotKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("bot {kind} needs {required} device(s), {found} bound")]
    NotEnoughDevices {
        kind: BotKind,
        required: usize,
        found: usize,
    },

    #[error("invalid player setting: {message}")]
    InvalidSetting { message: String },

    #[error(transparent)]
    Routing(#[from] pixelbot_routing::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_setting(message: impl Into<String>) -> Self {
        Self::InvalidSetting {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
