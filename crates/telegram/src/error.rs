use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("invalid telegram chat id: {chat_id}")]
    InvalidChatId { chat_id: String },

    #[error("unknown telegram account: {account_id}")]
    UnknownAccount { account_id: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_chat_id(chat_id: impl Into<String>) -> Self {
        Self::InvalidChatId {
            chat_id: chat_id.into(),
        }
    }

    #[must_use]
    pub fn unknown_account(account_id: impl Into<String>) -> Self {
        Self::UnknownAccount {
            account_id: account_id.into(),
        }
    }
}

impl From<Error> for pixelbot_channels::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::UnknownAccount { account_id } => Self::unknown_account(account_id),
            Error::InvalidChatId { chat_id } => {
                Self::invalid_input(format!("telegram chat id '{chat_id}'"))
            },
            other => Self::external("telegram", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
