#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid command token {token:?}")]
    InvalidCommand { token: String },

    #[error("dispatcher is shut down")]
    ShutDown,

    #[error("queue for {worker} is full")]
    QueueFull { worker: String },
}

impl Error {
    #[must_use]
    pub fn invalid_command(token: impl Into<String>) -> Self {
        Self::InvalidCommand {
            token: token.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
