use nanobanana_contracts::conversation::ConversationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure kind the tool reports to the user. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad or missing input, detected before any remote call, or a local
    /// write failure.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    /// Failure during or after the remote generation call.
    #[error("{0}")]
    Generation(String),
    #[error("{0}")]
    PromptGeneration(String),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation Error",
            Self::Authentication(_) => "Authentication Error",
            Self::Generation(_) => "Generation Error",
            Self::PromptGeneration(_) => "Prompt Generation Error",
            Self::Conversation(_) => "Conversation Error",
        }
    }
}
