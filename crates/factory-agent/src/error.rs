use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to spawn agent command '{command}': {message}")]
    Spawn { command: String, message: String },

    #[error("agent task failed: {0}")]
    TaskFailed(String),

    #[error("agent quota exhausted after {attempts} attempts")]
    QuotaExhausted { attempts: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
