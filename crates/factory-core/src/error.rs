use thiserror::Error;

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("invalid project name '{0}': must be alphanumeric with dots, dashes, or underscores")]
    InvalidProjectName(String),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("unknown framework '{0}': expected Next.js or Flask")]
    UnknownFramework(String),

    #[error("cannot extract project ref from supabase url: {0}")]
    SupabaseUrl(String),

    #[error("supabase management api: {0}")]
    Supabase(String),

    #[error("no valid columns parsed for table '{0}'")]
    EmptySchema(String),

    #[error("quality api: {0}")]
    Quality(String),

    #[error("required tool not found on PATH: {0}")]
    ToolMissing(String),

    #[error("failed to run command '{command}': {message}")]
    CommandFailed { command: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sql(#[from] rusqlite::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, FactoryError>;
