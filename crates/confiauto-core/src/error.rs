use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read criteria file at {path}: {source}")]
    CriteriaFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse criteria file: {0}")]
    CriteriaFileParse(#[from] serde_yaml::Error),

    #[error("criteria validation failed: {0}")]
    Validation(String),
}
