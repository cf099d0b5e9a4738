use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevLogError {
    #[error("dev log requires a running tokio runtime")]
    NoRuntime,

    #[error("invalid dev log configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed log line: {0}")]
    Malformed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
