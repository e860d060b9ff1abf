#[derive(Debug, thiserror::Error)]
pub enum SynopsisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to parse source document: {0}")]
    Parse(String),
    #[error("no papers found for query: {0}")]
    NoPapers(String),
    #[error("upstream service failed: {0}")]
    Upstream(String),

    #[error("failed to create output directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to pack docx archive: {0}")]
    DocxPack(String),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid stored timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type SynopsisResult<T> = std::result::Result<T, SynopsisError>;
