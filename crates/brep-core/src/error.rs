use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrepError {
    #[error("Topology error: {0}")]
    Topology(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Mandatory split failed: {0}")]
    MandatorySplit(String),

    #[error("Triangulation error: {0}")]
    Triangulation(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, BrepError>;
