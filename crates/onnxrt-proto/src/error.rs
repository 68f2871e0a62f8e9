use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode model: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("invalid model: {0}")]
    Validation(String),
    #[error("unsupported tensor element type code {0}")]
    UnsupportedType(i32),
}

pub type Result<T> = std::result::Result<T, Error>;
