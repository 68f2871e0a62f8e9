//! Error taxonomy shared by every session operation.

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Malformed call, rejected before any engine interaction.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine refused the model, or the model source could not be read.
    #[error("failed to load model from {origin}: {message}")]
    ModelLoad { origin: String, message: String },

    #[error("type mismatch for `{name}`: expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("shape mismatch for `{name}`: expected {expected}, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("unsupported element type for `{name}`: {dtype}")]
    UnsupportedType { name: String, dtype: String },

    #[error("session is not ready: {0}")]
    NotReady(String),

    /// Execution failure reported by the engine, diagnostic text unchanged.
    #[error("engine execution failed: {0}")]
    Engine(String),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    ModelLoad,
    TypeMismatch,
    ShapeMismatch,
    UnsupportedType,
    NotReady,
    Engine,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            SessionError::ModelLoad { .. } => ErrorKind::ModelLoad,
            SessionError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            SessionError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            SessionError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            SessionError::NotReady(_) => ErrorKind::NotReady,
            SessionError::Engine(_) => ErrorKind::Engine,
        }
    }

    /// True for failures raised while converting a single buffer.
    pub fn is_marshalling(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TypeMismatch | ErrorKind::ShapeMismatch | ErrorKind::UnsupportedType
        )
    }

    pub fn model_load(origin: impl Into<String>, message: impl Display) -> Self {
        SessionError::ModelLoad {
            origin: origin.into(),
            message: message.to_string(),
        }
    }

    pub fn type_mismatch(
        name: impl Into<String>,
        expected: impl Display,
        actual: impl Display,
    ) -> Self {
        SessionError::TypeMismatch {
            name: name.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn shape_mismatch(
        name: impl Into<String>,
        expected: impl Display,
        actual: impl Display,
    ) -> Self {
        SessionError::ShapeMismatch {
            name: name.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn unsupported(name: impl Into<String>, dtype: impl Display) -> Self {
        SessionError::UnsupportedType {
            name: name.into(),
            dtype: dtype.to_string(),
        }
    }

    pub fn engine(err: impl Display) -> Self {
        SessionError::Engine(err.to_string())
    }
}
