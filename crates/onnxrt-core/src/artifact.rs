use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::{Result, SessionError};

/// Where a session reads its serialized graph from.
#[derive(Clone, Debug)]
pub enum ModelSource {
    Path(PathBuf),
    Bytes(Bytes),
}

impl ModelSource {
    /// Builds a source from two optional halves, exactly one of which must be
    /// present.
    pub fn from_parts(path: Option<PathBuf>, model: Option<Bytes>) -> Result<Self> {
        match (path, model) {
            (Some(path), None) => Ok(ModelSource::Path(path)),
            (None, Some(bytes)) => Ok(ModelSource::Bytes(bytes)),
            (Some(_), Some(_)) => Err(SessionError::InvalidArgument(
                "exactly one of `path` or `model` must be set, got both".to_string(),
            )),
            (None, None) => Err(SessionError::InvalidArgument(
                "exactly one of `path` or `model` must be set, got neither".to_string(),
            )),
        }
    }

    pub fn from_model<M: SerializeModel + ?Sized>(model: &M) -> Result<Self> {
        model.to_model_bytes().map(ModelSource::Bytes)
    }

    pub fn describe(&self) -> String {
        match self {
            ModelSource::Path(path) => path.display().to_string(),
            ModelSource::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

impl From<PathBuf> for ModelSource {
    fn from(path: PathBuf) -> Self {
        ModelSource::Path(path)
    }
}

impl From<&Path> for ModelSource {
    fn from(path: &Path) -> Self {
        ModelSource::Path(path.to_path_buf())
    }
}

impl From<Bytes> for ModelSource {
    fn from(bytes: Bytes) -> Self {
        ModelSource::Bytes(bytes)
    }
}

impl From<Vec<u8>> for ModelSource {
    fn from(bytes: Vec<u8>) -> Self {
        ModelSource::Bytes(Bytes::from(bytes))
    }
}

/// Values that can produce their own serialized graph bytes on demand.
pub trait SerializeModel {
    fn to_model_bytes(&self) -> Result<Bytes>;
}

impl SerializeModel for [u8] {
    fn to_model_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(self))
    }
}

impl SerializeModel for Vec<u8> {
    fn to_model_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(self))
    }
}

impl SerializeModel for Bytes {
    fn to_model_bytes(&self) -> Result<Bytes> {
        Ok(self.clone())
    }
}
