//! Mapping between host dtype tags and ONNX Runtime element types.

use onnxrt_core::{DType, Result, SessionError};
use ort::tensor::TensorElementType;

pub fn to_native(dtype: DType) -> TensorElementType {
    match dtype {
        DType::Bool => TensorElementType::Bool,
        DType::U8 => TensorElementType::Uint8,
        DType::U16 => TensorElementType::Uint16,
        DType::U32 => TensorElementType::Uint32,
        DType::U64 => TensorElementType::Uint64,
        DType::I8 => TensorElementType::Int8,
        DType::I16 => TensorElementType::Int16,
        DType::I32 => TensorElementType::Int32,
        DType::I64 => TensorElementType::Int64,
        DType::F32 => TensorElementType::Float32,
        DType::F64 => TensorElementType::Float64,
        DType::String => TensorElementType::String,
    }
}

/// `name` labels the value the type came from in the error.
pub fn from_native(name: &str, ty: TensorElementType) -> Result<DType> {
    match ty {
        TensorElementType::Bool => Ok(DType::Bool),
        TensorElementType::Uint8 => Ok(DType::U8),
        TensorElementType::Uint16 => Ok(DType::U16),
        TensorElementType::Uint32 => Ok(DType::U32),
        TensorElementType::Uint64 => Ok(DType::U64),
        TensorElementType::Int8 => Ok(DType::I8),
        TensorElementType::Int16 => Ok(DType::I16),
        TensorElementType::Int32 => Ok(DType::I32),
        TensorElementType::Int64 => Ok(DType::I64),
        TensorElementType::Float32 => Ok(DType::F32),
        TensorElementType::Float64 => Ok(DType::F64),
        TensorElementType::String => Ok(DType::String),
        other => Err(SessionError::unsupported(name, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_host_tag_maps_back_to_itself() {
        for dtype in DType::ALL {
            assert_eq!(from_native("x", to_native(dtype)).unwrap(), dtype);
        }
    }

    #[test]
    fn half_precision_is_unsupported() {
        let err = from_native("weights", TensorElementType::Float16).unwrap_err();
        assert!(matches!(
            err,
            SessionError::UnsupportedType { ref name, .. } if name == "weights"
        ));
    }
}
