//! `TensorProto.DataType` codes for the host dtype tags.

use onnxrt_core::DType;

use crate::{Error, Result};

pub const FLOAT: i32 = 1;
pub const UINT8: i32 = 2;
pub const INT8: i32 = 3;
pub const UINT16: i32 = 4;
pub const INT16: i32 = 5;
pub const INT32: i32 = 6;
pub const INT64: i32 = 7;
pub const STRING: i32 = 8;
pub const BOOL: i32 = 9;
pub const DOUBLE: i32 = 11;
pub const UINT32: i32 = 12;
pub const UINT64: i32 = 13;

pub fn to_onnx(dtype: DType) -> i32 {
    match dtype {
        DType::Bool => BOOL,
        DType::U8 => UINT8,
        DType::U16 => UINT16,
        DType::U32 => UINT32,
        DType::U64 => UINT64,
        DType::I8 => INT8,
        DType::I16 => INT16,
        DType::I32 => INT32,
        DType::I64 => INT64,
        DType::F32 => FLOAT,
        DType::F64 => DOUBLE,
        DType::String => STRING,
    }
}

pub fn from_onnx(code: i32) -> Result<DType> {
    Ok(match code {
        BOOL => DType::Bool,
        UINT8 => DType::U8,
        UINT16 => DType::U16,
        UINT32 => DType::U32,
        UINT64 => DType::U64,
        INT8 => DType::I8,
        INT16 => DType::I16,
        INT32 => DType::I32,
        INT64 => DType::I64,
        FLOAT => DType::F32,
        DOUBLE => DType::F64,
        STRING => DType::String,
        other => return Err(Error::UnsupportedType(other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_a_bijection_over_host_tags() {
        for dtype in DType::ALL {
            assert_eq!(from_onnx(to_onnx(dtype)).unwrap(), dtype);
        }
        // FLOAT16
        assert!(matches!(from_onnx(10), Err(Error::UnsupportedType(10))));
    }
}
