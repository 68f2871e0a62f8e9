//! Conversion between host tensors and ONNX Runtime values.
//!
//! Fixed-width dtypes move as one contiguous copy in each direction. Strings
//! have no fixed stride, so they are copied one element at a time.

use onnxrt_core::{DType, Element, Result, SessionError, Shape, Tensor};
use ort::value::{DynValue, ValueRef, ValueType};

use crate::dtype::{from_native, to_native};

/// Builds an owned native value from a host tensor. `name` labels errors.
pub fn encode(name: &str, tensor: &Tensor) -> Result<DynValue> {
    tensor.validate(name)?;
    let shape = tensor.shape().to_vec();

    match tensor.dtype() {
        DType::Bool => encode_fixed::<bool>(name, shape, tensor),
        DType::U8 => encode_fixed::<u8>(name, shape, tensor),
        DType::U16 => encode_fixed::<u16>(name, shape, tensor),
        DType::U32 => encode_fixed::<u32>(name, shape, tensor),
        DType::U64 => encode_fixed::<u64>(name, shape, tensor),
        DType::I8 => encode_fixed::<i8>(name, shape, tensor),
        DType::I16 => encode_fixed::<i16>(name, shape, tensor),
        DType::I32 => encode_fixed::<i32>(name, shape, tensor),
        DType::I64 => encode_fixed::<i64>(name, shape, tensor),
        DType::F32 => encode_fixed::<f32>(name, shape, tensor),
        DType::F64 => encode_fixed::<f64>(name, shape, tensor),
        DType::String => encode_strings(name, shape, tensor),
    }
}

fn encode_fixed<T>(name: &str, shape: Vec<usize>, tensor: &Tensor) -> Result<DynValue>
where
    T: Element + ort::tensor::PrimitiveTensorElementType + std::fmt::Debug,
{
    let data = tensor.to_vec::<T>()?;
    let value = ort::value::Tensor::from_array((shape, data))
        .map_err(|e| native_error(name, tensor.dtype(), e))?;
    Ok(value.into_dyn())
}

fn encode_strings(name: &str, shape: Vec<usize>, tensor: &Tensor) -> Result<DynValue> {
    let strings = tensor.as_strings().ok_or_else(|| {
        SessionError::type_mismatch(name, "string elements", "byte payload")
    })?;
    if let Some(idx) = strings.iter().position(|s| s.contains('\0')) {
        return Err(SessionError::InvalidArgument(format!(
            "string element {idx} of `{name}` contains a NUL byte"
        )));
    }
    let value = ort::value::Tensor::<String>::from_string_array((shape, strings))
        .map_err(|e| native_error(name, DType::String, e))?;
    Ok(value.into_dyn())
}

fn native_error(name: &str, dtype: DType, err: impl std::fmt::Display) -> SessionError {
    SessionError::engine(format!(
        "failed to create {} tensor `{name}` ({}): {err}",
        dtype,
        to_native(dtype)
    ))
}

/// Copies a native value into a newly allocated host tensor, keeping the
/// shape exactly as the engine reports it.
pub fn decode(name: &str, value: &ValueRef<'_>) -> Result<Tensor> {
    let ValueType::Tensor { ty, shape, .. } = value.dtype() else {
        return Err(SessionError::unsupported(
            name,
            format!("non-tensor value {:?}", value.dtype()),
        ));
    };

    let dims = shape
        .iter()
        .map(|d| {
            usize::try_from(*d).map_err(|_| {
                SessionError::shape_mismatch(name, "non-negative dimensions", format!("{d}"))
            })
        })
        .collect::<Result<Vec<usize>>>()?;
    let shape = Shape::from(dims);

    match from_native(name, *ty)? {
        DType::Bool => decode_fixed::<bool>(name, shape, value),
        DType::U8 => decode_fixed::<u8>(name, shape, value),
        DType::U16 => decode_fixed::<u16>(name, shape, value),
        DType::U32 => decode_fixed::<u32>(name, shape, value),
        DType::U64 => decode_fixed::<u64>(name, shape, value),
        DType::I8 => decode_fixed::<i8>(name, shape, value),
        DType::I16 => decode_fixed::<i16>(name, shape, value),
        DType::I32 => decode_fixed::<i32>(name, shape, value),
        DType::I64 => decode_fixed::<i64>(name, shape, value),
        DType::F32 => decode_fixed::<f32>(name, shape, value),
        DType::F64 => decode_fixed::<f64>(name, shape, value),
        DType::String => decode_strings(name, shape, value),
    }
}

fn decode_fixed<T>(name: &str, shape: Shape, value: &ValueRef<'_>) -> Result<Tensor>
where
    T: Element + ort::tensor::PrimitiveTensorElementType + std::fmt::Debug,
{
    let array = value
        .try_extract_array::<T>()
        .map_err(|e| SessionError::engine(format!("failed to read output `{name}`: {e}")))?;
    let slice = array.as_slice().ok_or_else(|| {
        SessionError::engine(format!("output `{name}` is not contiguous"))
    })?;
    Tensor::from_slice(shape, slice).map_err(|err| rename(err, name))
}

fn decode_strings(name: &str, shape: Shape, value: &ValueRef<'_>) -> Result<Tensor> {
    let array = value
        .try_extract_string_array()
        .map_err(|e| SessionError::engine(format!("failed to read output `{name}`: {e}")))?;
    Tensor::from_strings(shape, array.iter().cloned()).map_err(|err| rename(err, name))
}

fn rename(err: SessionError, name: &str) -> SessionError {
    match err {
        SessionError::ShapeMismatch {
            expected, actual, ..
        } => SessionError::ShapeMismatch {
            name: name.to_string(),
            expected,
            actual,
        },
        other => other,
    }
}
