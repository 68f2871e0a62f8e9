use std::fmt;

use bytes::Bytes;
use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};
use smallvec::SmallVec;

use crate::{DType, Element, Result, SessionError};

/// Concrete, row-major tensor shape. An empty shape is a scalar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn scalar() -> Self {
        Self(SmallVec::new())
    }
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }
    pub fn rank(&self) -> usize {
        self.0.len()
    }
    /// Number of elements; 1 for a scalar, 0 if any dimension is 0. `None`
    /// when the product does not fit in `usize`.
    pub fn numel(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d))
    }
    pub fn dims(&self) -> &[usize] {
        &self.0
    }
    pub fn to_vec(&self) -> Vec<usize> {
        self.0.to_vec()
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(SmallVec::from_vec(dims))
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::from_slice(dims)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self::from_slice(&dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0.as_slice())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TensorDesc {
    pub dtype: DType,
    pub shape: Shape,
}

/// Owns the element payload of a tensor.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorData {
    /// Contiguous native-endian elements of a fixed-width dtype.
    Bytes(Bytes),
    /// One owned value per element, row-major.
    Strings(Vec<String>),
}

impl TensorData {
    pub fn byte_len(&self) -> usize {
        match self {
            TensorData::Bytes(bytes) => bytes.len(),
            TensorData::Strings(strings) => strings.iter().map(String::len).sum(),
        }
    }
}

/// A typed, shaped host buffer exchanged at the session boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub desc: TensorDesc,
    pub data: TensorData,
    pub byte_len: usize,
}

impl Tensor {
    /// Wraps raw element bytes without checking them against the shape;
    /// marshalling reports any inconsistency.
    pub fn from_cpu_bytes(dtype: DType, shape: Shape, bytes: Bytes) -> Self {
        let byte_len = bytes.len();
        Self {
            desc: TensorDesc { dtype, shape },
            data: TensorData::Bytes(bytes),
            byte_len,
        }
    }

    pub fn from_slice<T: Element>(shape: impl Into<Shape>, data: &[T]) -> Result<Self> {
        let shape = shape.into();
        check_count("tensor", &shape, data.len())?;
        Ok(Self::from_cpu_bytes(T::DTYPE, shape, bytes_from_slice(data)))
    }

    pub fn scalar<T: Element>(value: T) -> Self {
        Self::from_cpu_bytes(T::DTYPE, Shape::scalar(), bytes_from_slice(&[value]))
    }

    pub fn from_strings<I, S>(shape: impl Into<Shape>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let shape = shape.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        check_count("tensor", &shape, values.len())?;
        let data = TensorData::Strings(values);
        let byte_len = data.byte_len();
        Ok(Self {
            desc: TensorDesc {
                dtype: DType::String,
                shape,
            },
            data,
            byte_len,
        })
    }

    /// Copies an ndarray of any layout into a row-major tensor.
    pub fn from_array<T, S, D>(array: &ArrayBase<S, D>) -> Self
    where
        T: Element,
        S: Data<Elem = T>,
        D: Dimension,
    {
        let shape = Shape::from_slice(array.shape());
        let values: Vec<T> = array.iter().copied().collect();
        Self::from_cpu_bytes(T::DTYPE, shape, bytes_from_slice(&values))
    }

    pub fn from_string_array<S, D>(array: &ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = String>,
        D: Dimension,
    {
        let data = TensorData::Strings(array.iter().cloned().collect());
        let byte_len = data.byte_len();
        Self {
            desc: TensorDesc {
                dtype: DType::String,
                shape: Shape::from_slice(array.shape()),
            },
            data,
            byte_len,
        }
    }

    pub fn dtype(&self) -> DType {
        self.desc.dtype
    }

    pub fn shape(&self) -> &Shape {
        &self.desc.shape
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.data {
            TensorData::Bytes(bytes) => Some(bytes),
            TensorData::Strings(_) => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match &self.data {
            TensorData::Strings(strings) => Some(strings),
            TensorData::Bytes(_) => None,
        }
    }

    /// Checks payload kind, element count and bool encoding against the
    /// descriptor, returning the element count. `name` labels the errors.
    pub fn validate(&self, name: &str) -> Result<usize> {
        let actual = match &self.data {
            TensorData::Bytes(_) => {
                let width = self.fixed_width(name)?;
                self.payload(name)?.len() / width
            }
            TensorData::Strings(strings) => {
                if self.desc.dtype != DType::String {
                    return Err(SessionError::type_mismatch(
                        name,
                        format!("{} byte payload", self.desc.dtype),
                        "string elements",
                    ));
                }
                strings.len()
            }
        };
        check_count(name, &self.desc.shape, actual)?;
        Ok(actual)
    }

    /// Copies the payload out as typed elements. The shape is not consulted.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if self.desc.dtype != T::DTYPE {
            return Err(SessionError::type_mismatch(
                "tensor",
                T::DTYPE,
                self.desc.dtype,
            ));
        }
        let bytes = self.payload("tensor")?;
        Ok(vec_from_bytes(bytes))
    }

    pub fn to_array<T: Element>(&self) -> Result<ArrayD<T>> {
        let values = self.to_vec::<T>()?;
        let count = values.len();
        check_count("tensor", &self.desc.shape, count)?;
        ArrayD::from_shape_vec(IxDyn(self.desc.shape.dims()), values)
            .map_err(|e| SessionError::shape_mismatch("tensor", self.desc.shape.to_string(), e))
    }

    pub fn to_string_array(&self) -> Result<ArrayD<String>> {
        let strings = self.as_strings().ok_or_else(|| {
            SessionError::type_mismatch("tensor", DType::String, self.desc.dtype)
        })?;
        check_count("tensor", &self.desc.shape, strings.len())?;
        ArrayD::from_shape_vec(IxDyn(self.desc.shape.dims()), strings.to_vec())
            .map_err(|e| SessionError::shape_mismatch("tensor", self.desc.shape.to_string(), e))
    }

    fn fixed_width(&self, name: &str) -> Result<usize> {
        self.desc.dtype.byte_width().ok_or_else(|| {
            SessionError::type_mismatch(name, "string elements", "byte payload")
        })
    }

    /// The byte payload, checked to hold whole, valid elements of the dtype.
    fn payload(&self, name: &str) -> Result<&Bytes> {
        let width = self.fixed_width(name)?;
        let bytes = match &self.data {
            TensorData::Bytes(bytes) => bytes,
            TensorData::Strings(_) => {
                return Err(SessionError::type_mismatch(
                    name,
                    format!("{} byte payload", self.desc.dtype),
                    "string elements",
                ))
            }
        };
        if bytes.len() % width != 0 {
            return Err(SessionError::shape_mismatch(
                name,
                format!("a multiple of {width} bytes for {}", self.desc.dtype),
                format!("{} bytes", bytes.len()),
            ));
        }
        if self.desc.dtype == DType::Bool {
            if let Some(bad) = bytes.iter().find(|b| **b > 1) {
                return Err(SessionError::type_mismatch(
                    name,
                    "bool bytes of 0 or 1",
                    format!("byte value {bad}"),
                ));
            }
        }
        Ok(bytes)
    }
}

fn check_count(name: &str, shape: &Shape, actual: usize) -> Result<()> {
    let Some(expected) = shape.numel() else {
        return Err(SessionError::shape_mismatch(
            name,
            format!("an element count for shape {shape} that fits in usize"),
            format!("{actual} elements"),
        ));
    };
    if expected != actual {
        return Err(SessionError::shape_mismatch(
            name,
            format!("{expected} elements for shape {shape}"),
            format!("{actual} elements"),
        ));
    }
    Ok(())
}

/// Single bulk copy of a typed slice into owned bytes.
pub fn bytes_from_slice<T: Element>(slice: &[T]) -> Bytes {
    let byte_len = std::mem::size_of_val(slice);
    let ptr = slice.as_ptr().cast::<u8>();
    // SAFETY: `Element` types are plain data with no padding, so the slice is
    // `byte_len` initialized bytes.
    let bytes = unsafe { std::slice::from_raw_parts(ptr, byte_len) };
    Bytes::copy_from_slice(bytes)
}

/// Single bulk copy of whole elements out of `bytes`; trailing partial
/// elements are ignored. Bool payloads must already be checked.
fn vec_from_bytes<T: Element>(bytes: &[u8]) -> Vec<T> {
    let width = std::mem::size_of::<T>();
    let count = bytes.len() / width;
    let mut out = vec![T::default(); count];
    // SAFETY: `out` owns exactly `count * width` bytes, the source holds at
    // least as many, and the two never overlap.
    unsafe {
        std::ptr::copy_nonoverlapping(
            bytes.as_ptr(),
            out.as_mut_ptr().cast::<u8>(),
            count * width,
        );
    }
    out
}
