//! A small ONNX model builder for producing test and fixture graphs without
//! an exporter toolchain.

pub mod dtype;
mod error;
mod model;
pub mod protos;

pub use error::{Error, Result};
pub use model::{Graph, Model, Node, ValueInfo, DEFAULT_OPSET, IR_VERSION};
