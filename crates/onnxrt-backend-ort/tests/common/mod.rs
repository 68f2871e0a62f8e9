#![allow(dead_code)]

use onnxrt_backend_ort::{OrtBackend, OrtSession};
use onnxrt_core::{DType, Dim, Session, SessionOptions};
use onnxrt_proto::{Graph, Model, Node, ValueInfo};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `sum = a + b` over `[N, 2]`.
pub fn add_model(dtype: DType) -> Model {
    let dims = || [Dim::Symbolic("N".into()), Dim::Fixed(2)];
    Model::new(
        Graph::new("add")
            .input(ValueInfo::tensor("a", dtype, dims()))
            .input(ValueInfo::tensor("b", dtype, dims()))
            .output(ValueInfo::tensor("sum", dtype, dims()))
            .node(Node::new("Add", ["a", "b"], ["sum"]).named("add0")),
    )
}

/// `b = a + a` over a single `[2]` input.
pub fn double_model(dtype: DType) -> Model {
    Model::new(
        Graph::new("double")
            .input(ValueInfo::tensor("a", dtype, [Dim::Fixed(2)]))
            .output(ValueInfo::tensor("b", dtype, [Dim::Fixed(2)]))
            .node(Node::new("Add", ["a", "a"], ["b"])),
    )
}

/// `y = x` with the given declared dims.
pub fn identity_model(dtype: DType, dims: Vec<Dim>) -> Model {
    Model::new(
        Graph::new("identity")
            .input(ValueInfo::tensor("x", dtype, dims.clone()))
            .output(ValueInfo::tensor("y", dtype, dims))
            .node(Node::new("Identity", ["x"], ["y"])),
    )
}

pub fn session(model: &Model) -> anyhow::Result<OrtSession> {
    init_tracing();
    Ok(Session::from_model(
        &OrtBackend::new(),
        model,
        &SessionOptions::default(),
    )?)
}
