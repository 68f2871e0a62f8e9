use onnxrt_core::{DType, Dim, ModelSource, SerializeModel};
use onnxrt_proto::{Error, Graph, Model, Node, ValueInfo, DEFAULT_OPSET};

fn add_model() -> Model {
    Model::new(
        Graph::new("add")
            .input(ValueInfo::tensor(
                "a",
                DType::F32,
                [Dim::Symbolic("N".into()), Dim::Fixed(2)],
            ))
            .input(ValueInfo::tensor("b", DType::F32, [Dim::Unknown, Dim::Fixed(2)]))
            .output(ValueInfo::tensor("sum", DType::F32, [Dim::Unknown, Dim::Fixed(2)]))
            .node(Node::new("Add", ["a", "b"], ["sum"]).named("add0")),
    )
    .with_producer("onnxrt-tests", "0.1")
    .with_domain("test.onnxrt")
    .with_model_version(3)
    .with_doc_string("adds two tensors")
    .with_metadata("author", "ci")
    .with_metadata("license", "")
}

#[test]
fn decoded_model_matches_the_builder() -> anyhow::Result<()> {
    let model = add_model();
    let bytes = model.to_bytes()?;
    let decoded = Model::from_bytes(&bytes)?;

    assert_eq!(decoded, model);
    assert_eq!(decoded.opsets, vec![(String::new(), DEFAULT_OPSET)]);
    assert_eq!(
        decoded.graph.inputs[0].dims,
        vec![Dim::Symbolic("N".into()), Dim::Fixed(2)]
    );
    Ok(())
}

#[test]
fn serialize_model_matches_to_bytes() -> anyhow::Result<()> {
    let model = add_model();
    assert_eq!(model.to_model_bytes()?, model.to_bytes()?);

    let ModelSource::Bytes(bytes) = ModelSource::from_model(&model)? else {
        panic!("expected an in-memory source");
    };
    assert_eq!(bytes, model.to_bytes()?);
    Ok(())
}

#[test]
fn every_host_dtype_survives_the_wire() -> anyhow::Result<()> {
    let mut graph = Graph::new("all");
    for (idx, dtype) in DType::ALL.into_iter().enumerate() {
        graph = graph.output(ValueInfo::tensor(format!("v{idx}"), dtype, []));
    }
    let decoded = Model::from_bytes(&Model::new(graph.clone()).to_bytes()?)?;
    assert_eq!(decoded.graph.outputs, graph.outputs);
    Ok(())
}

#[test]
fn duplicate_value_names_fail_validation() {
    let model = Model::new(
        Graph::new("dup")
            .input(ValueInfo::tensor("x", DType::I64, [Dim::Fixed(1)]))
            .output(ValueInfo::tensor("x", DType::I64, [Dim::Fixed(1)])),
    );
    assert!(matches!(model.to_bytes(), Err(Error::Validation(_))));

    let err = model.to_model_bytes().unwrap_err();
    assert_eq!(err.kind(), onnxrt_core::ErrorKind::InvalidArgument);
}

#[test]
fn garbage_is_a_decode_error() {
    let err = Model::from_bytes(b"\xff\xff\xff").unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}
