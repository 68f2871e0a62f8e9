mod common;

use std::io::Write;

use anyhow::Result;
use bytes::Bytes;
use common::{add_model, double_model, identity_model, session};
use onnxrt_backend_ort::{load_session, OrtBackend, OrtSession};
use onnxrt_core::{
    DType, Dim, Element, ErrorKind, OptimizationLevel, Session, SessionOptions, Tensor,
};

fn add_pair<T: Element>(session: &OrtSession, values: &[T]) -> Result<Vec<T>> {
    let a = Tensor::from_slice([1, 2], values)?;
    let b = Tensor::from_slice([1, 2], values)?;
    let outputs = session.run([("a", &a), ("b", &b)])?;
    assert_eq!(outputs.len(), 1);
    let sum = &outputs["sum"];
    assert_eq!(sum.shape().dims(), &[1, 2]);
    Ok(sum.to_vec::<T>()?)
}

#[test]
fn add_doubles_every_numeric_dtype() -> Result<()> {
    assert_eq!(add_pair(&session(&add_model(DType::F32))?, &[1.0f32, 2.0])?, vec![2.0, 4.0]);
    assert_eq!(add_pair(&session(&add_model(DType::F64))?, &[1.0f64, 2.0])?, vec![2.0, 4.0]);
    assert_eq!(add_pair(&session(&add_model(DType::I32))?, &[1i32, 2])?, vec![2, 4]);
    assert_eq!(add_pair(&session(&add_model(DType::I64))?, &[1i64, 2])?, vec![2, 4]);
    Ok(())
}

#[test]
fn adding_an_input_to_itself_yields_one_output() -> Result<()> {
    fn double<T: Element>(dtype: DType, values: [T; 2]) -> Result<Vec<T>> {
        let session = session(&double_model(dtype))?;
        let a = Tensor::from_slice([2], &values)?;
        let outputs = session.run([("a", &a)])?;
        assert_eq!(outputs.len(), 1);
        let b = &outputs["b"];
        assert_eq!(b.dtype(), dtype);
        assert_eq!(b.shape().dims(), &[2]);
        Ok(b.to_vec::<T>()?)
    }

    assert_eq!(double(DType::F32, [1.0f32, 2.0])?, vec![2.0, 4.0]);
    assert_eq!(double(DType::F64, [1.0f64, 2.0])?, vec![2.0, 4.0]);
    assert_eq!(double(DType::I32, [1i32, 2])?, vec![2, 4]);
    assert_eq!(double(DType::I64, [1i64, 2])?, vec![2, 4]);
    Ok(())
}

#[test]
fn type_info_reports_fixed_and_symbolic_dims() -> Result<()> {
    let session = session(&add_model(DType::F32))?;

    let names: Vec<_> = session.input_infos().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);

    let info = session.input_info("a").expect("input a");
    assert_eq!(info.dtype, DType::F32);
    assert_eq!(info.dims, vec![Dim::Symbolic("N".into()), Dim::Fixed(2)]);
    assert_eq!(session.output_info("sum").expect("output").to_string(), "f32[N, 2]");
    assert!(session.input_info("sum").is_none());
    Ok(())
}

#[test]
fn unnamed_dynamic_dims_are_unknown() -> Result<()> {
    let session = session(&identity_model(DType::U8, vec![Dim::Unknown, Dim::Fixed(4)]))?;
    let info = session.input_info("x").expect("input x");
    assert_eq!(info.dims, vec![Dim::Unknown, Dim::Fixed(4)]);
    Ok(())
}

#[test]
fn metadata_round_trips_through_the_runtime() -> Result<()> {
    let model = add_model(DType::F32)
        .with_producer("onnxrt-tests", "0.1")
        .with_domain("test.onnxrt")
        .with_model_version(7)
        .with_doc_string("adds things")
        .with_metadata("author", "ci")
        .with_metadata("stage", "test");
    let session = session(&model)?;

    assert_eq!(session.metadata().len(), 2);
    assert_eq!(session.metadata()["author"], "ci");
    assert_eq!(session.metadata()["stage"], "test");

    let desc = session.descriptor();
    assert_eq!(desc.producer, "onnxrt-tests");
    assert_eq!(desc.graph_name, "add");
    assert_eq!(desc.domain, "test.onnxrt");
    assert_eq!(desc.description, "adds things");
    assert_eq!(desc.version, 7);
    Ok(())
}

#[test]
fn models_without_metadata_have_an_empty_map() -> Result<()> {
    let session = session(&add_model(DType::F32))?;
    assert!(session.metadata().is_empty());
    Ok(())
}

#[test]
fn path_and_bytes_sources_behave_the_same() -> Result<()> {
    let model = add_model(DType::F32).with_metadata("k", "v");
    let bytes = model.to_bytes()?;

    let mut file = tempfile::Builder::new().suffix(".onnx").tempfile()?;
    file.write_all(&bytes)?;
    file.flush()?;

    let from_path = load_session(file.path())?;
    let from_bytes = load_session(bytes.clone())?;

    assert_eq!(from_path.signature(), from_bytes.signature());
    assert_eq!(
        add_pair(&from_path, &[0.5f32, -1.0])?,
        add_pair(&from_bytes, &[0.5f32, -1.0])?
    );
    Ok(())
}

#[test]
fn both_or_neither_source_is_invalid() {
    let backend = OrtBackend::new();
    let opts = SessionOptions::default();

    let both = OrtSession::from_parts(
        &backend,
        Some("model.onnx".into()),
        Some(Bytes::from_static(b"x")),
        &opts,
    )
    .unwrap_err();
    assert_eq!(both.kind(), ErrorKind::InvalidArgument);

    let neither = OrtSession::from_parts(&backend, None, None, &opts).unwrap_err();
    assert_eq!(neither.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn unreadable_models_fail_to_load() {
    let err = load_session(Bytes::from_static(b"not a model")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelLoad);

    let err = load_session(std::path::Path::new("/nonexistent/model.onnx")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ModelLoad);
}

#[test]
fn session_options_are_applied() -> Result<()> {
    let opts = SessionOptions::new()
        .with_optimization_level(OptimizationLevel::Disable)
        .with_intra_threads(1)
        .with_inter_threads(1);
    let session = Session::from_model(&OrtBackend::new(), &add_model(DType::I64), &opts)?;
    assert_eq!(add_pair(&session, &[3i64, -4])?, vec![6, -8]);
    Ok(())
}

#[test]
fn missing_inputs_surface_engine_errors() -> Result<()> {
    let session = session(&add_model(DType::F32))?;
    let a = Tensor::from_slice([1, 2], &[1.0f32, 2.0])?;

    let err = session.run([("a", &a)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Engine);

    let err = session.run([("a", &a), ("bogus", &a)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Engine);
    Ok(())
}

#[test]
fn malformed_inputs_fail_before_the_engine_runs() -> Result<()> {
    let session = session(&add_model(DType::F32))?;
    let good = Tensor::from_slice([1, 2], &[1.0f32, 2.0])?;
    let short = Tensor::from_cpu_bytes(DType::F32, [1, 2].into(), Bytes::from(vec![0u8; 4]));

    let err = session.run([("a", &good), ("b", &short)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
    assert!(err.to_string().contains("`b`"));

    let mislabeled =
        Tensor::from_cpu_bytes(DType::String, [1, 2].into(), Bytes::from(vec![0u8; 8]));
    let err = session.run([("a", &good), ("b", &mislabeled)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    // The failed runs leave the session usable.
    assert_eq!(add_pair(&session, &[1.0f32, 2.0])?, vec![2.0, 4.0]);
    Ok(())
}

#[test]
fn concurrent_runs_are_serialized() -> Result<()> {
    let session = session(&add_model(DType::I32))?;
    std::thread::scope(|scope| {
        for worker in 0..4i32 {
            let session = &session;
            scope.spawn(move || {
                for i in 0..16 {
                    let got = add_pair(session, &[worker, i]).expect("run");
                    assert_eq!(got, vec![worker * 2, i * 2]);
                }
            });
        }
    });
    Ok(())
}
