pub mod dtype;
pub mod marshal;

use std::collections::HashMap;

use onnxrt_core::{
    Backend, BackendModel, Dim, IOName, ModelDescriptor, ModelSignature, ModelSource,
    OptimizationLevel, Result, Session, SessionError, SessionOptions, Tensor, TensorSpec,
    TypeInfo,
};
use ort::{
    session::{
        builder::{GraphOptimizationLevel, SessionBuilder},
        Session as OrtNativeSession, SessionInputValue,
    },
    value::ValueType,
};
use tracing::debug;

use crate::dtype::from_native;
use crate::marshal::{decode, encode};

/// A session backed by ONNX Runtime.
pub type OrtSession = Session<OrtModel>;

/// Loads a session with default options.
pub fn load_session(source: impl Into<ModelSource>) -> Result<OrtSession> {
    Session::new(&OrtBackend::new(), source.into(), &SessionOptions::default())
}

pub struct OrtBackend;

impl OrtBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrtBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OrtModel {
    signature: ModelSignature,
    session: OrtNativeSession,
}

impl Backend for OrtBackend {
    type Model = OrtModel;

    fn name(&self) -> &'static str {
        "onnxruntime"
    }

    fn load(&self, source: &ModelSource, options: &SessionOptions) -> Result<Self::Model> {
        let origin = source.describe();

        let builder = OrtNativeSession::builder()
            .map_err(|e| SessionError::model_load(&origin, e))?;
        let builder = configure_session_builder(builder, options, &origin)?;

        let session = match source {
            ModelSource::Path(path) => builder.commit_from_file(path),
            ModelSource::Bytes(bytes) => builder.commit_from_memory(bytes),
        }
        .map_err(|e| SessionError::model_load(&origin, e))?;

        let signature = build_signature(&session)?;
        debug!(model = %origin, signature = ?signature, "onnxruntime session committed");

        Ok(OrtModel { signature, session })
    }
}

impl BackendModel for OrtModel {
    fn signature(&self) -> &ModelSignature {
        &self.signature
    }

    fn run(&mut self, inputs: &[(&str, &Tensor)]) -> Result<Vec<(String, Tensor)>> {
        let mut ort_inputs = Vec::with_capacity(inputs.len());
        for (name, input) in inputs {
            let value = encode(name, input)?;
            ort_inputs.push((name.to_string(), SessionInputValue::from(value)));
        }

        let outputs = self.session.run(ort_inputs).map_err(SessionError::engine)?;

        let mut out_tensors = Vec::with_capacity(outputs.len());
        for (name, value) in outputs.iter() {
            out_tensors.push((name.to_string(), decode(name, &value)?));
        }

        Ok(out_tensors)
    }
}

fn configure_session_builder(
    builder: SessionBuilder,
    options: &SessionOptions,
    origin: &str,
) -> Result<SessionBuilder> {
    let level = match options.optimization_level {
        OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
        OptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        OptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        OptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
    };
    let mut builder = builder
        .with_optimization_level(level)
        .map_err(|e| SessionError::model_load(origin, e))?;

    if let Some(threads) = options.intra_threads {
        builder = builder
            .with_intra_threads(threads)
            .map_err(|e| SessionError::model_load(origin, e))?;
    }
    if let Some(threads) = options.inter_threads {
        builder = builder
            .with_inter_threads(threads)
            .map_err(|e| SessionError::model_load(origin, e))?;
    }
    Ok(builder)
}

fn build_signature(session: &OrtNativeSession) -> Result<ModelSignature> {
    let inputs = session
        .inputs
        .iter()
        .map(|input| tensor_spec_from_value_type(&input.name, &input.input_type))
        .collect::<Result<Vec<_>>>()?;

    let outputs = session
        .outputs
        .iter()
        .map(|output| tensor_spec_from_value_type(&output.name, &output.output_type))
        .collect::<Result<Vec<_>>>()?;

    let (metadata, descriptor) = read_metadata(session)?;

    Ok(ModelSignature {
        inputs,
        outputs,
        metadata,
        descriptor,
    })
}

fn tensor_spec_from_value_type(name: &str, value_type: &ValueType) -> Result<TensorSpec> {
    let ValueType::Tensor {
        ty,
        shape,
        dimension_symbols,
    } = value_type
    else {
        return Err(SessionError::unsupported(
            name,
            format!("non-tensor value {value_type:?}"),
        ));
    };

    let dtype = from_native(name, *ty)?;
    let dims = shape
        .iter()
        .enumerate()
        .map(|(idx, d)| match usize::try_from(*d) {
            Ok(len) => Dim::Fixed(len),
            Err(_) => match dimension_symbols.get(idx) {
                Some(symbol) if !symbol.is_empty() => Dim::Symbolic(symbol.to_string()),
                _ => Dim::Unknown,
            },
        })
        .collect();

    Ok(TensorSpec {
        name: IOName(name.to_string()),
        info: TypeInfo { dtype, dims },
    })
}

fn read_metadata(
    session: &OrtNativeSession,
) -> Result<(HashMap<String, String>, ModelDescriptor)> {
    let metadata_error = |e: ort::Error| SessionError::model_load("model metadata", e);

    let meta = session.metadata().map_err(metadata_error)?;

    let mut custom = HashMap::new();
    for key in meta.custom_keys().map_err(metadata_error)? {
        if let Some(value) = meta.custom(&key).map_err(metadata_error)? {
            custom.insert(key, value);
        }
    }

    let descriptor = ModelDescriptor {
        producer: meta.producer().map_err(metadata_error)?,
        graph_name: meta.name().map_err(metadata_error)?,
        domain: meta.domain().map_err(metadata_error)?,
        description: meta.description().map_err(metadata_error)?,
        version: meta.version().map_err(metadata_error)?,
    };

    Ok((custom, descriptor))
}
