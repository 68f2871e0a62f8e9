use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, info};

use crate::{
    Backend, BackendModel, ModelDescriptor, ModelSignature, ModelSource, Result, SerializeModel,
    SessionError, SessionOptions, Tensor, TensorSpec, TypeInfo,
};

/// One loaded graph plus its execution context.
///
/// The signature is captured when the session is built and never re-queried.
/// Calls to [`Session::run`] are serialized on the execution context, and
/// dropping the session releases the engine's native handle.
pub struct Session<M: BackendModel> {
    backend: &'static str,
    signature: ModelSignature,
    model: Mutex<M>,
}

impl<M: BackendModel> Session<M> {
    pub fn new<B>(backend: &B, source: ModelSource, options: &SessionOptions) -> Result<Self>
    where
        B: Backend<Model = M>,
    {
        let origin = source.describe();
        let model = backend.load(&source, options)?;
        let signature = model.signature().clone();

        info!(
            backend = backend.name(),
            model = %origin,
            inputs = signature.inputs.len(),
            outputs = signature.outputs.len(),
            "model loaded"
        );

        Ok(Self {
            backend: backend.name(),
            signature,
            model: Mutex::new(model),
        })
    }

    /// Accepts a path and in-memory bytes as independent options; exactly one
    /// must be set. The check runs before the backend is touched.
    pub fn from_parts<B>(
        backend: &B,
        path: Option<PathBuf>,
        model: Option<Bytes>,
        options: &SessionOptions,
    ) -> Result<Self>
    where
        B: Backend<Model = M>,
    {
        let source = ModelSource::from_parts(path, model)?;
        Self::new(backend, source, options)
    }

    pub fn from_model<B, S>(backend: &B, model: &S, options: &SessionOptions) -> Result<Self>
    where
        B: Backend<Model = M>,
        S: SerializeModel + ?Sized,
    {
        let source = ModelSource::from_model(model)?;
        Self::new(backend, source, options)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend
    }

    pub fn signature(&self) -> &ModelSignature {
        &self.signature
    }

    pub fn input_infos(&self) -> &[TensorSpec] {
        &self.signature.inputs
    }

    pub fn output_infos(&self) -> &[TensorSpec] {
        &self.signature.outputs
    }

    pub fn input_info(&self, name: &str) -> Option<&TypeInfo> {
        self.signature.input(name).map(|spec| &spec.info)
    }

    pub fn output_info(&self, name: &str) -> Option<&TypeInfo> {
        self.signature.output(name).map(|spec| &spec.info)
    }

    /// Custom key/value annotations embedded in the model.
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.signature.metadata
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.signature.descriptor
    }

    /// Runs the graph on named inputs and returns every output it produced.
    ///
    /// Input names are passed to the engine as given; missing or undeclared
    /// names surface as the engine's own error. Either all outputs are
    /// returned or none are.
    pub fn run<'a, I, K>(&self, inputs: I) -> Result<HashMap<String, Tensor>>
    where
        I: IntoIterator<Item = (K, &'a Tensor)>,
        K: AsRef<str>,
    {
        let inputs: Vec<(K, &Tensor)> = inputs.into_iter().collect();
        let named: Vec<(&str, &Tensor)> = inputs
            .iter()
            .map(|(name, tensor)| (name.as_ref(), *tensor))
            .collect();

        let mut seen = HashSet::with_capacity(named.len());
        for (name, _) in &named {
            if !seen.insert(*name) {
                return Err(SessionError::InvalidArgument(format!(
                    "input `{name}` supplied more than once"
                )));
            }
        }

        let mut model = self.model.lock().map_err(|_| {
            SessionError::NotReady("execution context poisoned by a panicked run".to_string())
        })?;

        let t0 = Instant::now();
        let outputs = model.run(&named)?;
        debug!(
            backend = self.backend,
            inputs = named.len(),
            outputs = outputs.len(),
            elapsed_us = u64::try_from(t0.elapsed().as_micros()).unwrap_or(u64::MAX),
            "run finished"
        );

        Ok(outputs.into_iter().collect())
    }
}

impl<M: BackendModel> fmt::Debug for Session<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("backend", &self.backend)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
