use crate::{ModelSignature, ModelSource, Result, SessionOptions, Tensor};

pub trait Backend: Send + Sync + 'static {
    type Model: BackendModel;

    fn name(&self) -> &'static str;
    fn load(&self, source: &ModelSource, options: &SessionOptions) -> Result<Self::Model>;
}

pub trait BackendModel: Send + 'static {
    /// Declared inputs, outputs and metadata, captured once at load.
    fn signature(&self) -> &ModelSignature;

    /// Converts every input before executing; a conversion failure must
    /// return before the engine runs.
    fn run(&mut self, inputs: &[(&str, &Tensor)]) -> Result<Vec<(String, Tensor)>>;
}
