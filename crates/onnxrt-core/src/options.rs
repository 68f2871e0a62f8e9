/// Graph optimization applied by the engine while loading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptimizationLevel {
    Disable,
    Level1,
    Level2,
    #[default]
    Level3,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub optimization_level: OptimizationLevel,
    /// Threads used inside a single operator; engine default when `None`.
    pub intra_threads: Option<usize>,
    pub inter_threads: Option<usize>,
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_optimization_level(mut self, level: OptimizationLevel) -> Self {
        self.optimization_level = level;
        self
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }
}
