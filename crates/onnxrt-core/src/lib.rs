pub mod artifact;
pub mod backend;
pub mod dtype;
pub mod error;
pub mod options;
pub mod session;
pub mod spec;
pub mod tensor;

pub use artifact::*;
pub use backend::*;
pub use dtype::*;
pub use error::*;
pub use options::*;
pub use session::*;
pub use spec::*;
pub use tensor::*;
