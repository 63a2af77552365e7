pub mod diagnostics;
pub mod error;
pub mod tolerance;
pub mod traits;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{BrepError, Result};
pub use tolerance::{MeshTolerance, ResolvedTolerance};
