pub mod types;

pub use types::{FaultKind, ProbeError, Result};
