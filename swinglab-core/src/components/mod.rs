//! Pluggable strategy components: scanners, exit policies, position sizers.
//!
//! The engine consumes these through trait objects and nothing else. Concrete
//! implementations live in the submodules; the registry maps component names
//! to factories so runs can be configured by name.

pub mod exit;
pub mod registry;
pub mod scanner;
pub mod sizer;

pub use exit::ExitPolicy;
pub use registry::{ComponentSpec, RegistryError, ScannerContext, StrategyRegistry};
pub use scanner::Scanner;
pub use sizer::{AccountState, PositionSizer};

use thiserror::Error;

/// Failure raised by a component implementation.
///
/// The engine catches these at its boundary: a fault is recorded in run
/// diagnostics and the symbol/day is treated as "no signal" — it never aborts
/// the run on its own (a fault *budget* may, see the engine config).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PolicyError {
    pub message: String,
}

impl PolicyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<crate::data::DataError> for PolicyError {
    fn from(err: crate::data::DataError) -> Self {
        Self::new(err.to_string())
    }
}
