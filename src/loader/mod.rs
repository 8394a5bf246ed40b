//! Lazy module loading.
//!
//! # Data Flow
//! ```text
//! navigation needs node i
//!     → LazyModule::get()
//!         slot filled?  → cached Arc<M>
//!         slot empty    → run loader → commit on success
//!                                    → propagate failure, slot stays empty
//! ```
//!
//! # Design Decisions
//! - One explicit object per module: a loader plus one cache slot
//! - Only successful loads are committed; failures are retried on next access
//! - No eviction: a loaded module lives as long as its manifest
//! - Overlapping first loads coalesce or race according to `LoadPolicy`

pub mod file;
pub mod lazy;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::ModuleSource;
pub use lazy::{LazyModule, LoadFuture};

/// How overlapping first calls to the same module are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Overlapping callers await one shared load.
    #[default]
    Coalesce,
    /// Every caller loads independently; the first success is committed and
    /// returned to all of them.
    Race,
}

/// Errors raised while loading a module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The module file could not be read.
    #[error("failed to read module {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// A route referenced a node the manifest does not have.
    #[error("node {0} does not exist")]
    MissingNode(usize),

    /// The loader reported a failure of its own.
    #[error("module {module} failed to load: {message}")]
    Failed { module: String, message: String },
}

impl LoadError {
    /// Convenience constructor for custom loaders.
    pub fn failed(module: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError::Failed {
            module: module.into(),
            message: message.into(),
        }
    }
}
