//! Manifest description subsystem.
//!
//! # Data Flow
//! ```text
//! manifest file (TOML/JSON, written by the build step)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ManifestConfig (validated)
//!     → Manifest::from_config (compiled routes + node loaders)
//!
//! On rebuild:
//!     watcher.rs detects change
//!     → loader.rs loads new description
//!     → validation.rs validates
//!     → Navigator swaps in the new Manifest
//! ```
//!
//! # Design Decisions
//! - A description is immutable once loaded; changes require a full reload
//! - All fields have defaults to allow minimal descriptions
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ManifestError, ManifestFormat};
pub use schema::{
    ClientConfig, ManifestConfig, NodeConfig, NodeSlot, PageComposition, RouteConfig, RouteParam,
};
pub use validation::{validate_config, validate_config_with, MatcherSource, ValidationError};
