//! Route manifest runtime.
//!
//! Maps URL patterns of a built single-page application to lazily loaded
//! page modules: a memoized loader per module, an ordered route table, and
//! the manifest that ties them to the build's static data.

pub mod config;
pub mod loader;
pub mod manifest;
pub mod navigation;
pub mod observability;
pub mod routing;

pub use config::ManifestConfig;
pub use loader::{LazyModule, LoadError, LoadPolicy};
pub use manifest::Manifest;
pub use navigation::{Navigator, ResolveError, ResolvedPage};
