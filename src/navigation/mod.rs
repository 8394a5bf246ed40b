//! Navigation: from a target URL to a composed page.
//!
//! # Data Flow
//! ```text
//! navigation target
//!     → target.rs (reduce to pathname, percent-decode, strip base)
//!     → Manifest::matchers() (lazy)
//!     → RouteTable::find (first match + params)
//!     → target.rs (fully decode param values)
//!     → compose.rs (layouts outer → inner, then leaf; error boundary on failure)
//!     → ResolvedPage, or NotFound / load failure
//! ```
//!
//! # Design Decisions
//! - The live manifest sits behind an `ArcSwap`; a navigation keeps the
//!   manifest it started with even if a rebuilt one is swapped in
//! - No cancellation: dropping the future abandons interest in the result

pub mod compose;
pub mod target;

use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;

use crate::loader::LoadError;
use crate::manifest::Manifest;
use crate::observability::metrics;
use crate::routing::{Params, RouteError};

pub use compose::{compose, Composition, PageContent};
pub use target::{decode_param, decode_pathname, route_path};

/// Errors produced while resolving a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ResolveError {
    /// Whether the target simply matched no route.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::Route(RouteError::NotFound { .. }))
    }
}

/// A fully composed page for one navigation.
#[derive(Debug)]
pub struct ResolvedPage<M> {
    /// Id of the matched route.
    pub route_id: String,
    /// Path the route table was matched against.
    pub path: String,
    pub params: Params,
    pub layouts: Vec<Arc<M>>,
    pub content: PageContent<M>,
    /// Server-side endpoint of the route, if any.
    pub endpoint: Option<String>,
}

/// Resolve `target` against `manifest`.
pub async fn resolve<M>(
    manifest: &Manifest<M>,
    target: &str,
) -> Result<ResolvedPage<M>, ResolveError>
where
    M: Send + Sync + 'static,
{
    let Some(path) = route_path(target, manifest.base()) else {
        tracing::debug!(target = %target, base = %manifest.base(), "Target outside base path");
        metrics::record_route_miss();
        return Err(RouteError::NotFound {
            path: target.to_string(),
        }
        .into());
    };

    let matchers = manifest.matchers().await?;
    let matched = manifest.routes().find(&path, &matchers)?;
    let route = matched.route;

    let Composition { layouts, content } = compose(manifest.nodes(), &route.page).await?;

    Ok(ResolvedPage {
        route_id: route.id.clone(),
        path,
        params: matched
            .params
            .into_iter()
            .map(|(name, value)| (name, decode_param(&value)))
            .collect(),
        layouts,
        content,
        endpoint: route.endpoint.clone(),
    })
}

/// Drives navigations against the current manifest.
pub struct Navigator<M> {
    manifest: ArcSwap<Manifest<M>>,
}

impl<M: Send + Sync + 'static> Navigator<M> {
    pub fn new(manifest: Manifest<M>) -> Self {
        Self {
            manifest: ArcSwap::from_pointee(manifest),
        }
    }

    /// Snapshot of the current manifest.
    pub fn manifest(&self) -> Arc<Manifest<M>> {
        self.manifest.load_full()
    }

    /// Swap in a rebuilt manifest. In-flight navigations finish against the
    /// manifest they started with.
    pub fn replace(&self, manifest: Manifest<M>) {
        tracing::info!(
            routes = manifest.routes().len(),
            nodes = manifest.nodes().len(),
            "Manifest replaced"
        );
        metrics::record_manifest_reload(true);
        self.manifest.store(Arc::new(manifest));
    }

    /// Resolve a navigation target to a composed page.
    pub async fn navigate(&self, target: &str) -> Result<ResolvedPage<M>, ResolveError> {
        let manifest = self.manifest.load_full();
        let result = resolve(&manifest, target).await;
        match &result {
            Ok(page) => {
                tracing::info!(target = %target, route = %page.route_id, "Navigation resolved")
            }
            Err(e) if e.is_not_found() => tracing::info!(target = %target, "Navigation not found"),
            Err(e) => tracing::warn!(target = %target, error = %e, "Navigation failed"),
        }
        result
    }
}
