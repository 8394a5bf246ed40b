//! Page composition.
//!
//! Loads the layout chain and leaf of a matched route. When a module fails,
//! the nearest error boundary above the failing depth takes over: the page is
//! composed of the layouts down to that boundary plus its error module.

use std::sync::Arc;

use crate::config::schema::PageComposition;
use crate::loader::{LazyModule, LoadError};

/// What renders inside the layout chain.
#[derive(Debug)]
pub enum PageContent<M> {
    /// The route's own leaf module.
    Leaf(Arc<M>),
    /// An error boundary standing in for a subtree that failed to load.
    Error { module: Arc<M>, cause: LoadError },
}

/// Loaded modules of one page, outermost layout first.
#[derive(Debug)]
pub struct Composition<M> {
    pub layouts: Vec<Arc<M>>,
    pub content: PageContent<M>,
}

impl<M> Composition<M> {
    pub fn is_error(&self) -> bool {
        matches!(self.content, PageContent::Error { .. })
    }
}

/// Load the modules of `page` from `nodes`.
///
/// Error modules are loaded only when something in their subtree fails.
/// A failure no boundary covers is returned to the caller.
pub async fn compose<M>(
    nodes: &[LazyModule<M>],
    page: &PageComposition,
) -> Result<Composition<M>, LoadError>
where
    M: Send + Sync + 'static,
{
    let branch: Vec<Option<usize>> = page
        .layouts
        .iter()
        .copied()
        .chain(std::iter::once(Some(page.leaf)))
        .collect();

    let mut loaded: Vec<Option<Arc<M>>> = Vec::with_capacity(branch.len());
    for (depth, slot) in branch.iter().enumerate() {
        let Some(index) = *slot else {
            loaded.push(None);
            continue;
        };

        match load(nodes, index).await {
            Ok(module) => loaded.push(Some(module)),
            Err(cause) => return error_boundary(nodes, page, loaded, depth, cause).await,
        }
    }

    // The leaf slot is always populated.
    let leaf = loaded
        .pop()
        .flatten()
        .ok_or(LoadError::MissingNode(page.leaf))?;

    Ok(Composition {
        layouts: loaded.into_iter().flatten().collect(),
        content: PageContent::Leaf(leaf),
    })
}

async fn error_boundary<M>(
    nodes: &[LazyModule<M>],
    page: &PageComposition,
    loaded: Vec<Option<Arc<M>>>,
    failed_depth: usize,
    cause: LoadError,
) -> Result<Composition<M>, LoadError>
where
    M: Send + Sync + 'static,
{
    for depth in (0..failed_depth).rev() {
        let Some(Some(index)) = page.errors.get(depth).copied() else {
            continue;
        };

        match load(nodes, index).await {
            Ok(module) => {
                tracing::warn!(
                    failed_depth,
                    boundary_depth = depth,
                    error_node = index,
                    error = %cause,
                    "Rendering error boundary"
                );
                let layouts = loaded[..=depth].iter().flatten().cloned().collect();
                return Ok(Composition {
                    layouts,
                    content: PageContent::Error { module, cause },
                });
            }
            Err(e) => {
                tracing::warn!(error_node = index, error = %e, "Error boundary failed to load");
            }
        }
    }

    Err(cause)
}

async fn load<M>(nodes: &[LazyModule<M>], index: usize) -> Result<Arc<M>, LoadError>
where
    M: Send + Sync + 'static,
{
    nodes
        .get(index)
        .ok_or(LoadError::MissingNode(index))?
        .get()
        .await
}
