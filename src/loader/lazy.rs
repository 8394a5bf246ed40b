//! Memoized lazy loader.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use futures_util::future::BoxFuture;
use tokio::sync::OnceCell;

use crate::loader::{LoadError, LoadPolicy};
use crate::observability::metrics;

/// Future returned by a module loader.
pub type LoadFuture<M> = BoxFuture<'static, Result<M, LoadError>>;

type LoadFn<M> = Box<dyn Fn() -> LoadFuture<M> + Send + Sync>;

/// A module that is loaded on first access and cached afterwards.
///
/// The slot is written at most once, and only with a successful result.
pub struct LazyModule<M> {
    label: String,
    loader: LoadFn<M>,
    policy: LoadPolicy,
    /// Slot used by `LoadPolicy::Coalesce`.
    shared: OnceCell<Arc<M>>,
    /// Slot used by `LoadPolicy::Race`.
    raced: ArcSwapOption<M>,
    /// Number of times the loader has been invoked.
    loads: AtomicUsize,
}

impl<M: Send + Sync + 'static> LazyModule<M> {
    /// Wrap `loader` with the default (coalescing) policy.
    pub fn new<F, Fut>(label: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M, LoadError>> + Send + 'static,
    {
        Self::with_policy(label, LoadPolicy::default(), loader)
    }

    /// Wrap `loader` with an explicit policy.
    pub fn with_policy<F, Fut>(label: impl Into<String>, policy: LoadPolicy, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M, LoadError>> + Send + 'static,
    {
        Self {
            label: label.into(),
            loader: Box::new(move || Box::pin(loader())),
            policy,
            shared: OnceCell::new(),
            raced: ArcSwapOption::empty(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Return the cached module, loading it first if needed.
    pub async fn get(&self) -> Result<Arc<M>, LoadError> {
        match self.policy {
            LoadPolicy::Coalesce => self.shared.get_or_try_init(|| self.invoke()).await.cloned(),
            LoadPolicy::Race => {
                if let Some(module) = self.raced.load_full() {
                    return Ok(module);
                }

                let loaded = self.invoke().await?;
                let previous = self
                    .raced
                    .compare_and_swap(&None::<Arc<M>>, Some(Arc::clone(&loaded)));
                match &*previous {
                    // Another caller committed first; everyone sees its value.
                    Some(winner) => Ok(Arc::clone(winner)),
                    None => Ok(loaded),
                }
            }
        }
    }

    async fn invoke(&self) -> Result<Arc<M>, LoadError> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(module = %self.label, attempt, "Loading module");

        match (self.loader)().await {
            Ok(module) => {
                metrics::record_node_load(&self.label);
                Ok(Arc::new(module))
            }
            Err(e) => {
                metrics::record_node_load_failure(&self.label);
                tracing::warn!(module = %self.label, attempt, error = %e, "Module load failed");
                Err(e)
            }
        }
    }
}

impl<M> LazyModule<M> {
    /// The cached module, without triggering a load.
    pub fn peek(&self) -> Option<Arc<M>> {
        match self.policy {
            LoadPolicy::Coalesce => self.shared.get().cloned(),
            LoadPolicy::Race => self.raced.load_full(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.peek().is_some()
    }

    /// How many times the underlying loader has run.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }
}

impl<M> fmt::Debug for LazyModule<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyModule")
            .field("label", &self.label)
            .field("policy", &self.policy)
            .field("loaded", &self.is_loaded())
            .field("loads", &self.load_count())
            .finish()
    }
}
