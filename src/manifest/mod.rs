//! The route manifest of one built application.
//!
//! # Responsibilities
//! - Own the node list, route table and matcher accessor
//! - Carry the static data the build step emits (assets, MIME types,
//!   client bundle, server assets, prerendered paths, base path)
//! - Refuse construction when a route references a missing node
//!
//! # Design Decisions
//! - Read-only once constructed; a rebuilt manifest replaces it wholesale
//! - Matchers are reached through the same lazy loader as page nodes

pub mod assets;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use crate::config::loader::{load_config, ManifestError};
use crate::config::schema::{ClientConfig, ManifestConfig};
use crate::config::validation::{
    validate_config, validate_config_with, MatcherSource, ValidationError,
};
use crate::loader::file::{file_modules, ModuleSource};
use crate::loader::{LazyModule, LoadError};
use crate::routing::{MatcherRegistry, RouteDescriptor, RouteTable};

/// A validated, immutable route manifest.
#[derive(Debug)]
pub struct Manifest<M> {
    app_dir: String,
    app_path: String,
    base: String,
    assets: BTreeSet<String>,
    mime_types: BTreeMap<String, String>,
    client: ClientConfig,
    nodes: Vec<LazyModule<M>>,
    routes: RouteTable,
    matchers: LazyModule<MatcherRegistry>,
    server_assets: BTreeMap<String, u64>,
    prerendered: BTreeSet<String>,
}

impl<M: Send + Sync + 'static> Manifest<M> {
    /// Build a manifest from its description and the loaders backing its
    /// nodes. Parameter matchers come from the description's `matchers`
    /// table.
    ///
    /// Fails if any route references a node index outside `nodes`, or on any
    /// other validation error.
    pub fn from_config(
        config: ManifestConfig,
        nodes: Vec<LazyModule<M>>,
    ) -> Result<Self, ManifestError> {
        validate_config(&config, nodes.len()).map_err(ManifestError::Validation)?;

        let registry = MatcherRegistry::from_patterns(&config.matchers).map_err(|e| {
            ManifestError::Validation(vec![ValidationError::InvalidMatcher {
                name: e.name,
                message: e.source.to_string(),
            }])
        })?;
        let matchers = LazyModule::new("matchers", move || {
            let registry = registry.clone();
            async move { Ok(registry) }
        });

        Self::assemble(config, nodes, matchers)
    }

    /// Build a manifest whose parameter matchers are supplied in code.
    ///
    /// The description's `matchers` table is ignored. A route naming a
    /// matcher `matchers` does not provide fails at navigation time.
    pub fn from_config_with_matchers(
        config: ManifestConfig,
        nodes: Vec<LazyModule<M>>,
        matchers: LazyModule<MatcherRegistry>,
    ) -> Result<Self, ManifestError> {
        validate_config_with(&config, nodes.len(), MatcherSource::External)
            .map_err(ManifestError::Validation)?;
        Self::assemble(config, nodes, matchers)
    }

    fn assemble(
        config: ManifestConfig,
        nodes: Vec<LazyModule<M>>,
        matchers: LazyModule<MatcherRegistry>,
    ) -> Result<Self, ManifestError> {
        let routes = config
            .routes
            .iter()
            .map(|route| {
                RouteDescriptor::compile(route).map_err(|e| ValidationError::InvalidPattern {
                    route: route.id.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(RouteTable::from_routes)
            .map_err(|e| ManifestError::Validation(vec![e]))?;

        tracing::info!(
            nodes = nodes.len(),
            routes = routes.len(),
            base = %config.base,
            "Manifest constructed"
        );

        Ok(Self {
            app_dir: config.app_dir,
            app_path: config.app_path,
            base: config.base,
            assets: config.assets.into_iter().collect(),
            mime_types: config.mime_types,
            client: config.client,
            nodes,
            routes,
            matchers,
            server_assets: config.server_assets,
            prerendered: config.prerendered.into_iter().collect(),
        })
    }

    /// The parameter matchers, loading them on first use.
    pub async fn matchers(&self) -> Result<Arc<MatcherRegistry>, LoadError> {
        self.matchers.get().await
    }
}

impl Manifest<ModuleSource> {
    /// Load a manifest description and back its nodes with the module files
    /// it declares, relative to `root` (the description's directory when
    /// `None`).
    pub fn open(path: &Path, root: Option<&Path>) -> Result<Self, ManifestError> {
        let config = load_config(path)?;
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        Self::from_files(config, &root)
    }

    /// Back an already loaded description with module files under `root`.
    pub fn from_files(config: ManifestConfig, root: &Path) -> Result<Self, ManifestError> {
        let nodes = file_modules(root, &config.nodes, config.load_policy);
        Self::from_config(config, nodes)
    }
}

impl<M> Manifest<M> {
    pub fn app_dir(&self) -> &str {
        &self.app_dir
    }

    pub fn app_path(&self) -> &str {
        &self.app_path
    }

    /// Base path the application is mounted under.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn assets(&self) -> &BTreeSet<String> {
        &self.assets
    }

    pub fn is_asset(&self, file: &str) -> bool {
        self.assets.contains(file)
    }

    pub fn mime_types(&self) -> &BTreeMap<String, String> {
        &self.mime_types
    }

    /// MIME type of a file, by extension.
    pub fn mime_type(&self, file: &str) -> Option<&str> {
        assets::mime_type(&self.mime_types, file)
    }

    pub fn client(&self) -> &ClientConfig {
        &self.client
    }

    pub fn nodes(&self) -> &[LazyModule<M>] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&LazyModule<M>> {
        self.nodes.get(index)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn server_assets(&self) -> &BTreeMap<String, u64> {
        &self.server_assets
    }

    pub fn prerendered(&self) -> &BTreeSet<String> {
        &self.prerendered
    }

    /// Whether `path` was rendered at build time.
    pub fn is_prerendered(&self, path: &str) -> bool {
        let path = assets::normalize_path(path);
        self.prerendered
            .iter()
            .any(|entry| assets::normalize_path(entry) == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{PageComposition, RouteConfig};

    fn ready(value: &'static str) -> LazyModule<&'static str> {
        LazyModule::new(value, move || async move { Ok(value) })
    }

    fn config(leaf: usize) -> ManifestConfig {
        let mut config = ManifestConfig::default();
        config.routes.push(RouteConfig::new(
            "/[...catchall]",
            PageComposition {
                layouts: vec![Some(0)],
                errors: vec![Some(1)],
                leaf,
            },
        ));
        config
    }

    #[test]
    fn test_rejects_out_of_range_node() {
        let nodes = vec![ready("layout"), ready("error"), ready("page")];
        match Manifest::from_config(config(3), nodes) {
            Err(ManifestError::Validation(errors)) => {
                assert!(matches!(
                    errors[0],
                    ValidationError::NodeOutOfRange { index: 3, count: 3, .. }
                ));
            }
            other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_static_data() {
        let mut config = config(2);
        config.base = "/app".into();
        config.assets = vec!["favicon.png".into()];
        config.prerendered = vec!["/about/".into()];
        config.mime_types.insert(".png".into(), "image/png".into());
        config.server_assets.insert("_app/chunk.js".into(), 512);

        let nodes = vec![ready("layout"), ready("error"), ready("page")];
        let manifest = Manifest::from_config(config, nodes).unwrap();

        assert_eq!(manifest.base(), "/app");
        assert_eq!(manifest.app_dir(), "_app");
        assert!(manifest.is_asset("favicon.png"));
        assert_eq!(manifest.mime_type("favicon.png"), Some("image/png"));
        assert!(manifest.is_prerendered("/about"));
        assert!(!manifest.is_prerendered("/"));
        assert_eq!(manifest.server_assets()["_app/chunk.js"], 512);
        assert_eq!(manifest.routes().len(), 1);
        assert!(manifest.nodes().iter().all(|node| !node.is_loaded()));
    }

    #[tokio::test]
    async fn test_matchers_from_config() {
        let mut config = config(2);
        config.matchers.insert("integer".into(), r"\d+".into());
        let nodes = vec![ready("layout"), ready("error"), ready("page")];
        let manifest = Manifest::from_config(config, nodes).unwrap();

        let matchers = manifest.matchers().await.unwrap();
        assert!(matchers.get("integer").unwrap().matches("12"));
    }

    #[test]
    fn test_invalid_matcher_is_named() {
        let mut config = config(2);
        config.matchers.insert("hex".into(), "[0-9a-f".into());
        let nodes = vec![ready("layout"), ready("error"), ready("page")];

        match Manifest::from_config(config, nodes) {
            Err(ManifestError::Validation(errors)) => {
                assert!(matches!(
                    &errors[0],
                    ValidationError::InvalidMatcher { name, .. } if name == "hex"
                ));
            }
            other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_matchers_supplied_in_code() {
        let mut config = config(2);
        config.routes.insert(
            0,
            RouteConfig::new(
                "/items/[id=even]",
                PageComposition {
                    leaf: 2,
                    ..Default::default()
                },
            ),
        );
        let registry = LazyModule::new("matchers", || async {
            Ok(MatcherRegistry::new().with("even", |v: &str| v.len() % 2 == 0))
        });
        let nodes = vec![ready("layout"), ready("error"), ready("page")];

        let manifest = Manifest::from_config_with_matchers(config, nodes, registry).unwrap();
        let matchers = manifest.matchers().await.unwrap();
        assert!(matchers.contains("even"));
    }
}
