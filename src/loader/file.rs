//! File-backed node modules.
//!
//! Each node declared in a manifest description points at a module file
//! relative to the manifest's directory. The file is read on first access.

use std::path::{Path, PathBuf};

use crate::config::schema::NodeConfig;
use crate::loader::{LazyModule, LoadError, LoadPolicy};

/// Contents of a loaded module file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    /// Resolved path of the module file.
    pub path: PathBuf,
    /// Named export the node resolves to, if any.
    pub export: Option<String>,
    /// Module text.
    pub source: String,
}

/// Build the lazy loader for one declared node.
pub fn file_module(
    index: usize,
    root: &Path,
    node: &NodeConfig,
    policy: LoadPolicy,
) -> LazyModule<ModuleSource> {
    let path = root.join(&node.file);
    let export = node.export.clone();
    let label = format!("{}:{}", index, node.file);

    LazyModule::with_policy(label, policy, move || {
        let path = path.clone();
        let export = export.clone();
        async move {
            let source = tokio::fs::read_to_string(&path).await.map_err(|e| LoadError::Io {
                path: path.clone(),
                message: e.to_string(),
            })?;
            Ok(ModuleSource { path, export, source })
        }
    })
}

/// Build loaders for every declared node, in declaration order.
pub fn file_modules(
    root: &Path,
    nodes: &[NodeConfig],
    policy: LoadPolicy,
) -> Vec<LazyModule<ModuleSource>> {
    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| file_module(index, root, node, policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_file_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("0.js"), "export default 1;").unwrap();

        let node = NodeConfig {
            file: "0.js".into(),
            export: Some("aI".into()),
        };
        let module = file_module(0, dir.path(), &node, LoadPolicy::Coalesce);
        assert_eq!(module.label(), "0:0.js");

        let loaded = module.get().await.unwrap();
        assert_eq!(loaded.source, "export default 1;");
        assert_eq!(loaded.export.as_deref(), Some("aI"));

        // Cached: rewriting the file does not change the loaded module.
        std::fs::write(dir.path().join("0.js"), "export default 2;").unwrap();
        assert_eq!(module.get().await.unwrap().source, "export default 1;");
        assert_eq!(module.load_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_retries() {
        let dir = tempfile::tempdir().unwrap();
        let node = NodeConfig {
            file: "late.js".into(),
            export: None,
        };
        let module = file_module(3, dir.path(), &node, LoadPolicy::Coalesce);

        assert!(matches!(module.get().await, Err(LoadError::Io { .. })));

        std::fs::write(dir.path().join("late.js"), "ok").unwrap();
        assert_eq!(module.get().await.unwrap().source, "ok");
        assert_eq!(module.load_count(), 2);
    }
}
