//! Manifest description schema.
//!
//! This module defines the on-disk shape of a generated route manifest.
//! All types derive Serde traits for deserialization from TOML or JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::loader::LoadPolicy;

/// Root description of one built application.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Directory the bundler wrote application assets into.
    pub app_dir: String,

    /// URL path prefix for application assets.
    pub app_path: String,

    /// Base path the application is mounted under ("" for the root).
    pub base: String,

    /// Static files shipped as-is.
    pub assets: Vec<String>,

    /// Paths rendered at build time.
    pub prerendered: Vec<String>,

    /// File extension (".png" or "png") to MIME type.
    pub mime_types: BTreeMap<String, String>,

    /// Client bundle description.
    pub client: ClientConfig,

    /// How overlapping first loads of the same node are handled.
    pub load_policy: LoadPolicy,

    /// Layout/page modules, addressed by position.
    pub nodes: Vec<NodeConfig>,

    /// Route table in declaration order.
    pub routes: Vec<RouteConfig>,

    /// Parameter matchers by name, each a regular expression the whole
    /// parameter value must match.
    pub matchers: BTreeMap<String, String>,

    /// Server-rendered asset file name to size in bytes.
    pub server_assets: BTreeMap<String, u64>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            app_dir: "_app".to_string(),
            app_path: "_app".to_string(),
            base: String::new(),
            assets: Vec::new(),
            prerendered: Vec::new(),
            mime_types: BTreeMap::new(),
            client: ClientConfig::default(),
            load_policy: LoadPolicy::default(),
            nodes: Vec::new(),
            routes: Vec::new(),
            matchers: BTreeMap::new(),
            server_assets: BTreeMap::new(),
        }
    }
}

/// Client bundle description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Entry module that boots the client runtime.
    pub start: String,

    /// Entry module holding the application itself.
    pub app: String,

    /// Every module fetched to boot the client, in load order.
    pub imports: Vec<String>,

    pub stylesheets: Vec<String>,

    pub fonts: Vec<String>,

    /// Whether dynamically injected public environment variables are used.
    pub uses_env_dynamic_public: bool,
}

/// One lazily loaded layout or page module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeConfig {
    /// Module file, relative to the manifest directory.
    pub file: String,

    /// Named export the module resolves to, if not the module itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<String>,
}

/// Route descriptor as written by the build step.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Path template, unique within the table (e.g. "/blog/[slug]").
    pub id: String,

    /// Compiled pattern. Derived from `id` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Parameter bindings. Derived from `id` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<RouteParam>>,

    /// Modules rendering this route.
    pub page: PageComposition,

    /// Server-side endpoint reference; absent for client-rendered routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl RouteConfig {
    /// A route whose pattern and params are derived from its id.
    pub fn new(id: impl Into<String>, page: PageComposition) -> Self {
        Self {
            id: id.into(),
            pattern: None,
            params: None,
            page,
            endpoint: None,
        }
    }
}

/// A named parameter binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteParam {
    pub name: String,

    /// Name of the matcher the value must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,

    /// May be absent from the path.
    #[serde(default)]
    pub optional: bool,

    /// Catch-all: captures zero or more remaining segments.
    #[serde(default)]
    pub rest: bool,

    /// Captured text may span several segments.
    #[serde(default)]
    pub chained: bool,
}

/// Layout chain, error boundaries and leaf for one route.
///
/// `layouts[i]` and `errors[i]` describe the same depth, outermost first.
/// Empty slots are written as `-1` (or `null` in JSON).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageComposition {
    #[serde(default, with = "slots")]
    pub layouts: Vec<Option<usize>>,

    #[serde(default, with = "slots")]
    pub errors: Vec<Option<usize>>,

    pub leaf: usize,
}

impl PageComposition {
    /// Every node index this page references, with the slot it occupies.
    pub fn references(&self) -> impl Iterator<Item = (NodeSlot, usize)> + '_ {
        let layouts = self
            .layouts
            .iter()
            .enumerate()
            .filter_map(|(depth, slot)| slot.map(|index| (NodeSlot::Layout(depth), index)));
        let errors = self
            .errors
            .iter()
            .enumerate()
            .filter_map(|(depth, slot)| slot.map(|index| (NodeSlot::Error(depth), index)));
        layouts
            .chain(errors)
            .chain(std::iter::once((NodeSlot::Leaf, self.leaf)))
    }
}

/// Position of a node reference within a page composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeSlot {
    Layout(usize),
    Error(usize),
    Leaf,
}

impl std::fmt::Display for NodeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeSlot::Layout(depth) => write!(f, "layouts[{}]", depth),
            NodeSlot::Error(depth) => write!(f, "errors[{}]", depth),
            NodeSlot::Leaf => write!(f, "leaf"),
        }
    }
}

mod slots {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Marker for an empty slot where the format has no null.
    const EMPTY: i64 = -1;

    pub fn serialize<S: Serializer>(
        slots: &[Option<usize>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(slots.iter().map(|slot| slot.map_or(EMPTY, |index| index as i64)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Option<usize>>, D::Error> {
        Vec::<Option<i64>>::deserialize(deserializer)?
            .into_iter()
            .map(|slot| match slot {
                None | Some(EMPTY) => Ok(None),
                Some(index) => usize::try_from(index).map(Some).map_err(|_| {
                    D::Error::custom(format!(
                        "invalid node index {}; use -1 or null for an empty slot",
                        index
                    ))
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_slots_from_json() {
        let page: PageComposition =
            serde_json::from_str(r#"{"layouts":[0,null],"errors":[1,null],"leaf":2}"#).unwrap();
        assert_eq!(page.layouts, vec![Some(0), None]);
        assert_eq!(page.errors, vec![Some(1), None]);
        assert_eq!(page.leaf, 2);
    }

    #[test]
    fn test_page_slots_from_toml() {
        let page: PageComposition = toml::from_str("layouts = [0, -1]\nleaf = 3\n").unwrap();
        assert_eq!(page.layouts, vec![Some(0), None]);
        assert!(page.errors.is_empty());
    }

    #[test]
    fn test_page_slots_reject_other_negatives() {
        let err = toml::from_str::<PageComposition>("layouts = [-7]\nleaf = 1\n").unwrap_err();
        assert!(err.to_string().contains("invalid node index -7"));

        let err =
            serde_json::from_str::<PageComposition>(r#"{"errors":[-3],"leaf":1}"#).unwrap_err();
        assert!(err.to_string().contains("invalid node index -3"));
    }

    #[test]
    fn test_page_references() {
        let page = PageComposition {
            layouts: vec![Some(0), None],
            errors: vec![Some(1)],
            leaf: 2,
        };
        let refs: Vec<_> = page.references().collect();
        assert_eq!(
            refs,
            vec![(NodeSlot::Layout(0), 0), (NodeSlot::Error(0), 1), (NodeSlot::Leaf, 2)]
        );
    }

    #[test]
    fn test_defaults() {
        let config: ManifestConfig = toml::from_str("").unwrap();
        assert_eq!(config.app_dir, "_app");
        assert_eq!(config.load_policy, LoadPolicy::Coalesce);
        assert!(config.routes.is_empty());
    }
}
