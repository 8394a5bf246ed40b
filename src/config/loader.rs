//! Manifest description loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ManifestConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for manifest loading and construction.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Serialization format of a manifest description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Json,
}

impl ManifestFormat {
    /// Pick the format from the file extension; anything but `.json` is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ManifestFormat::Json,
            _ => ManifestFormat::Toml,
        }
    }
}

/// Parse a manifest description without validating it.
pub fn parse_config(
    content: &str,
    format: ManifestFormat,
) -> Result<ManifestConfig, ManifestError> {
    let config = match format {
        ManifestFormat::Toml => toml::from_str(content)?,
        ManifestFormat::Json => serde_json::from_str(content)?,
    };
    Ok(config)
}

/// Load and validate a manifest description whose nodes are backed one to
/// one by the files it declares.
pub fn load_config(path: &Path) -> Result<ManifestConfig, ManifestError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content, ManifestFormat::from_path(path))?;

    validate_config(&config, config.nodes.len()).map_err(ManifestError::Validation)?;

    tracing::debug!(
        path = %path.display(),
        nodes = config.nodes.len(),
        routes = config.routes.len(),
        "Manifest description loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATCHALL_TOML: &str = r#"
app_dir = "_app"
app_path = "_app"

[client]
start = "_app/immutable/entry/start.js"
app = "_app/immutable/entry/app.js"
imports = ["_app/immutable/entry/start.js", "_app/immutable/entry/app.js"]

[[nodes]]
file = "chunks/0.js"

[[nodes]]
file = "chunks/1.js"

[[nodes]]
file = "chunks/2.js"
export = "aI"

[[routes]]
id = "/[...catchall]"
pattern = "^(?:\\/(.*))?\\/?$"
params = [{ name = "catchall", rest = true, chained = true }]
page = { layouts = [0], errors = [1], leaf = 2 }
"#;

    #[test]
    fn test_load_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(CATCHALL_TOML.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.nodes.len(), 3);
        assert_eq!(config.nodes[2].export.as_deref(), Some("aI"));
        assert_eq!(config.routes[0].id, "/[...catchall]");
        assert_eq!(config.routes[0].page.errors, vec![Some(1)]);
    }

    #[test]
    fn test_load_json() {
        let json = r#"{
            "nodes": [{"file": "0.js"}],
            "routes": [{"id": "/", "page": {"layouts": [null], "leaf": 0}}]
        }"#;
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.routes[0].page.layouts, vec![None]);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let toml = "[[nodes]]\nfile = \"0.js\"\n\n[[routes]]\nid = \"/\"\npage = { leaf = 4 }\n";
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        match load_config(file.path()) {
            Err(ManifestError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_negative_slot() {
        let toml = "[[nodes]]\nfile = \"0.js\"\n\n[[nodes]]\nfile = \"1.js\"\n\n\
                    [[routes]]\nid = \"/\"\npage = { layouts = [-7], errors = [-3], leaf = 1 }\n";
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        assert!(matches!(load_config(file.path()), Err(ManifestError::Toml(_))));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ManifestFormat::from_path(Path::new("m.json")), ManifestFormat::Json);
        assert_eq!(ManifestFormat::from_path(Path::new("m.toml")), ManifestFormat::Toml);
        assert_eq!(ManifestFormat::from_path(Path::new("manifest")), ManifestFormat::Toml);
    }
}
