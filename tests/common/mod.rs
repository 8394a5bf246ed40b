//! Shared fixtures for integration tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// The single catch-all manifest a minimal build emits.
pub const CATCHALL_MANIFEST: &str = r#"
app_dir = "_app"
app_path = "_app"
base = ""
assets = []
prerendered = []

[client]
start = "_app/immutable/entry/start.B9ezvl2u.js"
app = "_app/immutable/entry/app.Cj4Mo-z4.js"
imports = [
    "_app/immutable/entry/start.B9ezvl2u.js",
    "_app/immutable/chunks/client.D7BHBgL3.js",
    "_app/immutable/entry/app.Cj4Mo-z4.js",
    "_app/immutable/chunks/preload-helper.DpQnamwV.js",
]
stylesheets = []
fonts = []
uses_env_dynamic_public = false

[[nodes]]
file = "chunks/0-Dn3ctTgk.js"

[[nodes]]
file = "chunks/1-BMFb4diD.js"

[[nodes]]
file = "chunks/2-B4d9dQ-8.js"
export = "aI"

[[routes]]
id = "/[...catchall]"
pattern = "^(?:\\/(.*))?\\/?$"
params = [{ name = "catchall", optional = false, rest = true, chained = true }]
page = { layouts = [0], errors = [1], leaf = 2 }
"#;

/// A build directory holding a manifest and its node files.
pub struct Build {
    pub dir: TempDir,
    pub manifest: PathBuf,
}

impl Build {
    /// Write `manifest` as `manifest.toml` plus the given node files.
    pub fn new(manifest: &str, files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("manifest.toml");
        std::fs::write(&manifest_path, manifest).unwrap();

        for (name, contents) in files {
            write_file(dir.path(), name, contents);
        }

        Self {
            dir,
            manifest: manifest_path,
        }
    }

    /// The catch-all build with all three chunks present.
    pub fn catchall() -> Self {
        Self::new(
            CATCHALL_MANIFEST,
            &[
                ("chunks/0-Dn3ctTgk.js", "// root layout"),
                ("chunks/1-BMFb4diD.js", "// root error"),
                ("chunks/2-B4d9dQ-8.js", "// catch-all page"),
            ],
        )
    }

    pub fn write(&self, name: &str, contents: &str) {
        write_file(self.dir.path(), name, contents);
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.dir.path().join(name)).unwrap();
    }
}

fn write_file(root: &Path, name: &str, contents: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}
