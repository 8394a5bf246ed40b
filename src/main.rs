//! Route manifest inspector.
//!
//! Loads a generated route manifest, validates it, and resolves navigation
//! targets against it the way the client router would.
//!
//! ```text
//! manifest.toml ──▶ config (parse + validate) ──▶ Manifest ──▶ Navigator
//!                                                    │             │
//!                                 node files ◀── lazy loaders ◀────┘
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use route_manifest::config::watcher::ManifestWatcher;
use route_manifest::loader::ModuleSource;
use route_manifest::navigation::{PageContent, ResolvedPage};
use route_manifest::observability::logging::{init_logging, LogFormat};
use route_manifest::{Manifest, Navigator};

#[derive(Parser)]
#[command(name = "route-manifest")]
#[command(about = "Inspect and resolve generated route manifests", long_about = None)]
struct Cli {
    /// Log level for this tool (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format: pretty or json.
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// Directory node files are resolved against (defaults to the manifest's directory).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a manifest
    Check { manifest: PathBuf },
    /// List routes with their patterns and params
    Routes { manifest: PathBuf },
    /// Resolve paths or URLs to composed pages
    Resolve {
        manifest: PathBuf,
        #[arg(required = true)]
        targets: Vec<String>,
    },
    /// Watch a manifest and swap in rebuilt versions
    Watch {
        manifest: PathBuf,
        /// Target to re-resolve after every reload
        #[arg(long)]
        probe: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level, cli.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let root = cli.root.as_deref();

    match cli.command {
        Commands::Check { manifest } => {
            let loaded = Manifest::<ModuleSource>::open(&manifest, root)?;
            println!(
                "{}: ok ({} nodes, {} routes, {} assets, {} prerendered)",
                manifest.display(),
                loaded.nodes().len(),
                loaded.routes().len(),
                loaded.assets().len(),
                loaded.prerendered().len()
            );
        }
        Commands::Routes { manifest } => {
            let loaded = Manifest::<ModuleSource>::open(&manifest, root)?;
            let routes: Vec<Value> = loaded
                .routes()
                .routes()
                .iter()
                .map(|route| {
                    json!({
                        "id": route.id,
                        "pattern": route.pattern.as_str(),
                        "params": route.params,
                        "page": route.page,
                        "endpoint": route.endpoint,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&routes)?);
        }
        Commands::Resolve { manifest, targets } => {
            let navigator = Navigator::new(Manifest::<ModuleSource>::open(&manifest, root)?);
            let mut failed = false;
            let mut reports = Vec::with_capacity(targets.len());

            for target in &targets {
                let report = match navigator.navigate(target).await {
                    Ok(page) => page_report(target, &page),
                    Err(e) if e.is_not_found() => {
                        json!({ "target": target, "status": "not_found" })
                    }
                    Err(e) => {
                        failed = true;
                        json!({ "target": target, "status": "error", "error": e.to_string() })
                    }
                };
                reports.push(report);
            }

            println!("{}", serde_json::to_string_pretty(&reports)?);
            if failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Watch { manifest, probe } => watch(&manifest, root, probe).await?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn watch(
    path: &Path,
    root: Option<&Path>,
    probe: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let navigator = Navigator::new(Manifest::<ModuleSource>::open(path, Some(root.as_path()))?);

    let (watcher, mut updates) = ManifestWatcher::new(path);
    let _handle = watcher.run()?;
    tracing::info!(path = %path.display(), "Watching manifest; press Ctrl-C to stop");

    loop {
        tokio::select! {
            Some(config) = updates.recv() => {
                match Manifest::<ModuleSource>::from_files(config, &root) {
                    Ok(rebuilt) => navigator.replace(rebuilt),
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "Rebuilt manifest rejected, keeping current one"
                        );
                        continue;
                    }
                }

                if let Some(target) = &probe {
                    match navigator.navigate(target).await {
                        Ok(page) => println!("{}", page_report(target, &page)),
                        Err(e) => {
                            println!("{}", json!({ "target": target, "error": e.to_string() }))
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    Ok(())
}

fn page_report(target: &str, page: &ResolvedPage<ModuleSource>) -> Value {
    let layouts: Vec<_> = page
        .layouts
        .iter()
        .map(|module| module.path.display().to_string())
        .collect();
    let mut report = json!({
        "target": target,
        "status": "ok",
        "route": page.route_id,
        "path": page.path,
        "params": page.params,
        "layouts": layouts,
        "endpoint": page.endpoint,
    });

    match &page.content {
        PageContent::Leaf(leaf) => {
            report["leaf"] = json!(leaf.path.display().to_string());
        }
        PageContent::Error { module, cause } => {
            report["status"] = json!("error_boundary");
            report["error_page"] = json!(module.path.display().to_string());
            report["cause"] = json!(cause.to_string());
        }
    }
    report
}
