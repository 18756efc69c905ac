//! Bundle orchestration.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::{Diagnostic, Report};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info};
use walkdir::WalkDir;
use wgl_bundler::{path, Bundle, BundleError, Bundler, CompileOptions, DiskFiles, ModuleFilter};

use crate::cli::{Args, OutputFormat};
use crate::config::{ConfigError, ProjectConfig};
use crate::output::{BundleReport, Formatter};

/// Orchestration errors.
#[derive(Debug, Error, Diagnostic)]
pub enum OrchestratorError {
    /// The current directory is unavailable or not UTF-8.
    #[error("failed to resolve the current directory")]
    #[diagnostic(
        code(wgl_bundle::current_dir),
        help("pass an absolute path to --workspace")
    )]
    CurrentDir(#[source] io::Error),

    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    #[diagnostic(code(wgl_bundle::invalid_glob))]
    InvalidGlob(String),

    /// The project configuration could not be loaded.
    #[error(transparent)]
    #[diagnostic(code(wgl_bundle::config))]
    Config(#[from] ConfigError),

    /// Nothing to bundle.
    #[error("no entry files to bundle")]
    #[diagnostic(
        code(wgl_bundle::no_entries),
        help("pass entry files or use --all to discover them")
    )]
    NoEntries,

    /// An output file could not be written.
    #[error("failed to write {path}")]
    #[diagnostic(code(wgl_bundle::write_failed))]
    WriteFailed {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    /// One entry failed to bundle.
    #[error("failed to bundle `{entry}`")]
    #[diagnostic(code(wgl_bundle::bundle_failed))]
    BundleFailed {
        entry: Utf8PathBuf,
        #[source]
        source: BundleError,
    },
}

/// Result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of entries compiled.
    pub entry_count: usize,
    /// Number of entries that failed.
    pub failed: usize,
}

/// Bundles every requested entry.
pub async fn run(args: Args) -> Result<RunSummary, OrchestratorError> {
    let workspace = resolve_workspace(&args.workspace, std::env::current_dir)?;

    let config = match ProjectConfig::find(&workspace)? {
        Some((path, config)) => {
            info!(config = %path, "loaded project configuration");
            config
        }
        None => ProjectConfig::default(),
    };

    let options = compile_options(&args, &config, &workspace)?;
    let entries = collect_entries(&args, &config, &workspace)?;
    if entries.is_empty() {
        return Err(OrchestratorError::NoEntries);
    }
    info!(entries = entries.len(), workspace = %workspace, "bundling");

    let bundler = Arc::new(Bundler::new(DiskFiles));
    let mut tasks = JoinSet::new();
    for (index, entry) in entries.iter().enumerate() {
        let bundler = Arc::clone(&bundler);
        let options = options.clone();
        let entry = entry.clone();
        tasks.spawn(async move { (index, bundler.bundle(&entry, &options).await) });
    }

    let mut results: Vec<(usize, Result<Bundle, BundleError>)> = Vec::with_capacity(entries.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(err) => error!(error = %err, "bundle task failed"),
        }
    }
    results.sort_by_key(|(index, _)| *index);

    let formatter = Formatter::new(args.output, args.locate);
    let out_dir = args.out_dir.as_ref().map(|dir| workspace.join(dir));
    let mut reports: Vec<BundleReport> = Vec::new();
    let mut failed = entries.len() - results.len();

    for (index, result) in results {
        let relative = relative_to(&entries[index], &workspace);
        let bundle = match result {
            Ok(bundle) => bundle,
            Err(source) => {
                failed += 1;
                error!(entry = %relative, error = %source, "bundle failed");
                let failure = OrchestratorError::BundleFailed {
                    entry: relative,
                    source,
                };
                eprintln!("{:?}", Report::new(failure));
                continue;
            }
        };
        debug!(entry = %relative, modules = bundle.modules.len(), "bundled");

        if let Some(out_dir) = &out_dir {
            let written = write_bundle(out_dir, &relative, &bundle).await?;
            if formatter.format() == OutputFormat::Text {
                print!("{}", formatter.format_text(&relative, &bundle, false));
                println!("wrote {}", written);
            }
        } else if formatter.format() == OutputFormat::Text {
            print!("{}", formatter.format_text(&relative, &bundle, true));
        }

        if formatter.format() == OutputFormat::Json {
            reports.push(formatter.report(&relative, &bundle));
        }
    }

    if formatter.format() == OutputFormat::Json {
        println!("{}", Formatter::format_json(&reports));
    }

    Ok(RunSummary {
        entry_count: entries.len(),
        failed,
    })
}

/// Resolves the workspace against the current directory when relative.
fn resolve_workspace(
    workspace: &Utf8Path,
    current_dir: impl FnOnce() -> io::Result<PathBuf>,
) -> Result<Utf8PathBuf, OrchestratorError> {
    let workspace = if workspace.is_relative() {
        let cwd = current_dir()
            .and_then(|dir| Utf8PathBuf::try_from(dir).map_err(|e| e.into_io_error()))
            .map_err(OrchestratorError::CurrentDir)?;
        cwd.join(workspace)
    } else {
        workspace.to_owned()
    };
    Ok(path::clean_path(&workspace))
}

/// Builds compile options from CLI flags, falling back to the project file.
fn compile_options(
    args: &Args,
    config: &ProjectConfig,
    workspace: &Utf8Path,
) -> Result<CompileOptions, OrchestratorError> {
    let mut options = CompileOptions::new(workspace);

    if args.no_global_script {
        options.skip_attach_global_script = true;
    } else if let Some(script) = args.global_script.as_ref().or(config.global_script.as_ref()) {
        options = options.with_global_script(script.clone());
    }

    let filter = if args.tree_shaking_requested() {
        Some(ModuleFilter::new(&args.tree_shake, &args.keep_symbol))
    } else if !config.tree_shaking.is_empty() {
        Some(ModuleFilter::new(
            &config.tree_shaking.modules,
            &config.tree_shaking.symbols,
        ))
    } else {
        None
    };
    if let Some(filter) = filter {
        let filter = filter.map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        info!(
            patterns = ?filter.patterns(),
            symbols = ?filter.symbols(),
            "tree-shaking enabled"
        );
        options = options.with_tree_shaking(Arc::new(filter));
    }

    Ok(options)
}

/// Collects explicit entries and, with `--all`, discovered ones.
fn collect_entries(
    args: &Args,
    config: &ProjectConfig,
    workspace: &Utf8Path,
) -> Result<Vec<Utf8PathBuf>, OrchestratorError> {
    let mut entries: Vec<Utf8PathBuf> = args
        .entries
        .iter()
        .map(|entry| path::clean_path(&workspace.join(entry)))
        .collect();

    if args.all {
        let ignore_set = ignore_set(args.ignore.iter().chain(&config.exclude))?;
        let extensions = config.file_extensions();
        let discovered = WalkDir::new(workspace)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
            .filter(|p| {
                let file_name = p.file_name().unwrap_or("");
                extensions.iter().any(|ext| file_name.ends_with(ext))
            })
            .filter(|p| {
                let relative = p.strip_prefix(workspace).unwrap_or(p);
                !ignore_set.is_match(relative.as_str())
            });

        for entry in discovered {
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
    }

    Ok(entries)
}

/// Builds the ignore set used by entry discovery.
fn ignore_set<'a>(
    patterns: impl IntoIterator<Item = &'a String>,
) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }

    // Dependencies and previous output
    for pattern in ["**/node_modules/**", "**/*.bundle.js"] {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }

    builder
        .build()
        .map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))
}

/// Writes `<stem>.bundle.js` and its source map into `out_dir`.
async fn write_bundle(
    out_dir: &Utf8Path,
    entry: &Utf8Path,
    bundle: &Bundle,
) -> Result<Utf8PathBuf, OrchestratorError> {
    let file_name = format!("{}.bundle.js", entry.file_stem().unwrap_or("bundle"));
    let code_path = out_dir.join(&file_name);
    let map_path = out_dir.join(format!("{}.map", file_name));
    tokio::fs::create_dir_all(out_dir)
        .await
        .map_err(write_failed(out_dir))?;
    tokio::fs::write(&code_path, &bundle.code)
        .await
        .map_err(write_failed(&code_path))?;
    tokio::fs::write(&map_path, bundle.source_map.to_json(Some(&file_name)))
        .await
        .map_err(write_failed(&map_path))?;

    debug!(code = %code_path, map = %map_path, "wrote bundle");
    Ok(code_path)
}

fn write_failed(path: &Utf8Path) -> impl FnOnce(io::Error) -> OrchestratorError {
    let path = path.to_owned();
    move |source| OrchestratorError::WriteFailed { path, source }
}

/// Returns `path` relative to the workspace when it lies inside it.
fn relative_to(path: &Utf8Path, workspace: &Utf8Path) -> Utf8PathBuf {
    path.strip_prefix(workspace)
        .map(Utf8Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
