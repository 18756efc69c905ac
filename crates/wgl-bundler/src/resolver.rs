//! Recursive module resolution and inlining.
//!
//! A compile walks the entry's nodes in order. Every import either expands
//! the imported module in place (first reference), leaves an `unresolved`
//! marker (already included) or a `skippedByTreeShaking` marker (rejected by
//! the shake policy). The visited set threads through the whole walk, so
//! cycles and diamonds terminate after one expansion per module.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::{LineIndex, Position, SourceMap};
use tracing::{debug, warn};
use wgl_parser::{ImportNode, Node};

use crate::compose::compose;
use crate::error::BundleError;
use crate::files::FileAccess;
use crate::fragment::{Fragment, ImportFragment, ImportOutcome, Origin};
use crate::path::{self, ModuleId};
use crate::shaking::ShakePolicy;
use crate::transpile::{rewrite_region_line, rewrite_statement};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Options for one top-level compile.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Absolute project root; root-relative hrefs and module ids hang off it.
    pub project_root: Utf8PathBuf,
    /// Optional tree-shaking policy.
    pub tree_shaking: Option<Arc<dyn ShakePolicy>>,
    /// Script implicitly imported ahead of every entry, relative to the
    /// project root or absolute.
    pub global_script: Option<Utf8PathBuf>,
    /// Compile the entry without its global script.
    pub skip_attach_global_script: bool,
}

impl CompileOptions {
    /// Creates options for the given project root.
    pub fn new(project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            tree_shaking: None,
            global_script: None,
            skip_attach_global_script: false,
        }
    }

    /// Enables tree-shaking with `policy`.
    pub fn with_tree_shaking(mut self, policy: Arc<dyn ShakePolicy>) -> Self {
        self.tree_shaking = Some(policy);
        self
    }

    /// Sets the global script.
    pub fn with_global_script(mut self, script: impl Into<Utf8PathBuf>) -> Self {
        self.global_script = Some(script.into());
        self
    }

    /// Resolves the global script against the project root.
    pub fn global_script_path(&self) -> Option<Utf8PathBuf> {
        self.global_script
            .as_deref()
            .map(|script| path::join_root(&self.project_root, script.as_str()))
    }
}

/// The modules that have begun inclusion during one compile, in order.
#[derive(Debug, Clone, Default)]
pub struct ModuleSet {
    modules: IndexMap<SmolStr, ModuleId>,
}

impl ModuleSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `module` has been included.
    pub fn contains(&self, module: &ModuleId) -> bool {
        self.modules.contains_key(&module.key)
    }

    /// Records `module`. Returns false if it was already present.
    pub fn insert(&mut self, module: ModuleId) -> bool {
        if self.contains(&module) {
            return false;
        }
        self.modules.insert(module.key.clone(), module);
        true
    }

    /// Returns the number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if no module has been included.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterates over the modules in inclusion order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleId> {
        self.modules.values()
    }
}

/// The flattened result of a compile.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// The bundled code.
    pub code: String,
    /// Maps bundled positions back to their modules.
    pub source_map: SourceMap,
    /// Display paths of the expanded modules, in inclusion order.
    pub modules: Vec<SmolStr>,
}

/// Compiles WGLScript entry files into fragment trees and bundles.
#[derive(Debug, Clone, Default)]
pub struct Bundler<F> {
    files: F,
}

impl<F: FileAccess> Bundler<F> {
    /// Creates a bundler reading through `files`.
    pub fn new(files: F) -> Self {
        Self { files }
    }

    /// Compiles `target` with a fresh visited set and flattens the result.
    pub async fn bundle(
        &self,
        target: &Utf8Path,
        options: &CompileOptions,
    ) -> Result<Bundle, BundleError> {
        let mut modules = ModuleSet::new();
        let fragment = self.compile(target, options, &mut modules).await?;
        let composed = compose(&fragment);
        Ok(Bundle {
            code: composed.code,
            source_map: composed.source_map,
            modules: modules.iter().map(|m| m.display.clone()).collect(),
        })
    }

    /// Compiles `target` into a fragment tree.
    ///
    /// `modules` is the visited set; pass an empty set for a fresh compile.
    /// The global script is attached here, never for nested modules.
    pub async fn compile(
        &self,
        target: &Utf8Path,
        options: &CompileOptions,
        modules: &mut ModuleSet,
    ) -> Result<Fragment, BundleError> {
        let path = path::clean_path(target);
        let content = self
            .files
            .read(&path)
            .await
            .map_err(|source| BundleError::ReadEntry {
                path: path.clone(),
                source,
            })?;
        let id = ModuleId::new(&path, &options.project_root);

        let global = if options.skip_attach_global_script {
            None
        } else {
            options.global_script_path().and_then(|script| {
                let script_id = ModuleId::new(&script, &options.project_root);
                (script_id != id && !modules.contains(&script_id)).then_some((script, script_id))
            })
        };

        let Some((script, script_id)) = global else {
            return self.expand(path, id, content, options, modules).await;
        };

        // The entry counts as included before its global script
        modules.insert(id.clone());
        debug!(entry = %id, script = %script_id, "attaching global script");
        let script_content =
            self.files
                .read(&script)
                .await
                .map_err(|source| BundleError::ReadImport {
                    path: script.clone(),
                    importer: id.display.clone(),
                    source,
                })?;
        let script_body = self
            .expand(script, script_id.clone(), script_content, options, modules)
            .await?;
        let body = self
            .expand(path, id.clone(), content, options, modules)
            .await?;

        let origin = Origin::new(&id, Position::default());
        Ok(Fragment::Group(vec![
            Fragment::Import(Box::new(ImportFragment {
                target: script_id,
                importer: id,
                origin: origin.clone(),
                filler: String::new(),
                break_after: false,
                outcome: ImportOutcome::Expanded(script_body),
            })),
            Fragment::Text {
                text: "\n".to_string(),
                origin,
            },
            body,
        ]))
    }

    /// Parses and transpiles one module whose text is already read.
    fn expand<'a>(
        &'a self,
        path: Utf8PathBuf,
        id: ModuleId,
        content: String,
        options: &'a CompileOptions,
        modules: &'a mut ModuleSet,
    ) -> BoxFuture<'a, Result<Fragment, BundleError>> {
        Box::pin(async move {
            modules.insert(id.clone());

            let parsed = wgl_parser::parse(&content);
            debug!(module = %id, nodes = parsed.nodes.len(), "compiling module");
            if !parsed.errors.is_empty() {
                let index = LineIndex::new(&content);
                for error in &parsed.errors {
                    let position = index.position(error.span.start);
                    warn!(
                        module = %id,
                        line = position.line,
                        column = position.column,
                        "{error}"
                    );
                }
            }

            let ends_with_break = parsed.ends_with_break_line();
            let mut nodes = parsed.nodes;
            if ends_with_break {
                nodes.pop();
            }

            let mut fragments = Vec::with_capacity(nodes.len());
            let mut nodes = nodes.into_iter().peekable();
            while let Some(node) = nodes.next() {
                let fragment = match node {
                    Node::ModuleResolution(import) => {
                        let break_after = nodes
                            .peek()
                            .is_some_and(|next| !matches!(next, Node::BreakLine(_)));
                        self.resolve_import(&path, &id, import, break_after, options, modules)
                            .await?
                    }
                    Node::Region(region) => Fragment::Group(
                        region
                            .lines
                            .into_iter()
                            .map(|line| {
                                let text = rewrite_region_line(&line.text).into_owned();
                                Fragment::text(text, &id, line.span.start)
                            })
                            .collect(),
                    ),
                    Node::Statement(statement) => {
                        let text = rewrite_statement(&statement.text).into_owned();
                        Fragment::text(text, &id, statement.span.start)
                    }
                    Node::BreakLine(node) | Node::SingleLineComment(node) => {
                        Fragment::text(node.text, &id, node.span.start)
                    }
                };
                fragments.push(fragment);
            }

            Ok(Fragment::Group(fragments))
        })
    }

    /// Decides the outcome of one import edge and expands it if needed.
    fn resolve_import<'a>(
        &'a self,
        importer_path: &'a Utf8Path,
        importer: &'a ModuleId,
        import: ImportNode,
        break_after: bool,
        options: &'a CompileOptions,
        modules: &'a mut ModuleSet,
    ) -> BoxFuture<'a, Result<Fragment, BundleError>> {
        Box::pin(async move {
            let target_path =
                path::resolve_href(&import.href, importer_path, &options.project_root);
            let target = ModuleId::new(&target_path, &options.project_root);

            let outcome = if modules.contains(&target) {
                debug!(module = %target, importer = %importer, "already included");
                ImportOutcome::AlreadyIncluded
            } else {
                let content = self.files.read(&target_path).await.map_err(|source| {
                    BundleError::ReadImport {
                        path: target_path.clone(),
                        importer: importer.display.clone(),
                        source,
                    }
                })?;

                let shaken = options
                    .tree_shaking
                    .as_ref()
                    .is_some_and(|policy| !policy.is_relevant(&target, &content));
                if shaken {
                    debug!(module = %target, importer = %importer, "skipped by tree-shaking");
                    ImportOutcome::Shaken
                } else {
                    debug!(module = %target, importer = %importer, "resolved");
                    let body = self
                        .expand(target_path, target.clone(), content, options, modules)
                        .await?;
                    ImportOutcome::Expanded(body)
                }
            };

            Ok(Fragment::Import(Box::new(ImportFragment {
                target,
                importer: importer.clone(),
                origin: Origin::new(importer, import.span.start),
                filler: line_breaks(&import.text),
                break_after,
                outcome,
            })))
        })
    }
}

/// The line terminators of `text`, in order.
fn line_breaks(text: &str) -> String {
    text.match_indices('\n')
        .map(|(i, _)| {
            if text[..i].ends_with('\r') {
                "\r\n"
            } else {
                "\n"
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::MemoryFiles;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_breaks() {
        assert_eq!(line_breaks("import 'a.js';"), "");
        assert_eq!(line_breaks("a\r\nb\nc"), "\r\n\n");
    }

    #[test]
    fn test_module_set_keeps_first_spelling() {
        let root = Utf8Path::new("/p");
        let mut set = ModuleSet::new();
        assert!(set.insert(ModuleId::new(Utf8Path::new("/p/Lib/A.js"), root)));
        assert!(!set.insert(ModuleId::new(Utf8Path::new("/p/lib/a.js"), root)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().map(|m| m.display.as_str()), Some("Lib/A.js"));
    }

    #[test]
    fn test_global_script_path() {
        let options = CompileOptions::new("/p").with_global_script("lib/globals.js");
        assert_eq!(
            options.global_script_path().as_deref(),
            Some(Utf8Path::new("/p/lib/globals.js"))
        );
        let options = CompileOptions::new("/p").with_global_script("/p/g.js");
        assert_eq!(
            options.global_script_path().as_deref(),
            Some(Utf8Path::new("/p/g.js"))
        );
    }

    #[tokio::test]
    async fn test_compile_records_visited_modules() {
        let files = MemoryFiles::new()
            .with_file("/p/main.js", "import 'a.js';\nimport 'b.js';\n")
            .with_file("/p/a.js", "import 'b.js';\n")
            .with_file("/p/b.js", "var b;\n");
        let bundler = Bundler::new(files);
        let mut modules = ModuleSet::new();
        bundler
            .compile(
                Utf8Path::new("/p/main.js"),
                &CompileOptions::new("/p"),
                &mut modules,
            )
            .await
            .unwrap();

        let visited: Vec<_> = modules.iter().map(|m| m.display.as_str()).collect();
        assert_eq!(visited, vec!["main.js", "a.js", "b.js"]);
    }

    #[tokio::test]
    async fn test_compile_with_shared_set_skips_known_modules() {
        let files = MemoryFiles::new()
            .with_file("/p/main.js", "import 'a.js';")
            .with_file("/p/a.js", "var a;");
        let bundler = Bundler::new(files);
        let mut modules = ModuleSet::new();
        modules.insert(ModuleId::new(Utf8Path::new("/p/a.js"), Utf8Path::new("/p")));

        let fragment = bundler
            .compile(
                Utf8Path::new("/p/main.js"),
                &CompileOptions::new("/p"),
                &mut modules,
            )
            .await
            .unwrap();

        let mut outcomes = Vec::new();
        fragment.for_each_import(&mut |import| outcomes.push(import.outcome.label()));
        assert_eq!(outcomes, vec!["unresolved"]);
    }
}
