//! The position-annotated fragment tree built by the bundler.
//!
//! Every piece of text in the tree remembers the module, line and column it
//! came from. The tree is consumed once by [`crate::compose`].

use smol_str::SmolStr;
use source_map::{LineCol, Position};

use crate::path::ModuleId;

/// Where a fragment's text starts in its originating module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Display path of the module.
    pub module: SmolStr,
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed byte column.
    pub column: u32,
}

impl Origin {
    /// Creates an origin from a parsed position.
    pub fn new(module: &ModuleId, position: Position) -> Self {
        Self {
            module: module.display.clone(),
            line: position.line,
            column: position.column,
        }
    }

    /// Returns the 0-indexed source map coordinate.
    pub fn line_col(&self) -> LineCol {
        LineCol::from_one_based(self.line, self.column)
    }
}

/// A node of the fragment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Literal text.
    Text {
        /// The (possibly rewritten) text.
        text: String,
        /// Where the original text started.
        origin: Origin,
    },
    /// An import edge and what became of it.
    Import(Box<ImportFragment>),
    /// An ordered sequence of fragments.
    Group(Vec<Fragment>),
}

impl Fragment {
    /// Creates a text fragment.
    pub fn text(text: impl Into<String>, module: &ModuleId, position: Position) -> Self {
        Fragment::Text {
            text: text.into(),
            origin: Origin::new(module, position),
        }
    }

    /// Returns true if the fragment renders no text of its own.
    pub fn is_empty(&self) -> bool {
        match self {
            Fragment::Text { text, .. } => text.is_empty(),
            Fragment::Import(_) => false,
            Fragment::Group(children) => children.iter().all(Fragment::is_empty),
        }
    }

    /// Calls `f` for every import edge in the tree, depth first.
    pub fn for_each_import<'a>(&'a self, f: &mut impl FnMut(&'a ImportFragment)) {
        match self {
            Fragment::Text { .. } => {}
            Fragment::Import(import) => {
                f(&**import);
                if let ImportOutcome::Expanded(body) = &import.outcome {
                    body.for_each_import(f);
                }
            }
            Fragment::Group(children) => {
                for child in children {
                    child.for_each_import(f);
                }
            }
        }
    }
}

/// One `import`/`#include` edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFragment {
    /// The imported module.
    pub target: ModuleId,
    /// The importing module.
    pub importer: ModuleId,
    /// Position of the import statement.
    pub origin: Origin,
    /// Line breaks standing in for the import text when nothing is expanded.
    pub filler: String,
    /// Importer code follows the import on its line, so an expanded body
    /// must be closed with a line break.
    pub break_after: bool,
    /// What happened to the edge.
    pub outcome: ImportOutcome,
}

impl ImportFragment {
    /// Returns the marker comment describing this edge.
    pub fn marker(&self) -> String {
        format!(
            "/* @@{} {} from {} */",
            self.outcome.label(),
            self.target.display,
            self.importer.display
        )
    }
}

/// The outcome of an import edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// First reference: the module body follows.
    Expanded(Fragment),
    /// The module was already included earlier in this compile.
    AlreadyIncluded,
    /// The tree-shaking policy left the module out.
    Shaken,
}

impl ImportOutcome {
    /// The marker label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            ImportOutcome::Expanded(_) => "resolved",
            ImportOutcome::AlreadyIncluded => "unresolved",
            ImportOutcome::Shaken => "skippedByTreeShaking",
        }
    }
}
