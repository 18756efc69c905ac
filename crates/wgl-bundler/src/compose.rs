//! Flattens a fragment tree into bundled text and a source map.

use source_map::{SourceMap, SourceMapBuilder};

use crate::fragment::{Fragment, ImportFragment, ImportOutcome};

/// The output of [`compose`].
#[derive(Debug, Clone)]
pub struct Composed {
    /// The flattened text.
    pub code: String,
    /// One mapping per emitted fragment, in generated order.
    pub source_map: SourceMap,
}

/// Flattens `fragment` depth first.
///
/// Every text fragment and every marker is mapped to where it came from.
/// Import markers render as:
/// - resolved: the marker, a line break, then the module body, closed by a
///   line break when importer code shares the import's line
/// - unresolved: the marker in place of the import text, then the import's
///   own line breaks
/// - skipped by tree-shaking: the marker, a line break, then the import's own
///   line breaks
pub fn compose(fragment: &Fragment) -> Composed {
    let mut composer = Composer::default();
    composer.emit(fragment);
    Composed {
        code: composer.code,
        source_map: composer.builder.build(),
    }
}

#[derive(Default)]
struct Composer {
    code: String,
    builder: SourceMapBuilder,
}

impl Composer {
    fn emit(&mut self, fragment: &Fragment) {
        match fragment {
            Fragment::Text { text, origin } => {
                self.builder.add_mapped(&origin.module, origin.line_col(), text);
                self.code.push_str(text);
            }
            Fragment::Import(import) => self.emit_import(import),
            Fragment::Group(children) => {
                for child in children {
                    self.emit(child);
                }
            }
        }
    }

    fn emit_import(&mut self, import: &ImportFragment) {
        let marker = import.marker();
        self.builder
            .add_mapped(&import.origin.module, import.origin.line_col(), &marker);
        self.code.push_str(&marker);

        match &import.outcome {
            ImportOutcome::Expanded(body) => {
                self.push_generated("\n");
                self.emit(body);
                if import.break_after && !body.is_empty() {
                    self.push_generated("\n");
                }
            }
            ImportOutcome::AlreadyIncluded => {
                self.push_generated(&import.filler);
            }
            ImportOutcome::Shaken => {
                self.push_generated("\n");
                self.push_generated(&import.filler);
            }
        }
    }

    fn push_generated(&mut self, text: &str) {
        self.builder.add_generated(text);
        self.code.push_str(text);
    }
}
