//! Output formatting.

use camino::Utf8Path;
use serde::Serialize;
use smol_str::SmolStr;
use source_map::LineCol;
use wgl_bundler::Bundle;

use crate::cli::{Location, OutputFormat};

/// The JSON report for one bundled entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleReport {
    /// The entry path, relative to the workspace.
    pub entry: String,
    /// The bundled code.
    pub code: String,
    /// Included modules, in order.
    pub modules: Vec<SmolStr>,
    /// The revision 3 source map.
    pub source_map: serde_json::Value,
    /// The answer to `--locate`, if asked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub located: Option<LocatedPosition>,
}

/// An original position found through the source map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedPosition {
    /// Module the position belongs to.
    pub source: String,
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
}

/// Maps a 1-based bundled location back to its module.
pub fn locate(bundle: &Bundle, location: Location) -> Option<LocatedPosition> {
    let generated = LineCol::from_one_based(location.line, location.column);
    bundle
        .source_map
        .original_position(generated)
        .map(|original| LocatedPosition {
            source: original.source.to_string(),
            line: original.position.line + 1,
            column: original.position.col + 1,
        })
}

/// Formats bundles for output.
pub struct Formatter {
    format: OutputFormat,
    locate: Option<Location>,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat, locate: Option<Location>) -> Self {
        Self { format, locate }
    }

    /// Returns the output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Formats one bundle as text: a header, the code, and the `--locate`
    /// answer when requested. With `include_code` off only the header and
    /// the location are printed.
    pub fn format_text(&self, entry: &Utf8Path, bundle: &Bundle, include_code: bool) -> String {
        let mut output = format!("=== {} ({} modules) ===\n", entry, bundle.modules.len());
        if include_code {
            output.push_str(&bundle.code);
            if !bundle.code.ends_with('\n') {
                output.push('\n');
            }
        }
        if let Some(location) = self.locate {
            let answer = match locate(bundle, location) {
                Some(found) => format!("{}:{}:{}", found.source, found.line, found.column),
                None => "unmapped".to_string(),
            };
            output.push_str(&format!("{}:{} -> {}\n", entry, location, answer));
        }
        output
    }

    /// Builds the JSON report for one bundle.
    pub fn report(&self, entry: &Utf8Path, bundle: &Bundle) -> BundleReport {
        let file = format!("{}.bundle.js", entry.file_stem().unwrap_or("bundle"));
        BundleReport {
            entry: entry.to_string(),
            code: bundle.code.clone(),
            modules: bundle.modules.clone(),
            source_map: serde_json::from_str(&bundle.source_map.to_json(Some(&file)))
                .unwrap_or_default(),
            located: self.locate.and_then(|location| locate(bundle, location)),
        }
    }

    /// Serializes reports as a JSON array.
    pub fn format_json(reports: &[BundleReport]) -> String {
        serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string())
    }
}
