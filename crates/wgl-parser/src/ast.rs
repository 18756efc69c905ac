//! Node types for parsed WGLScript files.
//!
//! A parsed file is a flat, ordered list of [`Node`]s whose spans are
//! contiguous and cover the whole input. Only regions have children.

use smol_str::SmolStr;
use source_map::SourceSpan;

/// The kind of a node, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// A bracketed multi-line construct.
    Region,
    /// One line of a region.
    RegionLine,
    /// An `import "..."` statement or `#include <...>` directive.
    ModuleResolution,
    /// Any other code.
    Statement,
    /// A line terminator.
    BreakLine,
    /// A line holding only a `//` comment.
    SingleLineComment,
}

/// A node produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    /// An import statement or include directive.
    ModuleResolution(ImportNode),
    /// A comment, backtick literal, `#text` or `#sql` block.
    Region(RegionNode),
    /// Code up to a statement terminator or the end of the line.
    Statement(TextNode),
    /// A line terminator (`\n` or `\r\n`).
    BreakLine(TextNode),
    /// A `//` comment with nothing else on the line.
    SingleLineComment(TextNode),
}

impl Node {
    /// Returns the kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::ModuleResolution(_) => NodeKind::ModuleResolution,
            Node::Region(_) => NodeKind::Region,
            Node::Statement(_) => NodeKind::Statement,
            Node::BreakLine(_) => NodeKind::BreakLine,
            Node::SingleLineComment(_) => NodeKind::SingleLineComment,
        }
    }

    /// Returns the raw source text of this node.
    pub fn text(&self) -> &str {
        match self {
            Node::ModuleResolution(n) => &n.text,
            Node::Region(n) => &n.text,
            Node::Statement(n) | Node::BreakLine(n) | Node::SingleLineComment(n) => &n.text,
        }
    }

    /// Returns the span of this node.
    pub fn span(&self) -> SourceSpan {
        match self {
            Node::ModuleResolution(n) => n.span,
            Node::Region(n) => n.span,
            Node::Statement(n) | Node::BreakLine(n) | Node::SingleLineComment(n) => n.span,
        }
    }
}

/// A leaf node carrying only its text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextNode {
    /// The raw text.
    pub text: String,
    /// The source span.
    pub span: SourceSpan,
}

/// How a module is pulled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImportKind {
    /// `import "path";`
    EsImport,
    /// `#include <path>`
    Include,
}

/// A module resolution node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportNode {
    /// The import flavour.
    pub import_kind: ImportKind,
    /// The module path as written, delimiters stripped and `\\` collapsed to `\`.
    pub href: SmolStr,
    /// The raw text of the whole statement.
    pub text: String,
    /// The source span.
    pub span: SourceSpan,
}

/// The kind of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionKind {
    /// `/* ... */`, including `/** ... */`.
    MultiLineComment,
    /// `` `...` ``
    BacktickString,
    /// `#text ... #endtext`
    Text,
    /// `#sql ... #endsql`
    Sql,
}

impl RegionKind {
    /// Returns the `(open, close)` markers of a bracket block.
    pub fn bracket_markers(self) -> Option<(&'static str, &'static str)> {
        match self {
            RegionKind::Text => Some(("#text", "#endtext")),
            RegionKind::Sql => Some(("#sql", "#endsql")),
            RegionKind::MultiLineComment | RegionKind::BacktickString => None,
        }
    }
}

/// A region node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionNode {
    /// The region flavour.
    pub region_kind: RegionKind,
    /// The lines of the region, delimiters included, in order.
    pub lines: Vec<RegionLine>,
    /// Whether the closing delimiter was found.
    pub terminated: bool,
    /// The raw text of the whole region.
    pub text: String,
    /// The source span.
    pub span: SourceSpan,
}

/// One line of a region.
///
/// The text includes the line's terminator, except for the last line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionLine {
    /// The raw text.
    pub text: String,
    /// The source span.
    pub span: SourceSpan,
}

impl RegionLine {
    /// Returns the kind of this node.
    pub fn kind(&self) -> NodeKind {
        NodeKind::RegionLine
    }
}
