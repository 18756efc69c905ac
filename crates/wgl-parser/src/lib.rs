//! WGLScript parser for the bundler.
//!
//! This crate turns WGLScript source text into an ordered list of
//! position-tagged nodes:
//! - Lexer (tokenizer) using `logos`
//! - A line-oriented node parser recognizing imports, includes, comments,
//!   template literals, `#text`/`#sql` blocks and plain statements
//! - Error recovery: malformed input always yields a complete node list
//!
//! The nodes cover the input without gaps or overlaps, so concatenating their
//! text gives back the source.
//!
//! # Example
//!
//! ```
//! use wgl_parser::{parse, NodeKind};
//!
//! let source = "#include <lib/util.js>\nvar x = 1;\n";
//! let result = parse(source);
//! assert!(result.errors.is_empty());
//! assert_eq!(result.nodes[0].kind(), NodeKind::ModuleResolution);
//! ```

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::*;
pub use error::{ParseError, ParseErrorKind};
pub use lexer::{Lexer, Token, TokenKind};
pub use source_map::{Position, SourceSpan, Span};

/// The result of parsing a WGLScript file.
#[derive(Debug)]
pub struct ParseResult {
    /// The nodes, in document order.
    pub nodes: Vec<Node>,
    /// Any errors encountered during parsing.
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Returns true if the file ends with a line terminator.
    pub fn ends_with_break_line(&self) -> bool {
        matches!(self.nodes.last(), Some(Node::BreakLine(_)))
    }
}

/// Parses a WGLScript source file into nodes.
///
/// Parsing always succeeds; problems such as an unterminated comment are
/// reported in [`ParseResult::errors`] next to a best-effort node list.
pub fn parse(source: &str) -> ParseResult {
    parser::Parser::new(source).parse()
}
