//! Parse error types.
//!
//! Parsing never fails outright; these describe degraded spots in an
//! otherwise complete node list.

use source_map::Span;
use thiserror::Error;

use crate::RegionKind;

/// An error that occurred during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The location in the source where the error occurred.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// A region ran to the end of input without its closing delimiter.
    #[error("unterminated {}: expected `{expected}`", region_name(.region))]
    UnterminatedRegion {
        /// The kind of region.
        region: RegionKind,
        /// The closing delimiter that was never found.
        expected: &'static str,
    },

    /// An include directive whose path could not be read.
    #[error("malformed #include directive: {message}")]
    MalformedInclude {
        /// A description of the problem.
        message: String,
    },
}

fn region_name(region: &RegionKind) -> &'static str {
    match region {
        RegionKind::MultiLineComment => "comment",
        RegionKind::BacktickString => "template literal",
        RegionKind::Text => "#text block",
        RegionKind::Sql => "#sql block",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ParseError::new(
            ParseErrorKind::UnterminatedRegion {
                region: RegionKind::Sql,
                expected: "#endsql",
            },
            Span::from_usize(0, 4),
        );
        assert_eq!(
            error.to_string(),
            "unterminated #sql block: expected `#endsql`"
        );
    }
}
