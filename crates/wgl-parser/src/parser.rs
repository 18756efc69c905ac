//! Node parser for WGLScript.
//!
//! Drives the lexer line by line and groups tokens into the flat node list.
//! Region bodies are located on the raw text, after which the lexer is
//! restarted behind the region, so nothing inside a comment, template literal
//! or `#text`/`#sql` block is ever tokenized.

use std::collections::VecDeque;

use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::ParseResult;
use smol_str::SmolStr;
use source_map::{LineIndex, Span};

/// The WGLScript node parser.
pub struct Parser<'src> {
    /// The source being parsed.
    source: &'src str,
    /// The lexer, restarted after every region.
    lexer: Lexer<'src>,
    /// Tokens peeked but not consumed yet.
    lookahead: VecDeque<Token>,
    /// Offset → line/column conversion for node spans.
    line_index: LineIndex,
    /// Parse errors collected during parsing.
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    /// Creates a new parser.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            lexer: Lexer::new(source),
            lookahead: VecDeque::new(),
            line_index: LineIndex::new(source),
            errors: Vec::new(),
        }
    }

    /// Parses the source into its node list.
    pub fn parse(mut self) -> ParseResult {
        let mut nodes = Vec::new();
        while let Some(node) = self.parse_node() {
            nodes.push(node);
        }
        ParseResult {
            nodes,
            errors: self.errors,
        }
    }

    // === Token helpers ===

    fn eof_token(&self) -> Token {
        Token {
            kind: TokenKind::Eof,
            span: Span::from_usize(self.source.len(), self.source.len()),
        }
    }

    /// Returns the `n`th token ahead without consuming it.
    fn peek(&mut self, n: usize) -> &Token {
        while self.lookahead.len() <= n {
            let token = match self.lexer.next() {
                Some(token) => token,
                None => self.eof_token(),
            };
            self.lookahead.push_back(token);
        }
        &self.lookahead[n]
    }

    fn peek_kind(&mut self, n: usize) -> TokenKind {
        self.peek(n).kind
    }

    /// Consumes the current token.
    fn bump(&mut self) -> Token {
        self.peek(0);
        match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.eof_token(),
        }
    }

    /// Restarts lexing at `offset`, dropping any lookahead.
    fn seek(&mut self, offset: usize) {
        self.lexer = Lexer::new_at(self.source, offset);
        self.lookahead.clear();
    }

    fn text(&self, span: Span) -> &'src str {
        span.slice(self.source)
    }

    fn text_node(&self, start: usize, end: usize) -> TextNode {
        TextNode {
            text: self.source[start..end].to_string(),
            span: self.line_index.source_span(Span::from_usize(start, end)),
        }
    }

    fn region_opener(&self, token: &Token) -> Option<RegionKind> {
        match token.kind {
            TokenKind::BlockCommentOpen => Some(RegionKind::MultiLineComment),
            TokenKind::Backtick => Some(RegionKind::BacktickString),
            TokenKind::Directive => match self.text(token.span) {
                "#text" => Some(RegionKind::Text),
                "#sql" => Some(RegionKind::Sql),
                _ => None,
            },
            _ => None,
        }
    }

    /// Consumes trailing whitespace and a line comment when nothing else
    /// follows them on the line. Returns the new end offset.
    fn absorb_line_tail(&mut self, mut end: usize) -> usize {
        let mut n = 0;
        while matches!(
            self.peek_kind(n),
            TokenKind::Whitespace | TokenKind::LineComment
        ) {
            n += 1;
        }
        if self.peek_kind(n).is_line_end() {
            for _ in 0..n {
                end = self.bump().span.end_usize();
            }
        }
        end
    }

    // === Nodes ===

    fn parse_node(&mut self) -> Option<Node> {
        let start = self.peek(0).span.start_usize();

        // Leading whitespace belongs to whatever follows it on the line
        let lead = usize::from(self.peek_kind(0) == TokenKind::Whitespace);
        let first = self.peek(lead).clone();

        match first.kind {
            TokenKind::Eof if lead == 0 => None,
            TokenKind::Newline if lead == 0 => {
                let token = self.bump();
                Some(Node::BreakLine(
                    self.text_node(token.span.start_usize(), token.span.end_usize()),
                ))
            }
            TokenKind::Newline | TokenKind::Eof => {
                // Whitespace-only remainder of a line
                self.bump();
                Some(Node::Statement(
                    self.text_node(start, first.span.start_usize()),
                ))
            }
            TokenKind::LineComment => {
                for _ in 0..=lead {
                    self.bump();
                }
                Some(Node::SingleLineComment(
                    self.text_node(start, first.span.end_usize()),
                ))
            }
            TokenKind::Import => Some(
                self.parse_import(start, lead)
                    .unwrap_or_else(|| self.parse_statement(start)),
            ),
            TokenKind::Directive if self.text(first.span) == "#include" => Some(
                self.parse_import(start, lead)
                    .unwrap_or_else(|| self.parse_statement(start)),
            ),
            _ => match self.region_opener(&first) {
                Some(kind) => Some(self.parse_region(start, kind, first)),
                None => Some(self.parse_statement(start)),
            },
        }
    }

    /// Parses code up to a `;`, the end of the line, or a region opener.
    fn parse_statement(&mut self, start: usize) -> Node {
        let mut end = start;
        loop {
            let token = self.peek(0).clone();
            match token.kind {
                TokenKind::Newline | TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.bump();
                    end = self.absorb_line_tail(token.span.end_usize());
                    break;
                }
                _ if end > start && self.region_opener(&token).is_some() => break,
                _ => {
                    self.bump();
                    end = token.span.end_usize();
                }
            }
        }
        Node::Statement(self.text_node(start, end))
    }

    /// Parses `import "path";` or `#include <path>`.
    ///
    /// Returns `None` without consuming anything when the tokens don't form an
    /// import; the caller then treats them as a statement.
    fn parse_import(&mut self, start: usize, lead: usize) -> Option<Node> {
        let keyword = self.peek(lead).clone();
        let mut n = lead + 1;
        if self.peek_kind(n) == TokenKind::Whitespace {
            n += 1;
        }
        let path = self.peek(n).clone();

        let (import_kind, href, path_end) = match (keyword.kind, path.kind) {
            (TokenKind::Import, TokenKind::Str) => (
                ImportKind::EsImport,
                unescape_href(strip_quotes(self.text(path.span))),
                path.span.end_usize(),
            ),
            (TokenKind::Directive, TokenKind::Str) => (
                ImportKind::Include,
                unescape_href(strip_quotes(self.text(path.span))),
                path.span.end_usize(),
            ),
            (TokenKind::Directive, TokenKind::LAngle) => {
                // The path runs to the closing `>` on the same line
                let after = path.span.end_usize();
                let line_end = self.source[after..]
                    .find('\n')
                    .map_or(self.source.len(), |i| after + i);
                match self.source[after..line_end].find('>') {
                    Some(close) => (
                        ImportKind::Include,
                        unescape_href(&self.source[after..after + close]),
                        after + close + 1,
                    ),
                    None => {
                        self.errors.push(ParseError::new(
                            ParseErrorKind::MalformedInclude {
                                message: "missing closing `>`".to_string(),
                            },
                            Span::from_usize(keyword.span.start_usize(), line_end),
                        ));
                        return None;
                    }
                }
            }
            (TokenKind::Directive, _) => {
                self.errors.push(ParseError::new(
                    ParseErrorKind::MalformedInclude {
                        message: format!("expected a path, found {}", path.kind.name()),
                    },
                    keyword.span,
                ));
                return None;
            }
            _ => return None,
        };

        self.seek(path_end);
        let mut end = path_end;
        let ws = usize::from(self.peek_kind(0) == TokenKind::Whitespace);
        if self.peek_kind(ws) == TokenKind::Semicolon {
            for _ in 0..=ws {
                end = self.bump().span.end_usize();
            }
        }
        let end = self.absorb_line_tail(end);

        let node = self.text_node(start, end);
        Some(Node::ModuleResolution(ImportNode {
            import_kind,
            href,
            text: node.text,
            span: node.span,
        }))
    }

    /// Parses a region whose opener is `opener`, starting at `start` (which
    /// may include leading whitespace).
    fn parse_region(&mut self, start: usize, kind: RegionKind, opener: Token) -> Node {
        let body_start = opener.span.end_usize();
        let rest = &self.source[body_start..];

        let (closer, expected) = match kind {
            RegionKind::MultiLineComment => (rest.find("*/").map(|i| (i, 2)), "*/"),
            RegionKind::BacktickString => (find_unescaped(rest, b'`').map(|i| (i, 1)), "`"),
            RegionKind::Text | RegionKind::Sql => {
                let (_, close) = kind.bracket_markers().unwrap_or(("", ""));
                (find_marker(rest, close).map(|i| (i, close.len())), close)
            }
        };

        let (end, close_start) = match closer {
            Some((i, len)) => (body_start + i + len, Some(body_start + i)),
            None => {
                self.errors.push(ParseError::new(
                    ParseErrorKind::UnterminatedRegion {
                        region: kind,
                        expected,
                    },
                    Span::from_usize(opener.span.start_usize(), self.source.len()),
                ));
                (self.source.len(), None)
            }
        };

        self.seek(end);

        let lines = self
            .region_cuts(start, end, kind, body_start, close_start)
            .windows(2)
            .map(|w| RegionLine {
                text: self.source[w[0]..w[1]].to_string(),
                span: self.line_index.source_span(Span::from_usize(w[0], w[1])),
            })
            .collect();

        let node = self.text_node(start, end);
        Node::Region(RegionNode {
            region_kind: kind,
            lines,
            terminated: close_start.is_some(),
            text: node.text,
            span: node.span,
        })
    }

    /// Computes the boundaries between region lines, `start` and `end` included.
    ///
    /// Every line is cut after its terminator. Bracket blocks additionally cut
    /// the open marker off trailing body text and the close marker off leading
    /// body text, so both markers always sit on a line of their own.
    fn region_cuts(
        &self,
        start: usize,
        end: usize,
        kind: RegionKind,
        opener_end: usize,
        close_start: Option<usize>,
    ) -> Vec<usize> {
        let mut cuts = vec![start];
        for (i, b) in self.source[start..end].bytes().enumerate() {
            if b == b'\n' && start + i + 1 < end {
                cuts.push(start + i + 1);
            }
        }

        if kind.bracket_markers().is_some() {
            let opener_line_end = self.source[opener_end..end]
                .find('\n')
                .map_or(end, |i| opener_end + i);
            if !is_blank(&self.source[opener_end..opener_line_end]) {
                cuts.push(opener_end);
            }

            if let Some(close) = close_start {
                let line_start = self.source[..close].rfind('\n').map_or(0, |i| i + 1);
                let prefix_start = line_start.max(opener_end);
                if !is_blank(&self.source[prefix_start..close]) {
                    cuts.push(close);
                }
            }
        }

        cuts.push(end);
        cuts.sort_unstable();
        cuts.dedup();
        cuts
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

fn strip_quotes(text: &str) -> &str {
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Collapses `\\`, `\'` and `\"` to the escaped character; other backslashes stay.
fn unescape_href(raw: &str) -> SmolStr {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, '\\' | '\'' | '"') {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    SmolStr::from(out)
}

/// Finds `target` not preceded by an odd run of backslashes.
fn find_unescaped(text: &str, target: u8) -> Option<usize> {
    let mut backslashes = 0usize;
    for (i, b) in text.bytes().enumerate() {
        if b == b'\\' {
            backslashes += 1;
            continue;
        }
        if b == target && backslashes % 2 == 0 {
            return Some(i);
        }
        backslashes = 0;
    }
    None
}

/// Finds a `#marker` that isn't the prefix of a longer name.
fn find_marker(text: &str, marker: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = text[from..].find(marker) {
        let at = from + i;
        let after = text[at + marker.len()..].chars().next();
        if !after.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Some(at);
        }
        from = at + marker.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_href() {
        assert_eq!(unescape_href(r"lib\\util.js"), "lib\\util.js");
        assert_eq!(unescape_href(r"lib\util.js"), "lib\\util.js");
        assert_eq!(unescape_href(r"it\'s.js"), "it's.js");
    }

    #[test]
    fn test_find_unescaped() {
        assert_eq!(find_unescaped(r"ab\`c`", b'`'), Some(5));
        assert_eq!(find_unescaped(r"ab\\`", b'`'), Some(4));
        assert_eq!(find_unescaped("abc", b'`'), None);
    }

    #[test]
    fn test_find_marker() {
        assert_eq!(find_marker("x #endtextual #endtext", "#endtext"), Some(14));
        assert_eq!(find_marker("#endtext_x", "#endtext"), None);
    }
}
