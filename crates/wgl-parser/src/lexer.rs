//! WGLScript lexer using logos.
//!
//! The lexer only distinguishes what the node parser needs to find
//! statement boundaries and region openers:
//! - whitespace, line terminators and `//` comments
//! - region openers (`/*`, backticks, `#text`, `#sql`)
//! - `import`, `#include`, quoted strings and angle brackets
//! - regex literals, so quotes and backticks inside them stay opaque
//! - everything else as words and punctuation
//!
//! Region bodies are never lexed; the parser scans them on the raw text and
//! restarts the lexer after them with [`Lexer::new_at`].

use logos::Logos;
use source_map::Span;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span of the token in the source.
    pub span: Span,
}

/// Token kinds for WGLScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
pub enum TokenKind {
    /// Spaces, tabs, form feeds and lone carriage returns
    #[regex(r"[ \t\r\x0C]+")]
    Whitespace,

    /// `\n` or `\r\n`
    #[regex(r"\r?\n")]
    Newline,

    /// `// ...` up to the end of the line
    #[regex(r"//[^\r\n]*", allow_greedy = true)]
    LineComment,

    /// `/*`
    #[token("/*")]
    BlockCommentOpen,

    /// `/`
    #[token("/")]
    Slash,

    /// `` ` ``
    #[token("`")]
    Backtick,

    /// `#` followed by a name, e.g. `#include`, `#text`
    #[regex(r"#[A-Za-z_][A-Za-z0-9_]*")]
    Directive,

    /// A lone `#`
    #[token("#")]
    Hash,

    /// `import`
    #[token("import")]
    Import,

    /// A single- or double-quoted string on one line
    #[regex(r#""([^"\\\r\n]|\\.)*""#)]
    #[regex(r"'([^'\\\r\n]|\\.)*'")]
    Str,

    /// `<`
    #[token("<")]
    LAngle,

    /// `>`
    #[token(">")]
    RAngle,

    /// `;`
    #[token(";")]
    Semicolon,

    /// Identifiers, keywords and numbers
    #[regex(r"[A-Za-z0-9_$]+")]
    Word,

    /// Runs of any other punctuation
    #[regex(r#"[^\sA-Za-z0-9_$;<>`#'"/]+"#)]
    Punct,

    /// `/pattern/flags`, recognised by [`Lexer`] where an operand is expected
    RegexLiteral,

    /// End of file
    Eof,

    /// Invalid/unknown token (e.g. an unterminated string)
    #[default]
    Error,
}

impl TokenKind {
    /// Returns true for tokens that end a line.
    pub fn is_line_end(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Eof)
    }

    /// Returns a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::Newline => "newline",
            TokenKind::LineComment => "line comment",
            TokenKind::BlockCommentOpen => "'/*'",
            TokenKind::Slash => "'/'",
            TokenKind::Backtick => "'`'",
            TokenKind::Directive => "directive",
            TokenKind::Hash => "'#'",
            TokenKind::Import => "'import'",
            TokenKind::Str => "string",
            TokenKind::LAngle => "'<'",
            TokenKind::RAngle => "'>'",
            TokenKind::Semicolon => "';'",
            TokenKind::Word => "word",
            TokenKind::Punct => "punctuation",
            TokenKind::RegexLiteral => "regular expression",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }
}

/// A lexer for WGLScript source code.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    /// Offset of the lexed slice within `source`.
    base: usize,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self::new_at(source, 0)
    }

    /// Creates a lexer that starts at byte `offset` of `source`.
    ///
    /// Token spans stay relative to the whole of `source`.
    pub fn new_at(source: &'src str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        Self {
            inner: TokenKind::lexer(&source[offset..]),
            source,
            base: offset,
            finished: false,
        }
    }

    /// Returns the source string being lexed.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Returns the text of the current token.
    pub fn slice(&self) -> &'src str {
        self.inner.slice()
    }

    fn span(&self) -> Span {
        let span = self.inner.span();
        Span::from_usize(self.base + span.start, self.base + span.end)
    }

    /// Returns true if a `/` at `offset` starts a regex literal rather than
    /// dividing, judged by what precedes it on the line.
    fn regex_allowed(&self, offset: usize) -> bool {
        let before = self.source[..offset].trim_end_matches(|c| c == ' ' || c == '\t');
        let Some(last) = before.chars().next_back() else {
            return true;
        };
        if is_ident_char(last) {
            let word_start = before
                .char_indices()
                .rev()
                .take_while(|&(_, c)| is_ident_char(c))
                .last()
                .map_or(before.len(), |(i, _)| i);
            return REGEX_KEYWORDS.contains(&&before[word_start..]);
        }
        !matches!(last, ')' | ']' | '"' | '\'' | '`' | '/')
    }

    /// Extends the `/` token `slash` over a regex literal on the same line.
    /// Returns `slash` unchanged if the literal is not closed.
    fn regex_literal(&mut self, slash: Token) -> Token {
        let body_start = slash.span.end_usize();
        let rest = &self.source[body_start..];

        let mut in_class = false;
        let mut escaped = false;
        let mut close = None;
        for (i, b) in rest.bytes().enumerate() {
            match b {
                b'\n' | b'\r' => break,
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => {
                    close = Some(i);
                    break;
                }
                _ => {}
            }
        }

        let Some(close) = close else {
            return slash;
        };
        let flags = rest[close + 1..]
            .bytes()
            .take_while(u8::is_ascii_alphabetic)
            .count();
        let len = close + 1 + flags;
        self.inner.bump(len);
        Token {
            kind: TokenKind::RegexLiteral,
            span: Span::from_usize(slash.span.start_usize(), body_start + len),
        }
    }
}

/// Keywords after which `/` starts a regex literal.
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(Ok(TokenKind::Slash)) => {
                let slash = Token {
                    kind: TokenKind::Slash,
                    span: self.span(),
                };
                if self.regex_allowed(slash.span.start_usize()) {
                    Some(self.regex_literal(slash))
                } else {
                    Some(slash)
                }
            }
            Some(Ok(kind)) => Some(Token {
                kind,
                span: self.span(),
            }),
            Some(Err(())) => Some(Token {
                kind: TokenKind::Error,
                span: self.span(),
            }),
            None => {
                self.finished = true;
                Some(Token {
                    kind: TokenKind::Eof,
                    span: Span::empty(source_map::ByteOffset::from(self.source.len() as u32)),
                })
            }
        }
    }
}
