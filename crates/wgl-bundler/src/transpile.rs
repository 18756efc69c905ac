//! Text rewrites from WGLScript syntax to plain JavaScript.
//!
//! Both rewrites work on a single node's text and return it unchanged (and
//! unallocated) when their trigger is absent.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `<expr>.Param(<args>) = <value>;` with an optional trailing line comment.
///
/// The value must not start with `=`, so comparisons never match.
static PARAM_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<indent>\s*)(?P<expr>\S.*?)\.Param\((?P<args>.*)\)\s*=\s*(?P<value>[^=\s].*?)\s*;(?P<trail>\s*(?://.*)?)$",
    )
    .expect("param assignment regex")
});

/// Rewrites a `Param` property assignment into an `AddParam` call.
///
/// ```
/// use wgl_bundler::transpile::rewrite_statement;
///
/// assert_eq!(
///     rewrite_statement(r#"tp.Param("ViewList") = "Books"; // comment"#),
///     r#"tp.AddParam("ViewList", "Books"); // comment"#
/// );
/// ```
pub fn rewrite_statement(text: &str) -> Cow<'_, str> {
    if !text.contains(".Param(") {
        return Cow::Borrowed(text);
    }
    PARAM_ASSIGNMENT.replace(text, |caps: &Captures<'_>| {
        let args = caps["args"].trim();
        let call = if args.is_empty() {
            format!("AddParam({})", &caps["value"])
        } else {
            format!("AddParam({}, {})", args, &caps["value"])
        };
        format!(
            "{}{}.{};{}",
            &caps["indent"], &caps["expr"], call, &caps["trail"]
        )
    })
}

/// Rewrites a bare `#text`/`#sql` line to an opening backtick and a bare
/// `#endtext`/`#endsql` line to a closing backtick and `;`.
///
/// Indentation and the line terminator are kept.
pub fn rewrite_region_line(line: &str) -> Cow<'_, str> {
    let body = line.trim_end_matches(['\r', '\n']);
    let terminator = &line[body.len()..];

    let replacement = match body.trim() {
        "#text" | "#sql" => "`",
        "#endtext" | "#endsql" => "`;",
        _ => return Cow::Borrowed(line),
    };

    let indent = &body[..body.len() - body.trim_start().len()];
    Cow::Owned(format!("{indent}{replacement}{terminator}"))
}
