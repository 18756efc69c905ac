//! Path normalization and module identity.
//!
//! Module paths arrive in whatever shape the author wrote them: `/` or `\`
//! separated, relative to the importer or to the project root, in any case.
//! Everything here is lexical; nothing touches the file system.

use std::fmt;
use std::hash::{Hash, Hasher};

use camino::{Utf8Path, Utf8PathBuf};
use smol_str::SmolStr;

fn is_separator(b: u8) -> bool {
    b == b'/' || b == b'\\'
}

/// Replaces every `\` with `/`.
pub fn unify_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Removes `.` segments and resolves `..` segments lexically.
///
/// Expects `/` separators. A leading `/` is kept; `..` segments that climb
/// above the start of a relative path are kept as well.
pub fn clean(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if !absolute => parts.push(".."),
                _ => {}
            },
            part => parts.push(part),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Returns the part of `path` after `root`, if `path` lives under `root`.
///
/// The comparison ignores ASCII case and treats `/` and `\` as equal.
fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let root = root.trim_end_matches(['/', '\\']);
    if root.is_empty() {
        return None;
    }
    let head = path.get(..root.len())?;
    let same = head
        .bytes()
        .zip(root.bytes())
        .all(|(a, b)| a.eq_ignore_ascii_case(&b) || (is_separator(a) && is_separator(b)));
    if !same {
        return None;
    }
    let rest = &path[root.len()..];
    (rest.is_empty() || rest.starts_with(['/', '\\'])).then_some(rest)
}

/// Makes `file_path` relative to `project_root`.
///
/// Removes the root prefix when present and strips leading separators. The
/// remainder keeps the separators and case it was given with.
pub fn normalize(file_path: &str, project_root: &str) -> String {
    let rest = strip_root(file_path, project_root).unwrap_or(file_path);
    rest.trim_start_matches(['/', '\\']).to_string()
}

/// Turns a normalized path into a module identity key: `/` separators, no
/// repeated separators, lower case.
pub fn module_key(normalized: &str) -> SmolStr {
    let unified = unify_separators(normalized);
    let mut key = String::with_capacity(unified.len());
    let mut last_was_separator = false;
    for c in unified.chars() {
        if c == '/' {
            if last_was_separator {
                continue;
            }
            last_was_separator = true;
        } else {
            last_was_separator = false;
        }
        key.extend(c.to_lowercase());
    }
    SmolStr::from(key)
}

/// Joins a root-relative path onto the project root.
pub fn join_root(project_root: &Utf8Path, relative: &str) -> Utf8PathBuf {
    let root = unify_separators(project_root.as_str());
    let relative = unify_separators(relative);
    if strip_root(&relative, &root).is_some() {
        return Utf8PathBuf::from(clean(&relative));
    }
    let joined = format!(
        "{}/{}",
        root.trim_end_matches('/'),
        relative.trim_start_matches('/')
    );
    Utf8PathBuf::from(clean(&joined))
}

/// Resolves an import `href` written in `importer` to a file path.
///
/// Hrefs starting with `.` are relative to the importer's directory; all
/// others are relative to the project root, whether or not they start with a
/// separator. Hrefs that already spell out the project root are kept.
pub fn resolve_href(href: &str, importer: &Utf8Path, project_root: &Utf8Path) -> Utf8PathBuf {
    let href = unify_separators(href);
    if !href.starts_with('.') {
        return join_root(project_root, &href);
    }

    let importer = unify_separators(importer.as_str());
    let joined = match importer.rfind('/') {
        Some(slash) => format!("{}/{}", &importer[..slash], href),
        None => href,
    };
    Utf8PathBuf::from(clean(&joined))
}

/// Cleans a caller-supplied file path into the form used for reads.
pub fn clean_path(path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(clean(&unify_separators(path.as_str())))
}

/// The identity of a module within one project.
///
/// `display` is the root-relative path with `/` separators and the original
/// case; it is what markers and source maps show. `key` is the
/// case-insensitive identity; two ids are equal when their keys are.
#[derive(Debug, Clone)]
pub struct ModuleId {
    /// Root-relative path as written.
    pub display: SmolStr,
    /// Lower-cased identity key.
    pub key: SmolStr,
}

impl ModuleId {
    /// Computes the id of `path` under `project_root`.
    pub fn new(path: &Utf8Path, project_root: &Utf8Path) -> Self {
        let display = unify_separators(&normalize(path.as_str(), project_root.as_str()));
        let key = module_key(&display);
        Self {
            display: SmolStr::from(display),
            key,
        }
    }
}

impl PartialEq for ModuleId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ModuleId {}

impl Hash for ModuleId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}
