//! Whole-module tree-shaking.
//!
//! A [`ShakePolicy`] is asked about every import edge that would otherwise
//! expand a module for the first time. Irrelevant modules are replaced by a
//! `skippedByTreeShaking` marker and never parsed.

use std::fmt;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use smol_str::SmolStr;

use crate::path::ModuleId;

/// Decides whether an imported module belongs in the bundle.
pub trait ShakePolicy: fmt::Debug + Send + Sync {
    /// Returns true if `module`, whose text is `content`, should be inlined.
    fn is_relevant(&self, module: &ModuleId, content: &str) -> bool;
}

/// Keeps modules whose path matches a glob pattern or whose text mentions one
/// of a set of symbols.
#[derive(Debug, Clone)]
pub struct ModuleFilter {
    patterns: Vec<String>,
    globs: GlobSet,
    symbols: Vec<SmolStr>,
}

impl ModuleFilter {
    /// Builds a filter from path globs and symbol names.
    ///
    /// Globs are matched case-insensitively against the root-relative module
    /// path; symbols must appear as whole words in the module text.
    pub fn new<P, S>(patterns: P, symbols: S) -> Result<Self, globset::Error>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
            kept.push(pattern.to_string());
        }

        Ok(Self {
            patterns: kept,
            globs: builder.build()?,
            symbols: symbols
                .into_iter()
                .map(|s| SmolStr::from(s.as_ref()))
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    /// Returns true if the filter has no criteria at all.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.symbols.is_empty()
    }

    /// The glob patterns, as given.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// The symbol names.
    pub fn symbols(&self) -> &[SmolStr] {
        &self.symbols
    }
}

impl ShakePolicy for ModuleFilter {
    fn is_relevant(&self, module: &ModuleId, content: &str) -> bool {
        self.globs.is_match(module.display.as_str())
            || self.symbols.iter().any(|s| contains_word(content, s))
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Returns true if `word` occurs in `text` with no identifier characters
/// directly around it.
pub fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(i) = text[from..].find(word) {
        let start = from + i;
        let end = start + word.len();
        let before = start.checked_sub(1).map(|j| bytes[j]);
        let after = bytes.get(end).copied();
        if !before.is_some_and(is_word_byte) && !after.is_some_and(is_word_byte) {
            return true;
        }
        from = start + word.chars().next().map_or(1, char::len_utf8);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;

    fn id(path: &str) -> ModuleId {
        ModuleId::new(Utf8Path::new(path), Utf8Path::new("/p"))
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("function double(x) {}", "double"));
        assert!(contains_word("double", "double"));
        assert!(!contains_word("var doubled = 1;", "double"));
        assert!(!contains_word("var $double = 1;", "double"));
        assert!(contains_word("a.doubles; b.double", "double"));
        assert!(!contains_word("anything", ""));
    }

    #[test]
    fn test_symbol_filter() {
        let filter = ModuleFilter::new(Vec::<String>::new(), ["double"]).unwrap();
        assert!(filter.is_relevant(&id("/p/double.js"), "function double(x) {}"));
        assert!(!filter.is_relevant(&id("/p/sum.js"), "function sum(a, b) {}"));
    }

    #[test]
    fn test_glob_filter_ignores_case() {
        let filter = ModuleFilter::new(["lib/**/*.js"], Vec::<String>::new()).unwrap();
        assert!(filter.is_relevant(&id("/p/Lib/Util/A.js"), ""));
        assert!(!filter.is_relevant(&id("/p/main.js"), ""));
    }

    #[test]
    fn test_invalid_glob() {
        assert!(ModuleFilter::new(["lib/[a"], Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_empty_filter() {
        let filter = ModuleFilter::new(Vec::<String>::new(), [""]).unwrap();
        assert!(filter.is_empty());
        assert!(!filter.is_relevant(&id("/p/a.js"), "anything"));
    }
}
