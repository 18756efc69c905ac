//! CLI argument parsing.

use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

use crate::logging::{LogFormat, LogLevel};

/// Bundle WGLScript entry files into single source-mapped scripts.
#[derive(Debug, Parser)]
#[command(name = "wgl-bundle")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Entry files, relative to the workspace
    pub entries: Vec<Utf8PathBuf>,

    /// Project root; root-relative imports resolve against it
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Bundle every script under the workspace
    #[arg(long)]
    pub all: bool,

    /// Glob patterns to ignore when discovering entries
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Tree-shake: keep only imported modules whose path matches (repeatable)
    #[arg(long = "tree-shake", value_name = "GLOB")]
    pub tree_shake: Vec<String>,

    /// Tree-shake: keep imported modules mentioning this symbol (repeatable)
    #[arg(long = "keep-symbol", value_name = "NAME")]
    pub keep_symbol: Vec<String>,

    /// Script attached ahead of every entry
    #[arg(long = "global-script", conflicts_with = "no_global_script")]
    pub global_script: Option<Utf8PathBuf>,

    /// Don't attach the global script
    #[arg(long = "no-global-script")]
    pub no_global_script: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Write `<name>.bundle.js` and its source map here instead of printing code
    #[arg(long = "out-dir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Map a bundled position (1-based) back to its source
    #[arg(long, value_name = "LINE:COL")]
    pub locate: Option<Location>,

    /// Log level (overridden by WGL_BUNDLE_LOG)
    #[arg(long = "log-level", value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long = "log-format", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

impl Args {
    /// Returns true if tree-shaking was requested on the command line.
    pub fn tree_shaking_requested(&self) -> bool {
        !self.tree_shake.is_empty() || !self.keep_symbol.is_empty()
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Bundled code, one block per entry (default)
    #[default]
    Text,
    /// One JSON array of bundle reports
    Json,
}

/// A 1-based line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column.
    pub column: u32,
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, column) = s
            .split_once(':')
            .ok_or_else(|| format!("expected LINE:COL, got `{s}`"))?;
        let parse = |part: &str| match part.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("`{part}` is not a positive number")),
        };
        Ok(Self {
            line: parse(line)?,
            column: parse(column)?,
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["wgl-bundle"]);
        assert_eq!(args.workspace.as_str(), ".");
        assert!(args.entries.is_empty());
        assert!(matches!(args.output, OutputFormat::Text));
        assert_eq!(args.log_level, LogLevel::Warn);
        assert!(!args.tree_shaking_requested());
    }

    #[test]
    fn test_entries_and_workspace() {
        let args = Args::parse_from([
            "wgl-bundle",
            "--workspace",
            "/path/to/project",
            "pages/a.js",
            "pages/b.js",
        ]);
        assert_eq!(args.workspace.as_str(), "/path/to/project");
        assert_eq!(args.entries, vec!["pages/a.js", "pages/b.js"]);
    }

    #[test]
    fn test_tree_shaking_flags() {
        let args = Args::parse_from([
            "wgl-bundle",
            "--tree-shake",
            "lib/**",
            "--keep-symbol",
            "double",
            "--keep-symbol",
            "sum",
        ]);
        assert_eq!(args.tree_shake, vec!["lib/**"]);
        assert_eq!(args.keep_symbol, vec!["double", "sum"]);
        assert!(args.tree_shaking_requested());
    }

    #[test]
    fn test_global_script_flags_conflict() {
        let result = Args::try_parse_from([
            "wgl-bundle",
            "--global-script",
            "g.js",
            "--no-global-script",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_and_logging() {
        let args = Args::parse_from([
            "wgl-bundle",
            "--output",
            "json",
            "--log-level",
            "debug",
            "--log-format",
            "json",
        ]);
        assert!(matches!(args.output, OutputFormat::Json));
        assert_eq!(args.log_level, LogLevel::Debug);
        assert_eq!(args.log_format, LogFormat::Json);
    }

    #[test]
    fn test_locate() {
        let args = Args::parse_from(["wgl-bundle", "--locate", "12:5"]);
        assert_eq!(args.locate, Some(Location { line: 12, column: 5 }));
        assert!(Args::try_parse_from(["wgl-bundle", "--locate", "0:5"]).is_err());
        assert!(Args::try_parse_from(["wgl-bundle", "--locate", "12"]).is_err());
    }
}
