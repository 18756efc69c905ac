//! Project configuration loading.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;

/// Name of the project configuration file at the workspace root.
pub const CONFIG_FILE: &str = "wglscript.json";

/// Errors loading the project configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("invalid {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// WGLScript project configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Script attached ahead of every entry, relative to the workspace.
    #[serde(default)]
    pub global_script: Option<Utf8PathBuf>,

    /// File extensions treated as entries by `--all`.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns excluded from entry discovery.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Tree-shaking criteria.
    #[serde(default)]
    pub tree_shaking: TreeShakingConfig,
}

/// Tree-shaking criteria.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeShakingConfig {
    /// Module path globs to keep.
    #[serde(default)]
    pub modules: Vec<String>,

    /// Symbols whose defining modules are kept.
    #[serde(default)]
    pub symbols: Vec<String>,
}

impl TreeShakingConfig {
    /// Returns true if no criteria are configured.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.symbols.is_empty()
    }
}

impl ProjectConfig {
    /// Loads configuration from a file. Comments are allowed.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Parses configuration text.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&strip_json_comments(content))
    }

    /// Finds and loads the configuration file in a workspace.
    ///
    /// Returns `Ok(None)` if the workspace has no configuration file.
    pub fn find(workspace: &Utf8Path) -> Result<Option<(Utf8PathBuf, Self)>, ConfigError> {
        let path = workspace.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let config = Self::load(&path)?;
        Ok(Some((path, config)))
    }

    /// Returns the file extensions used for entry discovery.
    pub fn file_extensions(&self) -> Vec<&str> {
        if self.extensions.is_empty() {
            vec![".js", ".wgl"]
        } else {
            self.extensions.iter().map(|s| s.as_str()).collect()
        }
    }
}

/// Removes `//` and `/* */` comments outside of string literals.
fn strip_json_comments(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '"' => in_string = false,
                '\\' => out.extend(chars.next()),
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                while chars.peek().is_some_and(|&next| next != '\n') {
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut last = '\0';
                for next in chars.by_ref() {
                    if last == '*' && next == '/' {
                        break;
                    }
                    last = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}
