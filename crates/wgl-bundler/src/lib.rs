//! WGLScript bundler.
//!
//! This crate inlines a WGLScript entry file and everything it imports into a
//! single JavaScript-compatible text, together with a source map pointing
//! every fragment back to the module, line and column it came from:
//! - Path normalization and case-insensitive module identity
//! - Recursive import expansion with cycle and duplicate detection
//! - The `#text`/`#sql` and `.Param(...) = value` rewrites
//! - Optional whole-module tree-shaking
//!
//! # Example
//!
//! ```
//! use camino::Utf8Path;
//! use wgl_bundler::{Bundler, CompileOptions, MemoryFiles};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let files = MemoryFiles::new()
//!     .with_file("/app/main.js", "import \"util.js\";\nhelper();\n")
//!     .with_file("/app/util.js", "function helper() {}\n");
//!
//! let bundler = Bundler::new(files);
//! let bundle = bundler
//!     .bundle(Utf8Path::new("/app/main.js"), &CompileOptions::new("/app"))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(
//!     bundle.code,
//!     "/* @@resolved util.js from main.js */\nfunction helper() {}\nhelper();"
//! );
//! # });
//! ```

mod compose;
mod error;
mod files;
mod fragment;
pub mod path;
mod resolver;
mod shaking;
pub mod transpile;

pub use compose::{compose, Composed};
pub use error::BundleError;
pub use files::{DiskFiles, FileAccess, MemoryFiles};
pub use fragment::{Fragment, ImportFragment, ImportOutcome, Origin};
pub use path::ModuleId;
pub use resolver::{Bundle, Bundler, CompileOptions, ModuleSet};
pub use shaking::{contains_word, ModuleFilter, ShakePolicy};
