//! Source position tracking and mapping for the WGLScript bundler.
//!
//! This crate provides utilities for tracking source positions through
//! bundling, so that positions in the flattened output can be mapped back to
//! the original file, line and column they came from (and the other way round).

mod builder;
mod line_index;
mod span;
mod vlq;

pub use builder::{Mapping, OriginalPosition, SourceMap, SourceMapBuilder};
pub use line_index::{LineCol, LineIndex};
pub use span::{ByteOffset, Position, SourceSpan, Span};
