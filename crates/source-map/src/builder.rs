//! Source map builder for tracking position mappings while output is composed.

use crate::LineCol;

/// A single mapping from a generated position to an original position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// The position in the generated output.
    pub generated: LineCol,
    /// Index into [`SourceMap::sources`].
    pub source: u32,
    /// The position in the original source.
    pub original: LineCol,
}

/// An original position resolved through a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalPosition<'a> {
    /// Name of the originating source.
    pub source: &'a str,
    /// Position inside that source.
    pub position: LineCol,
}

/// A source map that tracks position mappings from generated code back to
/// one or more original sources.
///
/// All coordinates are 0-indexed.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    /// Names of the original sources, in first-mapped order.
    sources: Vec<String>,
    /// List of mappings, sorted by generated position.
    mappings: Vec<Mapping>,
}

impl SourceMap {
    /// Creates a new empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of mappings in this source map.
    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if this source map has no mappings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Returns the original source names.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Returns an iterator over all mappings.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Finds the original position corresponding to a generated position.
    ///
    /// The nearest mapping at or before `generated` on the same generated line
    /// is used; the column distance from it is carried over to the original.
    /// Returns `None` if the line has no mapping at or before the column.
    pub fn original_position(&self, generated: LineCol) -> Option<OriginalPosition<'_>> {
        let idx = match self
            .mappings
            .binary_search_by(|m| m.generated.cmp(&generated))
        {
            Ok(idx) => idx,
            Err(0) => return None,
            Err(idx) => idx - 1,
        };

        let mapping = self.mappings.get(idx)?;
        if mapping.generated.line != generated.line {
            return None;
        }

        let delta = generated.col - mapping.generated.col;
        Some(OriginalPosition {
            source: self.sources.get(mapping.source as usize)?,
            position: LineCol::new(mapping.original.line, mapping.original.col + delta),
        })
    }

    /// Finds the generated position corresponding to an original position.
    ///
    /// Returns `None` if nothing on that original line was mapped.
    pub fn generated_position(&self, source: &str, original: LineCol) -> Option<LineCol> {
        let source_idx = self.sources.iter().position(|s| s == source)? as u32;

        // Linear search since mappings are sorted by generated position
        let mut best: Option<&Mapping> = None;
        for mapping in &self.mappings {
            if mapping.source != source_idx
                || mapping.original.line != original.line
                || mapping.original.col > original.col
            {
                continue;
            }
            if best.map_or(true, |b| mapping.original.col > b.original.col) {
                best = Some(mapping);
            }
        }

        best.map(|m| {
            LineCol::new(
                m.generated.line,
                m.generated.col + (original.col - m.original.col),
            )
        })
    }

    /// Serializes the map as a revision 3 source map.
    #[cfg(feature = "serde")]
    pub fn to_json(&self, file: Option<&str>) -> String {
        #[derive(serde::Serialize)]
        struct RawSourceMap<'a> {
            version: u32,
            #[serde(skip_serializing_if = "Option::is_none")]
            file: Option<&'a str>,
            sources: &'a [String],
            names: [&'a str; 0],
            mappings: String,
        }

        let raw = RawSourceMap {
            version: 3,
            file,
            sources: &self.sources,
            names: [],
            mappings: self.encoded_mappings(),
        };
        serde_json::to_string(&raw).unwrap_or_default()
    }

    /// Encodes the mappings in the base64 VLQ `mappings` field format.
    pub fn encoded_mappings(&self) -> String {
        let mut out = String::new();
        let mut line = 0u32;
        let mut prev_gen_col = 0i64;
        let mut prev_source = 0i64;
        let mut prev_orig_line = 0i64;
        let mut prev_orig_col = 0i64;
        let mut first_in_line = true;

        for mapping in &self.mappings {
            while line < mapping.generated.line {
                out.push(';');
                line += 1;
                prev_gen_col = 0;
                first_in_line = true;
            }
            if !first_in_line {
                out.push(',');
            }
            first_in_line = false;

            let gen_col = i64::from(mapping.generated.col);
            let source = i64::from(mapping.source);
            let orig_line = i64::from(mapping.original.line);
            let orig_col = i64::from(mapping.original.col);

            crate::vlq::encode(gen_col - prev_gen_col, &mut out);
            crate::vlq::encode(source - prev_source, &mut out);
            crate::vlq::encode(orig_line - prev_orig_line, &mut out);
            crate::vlq::encode(orig_col - prev_orig_col, &mut out);

            prev_gen_col = gen_col;
            prev_source = source;
            prev_orig_line = orig_line;
            prev_orig_col = orig_col;
        }

        out
    }
}

/// A builder for constructing source maps while output text is appended.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    sources: Vec<String>,
    mappings: Vec<Mapping>,
    /// Current position in the generated output.
    generated: LineCol,
}

impl SourceMapBuilder {
    /// Creates a new source map builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generated position.
    #[inline]
    pub fn generated_position(&self) -> LineCol {
        self.generated
    }

    /// Registers a source name, returning its index. Registering the same name
    /// twice returns the same index.
    pub fn add_source(&mut self, name: &str) -> u32 {
        if let Some(idx) = self.sources.iter().position(|s| s == name) {
            return idx as u32;
        }
        self.sources.push(name.to_string());
        (self.sources.len() - 1) as u32
    }

    /// Adds a mapping from the current generated position to `original` in `source`.
    pub fn add_mapping(&mut self, source: &str, original: LineCol) {
        let source = self.add_source(source);
        self.mappings.push(Mapping {
            generated: self.generated,
            source,
            original,
        });
    }

    /// Adds text that originates at `original` in `source`.
    ///
    /// One mapping is recorded at the start of the text. Empty text records nothing.
    pub fn add_mapped(&mut self, source: &str, original: LineCol, text: &str) {
        if text.is_empty() {
            return;
        }
        self.add_mapping(source, original);
        self.add_generated(text);
    }

    /// Adds generated text without a corresponding original position.
    pub fn add_generated(&mut self, text: &str) {
        for b in text.bytes() {
            if b == b'\n' {
                self.generated.line += 1;
                self.generated.col = 0;
            } else {
                self.generated.col += 1;
            }
        }
    }

    /// Builds the final source map.
    pub fn build(mut self) -> SourceMap {
        // Stable: equal generated positions keep insertion order
        self.mappings.sort_by_key(|m| m.generated);
        SourceMap {
            sources: self.sources,
            mappings: self.mappings,
        }
    }
}
