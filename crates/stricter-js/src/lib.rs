//! # stricter-js
//!
//! Tree-sitter based import extraction for JavaScript and TypeScript.
//!
//! Register the extractors with a graph builder:
//!
//! ```ignore
//! let graph = stricter_js::register(GraphBuilder::new("./src")).build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extractor;

pub use extractor::TreeSitterExtractor;

use stricter_core::{ExtractorBox, GraphBuilder};

/// All extractors of this crate.
#[must_use]
pub fn extractors() -> Vec<ExtractorBox> {
    vec![
        Box::new(TreeSitterExtractor::javascript()),
        Box::new(TreeSitterExtractor::typescript()),
        Box::new(TreeSitterExtractor::tsx()),
    ]
}

/// Registers every extractor of this crate with `builder`.
#[must_use]
pub fn register(builder: GraphBuilder) -> GraphBuilder {
    extractors()
        .into_iter()
        .fold(builder, GraphBuilder::extractor_box)
}
