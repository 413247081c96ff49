//! HTML serialization boundary.
//!
//! The document serializes to a structure-preserving fragment — block
//! kinds map to structural tags, marks to inline tags, alignment to a
//! style attribute — and a fragment reader turns such markup back into
//! blocks for seeding an editor. The conversion is lossless with
//! respect to the document model: serialize-then-reparse preserves
//! block structure, marks and alignment.

mod parse;
mod serialize;

pub use parse::parse_fragment;
pub use serialize::to_html;

/// Error raised when a seed fragment cannot be read.
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("malformed fragment: {0}")]
    Malformed(String),
}
