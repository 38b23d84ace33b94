//! Common data structures for Quill.
//!
//! - `Span`: byte range of a token or node in the template source
//! - `BytePos`: a single byte offset

mod span;

pub use span::{BytePos, Span};
