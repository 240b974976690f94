//! Markdown helpers for rendering assistant replies
//!
//! Only fenced code blocks are recognised; everything else is prose.

mod escape;
mod fence;

pub use escape::{escape_html, escape_html_attribute};
pub use fence::{extract, CodeBlock, Extraction, Segment, DEFAULT_LANGUAGE};
