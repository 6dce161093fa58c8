pub mod cleaner;
pub mod document;

pub use cleaner::FragmentCleaner;
pub use document::{MarkupDocument, compile, element_attr, element_text, inner_html, raw_text};
