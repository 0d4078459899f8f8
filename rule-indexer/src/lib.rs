//! Rule-text indexing: headings → chunks.
//!
//! Reference books describe each planet/house combination under a heading
//! like `Sun in 1st House`. This crate locates those headings
//! ([`headings::HeadingMatcher`]) and partitions the document into one
//! contiguous chunk per heading ([`chunker::extract_chunks`]), ready for
//! embedding and upsert into the rule store.

mod chunker;
mod errors;
mod headings;
mod loader;

pub use chunker::{Chunk, ChunkStats, extract_chunks};
pub use errors::IndexError;
pub use headings::{HeadingMatcher, HeadingOccurrence};
pub use loader::load_text;
