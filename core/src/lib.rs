//! In-memory package index: stores crawled package records and answers
//! path, term, import, project and hierarchy lookups under concurrent access.

pub mod error;
pub mod fields;
mod hierarchy;
pub mod index;
pub mod load;
pub mod package;
pub mod posting;
pub mod query;
pub mod store;
pub mod tokenizer;

/// Identifier assigned to an import path by the document store. Allocated
/// monotonically and never handed out twice within one process.
pub type DocId = u64;

pub use error::{IndexError, Result};
pub use index::{Index, IndexStats};
pub use package::Package;
pub use posting::PostingList;
pub use query::{Query, SortMode};
pub use tokenizer::{StemmingTokenizer, Tokenizer, WordTokenizer};
