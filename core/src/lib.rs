pub mod engine;
pub mod fuzzy;
pub mod index;
pub mod model;
pub mod persist;
pub mod proximity;
pub mod query;
pub mod snippet;
pub mod source;
pub mod stemmer;
pub mod suggest;
pub mod synonyms;
pub mod tokenizer;

pub use engine::{SearchConfig, SearchEngine, SearchItem, SearchResult};
pub use index::{DocId, DocMeta, InvertedIndex};
pub use model::VectorModel;
pub use query::Query;
pub use source::{DirectorySource, DocumentSource, Fingerprint, FixtureSource, SourceDocument};
pub use stemmer::StemCache;
pub use synonyms::Synonyms;
