//! Melodora embedding formats
//!
//! Fixed-size audio embeddings, their zero-padded storage form, and the
//! textual encodings used when reading from or writing to the table store.

pub mod format;
pub mod reader;
pub mod writer;

pub use format::{EmbeddingError, EmbeddingVector, PaddedEmbedding, EMBEDDING_DIM, PADDED_DIM};
pub use reader::{decode_stored, from_stored_values, parse_values};
pub use writer::to_json_text;
