//! Dense retrieval: embedders, in-memory and `SQLite` vector indexes.

pub mod embedder;
pub mod memory_index;
pub mod sink;
pub mod sqlite_index;
pub mod sqlite_vec_loader;

pub use embedder::{EmbedFuture, Embedder, OllamaEmbedder, OllamaEmbeddingModel, ollama_embedding_model};
pub use memory_index::{InMemoryDenseIndex, cosine_similarity};
pub use sink::{DenseSink, SinkFuture};
pub use sqlite_index::SqliteDenseIndex;
pub use sqlite_vec_loader::register_sqlite_vec;
