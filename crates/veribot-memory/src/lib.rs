pub mod chatmemory;
pub mod db;
pub mod documents;
pub mod error;
pub mod query_cache;
pub mod types;
pub mod vector;

pub use chatmemory::ChatMemory;
pub use documents::DocumentStore;
pub use error::{MemoryError, Result};
pub use query_cache::QueryCache;
pub use types::{CachedQuery, ChatMessage, ChatRole, DocumentChunk, ScoredChunk};
