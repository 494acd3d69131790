//! # quill-store
//!
//! Similarity search over previously indexed content.
//!
//! The consistency reviewer uses [`ConsistencyLookup`] to find existing items
//! that the new content might duplicate or contradict. [`MemoryStore`] is a
//! brute-force cosine index persisted as a JSON snapshot; anything implementing
//! [`ConsistencyStore`] can stand in for it.

mod lookup;
mod memory;
mod policies;
mod store;

pub use lookup::{format_context, ConsistencyLookup, NO_MATCHES};
pub use memory::{cosine_similarity, MemoryStore, StoredItem};
pub use policies::{seed_policies, ExternalPolicy, EXTERNAL_POLICIES};
pub use store::{ConsistencyStore, SimilarItem};
