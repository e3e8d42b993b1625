//! In-memory backend for the Predex exchange
//!
//! Implements every store trait over concurrent maps with versioned market
//! rows. Persistence across sessions belongs to the hosted backend; this
//! crate models its atomic-update contract for local runs and tests.

pub mod memory;
pub mod seed;

pub use memory::MemoryBackend;
pub use seed::seed_demo_markets;
