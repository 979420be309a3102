//! Local-first journal entry store library
//!
//! This library provides durable key-value persistence of journal entries
//! over a primary asynchronous store with a synchronous fallback mirror,
//! plus derived read operations (listing, date-range filtering, substring
//! search) and identity generation.

mod backend;
mod cli;
mod clock;
mod config;
mod entry;
mod errors;
mod failover;
mod store;
mod types;

// Re-export key components
pub use backend::*;
pub use cli::*;
pub use clock::*;
pub use config::*;
pub use entry::*;
pub use errors::*;
pub use failover::*;
pub use store::*;
pub use types::*;
