//! Aitoonic Store - Implementations of the catalog data store.
//!
//! - [`SupabaseClient`] talks to the hosted service over its REST and auth APIs.
//! - [`MemoryStore`] is a test double that keeps everything in process, with
//!   call counters and failure injection.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod memory;
pub mod supabase;

pub use config::{ConfigError, StoreConfig};
pub use memory::MemoryStore;
pub use supabase::{SupabaseClient, SupabaseError};
