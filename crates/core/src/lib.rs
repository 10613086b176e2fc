//! Aitoonic Core - Shared catalog types and the data store contract.
//!
//! This crate is used by every Aitoonic component:
//! - `site` - Public category browser
//! - `admin` - Authenticated catalog dashboard
//! - `cli` - Operator tooling (summary, seeding)
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no HTTP clients and no
//! persistence. Concrete stores live in `aitoonic-store`.
//!
//! # Modules
//!
//! - [`types`] - Ids, catalog records, entity kinds, SEO limits, slugs
//! - [`draft`] - Editable drafts, validation and save payloads
//! - [`store`] - The [`DataStore`](store::DataStore) trait and its query, session and error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod draft;
pub mod store;
pub mod types;

pub use draft::{Draft, Payload, ValidationError};
pub use store::{DataStore, StoreError};
pub use types::*;
