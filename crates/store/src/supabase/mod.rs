//! Client for the hosted data service (PostgREST data API + GoTrue auth API).

mod client;
mod error;
mod query;

pub use client::SupabaseClient;
pub use error::SupabaseError;
