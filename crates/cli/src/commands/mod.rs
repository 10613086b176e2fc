//! CLI command implementations.

pub mod categories;
pub mod seed;

use aitoonic_store::{StoreConfig, SupabaseClient};

/// Connect to the data store configured in the environment.
fn connect() -> Result<SupabaseClient, Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    if config.has_placeholder_key() {
        tracing::warn!("Data store anon key is a placeholder");
    }
    Ok(SupabaseClient::new(&config)?)
}
