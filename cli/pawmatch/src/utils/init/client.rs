use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use pawmatch_client::{CredentialSource, DogClient, DogClientConfig};
use pawmatch_sdk::providers::catalog::{Client, MockClient, PAWMATCH_MOCK_DATA_VAR};
use tracing::debug;

use crate::config::Config;

/// Initialize the dog API client
///
/// - Initialize a mock client if `$_PAWMATCH_MOCK_DATA` points to a mock catalog file
/// - Initialize an HTTP client reading its credential from `credentials` otherwise
pub fn init_client(config: &Config, credentials: Arc<dyn CredentialSource>) -> Result<Client> {
    if let Ok(path_str) = std::env::var(PAWMATCH_MOCK_DATA_VAR) {
        let path = PathBuf::from(path_str);
        if !path.exists() {
            bail!("path to mock data file doesn't exist: {}", path.display());
        }

        debug!(mock_data_path = %path.display(), "using mock dog client");
        return Ok(MockClient::from_path(&path)
            .context("could not load mock data")?
            .into());
    }

    let client_config = DogClientConfig {
        user_agent: config.pawmatch.user_agent.clone(),
        ..DogClientConfig::new(config.pawmatch.api_url())
    };

    debug!(url = %client_config.base_url, "using dog client");
    Ok(DogClient::new(client_config, credentials)?.into())
}
