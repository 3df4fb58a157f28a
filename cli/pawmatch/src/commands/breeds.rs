use anyhow::Result;
use bpaf::Bpaf;
use pawmatch_sdk::pawmatch::Pawmatch;
use pawmatch_sdk::providers::catalog::ClientTrait;
use tracing::instrument;

use super::ensure_logged_in;

/// List the breeds that can be used with 'pawmatch search --breed'
#[derive(Debug, Bpaf, Clone)]
pub struct Breeds {
    /// Print the breeds as a JSON array
    #[bpaf(long)]
    json: bool,
}

impl Breeds {
    #[instrument(name = "breeds", skip_all)]
    pub async fn handle(self, pawmatch: Pawmatch) -> Result<()> {
        ensure_logged_in(&pawmatch)?;

        let breeds = pawmatch.client.list_breeds().await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&breeds)?);
        } else {
            for breed in breeds {
                println!("{breed}");
            }
        }
        Ok(())
    }
}
