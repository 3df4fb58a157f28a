use anyhow::Result;
use bpaf::Bpaf;
use pawmatch_sdk::models::favorites::MatchOutcome;
use pawmatch_sdk::pawmatch::Pawmatch;
use tracing::{debug, instrument};

use super::{ensure_logged_in, open_browse};
use crate::utils::errors::AlreadyReported;
use crate::utils::message;
use crate::utils::render::render_match;

/// Let pawmatch pick one of your favorites
#[derive(Debug, Bpaf, Clone)]
pub struct Matching {
    /// Print the matched dog as JSON
    #[bpaf(long)]
    json: bool,
}

impl Matching {
    #[instrument(name = "match", skip_all)]
    pub async fn handle(self, pawmatch: Pawmatch) -> Result<()> {
        ensure_logged_in(&pawmatch)?;

        let browse = open_browse(&pawmatch)?;
        let outcome = browse.request_match().await;
        pawmatch.save_browse(&browse)?;

        match outcome {
            MatchOutcome::Matched(dog) => render_match(&dog, self.json),
            MatchOutcome::NoMatch => Ok(()),
            MatchOutcome::Disabled => {
                message::warning(
                    "You have no favorites yet, add some with 'pawmatch favorite <id>'",
                );
                Ok(())
            },
            MatchOutcome::AlreadyPending => {
                debug!("match already requested");
                Ok(())
            },
            MatchOutcome::Failed(e) => {
                debug!(error = %e, "match failed");
                Err(AlreadyReported.into())
            },
        }
    }
}
