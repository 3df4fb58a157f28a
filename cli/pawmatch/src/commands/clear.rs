use anyhow::Result;
use bpaf::Bpaf;
use pawmatch_sdk::pawmatch::Pawmatch;
use tracing::instrument;

use super::{ensure_logged_in, open_browse, search_or_refresh};
use crate::utils::message;
use crate::utils::render::render_cycle;

/// Reset all filters and forget favorites and the match, then show page 1
#[derive(Debug, Bpaf, Clone)]
pub struct Clear {
    /// Print the page as JSON
    #[bpaf(long)]
    json: bool,
}

impl Clear {
    #[instrument(name = "clear", skip_all)]
    pub async fn handle(self, pawmatch: Pawmatch) -> Result<()> {
        ensure_logged_in(&pawmatch)?;

        let browse = open_browse(&pawmatch)?;
        let outcome = browse.clear_filters().await;
        let outcome = search_or_refresh(&browse, outcome).await;
        pawmatch.save_browse(&browse)?;

        message::deleted("Cleared filters, favorites and match");
        render_cycle(outcome, &browse.favorites(), self.json)
    }
}
