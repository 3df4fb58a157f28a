use anyhow::{Context, Result};
use bpaf::Bpaf;
use pawmatch_sdk::pawmatch::Pawmatch;
use tracing::instrument;

use super::{ensure_logged_in, open_browse};
use crate::utils::message;

/// Add a dog on the current page to your favorites, or remove it.
///
/// Favorites can be removed at any time.
#[derive(Debug, Bpaf, Clone)]
pub struct Favorite {
    /// ID of the dog, as shown in brackets next to it
    #[bpaf(positional("id"))]
    id: String,
}

impl Favorite {
    #[cfg(test)]
    pub(crate) fn from_id(id: &str) -> Self {
        Favorite { id: id.to_string() }
    }

    #[instrument(name = "favorite", fields(id = self.id), skip_all)]
    pub fn handle(self, pawmatch: Pawmatch) -> Result<()> {
        ensure_logged_in(&pawmatch)?;

        let browse = open_browse(&pawmatch)?;
        let added = browse
            .toggle_favorite(&self.id)
            .context("Only dogs on the current page can be added, run 'pawmatch search' to see them")?;
        pawmatch.save_browse(&browse)?;

        let name = browse
            .current_page()
            .and_then(|page| page.dogs.into_iter().find(|dog| dog.id == self.id))
            .map(|dog| dog.name)
            .unwrap_or_else(|| format!("Dog '{}'", self.id));

        if added {
            message::updated(format!("{name} added to favorites"));
        } else {
            message::deleted(format!("{name} removed from favorites"));
        }
        let n_favorites = browse.favorites().len();
        if n_favorites > 0 {
            let noun = if n_favorites == 1 { "favorite" } else { "favorites" };
            message::plain(format!(
                "{n_favorites} {noun}, run 'pawmatch match' to find your match"
            ));
        }
        Ok(())
    }
}
