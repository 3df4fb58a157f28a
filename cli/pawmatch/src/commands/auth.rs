use anyhow::{Result, bail};
use bpaf::Bpaf;
use pawmatch_sdk::models::filter::FilterEdit;
use pawmatch_sdk::pawmatch::Pawmatch;
use pawmatch_sdk::providers::catalog::ClientTrait;
use tracing::instrument;

use super::{open_browse, search_or_refresh};
use crate::utils::message;
use crate::utils::render::render_cycle;

/// Log in with an email address and a name.
///
/// There is no password, the backend trusts the identity claim.
#[derive(Debug, Bpaf, Clone)]
pub struct Login {
    /// Email address to log in with
    #[bpaf(long, argument("email"))]
    email: String,

    /// Your name
    #[bpaf(long, argument("name"))]
    name: String,
}

impl Login {
    #[instrument(name = "login", skip_all)]
    pub async fn handle(self, pawmatch: Pawmatch) -> Result<()> {
        let email = self.email.trim();
        let name = self.name.trim();
        if email.is_empty() || name.is_empty() {
            bail!("both an email address and a name are required to log in");
        }

        let token = pawmatch.client.login(email, name).await?;
        pawmatch.session.set(token)?;
        message::updated(format!("Logged in as {name}"));

        let browse = open_browse(&pawmatch)?;
        let outcome = browse.apply(FilterEdit::SetPage(1)).await?;
        let outcome = search_or_refresh(&browse, outcome).await;
        pawmatch.save_browse(&browse)?;

        render_cycle(outcome, &browse.favorites(), false)
    }
}

/// Forget the session; the backend is not contacted.
#[derive(Debug, Bpaf, Clone)]
pub struct Logout {}

impl Logout {
    #[instrument(name = "logout", skip_all)]
    pub fn handle(self, pawmatch: Pawmatch) -> Result<()> {
        let was_logged_in = pawmatch.session.is_authenticated();
        pawmatch.session.clear()?;

        if was_logged_in {
            message::deleted("Logged out");
        } else {
            message::plain("Not logged in");
        }
        Ok(())
    }
}
