mod auth;
mod breeds;
mod clear;
mod favorite;
mod locate;
mod matching;
mod search;
mod status;

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use bpaf::{Bpaf, Parser};
use indoc::indoc;
use pawmatch_sdk::models::browse::BrowseSession;
use pawmatch_sdk::models::search::CycleOutcome;
use pawmatch_sdk::pawmatch::Pawmatch;
use pawmatch_sdk::providers::catalog::Client;
use pawmatch_sdk::session::SessionStore;
use tracing::debug;

use crate::config::Config;
use crate::utils::errors::NotLoggedIn;
use crate::utils::init::init_client;
use crate::utils::message::{self, Notifier};

static PAWMATCH_DESCRIPTION: &'_ str = indoc! {"
    Find a shelter dog to adopt.\n\n

    Log in, browse the catalog with filters, mark your favorites
    and let pawmatch pick your match."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(PAWMATCH_DESCRIPTION))]
pub struct PawmatchCli(#[bpaf(external(pawmatch_args))] pub PawmatchArgs);

/// Main pawmatch args parser
///
/// To parse the pawmatch CLI, use [`PawmatchCli`] instead using [`pawmatch_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct PawmatchArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands), optional)]
    command: Option<Commands>,
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

impl PawmatchArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        // ensure xdg dirs exist
        tokio::fs::create_dir_all(&config.pawmatch.data_dir).await?;

        let session = SessionStore::open(Pawmatch::session_path(&config.pawmatch.data_dir))?;

        // Given no command, skip initialization and print welcome message
        let Some(command) = self.command else {
            print_welcome_message(&session);
            return Ok(());
        };

        let client = init_client(&config, Arc::new(session.clone()))?;

        let pawmatch = Pawmatch {
            data_dir: config.pawmatch.data_dir,
            client: Arc::new(client),
            session,
        };
        debug!(logged_in = pawmatch.session.is_authenticated(), "initialized");

        command.handle(pawmatch).await
    }
}

/// Print general welcome message with short usage instructions
fn print_welcome_message(session: &SessionStore) {
    message::plain(indoc! {"
        Usage: pawmatch OPTIONS (login|search|locate|favorite|match|...) [--help]

        Use 'pawmatch --help' for full list of commands and more information
    "});

    if !session.is_authenticated() {
        message::plain("First time? Log in with 'pawmatch login --email <email> --name <name>'\n");
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// Log in to browse the catalog
    #[bpaf(command)]
    Login(#[bpaf(external(auth::login))] auth::Login),

    /// Log out and forget the session
    #[bpaf(command)]
    Logout(#[bpaf(external(auth::logout))] auth::Logout),

    /// List all known breeds
    #[bpaf(command)]
    Breeds(#[bpaf(external(breeds::breeds))] breeds::Breeds),

    /// Change filters, sorting or page and show the matching dogs
    #[bpaf(command, long("browse"))]
    Search(#[bpaf(external(search::search))] search::Search),

    /// Only show dogs near a city, in some states or within an area
    #[bpaf(command)]
    Locate(#[bpaf(external(locate::locate))] locate::Locate),

    /// Add a dog on the current page to your favorites, or remove it
    #[bpaf(command, long("fav"))]
    Favorite(#[bpaf(external(favorite::favorite))] favorite::Favorite),

    /// Find your match among your favorites
    #[bpaf(command("match"))]
    Match(#[bpaf(external(matching::matching))] matching::Matching),

    /// Reset filters and forget favorites and match
    #[bpaf(command)]
    Clear(#[bpaf(external(clear::clear))] clear::Clear),

    /// Show the current filters, favorites and match
    #[bpaf(command)]
    Status(#[bpaf(external(status::status))] status::Status),
}

impl Commands {
    async fn handle(self, pawmatch: Pawmatch) -> Result<()> {
        match self {
            Commands::Login(args) => args.handle(pawmatch).await,
            Commands::Logout(args) => args.handle(pawmatch),
            Commands::Breeds(args) => args.handle(pawmatch).await,
            Commands::Search(args) => args.handle(pawmatch).await,
            Commands::Locate(args) => args.handle(pawmatch).await,
            Commands::Favorite(args) => args.handle(pawmatch),
            Commands::Match(args) => args.handle(pawmatch).await,
            Commands::Clear(args) => args.handle(pawmatch).await,
            Commands::Status(args) => args.handle(pawmatch),
        }
    }
}

/// Fail early if there is no valid session.
fn ensure_logged_in(pawmatch: &Pawmatch) -> Result<()> {
    if pawmatch.session.is_authenticated() {
        return Ok(());
    }
    Err(NotLoggedIn.into())
}

/// Resume the saved browse session, reporting notifications as messages.
fn open_browse(pawmatch: &Pawmatch) -> Result<BrowseSession<Client>> {
    pawmatch
        .browse(Arc::new(Notifier))
        .context("Could not restore browse state")
}

/// Search again if an edit left the criteria unchanged,
/// so there is always a page to show.
async fn search_or_refresh(
    session: &BrowseSession<Client>,
    outcome: CycleOutcome,
) -> CycleOutcome {
    match outcome {
        CycleOutcome::Unchanged => session.refresh().await,
        outcome => outcome,
    }
}


#[cfg(test)]
mod tests {
    use super::test_helpers::pawmatch_instance;
    use super::*;

    #[test]
    fn catalog_requires_login() {
        let (pawmatch, _dir) = pawmatch_instance(false);
        let err = ensure_logged_in(&pawmatch).unwrap_err();
        assert!(err.is::<NotLoggedIn>());

        let (pawmatch, _dir) = pawmatch_instance(true);
        assert!(ensure_logged_in(&pawmatch).is_ok());
    }

    #[test]
    fn parses_subcommands() {
        let args = pawmatch_cli()
            .run_inner(["-v", "-v", "search", "--breed", "Pug", "--page", "2"].as_slice())
            .unwrap()
            .0;
        assert!(matches!(args.verbosity, Verbosity::Verbose(2)));
        assert!(matches!(args.command, Some(Commands::Search(_))));

        let args = pawmatch_cli().run_inner(["match"].as_slice()).unwrap().0;
        assert!(matches!(args.command, Some(Commands::Match(_))));
    }
}
