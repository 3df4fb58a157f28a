pub mod models;
pub mod notify;
pub mod pawmatch;
pub mod providers;
pub mod session;

pub use pawmatch_client;
