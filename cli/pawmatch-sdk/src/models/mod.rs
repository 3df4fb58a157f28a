pub mod browse;
pub mod favorites;
pub mod filter;
pub mod location;
pub mod search;
