pub mod catalog;
pub mod mock;
