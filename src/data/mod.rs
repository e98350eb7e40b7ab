pub mod feed;
pub mod snapshot;
pub mod store;
