//! The path-indexed store: lifecycle, longest-prefix traversal, insertion,
//! removal, queries and the pre-order dump.

mod error;
mod render;
mod stat;
mod store;

pub use error::StoreError;
pub use stat::Stat;
pub use store::Store;
