#![allow(clippy::enum_variant_names, clippy::module_inception)]

//! An in-memory hierarchy of directories and files addressed by
//! slash-delimited paths.
//!
//! [`Store`] owns the tree and exposes the insert, lookup, remove, stat and
//! dump operations. [`validator`] walks a tree independently of the store's
//! mutation code and reports the first broken invariant.

pub mod node;
pub mod path;
pub mod store;
pub mod validator;

pub use store::{Stat, Store, StoreError};
pub use validator::Violation;
