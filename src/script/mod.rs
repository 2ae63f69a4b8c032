//! YAML scripts of store operations and what running them produces.

mod operation;
mod outcome;
mod script;
mod step;
mod yaml;

pub use outcome::Outcome;
pub use script::{Script, ScriptCreationError};
pub use step::Step;
