use bytes::Bytes;
use ftree::{Stat, StoreError};

/// What a step produced when run against the store.
#[derive(Debug)]
pub enum Outcome {
    Done,
    Bool(bool),
    Contents(Option<Bytes>),
    Stat(Stat),
    Dump(Option<String>),
    Failed(StoreError),
}

impl Outcome {
    /// The label a step's `expect` is compared against.
    pub fn label(&self) -> String {
        match self {
            Outcome::Done => "success".to_string(),
            Outcome::Bool(value) => value.to_string(),
            Outcome::Contents(Some(contents)) => String::from_utf8_lossy(contents).into_owned(),
            Outcome::Contents(None) | Outcome::Dump(None) => "null".to_string(),
            Outcome::Stat(stat) => stat.to_string(),
            Outcome::Dump(Some(text)) => text.clone(),
            Outcome::Failed(error) => error.code().to_string(),
        }
    }

    /// Dumps are compared with trailing whitespace ignored.
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            Outcome::Dump(Some(text)) => text.trim_end() == expected.trim_end(),
            _ => self.label() == expected,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl From<Result<(), StoreError>> for Outcome {
    fn from(result: Result<(), StoreError>) -> Self {
        match result {
            Ok(()) => Outcome::Done,
            Err(error) => Outcome::Failed(error),
        }
    }
}

impl From<Result<Option<Bytes>, StoreError>> for Outcome {
    fn from(result: Result<Option<Bytes>, StoreError>) -> Self {
        match result {
            Ok(contents) => Outcome::Contents(contents),
            Err(error) => Outcome::Failed(error),
        }
    }
}

impl From<Result<Stat, StoreError>> for Outcome {
    fn from(result: Result<Stat, StoreError>) -> Self {
        match result {
            Ok(stat) => Outcome::Stat(stat),
            Err(error) => Outcome::Failed(error),
        }
    }
}
