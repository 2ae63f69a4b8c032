use bytes::Bytes;
use derive_more::Display;
use ftree::Store;
use saphyr::{Scalar, Yaml};
use snafu::prelude::*;

use super::outcome::Outcome;
use super::yaml::{is_null, key, scalar_text};

/// One store call a script step performs.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Operation {
    #[display("init")]
    Init,
    #[display("destroy")]
    Destroy,
    #[display("insert_dir {path}")]
    InsertDirectory { path: String },
    #[display("insert_file {path}")]
    InsertFile {
        path: String,
        contents: Option<Bytes>,
        length: usize,
    },
    #[display("remove_dir {path}")]
    RemoveDirectory { path: String },
    #[display("remove_file {path}")]
    RemoveFile { path: String },
    #[display("contains_dir {path}")]
    ContainsDirectory { path: String },
    #[display("contains_file {path}")]
    ContainsFile { path: String },
    #[display("get {path}")]
    GetContents { path: String },
    #[display("replace {path}")]
    ReplaceContents {
        path: String,
        contents: Option<Bytes>,
        length: usize,
    },
    #[display("stat {path}")]
    Stat { path: String },
    #[display("dump")]
    Dump,
}

impl Operation {
    /// Parses an operation from its name and the value written after it.
    ///
    /// `argument` is `None` for a step written as a bare name such as `- dump`.
    pub fn from_yaml(name: &str, argument: Option<&Yaml>) -> Result<Self, OperationError> {
        let operation = match name {
            "init" => no_argument(name, argument, Operation::Init)?,
            "destroy" => no_argument(name, argument, Operation::Destroy)?,
            "dump" => no_argument(name, argument, Operation::Dump)?,
            "insert_dir" => Operation::InsertDirectory {
                path: path_argument(name, argument)?,
            },
            "remove_dir" => Operation::RemoveDirectory {
                path: path_argument(name, argument)?,
            },
            "remove_file" => Operation::RemoveFile {
                path: path_argument(name, argument)?,
            },
            "contains_dir" => Operation::ContainsDirectory {
                path: path_argument(name, argument)?,
            },
            "contains_file" => Operation::ContainsFile {
                path: path_argument(name, argument)?,
            },
            "get" => Operation::GetContents {
                path: path_argument(name, argument)?,
            },
            "stat" => Operation::Stat {
                path: path_argument(name, argument)?,
            },
            "insert_file" => {
                let (path, contents, length) = file_argument(name, argument, true)?;
                Operation::InsertFile {
                    path,
                    contents,
                    length,
                }
            }
            "replace" => {
                let (path, contents, length) = file_argument(name, argument, false)?;
                Operation::ReplaceContents {
                    path,
                    contents,
                    length,
                }
            }
            _ => return UnknownOperationSnafu { name }.fail(),
        };
        Ok(operation)
    }

    pub fn apply(&self, store: &mut Store) -> Outcome {
        match self {
            Operation::Init => store.init().into(),
            Operation::Destroy => store.destroy().into(),
            Operation::InsertDirectory { path } => store.insert_directory(path).into(),
            Operation::InsertFile {
                path,
                contents,
                length,
            } => store.insert_file(path, contents.clone(), *length).into(),
            Operation::RemoveDirectory { path } => store.remove_directory(path).into(),
            Operation::RemoveFile { path } => store.remove_file(path).into(),
            Operation::ContainsDirectory { path } => Outcome::Bool(store.contains_directory(path)),
            Operation::ContainsFile { path } => Outcome::Bool(store.contains_file(path)),
            Operation::GetContents { path } => store.get_file_contents(path).into(),
            Operation::ReplaceContents {
                path,
                contents,
                length,
            } => store
                .replace_file_contents(path, contents.clone(), *length)
                .into(),
            Operation::Stat { path } => store.stat(path).into(),
            Operation::Dump => Outcome::Dump(store.dump()),
        }
    }
}

fn no_argument(
    name: &str,
    argument: Option<&Yaml>,
    operation: Operation,
) -> Result<Operation, OperationError> {
    ensure!(
        argument.is_none_or(is_null),
        UnexpectedArgumentSnafu { operation: name }
    );
    Ok(operation)
}

fn path_argument(name: &str, argument: Option<&Yaml>) -> Result<String, OperationError> {
    let argument = argument
        .filter(|value| !is_null(value))
        .context(MissingArgumentSnafu { operation: name })?;
    scalar_text(argument).context(InvalidArgumentSnafu {
        operation: name,
        reason: "the path must be a scalar",
    })
}

fn file_argument(
    name: &str,
    argument: Option<&Yaml>,
    allow_bare_path: bool,
) -> Result<(String, Option<Bytes>, usize), OperationError> {
    let argument = argument
        .filter(|value| !is_null(value))
        .context(MissingArgumentSnafu { operation: name })?;

    let Some(fields) = argument.as_mapping() else {
        ensure!(
            allow_bare_path,
            InvalidArgumentSnafu {
                operation: name,
                reason: "expected a map with 'path', 'contents' and 'length'",
            }
        );
        return Ok((path_argument(name, Some(argument))?, None, 0));
    };

    let path = path_argument(name, fields.get(&key("path")))?;
    let contents = match fields.get(&key("contents")) {
        None => None,
        Some(value) if is_null(value) => None,
        Some(value) => Some(Bytes::from(scalar_text(value).context(
            InvalidArgumentSnafu {
                operation: name,
                reason: "contents must be a scalar",
            },
        )?)),
    };
    let length = match fields.get(&key("length")) {
        None => contents.as_ref().map_or(0, Bytes::len),
        Some(Yaml::Value(Scalar::Integer(length))) if *length >= 0 => *length as usize,
        Some(_) => {
            return InvalidArgumentSnafu {
                operation: name,
                reason: "length must be a non-negative integer",
            }
            .fail();
        }
    };

    Ok((path, contents, length))
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum OperationError {
    #[snafu(display("Unknown operation '{}'", name))]
    UnknownOperation { name: String },
    #[snafu(display("Operation '{}' needs an argument", operation))]
    MissingArgument { operation: String },
    #[snafu(display("Operation '{}' takes no argument", operation))]
    UnexpectedArgument { operation: String },
    #[snafu(display("Invalid argument for '{}': {}", operation, reason))]
    InvalidArgument {
        operation: String,
        reason: &'static str,
    },
}
