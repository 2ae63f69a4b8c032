use std::path::Path;

use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::debug;

use super::step::{Step, StepError};
use super::yaml::key;

/// A parsed script: whether to initialize the store up front, then the steps
/// to run in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub auto_init: bool,
    pub steps: Vec<Step>,
}

impl Script {
    pub async fn read(path: &Path) -> Result<Self, ScriptCreationError> {
        debug!("Reading script file: {}", path.display());
        let bytes = compio::fs::read(path).await.context(ReadSnafu {
            file_path: path.display().to_string(),
        })?;
        debug!("Successfully read script file: {} bytes", bytes.len());

        let contents = String::from_utf8(bytes).context(Utf8Snafu {
            file_path: path.display().to_string(),
        })?;
        contents.as_str().try_into()
    }

    fn parse_steps(top_level: &Yaml) -> Result<Vec<Step>, ScriptCreationError> {
        top_level
            .as_sequence()
            .ok_or(ScriptCreationError::StepsNotSequence)?
            .iter()
            .enumerate()
            .map(|(index, entry)| -> Result<Step, ScriptCreationError> {
                let step = Step::from_yaml(entry).context(InvalidStepSnafu { step: index + 1 })?;
                debug!("Parsed step {}: {}", index + 1, step.operation);
                Ok(step)
            })
            .collect()
    }
}

impl TryFrom<&str> for Script {
    type Error = ScriptCreationError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents =
            Yaml::load_from_str(contents).map_err(|e| ScriptCreationError::ParseError { source: e })?;
        let document = documents
            .first()
            .ok_or(ScriptCreationError::MalformedScript)?;

        let top_level = document
            .as_mapping()
            .ok_or(ScriptCreationError::TopLevelNotMap)?;

        let auto_init = match top_level.get(&key("auto_init")) {
            None => true,
            Some(Yaml::Value(Scalar::Boolean(flag))) => *flag,
            Some(_) => return Err(ScriptCreationError::AutoInitNotBool),
        };
        let steps = match top_level.get(&key("steps")) {
            None => Vec::new(),
            Some(steps) => Self::parse_steps(steps)?,
        };

        Ok(Script { auto_init, steps })
    }
}

#[derive(Debug, Snafu)]
pub enum ScriptCreationError {
    #[snafu(display("Failed to read the script file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Script file is not valid UTF-8: {}", file_path))]
    Utf8Error {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the script file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted script file"))]
    MalformedScript,
    #[snafu(display("Top level of the script should be a map"))]
    TopLevelNotMap,
    #[snafu(display("'auto_init' should be true or false"))]
    AutoInitNotBool,
    #[snafu(display("Steps section should be a list"))]
    StepsNotSequence,
    #[snafu(display("Step {} is invalid", step))]
    InvalidStep { step: usize, source: StepError },
}
