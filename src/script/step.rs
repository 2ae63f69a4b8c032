use hashlink::LinkedHashMap;
use saphyr::{Scalar, Yaml};
use snafu::prelude::*;

use super::operation::{Operation, OperationError};
use super::yaml::scalar_text;

const EXPECT_KEY: &str = "expect";

/// A single entry of a script: the operation and, optionally, the outcome
/// label it should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub operation: Operation,
    pub expect: Option<String>,
}

impl Step {
    /// Parses either a bare operation name (`- dump`) or a map holding one
    /// operation key and an optional `expect` key.
    pub fn from_yaml(entry: &Yaml) -> Result<Self, StepError> {
        match entry {
            Yaml::Value(Scalar::String(name)) => Ok(Step {
                operation: Operation::from_yaml(name, None).context(OperationSnafu)?,
                expect: None,
            }),
            Yaml::Mapping(fields) => Self::from_mapping(fields),
            _ => NotAStepSnafu.fail(),
        }
    }

    fn from_mapping(fields: &LinkedHashMap<Yaml, Yaml>) -> Result<Self, StepError> {
        let mut operation = None;
        let mut expect = None;

        for (key, value) in fields {
            let key = key.as_str().context(NonStringKeySnafu)?;
            if key == EXPECT_KEY {
                expect = Some(scalar_text(value).context(ExpectNotScalarSnafu)?);
                continue;
            }
            ensure!(operation.is_none(), MultipleOperationsSnafu);
            operation = Some(Operation::from_yaml(key, Some(value)).context(OperationSnafu)?);
        }

        Ok(Step {
            operation: operation.context(MissingOperationSnafu)?,
            expect,
        })
    }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum StepError {
    #[snafu(display("A step must be an operation name or a map"))]
    NotAStep,
    #[snafu(display("Step keys must be strings"))]
    NonStringKey,
    #[snafu(display("A step may hold only one operation"))]
    MultipleOperations,
    #[snafu(display("The step holds no operation"))]
    MissingOperation,
    #[snafu(display("'expect' must be a scalar"))]
    ExpectNotScalar,
    #[snafu(display("Invalid operation"))]
    OperationError { source: OperationError },
}
