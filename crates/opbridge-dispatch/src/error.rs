use opbridge_core::{DispatchKey, OperatorName};
use thiserror::Error;

/// Registry lookup and registration failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("operator {0} is already declared")]
    DuplicateOperator(OperatorName),

    #[error("operator {0} is not declared")]
    UnknownOperator(OperatorName),

    #[error("operator {name} already has a {key} kernel")]
    DuplicateKernel { name: OperatorName, key: DispatchKey },

    #[error("operator {name} has no kernel for {key}")]
    MissingKernel { name: OperatorName, key: DispatchKey },
}
