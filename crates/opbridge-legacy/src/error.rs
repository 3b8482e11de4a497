use thiserror::Error;

/// Argument and output errors raised while a legacy operator reads its
/// inputs or allocates its outputs.
#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("input {index} is out of range ({count} tensor inputs)")]
    InputOutOfRange { index: usize, count: usize },

    #[error("output {index} is out of range ({count} output slots)")]
    OutputOutOfRange { index: usize, count: usize },

    #[error("schema has no argument named `{0}`")]
    UnknownArgument(String),

    #[error("argument `{name}` expected {expected}, got {actual}")]
    ArgumentType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("argument `{0}` was not passed")]
    MissingArgument(String),
}
