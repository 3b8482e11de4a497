//! Schemas for operators exposed through the legacy adapter.
//!
//! Every such schema ends with a synthetic `Tensor[]?` argument through
//! which callers may offer preallocated output storage.

use opbridge_core::{Argument, FunctionSchema, IValue, OperatorName, Type};

/// Name of the trailing preallocated-output argument.
pub const PREALLOCATED_OUTPUT_ARGNAME: &str = "_legacy_preallocated_outputs";

/// Namespace every legacy operator name is registered under.
pub const LEGACY_NAMESPACE: &str = "_legacy";

pub fn legacy_operator_name(name: &str) -> OperatorName {
    OperatorName::new(format!("{LEGACY_NAMESPACE}::{name}"), "")
}

pub fn preallocated_output_argument() -> Argument {
    Argument::with_type(
        PREALLOCATED_OUTPUT_ARGNAME,
        Type::optional(Type::list_of_tensors()),
    )
    .with_default(IValue::None)
}

/// Build the schema for `name`, appending the preallocated-output argument.
///
/// Tensor inputs must come before non-tensor arguments. A variadic operator
/// takes a single `Tensor[]` as its first input and no other tensors.
pub fn make_function_schema(
    name: &str,
    inputs: Vec<Argument>,
    outputs: Vec<Argument>,
) -> FunctionSchema {
    let mut arguments = inputs;
    arguments.push(preallocated_output_argument());

    let name = legacy_operator_name(name);
    FunctionSchema::new(name.name, name.overload_name, arguments, outputs)
}
