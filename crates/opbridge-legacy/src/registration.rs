use opbridge_core::{Argument, DispatchKey};
use opbridge_dispatch::{DispatchError, Dispatcher, OperatorHandle};

use crate::{legacy_kernel, legacy_operator_name, make_function_schema, LegacyOperator};

/// Declare the schema of a legacy operator under the legacy namespace.
///
/// Tensor inputs must precede non-tensor arguments.
pub fn declare_legacy_operator(
    dispatcher: &mut Dispatcher,
    name: &str,
    inputs: Vec<Argument>,
    outputs: Vec<Argument>,
) -> Result<OperatorHandle, DispatchError> {
    dispatcher.declare(make_function_schema(name, inputs, outputs))
}

/// Bind `Op` as the `key` kernel of the already declared operator `name`.
pub fn register_legacy_operator<Op: LegacyOperator>(
    dispatcher: &mut Dispatcher,
    name: &str,
    key: DispatchKey,
) -> Result<(), DispatchError> {
    dispatcher.register_kernel(&legacy_operator_name(name), key, legacy_kernel::<Op>)
}

/// Declare `name` and bind `Op` as its CPU kernel.
///
/// Every legacy operator is registered this way first; other device classes
/// are optional and bound afterwards.
pub fn register_legacy_operator_cpu<Op: LegacyOperator>(
    dispatcher: &mut Dispatcher,
    name: &str,
    inputs: Vec<Argument>,
    outputs: Vec<Argument>,
) -> Result<OperatorHandle, DispatchError> {
    let handle = declare_legacy_operator(dispatcher, name, inputs, outputs)?;
    register_legacy_operator::<Op>(dispatcher, name, DispatchKey::Cpu)?;
    Ok(handle)
}

pub fn register_legacy_operator_cuda<Op: LegacyOperator>(
    dispatcher: &mut Dispatcher,
    name: &str,
) -> Result<(), DispatchError> {
    register_legacy_operator::<Op>(dispatcher, name, DispatchKey::Cuda)
}

pub fn register_legacy_operator_hip<Op: LegacyOperator>(
    dispatcher: &mut Dispatcher,
    name: &str,
) -> Result<(), DispatchError> {
    register_legacy_operator::<Op>(dispatcher, name, DispatchKey::Hip)
}
