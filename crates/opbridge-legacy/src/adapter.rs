//! Boxed-stack to legacy-operator calling convention.
//!
//! [`call_legacy_op_from_stack`] is the only piece that knows the stack
//! layout, and it is not generic: every registered operator shares one copy
//! of it. The per-operator part is [`call_legacy_op`], a thin generic
//! forwarder that reaches the shared code as a plain function pointer.

use anyhow::Result;
use opbridge_core::{stack, FunctionSchema, IValue, Stack, Tensor, Type};
use tracing::trace;

use crate::LegacyOperator;

/// Signature every [`call_legacy_op`] instantiation coerces to.
pub type CallLegacyOpFn =
    fn(&FunctionSchema, Vec<IValue>, Vec<Tensor>) -> Result<Vec<Tensor>>;

/// Construct `Op` for one call, run it, and hand back its outputs.
#[inline]
pub fn call_legacy_op<Op: LegacyOperator>(
    schema: &FunctionSchema,
    inputs: Vec<IValue>,
    outputs: Vec<Tensor>,
) -> Result<Vec<Tensor>> {
    let mut op = Op::new(schema, inputs, outputs)?;
    op.run()?;
    Ok(op.into_outputs())
}

/// Pop the arguments of `schema` off `stack`, call the operator and push its
/// outputs.
///
/// The stack holds one value per schema argument. The last one is either
/// `None` or a tensor list offering one preallocated tensor per return; the
/// operator may reuse those or replace them. The list length is not checked
/// against the schema here.
///
/// On error nothing is pushed and the arguments stay consumed.
///
/// # Panics
///
/// If the schema does not end with a `Tensor[]?` argument, or the last
/// stack value is neither `None` nor a tensor list.
#[inline]
pub fn call_legacy_op_from_stack(
    stack: &mut Stack,
    schema: &FunctionSchema,
    call_op: CallLegacyOpFn,
) -> Result<()> {
    assert!(
        schema.arguments().last().is_some_and(|arg| arg
            .ty
            .is_subtype_of(&Type::optional(Type::list_of_tensors()))),
        "schema {} does not end with a preallocated output argument",
        schema.operator_name()
    );
    let preallocated_outputs = stack::pop(stack);

    let num_outputs = schema.returns().len();
    let num_inputs = schema.arguments().len() - 1;

    let reuse = !preallocated_outputs.is_none();
    let outputs = match preallocated_outputs {
        IValue::None => vec![Tensor::undefined(); num_outputs],
        IValue::TensorList(list) => list,
        other => panic!(
            "preallocated outputs for {} must be None or a tensor list, got {}",
            schema.operator_name(),
            other.kind()
        ),
    };

    let inputs = stack::pop_n(stack, num_inputs);

    trace!(
        operator = %schema.operator_name(),
        num_inputs,
        num_outputs,
        reuse,
        "calling legacy operator"
    );
    let outputs = call_op(schema, inputs, outputs)?;

    stack.extend(outputs.into_iter().map(IValue::Tensor));
    Ok(())
}

/// Boxed kernel for `Op`, suitable for registering with the dispatcher.
pub fn legacy_kernel<Op: LegacyOperator>(schema: &FunctionSchema, stack: &mut Stack) -> Result<()> {
    call_legacy_op_from_stack(stack, schema, call_legacy_op::<Op>)
}
