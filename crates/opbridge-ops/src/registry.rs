//! CPU registrations for the bundled legacy operators.

use opbridge_core::{Argument, Type};
use opbridge_dispatch::{DispatchError, Dispatcher};
use opbridge_legacy::register_legacy_operator_cpu;
use tracing::info;

use crate::{AddOp, ReluOp, ScaleOp, ShapeOp, SumOp};

/// Declare every bundled operator and bind its CPU kernel.
///
/// Schemas are registered as:
/// - `Add(Tensor A, Tensor B) -> (Tensor C)`
/// - `Relu(Tensor X) -> (Tensor Y)`
/// - `Scale(Tensor X, float scale=1.0) -> (Tensor Y)`
/// - `Sum(Tensor[] inputs) -> (Tensor Y)`
/// - `Shape(Tensor X) -> (Tensor shape)`
///
/// each followed by the preallocated-output argument.
pub fn register_cpu_operators(dispatcher: &mut Dispatcher) -> Result<(), DispatchError> {
    register_legacy_operator_cpu::<AddOp>(
        dispatcher,
        "Add",
        vec![Argument::new("A"), Argument::new("B")],
        vec![Argument::new("C")],
    )?;
    register_legacy_operator_cpu::<ReluOp>(
        dispatcher,
        "Relu",
        vec![Argument::new("X")],
        vec![Argument::new("Y")],
    )?;
    register_legacy_operator_cpu::<ScaleOp>(
        dispatcher,
        "Scale",
        vec![
            Argument::new("X"),
            Argument::with_type("scale", Type::Float).with_default(1.0.into()),
        ],
        vec![Argument::new("Y")],
    )?;
    register_legacy_operator_cpu::<SumOp>(
        dispatcher,
        "Sum",
        vec![Argument::with_type("inputs", Type::list_of_tensors())],
        vec![Argument::new("Y")],
    )?;
    register_legacy_operator_cpu::<ShapeOp>(
        dispatcher,
        "Shape",
        vec![Argument::new("X")],
        vec![Argument::new("shape")],
    )?;

    info!(operators = dispatcher.len(), "registered CPU legacy operators");
    Ok(())
}
