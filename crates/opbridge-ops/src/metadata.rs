use anyhow::Result;
use opbridge_core::{FunctionSchema, IValue, Tensor};
use opbridge_legacy::{LegacyOperator, OperatorBase};

/// Returns the input's dimensions as a 1-D i64 tensor.
///
/// The result is always a new tensor; a preallocated output is dropped.
pub struct ShapeOp {
    base: OperatorBase,
}

impl LegacyOperator for ShapeOp {
    fn new(schema: &FunctionSchema, inputs: Vec<IValue>, outputs: Vec<Tensor>) -> Result<Self> {
        Ok(Self {
            base: OperatorBase::new(schema, inputs, outputs),
        })
    }

    fn run(&mut self) -> Result<()> {
        let shape = self.base.input(0)?.shape()?;
        let dims: Vec<i64> = shape.0.iter().map(|&d| d as i64).collect();
        let out = Tensor::from_i64(&[dims.len()], &dims)?;
        self.base.set_output(0, out)?;
        Ok(())
    }

    fn into_outputs(self) -> Vec<Tensor> {
        self.base.into_outputs()
    }
}
