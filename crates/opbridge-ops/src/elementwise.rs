//! Elementwise f32 operators: Add, Relu, Scale, Sum.

use anyhow::{ensure, Result};
use opbridge_core::{DType, FunctionSchema, IValue, Tensor};
use opbridge_legacy::{LegacyOperator, OperatorBase};

/// Shape and values of an f32 input.
fn f32_input(base: &OperatorBase, index: usize) -> Result<(Tensor, Vec<f32>)> {
    let t = base.input(index)?.clone();
    let values = t.to_vec_f32()?;
    Ok((t, values))
}

/// Write `values` to output 0 shaped like `like`.
fn write_output(base: &mut OperatorBase, like: &Tensor, values: &[f32]) -> Result<()> {
    let out = base.output(0, DType::F32, like.shape()?)?;
    out.copy_from_f32(values)
}

/// `C = A + B` for equally shaped tensors.
pub struct AddOp {
    base: OperatorBase,
}

impl LegacyOperator for AddOp {
    fn new(schema: &FunctionSchema, inputs: Vec<IValue>, outputs: Vec<Tensor>) -> Result<Self> {
        Ok(Self {
            base: OperatorBase::new(schema, inputs, outputs),
        })
    }

    fn run(&mut self) -> Result<()> {
        let (a, av) = f32_input(&self.base, 0)?;
        let (b, bv) = f32_input(&self.base, 1)?;
        ensure!(
            a.shape()? == b.shape()?,
            "Add expects equal shapes, got {} and {}",
            a.shape()?,
            b.shape()?
        );

        let sum: Vec<f32> = av.iter().zip(&bv).map(|(x, y)| x + y).collect();
        write_output(&mut self.base, &a, &sum)
    }

    fn into_outputs(self) -> Vec<Tensor> {
        self.base.into_outputs()
    }
}

pub struct ReluOp {
    base: OperatorBase,
}

impl LegacyOperator for ReluOp {
    fn new(schema: &FunctionSchema, inputs: Vec<IValue>, outputs: Vec<Tensor>) -> Result<Self> {
        Ok(Self {
            base: OperatorBase::new(schema, inputs, outputs),
        })
    }

    fn run(&mut self) -> Result<()> {
        let (x, xv) = f32_input(&self.base, 0)?;
        let y: Vec<f32> = xv.iter().map(|v| v.max(0.0)).collect();
        write_output(&mut self.base, &x, &y)
    }

    fn into_outputs(self) -> Vec<Tensor> {
        self.base.into_outputs()
    }
}

/// `Y = X * scale`, `scale` being a float argument after the tensor input.
pub struct ScaleOp {
    base: OperatorBase,
    scale: f32,
}

impl LegacyOperator for ScaleOp {
    fn new(schema: &FunctionSchema, inputs: Vec<IValue>, outputs: Vec<Tensor>) -> Result<Self> {
        let base = OperatorBase::new(schema, inputs, outputs);
        let scale = base.arg_f64_or("scale", 1.0)? as f32;
        Ok(Self { base, scale })
    }

    fn run(&mut self) -> Result<()> {
        let (x, xv) = f32_input(&self.base, 0)?;
        let y: Vec<f32> = xv.iter().map(|v| v * self.scale).collect();
        write_output(&mut self.base, &x, &y)
    }

    fn into_outputs(self) -> Vec<Tensor> {
        self.base.into_outputs()
    }
}

/// Elementwise sum over a variadic `Tensor[]` input.
pub struct SumOp {
    base: OperatorBase,
}

impl LegacyOperator for SumOp {
    fn new(schema: &FunctionSchema, inputs: Vec<IValue>, outputs: Vec<Tensor>) -> Result<Self> {
        Ok(Self {
            base: OperatorBase::new(schema, inputs, outputs),
        })
    }

    fn run(&mut self) -> Result<()> {
        ensure!(self.base.input_size() > 0, "Sum needs at least one input");

        let (first, mut acc) = f32_input(&self.base, 0)?;
        let shape = first.shape()?;
        for i in 1..self.base.input_size() {
            let (t, values) = f32_input(&self.base, i)?;
            ensure!(
                t.shape()? == shape,
                "Sum input {i} has shape {}, expected {shape}",
                t.shape()?
            );
            for (a, v) in acc.iter_mut().zip(values) {
                *a += v;
            }
        }
        write_output(&mut self.base, &first, &acc)
    }

    fn into_outputs(self) -> Vec<Tensor> {
        self.base.into_outputs()
    }
}
