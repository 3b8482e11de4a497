use anyhow::Result;
use opbridge_core::{Device, DType, FunctionSchema, IValue, Shape, Tensor, Type};

use crate::OperatorError;

/// An operator written against the strongly typed legacy interface.
///
/// An instance is built for a single invocation, run once, and then
/// consumed to hand its outputs back to the caller.
pub trait LegacyOperator: Sized {
    /// `inputs` are the schema's arguments in order, without the trailing
    /// preallocated-output slot. `outputs` are either undefined handles or
    /// the storage the caller offered for reuse.
    fn new(schema: &FunctionSchema, inputs: Vec<IValue>, outputs: Vec<Tensor>) -> Result<Self>;

    fn run(&mut self) -> Result<()>;

    fn into_outputs(self) -> Vec<Tensor>;
}

/// Shared state and accessors for legacy operators.
///
/// Tensor inputs are the leading tensor arguments. When the first schema
/// argument is a `Tensor[]`, its elements are the tensor inputs instead and
/// no other tensor arguments are expected. Non-tensor arguments are read by
/// schema name.
pub struct OperatorBase {
    schema: FunctionSchema,
    inputs: Vec<IValue>,
    tensor_inputs: Vec<Tensor>,
    outputs: Vec<Tensor>,
    device: Device,
}

impl OperatorBase {
    pub fn new(schema: &FunctionSchema, inputs: Vec<IValue>, outputs: Vec<Tensor>) -> Self {
        let variadic = schema
            .arguments()
            .first()
            .is_some_and(|a| a.ty == Type::list_of_tensors());

        let tensor_inputs: Vec<Tensor> = if variadic {
            inputs
                .first()
                .and_then(IValue::as_tensor_list)
                .map(<[Tensor]>::to_vec)
                .unwrap_or_default()
        } else {
            inputs
                .iter()
                .map_while(IValue::as_tensor)
                .cloned()
                .collect()
        };

        let device = tensor_inputs
            .iter()
            .find_map(Tensor::device)
            .unwrap_or(Device::Cpu);

        Self {
            schema: schema.clone(),
            inputs,
            tensor_inputs,
            outputs,
            device,
        }
    }

    pub fn schema(&self) -> &FunctionSchema {
        &self.schema
    }

    pub fn input_size(&self) -> usize {
        self.tensor_inputs.len()
    }

    pub fn input(&self, index: usize) -> Result<&Tensor, OperatorError> {
        self.tensor_inputs
            .get(index)
            .ok_or(OperatorError::InputOutOfRange {
                index,
                count: self.tensor_inputs.len(),
            })
    }

    pub fn output_size(&self) -> usize {
        self.outputs.len()
    }

    /// Output slot `index` shaped as requested.
    ///
    /// A handle the caller preallocated is resized in place; an undefined
    /// slot gets a fresh zero-filled tensor on the operator's device.
    pub fn output(&mut self, index: usize, dtype: DType, shape: Shape) -> Result<&Tensor> {
        let count = self.outputs.len();
        let device = self.device;
        let slot = self
            .outputs
            .get_mut(index)
            .ok_or(OperatorError::OutputOutOfRange { index, count })?;

        if slot.is_defined() {
            slot.resize(dtype, shape)?;
        } else {
            *slot = Tensor::zeros(dtype, shape, device)?;
        }
        Ok(&*slot)
    }

    /// Replace output slot `index`, dropping whatever handle it held.
    pub fn set_output(&mut self, index: usize, tensor: Tensor) -> Result<(), OperatorError> {
        let count = self.outputs.len();
        let slot = self
            .outputs
            .get_mut(index)
            .ok_or(OperatorError::OutputOutOfRange { index, count })?;
        *slot = tensor;
        Ok(())
    }

    fn arg_value(&self, name: &str) -> Result<&IValue, OperatorError> {
        let index = self
            .schema
            .argument_index(name)
            .ok_or_else(|| OperatorError::UnknownArgument(name.to_string()))?;

        let passed = self.inputs.get(index).filter(|v| !v.is_none());
        passed
            .or_else(|| {
                self.schema.arguments()[index]
                    .default
                    .as_ref()
                    .filter(|v| !v.is_none())
            })
            .ok_or_else(|| OperatorError::MissingArgument(name.to_string()))
    }

    fn typed_arg<T>(
        &self,
        name: &str,
        expected: &'static str,
        get: impl FnOnce(&IValue) -> Option<T>,
    ) -> Result<T, OperatorError> {
        let value = self.arg_value(name)?;
        get(value).ok_or_else(|| OperatorError::ArgumentType {
            name: name.to_string(),
            expected,
            actual: value.kind(),
        })
    }

    pub fn arg_f64(&self, name: &str) -> Result<f64, OperatorError> {
        self.typed_arg(name, "Double", IValue::to_f64)
    }

    pub fn arg_i64(&self, name: &str) -> Result<i64, OperatorError> {
        self.typed_arg(name, "Int", IValue::to_i64)
    }

    pub fn arg_bool(&self, name: &str) -> Result<bool, OperatorError> {
        self.typed_arg(name, "Bool", IValue::to_bool)
    }

    pub fn arg_f64_or(&self, name: &str, default: f64) -> Result<f64, OperatorError> {
        match self.arg_f64(name) {
            Err(OperatorError::UnknownArgument(_) | OperatorError::MissingArgument(_)) => {
                Ok(default)
            }
            other => other,
        }
    }

    pub fn arg_i64_or(&self, name: &str, default: i64) -> Result<i64, OperatorError> {
        match self.arg_i64(name) {
            Err(OperatorError::UnknownArgument(_) | OperatorError::MissingArgument(_)) => {
                Ok(default)
            }
            other => other,
        }
    }

    pub fn into_outputs(self) -> Vec<Tensor> {
        self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opbridge_core::Argument;

    use crate::make_function_schema;

    fn scale_schema() -> FunctionSchema {
        make_function_schema(
            "Scale",
            vec![
                Argument::new("X"),
                Argument::with_type("scale", Type::Float),
                Argument::with_type("bias", Type::Float).with_default(IValue::Double(0.5)),
            ],
            vec![Argument::new("Y")],
        )
    }

    fn tensor(values: &[f32]) -> Tensor {
        Tensor::from_f32(&[values.len()], values).unwrap()
    }

    #[test]
    fn leading_tensors_are_inputs() {
        let schema = scale_schema();
        let x = tensor(&[1.0]);
        let base = OperatorBase::new(
            &schema,
            vec![x.clone().into(), 2.0.into(), IValue::None],
            vec![Tensor::undefined()],
        );

        assert_eq!(base.input_size(), 1);
        assert!(base.input(0).unwrap().same_handle(&x));
        assert!(matches!(
            base.input(1),
            Err(OperatorError::InputOutOfRange { index: 1, count: 1 })
        ));
    }

    #[test]
    fn arguments_by_name() {
        let schema = scale_schema();
        let base = OperatorBase::new(
            &schema,
            vec![tensor(&[1.0]).into(), 3i64.into(), IValue::None],
            vec![],
        );

        assert_eq!(base.arg_f64("scale").unwrap(), 3.0);
        assert_eq!(base.arg_f64("bias").unwrap(), 0.5);
        assert!(matches!(
            base.arg_i64("X"),
            Err(OperatorError::ArgumentType { actual: "Tensor", .. })
        ));
        assert!(matches!(
            base.arg_f64("nope"),
            Err(OperatorError::UnknownArgument(_))
        ));
        assert_eq!(base.arg_i64_or("nope", 7).unwrap(), 7);
        assert!(base.arg_bool("scale").is_err());
    }

    #[test]
    fn missing_argument_without_default() {
        let schema = scale_schema();
        let base = OperatorBase::new(&schema, vec![tensor(&[1.0]).into()], vec![]);

        assert!(matches!(
            base.arg_f64("scale"),
            Err(OperatorError::MissingArgument(_))
        ));
        assert_eq!(base.arg_f64_or("scale", 1.5).unwrap(), 1.5);
    }

    #[test]
    fn variadic_first_argument() {
        let schema = make_function_schema(
            "Sum",
            vec![Argument::with_type("inputs", Type::list_of_tensors())],
            vec![Argument::new("Y")],
        );
        let a = tensor(&[1.0]);
        let b = tensor(&[2.0]);
        let base = OperatorBase::new(&schema, vec![vec![a, b.clone()].into()], vec![]);

        assert_eq!(base.input_size(), 2);
        assert!(base.input(1).unwrap().same_handle(&b));
    }

    #[test]
    fn output_reuses_preallocated_handle() {
        let schema = scale_schema();
        let prealloc = tensor(&[0.0]);
        let mut base = OperatorBase::new(&schema, vec![], vec![prealloc.clone()]);

        let out = base
            .output(0, DType::F32, Shape::from_slice(&[2, 2]))
            .unwrap();
        assert!(out.same_handle(&prealloc));
        assert_eq!(prealloc.shape().unwrap(), Shape::from_slice(&[2, 2]));
    }

    #[test]
    fn output_allocates_when_undefined() {
        let schema = scale_schema();
        let mut base = OperatorBase::new(&schema, vec![], vec![Tensor::undefined()]);

        let out = base.output(0, DType::F32, Shape::from_slice(&[3])).unwrap();
        assert!(out.is_defined());
        assert_eq!(out.byte_len(), 12);
        assert!(base
            .output(1, DType::F32, Shape::from_slice(&[3]))
            .is_err());
    }

    #[test]
    fn set_output_replaces_slot() {
        let schema = scale_schema();
        let prealloc = tensor(&[0.0]);
        let weak = prealloc.downgrade();
        let mut base = OperatorBase::new(&schema, vec![], vec![prealloc]);

        let fresh = tensor(&[9.0]);
        base.set_output(0, fresh.clone()).unwrap();
        assert!(weak.is_released());

        let outputs = base.into_outputs();
        assert!(outputs[0].same_handle(&fresh));
    }
}
