use anyhow::{bail, ensure, Context, Result};
use opbridge_core::{
    stack, DType, Device, DispatchKey, FunctionSchema, IValue, Shape, Stack, Tensor, Type,
};
use opbridge_dispatch::{Dispatcher, OperatorHandle};
use tracing::debug;

/// Build the stack, call the operator and take its outputs back off.
pub fn run(
    dispatcher: &Dispatcher,
    op: &OperatorHandle,
    key: Option<DispatchKey>,
    tensors: &[String],
    values: &[String],
    preallocate: bool,
) -> Result<Vec<Tensor>> {
    let mut stack = build_stack(op.schema(), tensors, values, preallocate)?;
    debug!(operator = %op.operator_name(), ?key, depth = stack.len(), preallocate, "invoking");

    match key {
        Some(key) => dispatcher.call(op, key, &mut stack)?,
        None => dispatcher.call_boxed(op, &mut stack)?,
    }

    let num_outputs = op.schema().returns().len();
    ensure!(
        stack.len() == num_outputs,
        "expected {num_outputs} outputs on the stack, found {}",
        stack.len()
    );
    stack::pop_n(&mut stack, num_outputs)
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            let kind = v.kind();
            v.into_tensor()
                .with_context(|| format!("output {i} is a {kind}, not a tensor"))
        })
        .collect()
}

/// One stack value per schema argument, in order.
///
/// Tensor arguments take `--tensor` values in order and a `Tensor[]`
/// argument takes all remaining ones. Scalar arguments take `--value`s; a
/// missing scalar is passed as `None` so the schema default applies.
pub fn build_stack(
    schema: &FunctionSchema,
    tensors: &[String],
    values: &[String],
    preallocate: bool,
) -> Result<Stack> {
    let mut tensors = tensors.iter();
    let mut values = values.iter();
    let mut stack = Stack::new();

    let (slot, args) = schema
        .arguments()
        .split_last()
        .context("schema has no arguments")?;

    for arg in args {
        let value = match &arg.ty {
            Type::Tensor => {
                let raw = tensors
                    .next()
                    .with_context(|| format!("missing --tensor for `{}`", arg.name))?;
                IValue::Tensor(parse_tensor(raw)?)
            }
            ty if ty.is_tensor_like() => IValue::TensorList(
                tensors.by_ref().map(|raw| parse_tensor(raw)).collect::<Result<_>>()?,
            ),
            ty => match values.next() {
                Some(raw) => parse_scalar(ty, raw)
                    .with_context(|| format!("invalid value for `{}`", arg.name))?,
                None => IValue::None,
            },
        };
        stack.push(value);
    }

    if let Some(extra) = tensors.next() {
        bail!("unexpected --tensor {extra}");
    }
    if let Some(extra) = values.next() {
        bail!("unexpected --value {extra}");
    }

    if preallocate {
        ensure!(
            slot.ty.is_subtype_of(&Type::optional(Type::list_of_tensors())),
            "{} does not accept preallocated outputs",
            schema.operator_name()
        );
        let outputs = schema
            .returns()
            .iter()
            .map(|_| Tensor::zeros(DType::F32, Shape::from_slice(&[0]), Device::Cpu))
            .collect::<Result<Vec<_>>>()?;
        stack.push(IValue::TensorList(outputs));
    } else {
        stack.push(IValue::None);
    }
    Ok(stack)
}

/// `1,2,3` is a 1-D f32 tensor; `2x3:1,2,3,4,5,6` gives the shape explicitly.
pub fn parse_tensor(raw: &str) -> Result<Tensor> {
    let (shape, data) = match raw.split_once(':') {
        Some((shape, data)) => (Some(shape), data),
        None => (None, raw),
    };

    let values = data
        .split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<f32>().with_context(|| format!("invalid number: {v}")))
        .collect::<Result<Vec<_>>>()?;

    let shape = match shape {
        Some(shape) => shape
            .split('x')
            .map(|d| d.trim().parse::<usize>().with_context(|| format!("invalid dim: {d}")))
            .collect::<Result<Vec<_>>>()?,
        None => vec![values.len()],
    };
    if Shape::from_slice(&shape).checked_numel().is_err() {
        bail!("tensor shape {shape:?} is too large");
    }

    Tensor::from_f32(&shape, &values)
}

fn parse_scalar(ty: &Type, raw: &str) -> Result<IValue> {
    Ok(match ty {
        Type::Float => IValue::Double(raw.parse()?),
        Type::Int => IValue::Int(raw.parse()?),
        Type::Bool => IValue::Bool(raw.parse()?),
        Type::Str => IValue::String(raw.to_string()),
        Type::Optional(inner) => parse_scalar(inner, raw)?,
        other => bail!("cannot pass a {other} from the command line"),
    })
}

pub fn format_tensor(tensor: &Tensor) -> Result<String> {
    if !tensor.is_defined() {
        return Ok("undefined".to_string());
    }
    let shape = tensor.shape()?;
    Ok(match tensor.dtype()? {
        DType::F32 => format!("f32{shape} {:?}", tensor.to_vec_f32()?),
        DType::I64 => format!("i64{shape} {:?}", tensor.to_vec_i64()?),
        other => format!("{other:?}{shape} <{} bytes>", tensor.byte_len()),
    })
}
