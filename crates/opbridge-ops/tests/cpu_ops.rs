use anyhow::{Context, Result};
use opbridge_core::{DType, Device, DispatchKey, IValue, Shape, Stack, Tensor};
use opbridge_dispatch::{DispatchError, Dispatcher, OperatorHandle};
use opbridge_legacy::{
    legacy_operator_name, register_legacy_operator_cuda, register_legacy_operator_hip,
};
use opbridge_ops::{register_cpu_operators, AddOp, ReluOp};

fn dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    register_cpu_operators(&mut dispatcher).expect("register bundled operators");
    dispatcher
}

fn op(dispatcher: &Dispatcher, name: &str) -> OperatorHandle {
    dispatcher
        .find(&legacy_operator_name(name))
        .unwrap_or_else(|| panic!("{name} is not registered"))
}

fn tensor(values: &[f32]) -> Tensor {
    Tensor::from_f32(&[values.len()], values).unwrap()
}

fn top_tensor(stack: &Stack) -> Result<&Tensor> {
    stack
        .last()
        .and_then(IValue::as_tensor)
        .context("top of stack is not a tensor")
}

#[test]
fn registers_all_operators() {
    let dispatcher = dispatcher();
    assert_eq!(dispatcher.len(), 5);

    let names: Vec<_> = dispatcher.schemas().iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec![
            "_legacy::Add",
            "_legacy::Relu",
            "_legacy::Scale",
            "_legacy::Shape",
            "_legacy::Sum"
        ]
    );
    for schema in dispatcher.schemas() {
        assert_eq!(
            dispatcher.dispatch_keys(schema.operator_name()),
            vec![DispatchKey::Cpu]
        );
    }
}

#[test]
fn add() -> Result<()> {
    let dispatcher = dispatcher();
    let add = op(&dispatcher, "Add");

    let mut stack: Stack = vec![
        tensor(&[1.0, 2.0, 3.0, 4.0]).into(),
        tensor(&[10.0, 20.0, 30.0, 40.0]).into(),
        IValue::None,
    ];
    dispatcher.call_boxed(&add, &mut stack)?;

    assert_eq!(stack.len(), 1);
    assert_eq!(top_tensor(&stack)?.to_vec_f32()?, vec![11.0, 22.0, 33.0, 44.0]);
    Ok(())
}

#[test]
fn add_shape_mismatch_fails_without_outputs() {
    let dispatcher = dispatcher();
    let add = op(&dispatcher, "Add");

    let mut stack: Stack = vec![tensor(&[1.0]).into(), tensor(&[1.0, 2.0]).into(), IValue::None];
    let err = dispatcher
        .call(&add, DispatchKey::Cpu, &mut stack)
        .unwrap_err();

    assert!(err.to_string().contains("equal shapes"));
    assert!(stack.is_empty());
}

#[test]
fn add_reuses_preallocated_output() -> Result<()> {
    let dispatcher = dispatcher();
    let add = op(&dispatcher, "Add");

    let prealloc = tensor(&[0.0, 0.0]);
    let mut stack: Stack = vec![
        tensor(&[1.0, 2.0]).into(),
        tensor(&[3.0, 4.0]).into(),
        vec![prealloc.clone()].into(),
    ];
    dispatcher.call_boxed(&add, &mut stack)?;

    assert!(top_tensor(&stack)?.same_handle(&prealloc));
    assert_eq!(prealloc.to_vec_f32()?, vec![4.0, 6.0]);
    Ok(())
}

#[test]
fn relu() -> Result<()> {
    let dispatcher = dispatcher();
    let relu = op(&dispatcher, "Relu");

    let mut stack: Stack = vec![tensor(&[-1.0, 0.0, 2.5]).into(), IValue::None];
    dispatcher.call_boxed(&relu, &mut stack)?;

    assert_eq!(top_tensor(&stack)?.to_vec_f32()?, vec![0.0, 0.0, 2.5]);
    Ok(())
}

#[test]
fn scale_reads_float_argument() -> Result<()> {
    let dispatcher = dispatcher();
    let scale = op(&dispatcher, "Scale");

    let mut stack: Stack = vec![tensor(&[1.0, -2.0]).into(), IValue::Double(3.0), IValue::None];
    dispatcher.call_boxed(&scale, &mut stack)?;
    assert_eq!(top_tensor(&stack)?.to_vec_f32()?, vec![3.0, -6.0]);

    // A `None` argument falls back to the schema default.
    let mut stack: Stack = vec![tensor(&[1.0, -2.0]).into(), IValue::None, IValue::None];
    dispatcher.call_boxed(&scale, &mut stack)?;
    assert_eq!(top_tensor(&stack)?.to_vec_f32()?, vec![1.0, -2.0]);
    Ok(())
}

#[test]
fn scale_rejects_wrong_argument_type() {
    let dispatcher = dispatcher();
    let scale = op(&dispatcher, "Scale");

    let mut stack: Stack = vec![tensor(&[1.0]).into(), IValue::Bool(true), IValue::None];
    let err = dispatcher.call_boxed(&scale, &mut stack).unwrap_err();
    assert!(err.to_string().contains("scale"));
    assert!(stack.is_empty());
}

#[test]
fn sum_is_variadic() -> Result<()> {
    let dispatcher = dispatcher();
    let sum = op(&dispatcher, "Sum");

    let inputs = vec![tensor(&[1.0, 1.0]), tensor(&[2.0, 3.0]), tensor(&[4.0, 5.0])];
    let mut stack: Stack = vec![inputs.into(), IValue::None];
    dispatcher.call_boxed(&sum, &mut stack)?;

    assert_eq!(stack.len(), 1);
    assert_eq!(top_tensor(&stack)?.to_vec_f32()?, vec![7.0, 9.0]);
    Ok(())
}

#[test]
fn sum_of_nothing_fails() {
    let dispatcher = dispatcher();
    let sum = op(&dispatcher, "Sum");

    let mut stack: Stack = vec![Vec::<Tensor>::new().into(), IValue::None];
    assert!(dispatcher.call_boxed(&sum, &mut stack).is_err());
    assert!(stack.is_empty());
}

#[test]
fn shape_ignores_preallocation() -> Result<()> {
    let dispatcher = dispatcher();
    let shape = op(&dispatcher, "Shape");

    let x = Tensor::from_f32(&[2, 3], &[0.0; 6])?;
    let prealloc = tensor(&[0.0]);
    let observer = prealloc.downgrade();
    let mut stack: Stack = vec![x.into(), vec![prealloc].into()];
    dispatcher.call_boxed(&shape, &mut stack)?;

    assert_eq!(top_tensor(&stack)?.to_vec_i64()?, vec![2, 3]);
    assert!(observer.is_released());
    Ok(())
}

#[test]
fn cuda_kernel_requires_declaration_and_is_unique() {
    let mut dispatcher = dispatcher();

    register_legacy_operator_cuda::<AddOp>(&mut dispatcher, "Add").unwrap();
    assert_eq!(
        dispatcher.dispatch_keys(&legacy_operator_name("Add")),
        vec![DispatchKey::Cpu, DispatchKey::Cuda]
    );

    let err = register_legacy_operator_cuda::<AddOp>(&mut dispatcher, "Add").unwrap_err();
    assert!(matches!(err, DispatchError::DuplicateKernel { .. }));

    let err = register_legacy_operator_cuda::<AddOp>(&mut dispatcher, "Mul").unwrap_err();
    assert!(matches!(err, DispatchError::UnknownOperator(_)));
}

#[test]
fn hip_kernel_is_selected_from_input_device() -> Result<()> {
    let mut dispatcher = dispatcher();
    register_legacy_operator_hip::<ReluOp>(&mut dispatcher, "Relu")?;
    assert_eq!(
        dispatcher.dispatch_keys(&legacy_operator_name("Relu")),
        vec![DispatchKey::Cpu, DispatchKey::Hip]
    );

    let relu = op(&dispatcher, "Relu");
    let x = Tensor::zeros(DType::F32, Shape::from_slice(&[2]), Device::Hip { device_id: 0 })?;
    x.copy_from_f32(&[-3.0, 4.0])?;
    let mut stack: Stack = vec![x.into(), IValue::None];
    dispatcher.call_boxed(&relu, &mut stack)?;

    let y = top_tensor(&stack)?;
    assert_eq!(y.device(), Some(Device::Hip { device_id: 0 }));
    assert_eq!(y.to_vec_f32()?, vec![0.0, 4.0]);

    let err = register_legacy_operator_hip::<ReluOp>(&mut dispatcher, "Relu").unwrap_err();
    assert!(matches!(err, DispatchError::DuplicateKernel { .. }));

    // Add has no HIP kernel.
    let add = op(&dispatcher, "Add");
    let a = Tensor::zeros(DType::F32, Shape::from_slice(&[1]), Device::Hip { device_id: 0 })?;
    let mut stack: Stack = vec![a.clone().into(), a.into(), IValue::None];
    let err = dispatcher.call_boxed(&add, &mut stack).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DispatchError>(),
        Some(DispatchError::MissingKernel { key: DispatchKey::Hip, .. })
    ));
    Ok(())
}

#[test]
fn registering_twice_is_rejected() {
    let mut dispatcher = dispatcher();
    let err = register_cpu_operators(&mut dispatcher).unwrap_err();
    assert!(matches!(err, DispatchError::DuplicateOperator(_)));
    assert_eq!(dispatcher.len(), 5);
}
