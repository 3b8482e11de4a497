use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use opbridge_core::{stack, DispatchKey, FunctionSchema, IValue, OperatorName, Stack};
use tracing::{debug, trace};

use crate::DispatchError;

/// A boxed kernel: consumes the schema's arguments from the stack and
/// pushes its returns.
pub type KernelFunction = fn(&FunctionSchema, &mut Stack) -> Result<()>;

struct OperatorEntry {
    schema: Arc<FunctionSchema>,
    kernels: BTreeMap<DispatchKey, KernelFunction>,
}

/// Cheap, cloneable reference to a declared operator.
#[derive(Clone, Debug)]
pub struct OperatorHandle {
    schema: Arc<FunctionSchema>,
}

impl OperatorHandle {
    pub fn schema(&self) -> &FunctionSchema {
        &self.schema
    }

    pub fn operator_name(&self) -> &OperatorName {
        self.schema.operator_name()
    }
}

/// Operator schemas and their per-device kernels.
///
/// Built once during startup, then shared read-only.
#[derive(Default)]
pub struct Dispatcher {
    operators: HashMap<OperatorName, OperatorEntry>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    pub fn declare(&mut self, schema: FunctionSchema) -> Result<OperatorHandle, DispatchError> {
        let name = schema.operator_name().clone();
        if self.operators.contains_key(&name) {
            return Err(DispatchError::DuplicateOperator(name));
        }

        debug!(operator = %name, "declared operator schema");
        let schema = Arc::new(schema);
        self.operators.insert(
            name,
            OperatorEntry {
                schema: Arc::clone(&schema),
                kernels: BTreeMap::new(),
            },
        );
        Ok(OperatorHandle { schema })
    }

    pub fn register_kernel(
        &mut self,
        name: &OperatorName,
        key: DispatchKey,
        kernel: KernelFunction,
    ) -> Result<(), DispatchError> {
        let entry = self
            .operators
            .get_mut(name)
            .ok_or_else(|| DispatchError::UnknownOperator(name.clone()))?;
        if entry.kernels.contains_key(&key) {
            return Err(DispatchError::DuplicateKernel {
                name: name.clone(),
                key,
            });
        }

        debug!(operator = %name, %key, "registered kernel");
        entry.kernels.insert(key, kernel);
        Ok(())
    }

    pub fn find(&self, name: &OperatorName) -> Option<OperatorHandle> {
        self.operators.get(name).map(|entry| OperatorHandle {
            schema: Arc::clone(&entry.schema),
        })
    }

    pub fn contains(&self, name: &OperatorName) -> bool {
        self.operators.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// All declared schemas, sorted by operator name.
    pub fn schemas(&self) -> Vec<&FunctionSchema> {
        let mut schemas: Vec<_> = self.operators.values().map(|e| e.schema.as_ref()).collect();
        schemas.sort_by(|a, b| a.operator_name().cmp(b.operator_name()));
        schemas
    }

    pub fn dispatch_keys(&self, name: &OperatorName) -> Vec<DispatchKey> {
        self.operators
            .get(name)
            .map(|e| e.kernels.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Run the kernel registered for `key` against `stack`.
    ///
    /// Kernel failures are returned as produced by the kernel.
    pub fn call(&self, op: &OperatorHandle, key: DispatchKey, stack: &mut Stack) -> Result<()> {
        let name = op.operator_name();
        let kernel = self
            .operators
            .get(name)
            .and_then(|e| e.kernels.get(&key).copied())
            .ok_or_else(|| DispatchError::MissingKernel {
                name: name.clone(),
                key,
            })?;

        trace!(operator = %name, %key, depth = stack.len(), "calling kernel");
        kernel(op.schema(), stack)
    }

    /// Like [`Dispatcher::call`], with the key taken from the first defined
    /// tensor among the operator's arguments on the stack.
    pub fn call_boxed(&self, op: &OperatorHandle, stack: &mut Stack) -> Result<()> {
        let key = dispatch_key_of(stack, op.schema().arguments().len());
        self.call(op, key, stack)
    }
}

/// Device class of the first defined tensor in the top `num_args` values,
/// or CPU if there is none.
pub fn dispatch_key_of(stack: &Stack, num_args: usize) -> DispatchKey {
    let args = stack::peek_n(stack, num_args.min(stack.len()));
    args.iter()
        .flat_map(|v| match v {
            IValue::Tensor(t) => std::slice::from_ref(t),
            IValue::TensorList(l) => l.as_slice(),
            _ => &[][..],
        })
        .find_map(|t| t.device())
        .map(DispatchKey::from)
        .unwrap_or(DispatchKey::Cpu)
}
