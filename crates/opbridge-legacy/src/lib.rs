//! Adapter that exposes legacy, strongly typed operators through the boxed
//! dispatcher.
//!
//! Registering an operator goes through [`register_legacy_operator_cpu`],
//! which builds its schema with [`make_function_schema`] and installs
//! [`legacy_kernel`] for it. At call time the kernel unpacks the stack,
//! optionally hands caller-provided output tensors to the operator for
//! reuse, runs it, and pushes the results.

pub mod adapter;
pub mod error;
pub mod operator;
pub mod registration;
pub mod schema;

pub use adapter::{call_legacy_op, call_legacy_op_from_stack, legacy_kernel, CallLegacyOpFn};
pub use error::OperatorError;
pub use operator::{LegacyOperator, OperatorBase};
pub use registration::*;
pub use schema::{
    legacy_operator_name, make_function_schema, preallocated_output_argument, LEGACY_NAMESPACE,
    PREALLOCATED_OUTPUT_ARGNAME,
};
