//! Operator registry for boxed dispatch.
//!
//! Maps operator names to their schema and, per [`DispatchKey`], to a boxed
//! [`KernelFunction`]. Callers look up an [`OperatorHandle`] once and then
//! call through the dispatcher with a [`Stack`].
//!
//! [`DispatchKey`]: opbridge_core::DispatchKey
//! [`Stack`]: opbridge_core::Stack

pub mod dispatcher;
pub mod error;

pub use dispatcher::*;
pub use error::DispatchError;
