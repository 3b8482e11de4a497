//! Bundled CPU legacy operators.
//!
//! Each operator implements [`opbridge_legacy::LegacyOperator`] on top of
//! [`opbridge_legacy::OperatorBase`] and is reachable through the
//! dispatcher once [`register_cpu_operators`] has run.

pub mod elementwise;
pub mod metadata;

mod registry;

pub use elementwise::{AddOp, ReluOp, ScaleOp, SumOp};
pub use metadata::ShapeOp;
pub use registry::register_cpu_operators;
