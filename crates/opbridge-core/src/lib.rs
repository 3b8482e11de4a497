pub mod dispatch_key;
pub mod ivalue;
pub mod schema;
pub mod stack;
pub mod tensor;

pub use dispatch_key::*;
pub use ivalue::*;
pub use schema::*;
pub use stack::Stack;
pub use tensor::*;
