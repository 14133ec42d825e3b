//! Type system for expression nodes.

mod data_type;
mod value;

pub use data_type::DataType;
pub use value::{Callable, FnCallable, QuerySource, Record, Value};
