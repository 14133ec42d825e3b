//! Runtime values produced by evaluating expression subtrees.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use common_error::QuarryResult;

use super::DataType;
use crate::Expr;

/// Runtime value held by constant nodes.
#[derive(Debug, Clone)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Instance of a host object or tuple type.
    Record(Arc<Record>),
    /// In-memory list.
    List(Vec<Value>),
    /// Lazily-evaluated query source.
    Query(Arc<dyn QuerySource>),
    /// Callable value (closure or host delegate).
    Function(Arc<dyn Callable>),
}

/// A lazily-evaluated query source captured as a value.
///
/// The source records the expression it was built from; partial evaluation
/// inlines that expression in place of a constant holding the source.
pub trait QuerySource: fmt::Debug + Send + Sync {
    /// The expression this query was built from.
    fn expression(&self) -> Expr;

    /// Element type of the query.
    fn element_type(&self) -> DataType;
}

/// An opaque callable value.
pub trait Callable: fmt::Debug + Send + Sync {
    /// Invoke the callable with positional arguments.
    fn call(&self, args: &[Value]) -> QuarryResult<Value>;

    /// Function type of this callable.
    fn data_type(&self) -> DataType;
}

type HostCallable = dyn Fn(&[Value]) -> QuarryResult<Value> + Send + Sync;

/// A [`Callable`] backed by a host closure.
pub struct FnCallable {
    name: String,
    data_type: DataType,
    func: Box<HostCallable>,
}

impl FnCallable {
    /// Wrap a host closure as a callable value.
    pub fn new<F>(name: impl Into<String>, data_type: DataType, func: F) -> Self
    where
        F: Fn(&[Value]) -> QuarryResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            data_type,
            func: Box::new(func),
        }
    }
}

impl fmt::Debug for FnCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCallable")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .finish_non_exhaustive()
    }
}

impl Callable for FnCallable {
    fn call(&self, args: &[Value]) -> QuarryResult<Value> {
        (self.func)(args)
    }

    fn data_type(&self) -> DataType {
        self.data_type.clone()
    }
}

/// An instance of a host object or tuple type with named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    data_type: DataType,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create a record of the given type.
    pub fn new(data_type: DataType, fields: Vec<(String, Value)>) -> Self {
        Self { data_type, fields }
    }

    /// Create a tuple record; field `i` is named `Item{i + 1}`.
    pub fn tuple(items: Vec<Value>) -> Self {
        let data_type = DataType::Tuple(items.iter().map(Value::data_type).collect());
        let fields = items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("Item{}", i + 1), v))
            .collect();
        Self { data_type, fields }
    }

    /// The record's type.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// Return a copy with `name` set to `value`.
    #[must_use]
    pub fn with_field(&self, name: &str, value: Value) -> Self {
        let mut fields = self.fields.clone();
        match fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => fields.push((name.to_string(), value)),
        }
        Self {
            data_type: self.data_type.clone(),
            fields,
        }
    }
}

impl Value {
    /// Check if this value is null.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as boolean.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub const fn as_int64(&self) -> Option<i64> {
        match self {
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Runtime type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Bool(_) => DataType::Bool,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::String(_) => DataType::String,
            Self::Record(r) => r.data_type().clone(),
            Self::List(items) => {
                DataType::list(items.first().map_or(DataType::Any, Self::data_type))
            }
            Self::Query(q) => DataType::queryable(q.element_type()),
            Self::Function(f) => f.data_type(),
        }
    }

    /// Ordering between comparable scalar values.
    ///
    /// Integers and floats compare numerically; strings compare ordinally.
    pub fn partial_compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int64(l), Self::Int64(r)) => Some(l.cmp(r)),
            (Self::Float64(l), Self::Float64(r)) => l.partial_cmp(r),
            (Self::Int64(l), Self::Float64(r)) => (*l as f64).partial_cmp(r),
            (Self::Float64(l), Self::Int64(r)) => l.partial_cmp(&(*r as f64)),
            (Self::String(l), Self::String(r)) => Some(l.cmp(r)),
            (Self::Bool(l), Self::Bool(r)) => Some(l.cmp(r)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(l), Self::Bool(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::String(l), Self::String(r)) => l == r,
            (Self::Record(l), Self::Record(r)) => Arc::ptr_eq(l, r) || l == r,
            (Self::List(l), Self::List(r)) => l == r,
            (Self::Query(l), Self::Query(r)) => {
                Arc::as_ptr(l).cast::<()>() == Arc::as_ptr(r).cast::<()>()
            }
            (Self::Function(l), Self::Function(r)) => {
                Arc::as_ptr(l).cast::<()>() == Arc::as_ptr(r).cast::<()>()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int64(i) => write!(f, "{i}"),
            Self::Float64(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Record(r) => {
                let fields = r
                    .fields()
                    .iter()
                    .map(|(n, v)| format!("{n}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{} {{ {fields} }}", r.data_type())
            }
            Self::List(items) => {
                let items = items
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{items}]")
            }
            Self::Query(q) => write!(f, "<query of {}>", q.element_type()),
            Self::Function(func) => write!(f, "<{}>", func.data_type()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int64(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Self::Record(Arc::new(v))
    }
}
