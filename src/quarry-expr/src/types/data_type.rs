//! Result types of expression nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Static result type of an expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Top type; every value is assignable to it.
    Any,
    /// Type of an untyped null literal.
    Null,
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Host-defined reference type, identified by name.
    Object(String),
    /// Well-known positional tuple; its members are `Item1..ItemN`.
    Tuple(Vec<DataType>),
    /// Optional wrapper around a value type; members `Value` and `HasValue`.
    Nullable(Box<DataType>),
    /// In-memory list of elements.
    List(Box<DataType>),
    /// Lazily-evaluated query source producing elements of the given type.
    Queryable(Box<DataType>),
    /// Function (delegate) type.
    Function {
        /// Parameter types.
        params: Vec<DataType>,
        /// Return type.
        ret: Box<DataType>,
    },
}

impl DataType {
    /// Create a named host object type.
    pub fn object(name: impl Into<String>) -> Self {
        Self::Object(name.into())
    }

    /// Create a nullable wrapper around `inner`.
    pub fn nullable(inner: Self) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// Create a list type.
    pub fn list(element: Self) -> Self {
        Self::List(Box::new(element))
    }

    /// Create a query-source type.
    pub fn queryable(element: Self) -> Self {
        Self::Queryable(Box::new(element))
    }

    /// Create a function type.
    pub fn function(params: Vec<Self>, ret: Self) -> Self {
        Self::Function {
            params,
            ret: Box::new(ret),
        }
    }

    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }

    /// Check if this type is a lazily-evaluated query source.
    pub const fn is_queryable(&self) -> bool {
        matches!(self, Self::Queryable(_))
    }

    /// The wrapped type, if this is a nullable wrapper.
    pub fn nullable_inner(&self) -> Option<&Self> {
        match self {
            Self::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    /// Whether a null value may be stored in a location of this type.
    pub const fn accepts_null(&self) -> bool {
        matches!(
            self,
            Self::Any
                | Self::Null
                | Self::String
                | Self::Object(_)
                | Self::Tuple(_)
                | Self::Nullable(_)
                | Self::List(_)
                | Self::Queryable(_)
                | Self::Function { .. }
        )
    }

    /// Whether a value of type `other` can be stored in a location of this type.
    pub fn is_assignable_from(&self, other: &Self) -> bool {
        if self == other {
            return true;
        }

        match (self, other) {
            (Self::Any, _) => true,
            (_, Self::Null) => self.accepts_null(),
            (Self::Nullable(inner), _) => inner.as_ref() == other,
            _ => false,
        }
    }

    /// The return type, if this is a function type.
    pub fn return_type(&self) -> Option<&Self> {
        match self {
            Self::Function { ret, .. } => Some(ret),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "Any"),
            Self::Null => write!(f, "Null"),
            Self::Bool => write!(f, "Bool"),
            Self::Int64 => write!(f, "Int64"),
            Self::Float64 => write!(f, "Float64"),
            Self::String => write!(f, "String"),
            Self::Object(name) => write!(f, "{name}"),
            Self::Tuple(items) => {
                let items = items
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Tuple<{items}>")
            }
            Self::Nullable(inner) => write!(f, "{inner}?"),
            Self::List(element) => write!(f, "List<{element}>"),
            Self::Queryable(element) => write!(f, "Queryable<{element}>"),
            Self::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "Fn({params}) -> {ret}")
            }
        }
    }
}
