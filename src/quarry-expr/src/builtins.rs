//! Metadata for well-known host types and helpers.
//!
//! Rules recognize these members and methods by metadata equality, so hosts
//! must build their trees with the descriptors returned here.

use std::cmp::Ordering;

use common_error::{QuarryError, QuarryResult};

use crate::host::{Constructor, ConstructorInfo, Member, MemberInfo, Method, MethodInfo};
use crate::types::{DataType, Value};

/// Declaring type of the string comparison helper.
pub const OPERATORS_TYPE: &str = "Operators";

const COMPARE_STRING: &str = "CompareString";

// ========== Positional tuples ==========

/// Member `Item{index + 1}` of a tuple type.
pub fn tuple_item(tuple_type: &DataType, index: usize) -> QuarryResult<Member> {
    let DataType::Tuple(items) = tuple_type else {
        return Err(QuarryError::type_error(format!(
            "{tuple_type} is not a tuple type"
        )));
    };

    let item_type = items.get(index).ok_or_else(|| {
        QuarryError::type_error(format!("{tuple_type} has no item {}", index + 1))
    })?;

    Ok(MemberInfo::field(
        tuple_type.clone(),
        format!("Item{}", index + 1),
        item_type.clone(),
    )
    .build())
}

/// All positional members of a tuple type, in order.
pub fn tuple_members(tuple_type: &DataType) -> QuarryResult<Vec<Member>> {
    let DataType::Tuple(items) = tuple_type else {
        return Err(QuarryError::type_error(format!(
            "{tuple_type} is not a tuple type"
        )));
    };
    (0..items.len()).map(|i| tuple_item(tuple_type, i)).collect()
}

/// Positional constructor of the tuple type over `item_types`.
pub fn tuple_constructor(item_types: Vec<DataType>) -> Constructor {
    ConstructorInfo::new(DataType::Tuple(item_types.clone()), item_types).build()
}

// ========== Nullable wrappers ==========

/// The `Value` property of `Nullable(inner)`.
pub fn nullable_value(inner: DataType) -> Member {
    let nullable = DataType::nullable(inner.clone());
    let getter = MethodInfo::instance(nullable.clone(), "get_Value", vec![], inner.clone())
        .with_null_receiver()
        .with_body(|receiver, _| match receiver {
            None | Some(Value::Null) => Err(QuarryError::invalid_cast(
                "nullable object must have a value",
            )),
            Some(value) => Ok(value.clone()),
        })
        .build();
    MemberInfo::property(nullable, "Value", inner, getter).build()
}

/// The `HasValue` property of `Nullable(inner)`.
pub fn nullable_has_value(inner: DataType) -> Member {
    let nullable = DataType::nullable(inner);
    let getter = MethodInfo::instance(nullable.clone(), "get_HasValue", vec![], DataType::Bool)
        .with_null_receiver()
        .with_body(|receiver, _| Ok(Value::Bool(receiver.is_some_and(|v| !v.is_null()))))
        .build();
    MemberInfo::property(nullable, "HasValue", DataType::Bool, getter).build()
}

// ========== Strings ==========

/// The `Length` property of strings, in characters.
pub fn string_length() -> Member {
    let getter = MethodInfo::instance(DataType::String, "get_Length", vec![], DataType::Int64)
        .with_body(|receiver, _| {
            let s = receiver.and_then(Value::as_str).ok_or_else(|| {
                QuarryError::type_error("Length requires a string receiver")
            })?;
            i64::try_from(s.chars().count())
                .map(Value::Int64)
                .map_err(|_| QuarryError::overflow("string length exceeds Int64"))
        })
        .build();
    MemberInfo::property(DataType::String, "Length", DataType::Int64, getter).build()
}

/// `ToString()` on any value.
pub fn object_to_string() -> Method {
    MethodInfo::instance(DataType::Any, "ToString", vec![], DataType::String)
        .with_body(|receiver, _| {
            Ok(Value::String(match receiver {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            }))
        })
        .build()
}

/// Ordinal `String.CompareTo(other)`, returning -1, 0 or 1.
pub fn string_compare_to() -> Method {
    MethodInfo::instance(DataType::String, "CompareTo", vec![DataType::String], DataType::Int64)
        .with_body(|receiver, args| {
            let left = receiver.unwrap_or(&Value::Null);
            compare_strings(left, args.first().unwrap_or(&Value::Null), false)
        })
        .build()
}

/// The string comparison helper `Operators.CompareString(left, right,
/// text_compare)`, returning -1, 0 or 1.
///
/// With `text_compare` set, strings compare case-insensitively.
pub fn string_compare_helper() -> Method {
    MethodInfo::static_method(
        DataType::object(OPERATORS_TYPE),
        COMPARE_STRING,
        vec![DataType::String, DataType::String, DataType::Bool],
        DataType::Int64,
    )
    .with_body(|_, args| match args {
        [left, right, Value::Bool(text_compare)] => compare_strings(left, right, *text_compare),
        _ => Err(QuarryError::type_error(
            "CompareString expects (String, String, Bool)",
        )),
    })
    .build()
}

/// Whether `method` is the string comparison helper.
pub fn is_string_compare_helper(method: &MethodInfo) -> bool {
    method.is_static
        && method.name == COMPARE_STRING
        && method.declaring_type == DataType::object(OPERATORS_TYPE)
}

fn compare_strings(left: &Value, right: &Value, text_compare: bool) -> QuarryResult<Value> {
    let ordering = match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::String(l), Value::String(r)) if text_compare => {
            l.to_lowercase().cmp(&r.to_lowercase())
        }
        (Value::String(l), Value::String(r)) => l.cmp(r),
        _ => {
            return Err(QuarryError::type_error(format!(
                "cannot compare {} with {} as strings",
                left.data_type(),
                right.data_type()
            )))
        }
    };
    Ok(Value::Int64(ordering as i64))
}
