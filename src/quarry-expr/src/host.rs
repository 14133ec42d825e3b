//! Host metadata referenced by call, member and construction nodes.
//!
//! Methods, members and constructors are described by shared metadata
//! objects. Each may carry a host body that the partial evaluator executes
//! when folding an independent subtree.

use std::fmt;
use std::sync::Arc;

use common_error::{QuarryError, QuarryResult};

use crate::transformer::TransformerFactory;
use crate::types::{DataType, Record, Value};

/// Host body of a method or constructor: `(receiver, arguments) -> result`.
pub type HostFn = Arc<dyn Fn(Option<&Value>, &[Value]) -> QuarryResult<Value> + Send + Sync>;

/// Shared handle to method metadata.
pub type Method = Arc<MethodInfo>;

/// Shared handle to member metadata.
pub type Member = Arc<MemberInfo>;

/// Shared handle to constructor metadata.
pub type Constructor = Arc<ConstructorInfo>;

/// Describes a callable method.
pub struct MethodInfo {
    /// Method name.
    pub name: String,
    /// Type declaring the method.
    pub declaring_type: DataType,
    /// Whether the method is called without a receiver.
    pub is_static: bool,
    /// Parameter types.
    pub parameter_types: Vec<DataType>,
    /// Return type.
    pub return_type: DataType,
    /// Whether the body receives null receivers instead of failing.
    pub accepts_null_receiver: bool,
    body: Option<HostFn>,
    transformer_factories: Vec<Arc<dyn TransformerFactory>>,
}

impl MethodInfo {
    /// Describe an instance method.
    pub fn instance(
        declaring_type: DataType,
        name: impl Into<String>,
        parameter_types: Vec<DataType>,
        return_type: DataType,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            is_static: false,
            parameter_types,
            return_type,
            accepts_null_receiver: false,
            body: None,
            transformer_factories: Vec::new(),
        }
    }

    /// Describe a static method.
    pub fn static_method(
        declaring_type: DataType,
        name: impl Into<String>,
        parameter_types: Vec<DataType>,
        return_type: DataType,
    ) -> Self {
        Self {
            is_static: true,
            ..Self::instance(declaring_type, name, parameter_types, return_type)
        }
    }

    /// Attach the host body executed when a call is folded.
    #[must_use]
    pub fn with_body<F>(mut self, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> QuarryResult<Value> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    /// Pass null receivers to the body, as value-type members do.
    #[must_use]
    pub fn with_null_receiver(mut self) -> Self {
        self.accepts_null_receiver = true;
        self
    }

    /// Declare a rule factory for calls to this method.
    #[must_use]
    pub fn with_transformer(mut self, factory: Arc<dyn TransformerFactory>) -> Self {
        self.transformer_factories.push(factory);
        self
    }

    /// Finish building and share the metadata.
    pub fn build(self) -> Method {
        Arc::new(self)
    }

    /// Rule factories declared on this method.
    pub fn transformer_factories(&self) -> &[Arc<dyn TransformerFactory>] {
        &self.transformer_factories
    }

    /// Execute the method's host body.
    pub fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> QuarryResult<Value> {
        if !self.is_static && !self.accepts_null_receiver && receiver.map_or(true, Value::is_null)
        {
            return Err(QuarryError::null_reference(format!(
                "cannot call method '{}' on a null receiver",
                self.name
            )));
        }

        let body = self.body.as_ref().ok_or_else(|| {
            QuarryError::evaluation(format!(
                "method '{}.{}' has no host body",
                self.declaring_type, self.name
            ))
        })?;

        body(receiver, args)
    }
}

impl PartialEq for MethodInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.declaring_type == other.declaring_type
            && self.is_static == other.is_static
            && self.parameter_types == other.parameter_types
            && self.return_type == other.return_type
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("is_static", &self.is_static)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// Describes a readable member (field or property).
pub struct MemberInfo {
    /// Member name.
    pub name: String,
    /// Type declaring the member.
    pub declaring_type: DataType,
    /// Type of the member's value.
    pub data_type: DataType,
    getter: Option<Method>,
    static_value: Option<Value>,
}

impl MemberInfo {
    /// Describe a field, read directly from the receiver record.
    pub fn field(declaring_type: DataType, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            data_type,
            getter: None,
            static_value: None,
        }
    }

    /// Describe a static field holding `value`, read without a receiver.
    pub fn static_field(declaring_type: DataType, name: impl Into<String>, value: Value) -> Self {
        Self {
            static_value: Some(value.clone()),
            ..Self::field(declaring_type, name, value.data_type())
        }
    }

    /// Describe a property read through a getter method.
    pub fn property(
        declaring_type: DataType,
        name: impl Into<String>,
        data_type: DataType,
        getter: Method,
    ) -> Self {
        Self {
            getter: Some(getter),
            ..Self::field(declaring_type, name, data_type)
        }
    }

    /// Finish building and share the metadata.
    pub fn build(self) -> Member {
        Arc::new(self)
    }

    /// The property getter, if this member is a property.
    pub fn getter(&self) -> Option<&Method> {
        self.getter.as_ref()
    }

    /// Read the member from `receiver`.
    ///
    /// Without a receiver only a static field can be read.
    pub fn read(&self, receiver: Option<&Value>) -> QuarryResult<Value> {
        if let Some(getter) = &self.getter {
            return getter.invoke(receiver, &[]);
        }

        match (receiver, &self.static_value) {
            (None, Some(value)) => Ok(value.clone()),
            (None | Some(Value::Null), _) => Err(QuarryError::null_reference(format!(
                "cannot read member '{}' of a null receiver",
                self.name
            ))),
            (Some(Value::Record(record)), _) => {
                record.field(&self.name).cloned().ok_or_else(|| {
                    QuarryError::type_error(format!(
                        "{} has no member '{}'",
                        record.data_type(),
                        self.name
                    ))
                })
            }
            (Some(other), _) => Err(QuarryError::type_error(format!(
                "cannot read member '{}' of {}",
                self.name,
                other.data_type()
            ))),
        }
    }
}

impl PartialEq for MemberInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.declaring_type == other.declaring_type
            && self.data_type == other.data_type
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("data_type", &self.data_type)
            .finish_non_exhaustive()
    }
}

/// Describes a constructor.
pub struct ConstructorInfo {
    /// Constructed type.
    pub data_type: DataType,
    /// Parameter types.
    pub parameter_types: Vec<DataType>,
    body: Option<HostFn>,
}

impl ConstructorInfo {
    /// Describe a constructor of `data_type`.
    pub fn new(data_type: DataType, parameter_types: Vec<DataType>) -> Self {
        Self {
            data_type,
            parameter_types,
            body: None,
        }
    }

    /// Attach the host body executed when a construction is folded.
    #[must_use]
    pub fn with_body<F>(mut self, body: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> QuarryResult<Value> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    /// Finish building and share the metadata.
    pub fn build(self) -> Constructor {
        Arc::new(self)
    }

    /// Construct an instance.
    ///
    /// Without a host body, tuples become `Item`-named records, lists start
    /// empty, and other types become records whose fields are named by
    /// `members` (or empty when no arguments are given).
    pub fn invoke(&self, args: &[Value], members: Option<&[Member]>) -> QuarryResult<Value> {
        if let Some(body) = &self.body {
            return body(None, args);
        }

        match (&self.data_type, members) {
            (DataType::Tuple(_), _) => Ok(Record::tuple(args.to_vec()).into()),
            (DataType::List(_), _) if args.is_empty() => Ok(Value::List(Vec::new())),
            (_, Some(members)) if members.len() == args.len() => {
                let fields = members
                    .iter()
                    .zip(args)
                    .map(|(m, v)| (m.name.clone(), v.clone()))
                    .collect();
                Ok(Record::new(self.data_type.clone(), fields).into())
            }
            (_, _) if args.is_empty() => Ok(Record::new(self.data_type.clone(), vec![]).into()),
            _ => Err(QuarryError::evaluation(format!(
                "constructor of {} has no host body",
                self.data_type
            ))),
        }
    }
}

impl PartialEq for ConstructorInfo {
    fn eq(&self, other: &Self) -> bool {
        self.data_type == other.data_type && self.parameter_types == other.parameter_types
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("data_type", &self.data_type)
            .field("parameter_types", &self.parameter_types)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_method_on_null_receiver() {
        let method = MethodInfo::instance(DataType::Any, "ToString", vec![], DataType::String)
            .with_body(|recv, _| Ok(Value::String(recv.map(ToString::to_string).unwrap_or_default())))
            .build();

        let err = method.invoke(Some(&Value::Null), &[]).unwrap_err();
        assert!(matches!(err, QuarryError::NullReference(_)));

        let ok = method.invoke(Some(&Value::Int64(7)), &[]).unwrap();
        assert_eq!(ok, Value::from("7"));
    }

    #[test]
    fn test_method_without_body() {
        let method = MethodInfo::static_method(DataType::object("Math"), "Max", vec![], DataType::Int64)
            .build();
        assert!(matches!(
            method.invoke(None, &[]),
            Err(QuarryError::EvaluationError(_))
        ));
    }

    #[test]
    fn test_field_read() {
        let person = DataType::object("Person");
        let name = MemberInfo::field(person.clone(), "name", DataType::String).build();
        let record: Value = Record::new(person, vec![("name".into(), Value::from("Ada"))]).into();

        assert_eq!(name.read(Some(&record)).unwrap(), Value::from("Ada"));
        assert!(matches!(
            name.read(Some(&Value::Null)),
            Err(QuarryError::NullReference(_))
        ));
        assert!(matches!(name.read(None), Err(QuarryError::NullReference(_))));
    }

    #[test]
    fn test_static_field_read() {
        let limits = DataType::object("Limits");
        let max = MemberInfo::static_field(limits, "Max", Value::Int64(100)).build();

        assert_eq!(max.data_type, DataType::Int64);
        assert_eq!(max.read(None).unwrap(), Value::Int64(100));
    }

    #[test]
    fn test_default_construction() {
        let tuple_ty = DataType::Tuple(vec![DataType::Int64, DataType::String]);
        let ctor = ConstructorInfo::new(tuple_ty.clone(), vec![DataType::Int64, DataType::String]);
        let value = ctor
            .invoke(&[Value::Int64(1), Value::from("a")], None)
            .unwrap();
        assert_eq!(value.data_type(), tuple_ty);
    }
}
