//! The expression node model.
//!
//! Nodes are immutable and shared: an [`Expr`] is a cheap handle to a node,
//! and rewriting builds new nodes while reusing every unchanged subtree.
//! Handle identity ([`Expr::ptr_eq`]) is how passes detect "no change".

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use common_error::{QuarryError, QuarryResult};

use super::{BinaryOp, UnaryOp};
use crate::extension::ExtensionExpr;
use crate::host::{Constructor, Member, Method};
use crate::types::{DataType, Value};

/// Handle to an immutable, shared expression node.
#[derive(Clone)]
pub struct Expr(Arc<ExprNode>);

/// An expression node.
#[derive(Debug)]
pub enum ExprNode {
    /// A literal value.
    Constant(ConstantExpr),
    /// A reference to a lambda parameter.
    Parameter(ParameterExpr),
    /// A lambda abstraction.
    Lambda(LambdaExpr),
    /// A unary operation.
    Unary(UnaryExpr),
    /// A binary operation.
    Binary(BinaryExpr),
    /// A field or property read.
    MemberAccess(MemberExpr),
    /// A method call.
    MethodCall(MethodCallExpr),
    /// Invocation of a function-typed expression.
    Invocation(InvocationExpr),
    /// A constructor call.
    New(NewExpr),
    /// A constructor call followed by member assignments.
    MemberInit(MemberInitExpr),
    /// A constructor call followed by element additions.
    ListInit(ListInitExpr),
    /// A ternary conditional.
    Conditional(ConditionalExpr),
    /// A runtime type check.
    TypeIs(TypeIsExpr),
    /// A library- or host-defined node.
    Extension(Arc<dyn ExtensionExpr>),
}

/// Node kind, used for dispatching rules by shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Constant,
    Parameter,
    Lambda,
    Unary(UnaryOp),
    Binary(BinaryOp),
    MemberAccess,
    MethodCall,
    Invocation,
    New,
    MemberInit,
    ListInit,
    Conditional,
    TypeIs,
    Extension,
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantExpr {
    pub value: Value,
    pub data_type: DataType,
}

/// A lambda parameter. Parameters compare by identity.
#[derive(Debug, Clone)]
pub struct ParameterExpr {
    pub name: String,
    pub data_type: DataType,
}

/// A lambda abstraction over parameter nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub parameters: Vec<Expr>,
    pub body: Expr,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Expr,
    pub data_type: DataType,
}

/// A binary operation; `conversion` is the optional lambda applied to the
/// left operand of a coalesce.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Expr,
    pub right: Expr,
    pub conversion: Option<Expr>,
    pub data_type: DataType,
}

/// A member read; `object` is `None` for static members.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub object: Option<Expr>,
    pub member: Member,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCallExpr {
    pub object: Option<Expr>,
    pub method: Method,
    pub arguments: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvocationExpr {
    pub callee: Expr,
    pub arguments: Vec<Expr>,
    pub data_type: DataType,
}

/// A constructor call. When `members` is present, argument `i` initializes
/// member `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    pub constructor: Constructor,
    pub arguments: Vec<Expr>,
    pub members: Option<Vec<Member>>,
}

/// A member assignment inside an object initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberBinding {
    pub member: Member,
    pub value: Expr,
}

/// An object initializer; `new_expr` is always a [`ExprNode::New`] node.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInitExpr {
    pub new_expr: Expr,
    pub bindings: Vec<MemberBinding>,
}

/// One element-add call inside a collection initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementInit {
    pub add_method: Method,
    pub arguments: Vec<Expr>,
}

/// A collection initializer; `new_expr` is always a [`ExprNode::New`] node.
#[derive(Debug, Clone, PartialEq)]
pub struct ListInitExpr {
    pub new_expr: Expr,
    pub initializers: Vec<ElementInit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpr {
    pub test: Expr,
    pub if_true: Expr,
    pub if_false: Expr,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeIsExpr {
    pub operand: Expr,
    pub type_operand: DataType,
}

impl Expr {
    /// Wrap a node in a new handle.
    pub fn from_node(node: ExprNode) -> Self {
        Self(Arc::new(node))
    }

    /// The node behind this handle.
    pub fn node(&self) -> &ExprNode {
        &self.0
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The node kind.
    pub fn kind(&self) -> ExprKind {
        match self.node() {
            ExprNode::Constant(_) => ExprKind::Constant,
            ExprNode::Parameter(_) => ExprKind::Parameter,
            ExprNode::Lambda(_) => ExprKind::Lambda,
            ExprNode::Unary(u) => ExprKind::Unary(u.op),
            ExprNode::Binary(b) => ExprKind::Binary(b.op),
            ExprNode::MemberAccess(_) => ExprKind::MemberAccess,
            ExprNode::MethodCall(_) => ExprKind::MethodCall,
            ExprNode::Invocation(_) => ExprKind::Invocation,
            ExprNode::New(_) => ExprKind::New,
            ExprNode::MemberInit(_) => ExprKind::MemberInit,
            ExprNode::ListInit(_) => ExprKind::ListInit,
            ExprNode::Conditional(_) => ExprKind::Conditional,
            ExprNode::TypeIs(_) => ExprKind::TypeIs,
            ExprNode::Extension(_) => ExprKind::Extension,
        }
    }

    /// The static result type of this node.
    pub fn data_type(&self) -> DataType {
        match self.node() {
            ExprNode::Constant(c) => c.data_type.clone(),
            ExprNode::Parameter(p) => p.data_type.clone(),
            ExprNode::Lambda(l) => l.data_type.clone(),
            ExprNode::Unary(u) => u.data_type.clone(),
            ExprNode::Binary(b) => b.data_type.clone(),
            ExprNode::MemberAccess(m) => m.member.data_type.clone(),
            ExprNode::MethodCall(c) => c.method.return_type.clone(),
            ExprNode::Invocation(i) => i.data_type.clone(),
            ExprNode::New(n) => n.constructor.data_type.clone(),
            ExprNode::MemberInit(m) => m.new_expr.data_type(),
            ExprNode::ListInit(l) => l.new_expr.data_type(),
            ExprNode::Conditional(c) => c.data_type.clone(),
            ExprNode::TypeIs(_) => DataType::Bool,
            ExprNode::Extension(e) => e.data_type(),
        }
    }

    // ========== Accessors ==========

    /// The constant node, if this is one.
    pub fn as_constant(&self) -> Option<&ConstantExpr> {
        match self.node() {
            ExprNode::Constant(c) => Some(c),
            _ => None,
        }
    }

    /// The lambda node, if this is one.
    pub fn as_lambda(&self) -> Option<&LambdaExpr> {
        match self.node() {
            ExprNode::Lambda(l) => Some(l),
            _ => None,
        }
    }

    /// The construction node, if this is one.
    pub fn as_new(&self) -> Option<&NewExpr> {
        match self.node() {
            ExprNode::New(n) => Some(n),
            _ => None,
        }
    }

    /// The method-call node, if this is one.
    pub fn as_method_call(&self) -> Option<&MethodCallExpr> {
        match self.node() {
            ExprNode::MethodCall(c) => Some(c),
            _ => None,
        }
    }

    /// The extension node, if this is one.
    pub fn as_extension(&self) -> Option<&dyn ExtensionExpr> {
        match self.node() {
            ExprNode::Extension(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    /// Downcast an extension node to its concrete type.
    pub fn downcast_extension<T: ExtensionExpr>(&self) -> Option<&T> {
        self.as_extension()
            .and_then(|e| e.as_any().downcast_ref::<T>())
    }

    /// Reduce an extension node, enforcing the reduction contract.
    ///
    /// The reduction must differ from this node and its type must be
    /// assignable to this node's type.
    pub fn reduce_and_check(&self) -> QuarryResult<Self> {
        let ext = self.as_extension().ok_or_else(|| {
            QuarryError::extension_contract("only extension nodes can be reduced")
        })?;

        if !ext.can_reduce() {
            return Err(QuarryError::extension_contract(format!(
                "extension node '{}' must be reducible",
                ext.tag()
            )));
        }

        let reduced = ext.reduce()?;
        if reduced.ptr_eq(self) {
            return Err(QuarryError::extension_contract(format!(
                "extension node '{}' must not reduce to itself",
                ext.tag()
            )));
        }

        let expected = self.data_type();
        let actual = reduced.data_type();
        if !expected.is_assignable_from(&actual) {
            return Err(QuarryError::extension_contract(format!(
                "extension node '{}' reduced to {actual}, which is not assignable to {expected}",
                ext.tag()
            )));
        }

        Ok(reduced)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Expr {
    /// Structural equality; parameters compare by identity.
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.node() == other.node()
    }
}

impl PartialEq for ExprNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Constant(l), Self::Constant(r)) => l == r,
            // Distinct parameter nodes are distinct variables.
            (Self::Parameter(_), Self::Parameter(_)) => false,
            (Self::Lambda(l), Self::Lambda(r)) => l == r,
            (Self::Unary(l), Self::Unary(r)) => l == r,
            (Self::Binary(l), Self::Binary(r)) => l == r,
            (Self::MemberAccess(l), Self::MemberAccess(r)) => l == r,
            (Self::MethodCall(l), Self::MethodCall(r)) => l == r,
            (Self::Invocation(l), Self::Invocation(r)) => l == r,
            (Self::New(l), Self::New(r)) => l == r,
            (Self::MemberInit(l), Self::MemberInit(r)) => l == r,
            (Self::ListInit(l), Self::ListInit(r)) => l == r,
            (Self::Conditional(l), Self::Conditional(r)) => l == r,
            (Self::TypeIs(l), Self::TypeIs(r)) => l == r,
            (Self::Extension(l), Self::Extension(r)) => l.equals(r.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let ExprNode::Parameter(p) = self.node() {
            return write!(f, "Parameter({}@{:x})", p.name, self.addr());
        }
        self.node().fmt(f)
    }
}

/// Identity key for an [`Expr`], for maps keyed by node identity.
#[derive(Clone, Debug)]
pub struct ExprKey(Expr);

impl ExprKey {
    /// The keyed expression.
    pub fn expr(&self) -> &Expr {
        &self.0
    }
}

impl From<Expr> for ExprKey {
    fn from(expr: Expr) -> Self {
        Self(expr)
    }
}

impl From<&Expr> for ExprKey {
    fn from(expr: &Expr) -> Self {
        Self(expr.clone())
    }
}

impl PartialEq for ExprKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl Eq for ExprKey {}

impl Hash for ExprKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.addr().hash(state);
    }
}
