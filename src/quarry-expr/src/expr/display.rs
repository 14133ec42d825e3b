//! Tree dumps of expression nodes for logs and test diagnostics.

use common_display::{truncate_label, DisplayTree, TreeNode};

use super::node::{Expr, ExprNode};

const MAX_CONSTANT_LABEL: usize = 40;

impl Expr {
    /// Render this tree as an indented multi-line dump.
    pub fn explain(&self) -> String {
        DisplayTree::new(self).to_string()
    }
}

impl TreeNode for Expr {
    fn label(&self) -> String {
        match self.node() {
            ExprNode::Constant(c) => format!(
                "Constant({})",
                truncate_label(&c.value.to_string(), MAX_CONSTANT_LABEL)
            ),
            ExprNode::Parameter(p) => format!("Parameter({})", p.name),
            ExprNode::Lambda(l) => {
                let params = l
                    .parameters
                    .iter()
                    .filter_map(|p| match p.node() {
                        ExprNode::Parameter(p) => Some(p.name.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Lambda({params})")
            }
            ExprNode::Unary(u) => format!("{}", u.op),
            ExprNode::Binary(b) => format!("Binary({})", b.op),
            ExprNode::MemberAccess(m) => format!("Member(.{})", m.member.name),
            ExprNode::MethodCall(c) => format!("Call({})", c.method.name),
            ExprNode::Invocation(_) => "Invoke".to_string(),
            ExprNode::New(n) => format!("New({})", n.constructor.data_type),
            ExprNode::MemberInit(_) => "MemberInit".to_string(),
            ExprNode::ListInit(_) => "ListInit".to_string(),
            ExprNode::Conditional(_) => "Conditional".to_string(),
            ExprNode::TypeIs(t) => format!("TypeIs({})", t.type_operand),
            ExprNode::Extension(e) => e.label(),
        }
    }

    fn details(&self) -> Option<String> {
        Some(self.data_type().to_string())
    }

    fn children(&self) -> Vec<&dyn TreeNode> {
        let exprs: Vec<&Expr> = match self.node() {
            ExprNode::Constant(_) | ExprNode::Parameter(_) => vec![],
            ExprNode::TypeIs(t) => vec![&t.operand],
            ExprNode::Lambda(l) => vec![&l.body],
            ExprNode::Unary(u) => vec![&u.operand],
            ExprNode::Binary(b) => {
                let mut children = vec![&b.left, &b.right];
                children.extend(b.conversion.as_ref());
                children
            }
            ExprNode::MemberAccess(m) => m.object.iter().collect(),
            ExprNode::MethodCall(c) => c.object.iter().chain(c.arguments.iter()).collect(),
            ExprNode::Invocation(i) => std::iter::once(&i.callee)
                .chain(i.arguments.iter())
                .collect(),
            ExprNode::New(n) => n.arguments.iter().collect(),
            ExprNode::MemberInit(m) => std::iter::once(&m.new_expr)
                .chain(m.bindings.iter().map(|b| &b.value))
                .collect(),
            ExprNode::ListInit(l) => std::iter::once(&l.new_expr)
                .chain(l.initializers.iter().flat_map(|i| i.arguments.iter()))
                .collect(),
            ExprNode::Conditional(c) => vec![&c.test, &c.if_true, &c.if_false],
            ExprNode::Extension(e) => e.children(),
        };

        exprs.into_iter().map(|e| e as &dyn TreeNode).collect()
    }
}
