//! Tree display utilities for expression trees.

use std::fmt;

/// A node in a display tree.
pub trait TreeNode {
    /// The one-line label of this node.
    fn label(&self) -> String;

    /// Child nodes in display order.
    fn children(&self) -> Vec<&dyn TreeNode>;

    /// Additional details shown in parentheses after the label.
    fn details(&self) -> Option<String> {
        None
    }
}

/// Renders a [`TreeNode`] hierarchy with box-drawing connectors.
pub struct DisplayTree<'a> {
    root: &'a dyn TreeNode,
}

impl<'a> DisplayTree<'a> {
    /// Create a new display tree.
    pub fn new(root: &'a dyn TreeNode) -> Self {
        Self { root }
    }

    fn fmt_header(f: &mut fmt::Formatter<'_>, node: &dyn TreeNode) -> fmt::Result {
        write!(f, "{}", node.label())?;
        if let Some(details) = node.details() {
            write!(f, " ({details})")?;
        }
        writeln!(f)
    }

    fn fmt_children(f: &mut fmt::Formatter<'_>, node: &dyn TreeNode, prefix: &str) -> fmt::Result {
        let children = node.children();
        let count = children.len();

        for (i, child) in children.into_iter().enumerate() {
            let is_last = i + 1 == count;
            let connector = if is_last { "└─ " } else { "├─ " };
            write!(f, "{prefix}{connector}")?;
            Self::fmt_header(f, child)?;

            let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });
            Self::fmt_children(f, child, &child_prefix)?;
        }

        Ok(())
    }
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::fmt_header(f, self.root)?;
        Self::fmt_children(f, self.root, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestNode {
        label: String,
        children: Vec<TestNode>,
    }

    impl TreeNode for TestNode {
        fn label(&self) -> String {
            self.label.clone()
        }

        fn children(&self) -> Vec<&dyn TreeNode> {
            self.children.iter().map(|c| c as &dyn TreeNode).collect()
        }
    }

    fn leaf(label: &str) -> TestNode {
        TestNode {
            label: label.to_string(),
            children: vec![],
        }
    }

    #[test]
    fn test_display_tree() {
        let tree = TestNode {
            label: "Add".to_string(),
            children: vec![
                TestNode {
                    label: "Multiply".to_string(),
                    children: vec![leaf("x"), leaf("3")],
                },
                leaf("12"),
            ],
        };

        let output = DisplayTree::new(&tree).to_string();
        let expected = "Add\n├─ Multiply\n│  ├─ x\n│  └─ 3\n└─ 12\n";
        assert_eq!(output, expected);
    }
}
