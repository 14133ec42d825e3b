//! Display utilities for quarry.
//!
//! Provides tree-shaped dumps of expression trees for logs and diagnostics.

mod tree;

pub use tree::{DisplayTree, TreeNode};

/// Truncate a label to `max_len` characters, appending an ellipsis.
pub fn truncate_label(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
