//! Human-readable tree dump.
//!
//! ```text
//! DispatchTree
//! └─ type:
//!    ├─ a → ContextHandler
//!    ├─ x
//!    │  └─ mode:
//!    │     └─ on → DataHandler
//!    ├─ verbose(option) → ContextHandler
//!    └─ * → DataHandler
//! ```
//!
//! Purely descriptive; has no effect on dispatch.

use std::fmt;

use crate::tree::node::DispatchNode;

impl fmt::Display for DispatchNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DispatchTree")?;
        if let Some(handler) = self.handler() {
            writeln!(f, "└─ {}", handler.kind())?;
        }
        self.render(f, "", None)
    }
}

impl DispatchNode {
    fn render(&self, f: &mut fmt::Formatter<'_>, indent: &str, edge: Option<&str>) -> fmt::Result {
        let mut edges_indent = indent.to_string();
        if !self.field().is_empty() && edge != Some(self.field()) {
            writeln!(f, "{}└─ {}:", indent, self.field())?;
            edges_indent.push_str("   ");
        }

        let count = self.children().count();
        for (i, (key, child)) in self.children().enumerate() {
            let last = i + 1 == count;
            let connector = if last { "└─" } else { "├─" };

            let mut label = key.to_string();
            if self.is_optional(key) {
                label.push_str("(option)");
            }

            match child.handler() {
                Some(handler) => {
                    writeln!(f, "{}{} {} → {}", edges_indent, connector, label, handler.kind())?;
                }
                None => {
                    writeln!(f, "{}{} {}", edges_indent, connector, label)?;
                    let next_indent = format!("{}{}", edges_indent, if last { "   " } else { "│  " });
                    child.render(f, &next_indent, Some(label.as_str()))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::tree::TreeBuilder;
    use serde_json::json;

    #[test]
    fn test_flat_tree() {
        let tree = TreeBuilder::new()
            .field("type")
            .leaf("a", |_| Ok(json!("A")))
            .leaf_data("b", |_| Ok(json!("B")))
            .default_leaf(|_| Ok(json!("D")))
            .optional("verbose", |_| Ok(json!("V")))
            .build();

        let expected = "\
DispatchTree
└─ type:
   ├─ a → ContextHandler
   ├─ b → DataHandler
   ├─ * → ContextHandler
   └─ verbose(option) → ContextHandler
";
        assert_eq!(tree.to_string(), expected);
    }

    #[test]
    fn test_nested_tree() {
        let tree = TreeBuilder::new()
            .field("type")
            .branch(
                "x",
                TreeBuilder::new()
                    .field("mode")
                    .leaf("on", |_| Ok(json!(1)))
                    .leaf("off", |_| Ok(json!(0))),
            )
            .default_leaf_data(|_| Ok(json!("D")))
            .build();

        let expected = "\
DispatchTree
└─ type:
   ├─ x
   │  └─ mode:
   │     ├─ on → ContextHandler
   │     └─ off → ContextHandler
   └─ * → DataHandler
";
        assert_eq!(tree.to_string(), expected);
    }

    #[test]
    fn test_branch_named_like_its_field() {
        let tree = TreeBuilder::new()
            .field("kind")
            .branch(
                "shape",
                TreeBuilder::new().field("shape").leaf("circle", |_| Ok(json!("O"))),
            )
            .build();

        // the subtree's field line is folded into the edge label
        let expected = "\
DispatchTree
└─ kind:
   └─ shape
      └─ circle → ContextHandler
";
        assert_eq!(tree.to_string(), expected);
    }

    #[test]
    fn test_root_leaf() {
        let tree = TreeBuilder::new().handler_data(|_| Ok(json!(1))).build();
        assert_eq!(tree.to_string(), "DispatchTree\n└─ DataHandler\n");
    }
}
