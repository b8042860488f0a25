//! Serializes a tree back to BT.CPP v4 XML: preorder walk, subtrees
//! deduplicated by class name and lifted out into their own
//! `<BehaviorTree ID="...">` blocks.

use std::collections::HashSet;

use crate::node::TreeNode;
use crate::nodes::subtree::RootTree;

/// Stateless entry point; `BtWriter` itself only exists to carry the
/// already-written-subtree-IDs set across one `to_xml` call.
pub struct BtWriter {
    seen_subtrees: HashSet<String>,
}

impl BtWriter {
    /// Serialize with a single tab per indent level (the reference default).
    pub fn to_xml_default(tree: &RootTree) -> String {
        Self::to_xml(tree, "\t")
    }

    pub fn to_xml(tree: &RootTree, indent: &str) -> String {
        let mut writer = BtWriter {
            seen_subtrees: HashSet::new(),
        };

        let tree_as_dyn: &dyn TreeNode = tree;
        let mut subtree_blocks = String::new();
        // `RootTree` reports its own `subtree_id()`, so the main tree is
        // picked up by the same preorder walk as every nested subtree.
        writer.collect_subtree_blocks(tree_as_dyn, indent, 1, &mut subtree_blocks);

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root BTCPP_format=\"4\" main_tree_to_execute=\"{}\">\n{subtree_blocks}</root>\n",
            tree.class_name(),
        )
    }

    /// Walk `node` preorder, emitting one `<BehaviorTree>` block per
    /// not-yet-seen subtree encountered (including `node` itself, if it is
    /// one; the main tree is always written as a block).
    fn collect_subtree_blocks(
        &mut self,
        node: &dyn TreeNode,
        indent: &str,
        level: usize,
        out: &mut String,
    ) {
        if node.subtree_id().is_some() {
            self.write_subtree_block(node, indent, level, out);
        }
        for child in node.children() {
            self.collect_subtree_blocks(&**child, indent, level, out);
        }
    }

    fn write_subtree_block(
        &mut self,
        tree: &dyn TreeNode,
        indent: &str,
        level: usize,
        out: &mut String,
    ) {
        let name = tree.subtree_id().expect("checked by caller").to_string();
        if !self.seen_subtrees.insert(name.clone()) {
            return;
        }

        out.push_str(&indent.repeat(level));
        out.push_str(&format!("<BehaviorTree ID=\"{name}\">\n"));
        out.push_str(&self.node_to_xml(&tree.children()[0], indent, level + 1));
        out.push('\n');
        out.push_str(&indent.repeat(level));
        out.push_str("</BehaviorTree>\n");
    }

    fn node_to_xml(&self, node: &dyn TreeNode, indent: &str, level: usize) -> String {
        let pad = indent.repeat(level);
        let attrs = port_attrs(node);

        if let Some(name) = node.subtree_id() {
            return format!("{pad}<SubTree ID=\"{name}\"{attrs} />");
        }

        let name = node.class_name();
        let children = node.children();
        if children.is_empty() {
            return format!("{pad}<{name}{attrs} />");
        }

        let child_lines: Vec<String> = children
            .iter()
            .map(|c| self.node_to_xml(&**c, indent, level + 1))
            .collect();
        format!(
            "{pad}<{name}{attrs}>\n{}\n{pad}</{name}>",
            child_lines.join("\n")
        )
    }
}

fn port_attrs(node: &dyn TreeNode) -> String {
    node.core()
        .ports
        .iter()
        .map(|(name, value)| format!(" {name}=\"{value}\""))
        .collect()
}
