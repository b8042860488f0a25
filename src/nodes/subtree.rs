//! The subtree boundary: `SubTree` isolates its nested tree's blackboard
//! (clean, or auto-remapped if `_autoremap` is set) behind its own scope;
//! `RootTree` is the same node with that isolation switched back off, so the
//! externally supplied blackboard reaches the whole tree directly.

use std::collections::HashMap;

use crate::blackboard::{Blackboard, BlackboardKind};
use crate::node::{NodeCore, NodeError, TreeNode};
use crate::status::Status;

/// Wraps one nested tree, reporting its own `class_name()` as the subtree ID
/// rather than a fixed tag name; the writer and the parser's duplicate-ID
/// check both rely on this.
pub struct SubTree {
    core: NodeCore,
    id: String,
    autoremap: bool,
}

impl SubTree {
    pub fn new(id: String, child: Box<dyn TreeNode>, ports: HashMap<String, String>) -> Self {
        let autoremap = ports
            .get("_autoremap")
            .map(|s| s == "true")
            .unwrap_or(false);
        SubTree {
            core: NodeCore::new(vec![child], ports),
            id,
            autoremap,
        }
    }
}

impl TreeNode for SubTree {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        &self.id
    }

    fn subtree_id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn make_blackboard(&self, parent: &Blackboard) -> Blackboard {
        if self.autoremap {
            parent.create_child(BlackboardKind::Remapped)
        } else {
            parent.create_child(BlackboardKind::Clean)
        }
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        self.core.children[0].tick()
    }
}

/// A `SubTree` instantiated at the root of the whole tree. Identical in
/// every other respect, but uses the plain `Child` scope instead of
/// `Clean`/`Remapped`, so the caller's own blackboard isn't cut off from the
/// tree it's driving.
pub struct RootTree(SubTree);

impl RootTree {
    pub fn new(id: String, child: Box<dyn TreeNode>, ports: HashMap<String, String>) -> Self {
        RootTree(SubTree::new(id, child, ports))
    }
}

impl TreeNode for RootTree {
    fn core(&self) -> &NodeCore {
        self.0.core()
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        self.0.core_mut()
    }
    fn class_name(&self) -> &str {
        self.0.class_name()
    }

    fn subtree_id(&self) -> Option<&str> {
        self.0.subtree_id()
    }

    fn make_blackboard(&self, parent: &Blackboard) -> Blackboard {
        parent.create_child(BlackboardKind::Child)
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        self.0.do_tick()
    }
}
