//! The node lifecycle: construction binds children and ports; attachment
//! walks the blackboard scope chain top-down; ticking caches a [`Status`].

use std::collections::HashMap;

use thiserror::Error;

use crate::blackboard::{Blackboard, BlackboardKind};
use crate::status::Status;
use crate::value::{Pointer, Value};

/// Structural/programmer errors a node can raise. Ordinary tick failures are
/// *not* represented here; they collapse to [`Status::Failure`].
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("node [{0}] was attached to a blackboard twice")]
    DoubleAttach(String),
    #[error("node [{0}] has no child at index {1}")]
    MissingChild(String, usize),
    #[error("decorator node [{0}] requires exactly one child")]
    DecoratorArity(String),
}

/// Fields shared by every node, regardless of kind. Kind-specific mutable
/// state (loop indices, timers, start flags) lives on the concrete struct
/// that embeds this.
pub struct NodeCore {
    /// Raw port mapping strings straight from the XML attributes, e.g.
    /// `"{parent_port}"`, `"{@world_port}"`, or a literal.
    pub ports: HashMap<String, String>,
    pub children: Vec<Box<dyn TreeNode>>,
    blackboard: Option<Blackboard>,
    status: Status,
    halted: bool,
}

impl NodeCore {
    pub fn new(children: Vec<Box<dyn TreeNode>>, ports: HashMap<String, String>) -> NodeCore {
        NodeCore {
            ports,
            children,
            blackboard: None,
            status: Status::Skipped,
            halted: false,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn blackboard(&self) -> &Blackboard {
        self.blackboard
            .as_ref()
            .expect("node ticked before attach_blackboard")
    }
}

/// The capability every node in the tree implements.
///
/// This is a trait, not a tagged enum, so that user-defined action nodes
/// compose with the built-in composites/decorators through the same object
/// safety boundary (`Box<dyn TreeNode>`).
pub trait TreeNode {
    fn core(&self) -> &NodeCore;
    fn core_mut(&mut self) -> &mut NodeCore;

    /// The registered type name (for `SubTree`, the subtree ID).
    fn class_name(&self) -> &str;

    /// Kind-specific tick behavior. Runs with `core().status()` already set
    /// to `Running` for the duration of the call.
    fn do_tick(&mut self) -> Result<Status, NodeError>;

    /// Kind-specific halt behavior (clear indices/timers/start flags).
    /// Children are halted by the default [`TreeNode::halt`] before this runs.
    fn do_reset(&mut self) {}

    /// Scope flavor this node wants for its own blackboard. `SubTree`
    /// overrides this to `Clean`/`Remapped`; `RootTree` overrides it back to
    /// `Child`.
    fn make_blackboard(&self, parent: &Blackboard) -> Blackboard {
        parent.create_child(BlackboardKind::Child)
    }

    /// The port `name`, if set, else [`TreeNode::class_name`].
    fn name(&self) -> String {
        let ptr = self.get("name");
        let named = ptr.borrow().as_str().map(|s| s.to_string());
        match named {
            Some(s) if !s.is_empty() => s,
            _ => self.class_name().to_string(),
        }
    }

    /// Tick the node: clears the halt guard, caches `Running`, runs
    /// `do_tick`, caches and returns the result.
    fn tick(&mut self) -> Result<Status, NodeError> {
        self.core_mut().halted = false;
        self.core_mut().status = Status::Running;
        let result = self.do_tick()?;
        self.core_mut().status = result;
        Ok(result)
    }

    /// Halt the node: idempotent per invocation. Recurses to children first,
    /// then runs the kind-specific reset.
    fn halt(&mut self) {
        if self.core().halted {
            return;
        }
        for child in self.core_mut().children.iter_mut() {
            child.halt();
        }
        self.core_mut().halted = true;
        self.do_reset();
    }

    /// Bind `parent_scope` top-down: this node creates its own scope, remaps
    /// ports against the parent, then recurses into children against its
    /// own scope. Attaching twice is a programmer error.
    fn attach_blackboard(&mut self, parent_scope: &Blackboard) -> Result<(), NodeError> {
        if self.core().blackboard.is_some() {
            return Err(NodeError::DoubleAttach(self.name()));
        }
        let own_scope = self.make_blackboard(parent_scope);
        Blackboard::remap(parent_scope, &own_scope, &self.core().ports.clone());
        self.core_mut().blackboard = Some(own_scope.clone());

        for child in self.core_mut().children.iter_mut() {
            child.attach_blackboard(&own_scope)?;
        }
        Ok(())
    }

    /// Resolve `key` against this node's blackboard.
    fn get(&self, key: &str) -> Pointer {
        self.core().blackboard().get(key)
    }

    /// Resolve `key`, applying `converter` in place if non-null.
    fn get_transform<F>(&self, key: &str, converter: F) -> Pointer
    where
        F: FnOnce(&Value) -> Value,
        Self: Sized,
    {
        self.core().blackboard().get_transform(key, converter)
    }

    /// Resolve `key` as a bool: `"true"`/`"false"` parse; an already-boolean
    /// or null value passes through.
    fn get_bool(&self, key: &str) -> Pointer {
        let ptr = self.get(key);
        let coerced = ptr.borrow().coerce_bool();
        if let Some(b) = coerced {
            *ptr.borrow_mut() = Value::Bool(b);
        }
        ptr
    }

    /// Resolve `key` as an int, parsing a string port value in place if
    /// needed. `None` if the port is missing, null, or not integral.
    fn get_int(&self, key: &str) -> Option<i64> {
        let ptr = self.get(key);
        let parsed = {
            let v = ptr.borrow();
            match &*v {
                Value::Int(i) => Some(*i),
                Value::String(s) => s.parse::<i64>().ok(),
                _ => None,
            }
        };
        if let Some(i) = parsed {
            *ptr.borrow_mut() = Value::Int(i);
        }
        parsed
    }

    /// Non-`None` only for [`crate::nodes::observer::Observer`] (and nodes
    /// wrapping one): the name and status of the nearest non-observer
    /// descendant this node last reported. Lets a chain of stacked
    /// observers all resolve to the same underlying node without any
    /// global mutable state; each observer asks its child for this before
    /// falling back to treating the child itself as the real node.
    fn observed_name_status(&self) -> Option<(String, Status)> {
        None
    }

    /// `Some(id)` only for subtree boundary nodes (`SubTree` and `RootTree`,
    /// which delegates to its inner `SubTree`), where `id` is the subtree's
    /// class name. Lets the writer recognize a subtree reference and recurse
    /// into its one child generically, without downcasting to a concrete
    /// type.
    fn subtree_id(&self) -> Option<&str> {
        None
    }

    /// Preorder walk: this node, then each child's preorder walk.
    fn iterate(&self, out: &mut Vec<&dyn TreeNode>) {
        out.push(self as &dyn TreeNode);
        for child in self.core().children.iter() {
            child.iterate(out);
        }
    }
}

impl dyn TreeNode {
    pub fn status(&self) -> Status {
        self.core().status()
    }

    pub fn children(&self) -> &[Box<dyn TreeNode>] {
        &self.core().children
    }

    /// Collect the preorder listing of this subtree.
    pub fn preorder(&self) -> Vec<&dyn TreeNode> {
        let mut out = Vec::new();
        self.iterate(&mut out);
        out
    }
}

/// A factory that instantiates one node given its children and raw port map.
/// Stored behind `Rc` so the registry can hand out cheap clones.
pub type NodeFactory =
    std::rc::Rc<dyn Fn(Vec<Box<dyn TreeNode>>, HashMap<String, String>) -> Box<dyn TreeNode>>;
