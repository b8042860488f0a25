//! A layered mapping from node-type name to factory.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::layered_dict::LayeredDict;
use crate::node::NodeFactory;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no node type registered under the name [{0}]")]
    Unknown(String),
    #[error("a node type is already registered under the name [{0}]")]
    Duplicate(String),
}

/// A layered name→factory table. `scope()` pushes a transient layer for the
/// duration of an RAII guard; registrations made inside it vanish when the
/// guard drops, leaving outer layers untouched.
///
/// A single `NodeRegistry` is meant to be shared across the trees parsed
/// from one process; wrap it in a `std::sync::Mutex` at the crate boundary
/// if it must be shared across threads (each thread's own tick loop stays
/// single-threaded regardless; see the crate's concurrency notes).
pub struct NodeRegistry {
    current: RefCell<Rc<LayeredDict<String, NodeFactory>>>,
}

impl NodeRegistry {
    pub fn new() -> NodeRegistry {
        NodeRegistry {
            current: RefCell::new(Rc::new(LayeredDict::new())),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.current.borrow().contains(&name.to_string())
    }

    pub fn get(&self, name: &str) -> Result<NodeFactory, RegistryError> {
        self.current
            .borrow()
            .get(&name.to_string())
            .cloned()
            .map_err(|_| RegistryError::Unknown(name.to_string()))
    }

    pub fn register(&self, name: &str, factory: NodeFactory) -> Result<(), RegistryError> {
        if self.has(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        Rc::make_mut(&mut self.current.borrow_mut()).set(name.to_string(), factory);
        Ok(())
    }

    /// Push a fresh registration layer. Registrations made while the guard
    /// is alive are visible; dropping the guard restores the prior layer.
    pub fn scope(&self) -> RegistryScope<'_> {
        let previous = self.current.borrow().clone();
        let pushed = Rc::new(LayeredDict::with_parent(previous.clone()));
        *self.current.borrow_mut() = pushed;
        RegistryScope {
            registry: self,
            previous: Some(previous),
        }
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`NodeRegistry::scope`]; pops the layer on drop.
pub struct RegistryScope<'a> {
    registry: &'a NodeRegistry,
    previous: Option<Rc<LayeredDict<String, NodeFactory>>>,
}

impl<'a> Drop for RegistryScope<'a> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.registry.current.borrow_mut() = previous;
        }
    }
}
