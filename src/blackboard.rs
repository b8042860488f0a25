//! A layered, scoped key/value store with a separate "world" lane.
//!
//! Mirrors the reference `Blackboard`/`_AutoRemapped` design exactly: a
//! blackboard has a *stack* parent (used for plain scoped fallback) and a
//! *world* blackboard (shared tree-wide, addressed with an `@` prefix). A
//! top-level blackboard is its own world.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::value::{new_pointer, Pointer, Value};

/// The three scope flavors a node can request for its own blackboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlackboardKind {
    /// Delegates to the parent stack for misses; shares the parent's world.
    Child,
    /// No stack parent at all (isolated), but still shares the parent's world.
    Clean,
    /// Like `Child`, but eagerly shadows any `_`-prefixed key locally instead
    /// of letting it fall through to the parent stack.
    Remapped,
}

enum WorldRef {
    SelfWorld(Weak<RefCell<Inner>>),
    Other(Blackboard),
}

struct Inner {
    stack_parent: Option<Blackboard>,
    world: WorldRef,
    data: HashMap<String, Pointer>,
    auto_remap: bool,
}

/// Cheap to clone: it's a reference-counted handle to shared, interior-
/// mutable state, matching every node's shared claim on its scope.
#[derive(Clone)]
pub struct Blackboard(Rc<RefCell<Inner>>);

impl Blackboard {
    /// A fresh top-level blackboard: its own world, no stack parent.
    pub fn new_root() -> Blackboard {
        Blackboard(Rc::new_cyclic(|weak| {
            RefCell::new(Inner {
                stack_parent: None,
                world: WorldRef::SelfWorld(weak.clone()),
                data: HashMap::new(),
                auto_remap: false,
            })
        }))
    }

    /// A blackboard with an explicit stack parent and, optionally, an
    /// explicit world override (defaults to the parent's world).
    pub fn with_parent(parent: Blackboard, world: Option<Blackboard>) -> Blackboard {
        let world = world.unwrap_or_else(|| parent.world());
        Blackboard(Rc::new(RefCell::new(Inner {
            stack_parent: Some(parent),
            world: WorldRef::Other(world),
            data: HashMap::new(),
            auto_remap: false,
        })))
    }

    fn world(&self) -> Blackboard {
        match &self.0.borrow().world {
            WorldRef::SelfWorld(weak) => {
                Blackboard(weak.upgrade().expect("world blackboard was dropped"))
            }
            WorldRef::Other(bb) => bb.clone(),
        }
    }

    pub fn create_child(&self, kind: BlackboardKind) -> Blackboard {
        match kind {
            BlackboardKind::Child => Blackboard::with_parent(self.clone(), None),
            BlackboardKind::Clean => Blackboard(Rc::new(RefCell::new(Inner {
                stack_parent: None,
                world: WorldRef::Other(self.world()),
                data: HashMap::new(),
                auto_remap: false,
            }))),
            BlackboardKind::Remapped => {
                let child = Blackboard::with_parent(self.clone(), None);
                child.0.borrow_mut().auto_remap = true;
                child
            }
        }
    }

    /// Install port aliases/literals on `child`, reading alias sources from
    /// `parent`. `"{name}"` aliases a parent port (write-through both ways);
    /// any other string becomes a fresh literal pointer on `child`.
    pub fn remap(parent: &Blackboard, child: &Blackboard, mappings: &HashMap<String, String>) {
        for (child_port, mapping) in mappings {
            if let Some(parent_port) = mapping
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                let ptr = parent.get(parent_port);
                child.0.borrow_mut().data.insert(child_port.clone(), ptr);
            } else {
                child
                    .0
                    .borrow_mut()
                    .data
                    .insert(child_port.clone(), new_pointer(Value::String(mapping.clone())));
            }
        }
    }

    /// Resolve `key` to its Pointer, creating a local null entry if nothing
    /// along the chain (world, own, stack) already has it. Never an error.
    pub fn get(&self, key: &str) -> Pointer {
        if let Some(world_key) = key.strip_prefix('@') {
            return self.world().get(world_key);
        }

        if self.0.borrow().auto_remap
            && key.starts_with('_')
            && !self.0.borrow().data.contains_key(key)
        {
            self.0
                .borrow_mut()
                .data
                .insert(key.to_string(), new_pointer(Value::Null));
        }

        if let Some(ptr) = self.0.borrow().data.get(key).cloned() {
            return ptr;
        }

        let parent = self.0.borrow().stack_parent.clone();
        if let Some(parent) = parent {
            return parent.get(key);
        }

        let ptr = new_pointer(Value::Null);
        self.0.borrow_mut().data.insert(key.to_string(), ptr.clone());
        ptr
    }

    /// `get`, then apply `transform` in place if the resolved value is
    /// non-null. Returns the same Pointer either way.
    pub fn get_transform<F>(&self, key: &str, transform: F) -> Pointer
    where
        F: FnOnce(&Value) -> Value,
    {
        let ptr = self.get(key);
        let is_null = ptr.borrow().is_null();
        if !is_null {
            let new_value = transform(&ptr.borrow());
            *ptr.borrow_mut() = new_value;
        }
        ptr
    }

    pub fn set(&self, key: &str, value: Value) -> Value {
        let ptr = self.get(key);
        *ptr.borrow_mut() = value.clone();
        value
    }
}
