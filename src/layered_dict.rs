//! A stack of scoped maps: own entries plus an optional frozen parent frame.
//!
//! Used by [`crate::registry::NodeRegistry`] to give `scope()` callers a
//! transient registration layer that disappears when the scope guard drops,
//! without disturbing anything registered in an enclosing layer.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

#[derive(Debug)]
pub struct NotFound<K: std::fmt::Debug> {
    pub key: K,
    pub known_keys: Vec<K>,
}

impl<K: std::fmt::Debug> std::fmt::Display for NotFound<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "key not found: {:?}\nknown keys: {:?}",
            self.key, self.known_keys
        )
    }
}

impl<K: std::fmt::Debug> std::error::Error for NotFound<K> {}

/// One frame of the stack, with an optional immutable parent frame beneath
/// it. A frame's own entries are the only ones ever mutated; once a frame
/// becomes somebody's parent it is frozen.
pub struct LayeredDict<K, V> {
    own: HashMap<K, V>,
    parent: Option<Rc<LayeredDict<K, V>>>,
}

impl<K, V> LayeredDict<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new() -> Self {
        LayeredDict {
            own: HashMap::new(),
            parent: None,
        }
    }

    pub fn with_parent(parent: Rc<LayeredDict<K, V>>) -> Self {
        LayeredDict {
            own: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn parent(&self) -> Option<&Rc<LayeredDict<K, V>>> {
        self.parent.as_ref()
    }

    /// Top-layer-only write.
    pub fn set(&mut self, key: K, value: V) {
        self.own.insert(key, value);
    }

    /// Any-layer membership test.
    pub fn contains(&self, key: &K) -> bool {
        if self.own.contains_key(key) {
            return true;
        }
        match &self.parent {
            Some(p) => p.contains(key),
            None => false,
        }
    }

    /// Own layer first, then delegate up the stack; errors with the known
    /// keys (own-then-parent-overridden) on a total miss.
    pub fn get(&self, key: &K) -> Result<&V, NotFound<K>> {
        if let Some(v) = self.own.get(key) {
            return Ok(v);
        }
        if let Some(p) = &self.parent {
            if let Ok(v) = p.get(key) {
                return Ok(v);
            }
        }
        Err(NotFound {
            key: key.clone(),
            known_keys: self.flatten_keys(),
        })
    }

    /// Collapse the stack into one map, parent entries first, own entries
    /// overriding.
    pub fn flatten(&self) -> HashMap<K, V> {
        let mut out = match &self.parent {
            Some(p) => p.flatten(),
            None => HashMap::new(),
        };
        for (k, v) in self.own.iter() {
            out.insert(k.clone(), v.clone());
        }
        out
    }

    fn flatten_keys(&self) -> Vec<K> {
        self.flatten().into_keys().collect()
    }
}

impl<K, V> Default for LayeredDict<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
