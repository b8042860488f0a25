//! The observer decorator: ticks its single child and reports the *real*
//! (non-observer) node's name and status to an `observe` callback, even when
//! several observers are stacked on the same node.
//!
//! The reference implementation keeps a class-level "last observed node"
//! slot shared by every observer subclass, so that stacking observers on one
//! another still reports the same underlying node once per real tick. A
//! shared mutable global doesn't translate cleanly to owned, boxed children
//! in Rust, so this reaches the same observable behavior differently: each
//! observer asks its child for [`TreeNode::observed_name_status`] first, and
//! only falls back to treating the child itself as the real node when that
//! comes back empty; that's exactly the case where the child isn't itself
//! an observer.

use std::collections::HashMap;

use crate::node::{NodeCore, NodeError, TreeNode};
use crate::status::Status;

/// Default callback for nodes instantiated through the registry: logs the
/// observed node's name and status at debug level. Programmatic callers who
/// want to inspect observations directly should use [`Observer::with_callback`].
fn log_observation(name: &str, status: Status) {
    log::debug!("observed [{name}] -> {status}");
}

pub struct Observer {
    core: NodeCore,
    callback: Box<dyn FnMut(&str, Status)>,
    last_observed: std::cell::RefCell<Option<(String, Status)>>,
}

impl Observer {
    pub fn new(children: Vec<Box<dyn TreeNode>>, ports: HashMap<String, String>) -> Self {
        Observer::with_callback(children, ports, log_observation)
    }

    /// Construct with a custom observe callback, for programmatic trees that
    /// want to inspect ticks directly instead of only logging them.
    pub fn with_callback(
        children: Vec<Box<dyn TreeNode>>,
        ports: HashMap<String, String>,
        callback: impl FnMut(&str, Status) + 'static,
    ) -> Self {
        if children.len() != 1 {
            panic!("Observer requires exactly one child");
        }
        Observer {
            core: NodeCore::new(children, ports),
            callback: Box::new(callback),
            last_observed: std::cell::RefCell::new(None),
        }
    }
}

impl TreeNode for Observer {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "Observer"
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        let status = self.core.children[0].tick()?;
        let observed = self.core.children[0]
            .observed_name_status()
            .unwrap_or_else(|| (self.core.children[0].name(), status));

        *self.last_observed.borrow_mut() = Some(observed.clone());
        (self.callback)(&observed.0, observed.1);
        Ok(status)
    }

    fn observed_name_status(&self) -> Option<(String, Status)> {
        self.last_observed.borrow().clone()
    }
}
