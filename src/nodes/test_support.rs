//! Shared test fixtures: scripted leaf actions used across the built-in
//! node unit tests, mirroring the reference test suite's `_EchoAction`/
//! `_StatusSequenceAction` helpers.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::node::{NodeCore, NodeError, TreeNode};
use crate::status::Status;

/// A leaf that plays back a scripted list of statuses, one per tick, and
/// holds the last entry once the script runs out. Tracks tick count and
/// whether it has ever been halted, so tests can assert on both.
pub struct StatusAction {
    core: NodeCore,
    script: Rc<RefCell<Vec<Status>>>,
    ticks: Rc<Cell<usize>>,
    halted: Rc<Cell<bool>>,
}

impl StatusAction {
    pub fn scripted(script: Rc<RefCell<Vec<Status>>>) -> StatusAction {
        StatusAction {
            core: NodeCore::new(Vec::new(), HashMap::new()),
            script,
            ticks: Rc::new(Cell::new(0)),
            halted: Rc::new(Cell::new(false)),
        }
    }

    pub fn once(status: Status) -> StatusAction {
        StatusAction::scripted(Rc::new(RefCell::new(vec![status])))
    }

    pub fn halted_flag(&self) -> Rc<Cell<bool>> {
        self.halted.clone()
    }

    pub fn tick_count(&self) -> Rc<Cell<usize>> {
        self.ticks.clone()
    }
}

impl TreeNode for StatusAction {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "StatusAction"
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        self.ticks.set(self.ticks.get() + 1);
        self.halted.set(false);
        let mut script = self.script.borrow_mut();
        if script.len() > 1 {
            Ok(script.remove(0))
        } else {
            Ok(*script.first().unwrap_or(&Status::Success))
        }
    }

    fn do_reset(&mut self) {
        self.halted.set(true);
    }
}
