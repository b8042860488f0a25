//! Sequence/Fallback composites: with and without memory, and their
//! reactive (always-restart-the-scan) variants.
//!
//! `Skipped` from a child always means "try the next one"; it never
//! shortcircuits a composite the way `Success`/`Failure` does. None of these
//! nodes ever return `Skipped` themselves; only `Running`/`Success`/
//! `Failure` are produced at this level, matching the reference
//! implementation exactly.

use std::collections::HashMap;

use crate::node::{NodeCore, NodeError, TreeNode};
use crate::status::Status;

/// Ticks children left to right. The first `Failure` halts (all children)
/// and returns `Failure`; the first `Running` returns without halting.
/// Halting, whether externally or on a terminal result, resets the
/// resume index to 0, so an external halt forgets progress.
pub struct Sequence {
    core: NodeCore,
    index: usize,
}

impl Sequence {
    pub fn new(children: Vec<Box<dyn TreeNode>>, ports: HashMap<String, String>) -> Self {
        Sequence {
            core: NodeCore::new(children, ports),
            index: 0,
        }
    }
}

impl TreeNode for Sequence {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "Sequence"
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        while self.index < self.core.children.len() {
            match self.core.children[self.index].tick()? {
                Status::Failure => {
                    self.halt();
                    return Ok(Status::Failure);
                }
                Status::Running => return Ok(Status::Running),
                Status::Success | Status::Skipped => self.index += 1,
            }
        }
        self.halt();
        Ok(Status::Success)
    }

    fn do_reset(&mut self) {
        self.index = 0;
    }
}

/// Like [`Sequence`], but an external `halt()` does *not* forget progress:
/// only a terminal result (success or failure) resets the resume index.
pub struct SequenceWithMemory {
    core: NodeCore,
    index: usize,
}

impl SequenceWithMemory {
    pub fn new(children: Vec<Box<dyn TreeNode>>, ports: HashMap<String, String>) -> Self {
        SequenceWithMemory {
            core: NodeCore::new(children, ports),
            index: 0,
        }
    }
}

impl TreeNode for SequenceWithMemory {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "SequenceWithMemory"
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        while self.index < self.core.children.len() {
            match self.core.children[self.index].tick()? {
                Status::Failure => {
                    self.index = 0;
                    self.halt();
                    return Ok(Status::Failure);
                }
                Status::Running => return Ok(Status::Running),
                Status::Success | Status::Skipped => self.index += 1,
            }
        }
        self.index = 0;
        self.halt();
        Ok(Status::Success)
    }

    // halt() does not reset `index` for this node: progress survives an
    // external halt and is only cleared explicitly on a terminal tick.
}

/// Restarts the scan from index 0 on every tick; otherwise identical to
/// [`Sequence`]'s per-tick decision rule.
pub struct ReactiveSequence {
    core: NodeCore,
}

impl ReactiveSequence {
    pub fn new(children: Vec<Box<dyn TreeNode>>, ports: HashMap<String, String>) -> Self {
        ReactiveSequence {
            core: NodeCore::new(children, ports),
        }
    }
}

impl TreeNode for ReactiveSequence {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "ReactiveSequence"
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        for i in 0..self.core.children.len() {
            match self.core.children[i].tick()? {
                Status::Failure => {
                    self.halt();
                    return Ok(Status::Failure);
                }
                Status::Running => return Ok(Status::Running),
                Status::Success | Status::Skipped => continue,
            }
        }
        self.halt();
        Ok(Status::Success)
    }
}

/// Mirrors [`Sequence`] with success/failure swapped. The first `Success`
/// halts and returns `Success`; all-failures-or-skips halts and returns
/// `Failure`. An external halt resets the resume index, same as `Sequence`.
pub struct Fallback {
    core: NodeCore,
    index: usize,
}

impl Fallback {
    pub fn new(children: Vec<Box<dyn TreeNode>>, ports: HashMap<String, String>) -> Self {
        Fallback {
            core: NodeCore::new(children, ports),
            index: 0,
        }
    }
}

impl TreeNode for Fallback {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "Fallback"
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        while self.index < self.core.children.len() {
            match self.core.children[self.index].tick()? {
                Status::Success => {
                    self.halt();
                    return Ok(Status::Success);
                }
                Status::Running => return Ok(Status::Running),
                Status::Failure | Status::Skipped => self.index += 1,
            }
        }
        self.halt();
        Ok(Status::Failure)
    }

    fn do_reset(&mut self) {
        self.index = 0;
    }
}

/// Restarts the scan from index 0 on every tick. Remembers whether any
/// child returned `Running` so it can prefer `Running` over `Failure` once
/// the whole scan completes without a `Success`.
pub struct ReactiveFallback {
    core: NodeCore,
}

impl ReactiveFallback {
    pub fn new(children: Vec<Box<dyn TreeNode>>, ports: HashMap<String, String>) -> Self {
        ReactiveFallback {
            core: NodeCore::new(children, ports),
        }
    }
}

impl TreeNode for ReactiveFallback {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "ReactiveFallback"
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        let mut saw_running = false;
        for i in 0..self.core.children.len() {
            match self.core.children[i].tick()? {
                Status::Success => {
                    self.halt();
                    return Ok(Status::Success);
                }
                Status::Running => saw_running = true,
                Status::Failure | Status::Skipped => continue,
            }
        }
        if saw_running {
            Ok(Status::Running)
        } else {
            self.halt();
            Ok(Status::Failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::test_support::StatusAction;

    fn boxed(n: impl TreeNode + 'static) -> Box<dyn TreeNode> {
        Box::new(n)
    }

    #[test]
    fn sequence_restarts_on_external_halt_but_memory_resumes() {
        let statuses_a = std::rc::Rc::new(std::cell::RefCell::new(vec![Status::Success]));
        let statuses_b = std::rc::Rc::new(std::cell::RefCell::new(vec![Status::Running]));

        let mut seq = Sequence::new(
            vec![
                boxed(StatusAction::scripted(statuses_a.clone())),
                boxed(StatusAction::scripted(statuses_b.clone())),
            ],
            HashMap::new(),
        );

        assert_eq!(seq.tick().unwrap(), Status::Running);

        seq.halt();
        statuses_a.borrow_mut().push(Status::Running);
        statuses_b.borrow_mut().push(Status::Failure);

        // Restarted at 0: ticks child A again (Running), not resuming at B.
        assert_eq!(seq.tick().unwrap(), Status::Running);
    }

    #[test]
    fn sequence_with_memory_resumes_after_external_halt() {
        let statuses_a = std::rc::Rc::new(std::cell::RefCell::new(vec![Status::Success]));
        let statuses_b = std::rc::Rc::new(std::cell::RefCell::new(vec![Status::Running]));

        let mut seq = SequenceWithMemory::new(
            vec![
                boxed(StatusAction::scripted(statuses_a.clone())),
                boxed(StatusAction::scripted(statuses_b.clone())),
            ],
            HashMap::new(),
        );

        assert_eq!(seq.tick().unwrap(), Status::Running);

        seq.halt();
        statuses_b.borrow_mut().push(Status::Failure);

        // Resumed at index 1: child A is never ticked again.
        assert_eq!(seq.tick().unwrap(), Status::Failure);
    }

    #[test]
    fn fallback_halts_all_children_on_success() {
        let a = StatusAction::scripted(std::rc::Rc::new(std::cell::RefCell::new(vec![
            Status::Failure,
        ])));
        let b = StatusAction::scripted(std::rc::Rc::new(std::cell::RefCell::new(vec![
            Status::Success,
        ])));
        let a_halted = a.halted_flag();
        let b_halted = b.halted_flag();

        let mut fb = Fallback::new(vec![boxed(a), boxed(b)], HashMap::new());
        assert_eq!(fb.tick().unwrap(), Status::Success);
        assert!(a_halted.get());
        assert!(b_halted.get());
    }

    #[test]
    fn reactive_fallback_prefers_running_over_failure() {
        let a = StatusAction::scripted(std::rc::Rc::new(std::cell::RefCell::new(vec![
            Status::Failure,
        ])));
        let b = StatusAction::scripted(std::rc::Rc::new(std::cell::RefCell::new(vec![
            Status::Running,
        ])));

        let mut fb = ReactiveFallback::new(vec![boxed(a), boxed(b)], HashMap::new());
        assert_eq!(fb.tick().unwrap(), Status::Running);
    }

    #[test]
    fn reactive_sequence_restarts_scan_every_tick() {
        let a = StatusAction::scripted(std::rc::Rc::new(std::cell::RefCell::new(vec![
            Status::Success,
            Status::Success,
        ])));
        let b = StatusAction::scripted(std::rc::Rc::new(std::cell::RefCell::new(vec![
            Status::Running,
            Status::Success,
        ])));
        let a_ticks = a.tick_count();

        let mut seq = ReactiveSequence::new(vec![boxed(a), boxed(b)], HashMap::new());
        assert_eq!(seq.tick().unwrap(), Status::Running);
        assert_eq!(seq.tick().unwrap(), Status::Success);
        // `a` was ticked on both rounds because the reactive scan restarts.
        assert_eq!(a_ticks.get(), 2);
    }
}
