//! Single-child decorators. Every decorator's `tick_child` helper ticks the
//! child and halts it immediately if the result is terminal; `Delay`
//! deliberately bypasses that wrapper once its wait elapses, matching the
//! reference implementation's explicit "not `tick_child()`" comment.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::node::{NodeCore, NodeError, TreeNode};
use crate::status::Status;

fn tick_child(child: &mut Box<dyn TreeNode>) -> Result<Status, NodeError> {
    let status = child.tick()?;
    if status.is_terminal() {
        child.halt();
    }
    Ok(status)
}

macro_rules! decorator_new {
    () => {
        pub fn new(children: Vec<Box<dyn TreeNode>>, ports: HashMap<String, String>) -> Self {
            assert_eq!(children.len(), 1, "decorator node requires exactly one child");
            Self::from_core(NodeCore::new(children, ports))
        }
    };
}

/// `Success` ↔ `Failure`; `Running`/`Skipped` pass through unchanged.
pub struct Inverter {
    core: NodeCore,
}

impl Inverter {
    decorator_new!();
    fn from_core(core: NodeCore) -> Self {
        Inverter { core }
    }
}

impl TreeNode for Inverter {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "Inverter"
    }
    fn do_tick(&mut self) -> Result<Status, NodeError> {
        match tick_child(&mut self.core.children[0])? {
            Status::Success => Ok(Status::Failure),
            Status::Failure => Ok(Status::Success),
            other => Ok(other),
        }
    }
}

/// `Running` passes through; anything else becomes `Success`.
pub struct ForceSuccess {
    core: NodeCore,
}

impl ForceSuccess {
    decorator_new!();
    fn from_core(core: NodeCore) -> Self {
        ForceSuccess { core }
    }
}

impl TreeNode for ForceSuccess {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "ForceSuccess"
    }
    fn do_tick(&mut self) -> Result<Status, NodeError> {
        match tick_child(&mut self.core.children[0])? {
            Status::Running => Ok(Status::Running),
            _ => Ok(Status::Success),
        }
    }
}

/// `Running` passes through; anything else becomes `Failure`.
pub struct ForceFailure {
    core: NodeCore,
}

impl ForceFailure {
    decorator_new!();
    fn from_core(core: NodeCore) -> Self {
        ForceFailure { core }
    }
}

impl TreeNode for ForceFailure {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "ForceFailure"
    }
    fn do_tick(&mut self) -> Result<Status, NodeError> {
        match tick_child(&mut self.core.children[0])? {
            Status::Running => Ok(Status::Running),
            _ => Ok(Status::Failure),
        }
    }
}

/// Ticks the child until it has succeeded `num_cycles` times (port
/// `num_cycles: int`, `-1` for forever). The success count persists across
/// ticks and is only reset by `halt()`. Missing/invalid port, or a child
/// `Failure`/`Skipped`, ends the loop immediately with that status.
pub struct Repeat {
    core: NodeCore,
    idx: i64,
}

impl Repeat {
    pub fn new(children: Vec<Box<dyn TreeNode>>, ports: HashMap<String, String>) -> Self {
        assert_eq!(children.len(), 1, "decorator node requires exactly one child");
        Repeat {
            core: NodeCore::new(children, ports),
            idx: 0,
        }
    }
}

impl TreeNode for Repeat {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "Repeat"
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        let num_cycles = match self.get_int("num_cycles") {
            Some(n) if n >= -1 => n,
            _ => return Ok(Status::Failure),
        };

        loop {
            if num_cycles >= 0 && self.idx >= num_cycles {
                break;
            }
            match tick_child(&mut self.core.children[0])? {
                Status::Running => return Ok(Status::Running),
                Status::Failure => return Ok(Status::Failure),
                Status::Skipped => return Ok(Status::Skipped),
                Status::Success => self.idx += 1,
            }
        }
        Ok(Status::Success)
    }

    fn do_reset(&mut self) {
        self.idx = 0;
    }
}

/// Ticks the child until it succeeds, up to `num_attempts` times (port
/// `num_attempts: int`, `-1` for forever). Unlike `Repeat`, the attempt
/// budget is *not* persisted across ticks; each call to `do_tick` starts a
/// fresh loop from zero, intentionally asymmetric with `Repeat`.
pub struct RetryUntilSuccessful {
    core: NodeCore,
}

impl RetryUntilSuccessful {
    decorator_new!();
    fn from_core(core: NodeCore) -> Self {
        RetryUntilSuccessful { core }
    }
}

impl TreeNode for RetryUntilSuccessful {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "RetryUntilSuccessful"
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        let num_attempts = match self.get_int("num_attempts") {
            Some(n) if n >= -1 => n,
            _ => return Ok(Status::Failure),
        };

        let mut attempt = 0i64;
        loop {
            if num_attempts >= 0 && attempt >= num_attempts {
                break;
            }
            match tick_child(&mut self.core.children[0])? {
                Status::Running => return Ok(Status::Running),
                Status::Success => return Ok(Status::Success),
                Status::Skipped => return Ok(Status::Skipped),
                Status::Failure => attempt += 1,
            }
        }
        Ok(Status::Failure)
    }
}

/// `Failure`/`Skipped` propagate; anything else (including `Success`)
/// becomes `Running`.
pub struct KeepRunningUntilFailure {
    core: NodeCore,
}

impl KeepRunningUntilFailure {
    decorator_new!();
    fn from_core(core: NodeCore) -> Self {
        KeepRunningUntilFailure { core }
    }
}

impl TreeNode for KeepRunningUntilFailure {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "KeepRunningUntilFailure"
    }
    fn do_tick(&mut self) -> Result<Status, NodeError> {
        match tick_child(&mut self.core.children[0])? {
            Status::Failure => Ok(Status::Failure),
            Status::Skipped => Ok(Status::Skipped),
            _ => Ok(Status::Running),
        }
    }
}

/// Returns `Running` until `delay_msec` (port, int) has elapsed since the
/// first tick, then ticks the child directly, deliberately bypassing the
/// auto-halt-on-terminal wrapper every other decorator uses, and returns
/// its status. `halt()` clears the recorded start time.
pub struct Delay {
    core: NodeCore,
    start: Option<Instant>,
}

impl Delay {
    pub fn new(children: Vec<Box<dyn TreeNode>>, ports: HashMap<String, String>) -> Self {
        assert_eq!(children.len(), 1, "decorator node requires exactly one child");
        Delay {
            core: NodeCore::new(children, ports),
            start: None,
        }
    }
}

impl TreeNode for Delay {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "Delay"
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        let start = *self.start.get_or_insert_with(Instant::now);

        let delay_msec = match self.get_int("delay_msec") {
            Some(d) => d,
            None => return Ok(Status::Failure),
        };

        if Instant::now() < start + Duration::from_millis(delay_msec.max(0) as u64) {
            return Ok(Status::Running);
        }

        self.core.children[0].tick()
    }

    fn do_reset(&mut self) {
        self.start = None;
    }
}

/// Ticks the child once; after it produces a non-`Running` result, that
/// result is cached. Subsequent ticks return `Skipped` (default, port
/// `then_skip: bool`) or replay the cached status. Not reset by `halt()`.
pub struct RunOnce {
    core: NodeCore,
    final_status: Option<Status>,
}

impl RunOnce {
    pub fn new(children: Vec<Box<dyn TreeNode>>, ports: HashMap<String, String>) -> Self {
        assert_eq!(children.len(), 1, "decorator node requires exactly one child");
        RunOnce {
            core: NodeCore::new(children, ports),
            final_status: None,
        }
    }
}

impl TreeNode for RunOnce {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }
    fn class_name(&self) -> &str {
        "RunOnce"
    }

    fn do_tick(&mut self) -> Result<Status, NodeError> {
        if self.final_status.is_none() {
            let status = tick_child(&mut self.core.children[0])?;
            if status.is_running() {
                return Ok(status);
            }
            self.final_status = Some(status);
            return Ok(status);
        }

        let ptr = self.get_bool("then_skip");
        let then_skip = ptr.borrow().as_bool().unwrap_or(true);
        if then_skip {
            Ok(Status::Skipped)
        } else {
            Ok(self.final_status.unwrap())
        }
    }
}
