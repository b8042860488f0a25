//! Built-in node kinds: composites, decorators, the observer, and the
//! subtree/root-tree boundary nodes.

pub mod composite;
pub mod decorator;
pub mod observer;
pub mod subtree;

#[cfg(test)]
pub(crate) mod test_support;

use crate::node::{NodeFactory, TreeNode};
use crate::registry::{NodeRegistry, RegistryError};

/// Register every built-in node type under its BT.CPP-dialect name.
pub fn register_builtins(registry: &NodeRegistry) -> Result<(), RegistryError> {
    macro_rules! register {
        ($name:literal, $ty:path) => {
            registry.register(
                $name,
                std::rc::Rc::new(|children, ports| {
                    Box::new(<$ty>::new(children, ports)) as Box<dyn TreeNode>
                }) as NodeFactory,
            )?;
        };
    }

    register!("Sequence", composite::Sequence);
    register!("SequenceWithMemory", composite::SequenceWithMemory);
    register!("ReactiveSequence", composite::ReactiveSequence);
    register!("Fallback", composite::Fallback);
    register!("ReactiveFallback", composite::ReactiveFallback);

    register!("Inverter", decorator::Inverter);
    register!("ForceSuccess", decorator::ForceSuccess);
    register!("ForceFailure", decorator::ForceFailure);
    register!("Repeat", decorator::Repeat);
    register!("RetryUntilSuccessful", decorator::RetryUntilSuccessful);
    register!(
        "KeepRunningUntilFailure",
        decorator::KeepRunningUntilFailure
    );
    register!("Delay", decorator::Delay);
    register!("RunOnce", decorator::RunOnce);

    register!("Observer", observer::Observer);

    Ok(())
}
