//! A BehaviorTree.CPP v4 XML-dialect compatible behavior tree execution
//! engine: blackboard, registry, built-in composites/decorators/observer,
//! subtree boundaries, XML parser and writer.
//!
//! Ticking is synchronous and single-threaded throughout; there is no
//! `.await` anywhere in this crate, and its core types (`Blackboard`,
//! `Pointer`, every `TreeNode`) are intentionally `!Send`. A host that wants
//! several trees running concurrently gives each its own thread, its own
//! registry scope, and its own blackboard.

pub mod blackboard;
pub mod layered_dict;
pub mod node;
pub mod nodes;
pub mod parser;
pub mod registry;
pub mod status;
pub mod value;
pub mod writer;

pub use blackboard::{Blackboard, BlackboardKind};
pub use node::{NodeCore, NodeError, NodeFactory, TreeNode};
pub use nodes::register_builtins;
pub use nodes::subtree::{RootTree, SubTree};
pub use parser::{BtParser, FsIncludeLoader, IncludeLoader, ParseError};
pub use registry::{NodeRegistry, RegistryError};
pub use status::Status;
pub use value::{Pointer, Value};
pub use writer::BtWriter;
