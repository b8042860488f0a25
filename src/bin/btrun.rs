//! Small demo CLI: parse a BT.CPP v4 XML file, register the built-in node
//! types, tick the result to completion, logging each tick's status.
//!
//! Usage: `btrun <path-to-tree.xml>`

use std::path::PathBuf;
use std::time::Duration;

use bt_rs::{register_builtins, BtParser, NodeRegistry, TreeNode};

fn main() {
    pretty_env_logger::init();

    let path = match std::env::args().nth(1) {
        Some(p) => PathBuf::from(p),
        None => {
            eprintln!("usage: btrun <path-to-tree.xml>");
            std::process::exit(2);
        }
    };

    let registry = NodeRegistry::new();
    if let Err(e) = register_builtins(&registry) {
        log::error!("failed to register built-in node types: {e}");
        std::process::exit(1);
    }

    let parser = BtParser::new(&registry);
    let mut tree = match parser.parse(&path, None) {
        Ok(tree) => tree,
        Err(e) => {
            log::error!("failed to parse {}: {e}", path.display());
            std::process::exit(1);
        }
    };

    log::info!("ticking tree [{}] from {}", tree.class_name(), path.display());

    loop {
        match tree.tick() {
            Ok(status) if status.is_running() => {
                log::debug!("tick -> {status}");
                std::thread::sleep(Duration::from_millis(100));
            }
            Ok(status) => {
                log::info!("tree finished: {status}");
                break;
            }
            Err(e) => {
                log::error!("tick error: {e}");
                std::process::exit(1);
            }
        }
    }
}
