//! `create.nodes`: batch node creation.

use serde_json::Value;
use tracing::debug;

use opdeck_types::{
    Args, Cancel, Command, CommandDefinition, CommandDescriptor, NodeHandle, SceneOps, SceneQuery, UiMetadata,
};

/// Creates `amount` nodes named `<name>0` through `<name>{amount-1}` as one
/// undoable step. Returns the handles of the created nodes in order.
#[derive(Debug, Default)]
pub struct CreateNodesCommand {
    created: Vec<NodeHandle>,
}

impl Command for CreateNodesCommand {
    fn resolve_arguments(&mut self, _scene: &dyn SceneQuery, mut args: Args) -> Result<Args, Cancel> {
        if args.str("name").is_none_or(str::is_empty) {
            return Err(Cancel::because("Please provide a name!"));
        }
        args.or_default("amount", 1);
        args.or_default("type", "transform");
        let amount = args.i64("amount").unwrap_or(0);
        if amount < 1 {
            return Err(Cancel::because("Amount must be at least 1!"));
        }
        Ok(args)
    }

    fn do_it(&mut self, scene: &mut dyn SceneOps, args: &Args) -> anyhow::Result<Value> {
        let name = args.str("name").unwrap_or_default();
        let node_type = args.str("type").unwrap_or_default();
        let amount = args.i64("amount").unwrap_or(1);

        // Batch commit: the whole run lands in the caller's single undo
        // chunk, never one chunk per node.
        let mut handles = Vec::with_capacity(amount as usize);
        for i in 0..amount {
            handles.push(scene.create_node(&format!("{name}{i}"), node_type)?);
        }
        debug!(amount, name, "created nodes");
        self.created = handles.clone();
        Ok(Value::Array(handles.iter().map(NodeHandle::to_value).collect()))
    }

    fn undo_it(&mut self, scene: &mut dyn SceneOps) -> anyhow::Result<bool> {
        if self.created.is_empty() {
            return Ok(false);
        }
        for handle in self.created.drain(..).rev() {
            // A node may already be gone if the scene changed underneath us;
            // the handle makes that detectable instead of dangerous.
            if scene.node_exists(handle) {
                scene.delete_node(handle)?;
            }
        }
        Ok(true)
    }
}

/// Registration entry for `create.nodes`.
pub fn definition() -> CommandDefinition {
    let descriptor = CommandDescriptor {
        id: "create.nodes".into(),
        creator: "Opdeck Team".into(),
        undoable: true,
        ui: UiMetadata {
            label: "Create Nodes".into(),
            icon: "plus".into(),
            tooltip: "Create a batch of scene nodes".into(),
        },
    };
    CommandDefinition::new(descriptor, || Box::new(CreateNodesCommand::default()))
}
