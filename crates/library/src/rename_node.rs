//! `rename.node`: single node rename.

use serde_json::Value;

use opdeck_types::{
    Args, Cancel, Command, CommandDefinition, CommandDescriptor, NodeHandle, SceneOps, SceneQuery, UiMetadata,
};

/// Renames one node; undo restores the previous name on the same handle.
#[derive(Debug, Default)]
pub struct RenameNodeCommand {
    renamed: Option<(NodeHandle, String)>,
}

impl Command for RenameNodeCommand {
    fn resolve_arguments(&mut self, scene: &dyn SceneQuery, args: Args) -> Result<Args, Cancel> {
        let Some(handle) = args.handle("node") else {
            return Err(Cancel::because("Please provide a node!"));
        };
        if !scene.node_exists(handle) {
            return Err(Cancel::because("Node does not exist!"));
        }
        if args.str("name").is_none_or(str::is_empty) {
            return Err(Cancel::because("Please provide a name!"));
        }
        Ok(args)
    }

    fn do_it(&mut self, scene: &mut dyn SceneOps, args: &Args) -> anyhow::Result<Value> {
        let handle = args.handle("node").ok_or_else(|| anyhow::anyhow!("missing resolved node handle"))?;
        let name = args.str("name").unwrap_or_default();
        let previous = scene
            .node_name(handle)
            .ok_or_else(|| anyhow::anyhow!("node disappeared between resolve and execute"))?;
        scene.rename_node(handle, name)?;
        self.renamed = Some((handle, previous));
        Ok(handle.to_value())
    }

    fn undo_it(&mut self, scene: &mut dyn SceneOps) -> anyhow::Result<bool> {
        match self.renamed.take() {
            Some((handle, previous)) if scene.node_exists(handle) => {
                scene.rename_node(handle, &previous)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Registration entry for `rename.node`.
pub fn definition() -> CommandDefinition {
    let descriptor = CommandDescriptor {
        id: "rename.node".into(),
        creator: "Opdeck Team".into(),
        undoable: true,
        ui: UiMetadata {
            label: "Rename Node".into(),
            icon: "tag".into(),
            tooltip: "Rename a scene node".into(),
        },
    };
    CommandDefinition::new(descriptor, || Box::new(RenameNodeCommand::default()))
}
