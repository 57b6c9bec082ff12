use bevy_log::{debug, warn};
use indexmap::IndexMap;

use super::{AttrData, NodeData, PlugRef};
use crate::{
    errors::GraphResult,
    graph::{NodeId, Plug, SceneGraph, ScopeId},
    identity::{combine_namespace, short_name},
};

/// Ordered role -> node descriptor map. Materialization is best effort: anything that
/// cannot be resolved is logged and skipped, the rest still goes through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeBuildDataDict {
    entries: IndexMap<String, NodeData>,
}

impl NodeBuildDataDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `data` under its own name. A role that already exists is replaced.
    pub fn add_node_data(&mut self, data: NodeData) -> &mut NodeData {
        let key = data.name.clone();
        self.insert(key, data)
    }

    pub fn insert(&mut self, role: impl Into<String>, data: NodeData) -> &mut NodeData {
        let role = role.into();
        self.entries.insert(role.clone(), data);
        &mut self.entries[&role]
    }

    pub fn get_or_insert_with(
        &mut self,
        role: &str,
        default: impl FnOnce() -> NodeData,
    ) -> &mut NodeData {
        self.entries.entry(role.to_string()).or_insert_with(default)
    }

    pub fn get(&self, role: &str) -> Option<&NodeData> {
        self.entries.get(role)
    }

    pub fn get_mut(&mut self, role: &str) -> Option<&mut NodeData> {
        self.entries.get_mut(role)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.entries.contains_key(role)
    }

    pub fn node(&self, role: &str) -> Option<NodeId> {
        self.entries.get(role).and_then(|data| data.node)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeData)> {
        self.entries.iter().map(|(role, data)| (role.as_str(), data))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every bound node that is still alive.
    pub fn nodes(&self, graph: &SceneGraph) -> Vec<NodeId> {
        self.entries
            .values()
            .filter_map(|data| data.node)
            .filter(|node| graph.contains(*node))
            .collect()
    }

    /// Creates every node that is not bound to a live node yet and adds the declared
    /// attributes. Compounds that end up without children are dropped.
    pub fn create_nodes(&mut self, graph: &mut SceneGraph, namespace: &str) {
        for data in self.entries.values_mut() {
            prune_empty_compounds(data);

            let node = match data.node.filter(|node| graph.contains(*node)) {
                Some(node) => node,
                None => {
                    let name = combine_namespace([namespace, short_name(&data.name)]);
                    let node = graph.create_node(data.node_type.clone(), &name);
                    data.node = Some(node);
                    node
                }
            };

            for attr in data.attrs.values() {
                let Some(def) = attr.def() else {
                    continue;
                };
                if graph.has_attr(node, &attr.name) {
                    continue;
                }
                if let Err(err) = graph.add_attr(node, def) {
                    warn!("Could not add attribute {} to {}: {err}", attr.name, data.name);
                }
            }
        }
    }

    /// Applies declared values, connections and flags.
    pub fn connect_nodes(&self, graph: &mut SceneGraph) {
        for data in self.entries.values() {
            let Some(node) = data.node else {
                warn!("Node data {} was never materialized", data.name);
                continue;
            };
            for attr in data.attrs.values() {
                if !graph.has_attr(node, &attr.name) {
                    warn!("Attribute {} does not exist on {}, skipping", attr.name, data.name);
                    continue;
                }
                let plug = Plug::attr(node, &attr.name);

                if let Some(value) = &attr.value {
                    if !graph.is_connected(&plug) {
                        if let Err(err) = graph.set_value(&plug, value.clone()) {
                            warn!("Could not set {}: {err}", graph.describe(&plug));
                        }
                    }
                }

                for target in &attr.connections {
                    let Some(target) = self.resolve(target) else {
                        warn!(
                            "Connection target {target:?} of {} is not in the build data",
                            graph.describe(&plug)
                        );
                        continue;
                    };
                    if let Err(err) = graph.connect(&plug, &target) {
                        warn!(
                            "Could not connect {} to {}: {err}",
                            graph.describe(&plug),
                            graph.describe(&target)
                        );
                    }
                }

                if let Err(err) = apply_flags(graph, &plug, attr) {
                    warn!("Could not set flags on {}: {err}", graph.describe(&plug));
                }
            }
        }
    }

    /// Publishes every attribute marked for publishing onto `scope`. The scope node
    /// itself is skipped.
    pub fn publish_attrs(&self, graph: &mut SceneGraph, scope: ScopeId) {
        for data in self.entries.values() {
            let Some(node) = data.node.filter(|node| *node != scope) else {
                continue;
            };
            for attr in data.attrs.values() {
                let Some(external) = &attr.publish else {
                    continue;
                };
                let plug = Plug::attr(node, &attr.name);
                if let Err(err) = graph.publish(scope, &plug, external) {
                    warn!("Could not publish {}: {err}", graph.describe(&plug));
                }
            }
        }
    }

    /// Creates the scope pointers declared with `map_to_scope`.
    pub fn map_to_scope(&self, graph: &mut SceneGraph, scope: ScopeId) {
        for data in self.entries.values() {
            let (Some(node), Some(pointer)) = (data.node, &data.map_to_scope) else {
                continue;
            };
            if node == scope || graph.scope_pointer(scope, pointer) == Some(node) {
                continue;
            }
            if let Err(err) = graph.set_scope_pointer(scope, pointer, node) {
                warn!("Could not map {} to scope as {pointer}: {err}", data.name);
            }
        }
    }

    pub fn handle_node_data(&mut self, graph: &mut SceneGraph, namespace: &str) {
        self.create_nodes(graph, namespace);
        self.connect_nodes(graph);
    }

    fn resolve(&self, target: &PlugRef) -> Option<Plug> {
        match target {
            PlugRef::Plug(plug) => Some(plug.clone()),
            PlugRef::Role { role, path } => {
                Some(Plug::new(self.node(role)?, path.clone()))
            }
        }
    }
}

fn apply_flags(graph: &mut SceneGraph, plug: &Plug, attr: &AttrData) -> GraphResult<()> {
    graph.set_keyable(plug, attr.keyable)?;
    if let Some(alias) = &attr.alias {
        graph.set_alias(plug, alias)?;
    }
    if attr.locked {
        graph.set_locked(plug, true)?;
    }
    Ok(())
}

/// Drops compound descriptors with no declared children. Runs to a fixed point since
/// removing a compound can empty its parent.
fn prune_empty_compounds(data: &mut NodeData) {
    loop {
        let empty: Vec<String> = data
            .attrs
            .values()
            .filter(|attr| attr.is_compound() && data.child_count(&attr.name) == 0)
            .map(|attr| attr.name.clone())
            .collect();
        if empty.is_empty() {
            break;
        }
        for name in empty {
            debug!("Dropping empty compound {name} from {}", data.name);
            data.attrs.shift_remove(&name);
        }
    }
}
