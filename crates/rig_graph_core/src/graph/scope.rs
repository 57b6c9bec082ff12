use super::{AttrDef, AttrPath, AttrType, NodeId, NodeType, PathSegment, Plug, SceneGraph};
use crate::errors::{GraphError, GraphResult};

/// Message attribute on a node that receives a scope-level pointer.
pub const CONTAINER_NODE: &str = "containerNode";

impl SceneGraph {
    fn container(&self, scope: NodeId) -> GraphResult<&super::Node> {
        let node = self.node(scope)?;
        if node.node_type != NodeType::Container {
            return Err(GraphError::NotAScope(node.name.clone()));
        }
        Ok(node)
    }

    pub fn is_scope(&self, id: NodeId) -> bool {
        self.container(id).is_ok()
    }

    /// Moves `nodes` into `scope`. A node belongs to at most one scope.
    pub fn add_members(&mut self, scope: NodeId, nodes: &[NodeId]) -> GraphResult<()> {
        self.container(scope)?;
        for id in nodes {
            if *id == scope {
                continue;
            }
            self.node_mut(*id)?.scope = Some(scope);
        }
        Ok(())
    }

    pub fn remove_member(&mut self, id: NodeId) -> GraphResult<()> {
        self.node_mut(id)?.scope = None;
        Ok(())
    }

    pub fn scope_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(|node| node.scope)
    }

    /// Direct members of a scope, in creation order.
    pub fn members(&self, scope: NodeId) -> Vec<NodeId> {
        self.node_ids()
            .filter(|id| self.scope_of(*id) == Some(scope))
            .collect()
    }

    /// Members of `scope` and of every scope nested in it, excluding the nested
    /// containers themselves.
    pub fn all_members(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for member in self.members(scope) {
            if self.is_scope(member) {
                out.extend(self.all_members(member));
            } else {
                out.push(member);
            }
        }
        out
    }

    /// True if `id` sits in `scope` directly or through nested scopes.
    pub fn is_owned_by(&self, id: NodeId, scope: NodeId) -> bool {
        let mut current = self.scope_of(id);
        while let Some(parent) = current {
            if parent == scope {
                return true;
            }
            current = self.scope_of(parent);
        }
        false
    }

    /// Exposes `plug` on the scope under `external_name`.
    pub fn publish(&mut self, scope: NodeId, plug: &Plug, external_name: &str) -> GraphResult<()> {
        self.container(scope)?;
        let plug = self.canonical(plug)?;
        self.node_mut(scope)?
            .published
            .insert(external_name.to_string(), plug);
        Ok(())
    }

    pub fn unpublish(&mut self, scope: NodeId, external_name: &str) -> GraphResult<Option<Plug>> {
        self.container(scope)?;
        Ok(self.node_mut(scope)?.published.shift_remove(external_name))
    }

    pub fn published(&self, scope: NodeId) -> Vec<(String, Plug)> {
        self.container(scope)
            .map(|node| {
                node.published
                    .iter()
                    .map(|(name, plug)| (name.clone(), plug.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolves a path relative to a scope: published names first, then descendants of
    /// published compounds, then the container's own attributes.
    pub fn resolve_scope_path(&self, scope: NodeId, path: &AttrPath) -> Option<Plug> {
        let container = self.container(scope).ok()?;
        let (first, rest) = path.split_first()?;

        if let Some(base) = container.published.get(first.name()) {
            let mut segments = base.path.segments().to_vec();
            if let (Some(index), Some(last)) = (first.index(), segments.last_mut()) {
                *last = PathSegment::Indexed(last.name().to_string(), index);
            }
            let plug = Plug::new(base.node, AttrPath::from_segments(segments).join(&rest));
            return self.canonical(&plug).ok();
        }

        for base in container.published.values() {
            let Ok(node) = self.node(base.node) else {
                continue;
            };
            if node.is_descendant_of(first.name(), base.path.leaf_name()) {
                if let Ok(plug) = self.canonical(&Plug::new(base.node, path.clone())) {
                    return Some(plug);
                }
            }
        }

        if container.def(first.name()).is_some() {
            return self.canonical(&Plug::new(scope, path.clone())).ok();
        }
        None
    }

    /// Makes `node` discoverable from the scope as `name`.
    pub fn set_scope_pointer(&mut self, scope: NodeId, name: &str, node: NodeId) -> GraphResult<()> {
        self.container(scope)?;
        self.ensure_attr(scope, AttrDef::new(name, AttrType::Message))?;
        self.ensure_attr(node, AttrDef::new(CONTAINER_NODE, AttrType::Message))?;
        self.connect(&Plug::attr(scope, name), &Plug::attr(node, CONTAINER_NODE))
    }

    pub fn scope_pointer(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        if !self.has_attr(scope, name) {
            return None;
        }
        self.destinations(&Plug::attr(scope, name))
            .first()
            .map(|plug| plug.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_paths_resolve_through_the_scope() {
        let mut graph = SceneGraph::new();
        let scope = graph.create_node(NodeType::Container, "comp:container");
        let interface = graph.create_node(NodeType::Network, "comp:interface");
        graph.add_members(scope, &[interface]).unwrap();
        graph
            .add_attr(interface, AttrDef::new("hierData", AttrType::Compound))
            .unwrap();
        graph
            .add_attr(
                interface,
                AttrDef::new("hier", AttrType::Compound)
                    .multi()
                    .parent("hierData"),
            )
            .unwrap();
        graph
            .add_attr(
                interface,
                AttrDef::new("hierName", AttrType::String).parent("hier"),
            )
            .unwrap();
        graph
            .add_attr(interface, AttrDef::new("side", AttrType::Int))
            .unwrap();
        graph
            .publish(scope, &Plug::attr(interface, "hierData"), "hierData")
            .unwrap();
        graph
            .publish(scope, &Plug::attr(interface, "side"), "mySide")
            .unwrap();

        let path = AttrPath::parse("hier[2].hierName").unwrap();
        assert_eq!(
            graph.resolve_scope_path(scope, &path),
            Some(Plug::new(interface, path.clone()))
        );
        assert_eq!(
            graph.resolve_scope_path(scope, &AttrPath::new("mySide")),
            Some(Plug::attr(interface, "side"))
        );
        assert_eq!(graph.resolve_scope_path(scope, &AttrPath::new("nope")), None);
    }

    #[test]
    fn scope_pointers_find_nodes_by_role() {
        let mut graph = SceneGraph::new();
        let scope = graph.create_node(NodeType::Container, "container");
        let interface = graph.create_node(NodeType::Network, "interface");
        graph
            .set_scope_pointer(scope, "interfaceNode", interface)
            .unwrap();
        assert_eq!(graph.scope_pointer(scope, "interfaceNode"), Some(interface));
        assert_eq!(graph.scope_pointer(scope, "rootTransformNode"), None);
    }

    #[test]
    fn members_are_tracked_per_scope() {
        let mut graph = SceneGraph::new();
        let outer = graph.create_node(NodeType::Container, "outer");
        let inner = graph.create_node(NodeType::Container, "inner");
        let a = graph.create_node(NodeType::Network, "a");
        let b = graph.create_node(NodeType::Network, "b");
        graph.add_members(outer, &[inner, a]).unwrap();
        graph.add_members(inner, &[b]).unwrap();

        assert_eq!(graph.members(outer), vec![inner, a]);
        assert_eq!(graph.all_members(outer), vec![b, a]);
        assert!(graph.is_owned_by(b, outer));
        assert!(graph.add_members(a, &[b]).is_err());
    }
}
