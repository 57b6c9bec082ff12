mod attribute;
mod evaluate;
mod namespace;
mod node_type;
mod path;
mod scope;
mod serial;
pub mod solvers;

use std::collections::{BTreeSet, HashMap, HashSet};

use bevy_log::debug;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use attribute::*;
pub use node_type::*;
pub use path::*;
pub use scope::CONTAINER_NODE;

use crate::{
    errors::{GraphError, GraphResult},
    identity::{combine_namespace, split_namespace, strip_trailing_numbers},
};

/// Arena index of a node. Ids are never reused within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Id of a scope container node.
pub type ScopeId = NodeId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) node_type: NodeType,
    pub(crate) defs: IndexMap<String, AttrDef>,
    pub(crate) values: IndexMap<String, AttrValue>,
    pub(crate) multi_indices: IndexMap<String, BTreeSet<usize>>,
    pub(crate) scope: Option<NodeId>,
    pub(crate) dag_parent: Option<NodeId>,
    pub(crate) published: IndexMap<String, Plug>,
}

impl Node {
    fn new(name: String, node_type: NodeType) -> Self {
        let defs = node_type
            .builtin_attrs()
            .into_iter()
            .map(|def| (def.name.clone(), def))
            .collect();
        Self {
            name,
            node_type,
            defs,
            values: IndexMap::new(),
            multi_indices: IndexMap::new(),
            scope: None,
            dag_parent: None,
            published: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    pub fn scope(&self) -> Option<NodeId> {
        self.scope
    }

    pub fn dag_parent(&self) -> Option<NodeId> {
        self.dag_parent
    }

    /// Attribute definition by name or alias.
    pub fn def(&self, name: &str) -> Option<&AttrDef> {
        self.defs.get(name).or_else(|| {
            self.defs
                .values()
                .find(|def| def.alias.as_deref() == Some(name))
        })
    }

    pub fn defs(&self) -> impl Iterator<Item = &AttrDef> {
        self.defs.values()
    }

    pub fn published(&self) -> &IndexMap<String, Plug> {
        &self.published
    }

    fn record_indices(&mut self, path: &AttrPath) {
        for segment in path.segments() {
            if let PathSegment::Indexed(name, index) = segment {
                self.multi_indices
                    .entry(name.clone())
                    .or_default()
                    .insert(*index);
            }
        }
    }

    fn is_descendant_of(&self, name: &str, ancestor: &str) -> bool {
        let mut current = self.def(name).and_then(|def| def.parent.clone());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.def(&parent).and_then(|def| def.parent.clone());
        }
        false
    }
}

/// In-memory graph document: typed nodes, typed attributes, connections, scopes and
/// namespaces. All rig construction goes through this handle.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    names: HashMap<String, NodeId>,
    /// target plug -> source plug
    edges: HashMap<Plug, Plug>,
    edges_out: HashMap<Plug, Vec<Plug>>,
    namespaces: BTreeSet<String>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Nodes
    // ----------------------------------------------------------------------------------------

    /// Creates a node. `name` may be namespace-qualified; missing namespaces are created
    /// and clashing names get a numeric suffix.
    pub fn create_node(&mut self, node_type: NodeType, name: &str) -> NodeId {
        let name = self.unique_name(name);
        let (namespace, _) = split_namespace(&name);
        self.ensure_namespace(namespace);

        let id = NodeId(self.nodes.len() as u32);
        self.names.insert(name.clone(), id);
        self.nodes.push(Some(Node::new(name, node_type)));
        id
    }

    pub fn node(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(GraphError::MissingNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(GraphError::MissingNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn name(&self, id: NodeId) -> GraphResult<&str> {
        self.node(id).map(Node::name)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_some())
            .map(|(i, _)| NodeId(i as u32))
    }

    /// Id the next created node will get. Ids grow monotonically, so this doubles as a
    /// watermark for "created after this point".
    pub fn next_node_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u32)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn unique_name(&self, desired: &str) -> String {
        if !self.names.contains_key(desired) {
            return desired.to_string();
        }
        let (namespace, short) = split_namespace(desired);
        let base = strip_trailing_numbers(short);
        (1..)
            .map(|i| combine_namespace([namespace, &format!("{base}{i}")]))
            .find(|candidate| !self.names.contains_key(candidate))
            .unwrap_or_else(|| desired.to_string())
    }

    /// Renames a node, returning the name it ended up with.
    pub fn rename_node(&mut self, id: NodeId, new_name: &str) -> GraphResult<String> {
        let old = self.name(id)?.to_string();
        if old == new_name {
            return Ok(old);
        }
        let new_name = self.unique_name(new_name);
        self.ensure_namespace(split_namespace(&new_name).0);
        self.names.remove(&old);
        self.names.insert(new_name.clone(), id);
        self.node_mut(id)?.name = new_name.clone();
        Ok(new_name)
    }

    /// Deletes a node. Containers take their members (and nested containers) with them.
    /// Surviving attributes that were driven by a deleted node keep its last value.
    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<()> {
        self.node(id)?;
        let mut doomed = Vec::new();
        self.collect_owned(id, &mut doomed);
        let doomed: HashSet<NodeId> = doomed.into_iter().collect();

        let baked: Vec<(Plug, AttrValue)> = self
            .edges
            .iter()
            .filter(|(target, source)| {
                doomed.contains(&source.node) && !doomed.contains(&target.node)
            })
            .filter_map(|(target, source)| Some((target.clone(), self.value(source)?)))
            .collect();

        self.edges
            .retain(|target, source| !doomed.contains(&target.node) && !doomed.contains(&source.node));
        self.edges_out.retain(|source, _| !doomed.contains(&source.node));
        for targets in self.edges_out.values_mut() {
            targets.retain(|target| !doomed.contains(&target.node));
        }

        for (target, value) in baked {
            let Ok(node) = self.node_mut(target.node) else {
                continue;
            };
            let Some(def) = node.def(target.path.leaf_name()) else {
                continue;
            };
            if let Ok(value) = def.ty.coerce(value) {
                node.values.insert(target.path.to_string(), value);
            }
        }

        for node in self.nodes.iter_mut().flatten() {
            node.published.retain(|_, plug| !doomed.contains(&plug.node));
            if node.dag_parent.is_some_and(|parent| doomed.contains(&parent)) {
                node.dag_parent = None;
            }
        }

        for id in &doomed {
            if let Some(node) = self.nodes.get_mut(id.0 as usize).and_then(Option::take) {
                debug!("Deleted node {}", node.name);
                self.names.remove(&node.name);
            }
        }
        Ok(())
    }

    fn collect_owned(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if matches!(
            self.node(id).map(Node::node_type),
            Ok(NodeType::Container)
        ) {
            for member in self.members(id) {
                self.collect_owned(member, out);
            }
        }
        out.push(id);
    }

    // --- Attributes
    // ----------------------------------------------------------------------------------------

    pub fn add_attr(&mut self, id: NodeId, def: AttrDef) -> GraphResult<()> {
        let node = self.node_mut(id)?;
        if node.defs.contains_key(&def.name) {
            return Err(GraphError::DuplicateAttribute(node.name.clone(), def.name));
        }
        if let Some(parent) = &def.parent {
            match node.defs.get(parent) {
                Some(parent_def) if parent_def.ty == AttrType::Compound => {}
                Some(_) => {
                    return Err(GraphError::MismatchedDataType(
                        "compound".into(),
                        parent.clone(),
                    ));
                }
                None => {
                    return Err(GraphError::MissingAttribute(
                        node.name.clone(),
                        parent.clone(),
                    ));
                }
            }
        }
        node.defs.insert(def.name.clone(), def);
        Ok(())
    }

    /// Adds the attribute unless one with that name already exists.
    pub fn ensure_attr(&mut self, id: NodeId, def: AttrDef) -> GraphResult<()> {
        if self.has_attr(id, &def.name) {
            return Ok(());
        }
        self.add_attr(id, def)
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.node(id).is_ok_and(|node| node.def(name).is_some())
    }

    pub fn attr_def(&self, plug: &Plug) -> GraphResult<&AttrDef> {
        let node = self.node(plug.node)?;
        node.def(plug.path.leaf_name()).ok_or_else(|| {
            GraphError::MissingAttribute(node.name.clone(), plug.path.to_string())
        })
    }

    pub fn has_plug(&self, plug: &Plug) -> bool {
        self.canonical(plug).is_ok()
    }

    /// Validates `plug` against the node's attribute definitions and rewrites it to its
    /// canonical form: aliases resolved and leading non-array compounds dropped.
    pub fn canonical(&self, plug: &Plug) -> GraphResult<Plug> {
        let node = self.node(plug.node)?;
        let invalid = |reason: String| GraphError::InvalidPath(plug.path.to_string(), reason);
        if plug.path.is_empty() {
            return Err(invalid("empty path".into()));
        }

        let segments = plug.path.segments();
        let mut resolved = Vec::with_capacity(segments.len());
        let mut previous: Option<&AttrDef> = None;
        for (i, segment) in segments.iter().enumerate() {
            let def = node.def(segment.name()).ok_or_else(|| {
                GraphError::MissingAttribute(node.name.clone(), plug.path.to_string())
            })?;
            match previous {
                Some(previous) => {
                    if def.parent.as_deref() != Some(previous.name.as_str()) {
                        return Err(invalid(format!(
                            "{} is not a child of {}",
                            def.name, previous.name
                        )));
                    }
                }
                None => {
                    let mut ancestor = def.parent.as_deref();
                    while let Some(name) = ancestor {
                        let ancestor_def = node.def(name).ok_or_else(|| {
                            GraphError::MissingAttribute(node.name.clone(), name.into())
                        })?;
                        if ancestor_def.multi {
                            return Err(invalid(format!("missing index for {name}")));
                        }
                        ancestor = ancestor_def.parent.as_deref();
                    }
                }
            }
            match segment {
                PathSegment::Indexed(_, index) if !def.multi => {
                    return Err(invalid(format!(
                        "{} is not an array attribute (index {index})",
                        def.name
                    )));
                }
                PathSegment::Direct(_) if def.multi && i + 1 < segments.len() => {
                    return Err(invalid(format!("missing index for {}", def.name)));
                }
                _ => {}
            }
            resolved.push(match segment {
                PathSegment::Direct(_) => PathSegment::Direct(def.name.clone()),
                PathSegment::Indexed(_, index) => PathSegment::Indexed(def.name.clone(), *index),
            });
            previous = Some(def);
        }

        while resolved.len() > 1 && matches!(resolved[0], PathSegment::Direct(_)) {
            resolved.remove(0);
        }
        Ok(Plug::new(plug.node, AttrPath::from_segments(resolved)))
    }

    /// Stored value, without following connections or computing outputs.
    pub fn stored_value(&self, plug: &Plug) -> Option<AttrValue> {
        let plug = self.canonical(plug).ok()?;
        let node = self.node(plug.node).ok()?;
        node.values.get(&plug.path.to_string()).cloned()
    }

    pub fn set_value(&mut self, plug: &Plug, value: impl Into<AttrValue>) -> GraphResult<()> {
        let plug = self.canonical(plug)?;
        if self.edges.contains_key(&plug) {
            return Err(GraphError::ConnectedAttribute(self.describe(&plug)));
        }
        let description = self.describe(&plug);
        let node = self.node_mut(plug.node)?;
        let (ty, locked) = {
            let def = node.def(plug.path.leaf_name()).ok_or_else(|| {
                GraphError::MissingAttribute(node.name.clone(), plug.path.to_string())
            })?;
            (def.ty.clone(), def.locked)
        };
        if locked {
            return Err(GraphError::LockedAttribute(description));
        }
        if !ty.holds_value() {
            return Err(GraphError::MismatchedDataType(
                "value attribute".into(),
                ty.type_name().into(),
            ));
        }
        let value = ty.coerce(value.into())?;
        node.record_indices(&plug.path);
        node.values.insert(plug.path.to_string(), value);
        Ok(())
    }

    pub fn set_locked(&mut self, plug: &Plug, locked: bool) -> GraphResult<()> {
        self.def_mut(plug)?.locked = locked;
        Ok(())
    }

    pub fn is_locked(&self, plug: &Plug) -> bool {
        self.attr_def(plug).is_ok_and(|def| def.locked)
    }

    pub fn set_keyable(&mut self, plug: &Plug, keyable: bool) -> GraphResult<()> {
        self.def_mut(plug)?.keyable = keyable;
        Ok(())
    }

    pub fn set_alias(&mut self, plug: &Plug, alias: &str) -> GraphResult<()> {
        self.def_mut(plug)?.alias = Some(alias.to_string());
        Ok(())
    }

    fn def_mut(&mut self, plug: &Plug) -> GraphResult<&mut AttrDef> {
        let plug = self.canonical(plug)?;
        let node = self.node_mut(plug.node)?;
        let name = node.name.clone();
        node.defs
            .get_mut(plug.path.leaf_name())
            .ok_or_else(|| GraphError::MissingAttribute(name, plug.path.to_string()))
    }

    /// Indices of a multi attribute that have been set or connected, ascending.
    pub fn multi_indices(&self, id: NodeId, name: &str) -> Vec<usize> {
        self.node(id)
            .ok()
            .and_then(|node| node.multi_indices.get(name))
            .map(|indices| indices.iter().copied().collect())
            .unwrap_or_default()
    }

    /// `node_name.attr[path]`, for logs and errors.
    pub fn describe(&self, plug: &Plug) -> String {
        match self.name(plug.node) {
            Ok(name) => format!("{name}.{}", plug.path),
            Err(_) => plug.to_string(),
        }
    }

    // --- Connections
    // ----------------------------------------------------------------------------------------

    /// Connects `source` into `target`, replacing any previous source of `target`.
    pub fn connect(&mut self, source: &Plug, target: &Plug) -> GraphResult<()> {
        let source = self.canonical(source)?;
        let target = self.canonical(target)?;
        let source_ty = self.attr_def(&source)?.ty.clone();
        let target_def = self.attr_def(&target)?;
        if target_def.locked {
            return Err(GraphError::LockedAttribute(self.describe(&target)));
        }
        if !target_def.ty.accepts_connection_from(&source_ty) {
            return Err(GraphError::MismatchedDataType(
                target_def.ty.type_name().into(),
                source_ty.type_name().into(),
            ));
        }
        if source == target {
            return Err(GraphError::InvalidPath(
                self.describe(&target),
                "cannot connect an attribute to itself".into(),
            ));
        }

        self.remove_edge(&target);
        self.node_mut(source.node)?.record_indices(&source.path);
        self.node_mut(target.node)?.record_indices(&target.path);
        self.edges_out
            .entry(source.clone())
            .or_default()
            .push(target.clone());
        self.edges.insert(target, source);
        Ok(())
    }

    /// Removes the incoming connection of `target`, returning its former source.
    pub fn disconnect(&mut self, target: &Plug) -> GraphResult<Option<Plug>> {
        let target = self.canonical(target)?;
        Ok(self.remove_edge(&target))
    }

    fn remove_edge(&mut self, target: &Plug) -> Option<Plug> {
        let source = self.edges.remove(target)?;
        if let Some(targets) = self.edges_out.get_mut(&source) {
            targets.retain(|t| t != target);
            if targets.is_empty() {
                self.edges_out.remove(&source);
            }
        }
        Some(source)
    }

    pub fn source(&self, target: &Plug) -> Option<Plug> {
        let target = self.canonical(target).ok()?;
        self.edges.get(&target).cloned()
    }

    pub fn is_connected(&self, target: &Plug) -> bool {
        self.source(target).is_some()
    }

    pub fn destinations(&self, source: &Plug) -> Vec<Plug> {
        self.canonical(source)
            .ok()
            .and_then(|source| self.edges_out.get(&source).cloned())
            .unwrap_or_default()
    }

    /// Incoming connections of a node as (target, source) pairs, sorted by target.
    pub fn incoming(&self, id: NodeId) -> Vec<(Plug, Plug)> {
        let mut out: Vec<(Plug, Plug)> = self
            .edges
            .iter()
            .filter(|(target, _)| target.node == id)
            .map(|(target, source)| (target.clone(), source.clone()))
            .collect();
        out.sort();
        out
    }

    /// Outgoing connections of a node as (source, target) pairs, sorted by source.
    pub fn outgoing(&self, id: NodeId) -> Vec<(Plug, Plug)> {
        let mut out: Vec<(Plug, Plug)> = self
            .edges
            .iter()
            .filter(|(_, source)| source.node == id)
            .map(|(target, source)| (source.clone(), target.clone()))
            .collect();
        out.sort();
        out
    }

    pub fn connection_count(&self) -> usize {
        self.edges.len()
    }

    // --- Transform hierarchy
    // ----------------------------------------------------------------------------------------

    pub fn set_dag_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> GraphResult<()> {
        for id in std::iter::once(child).chain(parent) {
            let node = self.node(id)?;
            if node.node_type != NodeType::Transform {
                return Err(GraphError::NotATransform(node.name.clone()));
            }
        }
        self.node_mut(child)?.dag_parent = parent;
        Ok(())
    }

    pub fn dag_parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(Node::dag_parent)
    }

    pub fn dag_children(&self, id: NodeId) -> Vec<NodeId> {
        self.node_ids()
            .filter(|child| self.dag_parent(*child) == Some(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::{Mat4, Vec3};

    use super::*;

    fn network_with_hier(graph: &mut SceneGraph) -> NodeId {
        let id = graph.create_node(NodeType::Network, "ns:interface");
        graph
            .add_attr(id, AttrDef::new("hierData", AttrType::Compound))
            .unwrap();
        graph
            .add_attr(
                id,
                AttrDef::new("hier", AttrType::Compound)
                    .multi()
                    .parent("hierData"),
            )
            .unwrap();
        graph
            .add_attr(id, AttrDef::new("hierName", AttrType::String).parent("hier"))
            .unwrap();
        graph
            .add_attr(
                id,
                AttrDef::new("hierParent", AttrType::Matrix).parent("hierData"),
            )
            .unwrap();
        id
    }

    #[test]
    fn names_are_made_unique() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node(NodeType::Network, "ns:node");
        let b = graph.create_node(NodeType::Network, "ns:node");
        assert_eq!(graph.name(a).unwrap(), "ns:node");
        assert_eq!(graph.name(b).unwrap(), "ns:node1");
        assert!(graph.namespace_exists("ns"));
    }

    #[test]
    fn canonical_paths_drop_plain_compounds() {
        let mut graph = SceneGraph::new();
        let id = network_with_hier(&mut graph);

        let long = Plug::new(id, AttrPath::parse("hierData.hier[1].hierName").unwrap());
        let short = Plug::new(id, AttrPath::parse("hier[1].hierName").unwrap());
        assert_eq!(graph.canonical(&long).unwrap(), short);

        let parent = Plug::new(id, AttrPath::parse("hierData.hierParent").unwrap());
        assert_eq!(
            graph.canonical(&parent).unwrap().path.to_string(),
            "hierParent"
        );

        assert!(
            graph
                .canonical(&Plug::new(id, AttrPath::parse("hierName").unwrap()))
                .is_err()
        );
        assert!(
            graph
                .canonical(&Plug::new(id, AttrPath::parse("hier.hierName").unwrap()))
                .is_err()
        );
    }

    #[test]
    fn set_value_records_multi_indices() {
        let mut graph = SceneGraph::new();
        let id = network_with_hier(&mut graph);
        for (i, name) in ["hip", "knee", "ankle"].iter().enumerate() {
            graph
                .set_value(
                    &Plug::new(id, AttrPath::indexed("hier", i).child("hierName")),
                    *name,
                )
                .unwrap();
        }
        assert_eq!(graph.multi_indices(id, "hier"), vec![0, 1, 2]);
        assert_eq!(
            graph.value(&Plug::new(id, AttrPath::parse("hier[1].hierName").unwrap())),
            Some(AttrValue::String("knee".into()))
        );
    }

    #[test]
    fn locked_attributes_refuse_values_and_connections() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node(NodeType::Network, "a");
        let b = graph.create_node(NodeType::Network, "b");
        graph.add_attr(a, AttrDef::new("out", AttrType::Float)).unwrap();
        graph.add_attr(b, AttrDef::new("in", AttrType::Float)).unwrap();
        graph.set_locked(&Plug::attr(b, "in"), true).unwrap();

        assert!(matches!(
            graph.set_value(&Plug::attr(b, "in"), 1.),
            Err(GraphError::LockedAttribute(_))
        ));
        assert!(matches!(
            graph.connect(&Plug::attr(a, "out"), &Plug::attr(b, "in")),
            Err(GraphError::LockedAttribute(_))
        ));
    }

    #[test]
    fn connections_replace_previous_source() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node(NodeType::Network, "a");
        let b = graph.create_node(NodeType::Network, "b");
        let c = graph.create_node(NodeType::Network, "c");
        for id in [a, b, c] {
            graph.add_attr(id, AttrDef::new("value", AttrType::Float)).unwrap();
        }
        graph.set_value(&Plug::attr(a, "value"), 2.).unwrap();
        graph.set_value(&Plug::attr(b, "value"), 3.).unwrap();

        graph.connect(&Plug::attr(a, "value"), &Plug::attr(c, "value")).unwrap();
        graph.connect(&Plug::attr(b, "value"), &Plug::attr(c, "value")).unwrap();

        assert_eq!(graph.source(&Plug::attr(c, "value")), Some(Plug::attr(b, "value")));
        assert!(graph.destinations(&Plug::attr(a, "value")).is_empty());
        assert_eq!(graph.value(&Plug::attr(c, "value")), Some(AttrValue::Float(3.)));
        assert!(graph.set_value(&Plug::attr(c, "value"), 1.).is_err());
    }

    #[test]
    fn deleting_a_driver_bakes_its_value() {
        let mut graph = SceneGraph::new();
        let mult = graph.create_node(NodeType::MultMatrix, "mult");
        let sink = graph.create_node(NodeType::Network, "sink");
        graph.add_attr(sink, AttrDef::new("m", AttrType::Matrix)).unwrap();

        let m = Mat4::from_translation(Vec3::new(1., 2., 3.));
        graph
            .set_value(&Plug::element(mult, mult_matrix::MATRIX_IN, 0), m)
            .unwrap();
        graph
            .connect(
                &Plug::attr(mult, mult_matrix::MATRIX_SUM),
                &Plug::attr(sink, "m"),
            )
            .unwrap();
        graph.delete_node(mult).unwrap();

        assert!(!graph.contains(mult));
        assert!(!graph.is_connected(&Plug::attr(sink, "m")));
        assert_eq!(graph.matrix(&Plug::attr(sink, "m")), Some(m));
    }

    #[test]
    fn deleting_a_container_deletes_members() {
        let mut graph = SceneGraph::new();
        let outer = graph.create_node(NodeType::Container, "outer");
        let inner = graph.create_node(NodeType::Container, "inner");
        let leaf = graph.create_node(NodeType::Network, "leaf");
        graph.add_members(outer, &[inner]).unwrap();
        graph.add_members(inner, &[leaf]).unwrap();

        graph.delete_node(outer).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.find("leaf"), None);
    }
}
