use bevy_log::{debug, warn};
use bevy_math::Mat4;

use super::{ComponentLike, INPUT, INSTALL, INTERFACE_ROLE, OUTPUT, Rig};
use crate::{
    config::ComponentConfig,
    errors::RigResult,
    graph::{AttrValue, NodeId, NodeType, Plug, SceneGraph, ScopeId, mult_matrix},
    hierarchy::{
        self, HIER_NAME, HIER_PARAMS, HIER_PARENT, INPUT_LOCAL_MATRIX, INPUT_WORLD_MATRIX,
        OffsetMatrix, hier_attr_data,
    },
    identity::combine_namespace,
    params::ParamValue,
    schema::{AttrData, NodeBuildDataDict, NodeData},
    shapes::{ShapeKind, ShapeStyle},
};

/// Tolerance of the local matrix equivalence check.
const LOCAL_MATRIX_EPSILON: f32 = 1e-4;

/// Handed to [`ComponentLike::build_schema`]. Attributes added through the group helpers
/// are parented to the interface group and published under their own name.
pub struct SchemaContext<'a> {
    dict: &'a mut NodeBuildDataDict,
}

impl<'a> SchemaContext<'a> {
    pub fn new(dict: &'a mut NodeBuildDataDict) -> Self {
        Self { dict }
    }

    pub fn interface(&mut self) -> &mut NodeData {
        self.dict.get_or_insert_with(INTERFACE_ROLE, || {
            NodeData::new(INTERFACE_ROLE, NodeType::Network)
        })
    }

    /// Adds an interface attribute as is.
    pub fn add_attr(&mut self, attr: AttrData) -> &mut Self {
        self.interface().add_attr_data(attr);
        self
    }

    pub fn add_install(&mut self, attr: AttrData) -> &mut Self {
        self.add_grouped(INSTALL, attr)
    }

    pub fn add_input(&mut self, attr: AttrData) -> &mut Self {
        self.add_grouped(INPUT, attr)
    }

    pub fn add_output(&mut self, attr: AttrData) -> &mut Self {
        self.add_grouped(OUTPUT, attr)
    }

    pub fn add_hier_data(&mut self) -> &mut Self {
        for attr in hier_attr_data() {
            self.add_attr(attr);
        }
        self
    }

    /// Node declared earlier under `role`, such as the root transform.
    pub fn node(&mut self, role: &str) -> Option<&mut NodeData> {
        self.dict.get_mut(role)
    }

    fn add_grouped(&mut self, group: &str, mut attr: AttrData) -> &mut Self {
        attr.parent = Some(group.to_string());
        if attr.publish.is_none() {
            attr.publish = Some(attr.name.clone());
        }
        self.add_attr(attr)
    }
}

/// Handed to [`ComponentLike::build_graph`]: the component being built and mutable
/// access to the rig it lives in.
pub struct BuildContext<'a> {
    rig: &'a mut Rig,
    scope: ScopeId,
    namespace: String,
    interface: NodeId,
    root_transform: Option<NodeId>,
}

impl<'a> BuildContext<'a> {
    pub fn new(rig: &'a mut Rig, scope: ScopeId) -> RigResult<Self> {
        let namespace = rig.namespace(scope)?;
        let interface = rig.interface(scope)?;
        let root_transform = rig.root_transform(scope);
        Ok(Self {
            rig,
            scope,
            namespace,
            interface,
            root_transform,
        })
    }

    pub fn rig(&self) -> &Rig {
        self.rig
    }

    pub fn rig_mut(&mut self) -> &mut Rig {
        self.rig
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.rig.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.rig.graph
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn interface(&self) -> NodeId {
        self.interface
    }

    pub fn root_transform(&self) -> Option<NodeId> {
        self.root_transform
    }

    /// Interface attribute by name.
    pub fn io(&self, name: &str) -> Plug {
        Plug::attr(self.interface, name)
    }

    /// `hier[index].<attr>` on this component's interface.
    pub fn entry(&self, index: usize, attr: &str) -> Plug {
        hierarchy::entry_attr(self.interface, index, attr)
    }

    pub fn chain_indices(&self) -> Vec<usize> {
        hierarchy::chain_indices(self.graph(), self.interface)
    }

    /// Entry name, falling back to `hier<index>` when unset.
    pub fn hier_name(&self, index: usize) -> String {
        self.graph()
            .string(&self.entry(index, HIER_NAME))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("hier{index}"))
    }

    /// Decoded parameter payload of an entry. Undecodable payloads read as empty.
    pub fn params(&self, index: usize) -> ParamValue {
        let bytes = self
            .graph()
            .value(&self.entry(index, HIER_PARAMS))
            .and_then(|value| value.as_payload().map(<[u8]>::to_vec))
            .unwrap_or_default();
        if bytes.is_empty() {
            return ParamValue::map();
        }
        ParamValue::from_bytes(&bytes).unwrap_or_else(|err| {
            warn!("Bad parameter payload on hier[{index}] of {}: {err}", self.namespace);
            ParamValue::map()
        })
    }

    /// Creates a node inside the component namespace.
    pub fn create_node(&mut self, node_type: NodeType, short_name: &str) -> NodeId {
        let name = combine_namespace([self.namespace.as_str(), short_name]);
        self.rig.graph.create_node(node_type, &name)
    }

    pub fn create_transform(&mut self, short_name: &str, parent: Option<NodeId>) -> RigResult<NodeId> {
        let transform = self.create_node(NodeType::Transform, short_name);
        if parent.is_some() {
            self.rig.graph.set_dag_parent(transform, parent)?;
        }
        Ok(transform)
    }

    /// `MultMatrix` whose inputs are connected in order. The first input is applied
    /// first, i.e. it ends up right-most in the product.
    pub fn create_mult_matrix(&mut self, short_name: &str, inputs: &[Plug]) -> RigResult<NodeId> {
        let node = self.create_node(NodeType::MultMatrix, short_name);
        for (i, input) in inputs.iter().enumerate() {
            self.connect(input, &Plug::element(node, mult_matrix::MATRIX_IN, i))?;
        }
        Ok(node)
    }

    pub fn connect(&mut self, source: &Plug, target: &Plug) -> RigResult<()> {
        Ok(self.rig.graph.connect(source, target)?)
    }

    pub fn set_value(&mut self, plug: &Plug, value: impl Into<AttrValue>) -> RigResult<()> {
        Ok(self.rig.graph.set_value(plug, value)?)
    }

    /// Drawable proxy of `kind` attached to `transform`.
    pub fn create_shape(
        &mut self,
        kind: ShapeKind,
        transform: NodeId,
        style: &ShapeStyle,
    ) -> RigResult<NodeId> {
        let Rig { graph, shapes, .. } = &mut *self.rig;
        let proxy = shapes.create_proxy(graph, kind, transform)?;
        shapes.apply_style(graph, proxy, style)?;
        Ok(proxy)
    }

    /// Inserts and builds a child component whose frame hangs under `transform_parent`,
    /// or under the nearest sub-component group when `None`.
    pub fn insert_child(
        &mut self,
        component: impl ComponentLike,
        config: ComponentConfig,
        transform_parent: Option<NodeId>,
    ) -> RigResult<ScopeId> {
        self.rig
            .insert_child(self.scope, Box::new(component), config, transform_parent, true)
    }

    /// Same as [`Self::insert_child`] for a class looked up in the registry.
    pub fn insert_class(
        &mut self,
        class_name: &str,
        config: ComponentConfig,
        transform_parent: Option<NodeId>,
    ) -> RigResult<ScopeId> {
        let strategy = self.rig.registry.create(class_name)?;
        self.rig
            .insert_child(self.scope, strategy, config, transform_parent, true)
    }

    pub fn child_interface(&self, child: ScopeId) -> RigResult<NodeId> {
        self.rig.interface(child)
    }

    /// Feeds `hier[i].inputLocalMatrix` from the world inputs: the local matrix of entry
    /// `i` is its world matrix expressed in the world matrix of the entry before it (or in
    /// `hierParent` for the first entry, when `gen_first` is set). Entries whose current
    /// local matrix already reproduces the world matrix are left alone.
    pub fn gen_input_local_matrices(&mut self, gen_first: bool) -> RigResult<()> {
        let indices = self.chain_indices();
        for (position, &index) in indices.iter().enumerate() {
            let parent = match position {
                0 if !gen_first => continue,
                0 => self.io(HIER_PARENT),
                _ => self.entry(indices[position - 1], INPUT_WORLD_MATRIX),
            };
            let world = self.entry(index, INPUT_WORLD_MATRIX);
            let local = self.entry(index, INPUT_LOCAL_MATRIX);
            if self.is_equivalent_local(&parent, &local, &world) {
                debug!("hier[{index}] of {} already has a matching local matrix", self.namespace);
                continue;
            }

            let config = ComponentConfig::new()
                .instance_name(format!("{}_local", self.hier_name(index)))
                .with(OffsetMatrix::TARGET_MATRIX_KEY, world)
                .with(OffsetMatrix::SPACE_MATRIX_KEY, parent);
            let helper = self.insert_child(OffsetMatrix, config, None)?;
            let output = Plug::attr(self.child_interface(helper)?, OffsetMatrix::OFFSET_MATRIX);
            self.connect(&output, &local)?;
        }
        Ok(())
    }

    fn is_equivalent_local(&self, parent: &Plug, local: &Plug, world: &Plug) -> bool {
        let graph = self.graph();
        let (Some(parent), Some(local), Some(world)) =
            (graph.matrix(parent), graph.matrix(local), graph.matrix(world))
        else {
            return false;
        };
        is_same_matrix(parent * local, world)
    }
}

/// Element-wise comparison within the tolerance used for local matrix checks.
pub fn is_same_matrix(a: Mat4, b: Mat4) -> bool {
    a.abs_diff_eq(b, LOCAL_MATRIX_EPSILON)
}
