use std::collections::HashSet;

use bevy_log::{debug, info};

use super::{
    BUILT, BuildContext, COMPONENT_CLASS, COMPONENT_INST_NAME, COMPONENT_NAME, COMPONENT_TYPE,
    CONTAINER_ROLE, Component, ComponentLike, INPUT, INSTALL, INTERFACE_NODE, INTERFACE_ROLE,
    OUTPUT, ROOT_TRANSFORM_NODE, ROOT_TRANSFORM_ROLE, Rig, SIDE, SUB_COMPONENT_GRP, SchemaContext,
};
use crate::{
    config::{ComponentConfig, apply_value},
    errors::{GraphError, RigError, RigResult},
    graph::{AttrType, AttrValue, NodeId, NodeType, Plug, ScopeId},
    hierarchy::{
        HIER_INIT_MATRIX, HIER_PARENT, HIER_PARENT_INIT, HIER_SIDE, OUTPUT_WORLD_MATRIX, owning_entry,
    },
    identity::{
        Identity, combine_namespace, is_within_namespace, namespace_of, short_name, split_namespace,
    },
    schema::{AttrData, NodeBuildDataDict, NodeData},
    symmetry::Side,
};

const SUB_COMPONENT_GRP_NAME: &str = "sub_component_grp";

impl Rig {
    /// Creates a top level component without building it.
    pub fn add_component(
        &mut self,
        component: impl ComponentLike,
        config: ComponentConfig,
    ) -> RigResult<ScopeId> {
        self.initialize(Component::new(component), config)
    }

    /// Installs `component`: reserves its namespace, materializes its schema, publishes
    /// its interface and applies `config`. The component must not have a scope yet.
    pub fn initialize(&mut self, mut component: Component, mut config: ComponentConfig) -> RigResult<ScopeId> {
        if component.is_initialized() {
            return Err(RigError::AlreadyInitialized(component.class_name().into()));
        }
        let strategy = component.strategy.clone();
        strategy.filter_config(&mut config);
        if !strategy.has_instance_name() {
            config.instance_name = None;
        }
        if !strategy.has_side() {
            config.side = None;
        }

        let parent_namespace = match component.parent {
            Some(parent) => self.namespace(parent)?,
            None => String::new(),
        };
        let identity = Identity::new(
            strategy.class_name(),
            config.instance_name.clone(),
            config.side.unwrap_or_default(),
        );
        let derived = identity.instance_namespace();
        let bare = combine_namespace([parent_namespace.as_str(), derived.as_str()]);
        let bare_sibling = self
            .components
            .keys()
            .copied()
            .find(|sibling| self.namespace(*sibling).is_ok_and(|ns| ns == bare));
        let namespace = self
            .graph
            .reserve_namespace(&parent_namespace, &derived)?;
        if self.graph.namespace_exists(&namespace) {
            return Err(RigError::NamespaceTaken(namespace));
        }
        // A collision renumbers the bare sibling.
        if let Some(sibling) = bare_sibling {
            if self.namespace(sibling)? != bare {
                self.rename_nodes(sibling)?;
            }
        }
        self.graph.add_namespace(&namespace)?;

        let mut dict = base_schema(strategy.as_ref(), &namespace);
        strategy.build_schema(&mut SchemaContext::new(&mut dict))?;
        dict.handle_node_data(&mut self.graph, &namespace);

        let scope = dict
            .node(CONTAINER_ROLE)
            .ok_or_else(|| RigError::MissingInterface(namespace.clone()))?;
        self.graph.add_members(scope, &dict.nodes(&self.graph))?;
        dict.publish_attrs(&mut self.graph, scope);
        dict.map_to_scope(&mut self.graph, scope);
        if let Some(parent) = component.parent {
            self.graph.add_members(parent, &[scope])?;
        }

        component.scope = Some(scope);
        self.components.insert(scope, component);
        config.apply(&mut self.graph, scope)?;
        debug!("Initialized {} as {namespace}", strategy.class_name());
        Ok(scope)
    }

    /// Creates a component nested in `parent`. Its frame goes under `transform_parent`,
    /// or under a sub-component group of the nearest ancestor that has a frame.
    pub fn insert_child(
        &mut self,
        parent: ScopeId,
        strategy: Box<dyn ComponentLike>,
        config: ComponentConfig,
        transform_parent: Option<NodeId>,
        build: bool,
    ) -> RigResult<ScopeId> {
        self.component(parent)?;
        let component = Component::from_boxed(strategy).with_parent(Some(parent));
        let scope = self.initialize(component, config)?;

        if let Some(root) = self.root_transform(scope) {
            let anchor = match transform_parent {
                Some(anchor) => Some(anchor),
                None => self.sub_component_group(parent)?,
            };
            if anchor.is_some() {
                self.graph.set_dag_parent(root, anchor)?;
            }
        }
        if build {
            self.build(scope)?;
        }
        Ok(scope)
    }

    /// Builds the component. Nodes left over from an earlier build are deleted first,
    /// which is refused for classes that are not rebuildable.
    pub fn build(&mut self, scope: ScopeId) -> RigResult<()> {
        let strategy = self.component(scope)?.strategy.clone();
        self.clear_build_nodes(scope, strategy.as_ref())?;

        let interface = self.interface(scope)?;
        apply_value(&mut self.graph, &Plug::attr(interface, BUILT), true.into())?;

        let watermark = self.graph.next_node_id();
        {
            let mut ctx = BuildContext::new(self, scope)?;
            strategy.build_graph(&mut ctx)?;
        }

        let stray: Vec<NodeId> = self
            .graph
            .node_ids()
            .filter(|id| *id >= watermark && *id != scope && self.graph.scope_of(*id).is_none())
            .collect();
        self.graph.add_members(scope, &stray)?;
        self.rename_nodes(scope)?;
        info!("Built {}", self.describe(scope));
        Ok(())
    }

    /// Deletes everything the last build generated and builds again.
    pub fn rebuild(&mut self, scope: ScopeId) -> RigResult<()> {
        self.build(scope)
    }

    /// Members of the scope that a build generated: everything except the container
    /// and the nodes its pointer attributes reference.
    pub fn build_nodes(&self, scope: ScopeId) -> Vec<NodeId> {
        let Ok(container) = self.graph.node(scope) else {
            return Vec::new();
        };
        let kept: HashSet<NodeId> = container
            .defs()
            .filter(|def| def.ty == AttrType::Message)
            .flat_map(|def| self.graph.destinations(&Plug::attr(scope, &def.name)))
            .map(|plug| plug.node)
            .chain([scope])
            .collect();
        self.graph
            .members(scope)
            .into_iter()
            .filter(|id| !kept.contains(id))
            .collect()
    }

    fn clear_build_nodes(&mut self, scope: ScopeId, strategy: &dyn ComponentLike) -> RigResult<()> {
        let doomed = self.build_nodes(scope);
        if doomed.is_empty() {
            return Ok(());
        }
        if !strategy.is_rebuildable() {
            return Err(RigError::RebuildRefused(self.describe(scope)));
        }

        let namespace = self.namespace(scope)?;
        for id in doomed {
            if self.graph.contains(id) {
                self.graph.delete_node(id)?;
            }
        }
        for child in self.graph.child_namespaces(&namespace) {
            let occupied = self.graph.node_ids().any(|id| {
                self.graph
                    .name(id)
                    .is_ok_and(|name| is_within_namespace(namespace_of(name), &child))
            });
            if !occupied {
                self.graph.remove_namespace(&child)?;
            }
        }
        self.prune_components();
        debug!("Cleared previous build of {}", self.describe(scope));
        Ok(())
    }

    /// Moves the component to the namespace its identity asks for, then renames member
    /// nodes that sit outside of it.
    pub fn rename_nodes(&mut self, scope: ScopeId) -> RigResult<()> {
        let current = self.namespace(scope)?;
        let expected = self.identity(scope)?.instance_namespace();
        let (parent_namespace, short) = split_namespace(&current);

        let namespace = if is_numbered(short, &expected) {
            current.clone()
        } else {
            let renamed = self.graph.reserve_namespace(parent_namespace, &expected)?;
            self.graph.rename_namespace(&current, &renamed)?;
            debug!("Renamed namespace {current} to {renamed}");
            renamed
        };

        let members: Vec<NodeId> = std::iter::once(scope)
            .chain(self.graph.members(scope))
            .collect();
        for id in members {
            let name = self.graph.name(id)?;
            if is_within_namespace(namespace_of(name), &namespace) {
                continue;
            }
            let renamed = combine_namespace([namespace.as_str(), short_name(name)]);
            self.graph.rename_node(id, &renamed)?;
        }

        let interface = self.interface(scope)?;
        let component_name = short_name(&namespace).to_string();
        apply_value(
            &mut self.graph,
            &Plug::attr(interface, COMPONENT_NAME),
            component_name.into(),
        )?;
        Ok(())
    }

    /// Attaches the component's chain to a hierarchy entry of another component.
    pub fn parent(&mut self, scope: ScopeId, parent_entry: &Plug) -> RigResult<()> {
        let entry = owning_entry(parent_entry).ok_or_else(|| {
            GraphError::InvalidPath(
                self.graph.describe(parent_entry),
                "not a hierarchy entry".into(),
            )
        })?;
        let interface = self.interface(scope)?;
        self.graph.connect(
            &entry.child(OUTPUT_WORLD_MATRIX),
            &Plug::attr(interface, HIER_PARENT),
        )?;
        self.graph.connect(
            &entry.child(HIER_INIT_MATRIX),
            &Plug::attr(interface, HIER_PARENT_INIT),
        )?;
        Ok(())
    }

    pub fn unparent(&mut self, scope: ScopeId) -> RigResult<()> {
        let interface = self.interface(scope)?;
        for attr in [HIER_PARENT, HIER_PARENT_INIT] {
            self.graph.disconnect(&Plug::attr(interface, attr))?;
        }
        Ok(())
    }

    /// The entry this component is parented to, if any.
    pub fn parent_entry(&self, scope: ScopeId) -> Option<Plug> {
        let interface = self.interface(scope).ok()?;
        let source = self.graph.source(&Plug::attr(interface, HIER_PARENT))?;
        owning_entry(&source)
    }

    /// Deletes the component with everything nested in it. With `delete_mirror` its
    /// mirror counterpart goes too.
    pub fn delete_component(&mut self, scope: ScopeId, delete_mirror: bool) -> RigResult<()> {
        self.component(scope)?;
        let counterpart = delete_mirror
            .then(|| self.mirror_counterpart(scope))
            .flatten();
        let namespace = self.namespace(scope)?;

        self.graph.delete_node(scope)?;
        if !namespace.is_empty() && self.graph.namespace_exists(&namespace) {
            self.graph.remove_namespace(&namespace)?;
        }
        self.prune_components();
        info!("Deleted component {namespace}");

        if let Some(counterpart) = counterpart.filter(|c| self.components.contains_key(c)) {
            self.delete_component(counterpart, false)?;
        }
        Ok(())
    }

    pub fn set_instance_name(&mut self, scope: ScopeId, name: &str) -> RigResult<()> {
        let interface = self.interface(scope)?;
        apply_value(
            &mut self.graph,
            &Plug::attr(interface, COMPONENT_INST_NAME),
            name.into(),
        )?;
        self.rename_nodes(scope)
    }

    pub fn set_side(&mut self, scope: ScopeId, side: Side) -> RigResult<()> {
        let interface = self.interface(scope)?;
        apply_value(&mut self.graph, &Plug::attr(interface, SIDE), side.into())?;
        let hier_side = Plug::attr(interface, HIER_SIDE);
        if self.graph.has_attr(interface, HIER_SIDE) && !self.graph.is_connected(&hier_side) {
            apply_value(&mut self.graph, &hier_side, side.into())?;
        }
        self.rename_nodes(scope)
    }

    /// Frame children of `scope` hang under when no explicit parent is given: the
    /// sub-component group of the nearest ancestor (or `scope` itself) with a frame.
    fn sub_component_group(&mut self, scope: ScopeId) -> RigResult<Option<NodeId>> {
        let mut current = Some(scope);
        while let Some(candidate) = current {
            if let Some(root) = self.root_transform(candidate) {
                if let Some(group) = self.graph.scope_pointer(candidate, SUB_COMPONENT_GRP) {
                    return Ok(Some(group));
                }
                let name = combine_namespace([
                    self.namespace(candidate)?.as_str(),
                    SUB_COMPONENT_GRP_NAME,
                ]);
                let group = self.graph.create_node(NodeType::Transform, &name);
                self.graph.set_dag_parent(group, Some(root))?;
                self.graph.add_members(candidate, &[group])?;
                self.graph.set_scope_pointer(candidate, SUB_COMPONENT_GRP, group)?;
                return Ok(Some(group));
            }
            current = self.component(candidate)?.parent;
        }
        Ok(None)
    }
}

/// Attributes and nodes every component has.
fn base_schema(strategy: &dyn ComponentLike, namespace: &str) -> NodeBuildDataDict {
    let mut dict = NodeBuildDataDict::new();
    dict.insert(
        CONTAINER_ROLE,
        NodeData::new(CONTAINER_ROLE, NodeType::Container),
    );

    let mut interface = NodeData::new(INTERFACE_ROLE, NodeType::Network)
        .map_to_scope(INTERFACE_NODE)
        .with_attr(AttrData::new(INSTALL, AttrType::Compound))
        .with_attr(
            AttrData::new(COMPONENT_NAME, AttrType::String)
                .parent(INSTALL)
                .value(short_name(namespace))
                .locked()
                .published(),
        )
        .with_attr(
            AttrData::new(COMPONENT_CLASS, AttrType::String)
                .parent(INSTALL)
                .value(strategy.class_name())
                .locked()
                .published(),
        )
        .with_attr(
            AttrData::new(
                COMPONENT_TYPE,
                AttrType::Enum(super::ComponentKind::names()),
            )
            .parent(INSTALL)
            .value(AttrValue::Enum(strategy.kind().index()))
            .locked()
            .published(),
        );
    if strategy.has_instance_name() {
        interface.add_attr_data(
            AttrData::new(COMPONENT_INST_NAME, AttrType::String)
                .parent(INSTALL)
                .locked()
                .published(),
        );
    }
    if strategy.has_side() {
        interface.add_attr_data(
            AttrData::new(SIDE, AttrType::Enum(Side::names()))
                .parent(INSTALL)
                .locked()
                .published(),
        );
    }
    interface.add_attr_data(
        AttrData::new(BUILT, AttrType::Bool)
            .value(false)
            .locked()
            .published(),
    );
    interface.add_attr_data(AttrData::new(INPUT, AttrType::Compound));
    interface.add_attr_data(AttrData::new(OUTPUT, AttrType::Compound));
    dict.insert(INTERFACE_ROLE, interface);

    if strategy.has_hier() {
        SchemaContext::new(&mut dict).add_hier_data();
    }
    if let Some(name) = strategy.root_transform_name() {
        dict.insert(
            ROOT_TRANSFORM_ROLE,
            NodeData::new(name, NodeType::Transform).map_to_scope(ROOT_TRANSFORM_NODE),
        );
    }
    dict
}

/// `short` is `expected`, possibly followed by a uniqueness index.
fn is_numbered(short: &str, expected: &str) -> bool {
    short
        .strip_prefix(expected)
        .is_some_and(|suffix| suffix.chars().all(|c| c.is_ascii_digit()))
}
