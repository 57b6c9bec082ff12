use bevy_log::warn;
use indexmap::IndexMap;

use super::{
    COMPONENT_CLASS, COMPONENT_INST_NAME, Component, ComponentKind, ComponentRegistry, BUILT,
    INTERFACE_NODE, ROOT_TRANSFORM_NODE, SIDE,
};
use crate::{
    errors::{RigError, RigResult},
    graph::{NodeId, Plug, SceneGraph, ScopeId},
    hierarchy::{HIER_SIDE, OffsetMatrix},
    identity::{Identity, namespace_of},
    mirror::MirrorHelper,
    shapes::{ProxyShapeLibrary, ShapeLibrary},
    symmetry::Side,
};

/// Owns the graph document and the component table. Every lifecycle operation goes
/// through this handle; components are addressed by the id of their scope container.
#[derive(Debug)]
pub struct Rig {
    pub(crate) graph: SceneGraph,
    pub(crate) registry: ComponentRegistry,
    pub(crate) components: IndexMap<ScopeId, Component>,
    pub(crate) shapes: Box<dyn ShapeLibrary>,
}

impl Default for Rig {
    fn default() -> Self {
        Self::new()
    }
}

impl Rig {
    /// Empty rig with the core helper components registered.
    pub fn new() -> Self {
        let mut registry = ComponentRegistry::new();
        registry.register::<OffsetMatrix>().register::<MirrorHelper>();
        Self::with_registry(registry)
    }

    pub fn with_registry(registry: ComponentRegistry) -> Self {
        Self {
            graph: SceneGraph::new(),
            registry,
            components: IndexMap::new(),
            shapes: Box::new(ProxyShapeLibrary),
        }
    }

    #[must_use]
    pub fn with_shape_library(mut self, shapes: impl ShapeLibrary + 'static) -> Self {
        self.shapes = Box::new(shapes);
        self
    }

    /// Adopts a loaded graph document, recovering the component table from the
    /// `componentClass` attribute of every scope that has an interface.
    pub fn from_graph(graph: SceneGraph, registry: ComponentRegistry) -> RigResult<Self> {
        let mut rig = Self::with_registry(registry);
        rig.graph = graph;

        let scopes: Vec<ScopeId> = rig
            .graph
            .node_ids()
            .filter(|id| rig.graph.is_scope(*id))
            .collect();
        for scope in scopes {
            let Some(interface) = rig.graph.scope_pointer(scope, INTERFACE_NODE) else {
                continue;
            };
            let Some(class_name) = rig.graph.string(&Plug::attr(interface, COMPONENT_CLASS)) else {
                warn!("Scope {} has no component class, skipping", rig.graph.name(scope)?);
                continue;
            };
            let strategy = rig.registry.create(&class_name)?;
            let component = Component {
                scope: Some(scope),
                parent: rig.graph.scope_of(scope),
                strategy,
            };
            rig.components.insert(scope, component);
        }
        Ok(rig)
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    pub fn into_graph(self) -> SceneGraph {
        self.graph
    }

    pub fn component(&self, scope: ScopeId) -> RigResult<&Component> {
        self.components
            .get(&scope)
            .ok_or(RigError::MissingComponent(scope))
    }

    pub fn components(&self) -> impl Iterator<Item = (ScopeId, &Component)> {
        self.components
            .iter()
            .map(|(scope, component)| (*scope, component))
    }

    /// Scopes of the components whose class is `class_name`, in creation order.
    pub fn find_components(&self, class_name: &str) -> Vec<ScopeId> {
        self.components()
            .filter(|(_, component)| component.class_name() == class_name)
            .map(|(scope, _)| scope)
            .collect()
    }

    pub fn child_components(&self, scope: ScopeId) -> Vec<ScopeId> {
        self.components()
            .filter(|(_, component)| component.parent == Some(scope))
            .map(|(child, _)| child)
            .collect()
    }

    pub fn interface(&self, scope: ScopeId) -> RigResult<NodeId> {
        self.graph
            .scope_pointer(scope, INTERFACE_NODE)
            .ok_or_else(|| RigError::MissingInterface(self.describe(scope)))
    }

    pub fn root_transform(&self, scope: ScopeId) -> Option<NodeId> {
        self.graph.scope_pointer(scope, ROOT_TRANSFORM_NODE)
    }

    /// Namespace the component's nodes live in.
    pub fn namespace(&self, scope: ScopeId) -> RigResult<String> {
        Ok(namespace_of(self.graph.name(scope)?).to_string())
    }

    pub fn is_built(&self, scope: ScopeId) -> bool {
        self.interface(scope)
            .ok()
            .and_then(|interface| self.graph.value(&Plug::attr(interface, BUILT)))
            .and_then(|value| value.as_bool())
            .unwrap_or_default()
    }

    pub fn has_hier(&self, scope: ScopeId) -> bool {
        self.component(scope)
            .is_ok_and(|component| component.strategy.has_hier())
    }

    /// Identity as currently stored on the interface. A connected or non-default
    /// `hierSide` takes precedence over `side`.
    pub fn identity(&self, scope: ScopeId) -> RigResult<Identity> {
        let component = self.component(scope)?;
        let interface = self.interface(scope)?;
        let instance_name = self
            .graph
            .has_attr(interface, COMPONENT_INST_NAME)
            .then(|| self.graph.string(&Plug::attr(interface, COMPONENT_INST_NAME)))
            .flatten();
        let side_of = |attr: &str| {
            self.graph
                .has_attr(interface, attr)
                .then(|| self.graph.value(&Plug::attr(interface, attr)))
                .flatten()
                .and_then(|value| value.as_index())
                .and_then(Side::from_index)
                .unwrap_or_default()
        };
        let side = match side_of(HIER_SIDE) {
            Side::None => side_of(SIDE),
            side => side,
        };
        Ok(Identity::new(component.class_name(), instance_name, side))
    }

    /// Closest ancestor component of the given kind.
    pub fn parent_component_of_kind(&self, scope: ScopeId, kind: ComponentKind) -> Option<ScopeId> {
        let mut current = self.components.get(&scope)?.parent;
        while let Some(parent) = current {
            let component = self.components.get(&parent)?;
            if component.strategy.kind() == kind {
                return Some(parent);
            }
            current = component.parent;
        }
        None
    }

    pub(crate) fn describe(&self, scope: ScopeId) -> String {
        self.graph
            .name(scope)
            .map(str::to_string)
            .unwrap_or_else(|_| format!("{scope:?}"))
    }

    /// Drops table entries whose scope no longer exists.
    pub(crate) fn prune_components(&mut self) {
        let graph = &self.graph;
        self.components.retain(|scope, _| graph.contains(*scope));
    }
}
