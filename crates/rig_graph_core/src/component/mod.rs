mod context;
mod lifecycle;
mod registry;
mod rig;

pub use context::*;
pub use registry::*;
pub use rig::*;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::{
    config::ComponentConfig,
    errors::RigResult,
    graph::{NodeId, SceneGraph, ScopeId},
};

pub const INSTALL: &str = "install";
pub const INPUT: &str = "input";
pub const OUTPUT: &str = "output";
pub const BUILT: &str = "built";
pub const COMPONENT_NAME: &str = "componentName";
pub const COMPONENT_CLASS: &str = "componentClass";
pub const COMPONENT_TYPE: &str = "componentType";
pub use crate::config::{COMPONENT_INST_NAME, SIDE};

/// Message attributes on the scope container.
pub const INTERFACE_NODE: &str = "interfaceNode";
pub const ROOT_TRANSFORM_NODE: &str = "rootTransformNode";
pub const SUB_COMPONENT_GRP: &str = "subComponentGrp";
pub const MIRROR_DEST: &str = "mirrorDest";
pub const MIRROR_SOURCE: &str = "mirrorSource";

/// Roles in the build data dictionary every component starts from.
pub const CONTAINER_ROLE: &str = "container";
pub const INTERFACE_ROLE: &str = "interface";
pub const ROOT_TRANSFORM_ROLE: &str = "rootTransform";

/// Broad category of a component, stored in its `componentType` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Setup,
    Anim,
    Motion,
    Control,
    Matrix,
    Helper,
    Character,
    Hier,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 8] = [
        ComponentKind::Setup,
        ComponentKind::Anim,
        ComponentKind::Motion,
        ComponentKind::Control,
        ComponentKind::Matrix,
        ComponentKind::Helper,
        ComponentKind::Character,
        ComponentKind::Hier,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Anim => "anim",
            Self::Motion => "motion",
            Self::Control => "control",
            Self::Matrix => "matrix",
            Self::Helper => "helper",
            Self::Character => "character",
            Self::Hier => "hier",
        }
    }

    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|kind| kind.name().to_string()).collect()
    }

    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| kind == self)
            .unwrap_or_default()
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Behaviour of one component class. The lifecycle engine owns everything generic
/// (scope, interface, namespacing, rebuild bookkeeping); a class only declares its extra
/// attributes and wires its internals.
pub trait ComponentLike: ComponentLikeClone + Send + Sync + Debug + 'static {
    /// Name stored in `componentClass` and used to re-instantiate the class.
    fn class_name(&self) -> &'static str;

    fn kind(&self) -> ComponentKind;

    /// Whether internal nodes may be deleted and generated again.
    fn is_rebuildable(&self) -> bool {
        false
    }

    /// Short name of the transform that anchors the component in the transform tree,
    /// if it has one.
    fn root_transform_name(&self) -> Option<&'static str> {
        None
    }

    fn has_instance_name(&self) -> bool {
        true
    }

    fn has_side(&self) -> bool {
        true
    }

    fn has_hier(&self) -> bool {
        false
    }

    fn is_mirrorable(&self) -> bool {
        self.has_hier()
    }

    /// Adjusts the caller's configuration before the component is installed.
    #[allow(unused_variables)]
    fn filter_config(&self, config: &mut ComponentConfig) {}

    /// Adds class specific attributes to the base schema.
    #[allow(unused_variables)]
    fn build_schema(&self, ctx: &mut SchemaContext) -> RigResult<()> {
        Ok(())
    }

    /// Creates and wires the internal nodes. Runs on every build.
    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()>;

    /// Extra configuration for the mirrored twin of the component whose interface is
    /// `interface`.
    #[allow(unused_variables)]
    fn mirror_overrides(&self, graph: &SceneGraph, interface: NodeId, config: &mut ComponentConfig) {}
}

pub trait ComponentLikeClone {
    fn clone_component_like(&self) -> Box<dyn ComponentLike>;
}

impl<T> ComponentLikeClone for T
where
    T: 'static + ComponentLike + Clone,
{
    fn clone_component_like(&self) -> Box<dyn ComponentLike> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn ComponentLike> {
    fn clone(&self) -> Self {
        self.clone_component_like()
    }
}

/// A component instance: its class plus its place in the scope tree. Uninitialized
/// while `scope` is `None`.
#[derive(Debug, Clone)]
pub struct Component {
    pub scope: Option<ScopeId>,
    pub parent: Option<ScopeId>,
    pub strategy: Box<dyn ComponentLike>,
}

impl Component {
    pub fn new(strategy: impl ComponentLike) -> Self {
        Self::from_boxed(Box::new(strategy))
    }

    pub fn from_boxed(strategy: Box<dyn ComponentLike>) -> Self {
        Self {
            scope: None,
            parent: None,
            strategy,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: Option<ScopeId>) -> Self {
        self.parent = parent;
        self
    }

    pub fn class_name(&self) -> &'static str {
        self.strategy.class_name()
    }

    pub fn is_initialized(&self) -> bool {
        self.scope.is_some()
    }
}
