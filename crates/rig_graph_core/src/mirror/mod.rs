//! Symmetric counterparts of components.
//!
//! A twin is produced by instantiating the original's class against the reflected
//! interface of a [`MirrorHelper`]. The pair is linked through message attributes,
//! `original.mirrorDest -> twin.mirrorSource`.

mod helper;

pub use helper::*;

use bevy_log::{debug, info, warn};

use crate::{
    component::{Component, ComponentLike, MIRROR_DEST, MIRROR_SOURCE, Rig},
    config::{ComponentConfig, ConfigValue},
    errors::{RigError, RigResult},
    graph::{AttrDef, AttrType, NodeId, Plug, ScopeId},
    hierarchy::{
        HIER_NAME, HIER_PARAMS, HIER_PARENT, HIER_PARENT_INIT, HIER_SIDE, HierBuildData,
        OUTPUT_WORLD_MATRIX, chain_indices, entry_attr, owning_entry,
    },
    identity::{camel_to_snake, is_within_namespace, namespace_of, short_name, substitute_namespace},
    symmetry::{SidePairing, SymmetryMode},
};

/// Config key of the twin's chain side.
const HIER_SIDE_KEY: &str = "hier_side";

/// Axis attributes carried across to the twin through the helper's remaps, as
/// `(interface attribute, helper input key, helper output)`.
const AXIS_ATTRS: [(&str, &str, &str); 2] = [
    (PRIMARY_AXIS, "primary_axis", MIRROR_PRIMARY_AXIS),
    (SECONDARY_AXIS, "secondary_axis", MIRROR_SECONDARY_AXIS),
];

/// Interface inputs the reconnection pass leaves to the mirroring machinery or to
/// re-parenting.
const SKIPPED_INPUTS: [&str; 5] = [
    HIER_SIDE,
    HIER_PARENT,
    HIER_PARENT_INIT,
    PRIMARY_AXIS,
    SECONDARY_AXIS,
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorOptions {
    pub mode: SymmetryMode,
    /// Keep the helper alive so the twin follows later edits of the original.
    pub dynamic: bool,
    /// Side the twin lands on, for each side of the original.
    pub pairing: SidePairing,
}

impl MirrorOptions {
    pub fn new(mode: SymmetryMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn pairing(mut self, pairing: SidePairing) -> Self {
        self.pairing = pairing;
        self
    }

    #[must_use]
    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }
}

impl Rig {
    /// Twin generated from this component.
    pub fn mirror_dest(&self, scope: ScopeId) -> Option<ScopeId> {
        if !self.graph.has_attr(scope, MIRROR_DEST) {
            return None;
        }
        self.graph
            .destinations(&Plug::attr(scope, MIRROR_DEST))
            .into_iter()
            .map(|plug| plug.node)
            .find(|node| self.components.contains_key(node))
    }

    /// Original this component was mirrored from.
    pub fn mirror_source(&self, scope: ScopeId) -> Option<ScopeId> {
        if !self.graph.has_attr(scope, MIRROR_SOURCE) {
            return None;
        }
        self.graph
            .source(&Plug::attr(scope, MIRROR_SOURCE))
            .map(|plug| plug.node)
            .filter(|node| self.components.contains_key(node))
    }

    pub fn mirror_counterpart(&self, scope: ScopeId) -> Option<ScopeId> {
        self.mirror_dest(scope).or_else(|| self.mirror_source(scope))
    }

    /// Whether [`Self::mirror_component`] would produce a twin.
    pub fn is_mirrorable(&self, scope: ScopeId) -> bool {
        self.component(scope)
            .is_ok_and(|component| component.strategy.is_mirrorable())
            && self.mirror_counterpart(scope).is_none()
    }

    /// Builds the symmetric twin of a component. Components without a hierarchy chain
    /// yield `None`; components that already are one side of a mirror pair are refused.
    pub fn mirror_component(
        &mut self,
        scope: ScopeId,
        options: MirrorOptions,
    ) -> RigResult<Option<ScopeId>> {
        let component = self.component(scope)?;
        let strategy = component.strategy.clone();
        let parent = component.parent;
        if !strategy.is_mirrorable() {
            debug!("{} has no hierarchy chain to mirror", self.describe(scope));
            return Ok(None);
        }
        if self.mirror_counterpart(scope).is_some() {
            return Err(RigError::MirrorRefused(self.describe(scope)));
        }

        let identity = self.identity(scope)?;
        let interface = self.interface(scope)?;
        let indices = chain_indices(&self.graph, interface);

        let mut helper_config = ComponentConfig::new()
            .instance_name(
                identity
                    .instance_name
                    .clone()
                    .unwrap_or_else(|| camel_to_snake(&identity.class_name)),
            )
            .side(identity.side)
            .with("scale_matrix", options.mode.reflection_matrix());
        for &index in &indices {
            helper_config = helper_config.hier(
                index,
                HierBuildData::from_entry(interface, index, false).link_params(interface, index),
            );
        }
        for (attr, key, _) in AXIS_ATTRS {
            if self.graph.has_attr(interface, attr) {
                helper_config.insert(key, Plug::attr(interface, attr));
            }
        }
        let helper_strategy = MirrorHelper::with_pairing(options.pairing.clone());
        let helper = self.place(parent, Box::new(helper_strategy), helper_config)?;
        let helper_interface = self.interface(helper)?;

        let mut twin_config = ComponentConfig::new()
            .side(options.pairing.opposite(identity.side))
            .with(HIER_SIDE_KEY, Plug::attr(helper_interface, MIRROR_SIDE));
        if let Some(name) = &identity.instance_name {
            twin_config = twin_config.instance_name(name.clone());
        }
        for &index in &indices {
            let link = |attr: &str| Some(ConfigValue::Connect(entry_attr(helper_interface, index, attr)));
            let data = HierBuildData {
                name: link(HIER_NAME),
                init_matrix: Some(ConfigValue::Connect(Plug::element(
                    helper_interface,
                    MIRROR_INIT,
                    index,
                ))),
                world_matrix: link(OUTPUT_WORLD_MATRIX),
                local_matrix: None,
                params: link(HIER_PARAMS),
            };
            twin_config = twin_config.hier(index, data);
        }
        for (attr, _, mirrored) in AXIS_ATTRS {
            if self.graph.has_attr(interface, attr) {
                twin_config.insert(attr, Plug::attr(helper_interface, mirrored));
            }
        }
        strategy.mirror_overrides(&self.graph, interface, &mut twin_config);

        let twin_strategy = self.registry.create(strategy.class_name())?;
        let twin = self.place(parent, twin_strategy, twin_config)?;

        self.graph
            .ensure_attr(scope, AttrDef::new(MIRROR_DEST, AttrType::Message))?;
        self.graph
            .ensure_attr(twin, AttrDef::new(MIRROR_SOURCE, AttrType::Message))?;
        self.graph.connect(
            &Plug::attr(scope, MIRROR_DEST),
            &Plug::attr(twin, MIRROR_SOURCE),
        )?;

        if !options.dynamic {
            self.delete_component(helper, false)?;
        }
        info!("Mirrored {} to {}", self.describe(scope), self.describe(twin));
        Ok(Some(twin))
    }

    /// Mirrors every component, then reconnects external inputs of each pair so twins
    /// can pick up each other's outputs. Returns `(original, twin)` pairs.
    pub fn mirror_component_list(
        &mut self,
        scopes: &[ScopeId],
        options: MirrorOptions,
    ) -> RigResult<Vec<(ScopeId, ScopeId)>> {
        let mut pairs = Vec::new();
        for &scope in scopes {
            if let Some(twin) = self.mirror_component(scope, options.clone())? {
                pairs.push((scope, twin));
            }
        }
        for &(scope, _) in &pairs {
            self.mirror_input_connections(scope)?;
        }
        Ok(pairs)
    }

    /// Connects the twin's interface to the mirrored counterparts of whatever drives
    /// the original's interface from outside its namespace, and re-parents the twin.
    /// Inputs the mirroring machinery already wired on the twin are left alone.
    /// Returns the number of connections made.
    pub fn mirror_input_connections(&mut self, scope: ScopeId) -> RigResult<usize> {
        let Some(twin) = self.mirror_dest(scope) else {
            warn!("{} has no mirror twin to reconnect", self.describe(scope));
            return Ok(0);
        };
        let interface = self.interface(scope)?;
        let twin_interface = self.interface(twin)?;
        let namespace = self.namespace(scope)?;

        let mut connected = 0;
        for (target, source) in self.graph.incoming(interface) {
            if owning_entry(&target).is_some()
                || SKIPPED_INPUTS.contains(&target.path.leaf_name())
            {
                continue;
            }
            let source_name = self.graph.name(source.node)?;
            if is_within_namespace(namespace_of(source_name), &namespace) {
                continue;
            }
            let twin_target = Plug::new(twin_interface, target.path.clone());
            if self.graph.is_connected(&twin_target) {
                continue;
            }
            let Some(mirrored) = self.mirrored_node(source.node) else {
                warn!(
                    "No mirrored counterpart of {}, leaving {} unconnected",
                    self.graph.describe(&source),
                    self.graph.describe(&twin_target)
                );
                continue;
            };
            let twin_source = Plug::new(mirrored, source.path.clone());
            match self.graph.connect(&twin_source, &twin_target) {
                Ok(()) => connected += 1,
                Err(err) => warn!(
                    "Could not connect {} to {}: {err}",
                    self.graph.describe(&twin_source),
                    self.graph.describe(&twin_target)
                ),
            }
        }

        if let Some(entry) = self.parent_entry(scope) {
            match self.mirrored_node(entry.node) {
                Some(node) => self.parent(twin, &Plug::new(node, entry.path))?,
                None => warn!("Parent entry of {} has no mirrored counterpart", self.describe(scope)),
            }
        }
        Ok(connected)
    }

    /// Counterpart of `node` on the other side: every enclosing component that has a
    /// mirror counterpart contributes its namespace substitution. Nodes outside any
    /// mirrored component map onto themselves.
    pub fn mirrored_node(&self, node: NodeId) -> Option<NodeId> {
        let mut name = self.graph.name(node).ok()?.to_string();
        let mut substituted = false;
        let mut current = self.owning_component(node);
        while let Some(scope) = current {
            if let Some(counterpart) = self.mirror_counterpart(scope) {
                let from = self.namespace(scope).ok()?;
                let to = self.namespace(counterpart).ok()?;
                name = substitute_namespace(&name, short_name(&from), short_name(&to));
                substituted = true;
            }
            current = self.components.get(&scope)?.parent;
        }
        if !substituted {
            return Some(node);
        }
        self.graph.find(&name)
    }

    /// Innermost component whose scope owns `node`.
    fn owning_component(&self, node: NodeId) -> Option<ScopeId> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if self.components.contains_key(&candidate) {
                return Some(candidate);
            }
            current = self.graph.scope_of(candidate);
        }
        None
    }

    /// Creates and builds a component next to its sibling under `parent`, or at the top
    /// level.
    fn place(
        &mut self,
        parent: Option<ScopeId>,
        strategy: Box<dyn ComponentLike>,
        config: ComponentConfig,
    ) -> RigResult<ScopeId> {
        match parent {
            Some(parent) => self.insert_child(parent, strategy, config, None, true),
            None => {
                let scope = self.initialize(Component::from_boxed(strategy), config)?;
                self.build(scope)?;
                Ok(scope)
            }
        }
    }
}
