//! Caller supplied configuration, applied onto a component right after installation.

use bevy_log::warn;
use bevy_math::{Mat4, Vec3};
use indexmap::IndexMap;

use crate::{
    errors::{GraphError, RigResult},
    graph::{AttrPath, AttrValue, Plug, SceneGraph, ScopeId},
    hierarchy::{HIER, HIER_SIDE, HierBuildData},
    params::ParamValue,
    symmetry::{Axis, Side},
};

pub const COMPONENT_INST_NAME: &str = "componentInstName";
pub const SIDE: &str = "side";

/// What a configuration key asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Set a literal value, breaking any incoming connection.
    Value(AttrValue),
    /// Drive the attribute from `source`.
    Connect(Plug),
    /// Drive `target` from the attribute.
    Drive(Plug),
    /// Fill a `hier[i]` entry.
    Hier(Box<HierBuildData>),
    /// Encode into a payload attribute.
    Params(ParamValue),
}

impl From<AttrValue> for ConfigValue {
    fn from(value: AttrValue) -> Self {
        Self::Value(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Value(value.into())
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}

impl From<f32> for ConfigValue {
    fn from(value: f32) -> Self {
        Self::Value(value.into())
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Value(value.into())
    }
}

impl From<Mat4> for ConfigValue {
    fn from(value: Mat4) -> Self {
        Self::Value(value.into())
    }
}

impl From<Vec3> for ConfigValue {
    fn from(value: Vec3) -> Self {
        Self::Value(value.into())
    }
}

impl From<Side> for ConfigValue {
    fn from(value: Side) -> Self {
        Self::Value(AttrValue::Enum(value.index()))
    }
}

impl From<Axis> for ConfigValue {
    fn from(value: Axis) -> Self {
        Self::Value(AttrValue::Enum(value.index()))
    }
}

impl From<Plug> for ConfigValue {
    fn from(value: Plug) -> Self {
        Self::Connect(value)
    }
}

impl From<HierBuildData> for ConfigValue {
    fn from(value: HierBuildData) -> Self {
        Self::Hier(Box::new(value))
    }
}

impl From<ParamValue> for ConfigValue {
    fn from(value: ParamValue) -> Self {
        Self::Params(value)
    }
}

/// Identity inputs plus an ordered key -> value map.
///
/// Keys are snake_case attribute names as published on the component scope. Double
/// underscores descend into compounds and digits select array elements, so
/// `hier1__input_world_matrix` addresses `hier[1].inputWorldMatrix`. Dotted keys such as
/// `target[0].weight` are accepted as well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentConfig {
    pub instance_name: Option<String>,
    pub side: Option<Side>,
    pub values: IndexMap<String, ConfigValue>,
}

impl ComponentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn hier(self, index: usize, data: HierBuildData) -> Self {
        self.with(format!("{HIER}{index}"), data)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.values.shift_remove(key)
    }

    /// Number of `hierN` entries.
    pub fn hier_count(&self) -> usize {
        self.values
            .iter()
            .filter(|(key, value)| matches!(value, ConfigValue::Hier(_)) && key.starts_with(HIER))
            .count()
    }

    /// Applies everything onto the component living in `scope`. Keys that do not
    /// resolve, and values that cannot be applied, are logged and skipped.
    pub fn apply(&self, graph: &mut SceneGraph, scope: ScopeId) -> RigResult<()> {
        let scope_name = graph.name(scope)?.to_string();

        if let Some(name) = &self.instance_name {
            let path = AttrPath::new(COMPONENT_INST_NAME);
            apply_path(graph, scope, &scope_name, &path, name.clone().into());
        }
        if let Some(side) = self.side {
            for attr in [SIDE, HIER_SIDE] {
                let path = AttrPath::new(attr);
                if graph.resolve_scope_path(scope, &path).is_some() {
                    apply_path(graph, scope, &scope_name, &path, side.into());
                }
            }
        }

        for (key, value) in &self.values {
            let path = match AttrPath::from_config_key(key) {
                Ok(path) => path,
                Err(err) => {
                    warn!("Config key {key:?} for {scope_name} is not a valid path: {err}");
                    continue;
                }
            };
            match value {
                ConfigValue::Hier(data) => {
                    let Some(index) = path
                        .first_index()
                        .filter(|_| path.segments().len() == 1 && path.leaf_name() == HIER)
                    else {
                        warn!("Config key {key:?} for {scope_name} does not name a hierarchy entry");
                        continue;
                    };
                    for (path, value) in data.config_entries(index) {
                        apply_path(graph, scope, &scope_name, &path, value);
                    }
                }
                value => apply_path(graph, scope, &scope_name, &path, value.clone()),
            }
        }
        Ok(())
    }
}

fn apply_path(
    graph: &mut SceneGraph,
    scope: ScopeId,
    scope_name: &str,
    path: &AttrPath,
    value: ConfigValue,
) {
    let Some(plug) = graph.resolve_scope_path(scope, path) else {
        warn!("{path} does not resolve on {scope_name}, skipping");
        return;
    };
    if let Err(err) = apply_value(graph, &plug, value) {
        warn!("Could not configure {}: {err}", graph.describe(&plug));
    }
}

/// Sets or connects `plug`, temporarily lifting a lock.
pub fn apply_value(graph: &mut SceneGraph, plug: &Plug, value: ConfigValue) -> RigResult<()> {
    let locked = graph.is_locked(plug);
    if locked {
        graph.set_locked(plug, false)?;
    }
    let result = write_value(graph, plug, value);
    if locked {
        graph.set_locked(plug, true)?;
    }
    result
}

fn write_value(graph: &mut SceneGraph, plug: &Plug, value: ConfigValue) -> RigResult<()> {
    match value {
        ConfigValue::Value(value) => {
            graph.disconnect(plug)?;
            graph.set_value(plug, value)?;
        }
        ConfigValue::Connect(source) => graph.connect(&source, plug)?,
        ConfigValue::Drive(target) => graph.connect(plug, &target)?,
        ConfigValue::Params(params) => {
            graph.disconnect(plug)?;
            graph.set_value(plug, AttrValue::Payload(params.to_bytes()?))?;
        }
        ConfigValue::Hier(_) => {
            return Err(GraphError::InvalidPath(
                graph.describe(plug),
                "hierarchy data only applies to a hier entry".into(),
            )
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graph::{AttrType, NodeType},
        hierarchy::{INPUT_WORLD_MATRIX, entry_attr, hier_attr_data},
        schema::{AttrData, NodeBuildDataDict, NodeData},
    };

    fn component(graph: &mut SceneGraph) -> (ScopeId, crate::graph::NodeId) {
        let mut interface = NodeData::new("interface", NodeType::Network)
            .with_attr(AttrData::new("install", AttrType::Compound).published())
            .with_attr(
                AttrData::new(COMPONENT_INST_NAME, AttrType::String)
                    .parent("install")
                    .locked(),
            )
            .with_attr(AttrData::new("input", AttrType::Compound).published())
            .with_attr(AttrData::new("blend", AttrType::Float).parent("input"))
            .with_attr(AttrData::new("target", AttrType::Matrix).parent("input"));
        for attr in hier_attr_data() {
            interface.add_attr_data(attr);
        }
        let mut dict = NodeBuildDataDict::new();
        dict.add_node_data(NodeData::new("container", NodeType::Container));
        dict.add_node_data(interface);
        dict.handle_node_data(graph, "probe");
        let scope = dict.node("container").unwrap();
        graph.add_members(scope, &dict.nodes(graph)).unwrap();
        dict.publish_attrs(graph, scope);
        (scope, dict.node("interface").unwrap())
    }

    #[test]
    fn applies_values_connections_and_hier_entries() {
        let mut graph = SceneGraph::new();
        let (scope, interface) = component(&mut graph);
        let driver = graph.create_node(NodeType::Transform, "driver");
        let world = Mat4::from_translation(Vec3::new(0., 1., 0.));

        ComponentConfig::new()
            .instance_name("leg")
            .side(Side::Left)
            .with("blend", 0.25_f32)
            .with("target", Plug::attr(driver, crate::graph::transform::WORLD_MATRIX))
            .hier(1, HierBuildData::posed("knee", world))
            .with("no_such_attr", 1i64)
            .apply(&mut graph, scope)
            .unwrap();

        let inst = Plug::attr(interface, COMPONENT_INST_NAME);
        assert_eq!(graph.string(&inst).as_deref(), Some("leg"));
        assert!(graph.is_locked(&inst));
        assert_eq!(
            graph.value(&Plug::attr(interface, HIER_SIDE)),
            Some(AttrValue::Enum(Side::Left.index()))
        );
        assert_eq!(
            graph.value(&Plug::attr(interface, "blend")),
            Some(AttrValue::Float(0.25))
        );
        assert!(graph.is_connected(&Plug::attr(interface, "target")));
        assert_eq!(
            graph.matrix(&entry_attr(interface, 1, INPUT_WORLD_MATRIX)),
            Some(world)
        );
    }

    #[test]
    fn params_are_stored_as_payload_bytes() {
        let mut graph = SceneGraph::new();
        let (scope, interface) = component(&mut graph);
        let params = ParamValue::map().with("control", "GearControl");

        ComponentConfig::new()
            .hier(0, HierBuildData::new("root").params(params.clone()))
            .apply(&mut graph, scope)
            .unwrap();

        let stored = graph
            .value(&entry_attr(interface, 0, crate::hierarchy::HIER_PARAMS))
            .unwrap();
        let decoded = ParamValue::from_bytes(stored.as_payload().unwrap()).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn hier_count_only_counts_entries() {
        let config = ComponentConfig::new()
            .hier(0, HierBuildData::new("a"))
            .hier(1, HierBuildData::new("b"))
            .with("hierarchy_scale", 1_f32);
        assert_eq!(config.hier_count(), 2);
    }
}
