//! Hierarchy chains: the fixed-shape list of frames passed between pipeline stages.

mod offset;

pub use offset::*;

use bevy_math::Mat4;

use crate::{
    config::ConfigValue,
    errors::GraphResult,
    graph::{AttrPath, AttrType, NodeId, Plug, SceneGraph, transform},
    identity::short_name,
    params::ParamValue,
    schema::AttrData,
    symmetry::Side,
};

pub const HIER_DATA: &str = "hierData";
pub const HIER: &str = "hier";
pub const HIER_PARENT: &str = "hierParent";
pub const HIER_PARENT_INIT: &str = "hierParentInit";
pub const HIER_SIDE: &str = "hierSide";

pub const HIER_NAME: &str = "hierName";
pub const HIER_INIT_MATRIX: &str = "hierInitMatrix";
pub const HIER_PARAMS: &str = "hierParams";
pub const INPUT_WORLD_MATRIX: &str = "inputWorldMatrix";
pub const INPUT_LOCAL_MATRIX: &str = "inputLocalMatrix";
pub const OUTPUT_WORLD_MATRIX: &str = "outputWorldMatrix";
pub const OUTPUT_LOCAL_MATRIX: &str = "outputLocalMatrix";

/// Attributes of one hierarchy entry, in declaration order.
pub const ENTRY_ATTRS: [(&str, AttrType); 7] = [
    (HIER_NAME, AttrType::String),
    (HIER_INIT_MATRIX, AttrType::Matrix),
    (HIER_PARAMS, AttrType::Payload),
    (INPUT_WORLD_MATRIX, AttrType::Matrix),
    (INPUT_LOCAL_MATRIX, AttrType::Matrix),
    (OUTPUT_WORLD_MATRIX, AttrType::Matrix),
    (OUTPUT_LOCAL_MATRIX, AttrType::Matrix),
];

/// Interface attributes of a component carrying a hierarchy chain. `hierData` is
/// published, which makes every entry addressable from the scope.
pub fn hier_attr_data() -> Vec<AttrData> {
    let mut attrs = vec![
        AttrData::new(HIER_DATA, AttrType::Compound).published(),
        AttrData::new(HIER, AttrType::Compound).parent(HIER_DATA).multi(),
    ];
    attrs.extend(
        ENTRY_ATTRS
            .into_iter()
            .map(|(name, ty)| AttrData::new(name, ty).parent(HIER)),
    );
    attrs.extend([
        AttrData::new(HIER_PARENT, AttrType::Matrix).parent(HIER_DATA),
        AttrData::new(HIER_PARENT_INIT, AttrType::Matrix).parent(HIER_DATA),
        AttrData::new(HIER_SIDE, AttrType::Enum(Side::names())).parent(HIER_DATA),
    ]);
    attrs
}

/// `hier[index]` on `interface`.
pub fn entry(interface: NodeId, index: usize) -> Plug {
    Plug::element(interface, HIER, index)
}

/// `hier[index].<attr>` on `interface`.
pub fn entry_attr(interface: NodeId, index: usize, attr: &str) -> Plug {
    entry(interface, index).child(attr)
}

/// Indices of the chain entries that have been set or connected, ascending.
pub fn chain_indices(graph: &SceneGraph, interface: NodeId) -> Vec<usize> {
    graph.multi_indices(interface, HIER)
}

pub fn is_hier_entry(graph: &SceneGraph, plug: &Plug) -> bool {
    let segments = plug.path.segments();
    segments.len() == 1
        && segments[0].name() == HIER
        && segments[0].index().is_some()
        && graph.has_plug(plug)
}

/// The `hier[i]` plug that `plug` (an entry child) belongs to.
pub fn owning_entry(plug: &Plug) -> Option<Plug> {
    let root = plug.path.root()?;
    (root.name() == HIER && root.index().is_some())
        .then(|| Plug::new(plug.node, AttrPath::from_segments(vec![root.clone()])))
}

/// What to feed into one hierarchy entry of a component being created. Every field is
/// optional; unset fields leave the entry attribute untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierBuildData {
    pub name: Option<ConfigValue>,
    pub init_matrix: Option<ConfigValue>,
    pub world_matrix: Option<ConfigValue>,
    pub local_matrix: Option<ConfigValue>,
    pub params: Option<ConfigValue>,
}

impl HierBuildData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(ConfigValue::from(name.into())),
            ..Default::default()
        }
    }

    /// Named entry whose world input and init pose are both `world`.
    pub fn posed(name: impl Into<String>, world: Mat4) -> Self {
        Self::new(name).init(world).world(world)
    }

    /// Links to an existing entry. With `link_output` the entry's outputs are used as
    /// inputs, otherwise its inputs are.
    pub fn from_entry(interface: NodeId, index: usize, link_output: bool) -> Self {
        let attr = |name: &str| Some(ConfigValue::Connect(entry_attr(interface, index, name)));
        let (world, local) = if link_output {
            (OUTPUT_WORLD_MATRIX, OUTPUT_LOCAL_MATRIX)
        } else {
            (INPUT_WORLD_MATRIX, INPUT_LOCAL_MATRIX)
        };
        Self {
            name: attr(HIER_NAME),
            init_matrix: attr(HIER_INIT_MATRIX),
            world_matrix: attr(world),
            local_matrix: attr(local),
            params: None,
        }
    }

    /// Entry following a plain transform: its world and DAG-local matrices.
    pub fn from_transform(graph: &SceneGraph, node: NodeId) -> GraphResult<Self> {
        let name = format!("{}_transform", short_name(graph.name(node)?));
        Ok(Self {
            name: Some(ConfigValue::from(name)),
            init_matrix: None,
            world_matrix: Some(ConfigValue::Connect(Plug::attr(
                node,
                transform::WORLD_MATRIX,
            ))),
            local_matrix: Some(ConfigValue::Connect(Plug::attr(
                node,
                transform::DAG_LOCAL_MATRIX,
            ))),
            params: None,
        })
    }

    #[must_use]
    pub fn init(mut self, value: impl Into<ConfigValue>) -> Self {
        self.init_matrix = Some(value.into());
        self
    }

    #[must_use]
    pub fn world(mut self, value: impl Into<ConfigValue>) -> Self {
        self.world_matrix = Some(value.into());
        self
    }

    #[must_use]
    pub fn local(mut self, value: impl Into<ConfigValue>) -> Self {
        self.local_matrix = Some(value.into());
        self
    }

    #[must_use]
    pub fn params(mut self, value: impl Into<ConfigValue>) -> Self {
        self.params = Some(value.into());
        self
    }

    /// Also carries the entry's parameter payload across.
    #[must_use]
    pub fn link_params(self, interface: NodeId, index: usize) -> Self {
        self.params(entry_attr(interface, index, HIER_PARAMS))
    }

    /// `(hier[index].<attr>, value)` pairs to apply on the receiving interface.
    pub fn config_entries(&self, index: usize) -> Vec<(AttrPath, ConfigValue)> {
        [
            (HIER_INIT_MATRIX, &self.init_matrix),
            (HIER_NAME, &self.name),
            (INPUT_WORLD_MATRIX, &self.world_matrix),
            (INPUT_LOCAL_MATRIX, &self.local_matrix),
            (HIER_PARAMS, &self.params),
        ]
        .into_iter()
        .filter_map(|(attr, value)| {
            let value = value.clone()?;
            Some((AttrPath::indexed(HIER, index).child(attr), value))
        })
        .collect()
    }
}

impl From<ParamValue> for HierBuildData {
    fn from(value: ParamValue) -> Self {
        Self::default().params(value)
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::Vec3;

    use super::*;
    use crate::graph::{AttrValue, NodeType};
    use crate::schema::{NodeBuildDataDict, NodeData};

    fn interface(graph: &mut SceneGraph) -> NodeId {
        let mut dict = NodeBuildDataDict::new();
        let mut data = NodeData::new("interface", NodeType::Network);
        for attr in hier_attr_data() {
            data.add_attr_data(attr);
        }
        dict.add_node_data(data);
        dict.handle_node_data(graph, "leg");
        dict.node("interface").unwrap()
    }

    #[test]
    fn entries_are_addressable_by_index() {
        let mut graph = SceneGraph::new();
        let interface = interface(&mut graph);
        let world = Mat4::from_translation(Vec3::Y);
        graph
            .set_value(&entry_attr(interface, 2, INPUT_WORLD_MATRIX), world)
            .unwrap();
        graph
            .set_value(&entry_attr(interface, 0, HIER_NAME), "hip")
            .unwrap();

        assert_eq!(chain_indices(&graph, interface), vec![0, 2]);
        assert!(is_hier_entry(&graph, &entry(interface, 2)));
        assert!(!is_hier_entry(
            &graph,
            &entry_attr(interface, 2, INPUT_WORLD_MATRIX)
        ));
        assert_eq!(
            owning_entry(&entry_attr(interface, 2, INPUT_WORLD_MATRIX)),
            Some(entry(interface, 2))
        );
        assert_eq!(
            graph.value(&entry_attr(interface, 2, INPUT_WORLD_MATRIX)),
            Some(AttrValue::Matrix(world))
        );
    }

    #[test]
    fn build_data_expands_to_entry_paths() {
        let data = HierBuildData::posed("knee", Mat4::IDENTITY);
        let paths: Vec<String> = data
            .config_entries(1)
            .into_iter()
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "hier[1].hierInitMatrix",
                "hier[1].hierName",
                "hier[1].inputWorldMatrix"
            ]
        );
    }

    #[test]
    fn linking_an_entry_picks_inputs_or_outputs() {
        let source = NodeId(7);
        let linked = HierBuildData::from_entry(source, 1, true);
        assert_eq!(
            linked.world_matrix,
            Some(ConfigValue::Connect(entry_attr(source, 1, OUTPUT_WORLD_MATRIX)))
        );
        let linked = HierBuildData::from_entry(source, 1, false);
        assert_eq!(
            linked.local_matrix,
            Some(ConfigValue::Connect(entry_attr(source, 1, INPUT_LOCAL_MATRIX)))
        );
        assert_eq!(linked.params, None);
    }
}
