use bevy_log::warn;
use rig_graph_core::{
    component::{BuildContext, ComponentKind, ComponentLike, SchemaContext},
    config::ComponentConfig,
    errors::RigResult,
    graph::{
        AttrType, AttrValue, ExprProgram, NodeId, NodeType, Plug, SceneGraph, expression,
        matrix_node,
    },
    hierarchy::{HIER_INIT_MATRIX, INPUT_WORLD_MATRIX, OUTPUT_WORLD_MATRIX},
    mirror::{PRIMARY_AXIS, SECONDARY_AXIS},
    schema::AttrData,
    shapes::ShapeKind,
    symmetry::Axis,
};

use crate::{
    chain::{connect_local_outputs, limit_hier_entries},
    control::{Control, ControlSpec, promote_to_control},
};

/// One setup control per entry, each placed at the entry's input world matrix. Moving a
/// control moves the entry, and the result is the init pose downstream stages read.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainSetup;

impl ComponentLike for ChainSetup {
    fn class_name(&self) -> &'static str {
        "ChainSetup"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Setup
    }

    fn is_rebuildable(&self) -> bool {
        true
    }

    fn root_transform_name(&self) -> Option<&'static str> {
        Some("grp")
    }

    fn has_hier(&self) -> bool {
        true
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        build_setup_chain(ctx)?;
        Ok(())
    }
}

/// Promotes every entry's input world matrix to a control and feeds the outputs and init
/// matrices from it. Returns the chain indices.
fn build_setup_chain(ctx: &mut BuildContext) -> RigResult<Vec<usize>> {
    let root = ctx.root_transform();
    let indices = ctx.chain_indices();
    for &index in &indices {
        let spec = ControlSpec::from_params(&ctx.params(index), Control::new(ShapeKind::Sphere));
        let name = ctx.hier_name(index);
        let input = ctx.entry(index, INPUT_WORLD_MATRIX);
        promote_to_control(ctx, &input, &spec, &name, root)?;

        let (output, init) = (
            ctx.entry(index, OUTPUT_WORLD_MATRIX),
            ctx.entry(index, HIER_INIT_MATRIX),
        );
        ctx.connect(&input, &output)?;
        ctx.connect(&output, &init)?;
    }
    let worlds: Vec<Plug> = indices
        .iter()
        .map(|&index| ctx.entry(index, OUTPUT_WORLD_MATRIX))
        .collect();
    connect_local_outputs(ctx, &indices, &worlds)?;
    Ok(indices)
}

/// Setup of a three joint hinge. On top of the chain controls it places a pole control in
/// front of the middle joint, pushed out by `poleScalarInput`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HingeSetup;

impl HingeSetup {
    pub const POLE_MATRIX: &'static str = "poleMatrix";
    pub const POLE_SCALAR_INPUT: &'static str = "poleScalarInput";
    pub const POLE_SCALAR_OUTPUT: &'static str = "poleScalarOutput";

    pub const POLE_SCALAR_INPUT_KEY: &'static str = "pole_scalar_input";
    pub const POLE_CONTROL: &'static str = "poleSetup";
    pub const CHAIN_LENGTH: usize = 3;
}

impl ComponentLike for HingeSetup {
    fn class_name(&self) -> &'static str {
        "HingeSetup"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Setup
    }

    fn is_rebuildable(&self) -> bool {
        true
    }

    fn root_transform_name(&self) -> Option<&'static str> {
        Some("grp")
    }

    fn has_hier(&self) -> bool {
        true
    }

    fn filter_config(&self, config: &mut ComponentConfig) {
        limit_hier_entries(config, Self::CHAIN_LENGTH);
    }

    fn build_schema(&self, ctx: &mut SchemaContext) -> RigResult<()> {
        ctx.add_install(axis_attr(PRIMARY_AXIS, Axis::X))
            .add_install(axis_attr(SECONDARY_AXIS, Axis::Y))
            .add_output(AttrData::new(Self::POLE_MATRIX, AttrType::Matrix))
            .add_input(AttrData::new(Self::POLE_SCALAR_INPUT, AttrType::Float).value(1.0_f32))
            .add_output(AttrData::new(Self::POLE_SCALAR_OUTPUT, AttrType::Float));
        Ok(())
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let indices = build_setup_chain(ctx)?;
        let (scalar_in, scalar_out) = (
            ctx.io(Self::POLE_SCALAR_INPUT),
            ctx.io(Self::POLE_SCALAR_OUTPUT),
        );
        ctx.connect(&scalar_in, &scalar_out)?;

        let &[root, mid, end] = indices.as_slice() else {
            warn!(
                "Hinge setup {} has {} entries, the pole needs {}",
                ctx.namespace(),
                indices.len(),
                Self::CHAIN_LENGTH
            );
            return Ok(());
        };
        let pole = ctx.create_node(NodeType::Expression(ExprProgram::PoleVector), "pole_vector");
        let inputs = [
            (root, expression::ROOT_MATRIX),
            (mid, expression::MID_MATRIX),
            (end, expression::END_MATRIX),
        ];
        for (index, attr) in inputs {
            let world = ctx.entry(index, INPUT_WORLD_MATRIX);
            ctx.connect(&world, &Plug::attr(pole, attr))?;
        }
        ctx.connect(&scalar_in, &Plug::attr(pole, expression::DISTANCE))?;
        let pole_matrix = ctx.io(Self::POLE_MATRIX);
        ctx.connect(&Plug::attr(pole, matrix_node::OUTPUT_MATRIX), &pole_matrix)?;

        let spec = ControlSpec::new(Control::new(ShapeKind::Pyramid)).scale(0.3);
        let group = ctx.root_transform();
        promote_to_control(ctx, &pole_matrix, &spec, Self::POLE_CONTROL, group)?;
        Ok(())
    }

    fn mirror_overrides(&self, _graph: &SceneGraph, interface: NodeId, config: &mut ComponentConfig) {
        config.insert(
            Self::POLE_SCALAR_INPUT_KEY,
            Plug::attr(interface, Self::POLE_SCALAR_OUTPUT),
        );
    }
}

pub(crate) fn axis_attr(name: &str, default: Axis) -> AttrData {
    AttrData::new(name, AttrType::Enum(Axis::names())).value(AttrValue::Enum(default.index()))
}

#[cfg(test)]
mod tests {
    use bevy_math::{Mat4, Vec3};

    use super::*;
    use crate::{
        builtin_registry,
        test_support::{leg_pose, posed_config},
    };
    use rig_graph_core::{
        component::{Rig, is_same_matrix},
        config::ConfigValue,
        graph::solvers::translation,
        hierarchy::{HierBuildData, OUTPUT_LOCAL_MATRIX, chain_indices, entry_attr},
        symmetry::Side,
    };

    fn built(rig: &mut Rig, component: impl ComponentLike) -> NodeId {
        let config = posed_config("leg", Side::Left);
        let scope = rig.add_component(component, config).unwrap();
        rig.build(scope).unwrap();
        rig.interface(scope).unwrap()
    }

    #[test]
    fn outputs_follow_the_setup_controls() {
        let mut rig = Rig::with_registry(builtin_registry());
        let interface = built(&mut rig, ChainSetup);
        let graph = rig.graph();

        let knee = graph
            .matrix(&entry_attr(interface, 1, OUTPUT_WORLD_MATRIX))
            .unwrap();
        assert!(is_same_matrix(knee, leg_pose()[1].1));
        let init = graph.matrix(&entry_attr(interface, 1, HIER_INIT_MATRIX)).unwrap();
        assert!(is_same_matrix(init, knee));

        let hip = graph
            .matrix(&entry_attr(interface, 0, OUTPUT_WORLD_MATRIX))
            .unwrap();
        let local = graph
            .matrix(&entry_attr(interface, 1, OUTPUT_LOCAL_MATRIX))
            .unwrap();
        assert!(is_same_matrix(hip * local, knee));
        assert!(graph.find("left_leg__chain_setup:knee__sphere_control:control").is_some());
    }

    #[test]
    fn rebuild_keeps_the_pose() {
        let mut rig = Rig::with_registry(builtin_registry());
        let interface = built(&mut rig, ChainSetup);
        let scope = rig.graph().scope_of(interface).unwrap();
        let ankle = entry_attr(interface, 2, OUTPUT_WORLD_MATRIX);
        let before = rig.graph().matrix(&ankle).unwrap();

        rig.rebuild(scope).unwrap();
        let after = rig.graph().matrix(&ankle).unwrap();
        assert!(is_same_matrix(before, after));
    }

    #[test]
    fn hinge_setup_places_a_pole() {
        let mut rig = Rig::with_registry(builtin_registry());
        let interface = built(&mut rig, HingeSetup);
        let graph = rig.graph();

        let pole = graph
            .matrix(&Plug::attr(interface, HingeSetup::POLE_MATRIX))
            .unwrap();
        let knee = translation(leg_pose()[1].1);
        let offset = translation(pole) - knee;
        assert!((offset.length() - 1.0).abs() < 1e-4);
        assert!(offset.z > 0.0);
        assert_eq!(
            graph
                .value(&Plug::attr(interface, HingeSetup::POLE_SCALAR_OUTPUT))
                .and_then(|value| value.as_float()),
            Some(1.0)
        );
    }

    #[test]
    fn hinge_setup_keeps_three_entries() {
        let mut rig = Rig::with_registry(builtin_registry());
        let config = posed_config("leg", Side::Left)
            .hier(3, HierBuildData::posed("toe", Mat4::from_translation(Vec3::Z)));
        let scope = rig.add_component(HingeSetup, config).unwrap();
        let interface = rig.interface(scope).unwrap();
        assert_eq!(chain_indices(rig.graph(), interface), vec![0, 1, 2]);
    }

    #[test]
    fn twin_reads_the_pole_scalar_of_the_original() {
        let mut config = ComponentConfig::new();
        HingeSetup.mirror_overrides(&SceneGraph::new(), NodeId(4), &mut config);
        assert_eq!(
            config.get(HingeSetup::POLE_SCALAR_INPUT_KEY),
            Some(&ConfigValue::Connect(Plug::attr(
                NodeId(4),
                HingeSetup::POLE_SCALAR_OUTPUT
            )))
        );
    }
}
