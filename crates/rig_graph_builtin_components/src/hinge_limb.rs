use bevy_log::{debug, warn};
use bevy_math::{Mat4, Vec3};
use rig_graph_core::{
    component::{BuildContext, ComponentKind, ComponentLike, SchemaContext},
    config::{ComponentConfig, ConfigValue},
    errors::RigResult,
    graph::{AttrType, AttrValue, NodeId, Plug, SceneGraph, ScopeId, mult_matrix},
    hierarchy::{
        HIER, HIER_INIT_MATRIX, HIER_NAME, HIER_PARENT, HIER_PARENT_INIT, HierBuildData,
        INPUT_WORLD_MATRIX, OUTPUT_LOCAL_MATRIX, OUTPUT_WORLD_MATRIX, OffsetMatrix, entry_attr,
    },
    mirror::{PRIMARY_AXIS, SECONDARY_AXIS},
    params::ParamValue,
    schema::AttrData,
    shapes::ShapeKind,
    symmetry::Axis,
};

use crate::{
    chain::{hier_key_index, limit_hier_entries},
    character::{Character, colors},
    control::{Control, ControlSpec, insert_control, promote_to_control},
    fk_chain::FkChain,
    ik_chain::IkChain,
    merge_hier::MergeHier,
    setup::{HingeSetup, axis_attr},
};

const CHAIN_LENGTH: usize = 3;
const HIER_PARENT_KEY: &str = "hier_parent";
const HIER_PARENT_INIT_KEY: &str = "hier_parent_init";
const PRIMARY_AXIS_KEY: &str = "primary_axis";
const SECONDARY_AXIS_KEY: &str = "secondary_axis";

/// Animator-facing three joint limb: a hinge setup drives the rest pose, FK and IK chains
/// animate it and a merge per entry switches between them by `selector`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HingeLimb;

impl HingeLimb {
    pub const LEVEL: &'static str = "level";
    pub const SETUP_PARAMS: &'static str = "setupParams";
    pub const FK_PARAMS: &'static str = "fkParams";
    pub const IK_PARAMS: &'static str = "ikParams";
    pub const SELECTOR: &'static str = "selector";
    pub const IK_PARENT_MATRIX: &'static str = "ikParentMatrix";
    pub const POLE_SCALAR: &'static str = "poleScalar";

    pub const LEVEL_KEY: &'static str = "level";
    pub const SETUP_PARAMS_KEY: &'static str = "setup_params";
    pub const FK_PARAMS_KEY: &'static str = "fk_params";
    pub const IK_PARAMS_KEY: &'static str = "ik_params";
    pub const SELECTOR_KEY: &'static str = "selector";
    pub const POLE_SCALAR_KEY: &'static str = "pole_scalar";

    /// Keys of [`Self::IK_PARAMS`] holding the style of each IK control.
    pub const IK_ROOT_CONTROL_KEY: &'static str = "root_cntrl";
    pub const IK_GOAL_CONTROL_KEY: &'static str = "goal_cntrl";
    pub const IK_POLE_CONTROL_KEY: &'static str = "pole_cntrl";

    pub fn default_setup_params() -> ParamValue {
        ControlSpec::new(Control::new(ShapeKind::Sphere))
            .scale(0.3)
            .to_params()
    }

    pub fn default_fk_params() -> ParamValue {
        ControlSpec::new(Control::new(ShapeKind::Box))
            .translate(Vec3::X)
            .scale(0.5)
            .to_params()
    }

    pub fn default_ik_params() -> ParamValue {
        let end = ControlSpec::new(Control::new(ShapeKind::Box)).scale(0.5);
        let pole = ControlSpec::new(Control::new(ShapeKind::Pyramid))
            .rotate(Vec3::new(0.0, 45.0, 0.0))
            .scale(0.5);
        ParamValue::map()
            .with(Self::IK_ROOT_CONTROL_KEY, end.to_params())
            .with(Self::IK_GOAL_CONTROL_KEY, end.to_params())
            .with(Self::IK_POLE_CONTROL_KEY, pole.to_params())
    }

    fn level_names() -> Vec<String> {
        vec!["primary".into(), "secondary".into()]
    }
}

impl ComponentLike for HingeLimb {
    fn class_name(&self) -> &'static str {
        "HingeLimb"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Anim
    }

    fn is_rebuildable(&self) -> bool {
        true
    }

    fn root_transform_name(&self) -> Option<&'static str> {
        Some("anim_grp")
    }

    fn has_hier(&self) -> bool {
        true
    }

    /// Keeps three entries and makes up a straight placeholder chain for missing ones.
    fn filter_config(&self, config: &mut ComponentConfig) {
        limit_hier_entries(config, CHAIN_LENGTH);
        for index in 0..CHAIN_LENGTH {
            if config
                .values
                .keys()
                .any(|key| hier_key_index(key) == Some(index))
            {
                continue;
            }
            let z = if index == 1 { 0.3 } else { 0.0 };
            let world = Mat4::from_translation(Vec3::new(0.0, 2.5 * index as f32, z));
            config.insert(
                format!("{HIER}{index}"),
                HierBuildData::new(format!("temp{index}")).world(world),
            );
        }
    }

    fn build_schema(&self, ctx: &mut SchemaContext) -> RigResult<()> {
        let payload = |name: &str, params: ParamValue| -> RigResult<AttrData> {
            Ok(AttrData::new(name, AttrType::Payload).value(AttrValue::Payload(params.to_bytes()?)))
        };
        ctx.add_install(AttrData::new(Self::LEVEL, AttrType::Enum(Self::level_names())))
            .add_install(axis_attr(PRIMARY_AXIS, Axis::X))
            .add_install(axis_attr(SECONDARY_AXIS, Axis::Y))
            .add_install(payload(Self::SETUP_PARAMS, Self::default_setup_params())?)
            .add_install(payload(Self::FK_PARAMS, Self::default_fk_params())?)
            .add_install(payload(Self::IK_PARAMS, Self::default_ik_params())?)
            .add_input(AttrData::new(Self::SELECTOR, AttrType::Float).keyable())
            .add_input(AttrData::new(Self::IK_PARENT_MATRIX, AttrType::Matrix))
            .add_input(AttrData::new(Self::POLE_SCALAR, AttrType::Float).value(1.0_f32));
        Ok(())
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let indices = ctx.chain_indices();
        if indices.len() != CHAIN_LENGTH {
            warn!(
                "Hinge limb {} has {} entries, needs {CHAIN_LENGTH}",
                ctx.namespace(),
                indices.len()
            );
            return Ok(());
        }
        let root = ctx.root_transform();
        let ik_cntrl_grp = ctx.create_transform("ik_cntrl_grp", root)?;

        let setup = insert_setup(ctx, &indices)?;
        let fk = insert_fk(ctx, &indices, setup, root)?;
        let ik = insert_ik(ctx, &indices, setup, ik_cntrl_grp)?;
        let last_world = merge_chains(ctx, &indices, fk, ik)?;

        let axis = |attr: &str, fallback: Axis| {
            ctx.graph()
                .value(&ctx.io(attr))
                .and_then(|value| value.as_index())
                .and_then(Axis::from_index)
                .unwrap_or(fallback)
        };
        let (primary, secondary) = (axis(PRIMARY_AXIS, Axis::X), axis(SECONDARY_AXIS, Axis::Y));
        let gear = ControlSpec::new(Control::new(ShapeKind::Gear))
            .translate(secondary.vector() * 1.7)
            .rotate(primary.opposite().vector() * 90.0)
            .scale(0.5)
            .color(colors::GOLD);
        insert_control(ctx, &gear, "switch", ConfigValue::Connect(last_world), root)?;
        Ok(())
    }

    fn mirror_overrides(&self, graph: &SceneGraph, interface: NodeId, config: &mut ComponentConfig) {
        config.insert(Self::POLE_SCALAR_KEY, Plug::attr(interface, Self::POLE_SCALAR));
        if let Some(level) = graph.value(&Plug::attr(interface, Self::LEVEL)) {
            config.insert(Self::LEVEL_KEY, level);
        }
        let payloads = [
            (Self::SETUP_PARAMS_KEY, Self::SETUP_PARAMS),
            (Self::FK_PARAMS_KEY, Self::FK_PARAMS),
            (Self::IK_PARAMS_KEY, Self::IK_PARAMS),
        ];
        for (key, attr) in payloads {
            config.insert(key, Plug::attr(interface, attr));
        }
    }
}

/// Decoded payload of an install attribute. Undecodable payloads read as empty.
fn read_params(ctx: &BuildContext, attr: &str) -> ParamValue {
    let bytes = ctx
        .graph()
        .value(&ctx.io(attr))
        .and_then(|value| value.as_payload().map(<[u8]>::to_vec))
        .unwrap_or_default();
    ParamValue::from_bytes(&bytes).unwrap_or_else(|err| {
        warn!("Bad {attr} payload on {}: {err}", ctx.namespace());
        ParamValue::map()
    })
}

/// Keys shared by every entry, overlaid with the `hier<index>` map if there is one.
fn entry_params(params: &ParamValue, index: usize) -> ParamValue {
    let shared = match params {
        ParamValue::Map(map) => ParamValue::Map(
            map.iter()
                .filter(|(key, _)| hier_key_index(key).is_none())
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    };
    match params.get(&format!("{HIER}{index}")) {
        Some(own) => shared.merged(own),
        None => shared,
    }
}

/// Hinge setup feeding the rest pose. Hangs under the character's setup group.
fn insert_setup(ctx: &mut BuildContext, indices: &[usize]) -> RigResult<ScopeId> {
    let params = read_params(ctx, HingeLimb::SETUP_PARAMS);
    let mut config = ComponentConfig::new()
        .with(HIER_PARENT_KEY, ctx.io(HIER_PARENT))
        .with(HIER_PARENT_INIT_KEY, ctx.io(HIER_PARENT_INIT))
        .with(PRIMARY_AXIS_KEY, ctx.io(PRIMARY_AXIS))
        .with(SECONDARY_AXIS_KEY, ctx.io(SECONDARY_AXIS));

    // Driven entries keep following their source. Free ones are handed over to the setup
    // controls once those exist.
    let mut free = Vec::new();
    for &index in indices {
        let input = ctx.entry(index, INPUT_WORLD_MATRIX);
        let world = if ctx.graph().is_connected(&input) {
            ConfigValue::Connect(input)
        } else {
            free.push(index);
            ConfigValue::from(ctx.graph().matrix(&input).unwrap_or_default())
        };
        let data = HierBuildData {
            name: Some(ConfigValue::Connect(ctx.entry(index, HIER_NAME))),
            world_matrix: Some(world),
            params: Some(ConfigValue::Params(entry_params(&params, index))),
            ..Default::default()
        };
        config = config.hier(index, data);
    }

    let pole_scalar = ctx.io(HingeLimb::POLE_SCALAR);
    let scalar_driven = ctx.graph().is_connected(&pole_scalar);
    if scalar_driven {
        config.insert(HingeSetup::POLE_SCALAR_INPUT_KEY, pole_scalar.clone());
    }

    let character = ctx
        .rig()
        .parent_component_of_kind(ctx.scope(), ComponentKind::Character);
    let group = character.and_then(|character| Character::setup_group(ctx.rig(), character));
    let setup = ctx.insert_child(HingeSetup, config, group)?;
    let setup_interface = ctx.child_interface(setup)?;

    if !scalar_driven {
        ctx.connect(
            &Plug::attr(setup_interface, HingeSetup::POLE_SCALAR_OUTPUT),
            &pole_scalar,
        )?;
    }
    for &index in &free {
        let (source, input) = (
            entry_attr(setup_interface, index, INPUT_WORLD_MATRIX),
            ctx.entry(index, INPUT_WORLD_MATRIX),
        );
        ctx.connect(&source, &input)?;
    }
    for &index in indices {
        let (source, init) = (
            entry_attr(setup_interface, index, OUTPUT_WORLD_MATRIX),
            ctx.entry(index, HIER_INIT_MATRIX),
        );
        ctx.connect(&source, &init)?;
    }
    debug!("{} handed {} entries to its setup", ctx.namespace(), free.len());
    Ok(setup_interface)
}

fn insert_fk(
    ctx: &mut BuildContext,
    indices: &[usize],
    setup: NodeId,
    root: Option<NodeId>,
) -> RigResult<NodeId> {
    let params = read_params(ctx, HingeLimb::FK_PARAMS);
    let mut config = ComponentConfig::new()
        .with(HIER_PARENT_KEY, ctx.io(HIER_PARENT))
        .with(HIER_PARENT_INIT_KEY, ctx.io(HIER_PARENT_INIT));
    for &index in indices {
        let data = HierBuildData::from_entry(setup, index, true)
            .params(entry_params(&params, index));
        config = config.hier(index, data);
    }
    let fk = ctx.insert_child(FkChain, config, root)?;
    ctx.child_interface(fk)
}

/// IK chain whose root, goal and pole inputs become controls under `ik_cntrl_grp`.
fn insert_ik(
    ctx: &mut BuildContext,
    indices: &[usize],
    setup: NodeId,
    ik_cntrl_grp: NodeId,
) -> RigResult<NodeId> {
    let setup_world = |index: usize| {
        entry_attr(setup, index, OUTPUT_WORLD_MATRIX)
    };
    let (first, last) = (indices[0], indices[indices.len() - 1]);

    let offset_config = ComponentConfig::new()
        .instance_name("ik_root")
        .with(OffsetMatrix::TARGET_MATRIX_KEY, setup_world(first))
        .with(OffsetMatrix::SPACE_MATRIX_KEY, ctx.io(HIER_PARENT_INIT));
    let offset = ctx.insert_child(OffsetMatrix, offset_config, None)?;
    let offset = Plug::attr(ctx.child_interface(offset)?, OffsetMatrix::OFFSET_MATRIX);
    let hier_parent = ctx.io(HIER_PARENT);
    let root_mult = ctx.create_mult_matrix("ik_root_mult", &[offset, hier_parent])?;

    let ik_parent = ctx.io(HingeLimb::IK_PARENT_MATRIX);
    let goal_mult = ctx.create_mult_matrix("ik_goal_mult", &[setup_world(last), ik_parent.clone()])?;
    let pole_mult = ctx.create_mult_matrix(
        "ik_pole_mult",
        &[Plug::attr(setup, HingeSetup::POLE_MATRIX), ik_parent],
    )?;

    let mut config = ComponentConfig::new()
        .with(IkChain::ROOT_MATRIX_KEY, Plug::attr(root_mult, mult_matrix::MATRIX_SUM))
        .with(IkChain::GOAL_MATRIX_KEY, Plug::attr(goal_mult, mult_matrix::MATRIX_SUM))
        .with(IkChain::POLE_MATRIX_KEY, Plug::attr(pole_mult, mult_matrix::MATRIX_SUM))
        .with(PRIMARY_AXIS_KEY, ctx.io(PRIMARY_AXIS))
        .with(SECONDARY_AXIS_KEY, ctx.io(SECONDARY_AXIS));
    for &index in indices {
        config = config.hier(index, HierBuildData::from_entry(setup, index, true));
    }
    let ik = ctx.insert_child(IkChain, config, None)?;
    let ik_interface = ctx.child_interface(ik)?;

    let params = read_params(ctx, HingeLimb::IK_PARAMS);
    let empty = ParamValue::map();
    let controls = [
        ("ikRoot", IkChain::ROOT_MATRIX, HingeLimb::IK_ROOT_CONTROL_KEY),
        ("ikGoal", IkChain::GOAL_MATRIX, HingeLimb::IK_GOAL_CONTROL_KEY),
        ("ikPole", IkChain::POLE_MATRIX, HingeLimb::IK_POLE_CONTROL_KEY),
    ];
    for (name, attr, key) in controls {
        let style = params.get(key).unwrap_or(&empty);
        let spec = ControlSpec::from_params(style, Control::new(ShapeKind::Box));
        promote_to_control(ctx, &Plug::attr(ik_interface, attr), &spec, name, Some(ik_cntrl_grp))?;
    }
    Ok(ik_interface)
}

/// One merge per entry, blending FK towards IK by `selector`. The first entry blends
/// world matrices, the others blend locals and stack on the merge before them. Returns
/// the last merged world matrix.
fn merge_chains(ctx: &mut BuildContext, indices: &[usize], fk: NodeId, ik: NodeId) -> RigResult<Plug> {
    let selector = ctx.io(HingeLimb::SELECTOR);
    let mut parent: Option<Plug> = None;
    for &index in indices {
        let attr = if parent.is_none() {
            OUTPUT_WORLD_MATRIX
        } else {
            OUTPUT_LOCAL_MATRIX
        };
        let mut config = ComponentConfig::new()
            .instance_name(format!("{}_merge", ctx.hier_name(index)))
            .with("layer0__in_matrix", entry_attr(fk, index, attr))
            .with("layer1__in_matrix", entry_attr(ik, index, attr))
            .with("layer1__weight", selector.clone());
        if let Some(parent) = &parent {
            config.insert("parent_matrix", parent.clone());
        }
        let merge = ctx.insert_child(MergeHier, config, None)?;
        let merge = ctx.child_interface(merge)?;

        let (world, local) = (
            Plug::attr(merge, MergeHier::WORLD_MATRIX),
            Plug::attr(merge, MergeHier::LOCAL_MATRIX),
        );
        let (world_out, local_out) = (
            ctx.entry(index, OUTPUT_WORLD_MATRIX),
            ctx.entry(index, OUTPUT_LOCAL_MATRIX),
        );
        ctx.connect(&world, &world_out)?;
        ctx.connect(&local, &local_out)?;
        parent = Some(world);
    }
    // Three entries were checked by the caller.
    Ok(parent.unwrap_or_else(|| ctx.entry(indices[0], OUTPUT_WORLD_MATRIX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builtin_registry,
        test_support::{leg_pose, posed_config},
    };
    use rig_graph_core::{
        component::{Rig, is_same_matrix},
        graph::{solvers::translation, transform},
        symmetry::Side,
    };

    fn limb(rig: &mut Rig, config: ComponentConfig) -> (ScopeId, NodeId) {
        let scope = rig.add_component(HingeLimb, config).unwrap();
        rig.build(scope).unwrap();
        (scope, rig.interface(scope).unwrap())
    }

    fn outputs(rig: &Rig, interface: NodeId) -> Vec<Vec3> {
        (0..CHAIN_LENGTH)
            .map(|index| {
                let world = rig
                    .graph()
                    .matrix(&entry_attr(interface, index, OUTPUT_WORLD_MATRIX))
                    .unwrap();
                translation(world)
            })
            .collect()
    }

    fn assert_pose(actual: &[Vec3], expected: &[Vec3]) {
        for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!(a.abs_diff_eq(*e, 1e-3), "entry {index}: {a} != {e}");
        }
    }

    #[test]
    fn missing_entries_get_a_placeholder_chain() {
        let mut config = ComponentConfig::new().hier(0, HierBuildData::posed("hip", Mat4::IDENTITY));
        HingeLimb.filter_config(&mut config);
        assert_eq!(config.hier_count(), 3);
        let Some(ConfigValue::Hier(knee)) = config.get("hier1") else {
            panic!("hier1 was not filled in");
        };
        assert_eq!(
            knee.world_matrix,
            Some(ConfigValue::from(Mat4::from_translation(Vec3::new(0.0, 2.5, 0.3))))
        );
    }

    #[test]
    fn fk_and_ik_both_reproduce_the_rest_pose() {
        let mut rig = Rig::with_registry(builtin_registry());
        let (_, interface) = limb(&mut rig, posed_config("leg", Side::Left));
        let rest: Vec<Vec3> = leg_pose().iter().map(|(_, world)| translation(*world)).collect();
        assert_pose(&outputs(&rig, interface), &rest);

        rig.graph_mut()
            .set_value(&Plug::attr(interface, HingeLimb::SELECTOR), 1.0_f32)
            .unwrap();
        assert_pose(&outputs(&rig, interface), &rest);
    }

    #[test]
    fn selector_switches_to_the_ik_goal() {
        let mut rig = Rig::with_registry(builtin_registry());
        let (scope, interface) = limb(&mut rig, posed_config("leg", Side::Left));
        let namespace = rig.namespace(scope).unwrap();
        let goal_control = rig
            .graph()
            .find(&format!("{namespace}:ikGoal__box_control:control"))
            .unwrap();
        let goal = Vec3::new(1.2, 3.0, 2.0);
        rig.graph_mut()
            .set_value(
                &Plug::attr(goal_control, transform::XFORM_MATRIX),
                Mat4::from_translation(goal - translation(leg_pose()[2].1)),
            )
            .unwrap();

        let fk = outputs(&rig, interface);
        assert!(fk[2].abs_diff_eq(translation(leg_pose()[2].1), 1e-3));
        rig.graph_mut()
            .set_value(&Plug::attr(interface, HingeLimb::SELECTOR), 1.0_f32)
            .unwrap();
        assert!(outputs(&rig, interface)[2].abs_diff_eq(goal, 1e-3));
    }

    #[test]
    fn entries_follow_the_setup_controls() {
        let mut rig = Rig::with_registry(builtin_registry());
        let (_, interface) = limb(&mut rig, posed_config("leg", Side::Left));
        let graph = rig.graph();
        let input = entry_attr(interface, 1, INPUT_WORLD_MATRIX);
        let source = graph.source(&input).unwrap();
        assert!(graph.name(source.node).unwrap().contains("hinge_setup"));
        let init = graph.matrix(&entry_attr(interface, 1, HIER_INIT_MATRIX)).unwrap();
        assert!(is_same_matrix(init, leg_pose()[1].1));
        assert_eq!(
            graph
                .value(&Plug::attr(interface, HingeLimb::POLE_SCALAR))
                .and_then(|value| value.as_float()),
            Some(1.0)
        );
    }

    #[test]
    fn rebuild_keeps_the_pose_and_the_children() {
        let mut rig = Rig::with_registry(builtin_registry());
        let (scope, interface) = limb(&mut rig, posed_config("leg", Side::Left));
        let children = rig.child_components(scope).len();
        let before = outputs(&rig, interface);

        rig.rebuild(scope).unwrap();
        assert_eq!(rig.child_components(scope).len(), children);
        assert_pose(&outputs(&rig, interface), &before);
    }

    #[test]
    fn entry_params_overlay_per_entry_maps() {
        let params = ParamValue::map()
            .with(ControlSpec::BUILD_SCALE_KEY, 0.5_f32)
            .with("hier1", ParamValue::map().with(ControlSpec::CONTROL_KEY, Control::GEAR));
        let knee = entry_params(&params, 1);
        assert_eq!(knee.get(ControlSpec::CONTROL_KEY).and_then(ParamValue::as_str), Some(Control::GEAR));
        assert!(knee.get("hier1").is_none());
        assert!(entry_params(&params, 0).get(ControlSpec::CONTROL_KEY).is_none());
    }
}
