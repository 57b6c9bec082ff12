//! End to end rigs built from the stock components.

use bevy_math::{Mat4, Vec3};
use rig_graph_core::{
    component::is_same_matrix,
    graph::transform,
    hierarchy::{HIER_INIT_MATRIX, OUTPUT_LOCAL_MATRIX, OUTPUT_WORLD_MATRIX, entry, entry_attr},
};

use crate::prelude::*;

fn leg_pose() -> [(&'static str, Mat4); 3] {
    [
        ("hip", Mat4::from_translation(Vec3::new(1.0, 10.0, 0.0))),
        ("knee", Mat4::from_translation(Vec3::new(1.2, 5.0, 0.5))),
        ("ankle", Mat4::from_translation(Vec3::new(1.2, 1.0, 0.0))),
    ]
}

/// Built `hero` character with a left hinge leg under its anim group.
fn hero_with_left_leg() -> (Rig, ScopeId, ScopeId) {
    let mut rig = Rig::with_registry(builtin_registry());
    let character = rig
        .add_component(Character, ComponentConfig::new().instance_name("hero"))
        .unwrap();
    rig.build(character).unwrap();

    let mut config = ComponentConfig::new().instance_name("leg").side(Side::Left);
    for (index, (name, world)) in leg_pose().into_iter().enumerate() {
        config = config.hier(index, HierBuildData::posed(name, world));
    }
    let anim_grp = Character::anim_group(&rig, character);
    let leg = rig
        .insert_child(character, Box::new(HingeLimb), config, anim_grp, true)
        .unwrap();
    (rig, character, leg)
}

fn output_world(rig: &Rig, scope: ScopeId, index: usize) -> Mat4 {
    let interface = rig.interface(scope).unwrap();
    rig.graph()
        .matrix(&entry_attr(interface, index, OUTPUT_WORLD_MATRIX))
        .unwrap()
}

fn component_at(rig: &Rig, class_name: &str, namespace_suffix: &str) -> ScopeId {
    rig.find_components(class_name)
        .into_iter()
        .find(|&scope| rig.namespace(scope).unwrap().ends_with(namespace_suffix))
        .unwrap_or_else(|| panic!("no {class_name} at {namespace_suffix}"))
}

/// Connections crossing the component's namespace boundary, as readable strings.
fn external_connections(rig: &Rig, scope: ScopeId) -> Vec<String> {
    let namespace = rig.namespace(scope).unwrap();
    let interface = rig.interface(scope).unwrap();
    let graph = rig.graph();
    let outside = |plug: &Plug| !graph.name(plug.node).unwrap().starts_with(&namespace);
    let incoming = graph
        .incoming(interface)
        .into_iter()
        .filter(|(_, source)| outside(source));
    let outgoing = graph
        .outgoing(interface)
        .into_iter()
        .filter(|(_, target)| outside(target));
    let mut connections: Vec<String> = incoming
        .chain(outgoing)
        .map(|(a, b)| format!("{} -> {}", graph.describe(&a), graph.describe(&b)))
        .collect();
    connections.sort();
    connections
}

#[test]
fn leg_mirror_reflects_every_entry() {
    let (mut rig, character, leg) = hero_with_left_leg();
    let twin = rig
        .mirror_component(leg, MirrorOptions::new(SymmetryMode::MirrorX))
        .unwrap()
        .unwrap();

    assert_eq!(
        rig.namespace(twin).unwrap(),
        "hero__character:right_leg__hinge_limb"
    );
    assert_eq!(rig.identity(twin).unwrap().side, Side::Right);
    assert!(rig.child_components(character).contains(&twin));

    let reflection = SymmetryMode::MirrorX.reflection_matrix();
    for index in 0..leg_pose().len() {
        assert!(
            is_same_matrix(output_world(&rig, twin, index), reflection * output_world(&rig, leg, index)),
            "entry {index}"
        );
    }
    let hip = output_world(&rig, twin, 0);
    assert!(hip.w_axis.truncate().abs_diff_eq(Vec3::new(-1.0, 10.0, 0.0), 1e-4));
}

#[test]
fn controls_take_their_colour_from_the_character() {
    let (mut rig, _, leg) = hero_with_left_leg();
    rig.mirror_component(leg, MirrorOptions::default()).unwrap();

    let color = |suffix: &str, class_name: &str| {
        let control = component_at(&rig, class_name, suffix);
        let interface = rig.interface(control).unwrap();
        rig.graph()
            .value(&Plug::attr(interface, Control::SHAPE_COLOR))
            .and_then(|value| value.as_int())
    };
    assert_eq!(color("left_leg__hinge_limb:fk_chain:hip__box_control", Control::BOX), Some(6));
    assert_eq!(color("right_leg__hinge_limb:fk_chain:hip__box_control", Control::BOX), Some(13));
    assert_eq!(
        color("left_leg__hinge_limb:hinge_setup:knee__sphere_control", Control::SPHERE),
        Some(17)
    );
    assert_eq!(color("left_leg__hinge_limb:switch__gear_control", Control::GEAR), Some(21));
}

#[test]
fn twin_shares_drivers_that_have_no_twin() {
    let (mut rig, character, leg) = hero_with_left_leg();
    let space_config = ComponentConfig::new()
        .instance_name("hand_space")
        .with(SpaceMatrix::TARGET_MATRIX_KEY, Mat4::from_translation(Vec3::Y));
    let space = rig
        .insert_child(character, Box::new(SpaceMatrix), space_config, None, true)
        .unwrap();
    let driver = Plug::attr(rig.interface(space).unwrap(), SpaceMatrix::SPACE_MATRIX);
    let leg_input = Plug::attr(rig.interface(leg).unwrap(), HingeLimb::IK_PARENT_MATRIX);
    rig.graph_mut().connect(&driver, &leg_input).unwrap();

    let pairs = rig
        .mirror_component_list(&[leg, space], MirrorOptions::default())
        .unwrap();
    assert_eq!(pairs.len(), 1);
    let twin = pairs[0].1;
    let twin_input = Plug::attr(rig.interface(twin).unwrap(), HingeLimb::IK_PARENT_MATRIX);
    assert_eq!(rig.graph().source(&twin_input), Some(driver));
}

#[test]
fn rebuild_keeps_external_connections() {
    let (mut rig, character, leg) = hero_with_left_leg();
    let leg_interface = rig.interface(leg).unwrap();
    let foot_config = ComponentConfig::new()
        .instance_name("foot_space")
        .with(
            SpaceMatrix::TARGET_MATRIX_KEY,
            entry_attr(leg_interface, 2, OUTPUT_WORLD_MATRIX),
        )
        .with(SpaceMatrix::OFFSET_MATRIX_KEY, leg_pose()[2].1);
    rig.insert_child(character, Box::new(SpaceMatrix), foot_config, None, true)
        .unwrap();
    rig.graph_mut()
        .set_value(&Plug::attr(leg_interface, HingeLimb::SELECTOR), 1.0_f32)
        .unwrap();

    let before = external_connections(&rig, leg);
    let members = rig.graph().members(leg).len();
    let outputs: Vec<Mat4> = (0..3).map(|index| output_world(&rig, leg, index)).collect();
    assert!(before.iter().any(|line| line.contains("foot_space")));

    rig.rebuild(leg).unwrap();
    assert_eq!(external_connections(&rig, leg), before);
    assert_eq!(rig.graph().members(leg).len(), members);
    for (index, world) in outputs.into_iter().enumerate() {
        assert!(is_same_matrix(output_world(&rig, leg, index), world), "entry {index}");
    }
    let selector = rig
        .graph()
        .value(&Plug::attr(leg_interface, HingeLimb::SELECTOR))
        .and_then(|value| value.as_float());
    assert_eq!(selector, Some(1.0));
}

#[test]
fn refused_rebuild_leaves_the_document_alone() {
    let (mut rig, character, _) = hero_with_left_leg();
    let before = rig.graph().to_ron().unwrap();
    let result = rig.rebuild(character);
    assert!(matches!(result, Err(RigError::RebuildRefused(_))));
    assert_eq!(rig.graph().to_ron().unwrap(), before);
}

#[test]
fn chain_parented_to_the_ankle_follows_it() {
    let (mut rig, _, leg) = hero_with_left_leg();
    let ball = Mat4::from_translation(Vec3::new(1.2, 0.5, 1.0));
    let toe = Mat4::from_translation(Vec3::new(1.2, 0.4, 2.0));
    let config = ComponentConfig::new()
        .instance_name("toe")
        .side(Side::Left)
        .hier(0, HierBuildData::new("ball").world(ball))
        .hier(1, HierBuildData::new("toe").world(toe));
    let fk = rig.add_component(FkChain, config).unwrap();
    let leg_interface = rig.interface(leg).unwrap();
    rig.parent(fk, &entry(leg_interface, 2)).unwrap();
    rig.build(fk).unwrap();

    // Local outputs stack back onto the parent's world matrix.
    let fk_interface = rig.interface(fk).unwrap();
    let local = rig
        .graph()
        .matrix(&entry_attr(fk_interface, 1, OUTPUT_LOCAL_MATRIX))
        .unwrap();
    assert!(is_same_matrix(output_world(&rig, fk, 0) * local, toe));
    assert!(is_same_matrix(output_world(&rig, fk, 0), ball));

    let goal_control = component_at(&rig, Control::BOX, "left_leg__hinge_limb:ikGoal__box_control");
    let goal_transform = rig.root_transform(goal_control).unwrap();
    rig.graph_mut()
        .set_value(
            &Plug::attr(goal_transform, transform::XFORM_MATRIX),
            Mat4::from_translation(Vec3::new(0.0, 2.0, 1.5)),
        )
        .unwrap();
    rig.graph_mut()
        .set_value(&Plug::attr(leg_interface, HingeLimb::SELECTOR), 1.0_f32)
        .unwrap();

    let ankle = output_world(&rig, leg, 2);
    let ankle_init = rig
        .graph()
        .matrix(&entry_attr(leg_interface, 2, HIER_INIT_MATRIX))
        .unwrap();
    assert!(ankle.w_axis.truncate().abs_diff_eq(Vec3::new(1.2, 3.0, 1.5), 1e-3));
    assert!(is_same_matrix(
        output_world(&rig, fk, 0),
        ankle * ankle_init.inverse() * ball
    ));
}

#[test]
fn rig_reloads_from_ron() {
    let (rig, _, leg) = hero_with_left_leg();
    let outputs: Vec<Mat4> = (0..3).map(|index| output_world(&rig, leg, index)).collect();
    let classes = rig.components().count();
    let text = rig.graph().to_ron().unwrap();

    let graph = SceneGraph::from_ron(&text).unwrap();
    let mut reloaded = Rig::from_graph(graph, builtin_registry()).unwrap();
    assert_eq!(reloaded.components().count(), classes);
    assert_eq!(reloaded.find_components("HingeLimb"), vec![leg]);
    assert!(reloaded.is_built(leg));

    reloaded.rebuild(leg).unwrap();
    for (index, world) in outputs.into_iter().enumerate() {
        assert!(is_same_matrix(output_world(&reloaded, leg, index), world), "entry {index}");
    }
}
