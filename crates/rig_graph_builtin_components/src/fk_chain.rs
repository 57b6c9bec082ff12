use bevy_log::warn;
use rig_graph_core::{
    component::{BuildContext, ComponentKind, ComponentLike},
    config::{ComponentConfig, ConfigValue},
    errors::RigResult,
    graph::{Plug, mult_matrix},
    hierarchy::{
        HIER_PARENT, HIER_PARENT_INIT, INPUT_LOCAL_MATRIX, INPUT_WORLD_MATRIX, OUTPUT_LOCAL_MATRIX,
        OUTPUT_WORLD_MATRIX, OffsetMatrix,
    },
    shapes::ShapeKind,
};

use crate::control::{Control, ControlSpec, insert_control};

/// Forward kinematics: one control per entry, each parented to the one before it and
/// placed by the entry's local matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct FkChain;

impl ComponentLike for FkChain {
    fn class_name(&self) -> &'static str {
        "FkChain"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Motion
    }

    fn is_rebuildable(&self) -> bool {
        true
    }

    fn root_transform_name(&self) -> Option<&'static str> {
        Some("fk_cntrl_grp")
    }

    fn has_hier(&self) -> bool {
        true
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let indices = ctx.chain_indices();
        let Some(&first) = indices.first() else {
            warn!("FK chain {} has no entries", ctx.namespace());
            return Ok(());
        };
        ctx.gen_input_local_matrices(false)?;

        // The first entry follows hierParent, offset by where it sat in the parent's
        // init pose.
        let config = ComponentConfig::new()
            .instance_name(format!("{}_local", ctx.hier_name(first)))
            .with(OffsetMatrix::TARGET_MATRIX_KEY, ctx.entry(first, INPUT_WORLD_MATRIX))
            .with(OffsetMatrix::SPACE_MATRIX_KEY, ctx.io(HIER_PARENT_INIT));
        let helper = ctx.insert_child(OffsetMatrix, config, None)?;
        let offset = Plug::attr(ctx.child_interface(helper)?, OffsetMatrix::OFFSET_MATRIX);
        let parent_space = ctx.create_mult_matrix("parent_space_mult", &[offset, ctx.io(HIER_PARENT)])?;
        let first_local = ctx.entry(first, INPUT_LOCAL_MATRIX);
        ctx.connect(&Plug::attr(parent_space, mult_matrix::MATRIX_SUM), &first_local)?;

        let mut parent = ctx.root_transform();
        for index in indices {
            let spec = ControlSpec::from_params(&ctx.params(index), Control::new(ShapeKind::Box));
            let local = ctx.entry(index, INPUT_LOCAL_MATRIX);
            let name = ctx.hier_name(index);
            let control = insert_control(ctx, &spec, &name, ConfigValue::Connect(local), parent)?;

            let (world_out, local_out) = (
                ctx.entry(index, OUTPUT_WORLD_MATRIX),
                ctx.entry(index, OUTPUT_LOCAL_MATRIX),
            );
            ctx.connect(&control.world_matrix(), &world_out)?;
            ctx.connect(&control.local_matrix(), &local_out)?;
            parent = control.transform;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::{Mat4, Quat, Vec3};

    use super::*;
    use crate::{
        builtin_registry,
        test_support::{leg_pose, posed_config},
    };
    use rig_graph_core::{
        component::{Rig, is_same_matrix},
        graph::{NodeId, ScopeId},
        hierarchy::entry_attr,
        symmetry::Side,
    };

    fn fk_leg(rig: &mut Rig) -> (ScopeId, NodeId) {
        let scope = rig
            .add_component(FkChain, posed_config("leg", Side::Left))
            .unwrap();
        rig.build(scope).unwrap();
        (scope, rig.interface(scope).unwrap())
    }

    #[test]
    fn controls_reproduce_the_input_pose() {
        let mut rig = Rig::with_registry(builtin_registry());
        let (_, interface) = fk_leg(&mut rig);
        for (index, (_, world)) in leg_pose().into_iter().enumerate() {
            let output = rig
                .graph()
                .matrix(&entry_attr(interface, index, OUTPUT_WORLD_MATRIX))
                .unwrap();
            assert!(is_same_matrix(output, world), "entry {index}");
        }
        let local = rig
            .graph()
            .matrix(&entry_attr(interface, 2, OUTPUT_LOCAL_MATRIX))
            .unwrap();
        assert!(is_same_matrix(
            local,
            leg_pose()[1].1.inverse() * leg_pose()[2].1
        ));
    }

    #[test]
    fn chain_follows_the_parent_entry() {
        let mut rig = Rig::with_registry(builtin_registry());
        let (_, interface) = fk_leg(&mut rig);
        let moved = Mat4::from_rotation_translation(Quat::from_rotation_y(0.5), Vec3::X);
        rig.graph_mut()
            .set_value(&Plug::attr(interface, HIER_PARENT), moved)
            .unwrap();

        let ankle = rig
            .graph()
            .matrix(&entry_attr(interface, 2, OUTPUT_WORLD_MATRIX))
            .unwrap();
        assert!(is_same_matrix(ankle, moved * leg_pose()[2].1));
    }

    #[test]
    fn controls_are_chained_in_the_transform_tree() {
        let mut rig = Rig::with_registry(builtin_registry());
        let (scope, _) = fk_leg(&mut rig);
        let graph = rig.graph();
        let hip = graph.find("left_leg__fk_chain:hip__box_control:control").unwrap();
        let knee = graph.find("left_leg__fk_chain:knee__box_control:control").unwrap();
        assert_eq!(graph.dag_parent(knee), Some(hip));
        assert_eq!(graph.dag_parent(hip), rig.root_transform(scope));
    }
}
