use crate::{
    component::{BuildContext, ComponentKind, ComponentLike, SchemaContext},
    errors::RigResult,
    graph::{AttrType, NodeType, Plug, matrix_node, mult_matrix},
    schema::AttrData,
};

/// `offsetMatrix = inverse(spaceMatrix) * targetMatrix`: the target expressed in the
/// given space. Used to derive local matrices of hierarchy entries.
#[derive(Debug, Clone, Default)]
pub struct OffsetMatrix;

impl OffsetMatrix {
    pub const TARGET_MATRIX: &'static str = "targetMatrix";
    pub const SPACE_MATRIX: &'static str = "spaceMatrix";
    pub const OFFSET_MATRIX: &'static str = "offsetMatrix";

    /// Config keys of the two inputs.
    pub const TARGET_MATRIX_KEY: &'static str = "target_matrix";
    pub const SPACE_MATRIX_KEY: &'static str = "space_matrix";
}

impl ComponentLike for OffsetMatrix {
    fn class_name(&self) -> &'static str {
        "OffsetMatrix"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Matrix
    }

    fn is_rebuildable(&self) -> bool {
        true
    }

    fn has_side(&self) -> bool {
        false
    }

    fn build_schema(&self, ctx: &mut SchemaContext) -> RigResult<()> {
        ctx.add_input(AttrData::new(Self::TARGET_MATRIX, AttrType::Matrix))
            .add_input(AttrData::new(Self::SPACE_MATRIX, AttrType::Matrix))
            .add_output(AttrData::new(Self::OFFSET_MATRIX, AttrType::Matrix));
        Ok(())
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let (target, space, offset) = (
            ctx.io(Self::TARGET_MATRIX),
            ctx.io(Self::SPACE_MATRIX),
            ctx.io(Self::OFFSET_MATRIX),
        );
        let inverse = ctx.create_node(NodeType::InverseMatrix, "space_inverse");
        ctx.connect(&space, &Plug::attr(inverse, matrix_node::INPUT_MATRIX))?;
        let mult = ctx.create_mult_matrix(
            "offset_mult",
            &[target, Plug::attr(inverse, matrix_node::OUTPUT_MATRIX)],
        )?;
        ctx.connect(&Plug::attr(mult, mult_matrix::MATRIX_SUM), &offset)
    }
}

#[cfg(test)]
mod tests {
    use bevy_math::{Mat4, Quat, Vec3};

    use super::*;
    use crate::{
        component::{Rig, is_same_matrix},
        config::ComponentConfig,
    };

    #[test]
    fn expresses_target_in_space() {
        let mut rig = Rig::new();
        let space = Mat4::from_rotation_translation(Quat::from_rotation_z(0.7_f32), Vec3::new(1.0, 2.0, 0.0));
        let local = Mat4::from_translation(Vec3::new(0.0, 3.0, -1.0));
        let config = ComponentConfig::new()
            .instance_name("probe")
            .with(OffsetMatrix::TARGET_MATRIX_KEY, space * local)
            .with(OffsetMatrix::SPACE_MATRIX_KEY, space);
        let scope = rig.add_component(OffsetMatrix, config).unwrap();
        rig.build(scope).unwrap();

        let interface = rig.interface(scope).unwrap();
        let offset = rig
            .graph()
            .matrix(&Plug::attr(interface, OffsetMatrix::OFFSET_MATRIX))
            .unwrap();
        assert!(is_same_matrix(offset, local));
    }
}
