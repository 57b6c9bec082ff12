use rig_graph_core::{
    component::{BuildContext, ComponentKind, ComponentLike, SchemaContext},
    errors::RigResult,
    graph::{AttrType, NodeType, Plug, matrix_node, mult_matrix},
    schema::AttrData,
};

/// `spaceMatrix = targetMatrix * inverse(offsetMatrix)`: the transform that carries
/// `offsetMatrix` onto `targetMatrix`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceMatrix;

impl SpaceMatrix {
    pub const TARGET_MATRIX: &'static str = "targetMatrix";
    pub const OFFSET_MATRIX: &'static str = "offsetMatrix";
    pub const SPACE_MATRIX: &'static str = "spaceMatrix";

    pub const TARGET_MATRIX_KEY: &'static str = "target_matrix";
    pub const OFFSET_MATRIX_KEY: &'static str = "offset_matrix";
}

impl ComponentLike for SpaceMatrix {
    fn class_name(&self) -> &'static str {
        "SpaceMatrix"
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
            .add_input(AttrData::new(Self::OFFSET_MATRIX, AttrType::Matrix))
            .add_output(AttrData::new(Self::SPACE_MATRIX, AttrType::Matrix));
        Ok(())
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let (target, offset, space) = (
            ctx.io(Self::TARGET_MATRIX),
            ctx.io(Self::OFFSET_MATRIX),
            ctx.io(Self::SPACE_MATRIX),
        );
        let inverse = ctx.create_node(NodeType::InverseMatrix, "offset_inverse");
        ctx.connect(&offset, &Plug::attr(inverse, matrix_node::INPUT_MATRIX))?;
        let mult = ctx.create_mult_matrix(
            "space_mult",
            &[Plug::attr(inverse, matrix_node::OUTPUT_MATRIX), target],
        )?;
        ctx.connect(&Plug::attr(mult, mult_matrix::MATRIX_SUM), &space)
    }
}
