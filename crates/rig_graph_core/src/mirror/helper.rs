use crate::{
    component::{BuildContext, ComponentKind, ComponentLike, SIDE, SchemaContext},
    errors::RigResult,
    graph::{AttrType, NodeType, Plug, mult_matrix, remap},
    hierarchy::{
        HIER_INIT_MATRIX, INPUT_LOCAL_MATRIX, INPUT_WORLD_MATRIX, OUTPUT_LOCAL_MATRIX,
        OUTPUT_WORLD_MATRIX,
    },
    schema::AttrData,
    symmetry::{Axis, Side, SidePairing},
};

pub const SCALE_MATRIX: &str = "scaleMatrix";
pub const PRIMARY_AXIS: &str = "primaryAxis";
pub const SECONDARY_AXIS: &str = "secondaryAxis";
pub const MIRROR_SIDE: &str = "mirrorSide";
pub const MIRROR_PRIMARY_AXIS: &str = "mirrorPrimaryAxis";
pub const MIRROR_SECONDARY_AXIS: &str = "mirrorSecondaryAxis";
pub const MIRROR_INIT: &str = "mirrorInit";

/// Reflects a hierarchy chain through the plane encoded in `scaleMatrix` and exposes
/// the side and axis values a mirrored twin has to be built with.
#[derive(Debug, Clone, Default)]
pub struct MirrorHelper {
    pairing: Option<SidePairing>,
}

impl MirrorHelper {
    /// Helper that swaps sides through `pairing` instead of the default left/right table.
    pub fn with_pairing(pairing: SidePairing) -> Self {
        Self {
            pairing: Some(pairing),
        }
    }

    fn side_table(&self) -> Vec<i64> {
        self.pairing.clone().unwrap_or_default().remap_table()
    }
}

impl ComponentLike for MirrorHelper {
    fn class_name(&self) -> &'static str {
        "MirrorHelper"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Helper
    }

    fn is_rebuildable(&self) -> bool {
        true
    }

    fn has_hier(&self) -> bool {
        true
    }

    fn is_mirrorable(&self) -> bool {
        false
    }

    fn build_schema(&self, ctx: &mut SchemaContext) -> RigResult<()> {
        let axis = || AttrType::Enum(Axis::names());
        ctx.add_input(AttrData::new(SCALE_MATRIX, AttrType::Matrix))
            .add_input(AttrData::new(PRIMARY_AXIS, axis()))
            .add_input(AttrData::new(SECONDARY_AXIS, axis()))
            .add_output(AttrData::new(MIRROR_SIDE, AttrType::Enum(Side::names())))
            .add_output(AttrData::new(MIRROR_PRIMARY_AXIS, axis()))
            .add_output(AttrData::new(MIRROR_SECONDARY_AXIS, axis()))
            .add_output(AttrData::new(MIRROR_INIT, AttrType::Matrix).multi());
        Ok(())
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        remap_values(ctx, "side_remap", SIDE, MIRROR_SIDE, &self.side_table())?;
        let axis_table = Axis::remap_table();
        remap_values(ctx, "primary_axis_remap", PRIMARY_AXIS, MIRROR_PRIMARY_AXIS, &axis_table)?;
        remap_values(
            ctx,
            "secondary_axis_remap",
            SECONDARY_AXIS,
            MIRROR_SECONDARY_AXIS,
            &axis_table,
        )?;

        let scale = ctx.io(SCALE_MATRIX);
        for index in ctx.chain_indices() {
            let name = ctx.hier_name(index);
            for (suffix, input, output) in [
                ("world", INPUT_WORLD_MATRIX, OUTPUT_WORLD_MATRIX),
                ("local", INPUT_LOCAL_MATRIX, OUTPUT_LOCAL_MATRIX),
            ] {
                let mirror = ctx.create_mult_matrix(
                    &format!("{name}_{suffix}_mirror"),
                    &[ctx.entry(index, input), scale.clone()],
                )?;
                ctx.connect(
                    &Plug::attr(mirror, mult_matrix::MATRIX_SUM),
                    &ctx.entry(index, output),
                )?;
            }

            let init = ctx.create_mult_matrix(
                &format!("{name}_init_mirror"),
                &[ctx.entry(index, HIER_INIT_MATRIX), scale.clone()],
            )?;
            let interface = ctx.interface();
            ctx.connect(
                &Plug::attr(init, mult_matrix::MATRIX_SUM),
                &Plug::element(interface, MIRROR_INIT, index),
            )?;
        }
        Ok(())
    }
}

fn remap_values(
    ctx: &mut BuildContext,
    short_name: &str,
    input: &str,
    output: &str,
    table: &[i64],
) -> RigResult<()> {
    let (input, output) = (ctx.io(input), ctx.io(output));
    let node = ctx.create_node(NodeType::Remap, short_name);
    for (index, value) in table.iter().enumerate() {
        ctx.set_value(&Plug::element(node, remap::TABLE, index), *value)?;
    }
    ctx.connect(&input, &Plug::attr(node, remap::INPUT_VALUE))?;
    ctx.connect(&Plug::attr(node, remap::OUT_VALUE), &output)
}
