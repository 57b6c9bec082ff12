use bevy_log::warn;
use rig_graph_core::{
    component::{BuildContext, ComponentKind, ComponentLike, SchemaContext},
    errors::RigResult,
    graph::{AttrType, NodeId, NodeType, Plug, blend_matrix, matrix_node, mult_matrix},
    schema::AttrData,
};

/// Blends local matrices layer by layer and puts the result in `parentMatrix`.
///
/// `layer[0].inMatrix` is the base. Every later layer blends towards its own
/// `inMatrix` by its `weight`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeHier;

impl MergeHier {
    pub const PARENT_MATRIX: &'static str = "parentMatrix";
    pub const LAYER: &'static str = "layer";
    pub const IN_MATRIX: &'static str = "inMatrix";
    pub const WEIGHT: &'static str = "weight";
    pub const WORLD_MATRIX: &'static str = "worldMatrix";
    pub const LOCAL_MATRIX: &'static str = "localMatrix";

    /// `layer[index]` on a merge interface.
    pub fn layer(interface: NodeId, index: usize) -> Plug {
        Plug::element(interface, Self::LAYER, index)
    }
}

impl ComponentLike for MergeHier {
    fn class_name(&self) -> &'static str {
        "MergeHier"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Matrix
    }

    fn is_rebuildable(&self) -> bool {
        true
    }

    fn build_schema(&self, ctx: &mut SchemaContext) -> RigResult<()> {
        ctx.add_input(AttrData::new(Self::PARENT_MATRIX, AttrType::Matrix))
            .add_input(AttrData::new(Self::LAYER, AttrType::Compound).multi())
            .add_attr(AttrData::new(Self::IN_MATRIX, AttrType::Matrix).parent(Self::LAYER))
            .add_attr(AttrData::new(Self::WEIGHT, AttrType::Float).parent(Self::LAYER))
            .add_output(AttrData::new(Self::WORLD_MATRIX, AttrType::Matrix))
            .add_output(AttrData::new(Self::LOCAL_MATRIX, AttrType::Matrix));
        Ok(())
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let interface = ctx.interface();
        let layers = ctx.graph().multi_indices(interface, Self::LAYER);
        let Some((&base, rest)) = layers.split_first() else {
            warn!("Merge {} has no layers to blend", ctx.namespace());
            return Ok(());
        };

        let blend = ctx.create_node(NodeType::BlendMatrix, "local_blend");
        ctx.connect(
            &Self::layer(interface, base).child(Self::IN_MATRIX),
            &Plug::attr(blend, matrix_node::INPUT_MATRIX),
        )?;
        for (target, &index) in rest.iter().enumerate() {
            let layer = Self::layer(interface, index);
            let slot = Plug::element(blend, blend_matrix::TARGET, target);
            ctx.connect(
                &layer.child(Self::IN_MATRIX),
                &slot.child(blend_matrix::TARGET_MATRIX),
            )?;
            ctx.connect(&layer.child(Self::WEIGHT), &slot.child(blend_matrix::WEIGHT))?;
        }

        let blended = Plug::attr(blend, matrix_node::OUTPUT_MATRIX);
        let parent = ctx.io(Self::PARENT_MATRIX);
        let world = ctx.create_mult_matrix("world_mult", &[blended.clone(), parent])?;
        let (world_out, local_out) = (ctx.io(Self::WORLD_MATRIX), ctx.io(Self::LOCAL_MATRIX));
        ctx.connect(&Plug::attr(world, mult_matrix::MATRIX_SUM), &world_out)?;
        ctx.connect(&blended, &local_out)
    }
}
