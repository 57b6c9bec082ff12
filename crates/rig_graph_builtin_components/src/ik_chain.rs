use bevy_log::{debug, warn};
use rig_graph_core::{
    component::{BuildContext, ComponentKind, ComponentLike, SchemaContext},
    errors::RigResult,
    graph::{AttrType, ExprProgram, NodeType, Plug, expression, matrix_node, mult_matrix},
    hierarchy::{INPUT_WORLD_MATRIX, OUTPUT_WORLD_MATRIX},
    mirror::{PRIMARY_AXIS, SECONDARY_AXIS},
    schema::AttrData,
    symmetry::Axis,
};

use crate::{
    chain::{axis_vector_choice, connect_local_outputs},
    setup::axis_attr,
};

/// Inverse kinematics over a chain of two or three entries.
///
/// `rootMatrix` is where the first entry should sit, `goalMatrix` where the last one
/// should reach and `poleMatrix` the point the middle joint bends towards. The entries'
/// input world matrices are the rest pose the solver starts from. Left unset, the root
/// and goal stay on the first and last entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct IkChain;

impl IkChain {
    pub const ROOT_MATRIX: &'static str = "rootMatrix";
    pub const GOAL_MATRIX: &'static str = "goalMatrix";
    pub const POLE_MATRIX: &'static str = "poleMatrix";
    pub const STRETCHY: &'static str = "stretchy";
    pub const PRIMARY_AXIS_VECTOR: &'static str = "primaryAxisVector";
    pub const SECONDARY_AXIS_VECTOR: &'static str = "secondaryAxisVector";

    pub const ROOT_MATRIX_KEY: &'static str = "root_matrix";
    pub const GOAL_MATRIX_KEY: &'static str = "goal_matrix";
    pub const POLE_MATRIX_KEY: &'static str = "pole_matrix";
    pub const STRETCHY_KEY: &'static str = "stretchy";
}

impl ComponentLike for IkChain {
    fn class_name(&self) -> &'static str {
        "IkChain"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Motion
    }

    fn is_rebuildable(&self) -> bool {
        true
    }

    fn has_hier(&self) -> bool {
        true
    }

    fn build_schema(&self, ctx: &mut SchemaContext) -> RigResult<()> {
        ctx.add_input(AttrData::new(Self::ROOT_MATRIX, AttrType::Matrix))
            .add_input(AttrData::new(Self::GOAL_MATRIX, AttrType::Matrix))
            .add_input(AttrData::new(Self::POLE_MATRIX, AttrType::Matrix))
            .add_install(AttrData::new(Self::STRETCHY, AttrType::Bool).value(true))
            .add_install(axis_attr(PRIMARY_AXIS, Axis::X))
            .add_install(axis_attr(SECONDARY_AXIS, Axis::Y))
            .add_output(AttrData::new(Self::PRIMARY_AXIS_VECTOR, AttrType::Vector3))
            .add_output(AttrData::new(Self::SECONDARY_AXIS_VECTOR, AttrType::Vector3));
        Ok(())
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        axis_vector_choice(ctx, "primary_vector_choice", PRIMARY_AXIS, Self::PRIMARY_AXIS_VECTOR)?;
        axis_vector_choice(
            ctx,
            "secondary_vector_choice",
            SECONDARY_AXIS,
            Self::SECONDARY_AXIS_VECTOR,
        )?;

        let indices = ctx.chain_indices();
        let (Some(&first), Some(&last)) = (indices.first(), indices.last()) else {
            warn!("IK chain {} has no entries", ctx.namespace());
            return Ok(());
        };
        if !(2..=3).contains(&indices.len()) {
            warn!(
                "IK chain {} has {} entries, only supports 2 or 3",
                ctx.namespace(),
                indices.len()
            );
            return Ok(());
        }
        let root = ctx.io(Self::ROOT_MATRIX);
        let goal = ctx.io(Self::GOAL_MATRIX);
        default_to_entry(ctx, &root, first)?;
        default_to_entry(ctx, &goal, last)?;

        // The solver moves the rest pose rigidly so its first entry lands on rootMatrix.
        let rest_root = ctx.entry(first, INPUT_WORLD_MATRIX);
        let inverse = ctx.create_node(NodeType::InverseMatrix, "rest_root_inv");
        ctx.connect(&rest_root, &Plug::attr(inverse, matrix_node::INPUT_MATRIX))?;
        let root_offset = ctx.create_mult_matrix(
            "root_offset_mult",
            &[Plug::attr(inverse, matrix_node::OUTPUT_MATRIX), root],
        )?;

        let solver = ctx.create_node(NodeType::Expression(ExprProgram::TwoBoneIk), "ik_solver");
        ctx.connect(
            &Plug::attr(root_offset, mult_matrix::MATRIX_SUM),
            &Plug::attr(solver, expression::ROOT_MATRIX),
        )?;
        ctx.connect(&goal, &Plug::attr(solver, expression::GOAL_MATRIX))?;
        let pole = ctx.io(Self::POLE_MATRIX);
        if ctx.graph().is_connected(&pole) {
            ctx.connect(&pole, &Plug::attr(solver, expression::POLE_MATRIX))?;
        } else {
            debug!("IK chain {} has no pole, bending in the rest plane", ctx.namespace());
        }
        let stretchy = ctx.io(Self::STRETCHY);
        ctx.connect(&stretchy, &Plug::attr(solver, expression::STRETCHY))?;

        let mut worlds = Vec::with_capacity(indices.len());
        for (position, &index) in indices.iter().enumerate() {
            let rest = ctx.entry(index, INPUT_WORLD_MATRIX);
            ctx.connect(&rest, &Plug::element(solver, expression::INIT_WORLD, position))?;
            let solved = Plug::element(solver, expression::OUT_WORLD, position);
            let output = ctx.entry(index, OUTPUT_WORLD_MATRIX);
            ctx.connect(&solved, &output)?;
            worlds.push(solved);
        }
        connect_local_outputs(ctx, &indices, &worlds)
    }
}

/// Drives `input` from the entry's world matrix unless it was connected or set.
fn default_to_entry(ctx: &mut BuildContext, input: &Plug, index: usize) -> RigResult<()> {
    let graph = ctx.graph();
    if graph.is_connected(input) || graph.stored_value(input).is_some() {
        return Ok(());
    }
    let world = ctx.entry(index, INPUT_WORLD_MATRIX);
    ctx.connect(&world, input)
}
