//! Wiring shared by the chain components.

use rig_graph_core::{
    component::BuildContext,
    config::ComponentConfig,
    errors::RigResult,
    graph::{AttrPath, NodeType, Plug, choice, matrix_node, mult_matrix},
    hierarchy::{HIER, OUTPUT_LOCAL_MATRIX},
    symmetry::Axis,
};

/// Index of the `hier[i]` entry a configuration key addresses, if any.
pub(crate) fn hier_key_index(key: &str) -> Option<usize> {
    let path = AttrPath::from_config_key(key).ok()?;
    let root = path.root()?;
    (root.name() == HIER).then(|| root.index()).flatten()
}

/// Drops every key addressing an entry at or past `len`.
pub(crate) fn limit_hier_entries(config: &mut ComponentConfig, len: usize) {
    config
        .values
        .retain(|key, _| hier_key_index(key).is_none_or(|index| index < len));
}

/// `outputLocalMatrix` of each entry from the world matrices in `worlds`: the first
/// entry's local is its world, later ones are expressed in the entry before them.
pub(crate) fn connect_local_outputs(
    ctx: &mut BuildContext,
    indices: &[usize],
    worlds: &[Plug],
) -> RigResult<()> {
    for (position, (&index, world)) in indices.iter().zip(worlds).enumerate() {
        let local = ctx.entry(index, OUTPUT_LOCAL_MATRIX);
        if position == 0 {
            ctx.connect(world, &local)?;
            continue;
        }
        let name = ctx.hier_name(index);
        let inverse = ctx.create_node(NodeType::InverseMatrix, &format!("{name}_parent_inv"));
        ctx.connect(
            &worlds[position - 1],
            &Plug::attr(inverse, matrix_node::INPUT_MATRIX),
        )?;
        let mult = ctx.create_mult_matrix(
            &format!("{name}_local_mult"),
            &[world.clone(), Plug::attr(inverse, matrix_node::OUTPUT_MATRIX)],
        )?;
        ctx.connect(&Plug::attr(mult, mult_matrix::MATRIX_SUM), &local)?;
    }
    Ok(())
}

/// `Choice` node turning the axis enum `axis_attr` into its unit vector on `vector_attr`.
pub(crate) fn axis_vector_choice(
    ctx: &mut BuildContext,
    short_name: &str,
    axis_attr: &str,
    vector_attr: &str,
) -> RigResult<()> {
    let node = ctx.create_node(NodeType::Choice, short_name);
    for (index, axis) in Axis::ALL.into_iter().enumerate() {
        ctx.set_value(&Plug::element(node, choice::INPUT, index), axis.vector())?;
    }
    let (axis, vector) = (ctx.io(axis_attr), ctx.io(vector_attr));
    ctx.connect(&axis, &Plug::attr(node, choice::SELECTOR))?;
    ctx.connect(&Plug::attr(node, choice::OUTPUT), &vector)
}
