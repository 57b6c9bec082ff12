//! Small components exercising the lifecycle engine in unit tests.

use bevy_math::{Mat4, Vec3};

use crate::{
    component::{BuildContext, ComponentKind, ComponentLike, ComponentRegistry, Rig, SchemaContext},
    config::ComponentConfig,
    errors::RigResult,
    graph::{AttrType, Plug, ScopeId, transform},
    hierarchy::{HierBuildData, INPUT_WORLD_MATRIX, OUTPUT_LOCAL_MATRIX, OUTPUT_WORLD_MATRIX},
    mirror::PRIMARY_AXIS,
    schema::AttrData,
    symmetry::{Axis, Side},
};

pub const BLEND: &str = "blend";
pub const RESULT: &str = "result";

/// Chain component: one joint per entry, outputs read back from the joints.
#[derive(Debug, Clone, Default)]
pub struct Probe;

impl ComponentLike for Probe {
    fn class_name(&self) -> &'static str {
        "Probe"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Anim
    }

    fn is_rebuildable(&self) -> bool {
        true
    }

    fn root_transform_name(&self) -> Option<&'static str> {
        Some("probe_grp")
    }

    fn has_hier(&self) -> bool {
        true
    }

    fn build_schema(&self, ctx: &mut SchemaContext) -> RigResult<()> {
        ctx.add_input(AttrData::new(BLEND, AttrType::Float).value(0.5_f32))
            .add_input(AttrData::new(PRIMARY_AXIS, AttrType::Enum(Axis::names())))
            .add_output(AttrData::new(RESULT, AttrType::Float));
        Ok(())
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let (blend, result) = (ctx.io(BLEND), ctx.io(RESULT));
        ctx.connect(&blend, &result)?;
        let root = ctx.root_transform();
        for index in ctx.chain_indices() {
            let name = ctx.hier_name(index);
            let joint = ctx.create_transform(&format!("{name}_jnt"), root)?;
            let world = ctx.entry(index, INPUT_WORLD_MATRIX);
            ctx.connect(&world, &Plug::attr(joint, transform::OFFSET_PARENT_MATRIX))?;
            let (out_world, out_local) = (
                ctx.entry(index, OUTPUT_WORLD_MATRIX),
                ctx.entry(index, OUTPUT_LOCAL_MATRIX),
            );
            ctx.connect(&Plug::attr(joint, transform::WORLD_MATRIX), &out_world)?;
            ctx.connect(&Plug::attr(joint, transform::DAG_LOCAL_MATRIX), &out_local)?;
        }
        Ok(())
    }
}

/// Chain component that only derives its local inputs.
#[derive(Debug, Clone, Default)]
pub struct LocalChain;

impl ComponentLike for LocalChain {
    fn class_name(&self) -> &'static str {
        "LocalChain"
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

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        ctx.gen_input_local_matrices(true)
    }
}

/// Chainless component whose build output may not be regenerated.
#[derive(Debug, Clone, Default)]
pub struct Frozen;

impl ComponentLike for Frozen {
    fn class_name(&self) -> &'static str {
        "Frozen"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Character
    }

    fn root_transform_name(&self) -> Option<&'static str> {
        Some("frozen_grp")
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let root = ctx.root_transform();
        ctx.create_transform("content", root)?;
        Ok(())
    }
}

pub fn test_rig() -> Rig {
    let mut registry = ComponentRegistry::new();
    registry
        .register::<crate::hierarchy::OffsetMatrix>()
        .register::<crate::mirror::MirrorHelper>()
        .register::<Probe>()
        .register::<LocalChain>()
        .register::<Frozen>();
    Rig::with_registry(registry)
}

pub fn leg_pose() -> [(&'static str, Mat4); 3] {
    [
        ("hip", Mat4::from_translation(Vec3::new(1.0, 10.0, 0.0))),
        ("knee", Mat4::from_translation(Vec3::new(1.2, 5.0, 0.5))),
        ("ankle", Mat4::from_translation(Vec3::new(1.2, 1.0, 0.0))),
    ]
}

/// Built left `Probe` named `leg` posed with [`leg_pose`].
pub fn left_leg(rig: &mut Rig) -> ScopeId {
    let mut config = ComponentConfig::new().instance_name("leg").side(Side::Left);
    for (index, (name, world)) in leg_pose().into_iter().enumerate() {
        config = config.hier(index, HierBuildData::posed(name, world));
    }
    let scope = rig.add_component(Probe, config).unwrap();
    rig.build(scope).unwrap();
    scope
}
