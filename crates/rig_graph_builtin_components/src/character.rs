use bevy_math::{Mat4, Vec3};
use rig_graph_core::{
    component::{BuildContext, ComponentKind, ComponentLike, Rig, SchemaContext},
    errors::RigResult,
    graph::{AttrType, AttrValue, NodeId, ScopeId},
    schema::AttrData,
    shapes::ShapeKind,
    symmetry::Side,
};

use crate::control::{Control, ControlSpec, insert_control};

/// Palette indices used for control shapes.
pub mod colors {
    pub const BLUE: i64 = 6;
    pub const RED: i64 = 13;
    pub const YELLOW: i64 = 17;
    pub const GOLD: i64 = 21;
}

/// Top of a rig: a root control plus the groups setup and anim components hang under.
/// Never regenerated once built.
#[derive(Debug, Clone, Copy, Default)]
pub struct Character;

impl Character {
    pub const PRIMARY_SIDE: &'static str = "primarySide";
    pub const SETUP_COLOR: &'static str = "setupColor";
    pub const NON_MIRROR_COLOR: &'static str = "nonMirrorColor";
    pub const PRIMARY_SIDE_COLOR: &'static str = "primarySideColor";
    pub const MIRROR_SIDE_COLOR: &'static str = "mirrorSideColor";

    /// Scope pointers to the groups created on build.
    pub const ROOT_CONTROL: &'static str = "rootCntrl";
    pub const SETUP_GRP: &'static str = "setupGrp";
    pub const ANIM_GRP: &'static str = "animGrp";

    pub fn setup_group(rig: &Rig, scope: ScopeId) -> Option<NodeId> {
        rig.graph().scope_pointer(scope, Self::SETUP_GRP)
    }

    pub fn anim_group(rig: &Rig, scope: ScopeId) -> Option<NodeId> {
        rig.graph().scope_pointer(scope, Self::ANIM_GRP)
    }
}

impl ComponentLike for Character {
    fn class_name(&self) -> &'static str {
        "Character"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Character
    }

    fn root_transform_name(&self) -> Option<&'static str> {
        Some("char_grp")
    }

    fn has_side(&self) -> bool {
        false
    }

    fn build_schema(&self, ctx: &mut SchemaContext) -> RigResult<()> {
        let color = |name: &str, value: i64| AttrData::new(name, AttrType::Int).value(value);
        ctx.add_install(
            AttrData::new(Self::PRIMARY_SIDE, AttrType::Enum(Side::names()))
                .value(AttrValue::Enum(Side::Left.index())),
        )
        .add_install(color(Self::SETUP_COLOR, colors::YELLOW))
        .add_install(color(Self::NON_MIRROR_COLOR, colors::GOLD))
        .add_install(color(Self::PRIMARY_SIDE_COLOR, colors::BLUE))
        .add_install(color(Self::MIRROR_SIDE_COLOR, colors::RED));
        Ok(())
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let root = ctx.root_transform();
        let color = ctx
            .graph()
            .value(&ctx.io(Self::NON_MIRROR_COLOR))
            .and_then(|value| value.as_int())
            .unwrap_or(colors::GOLD);
        let spec = ControlSpec::new(Control::new(ShapeKind::Circle))
            .rotate(Vec3::new(0.0, 0.0, 90.0))
            .scale(5.0)
            .color(color);
        let root_control = insert_control(ctx, &spec, "root", Mat4::IDENTITY, root)?;

        let non_move_grp = ctx.create_transform("non_move_grp", root)?;
        let setup_grp = ctx.create_transform("setup_grp", Some(non_move_grp))?;
        let anim_grp = ctx.create_transform("anim_grp", root_control.transform)?;

        let scope = ctx.scope();
        let pointers = [
            (Self::SETUP_GRP, Some(setup_grp)),
            (Self::ANIM_GRP, Some(anim_grp)),
            (Self::ROOT_CONTROL, root_control.transform),
        ];
        for (name, node) in pointers {
            if let Some(node) = node {
                ctx.graph_mut().set_scope_pointer(scope, name, node)?;
            }
        }
        Ok(())
    }
}
