use bevy_log::warn;
use bevy_math::Vec3;
use rig_graph_core::{
    component::{
        BuildContext, ComponentKind, ComponentLike, INTERFACE_ROLE, ROOT_TRANSFORM_ROLE, Rig,
        SchemaContext,
    },
    config::{ComponentConfig, ConfigValue},
    errors::RigResult,
    graph::{AttrPath, AttrType, NodeId, Plug, ScopeId, transform},
    params::ParamValue,
    schema::{AttrData, PlugRef},
    shapes::{ShapeKind, ShapeStyle},
    symmetry::Side,
};

use crate::character::Character;

const OFFSET_MATRIX_KEY: &str = "offset_matrix";

/// Animator-facing frame: a root transform placed by `offsetMatrix` with a drawable
/// shape attached. One class per shape kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Control {
    shape: ShapeKind,
}

impl Control {
    pub const OFFSET_MATRIX: &'static str = "offsetMatrix";
    pub const WORLD_MATRIX: &'static str = "worldMatrix";
    pub const LOCAL_MATRIX: &'static str = "localMatrix";
    pub const BUILD_TRANSLATE: &'static str = "buildTranslate";
    pub const BUILD_ROTATE: &'static str = "buildRotate";
    pub const BUILD_SCALE: &'static str = "buildScale";
    pub const SHAPE_COLOR: &'static str = "shapeColor";

    pub const BOX: &'static str = "BoxControl";
    pub const SPHERE: &'static str = "SphereControl";
    pub const GEAR: &'static str = "GearControl";
    pub const CIRCLE: &'static str = "CircleControl";
    pub const PYRAMID: &'static str = "PyramidControl";
    pub const LOCATOR: &'static str = "LocatorControl";

    pub fn new(shape: ShapeKind) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn from_class_name(class_name: &str) -> Option<Self> {
        ShapeKind::ALL
            .into_iter()
            .map(Self::new)
            .find(|control| control.class_name() == class_name)
    }

    fn style(ctx: &BuildContext) -> ShapeStyle {
        let vec3 = |name: &str| {
            ctx.graph()
                .value(&ctx.io(name))
                .and_then(|value| value.as_vec3())
        };
        let defaults = ShapeStyle::default();
        ShapeStyle {
            color: ctx
                .graph()
                .value(&ctx.io(Self::SHAPE_COLOR))
                .and_then(|value| value.as_int())
                .unwrap_or(defaults.color),
            translate: vec3(Self::BUILD_TRANSLATE).unwrap_or(defaults.translate),
            rotate: vec3(Self::BUILD_ROTATE).unwrap_or(defaults.rotate),
            scale: vec3(Self::BUILD_SCALE).unwrap_or(defaults.scale),
        }
    }
}

impl ComponentLike for Control {
    fn class_name(&self) -> &'static str {
        match self.shape {
            ShapeKind::Box => Self::BOX,
            ShapeKind::Sphere => Self::SPHERE,
            ShapeKind::Gear => Self::GEAR,
            ShapeKind::Circle => Self::CIRCLE,
            ShapeKind::Pyramid => Self::PYRAMID,
            ShapeKind::Locator => Self::LOCATOR,
        }
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Control
    }

    fn is_rebuildable(&self) -> bool {
        true
    }

    fn root_transform_name(&self) -> Option<&'static str> {
        Some("control")
    }

    fn build_schema(&self, ctx: &mut SchemaContext) -> RigResult<()> {
        ctx.add_input(
            AttrData::new(Self::OFFSET_MATRIX, AttrType::Matrix).connect_to(PlugRef::role_attr(
                ROOT_TRANSFORM_ROLE,
                transform::OFFSET_PARENT_MATRIX,
            )),
        )
        .add_output(AttrData::new(Self::WORLD_MATRIX, AttrType::Matrix))
        .add_output(AttrData::new(Self::LOCAL_MATRIX, AttrType::Matrix))
        .add_install(AttrData::new(Self::BUILD_TRANSLATE, AttrType::Vector3))
        .add_install(AttrData::new(Self::BUILD_ROTATE, AttrType::Vector3))
        .add_install(AttrData::new(Self::BUILD_SCALE, AttrType::Vector3).value(Vec3::ONE))
        .add_install(AttrData::new(Self::SHAPE_COLOR, AttrType::Int));

        if let Some(root) = ctx.node(ROOT_TRANSFORM_ROLE) {
            root.add_attr_data(
                AttrData::existing(transform::WORLD_MATRIX)
                    .connect_to(PlugRef::role_attr(INTERFACE_ROLE, Self::WORLD_MATRIX)),
            );
            root.add_attr_data(
                AttrData::existing(transform::DAG_LOCAL_MATRIX)
                    .connect_to(PlugRef::role_attr(INTERFACE_ROLE, Self::LOCAL_MATRIX)),
            );
        }
        Ok(())
    }

    fn build_graph(&self, ctx: &mut BuildContext) -> RigResult<()> {
        let Some(root) = ctx.root_transform() else {
            warn!("Control {} has no root transform to draw on", ctx.namespace());
            return Ok(());
        };
        let style = Self::style(ctx);
        ctx.create_shape(self.shape, root, &style)?;
        Ok(())
    }
}

/// Control class and shape style read from a hierarchy entry payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSpec {
    pub control: Control,
    pub translate: Option<Vec3>,
    pub rotate: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub color: Option<i64>,
}

impl ControlSpec {
    pub const CONTROL_KEY: &'static str = "control";
    pub const BUILD_TRANSLATE_KEY: &'static str = "build_translate";
    pub const BUILD_ROTATE_KEY: &'static str = "build_rotate";
    pub const BUILD_SCALE_KEY: &'static str = "build_scale";
    pub const SHAPE_COLOR_KEY: &'static str = "shape_color";

    pub fn new(control: Control) -> Self {
        Self {
            control,
            translate: None,
            rotate: None,
            scale: None,
            color: None,
        }
    }

    /// Reads `params`, falling back to `default` for a missing or unknown class.
    pub fn from_params(params: &ParamValue, default: Control) -> Self {
        let control = match params.get(Self::CONTROL_KEY).and_then(ParamValue::as_str) {
            Some(class_name) => Control::from_class_name(class_name).unwrap_or_else(|| {
                warn!("{class_name:?} is not a control class, using {}", default.class_name());
                default
            }),
            None => default,
        };
        let vec3 = |key: &str| params.get(key).and_then(ParamValue::as_vec3);
        Self {
            control,
            translate: vec3(Self::BUILD_TRANSLATE_KEY),
            rotate: vec3(Self::BUILD_ROTATE_KEY),
            scale: vec3(Self::BUILD_SCALE_KEY),
            color: params.get(Self::SHAPE_COLOR_KEY).and_then(ParamValue::as_int),
        }
    }

    pub fn to_params(&self) -> ParamValue {
        let mut params = ParamValue::map().with(Self::CONTROL_KEY, self.control.class_name());
        let vectors = [
            (Self::BUILD_TRANSLATE_KEY, self.translate),
            (Self::BUILD_ROTATE_KEY, self.rotate),
            (Self::BUILD_SCALE_KEY, self.scale),
        ];
        for (key, value) in vectors {
            if let Some(value) = value {
                params.insert(key, value);
            }
        }
        if let Some(color) = self.color {
            params.insert(Self::SHAPE_COLOR_KEY, color);
        }
        params
    }

    #[must_use]
    pub fn translate(mut self, translate: Vec3) -> Self {
        self.translate = Some(translate);
        self
    }

    #[must_use]
    pub fn rotate(mut self, rotate: Vec3) -> Self {
        self.rotate = Some(rotate);
        self
    }

    #[must_use]
    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = Some(Vec3::splat(scale));
        self
    }

    #[must_use]
    pub fn color(mut self, color: i64) -> Self {
        self.color = Some(color);
        self
    }

    fn config(&self, instance_name: &str, color: Option<i64>) -> ComponentConfig {
        let mut config = ComponentConfig::new().instance_name(instance_name);
        let vectors = [
            (Self::BUILD_TRANSLATE_KEY, self.translate),
            (Self::BUILD_ROTATE_KEY, self.rotate),
            (Self::BUILD_SCALE_KEY, self.scale),
        ];
        for (key, value) in vectors {
            if let Some(value) = value {
                config.insert(key, value);
            }
        }
        if let Some(color) = self.color.or(color) {
            config.insert(Self::SHAPE_COLOR_KEY, color);
        }
        config
    }
}

/// A control inserted under some component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlHandle {
    pub scope: ScopeId,
    pub interface: NodeId,
    pub transform: Option<NodeId>,
}

impl ControlHandle {
    pub fn world_matrix(&self) -> Plug {
        Plug::attr(self.interface, Control::WORLD_MATRIX)
    }

    pub fn local_matrix(&self) -> Plug {
        Plug::attr(self.interface, Control::LOCAL_MATRIX)
    }
}

/// Inserts a control whose frame is placed by `offset` and hangs under `parent`.
pub fn insert_control(
    ctx: &mut BuildContext,
    spec: &ControlSpec,
    instance_name: &str,
    offset: impl Into<ConfigValue>,
    parent: Option<NodeId>,
) -> RigResult<ControlHandle> {
    let color = inherited_color(ctx.rig(), ctx.scope());
    let config = spec
        .config(instance_name, color)
        .with(OFFSET_MATRIX_KEY, offset);
    let scope = ctx.insert_child(spec.control, config, parent)?;
    Ok(ControlHandle {
        scope,
        interface: ctx.child_interface(scope)?,
        transform: ctx.rig().root_transform(scope),
    })
}

/// Hands `target` over to a new control: whatever drove `target` (or its current value)
/// places the control, and the control's world matrix drives `target` from then on.
pub fn promote_to_control(
    ctx: &mut BuildContext,
    target: &Plug,
    spec: &ControlSpec,
    instance_name: &str,
    parent: Option<NodeId>,
) -> RigResult<ControlHandle> {
    let offset = match ctx.graph_mut().disconnect(target)? {
        Some(source) => ConfigValue::Connect(source),
        None => ConfigValue::from(ctx.graph().matrix(target).unwrap_or_default()),
    };
    let control = insert_control(ctx, spec, instance_name, offset, parent)?;
    ctx.connect(&control.world_matrix(), target)?;
    Ok(control)
}

/// Colour picked from the enclosing character: its setup colour inside a setup
/// component, otherwise one per side of the enclosing anim component.
pub fn inherited_color(rig: &Rig, scope: ScopeId) -> Option<i64> {
    let character = self_or_parent_of_kind(rig, scope, ComponentKind::Character)?;
    let read = |attr: &str| {
        rig.graph()
            .resolve_scope_path(character, &AttrPath::new(attr))
            .and_then(|plug| rig.graph().value(&plug))
            .and_then(|value| value.as_int())
    };
    if self_or_parent_of_kind(rig, scope, ComponentKind::Setup).is_some() {
        return read(Character::SETUP_COLOR);
    }
    let anim = self_or_parent_of_kind(rig, scope, ComponentKind::Anim)?;
    let side = rig.identity(anim).ok()?.side;
    let primary = read(Character::PRIMARY_SIDE)
        .and_then(|index| usize::try_from(index).ok())
        .and_then(Side::from_index)
        .unwrap_or(Side::Left);
    match side {
        Side::None | Side::Mid => read(Character::NON_MIRROR_COLOR),
        side if side == primary => read(Character::PRIMARY_SIDE_COLOR),
        _ => read(Character::MIRROR_SIDE_COLOR),
    }
}

fn self_or_parent_of_kind(rig: &Rig, scope: ScopeId, kind: ComponentKind) -> Option<ScopeId> {
    let component = rig.component(scope).ok()?;
    if component.strategy.kind() == kind {
        return Some(scope);
    }
    rig.parent_component_of_kind(scope, kind)
}

#[cfg(test)]
mod tests {
    use bevy_math::Mat4;

    use super::*;
    use crate::builtin_registry;
    use rig_graph_core::{
        component::is_same_matrix,
        graph::{NodeType, shape},
    };

    fn built_control(rig: &mut Rig, offset: Mat4) -> ScopeId {
        let config = ComponentConfig::new()
            .instance_name("hand")
            .with("offset_matrix", offset)
            .with("build_scale", Vec3::splat(2.0))
            .with("shape_color", 13i64);
        let scope = rig
            .add_component(Control::new(ShapeKind::Gear), config)
            .unwrap();
        rig.build(scope).unwrap();
        scope
    }

    #[test]
    fn offset_places_the_frame() {
        let mut rig = Rig::with_registry(builtin_registry());
        let offset = Mat4::from_translation(Vec3::new(0.0, 3.0, 1.0));
        let scope = built_control(&mut rig, offset);
        let interface = rig.interface(scope).unwrap();

        let world = rig
            .graph()
            .matrix(&Plug::attr(interface, Control::WORLD_MATRIX))
            .unwrap();
        assert!(is_same_matrix(world, offset));
        let local = rig
            .graph()
            .matrix(&Plug::attr(interface, Control::LOCAL_MATRIX))
            .unwrap();
        assert!(is_same_matrix(local, offset));
    }

    #[test]
    fn shape_follows_install_attributes() {
        let mut rig = Rig::with_registry(builtin_registry());
        let scope = built_control(&mut rig, Mat4::IDENTITY);
        let shapes: Vec<NodeId> = rig
            .graph()
            .members(scope)
            .into_iter()
            .filter(|id| {
                rig.graph().node(*id).map(|node| node.node_type().clone()).ok()
                    == Some(NodeType::Shape(ShapeKind::Gear))
            })
            .collect();
        assert_eq!(shapes.len(), 1);
        let color = rig.graph().value(&Plug::attr(shapes[0], shape::COLOR)).unwrap();
        assert_eq!(color.as_int(), Some(13));
        let scale = rig
            .graph()
            .value(&Plug::attr(shapes[0], shape::LOCAL_SCALE))
            .unwrap();
        assert_eq!(scale.as_vec3(), Some(Vec3::splat(2.0)));

        rig.rebuild(scope).unwrap();
        let count = rig
            .graph()
            .members(scope)
            .into_iter()
            .filter(|id| {
                matches!(
                    rig.graph().node(*id).map(|node| node.node_type().clone()),
                    Ok(NodeType::Shape(_))
                )
            })
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn spec_reads_payload_and_falls_back() {
        let params = ParamValue::map()
            .with(ControlSpec::CONTROL_KEY, Control::BOX)
            .with(ControlSpec::BUILD_SCALE_KEY, 0.5_f32);
        let spec = ControlSpec::from_params(&params, Control::new(ShapeKind::Sphere));
        assert_eq!(spec.control.shape(), ShapeKind::Box);
        assert_eq!(spec.scale, Some(Vec3::splat(0.5)));
        assert_eq!(ControlSpec::from_params(&spec.to_params(), Control::default()), spec);

        let unknown = ParamValue::map().with(ControlSpec::CONTROL_KEY, "FkChain");
        let spec = ControlSpec::from_params(&unknown, Control::new(ShapeKind::Sphere));
        assert_eq!(spec.control.shape(), ShapeKind::Sphere);
    }

    #[test]
    fn class_names_map_back_to_shapes() {
        for kind in ShapeKind::ALL {
            let control = Control::new(kind);
            assert_eq!(Control::from_class_name(control.class_name()), Some(control));
        }
    }
}
