//! Stock components for `rig_graph`: controls, the character root, setup and motion
//! chains, matrix utilities and the hinge limb that ties them together.

pub mod chain;
pub mod character;
pub mod control;
pub mod fk_chain;
pub mod hinge_limb;
pub mod ik_chain;
pub mod merge_hier;
pub mod setup;
pub mod space_matrix;

#[cfg(test)]
pub(crate) mod test_support;

use rig_graph_core::{
    component::{ComponentLike, ComponentRegistry},
    hierarchy::OffsetMatrix,
    mirror::MirrorHelper,
    shapes::ShapeKind,
};

use crate::{
    character::Character,
    control::Control,
    fk_chain::FkChain,
    hinge_limb::HingeLimb,
    ik_chain::IkChain,
    merge_hier::MergeHier,
    setup::{ChainSetup, HingeSetup},
    space_matrix::SpaceMatrix,
};

/// Adds every stock component class to `registry`.
pub fn register_builtin_components(registry: &mut ComponentRegistry) -> &mut ComponentRegistry {
    registry
        .register::<OffsetMatrix>()
        .register::<MirrorHelper>()
        .register_factory(Control::BOX, || -> Box<dyn ComponentLike> {
            Box::new(Control::new(ShapeKind::Box))
        })
        .register_factory(Control::SPHERE, || -> Box<dyn ComponentLike> {
            Box::new(Control::new(ShapeKind::Sphere))
        })
        .register_factory(Control::GEAR, || -> Box<dyn ComponentLike> {
            Box::new(Control::new(ShapeKind::Gear))
        })
        .register_factory(Control::CIRCLE, || -> Box<dyn ComponentLike> {
            Box::new(Control::new(ShapeKind::Circle))
        })
        .register_factory(Control::PYRAMID, || -> Box<dyn ComponentLike> {
            Box::new(Control::new(ShapeKind::Pyramid))
        })
        .register_factory(Control::LOCATOR, || -> Box<dyn ComponentLike> {
            Box::new(Control::new(ShapeKind::Locator))
        })
        .register::<Character>()
        .register::<ChainSetup>()
        .register::<HingeSetup>()
        .register::<FkChain>()
        .register::<IkChain>()
        .register::<SpaceMatrix>()
        .register::<MergeHier>()
        .register::<HingeLimb>()
}

/// Registry holding the core helpers and every stock component.
pub fn builtin_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    register_builtin_components(&mut registry);
    registry
}
