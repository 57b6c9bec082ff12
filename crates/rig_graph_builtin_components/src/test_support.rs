//! Poses shared by the component tests.

use bevy_math::{Mat4, Vec3};
use rig_graph_core::{config::ComponentConfig, hierarchy::HierBuildData, symmetry::Side};

pub fn leg_pose() -> [(&'static str, Mat4); 3] {
    [
        ("hip", Mat4::from_translation(Vec3::new(1.0, 10.0, 0.0))),
        ("knee", Mat4::from_translation(Vec3::new(1.2, 5.0, 0.5))),
        ("ankle", Mat4::from_translation(Vec3::new(1.2, 1.0, 0.0))),
    ]
}

/// Three posed entries following [`leg_pose`].
pub fn posed_config(instance_name: &str, side: Side) -> ComponentConfig {
    leg_pose().into_iter().enumerate().fold(
        ComponentConfig::new().instance_name(instance_name).side(side),
        |config, (index, (name, world))| config.hier(index, HierBuildData::posed(name, world)),
    )
}
