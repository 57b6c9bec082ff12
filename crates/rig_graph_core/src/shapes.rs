//! Drawable control proxies. Geometry is left to the host; the framework only asks for
//! a proxy of a given kind and for a visual style to be applied to it.

use std::fmt::Debug;

use bevy_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    errors::GraphResult,
    graph::{NodeId, NodeType, Plug, SceneGraph, shape},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    Box,
    Sphere,
    Gear,
    Circle,
    Pyramid,
    Locator,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Box,
        ShapeKind::Sphere,
        ShapeKind::Gear,
        ShapeKind::Circle,
        ShapeKind::Pyramid,
        ShapeKind::Locator,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Sphere => "sphere",
            Self::Gear => "gear",
            Self::Circle => "circle",
            Self::Pyramid => "pyramid",
            Self::Locator => "locator",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Visual style of a proxy, relative to the transform it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub color: i64,
    pub translate: Vec3,
    pub rotate: Vec3,
    pub scale: Vec3,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            color: 0,
            translate: Vec3::ZERO,
            rotate: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Capability used by control components to get something drawable.
pub trait ShapeLibrary: Send + Sync + Debug {
    /// Creates a proxy of `kind` under `transform` and returns it.
    fn create_proxy(
        &self,
        graph: &mut SceneGraph,
        kind: ShapeKind,
        transform: NodeId,
    ) -> GraphResult<NodeId>;

    fn apply_style(&self, graph: &mut SceneGraph, proxy: NodeId, style: &ShapeStyle)
    -> GraphResult<()>;
}

/// Library producing bare `Shape` nodes that only record the requested kind and style.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyShapeLibrary;

impl ShapeLibrary for ProxyShapeLibrary {
    fn create_proxy(
        &self,
        graph: &mut SceneGraph,
        kind: ShapeKind,
        transform: NodeId,
    ) -> GraphResult<NodeId> {
        let name = format!("{}Shape", graph.name(transform)?);
        let proxy = graph.create_node(NodeType::Shape(kind), &name);
        if let Some(scope) = graph.scope_of(transform) {
            graph.add_members(scope, &[proxy])?;
        }
        Ok(proxy)
    }

    fn apply_style(
        &self,
        graph: &mut SceneGraph,
        proxy: NodeId,
        style: &ShapeStyle,
    ) -> GraphResult<()> {
        graph.set_value(&Plug::attr(proxy, shape::COLOR), style.color)?;
        graph.set_value(&Plug::attr(proxy, shape::LOCAL_TRANSLATE), style.translate)?;
        graph.set_value(&Plug::attr(proxy, shape::LOCAL_ROTATE), style.rotate)?;
        graph.set_value(&Plug::attr(proxy, shape::LOCAL_SCALE), style.scale)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AttrValue;

    #[test]
    fn shape_names_round_trip() {
        for kind in ShapeKind::ALL {
            assert_eq!(ShapeKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ShapeKind::from_name("teapot"), None);
    }

    #[test]
    fn proxy_library_records_style() {
        let mut graph = SceneGraph::new();
        let xform = graph.create_node(NodeType::Transform, "arm:ctrl");
        let library = ProxyShapeLibrary;
        let proxy = library
            .create_proxy(&mut graph, ShapeKind::Gear, xform)
            .unwrap();
        let style = ShapeStyle {
            color: 13,
            scale: Vec3::splat(2.),
            ..Default::default()
        };
        library.apply_style(&mut graph, proxy, &style).unwrap();

        assert_eq!(graph.name(proxy).unwrap(), "arm:ctrlShape");
        assert_eq!(
            graph.node(proxy).unwrap().node_type(),
            &NodeType::Shape(ShapeKind::Gear)
        );
        assert_eq!(
            graph.value(&Plug::attr(proxy, shape::COLOR)),
            Some(AttrValue::Int(13))
        );
    }
}
