//! # Rig Graph
//!
//! Procedural rig authoring on top of a namespaced scene graph. A rig is a tree of
//! components: each one declares an attribute interface, materializes it under its own
//! scope and wires a computation subgraph when built. Components pass *hierarchy
//! chains* (named frames with init, world and local matrices) from stage to stage, can
//! be rebuilt without breaking what is connected to them from outside, and can be
//! mirrored into a symmetric twin.
//!
//! ```ignore
//! use rig_graph::prelude::*;
//!
//! let mut rig = Rig::with_registry(builtin_registry());
//! let config = ComponentConfig::new()
//!     .instance_name("leg")
//!     .side(Side::Left)
//!     .hier(0, HierBuildData::posed("hip", hip))
//!     .hier(1, HierBuildData::posed("knee", knee))
//!     .hier(2, HierBuildData::posed("ankle", ankle));
//! let leg = rig.add_component(HingeLimb, config)?;
//! rig.build(leg)?;
//! let twin = rig.mirror_component(leg, MirrorOptions::new(SymmetryMode::MirrorX))?;
//! ```
//!
//! The crate is split in two: [`rig_graph_core`] holds the graph substrate, the
//! lifecycle engine and the mirror algorithm, [`rig_graph_builtin_components`] the
//! stock components of a limb pipeline.

pub use rig_graph_builtin_components as builtin;
pub use rig_graph_core as core;

pub mod prelude {
    pub use rig_graph_builtin_components::{
        builtin_registry,
        character::Character,
        control::{Control, ControlSpec},
        fk_chain::FkChain,
        hinge_limb::HingeLimb,
        ik_chain::IkChain,
        merge_hier::MergeHier,
        register_builtin_components,
        setup::{ChainSetup, HingeSetup},
        space_matrix::SpaceMatrix,
    };
    pub use rig_graph_core::{
        component::{
            BuildContext, ComponentKind, ComponentLike, ComponentRegistry, Rig, SchemaContext,
        },
        config::{ComponentConfig, ConfigValue},
        errors::{GraphError, GraphResult, RigError, RigResult},
        graph::{AttrPath, AttrType, AttrValue, NodeId, Plug, SceneGraph, ScopeId},
        hierarchy::{HierBuildData, OffsetMatrix},
        mirror::{MirrorHelper, MirrorOptions},
        params::ParamValue,
        schema::AttrData,
        shapes::ShapeKind,
        symmetry::{Axis, Side, SidePairing, SymmetryMode},
    };
}

#[cfg(test)]
mod scenarios;
