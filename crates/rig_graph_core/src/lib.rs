//! Component framework for procedural rig authoring.
//!
//! A [`component::Rig`] owns a [`graph::SceneGraph`] document and a table of
//! components. Each component materializes a declared attribute schema under its own
//! namespaced scope, wires its internals on build, passes hierarchy chains to its
//! neighbours and can be mirrored into a symmetric twin.

pub mod component;
pub mod config;
pub mod errors;
pub mod graph;
pub mod hierarchy;
pub mod identity;
pub mod mirror;
pub mod params;
pub mod schema;
pub mod shapes;
pub mod symmetry;

#[cfg(test)]
pub(crate) mod test_support;
