mod graph_error;
mod rig_error;

pub use graph_error::*;
pub use rig_error::*;
