//! Document form of a [`SceneGraph`]. Node slots are kept (including dead ones) so ids
//! stay stable across a save/load cycle.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Node, NodeId, Plug, SceneGraph};
use crate::errors::{GraphError, GraphResult};

#[derive(Serialize, Deserialize)]
struct SceneGraphSerial {
    nodes: Vec<Option<Node>>,
    /// (target, source), sorted by target
    edges: Vec<(Plug, Plug)>,
    namespaces: BTreeSet<String>,
}

impl SceneGraphSerial {
    fn from_graph(graph: &SceneGraph) -> Self {
        let mut edges: Vec<(Plug, Plug)> = graph
            .edges
            .iter()
            .map(|(target, source)| (target.clone(), source.clone()))
            .collect();
        edges.sort();
        Self {
            nodes: graph.nodes.clone(),
            edges,
            namespaces: graph.namespaces.clone(),
        }
    }

    fn to_graph(self) -> SceneGraph {
        let mut graph = SceneGraph {
            nodes: self.nodes,
            namespaces: self.namespaces,
            ..Default::default()
        };
        for (i, node) in graph.nodes.iter().enumerate() {
            if let Some(node) = node {
                graph.names.insert(node.name.clone(), NodeId(i as u32));
            }
        }
        for (target, source) in self.edges {
            graph
                .edges_out
                .entry(source.clone())
                .or_default()
                .push(target.clone());
            graph.edges.insert(target, source);
        }
        graph
    }
}

impl SceneGraph {
    pub fn to_ron(&self) -> GraphResult<String> {
        ron::ser::to_string_pretty(
            &SceneGraphSerial::from_graph(self),
            ron::ser::PrettyConfig::default(),
        )
        .map_err(|err| GraphError::Serialization(err.to_string()))
    }

    pub fn from_ron(text: &str) -> GraphResult<Self> {
        ron::from_str::<SceneGraphSerial>(text)
            .map(SceneGraphSerial::to_graph)
            .map_err(|err| GraphError::Serialization(err.to_string()))
    }
}
