use bevy_log::debug;

use super::{NodeId, SceneGraph};
use crate::{
    errors::{GraphError, GraphResult},
    identity::{
        NAMESPACE_SEPARATOR, combine_namespace, is_within_namespace, namespace_of, short_name,
        split_namespace,
    },
};

impl SceneGraph {
    pub fn namespace_exists(&self, namespace: &str) -> bool {
        namespace.is_empty() || self.namespaces.contains(namespace)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(String::as_str)
    }

    pub fn add_namespace(&mut self, namespace: &str) -> GraphResult<()> {
        if self.namespace_exists(namespace) {
            return Err(GraphError::NamespaceExists(namespace.into()));
        }
        self.ensure_namespace(namespace);
        Ok(())
    }

    /// Registers `namespace` and all of its parents.
    pub(crate) fn ensure_namespace(&mut self, namespace: &str) {
        let mut current = String::new();
        for part in namespace
            .split(NAMESPACE_SEPARATOR)
            .filter(|part| !part.is_empty())
        {
            current = combine_namespace([current.as_str(), part]);
            self.namespaces.insert(current.clone());
        }
    }

    /// Direct child namespaces of `parent` (the root when empty), fully qualified.
    pub fn child_namespaces(&self, parent: &str) -> Vec<String> {
        self.namespaces
            .iter()
            .filter(|namespace| namespace_of(namespace) == parent && namespace.as_str() != parent)
            .cloned()
            .collect()
    }

    /// Nodes whose name sits directly in `namespace`.
    pub fn namespace_members(&self, namespace: &str) -> Vec<NodeId> {
        self.node_ids()
            .filter(|id| {
                self.name(*id)
                    .is_ok_and(|name| namespace_of(name) == namespace)
            })
            .collect()
    }

    /// Renames a namespace in place, moving its nodes and child namespaces along.
    pub fn rename_namespace(&mut self, old: &str, new: &str) -> GraphResult<()> {
        if old.is_empty() || !self.namespace_exists(old) {
            return Err(GraphError::MissingNamespace(old.into()));
        }
        if self.namespace_exists(new) {
            return Err(GraphError::NamespaceExists(new.into()));
        }

        let moved: Vec<String> = self
            .namespaces
            .iter()
            .filter(|namespace| is_within_namespace(namespace, old))
            .cloned()
            .collect();
        for namespace in &moved {
            self.namespaces.remove(namespace);
            self.ensure_namespace(&format!("{new}{}", &namespace[old.len()..]));
        }

        let renamed: Vec<(NodeId, String)> = self
            .node_ids()
            .filter_map(|id| {
                let name = self.name(id).ok()?;
                let (namespace, short) = split_namespace(name);
                if !is_within_namespace(namespace, old) {
                    return None;
                }
                let namespace = format!("{new}{}", &namespace[old.len()..]);
                Some((id, combine_namespace([namespace.as_str(), short])))
            })
            .collect();
        for (id, name) in renamed {
            let old_name = std::mem::replace(&mut self.node_mut(id)?.name, name.clone());
            self.names.remove(&old_name);
            self.names.insert(name, id);
        }
        debug!("Renamed namespace {old} to {new}");
        Ok(())
    }

    /// Drops `namespace` and everything nested in it. Nodes still named inside it keep
    /// their names.
    pub fn remove_namespace(&mut self, namespace: &str) -> GraphResult<()> {
        if namespace.is_empty() || !self.namespace_exists(namespace) {
            return Err(GraphError::MissingNamespace(namespace.into()));
        }
        self.namespaces
            .retain(|existing| !is_within_namespace(existing, namespace));
        Ok(())
    }

    /// Highest trailing index among children of `parent` named `derived` or `derived<N>`.
    /// The bare name counts as zero.
    pub fn namespace_index_scan(&self, parent: &str, derived: &str) -> Option<usize> {
        self.child_namespaces(parent)
            .iter()
            .filter_map(|namespace| {
                let suffix = short_name(namespace).strip_prefix(derived)?;
                if suffix.is_empty() {
                    Some(0)
                } else if suffix.chars().all(|c| c.is_ascii_digit()) {
                    suffix.parse().ok()
                } else {
                    None
                }
            })
            .max()
    }

    /// Picks a free namespace for `derived` under `parent`.
    ///
    /// The first collision renames the bare sibling to `derived1` and hands out
    /// `derived2`, so a bare namespace never coexists with its first index.
    pub fn reserve_namespace(&mut self, parent: &str, derived: &str) -> GraphResult<String> {
        let bare = combine_namespace([parent, derived]);
        match self.namespace_index_scan(parent, derived) {
            None => Ok(bare),
            Some(0) => {
                let promoted = combine_namespace([parent, &format!("{derived}1")]);
                self.rename_namespace(&bare, &promoted)?;
                Ok(combine_namespace([parent, &format!("{derived}2")]))
            }
            Some(index) => Ok(combine_namespace([
                parent,
                &format!("{derived}{}", index + 1),
            ])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::NodeType;
    use super::*;

    #[test]
    fn rename_moves_nodes_and_children() {
        let mut graph = SceneGraph::new();
        let a = graph.create_node(NodeType::Network, "rig:leg:interface");
        let b = graph.create_node(NodeType::Network, "rig:leg:fk:ctrl");
        let c = graph.create_node(NodeType::Network, "rig:legacy:interface");

        graph.rename_namespace("rig:leg", "rig:leg1").unwrap();
        assert_eq!(graph.name(a).unwrap(), "rig:leg1:interface");
        assert_eq!(graph.name(b).unwrap(), "rig:leg1:fk:ctrl");
        assert_eq!(graph.name(c).unwrap(), "rig:legacy:interface");
        assert!(graph.namespace_exists("rig:leg1:fk"));
        assert!(!graph.namespace_exists("rig:leg"));
        assert_eq!(graph.find("rig:leg1:interface"), Some(a));
    }

    #[test]
    fn reservation_promotes_the_bare_sibling() {
        let mut graph = SceneGraph::new();
        let first = graph.reserve_namespace("rig", "leg").unwrap();
        assert_eq!(first, "rig:leg");
        let node = graph.create_node(NodeType::Network, &format!("{first}:interface"));

        let second = graph.reserve_namespace("rig", "leg").unwrap();
        assert_eq!(second, "rig:leg2");
        assert_eq!(graph.name(node).unwrap(), "rig:leg1:interface");
        graph.add_namespace(&second).unwrap();

        let third = graph.reserve_namespace("rig", "leg").unwrap();
        assert_eq!(third, "rig:leg3");
        assert!(!graph.namespace_exists("rig:leg"));
    }

    #[test]
    fn scan_ignores_unrelated_siblings() {
        let mut graph = SceneGraph::new();
        graph.add_namespace("rig:leg_extra").unwrap();
        graph.add_namespace("other:leg").unwrap();
        assert_eq!(graph.namespace_index_scan("rig", "leg"), None);
        assert_eq!(graph.reserve_namespace("rig", "leg").unwrap(), "rig:leg");
    }
}
