//! Declarative descriptors for the nodes and attributes a component is made of.

mod build_data;

pub use build_data::*;

use indexmap::IndexMap;

use crate::graph::{AttrDef, AttrPath, AttrType, AttrValue, NodeId, NodeType, Plug};

/// Far end of a declared connection. Role references point into the same build data
/// dictionary and are resolved once its nodes exist.
#[derive(Debug, Clone, PartialEq)]
pub enum PlugRef {
    Plug(Plug),
    Role { role: String, path: AttrPath },
}

impl PlugRef {
    pub fn role(role: impl Into<String>, path: AttrPath) -> Self {
        Self::Role {
            role: role.into(),
            path,
        }
    }

    pub fn role_attr(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::role(role, AttrPath::new(name))
    }
}

impl From<Plug> for PlugRef {
    fn from(value: Plug) -> Self {
        Self::Plug(value)
    }
}

/// One attribute of a [`NodeData`]. Without a type the attribute is expected to exist
/// already (builtin attributes of the node type, or ones added by an earlier pass).
#[derive(Debug, Clone, PartialEq)]
pub struct AttrData {
    pub name: String,
    pub ty: Option<AttrType>,
    pub parent: Option<String>,
    pub multi: bool,
    pub value: Option<AttrValue>,
    pub locked: bool,
    pub keyable: bool,
    pub alias: Option<String>,
    /// External name on the owning scope.
    pub publish: Option<String>,
    /// Outgoing connections: `self >> target`.
    pub connections: Vec<PlugRef>,
}

impl AttrData {
    pub fn new(name: impl Into<String>, ty: AttrType) -> Self {
        Self {
            ty: Some(ty),
            ..Self::existing(name)
        }
    }

    pub fn existing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            parent: None,
            multi: false,
            value: None,
            locked: false,
            keyable: false,
            alias: None,
            publish: None,
            connections: Vec::new(),
        }
    }

    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<AttrValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    #[must_use]
    pub fn keyable(mut self) -> Self {
        self.keyable = true;
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Publishes under the attribute's own name.
    #[must_use]
    pub fn published(mut self) -> Self {
        self.publish = Some(self.name.clone());
        self
    }

    #[must_use]
    pub fn publish_as(mut self, name: impl Into<String>) -> Self {
        self.publish = Some(name.into());
        self
    }

    #[must_use]
    pub fn connect_to(mut self, target: impl Into<PlugRef>) -> Self {
        self.connections.push(target.into());
        self
    }

    pub fn is_compound(&self) -> bool {
        self.ty == Some(AttrType::Compound)
    }

    /// Definition used when the attribute is added. Locking happens after values and
    /// connections are in place, so the definition is always created unlocked.
    pub fn def(&self) -> Option<AttrDef> {
        let ty = self.ty.clone()?;
        let mut def = AttrDef::new(&self.name, ty);
        def.parent = self.parent.clone();
        def.multi = self.multi;
        Some(def)
    }
}

/// Descriptor of one node of a component, keyed by role in a [`NodeBuildDataDict`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Live node once materialized, or an existing node adopted into the dictionary.
    pub node: Option<NodeId>,
    /// Short name; the component namespace is prepended on creation.
    pub name: String,
    pub node_type: NodeType,
    /// Pointer attribute on the scope that finds this node again.
    pub map_to_scope: Option<String>,
    pub attrs: IndexMap<String, AttrData>,
}

impl NodeData {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            node: None,
            name: name.into(),
            node_type,
            map_to_scope: None,
            attrs: IndexMap::new(),
        }
    }

    /// Wraps an already existing node.
    pub fn bound(node: NodeId, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            node: Some(node),
            ..Self::new(name, node_type)
        }
    }

    #[must_use]
    pub fn map_to_scope(mut self, pointer: impl Into<String>) -> Self {
        self.map_to_scope = Some(pointer.into());
        self
    }

    #[must_use]
    pub fn with_attr(mut self, attr: AttrData) -> Self {
        self.add_attr_data(attr);
        self
    }

    /// Adds or replaces an attribute descriptor, keeping its declared position.
    pub fn add_attr_data(&mut self, attr: AttrData) {
        self.attrs.insert(attr.name.clone(), attr);
    }

    pub fn attr(&self, name: &str) -> Option<&AttrData> {
        self.attrs.get(name)
    }

    pub fn attr_mut(&mut self, name: &str) -> Option<&mut AttrData> {
        self.attrs.get_mut(name)
    }

    /// Number of declared attributes parented to `compound`.
    pub fn child_count(&self, compound: &str) -> usize {
        self.attrs
            .values()
            .filter(|attr| attr.parent.as_deref() == Some(compound))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_data_builds_unlocked_definitions() {
        let attr = AttrData::new("componentClass", AttrType::String)
            .parent("install")
            .value("FkChain")
            .locked()
            .published();
        let def = attr.def().unwrap();
        assert!(!def.locked);
        assert_eq!(def.parent.as_deref(), Some("install"));
        assert_eq!(attr.publish.as_deref(), Some("componentClass"));
        assert!(AttrData::existing("worldMatrix").def().is_none());
    }

    #[test]
    fn child_count_only_counts_direct_children() {
        let data = NodeData::new("interface", NodeType::Network)
            .with_attr(AttrData::new("install", AttrType::Compound))
            .with_attr(AttrData::new("output", AttrType::Compound))
            .with_attr(AttrData::new("built", AttrType::Bool))
            .with_attr(AttrData::new("componentName", AttrType::String).parent("install"));
        assert_eq!(data.child_count("install"), 1);
        assert_eq!(data.child_count("output"), 0);
    }
}
