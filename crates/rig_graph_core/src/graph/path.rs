use std::{fmt::Display, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::NodeId;
use crate::{
    errors::{GraphError, GraphResult},
    identity::snake_to_camel,
};

static SEGMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*?)(?:\[(\d+)\])?$").expect("valid segment pattern")
});

static INDEXED_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)(\d+)(.*)$").expect("valid key pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathSegment {
    Direct(String),
    Indexed(String, usize),
}

impl PathSegment {
    pub fn name(&self) -> &str {
        match self {
            Self::Direct(name) | Self::Indexed(name, _) => name,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Direct(_) => None,
            Self::Indexed(_, index) => Some(*index),
        }
    }

    fn with_name(&self, name: impl Into<String>) -> Self {
        match self {
            Self::Direct(_) => Self::Direct(name.into()),
            Self::Indexed(_, index) => Self::Indexed(name.into(), *index),
        }
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct(name) => write!(f, "{name}"),
            Self::Indexed(name, index) => write!(f, "{name}[{index}]"),
        }
    }
}

/// Typed address of an attribute on a node. Nesting is expressed by the
/// sequence of segments, from the outermost compound to the addressed leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttrPath {
    segments: Vec<PathSegment>,
}

impl AttrPath {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Direct(name.into())],
        }
    }

    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Self {
            segments: vec![PathSegment::Indexed(name.into(), index)],
        }
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Nested child attribute.
    pub fn child(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Direct(name.into()));
        self
    }

    /// Nested element of a child multi attribute.
    pub fn child_at(mut self, name: impl Into<String>, index: usize) -> Self {
        self.segments.push(PathSegment::Indexed(name.into(), index));
        self
    }

    pub fn join(mut self, other: &AttrPath) -> Self {
        self.segments.extend(other.segments.iter().cloned());
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn root(&self) -> Option<&PathSegment> {
        self.segments.first()
    }

    pub fn leaf(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn leaf_name(&self) -> &str {
        self.leaf().map(PathSegment::name).unwrap_or_default()
    }

    /// Index carried by the outermost indexed segment, if any.
    pub fn first_index(&self) -> Option<usize> {
        self.segments.iter().find_map(PathSegment::index)
    }

    /// Replaces the name of the first segment, keeping its index.
    pub fn with_root_name(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        if let Some(first) = segments.first_mut() {
            *first = first.with_name(name);
        }
        Self { segments }
    }

    pub(crate) fn split_first(&self) -> Option<(&PathSegment, AttrPath)> {
        self.segments.split_first().map(|(first, rest)| {
            (
                first,
                AttrPath {
                    segments: rest.to_vec(),
                },
            )
        })
    }

    /// Parses the canonical textual form, e.g. `hier[0].hierName`.
    pub fn parse(input: &str) -> GraphResult<Self> {
        if input.is_empty() {
            return Err(GraphError::InvalidPath(input.into(), "empty path".into()));
        }
        let mut segments = Vec::new();
        for token in input.split('.') {
            let captures = SEGMENT_REGEX.captures(token).ok_or_else(|| {
                GraphError::InvalidPath(input.into(), format!("bad segment {token:?}"))
            })?;
            let name = captures[1].to_string();
            match captures.get(2) {
                Some(index) => {
                    let index = index.as_str().parse::<usize>().map_err(|err| {
                        GraphError::InvalidPath(input.into(), err.to_string())
                    })?;
                    segments.push(PathSegment::Indexed(name, index));
                }
                None => segments.push(PathSegment::Direct(name)),
            }
        }
        Ok(Self { segments })
    }

    /// Translates a configuration key into an attribute path.
    ///
    /// Keys are snake_case. A double underscore separates nesting levels and a run of
    /// digits after a name selects an array element, so `hier0__input_world_matrix`
    /// becomes `hier[0].inputWorldMatrix`. Keys already in dotted form are parsed with
    /// each name converted to camel case.
    pub fn from_config_key(key: &str) -> GraphResult<Self> {
        if key.contains('.') || key.contains('[') {
            let parsed = Self::parse(key)?;
            return Ok(Self {
                segments: parsed
                    .segments
                    .iter()
                    .map(|segment| segment.with_name(snake_to_camel(segment.name())))
                    .collect(),
            });
        }

        let mut segments = Vec::new();
        for part in key.split("__").filter(|part| !part.is_empty()) {
            let mut rest = snake_to_camel(part);
            loop {
                let Some(captures) = INDEXED_KEY_REGEX.captures(&rest) else {
                    segments.push(PathSegment::Direct(rest));
                    break;
                };
                let name = captures[1].to_string();
                let index = captures[2].parse::<usize>().map_err(|err| {
                    GraphError::InvalidPath(key.into(), err.to_string())
                })?;
                let tail = captures[3].to_string();
                segments.push(PathSegment::Indexed(name, index));
                if tail.is_empty() {
                    break;
                }
                rest = lower_first(&tail);
            }
        }

        if segments.is_empty() {
            return Err(GraphError::InvalidPath(key.into(), "empty key".into()));
        }
        Ok(Self { segments })
    }
}

fn lower_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Display for AttrPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for AttrPath {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// An attribute on a specific node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Plug {
    pub node: NodeId,
    pub path: AttrPath,
}

impl Plug {
    pub fn new(node: NodeId, path: AttrPath) -> Self {
        Self { node, path }
    }

    pub fn attr(node: NodeId, name: impl Into<String>) -> Self {
        Self::new(node, AttrPath::new(name))
    }

    pub fn element(node: NodeId, name: impl Into<String>, index: usize) -> Self {
        Self::new(node, AttrPath::indexed(name, index))
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        Self::new(self.node, self.path.clone().child(name))
    }
}

impl Display for Plug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}.{}", self.node, self.path)
    }
}
