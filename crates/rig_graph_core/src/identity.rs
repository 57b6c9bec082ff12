//! Component identity and the namespace naming rules derived from it.

use std::sync::LazyLock;

use regex::Regex;

use crate::symmetry::Side;

static TRAILING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+$").expect("valid trailing digits pattern"));

pub const NAMESPACE_SEPARATOR: char = ':';

/// `HingeLimb` -> `hinge_limb`, `FKChain` -> `fk_chain`.
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(prev) if prev.is_lowercase() || prev.is_ascii_digit() => true,
                Some(prev) if prev.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(*c);
        }
    }
    out
}

/// `input_world_matrix` -> `inputWorldMatrix`.
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, part) in name.split('_').filter(|p| !p.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(part);
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

pub fn strip_trailing_numbers(name: &str) -> &str {
    match TRAILING_DIGITS.find(name) {
        Some(found) => &name[..found.start()],
        None => name,
    }
}

pub fn trailing_number(name: &str) -> Option<usize> {
    TRAILING_DIGITS
        .find(name)
        .and_then(|found| found.as_str().parse().ok())
}

/// Joins namespace fragments with `:`, ignoring empty parts and stray outer separators.
pub fn combine_namespace<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(|part| part.trim_matches(NAMESPACE_SEPARATOR))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(":")
}

/// Splits `a:b:c` into (`a:b`, `c`).
pub fn split_namespace(name: &str) -> (&str, &str) {
    match name.rfind(NAMESPACE_SEPARATOR) {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("", name),
    }
}

/// Namespace part of a qualified node name.
pub fn namespace_of(name: &str) -> &str {
    split_namespace(name).0
}

pub fn short_name(name: &str) -> &str {
    split_namespace(name).1
}

/// True if `namespace` is `root` or nested anywhere below it.
pub fn is_within_namespace(namespace: &str, root: &str) -> bool {
    namespace == root
        || (namespace.len() > root.len()
            && namespace.starts_with(root)
            && namespace[root.len()..].starts_with(NAMESPACE_SEPARATOR))
}

/// Rewrites every namespace segment of `name` whose unindexed form equals `from`.
pub fn substitute_namespace(name: &str, from: &str, to: &str) -> String {
    let (namespace, short) = split_namespace(name);
    let segments: Vec<String> = namespace
        .split(NAMESPACE_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if segment == from {
                to.to_string()
            } else if strip_trailing_numbers(segment) == from {
                format!("{to}{}", &segment[from.len()..])
            } else {
                segment.to_string()
            }
        })
        .collect();
    combine_namespace(segments.iter().map(String::as_str).chain([short]))
}

/// The identity-relevant inputs of a component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub class_name: String,
    pub instance_name: Option<String>,
    pub side: Side,
}

impl Identity {
    pub fn new(class_name: impl Into<String>, instance_name: Option<String>, side: Side) -> Self {
        Self {
            class_name: class_name.into(),
            instance_name: instance_name.filter(|name| !name.is_empty()),
            side,
        }
    }

    pub fn instance_namespace(&self) -> String {
        Self::derive(&self.class_name, self.instance_name.as_deref(), self.side)
    }

    pub fn mirror_instance_namespace(&self) -> String {
        Self::derive(
            &self.class_name,
            self.instance_name.as_deref(),
            self.side.opposite(),
        )
    }

    fn derive(class_name: &str, instance_name: Option<&str>, side: Side) -> String {
        let namespace = camel_to_snake(class_name);
        let mut prefix = Vec::new();
        if side != Side::None {
            prefix.push(side.name());
        }
        if let Some(instance_name) = instance_name {
            prefix.push(instance_name);
        }
        if prefix.is_empty() {
            namespace
        } else {
            format!("{}__{namespace}", prefix.join("_"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_handles_acronyms() {
        assert_eq!(camel_to_snake("HingeLimb"), "hinge_limb");
        assert_eq!(camel_to_snake("FKChain"), "fk_chain");
        assert_eq!(camel_to_snake("IkChain"), "ik_chain");
        assert_eq!(camel_to_snake("MirrorHelper"), "mirror_helper");
        assert_eq!(camel_to_snake("Leg"), "leg");
    }

    #[test]
    fn camel_case_round_trip() {
        assert_eq!(snake_to_camel("input_world_matrix"), "inputWorldMatrix");
        assert_eq!(snake_to_camel("hier"), "hier");
        assert_eq!(camel_to_snake(&snake_to_camel("hier_parent_init")), "hier_parent_init");
    }

    #[test]
    fn trailing_numbers() {
        assert_eq!(strip_trailing_numbers("leg12"), "leg");
        assert_eq!(trailing_number("leg12"), Some(12));
        assert_eq!(trailing_number("leg"), None);
        assert_eq!(strip_trailing_numbers("leg"), "leg");
    }

    #[test]
    fn namespace_helpers() {
        assert_eq!(combine_namespace([":a:", "", "b", "c:"]), "a:b:c");
        assert_eq!(split_namespace("a:b:node"), ("a:b", "node"));
        assert_eq!(split_namespace("node"), ("", "node"));
        assert!(is_within_namespace("a:b", "a"));
        assert!(!is_within_namespace("ab", "a"));
        assert!(is_within_namespace("a", "a"));
    }

    #[test]
    fn instance_namespace_includes_side_and_instance() {
        let identity = Identity::new("Leg", Some("leg".into()), Side::Left);
        assert_eq!(identity.instance_namespace(), "left_leg__leg");
        assert_eq!(identity.mirror_instance_namespace(), "right_leg__leg");

        let bare = Identity::new("FkChain", None, Side::None);
        assert_eq!(bare.instance_namespace(), "fk_chain");
        assert_eq!(bare.mirror_instance_namespace(), "fk_chain");
    }

    #[test]
    fn instance_namespace_is_idempotent() {
        let identity = Identity::new("HingeLimb", Some("arm".into()), Side::Right);
        assert_eq!(identity.instance_namespace(), identity.instance_namespace());
    }

    #[test]
    fn substitutes_namespace_segments() {
        assert_eq!(
            substitute_namespace("rig:left_arm__arm:fk:ctrl", "left_arm__arm", "right_arm__arm"),
            "rig:right_arm__arm:fk:ctrl"
        );
        assert_eq!(
            substitute_namespace("left_arm__arm2:interface", "left_arm__arm", "right_arm__arm"),
            "right_arm__arm2:interface"
        );
        assert_eq!(
            substitute_namespace("left_arm__arm_extra:interface", "left_arm__arm", "x"),
            "left_arm__arm_extra:interface"
        );
    }
}
