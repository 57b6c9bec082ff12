use bevy_math::Vec3;
use serde::{Deserialize, Serialize};

use super::attribute::{AttrDef, AttrType};
use crate::shapes::ShapeKind;

/// Programs available to [`NodeType::Expression`] nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExprProgram {
    /// Two or three joint chain solved towards a goal, bent towards a pole.
    TwoBoneIk,
    /// Pole position in front of the middle joint of a three joint chain.
    PoleVector,
}

/// Primitive node types provided by the graph runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Scope owning a set of nodes.
    Container,
    /// Plain data node, used for component interfaces.
    Network,
    Transform,
    MultMatrix,
    InverseMatrix,
    BlendMatrix,
    AimMatrix,
    ComposeMatrix,
    Remap,
    Choice,
    Expression(ExprProgram),
    Shape(ShapeKind),
}

pub mod transform {
    pub const OFFSET_PARENT_MATRIX: &str = "offsetParentMatrix";
    pub const XFORM_MATRIX: &str = "xformMatrix";
    pub const WORLD_MATRIX: &str = "worldMatrix";
    pub const DAG_LOCAL_MATRIX: &str = "dagLocalMatrix";
}

pub mod mult_matrix {
    pub const MATRIX_IN: &str = "matrixIn";
    pub const MATRIX_SUM: &str = "matrixSum";
}

/// Attribute names shared by the single-output matrix nodes.
pub mod matrix_node {
    pub const INPUT_MATRIX: &str = "inputMatrix";
    pub const OUTPUT_MATRIX: &str = "outputMatrix";
}

pub mod blend_matrix {
    pub const TARGET: &str = "target";
    pub const TARGET_MATRIX: &str = "targetMatrix";
    pub const WEIGHT: &str = "weight";
}

pub mod aim_matrix {
    pub const PRIMARY_TARGET_MATRIX: &str = "primaryTargetMatrix";
    pub const PRIMARY_INPUT_AXIS: &str = "primaryInputAxis";
    pub const SECONDARY_TARGET_MATRIX: &str = "secondaryTargetMatrix";
    pub const SECONDARY_INPUT_AXIS: &str = "secondaryInputAxis";
}

pub mod compose_matrix {
    pub const INPUT_TRANSLATE: &str = "inputTranslate";
    pub const INPUT_ROTATE: &str = "inputRotate";
    pub const INPUT_SCALE: &str = "inputScale";
}

pub mod remap {
    pub const INPUT_VALUE: &str = "inputValue";
    pub const TABLE: &str = "table";
    pub const OUT_VALUE: &str = "outValue";
}

pub mod choice {
    pub const SELECTOR: &str = "selector";
    pub const INPUT: &str = "input";
    pub const OUTPUT: &str = "output";
}

pub mod expression {
    pub const ROOT_MATRIX: &str = "rootMatrix";
    pub const MID_MATRIX: &str = "midMatrix";
    pub const END_MATRIX: &str = "endMatrix";
    pub const GOAL_MATRIX: &str = "goalMatrix";
    pub const POLE_MATRIX: &str = "poleMatrix";
    pub const INIT_WORLD: &str = "initWorld";
    pub const STRETCHY: &str = "stretchy";
    pub const DISTANCE: &str = "distance";
    pub const OUT_WORLD: &str = "outWorld";
}

pub mod shape {
    pub const COLOR: &str = "color";
    pub const LOCAL_TRANSLATE: &str = "localTranslate";
    pub const LOCAL_ROTATE: &str = "localRotate";
    pub const LOCAL_SCALE: &str = "localScale";
}

impl NodeType {
    pub fn type_name(&self) -> String {
        match self {
            Self::Container => "container".into(),
            Self::Network => "network".into(),
            Self::Transform => "transform".into(),
            Self::MultMatrix => "multMatrix".into(),
            Self::InverseMatrix => "inverseMatrix".into(),
            Self::BlendMatrix => "blendMatrix".into(),
            Self::AimMatrix => "aimMatrix".into(),
            Self::ComposeMatrix => "composeMatrix".into(),
            Self::Remap => "remap".into(),
            Self::Choice => "choice".into(),
            Self::Expression(program) => format!("expression({program:?})"),
            Self::Shape(kind) => format!("shape({})", kind.name()),
        }
    }

    /// Attributes every node of this type is created with.
    pub fn builtin_attrs(&self) -> Vec<AttrDef> {
        let matrix = |name: &str| AttrDef::new(name, AttrType::Matrix).builtin();
        let vector = |name: &str| AttrDef::new(name, AttrType::Vector3).builtin();

        match self {
            Self::Container | Self::Network => vec![],
            Self::Transform => vec![
                matrix(transform::OFFSET_PARENT_MATRIX),
                matrix(transform::XFORM_MATRIX),
                matrix(transform::WORLD_MATRIX),
                matrix(transform::DAG_LOCAL_MATRIX),
            ],
            Self::MultMatrix => vec![
                matrix(mult_matrix::MATRIX_IN).multi(),
                matrix(mult_matrix::MATRIX_SUM),
            ],
            Self::InverseMatrix => vec![
                matrix(matrix_node::INPUT_MATRIX),
                matrix(matrix_node::OUTPUT_MATRIX),
            ],
            Self::BlendMatrix => vec![
                matrix(matrix_node::INPUT_MATRIX),
                AttrDef::new(blend_matrix::TARGET, AttrType::Compound)
                    .multi()
                    .builtin(),
                matrix(blend_matrix::TARGET_MATRIX).parent(blend_matrix::TARGET),
                AttrDef::new(blend_matrix::WEIGHT, AttrType::Float)
                    .parent(blend_matrix::TARGET)
                    .with_default(1.)
                    .builtin(),
                matrix(matrix_node::OUTPUT_MATRIX),
            ],
            Self::AimMatrix => vec![
                matrix(matrix_node::INPUT_MATRIX),
                matrix(aim_matrix::PRIMARY_TARGET_MATRIX),
                vector(aim_matrix::PRIMARY_INPUT_AXIS).with_default(Vec3::X),
                matrix(aim_matrix::SECONDARY_TARGET_MATRIX),
                vector(aim_matrix::SECONDARY_INPUT_AXIS).with_default(Vec3::Y),
                matrix(matrix_node::OUTPUT_MATRIX),
            ],
            Self::ComposeMatrix => vec![
                vector(compose_matrix::INPUT_TRANSLATE),
                vector(compose_matrix::INPUT_ROTATE),
                vector(compose_matrix::INPUT_SCALE).with_default(Vec3::ONE),
                matrix(matrix_node::OUTPUT_MATRIX),
            ],
            Self::Remap => vec![
                AttrDef::new(remap::INPUT_VALUE, AttrType::Int).builtin(),
                AttrDef::new(remap::TABLE, AttrType::Int).multi().builtin(),
                AttrDef::new(remap::OUT_VALUE, AttrType::Int).builtin(),
            ],
            Self::Choice => vec![
                AttrDef::new(choice::SELECTOR, AttrType::Int).builtin(),
                vector(choice::INPUT).multi(),
                vector(choice::OUTPUT),
            ],
            Self::Expression(ExprProgram::TwoBoneIk) => vec![
                matrix(expression::ROOT_MATRIX),
                matrix(expression::GOAL_MATRIX),
                matrix(expression::POLE_MATRIX),
                matrix(expression::INIT_WORLD).multi(),
                AttrDef::new(expression::STRETCHY, AttrType::Bool).builtin(),
                matrix(expression::OUT_WORLD).multi(),
            ],
            Self::Expression(ExprProgram::PoleVector) => vec![
                matrix(expression::ROOT_MATRIX),
                matrix(expression::MID_MATRIX),
                matrix(expression::END_MATRIX),
                AttrDef::new(expression::DISTANCE, AttrType::Float)
                    .with_default(1.)
                    .builtin(),
                matrix(matrix_node::OUTPUT_MATRIX),
            ],
            Self::Shape(_) => vec![
                AttrDef::new(shape::COLOR, AttrType::Int).builtin(),
                vector(shape::LOCAL_TRANSLATE),
                vector(shape::LOCAL_ROTATE),
                vector(shape::LOCAL_SCALE).with_default(Vec3::ONE),
            ],
        }
    }
}
