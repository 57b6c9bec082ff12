use bevy_math::{Mat4, Vec3};

use super::{
    AttrPath, AttrValue, ExprProgram, Node, NodeId, NodeType, Plug, SceneGraph, aim_matrix,
    blend_matrix, choice, compose_matrix, expression, matrix_node, mult_matrix, remap,
    solvers::{self, translation},
    transform,
};

/// Connection chains deeper than this are treated as cycles.
const MAX_EVAL_DEPTH: usize = 256;

impl SceneGraph {
    /// Pulls the current value of a plug: the incoming connection, else the computed
    /// output of a compute node, else the stored value, else the attribute default.
    pub fn value(&self, plug: &Plug) -> Option<AttrValue> {
        self.evaluate(plug, 0)
    }

    pub fn matrix(&self, plug: &Plug) -> Option<Mat4> {
        self.value(plug).and_then(|value| value.as_matrix())
    }

    pub fn string(&self, plug: &Plug) -> Option<String> {
        self.value(plug)
            .and_then(|value| value.as_str().map(str::to_string))
    }

    fn evaluate(&self, plug: &Plug, depth: usize) -> Option<AttrValue> {
        if depth > MAX_EVAL_DEPTH {
            return None;
        }
        let plug = self.canonical(plug).ok()?;
        let node = self.node(plug.node).ok()?;
        let def = node.def(plug.path.leaf_name())?;

        if let Some(source) = self.edges.get(&plug) {
            let value = self.evaluate(source, depth + 1)?;
            return def.ty.coerce(value).ok();
        }
        if let Some(value) = self.compute(plug.node, node, &plug.path, depth) {
            return Some(value);
        }
        node.values
            .get(&plug.path.to_string())
            .cloned()
            .or_else(|| def.default_value())
    }

    fn input(&self, plug: Plug, depth: usize) -> Option<AttrValue> {
        self.evaluate(&plug, depth + 1)
    }

    fn input_matrix(&self, plug: Plug, depth: usize) -> Mat4 {
        self.input(plug, depth)
            .and_then(|value| value.as_matrix())
            .unwrap_or(Mat4::IDENTITY)
    }

    fn input_vec3(&self, plug: Plug, depth: usize) -> Vec3 {
        self.input(plug, depth)
            .and_then(|value| value.as_vec3())
            .unwrap_or(Vec3::ZERO)
    }

    fn compute(&self, id: NodeId, node: &Node, path: &AttrPath, depth: usize) -> Option<AttrValue> {
        let matrix = |name: &str| self.input_matrix(Plug::attr(id, name), depth);
        let vec3 = |name: &str| self.input_vec3(Plug::attr(id, name), depth);

        let value = match (&node.node_type, path.leaf_name()) {
            (NodeType::Transform, transform::WORLD_MATRIX) => {
                let parent = node
                    .dag_parent
                    .map(|parent| self.input_matrix(Plug::attr(parent, transform::WORLD_MATRIX), depth))
                    .unwrap_or(Mat4::IDENTITY);
                AttrValue::Matrix(
                    parent * matrix(transform::OFFSET_PARENT_MATRIX) * matrix(transform::XFORM_MATRIX),
                )
            }
            (NodeType::Transform, transform::DAG_LOCAL_MATRIX) => AttrValue::Matrix(
                matrix(transform::OFFSET_PARENT_MATRIX) * matrix(transform::XFORM_MATRIX),
            ),
            (NodeType::MultMatrix, mult_matrix::MATRIX_SUM) => {
                let sum = self
                    .multi_indices(id, mult_matrix::MATRIX_IN)
                    .into_iter()
                    .fold(Mat4::IDENTITY, |acc, i| {
                        self.input_matrix(Plug::element(id, mult_matrix::MATRIX_IN, i), depth) * acc
                    });
                AttrValue::Matrix(sum)
            }
            (NodeType::InverseMatrix, matrix_node::OUTPUT_MATRIX) => {
                AttrValue::Matrix(matrix(matrix_node::INPUT_MATRIX).inverse())
            }
            (NodeType::BlendMatrix, matrix_node::OUTPUT_MATRIX) => {
                let blended = self
                    .multi_indices(id, blend_matrix::TARGET)
                    .into_iter()
                    .fold(matrix(matrix_node::INPUT_MATRIX), |acc, i| {
                        let target = Plug::element(id, blend_matrix::TARGET, i);
                        let weight = self
                            .input(target.child(blend_matrix::WEIGHT), depth)
                            .and_then(|value| value.as_float())
                            .unwrap_or(1.);
                        let to = self.input_matrix(target.child(blend_matrix::TARGET_MATRIX), depth);
                        solvers::blend_matrices(acc, to, weight)
                    });
                AttrValue::Matrix(blended)
            }
            (NodeType::AimMatrix, matrix_node::OUTPUT_MATRIX) => {
                AttrValue::Matrix(solvers::aim_matrix(
                    matrix(matrix_node::INPUT_MATRIX),
                    translation(matrix(aim_matrix::PRIMARY_TARGET_MATRIX)),
                    vec3(aim_matrix::PRIMARY_INPUT_AXIS),
                    translation(matrix(aim_matrix::SECONDARY_TARGET_MATRIX)),
                    vec3(aim_matrix::SECONDARY_INPUT_AXIS),
                ))
            }
            (NodeType::ComposeMatrix, matrix_node::OUTPUT_MATRIX) => {
                AttrValue::Matrix(solvers::compose_matrix(
                    vec3(compose_matrix::INPUT_TRANSLATE),
                    vec3(compose_matrix::INPUT_ROTATE),
                    vec3(compose_matrix::INPUT_SCALE),
                ))
            }
            (NodeType::Remap, remap::OUT_VALUE) => {
                let input = self
                    .input(Plug::attr(id, remap::INPUT_VALUE), depth)
                    .and_then(|value| value.as_int())
                    .unwrap_or_default();
                let mapped = usize::try_from(input)
                    .ok()
                    .filter(|index| self.multi_indices(id, remap::TABLE).contains(index))
                    .and_then(|index| self.input(Plug::element(id, remap::TABLE, index), depth))
                    .and_then(|value| value.as_int())
                    .unwrap_or(input);
                AttrValue::Int(mapped)
            }
            (NodeType::Choice, choice::OUTPUT) => {
                let selector = self
                    .input(Plug::attr(id, choice::SELECTOR), depth)
                    .and_then(|value| value.as_index())
                    .unwrap_or_default();
                AttrValue::Vector3(self.input_vec3(Plug::element(id, choice::INPUT, selector), depth))
            }
            (NodeType::Expression(ExprProgram::TwoBoneIk), expression::OUT_WORLD) => {
                let index = path.leaf().and_then(|segment| segment.index())?;
                let indices = self.multi_indices(id, expression::INIT_WORLD);
                let position = indices.iter().position(|i| *i == index)?;
                let root = matrix(expression::ROOT_MATRIX);
                let chain: Vec<Mat4> = indices
                    .iter()
                    .map(|i| root * self.input_matrix(Plug::element(id, expression::INIT_WORLD, *i), depth))
                    .collect();
                let pole = self
                    .is_connected(&Plug::attr(id, expression::POLE_MATRIX))
                    .then(|| translation(matrix(expression::POLE_MATRIX)));
                let stretchy = self
                    .input(Plug::attr(id, expression::STRETCHY), depth)
                    .and_then(|value| value.as_bool())
                    .unwrap_or_default();
                let goal = translation(matrix(expression::GOAL_MATRIX));
                let solved = solvers::solve_chain(&chain, goal, pole, stretchy);
                AttrValue::Matrix(solved.get(position).copied()?)
            }
            (NodeType::Expression(ExprProgram::PoleVector), matrix_node::OUTPUT_MATRIX) => {
                let distance = self
                    .input(Plug::attr(id, expression::DISTANCE), depth)
                    .and_then(|value| value.as_float())
                    .unwrap_or(1.);
                let pole = solvers::pole_vector(
                    translation(matrix(expression::ROOT_MATRIX)),
                    translation(matrix(expression::MID_MATRIX)),
                    translation(matrix(expression::END_MATRIX)),
                    distance,
                );
                AttrValue::Matrix(Mat4::from_translation(pole))
            }
            _ => return None,
        };
        Some(value)
    }
}
