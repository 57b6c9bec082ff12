//! Matrix math behind the compute node types.

use bevy_math::{Mat4, Quat, Vec3};

const EPSILON: f32 = 1e-6;
/// Keeps a non-stretchy chain from ever locking fully straight.
const MAX_LEN_OFFSET: f32 = 0.001;

#[derive(Debug, Clone, Copy)]
struct Frame {
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
}

impl Frame {
    fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            scale,
            rotation,
            translation,
        }
    }

    fn to_matrix(self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

pub fn translation(matrix: Mat4) -> Vec3 {
    matrix.w_axis.truncate()
}

/// Interpolates scale, rotation and translation separately. Weights at or past the ends
/// return the inputs unchanged, so reflected matrices pass through exactly.
pub fn blend_matrices(from: Mat4, to: Mat4, weight: f32) -> Mat4 {
    if weight <= 0. {
        return from;
    }
    if weight >= 1. {
        return to;
    }
    let a = Frame::from_matrix(from);
    let b = Frame::from_matrix(to);
    Frame {
        scale: a.scale.lerp(b.scale, weight),
        rotation: a.rotation.slerp(b.rotation, weight),
        translation: a.translation.lerp(b.translation, weight),
    }
    .to_matrix()
}

/// Translate, then rotate (XYZ order, radians), then scale.
pub fn compose_matrix(translate: Vec3, rotate: Vec3, scale: Vec3) -> Mat4 {
    let rotation = Quat::from_rotation_z(rotate.z)
        * Quat::from_rotation_y(rotate.y)
        * Quat::from_rotation_x(rotate.x);
    Mat4::from_scale_rotation_translation(scale, rotation, translate)
}

/// Rotates `input` so `primary_axis` points at `primary_target`, twisting `secondary_axis`
/// towards `secondary_target`. Position and scale are kept.
pub fn aim_matrix(
    input: Mat4,
    primary_target: Vec3,
    primary_axis: Vec3,
    secondary_target: Vec3,
    secondary_axis: Vec3,
) -> Mat4 {
    let frame = Frame::from_matrix(input);
    let Some(primary) = (primary_target - frame.translation).try_normalize() else {
        return input;
    };
    let primary_axis = primary_axis.try_normalize().unwrap_or(Vec3::X);
    let swing = Quat::from_rotation_arc(primary_axis, primary);

    let up = (secondary_target - frame.translation)
        .reject_from(primary)
        .try_normalize();
    let secondary_axis = secondary_axis.reject_from(primary_axis).try_normalize();
    let rotation = match (up, secondary_axis) {
        (Some(up), Some(secondary_axis)) => {
            let current = swing * secondary_axis;
            let angle = current.cross(up).dot(primary).atan2(current.dot(up));
            Quat::from_axis_angle(primary, angle) * swing
        }
        _ => swing,
    };

    Frame {
        rotation,
        ..frame
    }
    .to_matrix()
}

/// Point in front of the middle joint, in the plane of the chain.
pub fn pole_vector(root: Vec3, mid: Vec3, end: Vec3, distance: f32) -> Vec3 {
    let Some(axis) = (end - root).try_normalize() else {
        return mid;
    };
    let direction = (mid - root)
        .reject_from(axis)
        .try_normalize()
        .unwrap_or_else(|| axis.any_orthonormal_vector());
    mid + direction * distance
}

/// Solves a chain of two or three world matrices towards `goal`. Other lengths are
/// returned untouched.
pub fn solve_chain(chain: &[Mat4], goal: Vec3, pole: Option<Vec3>, stretchy: bool) -> Vec<Mat4> {
    match chain {
        [root, end] => solve_pair(*root, *end, goal, stretchy).to_vec(),
        [root, mid, end] => solve_two_bone(*root, *mid, *end, goal, pole, stretchy).to_vec(),
        _ => chain.to_vec(),
    }
}

fn solve_pair(root: Mat4, end: Mat4, goal: Vec3, stretchy: bool) -> [Mat4; 2] {
    let root_frame = Frame::from_matrix(root);
    let end_frame = Frame::from_matrix(end);
    let (Some(dir_in), Some(dir_out)) = (
        (end_frame.translation - root_frame.translation).try_normalize(),
        (goal - root_frame.translation).try_normalize(),
    ) else {
        return [root, end];
    };
    let rest_length = root_frame.translation.distance(end_frame.translation);
    let length = if stretchy {
        rest_length.max(root_frame.translation.distance(goal))
    } else {
        rest_length
    };
    let swing = Quat::from_rotation_arc(dir_in, dir_out);
    [
        Frame {
            rotation: swing * root_frame.rotation,
            ..root_frame
        }
        .to_matrix(),
        Frame {
            rotation: swing * end_frame.rotation,
            translation: root_frame.translation + dir_out * length,
            ..end_frame
        }
        .to_matrix(),
    ]
}

fn solve_two_bone(
    root: Mat4,
    mid: Mat4,
    end: Mat4,
    goal: Vec3,
    pole: Option<Vec3>,
    stretchy: bool,
) -> [Mat4; 3] {
    let unchanged = [root, mid, end];
    let root_frame = Frame::from_matrix(root);
    let mid_frame = Frame::from_matrix(mid);
    let end_frame = Frame::from_matrix(end);

    let root_loc = root_frame.translation;
    let mut mid_loc = mid_frame.translation;
    let mut end_loc = end_frame.translation;
    let mut upper_len = root_loc.distance(mid_loc);
    let mut lower_len = mid_loc.distance(end_loc);
    if upper_len <= EPSILON || lower_len <= EPSILON {
        return unchanged;
    }

    let goal_dist = root_loc.distance(goal);
    if stretchy && goal_dist > upper_len + lower_len {
        let factor = goal_dist / (upper_len + lower_len);
        mid_loc = root_loc + (mid_loc - root_loc) * factor;
        end_loc = root_loc + (end_loc - root_loc) * factor;
        upper_len *= factor;
        lower_len *= factor;
    }
    let max_len = if stretchy {
        upper_len + lower_len
    } else {
        upper_len + lower_len - MAX_LEN_OFFSET
    };

    let Some(to_end) = (end_loc - root_loc).try_normalize() else {
        return unchanged;
    };
    let in_pole_vec = (mid_loc - root_loc)
        .reject_from(to_end)
        .try_normalize()
        .unwrap_or_else(|| to_end.any_orthonormal_vector());

    let to_target_offset = (goal - root_loc).clamp_length_max(max_len);
    let to_target_dist = to_target_offset.length();
    let Some(to_target) = to_target_offset.try_normalize() else {
        return unchanged;
    };

    let to_target_swing = Quat::from_rotation_arc(to_end, to_target);
    let out_pole_vec = pole
        .and_then(|pole| (pole - root_loc).reject_from(to_target).try_normalize())
        .unwrap_or(to_target_swing * in_pole_vec);

    // law of cosines
    let cos_angle = ((to_target_dist.powi(2) + upper_len.powi(2) - lower_len.powi(2))
        / (2. * upper_len * to_target_dist))
        .clamp(-1., 1.);
    let angle = cos_angle.acos();
    let pole_dist = upper_len * angle.sin();
    let eff_dist = upper_len * cos_angle;

    let out_end_loc = root_loc + to_target_offset;
    let out_mid_loc = root_loc + eff_dist * to_target + pole_dist * out_pole_vec;

    let root_swing = Quat::from_rotation_arc(
        (mid_loc - root_loc).normalize(),
        (out_mid_loc - root_loc).normalize(),
    );
    let in_end_with_root_swing = root_loc + root_swing * (end_loc - root_loc);
    let mid_swing = Quat::from_rotation_arc(
        (in_end_with_root_swing - out_mid_loc).normalize(),
        (out_end_loc - out_mid_loc).normalize(),
    ) * root_swing;

    [
        Frame {
            rotation: root_swing * root_frame.rotation,
            ..root_frame
        }
        .to_matrix(),
        Frame {
            rotation: mid_swing * mid_frame.rotation,
            translation: out_mid_loc,
            ..mid_frame
        }
        .to_matrix(),
        Frame {
            rotation: mid_swing * end_frame.rotation,
            translation: out_end_loc,
            ..end_frame
        }
        .to_matrix(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg() -> [Mat4; 3] {
        [
            Mat4::from_translation(Vec3::new(0., 5., 0.)),
            Mat4::from_translation(Vec3::new(0., 2.5, 0.3)),
            Mat4::from_translation(Vec3::new(0., 0., 0.)),
        ]
    }

    #[test]
    fn two_bone_reaches_reachable_goal() {
        let goal = Vec3::new(0., 1., 1.);
        let out = solve_chain(&leg(), goal, None, false);
        assert_eq!(out.len(), 3);
        assert!(translation(out[2]).abs_diff_eq(goal, 1e-3));
        assert!(translation(out[0]).abs_diff_eq(Vec3::new(0., 5., 0.), 1e-5));

        let upper = translation(out[0]).distance(translation(out[1]));
        let lower = translation(out[1]).distance(translation(out[2]));
        let chain = leg();
        assert!((upper - translation(chain[0]).distance(translation(chain[1]))).abs() < 1e-3);
        assert!((lower - translation(chain[1]).distance(translation(chain[2]))).abs() < 1e-3);
    }

    #[test]
    fn pole_decides_the_bend_direction() {
        let goal = Vec3::new(0., 1., 0.);
        let out = solve_chain(&leg(), goal, Some(Vec3::new(0., 3., -5.)), false);
        assert!(translation(out[1]).z < 0.);
    }

    #[test]
    fn stretchy_chain_reaches_far_goal() {
        let goal = Vec3::new(0., -5., 0.);
        let out = solve_chain(&leg(), goal, None, true);
        assert!(translation(out[2]).abs_diff_eq(goal, 1e-3));
        let rigid = solve_chain(&leg(), goal, None, false);
        assert!(translation(rigid[2]).y > -0.1);
    }

    #[test]
    fn unsupported_lengths_pass_through() {
        let chain = [Mat4::IDENTITY; 4];
        assert_eq!(solve_chain(&chain, Vec3::X, None, false), chain.to_vec());
    }

    #[test]
    fn blend_endpoints_are_exact() {
        let a = Mat4::from_translation(Vec3::X);
        let b = Mat4::from_scale(Vec3::new(-1., 1., 1.));
        assert_eq!(blend_matrices(a, b, 0.), a);
        assert_eq!(blend_matrices(a, b, 1.), b);
        let half = blend_matrices(a, Mat4::from_translation(Vec3::Y), 0.5);
        assert!(translation(half).abs_diff_eq(Vec3::new(0.5, 0.5, 0.), 1e-5));
    }

    #[test]
    fn aim_points_primary_axis_at_target() {
        let out = aim_matrix(
            Mat4::IDENTITY,
            Vec3::new(0., 0., 4.),
            Vec3::X,
            Vec3::new(0., 3., 0.),
            Vec3::Y,
        );
        assert!(out.transform_vector3(Vec3::X).abs_diff_eq(Vec3::Z, 1e-5));
        assert!(out.transform_vector3(Vec3::Y).abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn pole_sits_in_front_of_the_knee() {
        let pole = pole_vector(
            Vec3::new(0., 5., 0.),
            Vec3::new(0., 2.5, 0.3),
            Vec3::ZERO,
            2.,
        );
        assert!(pole.abs_diff_eq(Vec3::new(0., 2.5, 2.3), 1e-5));
    }
}
