use bevy_math::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Symmetry tag used for naming and mirror pairing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[default]
    None,
    Left,
    Right,
    Mid,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::None, Side::Left, Side::Right, Side::Mid];

    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|side| side.name().to_string()).collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Left => "left",
            Self::Right => "right",
            Self::Mid => "mid",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Mid => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn opposite(&self) -> Self {
        SidePairing::default().opposite(*self)
    }
}

/// Declared pairing of sides. Sides missing from the table map onto themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidePairing {
    pairs: Vec<(Side, Side)>,
}

impl Default for SidePairing {
    fn default() -> Self {
        Self {
            pairs: vec![(Side::Left, Side::Right)],
        }
    }
}

impl SidePairing {
    pub fn new(pairs: impl IntoIterator<Item = (Side, Side)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    pub fn opposite(&self, side: Side) -> Side {
        self.pairs
            .iter()
            .find_map(|(a, b)| {
                if *a == side {
                    Some(*b)
                } else if *b == side {
                    Some(*a)
                } else {
                    None
                }
            })
            .unwrap_or(side)
    }

    /// Index table `table[side] = opposite side`, in the layout consumed by a remap node.
    pub fn remap_table(&self) -> Vec<i64> {
        Side::ALL
            .iter()
            .map(|side| self.opposite(*side).index() as i64)
            .collect()
    }
}

/// Signed cardinal axis, used for primary/secondary orientation inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
    NegX,
    NegY,
    NegZ,
}

impl Axis {
    pub const ALL: [Axis; 6] = [
        Axis::X,
        Axis::Y,
        Axis::Z,
        Axis::NegX,
        Axis::NegY,
        Axis::NegZ,
    ];

    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|axis| axis.name().to_string()).collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::NegX => "neg_x",
            Self::NegY => "neg_y",
            Self::NegZ => "neg_z",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|axis| axis == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn vector(&self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
            Self::NegX => Vec3::NEG_X,
            Self::NegY => Vec3::NEG_Y,
            Self::NegZ => Vec3::NEG_Z,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::X => Self::NegX,
            Self::Y => Self::NegY,
            Self::Z => Self::NegZ,
            Self::NegX => Self::X,
            Self::NegY => Self::Y,
            Self::NegZ => Self::Z,
        }
    }

    pub fn remap_table() -> Vec<i64> {
        Self::ALL
            .iter()
            .map(|axis| axis.opposite().index() as i64)
            .collect()
    }
}

/// Reflection plane used when mirroring a component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymmetryMode {
    /// Mirror about the plane perpendicular to the X axis.
    #[default]
    MirrorX,
    /// Mirror about the plane perpendicular to the Y axis.
    MirrorY,
    /// Mirror about the plane perpendicular to the Z axis.
    MirrorZ,
}

impl SymmetryMode {
    pub fn axis(&self) -> Axis {
        match self {
            Self::MirrorX => Axis::X,
            Self::MirrorY => Axis::Y,
            Self::MirrorZ => Axis::Z,
        }
    }

    pub fn scale(&self) -> Vec3 {
        Vec3::ONE - 2. * self.axis().vector()
    }

    /// Negative-scale matrix for this plane.
    pub fn reflection_matrix(&self) -> Mat4 {
        Mat4::from_scale(self.scale())
    }

    pub fn apply_position(&self, input: Vec3) -> Vec3 {
        input * self.scale()
    }

    pub fn apply_quat(&self, input: Quat) -> Quat {
        let axis = self.axis().vector();
        let vector = Vec3::new(input.x, input.y, input.z);
        let mirrored = vector - 2. * axis * vector.dot(axis);
        let out = -Quat::from_xyzw(mirrored.x, mirrored.y, mirrored.z, -input.w);
        debug_assert!(out.is_normalized());
        out
    }

    /// Mirrors a matrix in world space.
    pub fn apply_matrix(&self, input: Mat4) -> Mat4 {
        self.reflection_matrix() * input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pairing_swaps_left_and_right_only() {
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Side::Right.opposite(), Side::Left);
        assert_eq!(Side::Mid.opposite(), Side::Mid);
        assert_eq!(Side::None.opposite(), Side::None);
        assert_eq!(SidePairing::default().remap_table(), vec![0, 2, 1, 3]);
    }

    #[test]
    fn custom_pairing_supports_more_sides() {
        let pairing = SidePairing::new([(Side::Left, Side::Right), (Side::Mid, Side::None)]);
        assert_eq!(pairing.opposite(Side::Mid), Side::None);
        assert_eq!(pairing.remap_table(), vec![3, 2, 1, 0]);
    }

    #[test]
    fn axis_remap_flips_sign() {
        let table = Axis::remap_table();
        assert_eq!(table[Axis::X.index()], Axis::NegX.index() as i64);
        assert_eq!(table[Axis::NegZ.index()], Axis::Z.index() as i64);
    }

    #[test]
    fn mirror_x_negates_x() {
        let mode = SymmetryMode::MirrorX;
        assert_eq!(mode.scale(), Vec3::new(-1., 1., 1.));
        let m = Mat4::from_translation(Vec3::new(1., 2., 3.));
        let mirrored = mode.apply_matrix(m);
        assert!(
            mirrored
                .w_axis
                .truncate()
                .abs_diff_eq(Vec3::new(-1., 2., 3.), 1e-6)
        );
        assert!(
            mode.apply_position(Vec3::new(1., 2., 3.))
                .abs_diff_eq(Vec3::new(-1., 2., 3.), 1e-6)
        );
    }
}
