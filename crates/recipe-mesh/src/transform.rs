use recipe_core::{Rotation, Vec3};

pub type Point3 = [f64; 3];

#[inline]
pub fn translate(point: Point3, offset: Point3) -> Point3 {
    [
        point[0] + offset[0],
        point[1] + offset[1],
        point[2] + offset[2],
    ]
}

/// Rotates a point counter-clockwise around X.
#[inline]
pub fn rotate_x(point: Point3, angle: f64) -> Point3 {
    let c = angle.cos();
    let s = angle.sin();
    [point[0], c * point[1] - s * point[2], s * point[1] + c * point[2]]
}

/// Rotates a point counter-clockwise around Y.
#[inline]
pub fn rotate_y(point: Point3, angle: f64) -> Point3 {
    let c = angle.cos();
    let s = angle.sin();
    [c * point[0] + s * point[2], point[1], -s * point[0] + c * point[2]]
}

/// Rotates a point counter-clockwise around Z.
#[inline]
pub fn rotate_z(point: Point3, angle: f64) -> Point3 {
    let c = angle.cos();
    let s = angle.sin();
    [c * point[0] - s * point[1], s * point[0] + c * point[1], point[2]]
}

/// Intrinsic XYZ Euler rotation, `R = Rx * Ry * Rz`.
#[inline]
pub fn rotate_euler_xyz(point: Point3, angles: Point3) -> Point3 {
    rotate_x(rotate_y(rotate_z(point, angles[2]), angles[1]), angles[0])
}

/// Placement of a component's local mesh in world space.
///
/// Points are rotated about the local origin first, then translated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Radians around X, Y and Z.
    pub rotation: Point3,
    pub translation: Point3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        rotation: [0.0, 0.0, 0.0],
        translation: [0.0, 0.0, 0.0],
    };

    pub fn new(rotation: Option<&Rotation>, translation: Vec3) -> Self {
        Self {
            rotation: rotation.map_or([0.0, 0.0, 0.0], Rotation::radians),
            translation: translation.to_array(),
        }
    }

    pub fn apply(&self, point: Point3) -> Point3 {
        let rotated = if self.rotation == [0.0, 0.0, 0.0] {
            point
        } else {
            rotate_euler_xyz(point, self.rotation)
        };
        translate(rotated, self.translation)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use recipe_core::{Rotation, Vec3};

    use super::{Transform, rotate_euler_xyz, rotate_x, rotate_y, rotate_z};

    fn assert_point_close(actual: [f64; 3], expected: [f64; 3]) {
        for axis in 0..3 {
            assert!(
                (actual[axis] - expected[axis]).abs() < 1e-9,
                "actual={actual:?} expected={expected:?}"
            );
        }
    }

    #[test]
    fn quarter_turns_follow_the_right_hand_rule() {
        assert_point_close(rotate_x([0.0, 1.0, 0.0], FRAC_PI_2), [0.0, 0.0, 1.0]);
        assert_point_close(rotate_y([0.0, 0.0, 1.0], FRAC_PI_2), [1.0, 0.0, 0.0]);
        assert_point_close(rotate_z([1.0, 0.0, 0.0], FRAC_PI_2), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn euler_order_applies_z_first() {
        // Z takes +X to +Y, then X takes +Y to +Z.
        let rotated = rotate_euler_xyz([1.0, 0.0, 0.0], [FRAC_PI_2, 0.0, FRAC_PI_2]);
        assert_point_close(rotated, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn transform_rotates_before_translating() {
        let rotation = Rotation {
            pitch: None,
            yaw: None,
            roll: Some(90.0),
        };
        let transform = Transform::new(Some(&rotation), Vec3::new(10.0, 0.0, 0.0));
        assert_point_close(transform.apply([1.0, 0.0, 0.0]), [10.0, 1.0, 0.0]);
    }

    #[test]
    fn identity_leaves_points_alone() {
        assert_eq!(Transform::IDENTITY.apply([1.5, -2.0, 3.0]), [1.5, -2.0, 3.0]);
    }
}
