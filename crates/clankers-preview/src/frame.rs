//! World ↔ body frame conversion from roll-pitch-yaw angles.

use nalgebra::{Matrix3, Vector3};

/// Build a rotation matrix from roll-pitch-yaw (extrinsic XYZ / intrinsic ZYX).
///
/// Maps body-frame vectors into the world frame.
pub fn rotation_from_rpy(rpy: &Vector3<f64>) -> Matrix3<f64> {
    let (sr, cr) = rpy.x.sin_cos();
    let (sp, cp) = rpy.y.sin_cos();
    let (sy, cy) = rpy.z.sin_cos();

    // R = Rz(yaw) * Ry(pitch) * Rx(roll)
    Matrix3::new(
        cy * cp,
        cy * sp * sr - sy * cr,
        cy * sp * cr + sy * sr,
        sy * cp,
        sy * sp * sr + cy * cr,
        sy * sp * cr - cy * sr,
        -sp,
        cp * sr,
        cp * cr,
    )
}

/// Express a body-frame vector in the world frame.
pub fn to_world(v: &Vector3<f64>, rpy: &Vector3<f64>) -> Vector3<f64> {
    rotation_from_rpy(rpy) * v
}

/// Express a world-frame vector in the body frame.
pub fn to_body(v: &Vector3<f64>, rpy: &Vector3<f64>) -> Vector3<f64> {
    rotation_from_rpy(rpy).transpose() * v
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn identity_at_zero_angles() {
        let v = Vector3::new(0.3, -0.2, 0.1);
        assert_relative_eq!(to_world(&v, &Vector3::zeros()), v, epsilon = 1e-12);
        assert_relative_eq!(to_body(&v, &Vector3::zeros()), v, epsilon = 1e-12);
    }

    #[test]
    fn yaw_quarter_turn() {
        // 90-degree yaw: X -> Y, Y -> -X
        let rpy = Vector3::new(0.0, 0.0, FRAC_PI_2);
        let x = to_world(&Vector3::x(), &rpy);
        assert_relative_eq!(x, Vector3::y(), epsilon = 1e-12);
        let y = to_world(&Vector3::y(), &rpy);
        assert_relative_eq!(y, -Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn matches_nalgebra_euler_convention() {
        let rpy = Vector3::new(0.1, -0.25, 0.7);
        let expected = Rotation3::from_euler_angles(rpy.x, rpy.y, rpy.z);
        assert_relative_eq!(rotation_from_rpy(&rpy), *expected.matrix(), epsilon = 1e-12);
    }

    #[test]
    fn body_inverts_world() {
        let rpy = Vector3::new(-0.3, 0.2, 2.1);
        let v = Vector3::new(1.0, 2.0, -0.5);
        let back = to_body(&to_world(&v, &rpy), &rpy);
        assert_relative_eq!(back, v, epsilon = 1e-12);
    }

    #[test]
    fn rotation_is_orthonormal() {
        let r = rotation_from_rpy(&Vector3::new(0.4, 0.3, -1.2));
        assert_relative_eq!(r * r.transpose(), Matrix3::identity(), epsilon = 1e-12);
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);
    }
}
