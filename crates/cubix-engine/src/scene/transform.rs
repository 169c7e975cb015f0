use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use super::camera::{Camera, Projection};

/// Axis the cube spins around (not normalized; `model_at` normalizes it).
pub const ROTATION_AXIS: Vec3 = Vec3::new(0.5, 1.0, 0.0);

/// Model matrix after `elapsed` seconds: identity rotated by `elapsed` radians
/// about [`ROTATION_AXIS`].
///
/// Pure in `elapsed`, so the animation speed is independent of frame rate.
pub fn model_at(elapsed: f32) -> Mat4 {
    Mat4::IDENTITY * Mat4::from_axis_angle(ROTATION_AXIS.normalize(), elapsed)
}

/// Model/view/projection set for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transforms {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Transforms {
    /// Recomputes all three matrices for a frame at `elapsed` seconds.
    pub fn for_frame(elapsed: f32, camera: &Camera, projection: &Projection) -> Self {
        Self {
            model: model_at(elapsed),
            view: camera.view_matrix(),
            projection: projection.matrix(),
        }
    }

    /// Combined clip-space transform: `projection * view * model`.
    pub fn model_view_projection(&self) -> Mat4 {
        self.projection * self.view * self.model
    }

    /// Clip-space coordinate of an object-space position, as the vertex stage computes it.
    pub fn clip_position(&self, position: Vec3) -> Vec4 {
        self.model_view_projection() * position.extend(1.0)
    }

    /// Column-major GPU layout of the three matrices.
    pub fn uniform(&self) -> TransformUniform {
        TransformUniform {
            model: self.model.to_cols_array_2d(),
            view: self.view.to_cols_array_2d(),
            projection: self.projection.to_cols_array_2d(),
        }
    }
}

/// Uniform block consumed by the cube vertex stage (group 0, binding 0).
///
/// Field order matches the WGSL `Transforms` struct.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn model_at_zero_is_identity() {
        assert!(model_at(0.0).abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn rotation_keeps_the_axis_fixed() {
        let axis = ROTATION_AXIS.normalize();
        for t in [0.3, 1.0, 2.5, 10.0] {
            let rotated = model_at(t).transform_vector3(axis);
            assert!(rotated.abs_diff_eq(axis, 1e-5), "t = {t}");
        }
    }

    #[test]
    fn rotation_angle_equals_elapsed_seconds() {
        // For a 3x3 rotation, trace = 1 + 2 cos(angle); unambiguous on [0, π].
        for t in [0.25f32, 1.0, 2.0, 3.0] {
            let m = model_at(t);
            let trace = m.x_axis.x + m.y_axis.y + m.z_axis.z;
            let angle = ((trace - 1.0) / 2.0).clamp(-1.0, 1.0).acos();
            assert!((angle - t).abs() < 1e-3, "t = {t}, angle = {angle}");
        }
    }

    #[test]
    fn rotation_is_additive_in_time() {
        let (t1, t2) = (0.7, 1.9);
        let composed = model_at(t1) * model_at(t2);
        assert!(composed.abs_diff_eq(model_at(t1 + t2), EPS));
    }

    #[test]
    fn rotation_is_continuous() {
        let a = model_at(1.0);
        let b = model_at(1.0 + 1e-3);
        assert!(a.abs_diff_eq(b, 1e-2));
    }

    #[test]
    fn clip_position_matches_hand_computed_reference() {
        let tf = Transforms::for_frame(0.0, &Camera::default(), &Projection::default());

        // Vertex 1 of the cube: (0.5, -0.5, -0.5).
        let clip = tf.clip_position(Vec3::new(0.5, -0.5, -0.5));

        // View basis for eye (2,2,2) → origin, up +Y:
        //   s = (1, 0, -1)/√2, u = (-1, 2, -1)/√6, f = -(1, 1, 1)/√3
        // p - eye = (-1.5, -2.5, -2.5)
        //   view = (1/√2, -1/√6, -6.5/√3)
        let (vx, vy, vz) = (
            1.0 / 2f32.sqrt(),
            -1.0 / 6f32.sqrt(),
            -6.5 / 3f32.sqrt(),
        );
        let fy = 1.0 / 22.5f32.to_radians().tan();
        let fx = fy / (800.0 / 600.0);
        let (near, far) = (0.1f32, 100.0f32);
        let expected = Vec4::new(
            fx * vx,
            fy * vy,
            far / (near - far) * vz + near * far / (near - far),
            -vz,
        );

        assert!(clip.abs_diff_eq(expected, EPS), "{clip} vs {expected}");
        assert!(clip.abs_diff_eq(Vec4::new(1.28033, -0.98560, 3.65643, 3.75278), 1e-3));
    }

    #[test]
    fn composition_order_is_projection_view_model() {
        let tf = Transforms::for_frame(1.2, &Camera::default(), &Projection::default());
        let p = Vec3::new(0.5, 0.5, -0.5);

        let manual = tf.projection * (tf.view * (tf.model * p.extend(1.0)));
        assert!(tf.clip_position(p).abs_diff_eq(manual, EPS));

        let reversed = tf.model * tf.view * tf.projection * p.extend(1.0);
        assert!(!tf.clip_position(p).abs_diff_eq(reversed, EPS));
    }

    #[test]
    fn uniform_is_column_major() {
        let tf = Transforms::for_frame(0.0, &Camera::default(), &Projection::default());
        let u = tf.uniform();

        // Column 3 of the view matrix holds the translation.
        assert_eq!(u.view[3], tf.view.w_axis.to_array());
        assert_eq!(u.projection[2][3], -1.0);
        assert_eq!(std::mem::size_of::<TransformUniform>(), 3 * 64);
    }
}
