use glam::{EulerRot, Mat4, Quat, Vec3};
use std::cell::Cell;

/// Translation, XYZ Euler rotation and uniform scale, with a lazily rebuilt matrix.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Vec3,
    scale: f32,

    matrix: Cell<Mat4>,
    dirty: Cell<bool>,
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Vec3::ZERO,
            scale: 1.0,
            matrix: Cell::new(Mat4::IDENTITY),
            dirty: Cell::new(true),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        if self.dirty.get() {
            let matrix = Mat4::from_scale_rotation_translation(
                Vec3::splat(self.scale),
                self.quat(),
                self.translation,
            );

            self.matrix.set(matrix);
            self.dirty.set(false);
        }

        self.matrix.get()
    }

    fn invalidate(&self) {
        self.dirty.set(true);
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.invalidate();
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.invalidate();
    }

    /// Adds `delta` radians to each Euler angle.
    pub fn rotate(&mut self, delta: Vec3) {
        self.rotation += delta;
        self.invalidate();
    }

    #[allow(dead_code)]
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    #[allow(dead_code)]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    #[allow(dead_code)]
    pub fn scale(&self) -> f32 {
        self.scale
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_translation(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_tracks_setters() {
        let mut transform = Transform::default();
        assert_eq!(transform.matrix(), Mat4::IDENTITY);

        transform.set_scale(7.0);
        transform.set_translation(Vec3::new(1.0, 2.0, 3.0));

        let point = transform.matrix().transform_point3(Vec3::X);
        assert!((point - Vec3::new(8.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn rotate_accumulates_euler_angles() {
        let mut transform = Transform::default();
        for _ in 0..100 {
            transform.rotate(Vec3::new(0.01, 0.005, 0.01));
        }

        let rotation = transform.rotation();
        assert!((rotation.x - 1.0).abs() < 1e-4);
        assert!((rotation.y - 0.5).abs() < 1e-4);
        assert!((rotation.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn rotation_preserves_scale() {
        let mut transform = Transform::default();
        transform.set_scale(2.0);
        transform.rotate(Vec3::new(0.3, 1.2, -0.7));

        let length = transform.matrix().transform_vector3(Vec3::Y).length();
        assert!((length - 2.0).abs() < 1e-5);
    }

    #[test]
    fn cached_matrix_is_rebuilt_after_rotate() {
        let mut transform = Transform::default();
        assert_eq!(transform.matrix(), Mat4::IDENTITY);

        transform.rotate(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        let point = transform.matrix().transform_point3(Vec3::X);
        assert!((point - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }
}
