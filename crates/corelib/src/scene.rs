//! Per-frame transforms for the two-pass mirror scene.
//!
//! Every MVP is `projection * view * model`. The reflection pass uses the
//! primary camera mirrored across the mirror plane; the main pass uses the
//! primary camera for both the mesh and the mirror quad.

use crate::camera::Camera;
use crate::config::SceneConfig;
use crate::plane::Plane;
use crate::transform::Transform;
use crate::{Mat4, Vec3, vec3};

/// Mirror quad centre. The quad sits behind the model on the -Z side.
pub const MIRROR_CENTER: Vec3 = vec3(0.0, 0.0, -6.0);

const FOV_Y_DEG: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

#[derive(Clone, Copy, Debug)]
pub struct FrameTransforms {
    pub projection: Mat4,
    pub view: Mat4,
    pub mirrored_view: Mat4,
    pub model: Mat4,
    /// Mesh as seen by the primary camera.
    pub mesh_mvp: Mat4,
    /// Mesh as seen by the mirrored camera (reflection pass).
    pub reflected_mesh_mvp: Mat4,
    /// Mirror quad as seen by the primary camera.
    pub mirror_mvp: Mat4,
}

/// Fixed camera pose plus mirror placement; only the aspect changes on resize.
#[derive(Clone, Copy, Debug)]
pub struct SceneRig {
    camera: Camera,
    mirror: Transform,
    mirror_plane: Plane,
}

impl SceneRig {
    pub fn new(config: &SceneConfig) -> Self {
        let camera = Camera::new_perspective(
            vec3(0.0, 0.0, config.camera_distance),
            Vec3::ZERO,
            Vec3::Y,
            FOV_Y_DEG.to_radians(),
            Z_NEAR,
            Z_FAR,
            1.0,
        );
        let mirror = Transform::from_trs(
            MIRROR_CENTER,
            vec3(0.0, config.mirror_orientation.yaw_deg().to_radians(), 0.0),
            Vec3::ONE,
        );
        let mirror_plane =
            Plane::from_point_normal(mirror.translation, mirror.rotation() * Vec3::Z);
        Self {
            camera,
            mirror,
            mirror_plane,
        }
    }

    /// Recompute the projection aspect for a viewport. Zero sizes clamp to 1.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        self.camera = self.camera.with_aspect(aspect);
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn mirror_plane(&self) -> &Plane {
        &self.mirror_plane
    }

    #[inline]
    pub fn mirrored_camera(&self) -> Camera {
        self.camera.mirrored(&self.mirror_plane)
    }

    pub fn frame(&self, angle_deg: f32, model_scale: f32) -> FrameTransforms {
        let projection = self.camera.proj();
        let view = self.camera.view();
        let mirrored_view = self.mirrored_camera().view();
        let model = Transform::spinning(angle_deg, model_scale).matrix();
        let mirror_model = self.mirror.matrix();

        FrameTransforms {
            projection,
            view,
            mirrored_view,
            model,
            mesh_mvp: projection * view * model,
            reflected_mesh_mvp: projection * mirrored_view * model,
            mirror_mvp: projection * view * mirror_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MirrorOrientation;

    fn close(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, 1e-4)
    }

    #[test]
    fn mvp_is_projection_view_model() {
        let mut rig = SceneRig::new(&SceneConfig::default());
        rig.set_viewport(1280, 720);
        let f = rig.frame(37.0, 0.5);
        assert!(close(f.mesh_mvp, f.projection * f.view * f.model));
        assert!(close(f.reflected_mesh_mvp, f.projection * f.mirrored_view * f.model));
        // Order matters: model * view * projection is a different matrix.
        assert!(!close(f.mesh_mvp, f.model * f.view * f.projection));
    }

    #[test]
    fn mirrored_camera_sits_behind_mirror() {
        let rig = SceneRig::new(&SceneConfig::default());
        let mirrored = rig.mirrored_camera();
        // Eye at z=20 reflected across z=-6.
        assert!((mirrored.eye - vec3(0.0, 0.0, -32.0)).length() < 1e-4);
        assert!((mirrored.up - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn facing_away_keeps_the_same_plane() {
        let cfg = SceneConfig::builder()
            .mirror_orientation(MirrorOrientation::FacingAway)
            .build()
            .expect("config");
        let rig = SceneRig::new(&cfg);
        let plane = rig.mirror_plane();
        assert!((plane.normal - -Vec3::Z).length() < 1e-5);
        assert!(plane.signed_distance(MIRROR_CENTER).abs() < 1e-5);
        assert!((rig.mirrored_camera().eye.z - -32.0).abs() < 1e-4);
    }

    #[test]
    fn mirror_quad_does_not_spin_with_the_model() {
        let rig = SceneRig::new(&SceneConfig::default());
        let a = rig.frame(0.0, 0.33);
        let b = rig.frame(120.0, 0.33);
        assert!(close(a.mirror_mvp, b.mirror_mvp));
        assert!(!close(a.mesh_mvp, b.mesh_mvp));
        let center = a.projection * a.view * Mat4::from_translation(MIRROR_CENTER);
        assert!(close(a.mirror_mvp, center));
    }

    #[test]
    fn zero_viewport_does_not_produce_nan() {
        let mut rig = SceneRig::new(&SceneConfig::default());
        rig.set_viewport(0, 0);
        let f = rig.frame(0.0, 1.0);
        assert!(f.mesh_mvp.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn model_scale_is_applied() {
        let rig = SceneRig::new(&SceneConfig::default());
        let f = rig.frame(0.0, 0.33);
        let m = f.model.to_cols_array();
        assert!((m[0] - 0.33).abs() < 1e-6);
        assert!((m[5] - 0.33).abs() < 1e-6);
    }
}
