//! Scene configuration, built once by the host and passed by reference.

use crate::{CoreError, CoreResult};

/// Which side of the mirror quad faces the primary camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MirrorOrientation {
    /// Front face (reflection) visible from the camera.
    #[default]
    FacingCamera,
    /// Quad turned 180 degrees about +Y; the camera sees its back face.
    FacingAway,
}

impl MirrorOrientation {
    /// Yaw of the mirror quad in degrees.
    #[inline]
    pub fn yaw_deg(self) -> f32 {
        match self {
            MirrorOrientation::FacingCamera => 0.0,
            MirrorOrientation::FacingAway => 180.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub mirror_enabled: bool,
    /// Degrees per second; the sign picks the spin direction.
    pub rotation_speed: f32,
    pub model_scale: f32,
    pub mirror_orientation: MirrorOrientation,
    /// Back face draws an opaque fill instead of the reflection.
    pub two_sided_mirror: bool,
    /// Distance from the primary camera to the model origin along +Z.
    pub camera_distance: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            mirror_enabled: true,
            rotation_speed: 30.0,
            model_scale: 0.33,
            mirror_orientation: MirrorOrientation::FacingCamera,
            two_sided_mirror: false,
            camera_distance: 20.0,
        }
    }
}

impl SceneConfig {
    pub fn builder() -> SceneConfigBuilder {
        SceneConfigBuilder::default()
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !self.rotation_speed.is_finite() {
            return Err(CoreError::InvalidConfig {
                field: "rotation_speed",
                reason: format!("must be finite, got {}", self.rotation_speed),
            });
        }
        if !(self.model_scale.is_finite() && self.model_scale > 0.0) {
            return Err(CoreError::InvalidConfig {
                field: "model_scale",
                reason: format!("must be positive, got {}", self.model_scale),
            });
        }
        if !(self.camera_distance.is_finite() && self.camera_distance > 0.0) {
            return Err(CoreError::InvalidConfig {
                field: "camera_distance",
                reason: format!("must be positive, got {}", self.camera_distance),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneConfigBuilder {
    config: SceneConfig,
}

impl SceneConfigBuilder {
    pub fn mirror_enabled(mut self, enabled: bool) -> Self {
        self.config.mirror_enabled = enabled;
        self
    }

    pub fn rotation_speed(mut self, deg_per_sec: f32) -> Self {
        self.config.rotation_speed = deg_per_sec;
        self
    }

    pub fn model_scale(mut self, scale: f32) -> Self {
        self.config.model_scale = scale;
        self
    }

    pub fn mirror_orientation(mut self, orientation: MirrorOrientation) -> Self {
        self.config.mirror_orientation = orientation;
        self
    }

    pub fn two_sided_mirror(mut self, two_sided: bool) -> Self {
        self.config.two_sided_mirror = two_sided;
        self
    }

    pub fn camera_distance(mut self, distance: f32) -> Self {
        self.config.camera_distance = distance;
        self
    }

    pub fn build(self) -> CoreResult<SceneConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let cfg = SceneConfig::builder()
            .mirror_enabled(false)
            .rotation_speed(-15.0)
            .model_scale(1.0)
            .mirror_orientation(MirrorOrientation::FacingAway)
            .build()
            .expect("valid config");
        assert!(!cfg.mirror_enabled);
        assert_eq!(cfg.rotation_speed, -15.0);
        assert_eq!(cfg.model_scale, 1.0);
        assert_eq!(cfg.mirror_orientation.yaw_deg(), 180.0);
        assert_eq!(cfg.camera_distance, SceneConfig::default().camera_distance);
    }

    #[test]
    fn rejects_bad_scale() {
        let err = SceneConfig::builder().model_scale(0.0).build().unwrap_err();
        assert!(err.to_string().contains("model_scale"));
    }

    #[test]
    fn rejects_non_finite_speed() {
        assert!(SceneConfig::builder().rotation_speed(f32::NAN).build().is_err());
    }
}
