//! Model rotation clock.
//!
//! The angle advances by `speed * dt` where `dt` is the measured frame delta,
//! so the spin rate does not depend on the display's refresh rate.

/// Rotation angle in degrees, kept in `[0, 360)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationClock {
    angle_deg: f32,
    speed_deg_per_sec: f32,
}

impl RotationClock {
    pub fn new(speed_deg_per_sec: f32) -> Self {
        Self {
            angle_deg: 0.0,
            speed_deg_per_sec,
        }
    }

    #[inline]
    pub fn angle_deg(&self) -> f32 {
        self.angle_deg
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed_deg_per_sec
    }

    /// Advance by a measured frame delta in seconds. Negative deltas are ignored.
    pub fn advance(&mut self, dt_secs: f32) -> f32 {
        self.advance_degrees(self.speed_deg_per_sec * dt_secs.max(0.0))
    }

    /// Advance by a fixed step in degrees.
    pub fn advance_degrees(&mut self, step_deg: f32) -> f32 {
        self.angle_deg = (self.angle_deg + step_deg).rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs.
        if self.angle_deg >= 360.0 {
            self.angle_deg = 0.0;
        }
        self.angle_deg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angular_distance(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn full_turn_in_fixed_steps_returns_to_start() {
        let mut clock = RotationClock::new(0.0);
        let start = clock.angle_deg();
        for _ in 0..720 {
            clock.advance_degrees(0.5);
        }
        assert!(angular_distance(clock.angle_deg(), start) < 1e-2);
    }

    #[test]
    fn delta_time_scaling() {
        let mut clock = RotationClock::new(30.0);
        for _ in 0..720 {
            clock.advance(1.0 / 60.0);
        }
        // 720 frames * 0.5 deg = 360 deg.
        assert!(angular_distance(clock.angle_deg(), 0.0) < 1e-2);

        let mut half = RotationClock::new(30.0);
        half.advance(3.0);
        assert!((half.angle_deg() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn negative_speed_reverses_and_wraps() {
        let mut clock = RotationClock::new(-90.0);
        clock.advance(1.0);
        assert!((clock.angle_deg() - 270.0).abs() < 1e-4);
        assert!(clock.angle_deg() >= 0.0 && clock.angle_deg() < 360.0);
    }

    #[test]
    fn negative_delta_is_ignored() {
        let mut clock = RotationClock::new(45.0);
        clock.advance(-1.0);
        assert_eq!(clock.angle_deg(), 0.0);
    }
}
