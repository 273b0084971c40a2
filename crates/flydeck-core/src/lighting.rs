use std::f64::consts::TAU;

use crate::clock::Timestamp;
use crate::tuning::Tuning;

/// Light x below this is treated as back at rest.
const REST_EPSILON: f32 = 1e-4;

/// Light position for the current frame.
///
/// Fixed mode holds the light at `(0, 0, 1)`. Dynamic mode, active once the
/// camera is close, swings it along x. Entering dynamic mode solves a phase
/// so the swing starts exactly where the light is; leaving it eases the
/// light back to rest.
#[derive(Debug, Clone)]
pub struct LightingController {
    x_offset: f32,
    amplitude: f32,
    slow_factor: f32,
    release: f32,
    depth_min: f32,
    band: f32,
    dynamic: bool,
    phase: f32,
    x: f32,
}

impl LightingController {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            x_offset: tuning.light_x_offset,
            amplitude: tuning.light_amplitude,
            slow_factor: tuning.light_slow_factor,
            release: tuning.light_release_smoothing,
            depth_min: tuning.depth_min,
            band: tuning.dynamic_light_band(),
            dynamic: false,
            phase: 0.0,
            x: 0.0,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn position(&self) -> [f32; 3] {
        [self.x, 0.0, 1.0]
    }

    /// Wall-clock time folded into one period of the swing.
    fn angle(&self, now: Timestamp) -> f32 {
        let period = TAU / self.slow_factor as f64;
        now.as_secs().rem_euclid(period) as f32
    }

    fn enter_dynamic(&mut self, angle: f32) {
        let ratio = ((self.x - self.x_offset) / self.amplitude).clamp(-1.0, 1.0);
        self.phase = ratio.asin() - self.slow_factor * angle;
        self.dynamic = true;
        log::trace!("dynamic lighting on, phase {:.3}", self.phase);
    }

    fn leave_dynamic(&mut self) {
        self.dynamic = false;
        log::trace!("dynamic lighting off at x {:.3}", self.x);
    }

    /// Drop out of dynamic mode; the light eases home on later updates.
    pub fn release(&mut self) {
        if self.dynamic {
            self.leave_dynamic();
        }
    }

    pub fn update(&mut self, now: Timestamp, distance: f32) -> [f32; 3] {
        let wants_dynamic = (distance - self.depth_min).abs() < self.band;
        let angle = self.angle(now);

        match (self.dynamic, wants_dynamic) {
            (false, true) => self.enter_dynamic(angle),
            (true, false) => self.leave_dynamic(),
            _ => {}
        }

        if self.dynamic {
            self.x = self.x_offset + self.amplitude * (self.slow_factor * angle + self.phase).sin();
        } else {
            self.x -= self.x * self.release;
            if self.x.abs() < REST_EPSILON {
                self.x = 0.0;
            }
        }
        self.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_camera_pins_light() {
        let tuning = Tuning::default();
        let mut light = LightingController::new(&tuning);
        for step in 0..100 {
            let now = Timestamp::from_secs(step as f64 * 0.1);
            assert_eq!(light.update(now, tuning.depth_max), [0.0, 0.0, 1.0]);
        }
        assert!(!light.is_dynamic());
    }

    #[test]
    fn entering_dynamic_mode_is_continuous() {
        let tuning = Tuning::default();
        let mut light = LightingController::new(&tuning);
        let before = light.update(Timestamp::from_secs(7.3), tuning.depth_max);
        let after = light.update(Timestamp::from_secs(7.3), tuning.depth_min);
        assert!(light.is_dynamic());
        for axis in 0..3 {
            assert!((before[axis] - after[axis]).abs() < 1e-3);
        }
        let expected = (-tuning.light_x_offset / tuning.light_amplitude).asin()
            - tuning.light_slow_factor * 7.3;
        assert!((light.phase() - expected).abs() < 1e-4);
    }

    #[test]
    fn dynamic_light_oscillates_around_offset() {
        let tuning = Tuning::default();
        let mut light = LightingController::new(&tuning);
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for step in 0..2000 {
            let [x, y, z] = light.update(Timestamp::from_secs(step as f64 * 0.01), tuning.depth_min);
            assert_eq!((y, z), (0.0, 1.0));
            min = min.min(x);
            max = max.max(x);
        }
        let low = tuning.light_x_offset - tuning.light_amplitude;
        let high = tuning.light_x_offset + tuning.light_amplitude;
        assert!(min >= low - 1e-4 && max <= high + 1e-4);
        assert!(max - min > tuning.light_amplitude);
    }

    #[test]
    fn period_wrap_is_continuous() {
        let tuning = Tuning::default();
        let mut light = LightingController::new(&tuning);
        let period = TAU / tuning.light_slow_factor as f64;
        light.update(Timestamp::from_secs(period - 1.0), tuning.depth_min);
        let [a, _, _] = light.update(Timestamp::from_secs(period - 1e-4), tuning.depth_min);
        let [b, _, _] = light.update(Timestamp::from_secs(period + 1e-4), tuning.depth_min);
        assert!((a - b).abs() < 1e-3);
    }

    #[test]
    fn leaving_dynamic_mode_eases_back() {
        let tuning = Tuning::default();
        let mut light = LightingController::new(&tuning);
        let mut t = 0.0;
        let mut x: f32 = 0.0;
        // Run until the light is well away from rest.
        while x.abs() < 1.0 {
            t += 0.05;
            x = light.update(Timestamp::from_secs(t), tuning.depth_min)[0];
        }
        let released = light.update(Timestamp::from_secs(t + 0.016), tuning.depth_max)[0];
        assert!(!light.is_dynamic());
        assert!((released - x * (1.0 - tuning.light_release_smoothing)).abs() < 1e-5);
        for _ in 0..500 {
            t += 0.016;
            light.update(Timestamp::from_secs(t), tuning.depth_max);
        }
        assert_eq!(light.position(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn reentry_solves_phase_from_current_position() {
        let tuning = Tuning::default();
        let mut light = LightingController::new(&tuning);
        let mut t = 0.0;
        let mut x: f32 = 0.0;
        while x.abs() < 1.0 {
            t += 0.05;
            x = light.update(Timestamp::from_secs(t), tuning.depth_min)[0];
        }
        let mid = light.update(Timestamp::from_secs(t + 0.01), tuning.depth_max)[0];
        let back = light.update(Timestamp::from_secs(t + 0.01), tuning.depth_min)[0];
        assert!((mid - back).abs() < 1e-3);
    }
}
