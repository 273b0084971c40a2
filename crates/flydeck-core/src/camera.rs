use crate::clock::Timestamp;
use crate::tuning::{Tuning, lerp};

/// Wall-clock span over which the camera flies from `depth_max` to `depth_min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlybyWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl FlybyWindow {
    pub fn starting_at(now: Timestamp, seconds: f64) -> Self {
        Self {
            start: now,
            end: now + seconds,
        }
    }

    /// Progress through the window, clamped to `[0, 1]`.
    pub fn progress(&self, now: Timestamp) -> f32 {
        let span = self.end.since(self.start);
        if span <= 0.0 {
            return 1.0;
        }
        (now.since(self.start) / span).clamp(0.0, 1.0) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub distance: f32,
    /// Zoom the shared state must now hold, when the camera rather than a
    /// gesture decided it.
    pub zoom: Option<f32>,
    /// The flyby finished on this frame.
    pub landed: bool,
}

/// Viewing distance for the current frame.
///
/// While a flyby runs the distance is a straight line in wall-clock time;
/// otherwise it follows the gesture-driven absolute zoom.
#[derive(Debug, Clone)]
pub struct CameraController {
    tuning: Tuning,
    flyby: Option<FlybyWindow>,
    distance: f32,
}

impl CameraController {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tuning: tuning.clone(),
            flyby: None,
            distance: tuning.depth_max,
        }
    }

    pub fn begin_flyby(&mut self, now: Timestamp) {
        self.flyby = Some(FlybyWindow::starting_at(now, self.tuning.flyby_seconds));
        self.distance = self.tuning.depth_max;
    }

    /// Stop any flyby and park at the closest position.
    pub fn land(&mut self) {
        self.flyby = None;
        self.distance = self.tuning.depth_min;
    }

    pub fn is_auto_zooming(&self) -> bool {
        self.flyby.is_some()
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn update(&mut self, now: Timestamp, absolute_zoom: f32) -> CameraFrame {
        let t = &self.tuning;
        let Some(window) = self.flyby else {
            self.distance = t.distance_for_zoom(absolute_zoom);
            return CameraFrame {
                distance: self.distance,
                zoom: None,
                landed: false,
            };
        };

        let distance = lerp(t.depth_max, t.depth_min, window.progress(now));
        if (distance - t.depth_min).abs() < t.depth_min * t.flyby_snap_fraction {
            let zoom_max = t.zoom_max;
            self.land();
            return CameraFrame {
                distance: self.distance,
                zoom: Some(zoom_max),
                landed: true,
            };
        }

        self.distance = distance;
        CameraFrame {
            distance,
            zoom: Some(t.zoom_for_distance(distance)),
            landed: false,
        }
    }
}

/// Result of a relative zoom gesture against the current absolute zoom.
///
/// Moves `zoom_smoothing` of the way toward the clamped target and returns
/// `None` when the target is within `zoom_epsilon` of `current`.
pub fn smoothed_zoom(current: f32, factor: f32, tuning: &Tuning) -> Option<f32> {
    if !factor.is_finite() || factor <= 0.0 {
        return None;
    }
    let target = (current * factor).clamp(tuning.zoom_min, tuning.zoom_max);
    let delta = target - current;
    if delta.abs() < tuning.zoom_epsilon {
        return None;
    }
    Some((current + delta * tuning.zoom_smoothing).clamp(tuning.zoom_min, tuning.zoom_max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flyby_is_linear_in_time() {
        let tuning = Tuning::default();
        let mut camera = CameraController::new(&tuning);
        camera.begin_flyby(Timestamp::from_secs(10.0));
        assert!(camera.is_auto_zooming());

        let start = camera.update(Timestamp::from_secs(10.0), tuning.zoom_min);
        assert_eq!(start.distance, tuning.depth_max);

        let half = camera.update(Timestamp::from_secs(12.0), tuning.zoom_min);
        let expected = (tuning.depth_max + tuning.depth_min) / 2.0;
        assert!((half.distance - expected).abs() < 1e-5);
        let zoom = half.zoom.unwrap();
        assert!((tuning.distance_for_zoom(zoom) - half.distance).abs() < 1e-4);
        assert!(!half.landed);
    }

    #[test]
    fn flyby_snaps_to_depth_min() {
        let tuning = Tuning::default();
        let mut camera = CameraController::new(&tuning);
        camera.begin_flyby(Timestamp::ZERO);
        // 0.999 of the way is within 1% of depth_min.
        let frame = camera.update(Timestamp::from_secs(3.996), tuning.zoom_min);
        assert!(frame.landed);
        assert_eq!(frame.distance, tuning.depth_min);
        assert_eq!(frame.zoom, Some(tuning.zoom_max));
        assert!(!camera.is_auto_zooming());

        // Once landed, the camera follows gesture zoom again.
        let after = camera.update(Timestamp::from_secs(4.5), tuning.zoom_min);
        assert!(!after.landed);
        assert_eq!(after.zoom, None);
        assert_eq!(after.distance, tuning.depth_max);
    }

    #[test]
    fn restarting_a_flyby_returns_to_depth_max() {
        let tuning = Tuning::default();
        let mut camera = CameraController::new(&tuning);
        camera.begin_flyby(Timestamp::ZERO);
        camera.update(Timestamp::from_secs(5.0), tuning.zoom_min);
        assert_eq!(camera.distance(), tuning.depth_min);

        camera.begin_flyby(Timestamp::from_secs(6.0));
        assert!(camera.is_auto_zooming());
        assert_eq!(camera.distance(), tuning.depth_max);
    }

    #[test]
    fn idle_camera_follows_zoom() {
        let tuning = Tuning::default();
        let mut camera = CameraController::new(&tuning);
        let frame = camera.update(Timestamp::ZERO, tuning.zoom_max);
        assert_eq!(frame.distance, tuning.depth_min);
        assert_eq!(frame.zoom, None);
        let frame = camera.update(Timestamp::ZERO, tuning.zoom_min);
        assert_eq!(frame.distance, tuning.depth_max);
    }

    #[test]
    fn smoothed_zoom_moves_five_percent() {
        let tuning = Tuning::default();
        let next = smoothed_zoom(2.0, 2.0, &tuning).unwrap();
        assert!((next - 2.1).abs() < 1e-5);
    }

    #[test]
    fn smoothed_zoom_ignores_tiny_changes() {
        let tuning = Tuning::default();
        assert_eq!(smoothed_zoom(2.0, 1.0, &tuning), None);
        assert_eq!(smoothed_zoom(2.0, 1.0001, &tuning), None);
        assert_eq!(smoothed_zoom(tuning.zoom_max, 3.0, &tuning), None);
        assert_eq!(smoothed_zoom(2.0, f32::NAN, &tuning), None);
        assert_eq!(smoothed_zoom(2.0, -1.0, &tuning), None);
    }

    #[test]
    fn smoothed_zoom_stays_in_range() {
        let tuning = Tuning::default();
        let mut zoom = 1.0;
        for factor in [100.0, 0.001, 50.0, 1e-6, 7.0] {
            for _ in 0..200 {
                if let Some(next) = smoothed_zoom(zoom, factor, &tuning) {
                    zoom = next;
                }
                assert!(zoom >= tuning.zoom_min && zoom <= tuning.zoom_max);
            }
        }
    }
}
