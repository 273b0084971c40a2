use serde::{Deserialize, Serialize};

use crate::error::{PresenterError, Result};

/// Numeric knobs for the camera, lighting, layout and slide timing.
///
/// Every field has a default, so a deck or config file only needs to list
/// the values it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    /// Closest camera distance, reached at the end of the flyby.
    pub depth_min: f32,
    /// Farthest camera distance, where every slide starts.
    pub depth_max: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    /// Fraction of the way toward the requested zoom applied per gesture.
    pub zoom_smoothing: f32,
    /// Zoom requests that move less than this are dropped.
    pub zoom_epsilon: f32,

    pub flyby_seconds: f64,
    /// The flyby ends once the camera is within this fraction of `depth_min`.
    pub flyby_snap_fraction: f32,
    /// Position in the zoom range after which gestures during the flyby
    /// count as a touch.
    pub flyby_touch_zoom_fraction: f32,

    pub overexpose_seconds: f64,
    pub grace_seconds: f64,
    /// Dwell multiplier for the opening slide.
    pub beginning_multiplier: f64,
    /// Pan events further apart than this start a new stroke with zero velocity.
    pub pan_gap_seconds: f64,

    pub light_x_offset: f32,
    pub light_amplitude: f32,
    pub light_slow_factor: f32,
    pub light_release_smoothing: f32,

    pub layout_margin: f32,
    pub interline_fraction: f32,
    pub projection_size: f32,
    pub near_plane: f32,

    pub reset_corner_fraction: f32,
    pub touch_move_factor: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            depth_min: 1.1,
            depth_max: 6.0,
            zoom_min: 0.05,
            zoom_max: 5.0,
            zoom_smoothing: 0.05,
            zoom_epsilon: 1e-3,
            flyby_seconds: 4.0,
            flyby_snap_fraction: 0.01,
            flyby_touch_zoom_fraction: 0.9,
            overexpose_seconds: 2.0,
            grace_seconds: 3.0,
            beginning_multiplier: 2.0,
            pan_gap_seconds: 0.25,
            light_x_offset: 0.5,
            light_amplitude: 3.0,
            light_slow_factor: 0.5,
            light_release_smoothing: 0.1,
            layout_margin: 1.2,
            interline_fraction: 0.2,
            projection_size: 150.0,
            near_plane: 0.7,
            reset_corner_fraction: 0.07,
            touch_move_factor: 0.5,
        }
    }
}

impl Tuning {
    pub fn validate(&self) -> Result<()> {
        fn check(ok: bool, message: &str) -> Result<()> {
            if ok {
                Ok(())
            } else {
                Err(PresenterError::InvalidTuning(message.to_string()))
            }
        }

        check(
            self.depth_min > 0.0 && self.depth_min < self.depth_max,
            "depth_min must be positive and below depth_max",
        )?;
        check(
            self.zoom_min > 0.0 && self.zoom_min < self.zoom_max,
            "zoom_min must be positive and below zoom_max",
        )?;
        check(
            self.zoom_smoothing > 0.0 && self.zoom_smoothing <= 1.0,
            "zoom_smoothing must be in (0, 1]",
        )?;
        check(self.zoom_epsilon >= 0.0, "zoom_epsilon must not be negative")?;
        check(self.flyby_seconds > 0.0, "flyby_seconds must be positive")?;
        check(
            self.flyby_snap_fraction > 0.0 && self.flyby_snap_fraction <= 1.0,
            "flyby_snap_fraction must be in (0, 1]",
        )?;
        check(
            self.flyby_touch_zoom_fraction > 0.0 && self.flyby_touch_zoom_fraction <= 1.0,
            "flyby_touch_zoom_fraction must be in (0, 1]",
        )?;
        check(
            self.overexpose_seconds >= 0.0,
            "overexpose_seconds must not be negative",
        )?;
        check(self.grace_seconds > 0.0, "grace_seconds must be positive")?;
        check(
            self.beginning_multiplier >= 1.0,
            "beginning_multiplier must be at least 1",
        )?;
        check(self.pan_gap_seconds > 0.0, "pan_gap_seconds must be positive")?;
        check(
            self.light_amplitude > 0.0 && self.light_x_offset.abs() <= self.light_amplitude,
            "light_x_offset must lie within +/- light_amplitude",
        )?;
        check(
            self.light_slow_factor > 0.0,
            "light_slow_factor must be positive",
        )?;
        check(
            self.light_release_smoothing > 0.0 && self.light_release_smoothing <= 1.0,
            "light_release_smoothing must be in (0, 1]",
        )?;
        check(self.layout_margin > 0.0, "layout_margin must be positive")?;
        check(
            self.interline_fraction >= 0.0,
            "interline_fraction must not be negative",
        )?;
        check(
            self.projection_size > 0.0 && self.near_plane > 0.0,
            "projection_size and near_plane must be positive",
        )?;
        check(
            self.reset_corner_fraction > 0.0 && self.reset_corner_fraction < 1.0,
            "reset_corner_fraction must be in (0, 1)",
        )?;
        check(
            self.touch_move_factor > 0.0,
            "touch_move_factor must be positive",
        )?;
        Ok(())
    }

    // zoom_max <-> depth_min ; zoom_min <-> depth_max
    pub fn distance_for_zoom(&self, zoom: f32) -> f32 {
        let zoom = zoom.clamp(self.zoom_min, self.zoom_max);
        let t = (zoom - self.zoom_min) / (self.zoom_max - self.zoom_min);
        lerp(self.depth_max, self.depth_min, t).clamp(self.depth_min, self.depth_max)
    }

    pub fn zoom_for_distance(&self, distance: f32) -> f32 {
        let distance = distance.clamp(self.depth_min, self.depth_max);
        let t = (self.depth_max - distance) / (self.depth_max - self.depth_min);
        lerp(self.zoom_min, self.zoom_max, t).clamp(self.zoom_min, self.zoom_max)
    }

    /// Zoom level past which gestures during the flyby are no longer ignored.
    pub fn flyby_touch_zoom(&self) -> f32 {
        self.zoom_min + (self.zoom_max - self.zoom_min) * self.flyby_touch_zoom_fraction
    }

    /// Distance band around `depth_min` in which dynamic lighting runs.
    pub fn dynamic_light_band(&self) -> f32 {
        (self.depth_max - self.depth_min) / 3.0
    }
}

/// Linear interpolation that returns `a` and `b` exactly at the endpoints.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}
