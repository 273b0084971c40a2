//! Gesture ingestion from the input thread.
//!
//! Pan, zoom, the touched flag and the viewport size are independent atomic
//! scalars. The render thread may see one of them a frame late, but never a
//! torn value. The slide cursor and the restart request share one mutex so a
//! corner reset cannot interleave with an advance.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::camera::smoothed_zoom;
use crate::clock::{PresentationClock, Timestamp};
use crate::deck::SlideCursor;
use crate::tuning::Tuning;

/// An `f32` stored as its bit pattern.
#[derive(Debug)]
pub(crate) struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub(crate) fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub(crate) fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }

    /// Apply `f` atomically; `None` leaves the value untouched.
    pub(crate) fn update(&self, mut f: impl FnMut(f32) -> Option<f32>) -> Option<f32> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                f(f32::from_bits(bits)).map(f32::to_bits)
            })
            .ok()
            .map(f32::from_bits)
    }
}

/// Cursor state that must change together.
#[derive(Debug)]
pub(crate) struct Control {
    pub(crate) cursor: SlideCursor,
    /// A corner double tap rewound the cursor; the next tick re-shows the
    /// opening slide.
    pub(crate) restart_requested: bool,
}

/// State written by the input thread and read by the render thread.
pub(crate) struct SharedState {
    pub(crate) tuning: Tuning,
    pub(crate) clock: Arc<dyn PresentationClock>,
    pub(crate) pan_x: AtomicF32,
    pub(crate) pan_y: AtomicF32,
    pub(crate) absolute_zoom: AtomicF32,
    pub(crate) touched: AtomicBool,
    /// Set by the render thread while a flyby runs.
    pub(crate) auto_zooming: AtomicBool,
    pub(crate) finished: AtomicBool,
    /// Time of the previous pan event as `f64` bits; NaN before the first.
    last_pan: AtomicU64,
    /// Width in the high half, height in the low half.
    viewport: AtomicU64,
    pub(crate) control: Mutex<Control>,
}

impl SharedState {
    pub(crate) fn new(tuning: Tuning, clock: Arc<dyn PresentationClock>, cursor: SlideCursor) -> Self {
        Self {
            pan_x: AtomicF32::new(0.0),
            pan_y: AtomicF32::new(0.0),
            absolute_zoom: AtomicF32::new(tuning.zoom_min),
            touched: AtomicBool::new(false),
            auto_zooming: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            last_pan: AtomicU64::new(f64::NAN.to_bits()),
            viewport: AtomicU64::new(0),
            control: Mutex::new(Control {
                cursor,
                restart_requested: false,
            }),
            tuning,
            clock,
        }
    }

    pub(crate) fn pan(&self) -> [f32; 2] {
        [self.pan_x.load(), self.pan_y.load()]
    }

    pub(crate) fn reset_pan(&self) {
        self.pan_x.store(0.0);
        self.pan_y.store(0.0);
    }

    pub(crate) fn viewport(&self) -> (u32, u32) {
        let packed = self.viewport.load(Ordering::Acquire);
        ((packed >> 32) as u32, packed as u32)
    }

    /// Gestures during a flyby are dropped until the camera is close.
    fn flyby_blocks_input(&self) -> bool {
        self.auto_zooming.load(Ordering::Acquire)
            && self.absolute_zoom.load() < self.tuning.flyby_touch_zoom()
    }
}

/// Pan deltas derived from raw pointer motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub dx: f32,
    pub dy: f32,
}

impl Gesture {
    /// Screen pixels (y down) to pan units (y up).
    pub fn drag(dx_px: f32, dy_px: f32, tuning: &Tuning) -> Self {
        Self {
            dx: dx_px * tuning.touch_move_factor,
            dy: -dy_px * tuning.touch_move_factor,
        }
    }
}

/// Whether a tap at `(x, y)` in a `width` x `height` view lands in the
/// top-left restart corner.
pub fn is_corner_tap(x: f32, y: f32, width: f32, height: f32, tuning: &Tuning) -> bool {
    if width <= 0.0 || height <= 0.0 {
        return false;
    }
    x / width < tuning.reset_corner_fraction && y / height < tuning.reset_corner_fraction
}

/// Thread-safe handle the host's input thread feeds gestures into.
///
/// Cheap to clone; every clone drives the same presenter.
#[derive(Clone)]
pub struct InputGestureAdapter {
    shared: Arc<SharedState>,
}

impl std::fmt::Debug for InputGestureAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputGestureAdapter")
            .field("pan", &self.shared.pan())
            .field("absolute_zoom", &self.shared.absolute_zoom.load())
            .finish()
    }
}

impl InputGestureAdapter {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    pub fn on_pan(&self, dx: f32, dy: f32) {
        let s = &self.shared;
        if s.flyby_blocks_input() {
            return;
        }
        s.touched.store(true, Ordering::Release);
        if s.auto_zooming.load(Ordering::Acquire) {
            return;
        }
        if !dx.is_finite() || !dy.is_finite() {
            log::warn!("dropping non-finite pan ({dx}, {dy})");
            return;
        }

        let now = s.clock.now();
        let previous = f64::from_bits(s.last_pan.swap(now.as_secs().to_bits(), Ordering::AcqRel));
        let elapsed = now.since(Timestamp::from_secs(previous));
        let velocity = |delta: f32| {
            if elapsed.is_nan() || elapsed <= 0.0 || elapsed > s.tuning.pan_gap_seconds {
                0.0
            } else {
                (delta as f64 / elapsed) as f32
            }
        };

        let step_x = dx * (1.0 + velocity(dx).abs() / 2.0);
        let step_y = dy * (1.0 + velocity(dy).abs() / 2.0);
        s.pan_x.update(|x| Some(x + step_x));
        s.pan_y.update(|y| Some(y + step_y));
    }

    pub fn on_drag(&self, dx_px: f32, dy_px: f32) {
        let gesture = Gesture::drag(dx_px, dy_px, &self.shared.tuning);
        self.on_pan(gesture.dx, gesture.dy);
    }

    /// Relative zoom. Factors above 1 bring the text closer.
    pub fn on_zoom(&self, factor: f32) {
        let s = &self.shared;
        if s.flyby_blocks_input() {
            return;
        }
        s.touched.store(true, Ordering::Release);
        if s.auto_zooming.load(Ordering::Acquire) {
            return;
        }
        s.absolute_zoom
            .update(|current| smoothed_zoom(current, factor, &s.tuning));
    }

    /// A corner tap restarts the deck from the opening slide; any other
    /// double tap recenters the view at full zoom.
    pub fn on_double_tap(&self, is_corner_tap: bool) {
        let s = &self.shared;
        if is_corner_tap {
            if s.finished.load(Ordering::Acquire) {
                log::debug!("restart ignored, deck already finished");
                return;
            }
            {
                let mut control = s.control.lock();
                control.cursor.reset();
                control.restart_requested = true;
            }
            s.absolute_zoom.store(s.tuning.zoom_min);
            s.reset_pan();
            log::info!("restart requested from corner tap");
        } else {
            if s.auto_zooming.load(Ordering::Acquire) {
                return;
            }
            s.reset_pan();
            s.absolute_zoom.store(s.tuning.zoom_max);
            log::debug!("view reset");
        }
    }

    /// Double tap at a raw position, classified against the last reported
    /// viewport size.
    pub fn on_double_tap_at(&self, x: f32, y: f32) {
        let (width, height) = self.shared.viewport();
        let corner = is_corner_tap(x, y, width as f32, height as f32, &self.shared.tuning);
        self.on_double_tap(corner);
    }

    pub fn on_viewport_resize(&self, width: u32, height: u32) {
        let packed = ((width as u64) << 32) | height as u64;
        self.shared.viewport.store(packed, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    pub fn absolute_zoom(&self) -> f32 {
        self.shared.absolute_zoom.load()
    }

    pub fn pan_offset(&self) -> [f32; 2] {
        self.shared.pan()
    }
}
