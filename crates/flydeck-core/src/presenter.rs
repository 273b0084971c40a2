//! Per-frame slide lifecycle.
//!
//! The render thread owns a [`Presenter`] and calls [`Presenter::tick`]
//! once per frame. Gestures arrive from any thread through an
//! [`InputGestureAdapter`] obtained from [`Presenter::input_handle`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::camera::CameraController;
use crate::clock::{PresentationClock, Timestamp};
use crate::deck::{Slide, SlideDeck};
use crate::error::{PresenterError, Result};
use crate::input::{InputGestureAdapter, SharedState};
use crate::layout::{GlyphMetrics, LineLayout, Projection, TextLayout, TextLayoutEngine};
use crate::lighting::LightingController;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The camera is flying in.
    AutoZoom,
    Steady,
    /// Fading to white ahead of the next flip.
    Overexposing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingFirstSlide,
    Active(Stage),
    /// Deck exhausted with `keep_last_slide`; the last slide stays up.
    Holding,
    Finished,
}

/// Everything the rasterizer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub camera_distance: f32,
    pub pan_offset: [f32; 2],
    pub light_position: [f32; 3],
    pub projection: Projection,
    /// Glyph units to world units.
    pub text_scale: f32,
    pub lines: Vec<LineLayout>,
    /// Slide color blended toward white by `overexposure`.
    pub color: [f32; 3],
    pub alpha: f32,
    pub overexposure: f32,
    pub slide_index: Option<usize>,
}

impl RenderParams {
    pub fn line_offsets(&self) -> Vec<f32> {
        self.lines.iter().map(|line| line.offset_y).collect()
    }
}

struct ActiveSlide {
    index: usize,
    slide: Slide,
    glyphs_ready: bool,
    layout: Option<((u32, u32), TextLayout)>,
}

type FinishedCallback = Box<dyn FnOnce() + Send>;

pub struct Presenter {
    deck: SlideDeck,
    tuning: Tuning,
    shared: Arc<SharedState>,
    metrics: Box<dyn GlyphMetrics>,
    camera: CameraController,
    lighting: LightingController,
    layout_engine: TextLayoutEngine,
    phase: Phase,
    current: Option<ActiveSlide>,
    last_flip: Timestamp,
    overexposure: f32,
    on_finished: Option<FinishedCallback>,
}

impl Presenter {
    /// Presenter using the deck's own tuning, or the defaults.
    pub fn new(
        deck: SlideDeck,
        clock: impl PresentationClock + 'static,
        metrics: impl GlyphMetrics + 'static,
    ) -> Result<Self> {
        let tuning = deck.tuning().cloned().unwrap_or_default();
        Self::with_tuning(deck, clock, metrics, tuning)
    }

    pub fn with_tuning(
        deck: SlideDeck,
        clock: impl PresentationClock + 'static,
        metrics: impl GlyphMetrics + 'static,
        tuning: Tuning,
    ) -> Result<Self> {
        deck.validate()?;
        tuning.validate()?;

        let mut metrics: Box<dyn GlyphMetrics> = Box::new(metrics);
        prefetch_fonts(&deck, metrics.as_mut())?;

        let shared = Arc::new(SharedState::new(
            tuning.clone(),
            Arc::new(clock),
            deck.cursor(),
        ));
        log::info!(
            "deck ready: {} slides, {}s per slide",
            deck.len(),
            deck.slide_time_seconds()
        );

        Ok(Self {
            camera: CameraController::new(&tuning),
            lighting: LightingController::new(&tuning),
            layout_engine: TextLayoutEngine::new(&tuning),
            deck,
            tuning,
            shared,
            metrics,
            phase: Phase::AwaitingFirstSlide,
            current: None,
            last_flip: Timestamp::ZERO,
            overexposure: 0.0,
            on_finished: None,
        })
    }

    /// Run `callback` once, on the render thread, when the deck finishes.
    pub fn on_finished(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.on_finished = Some(Box::new(callback));
    }

    pub fn input_handle(&self) -> InputGestureAdapter {
        InputGestureAdapter::new(Arc::clone(&self.shared))
    }

    pub fn on_pan(&self, dx: f32, dy: f32) {
        self.input_handle().on_pan(dx, dy);
    }

    pub fn on_zoom(&self, factor: f32) {
        self.input_handle().on_zoom(factor);
    }

    pub fn on_double_tap(&self, is_corner_tap: bool) {
        self.input_handle().on_double_tap(is_corner_tap);
    }

    pub fn on_viewport_resize(&self, width: u32, height: u32) {
        self.input_handle().on_viewport_resize(width, height);
    }

    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    pub fn current_slide_index(&self) -> Option<usize> {
        self.current.as_ref().map(|active| active.index)
    }

    pub fn distance(&self) -> f32 {
        self.camera.distance()
    }

    pub fn absolute_zoom(&self) -> f32 {
        self.shared.absolute_zoom.load()
    }

    pub fn overexposure(&self) -> f32 {
        self.overexposure
    }

    pub fn is_lighting_dynamic(&self) -> bool {
        self.lighting.is_dynamic()
    }

    /// When the current slide is due to flip, ignoring future gestures.
    pub fn scheduled_flip(&self) -> Option<Timestamp> {
        let active = self.current.as_ref()?;
        matches!(self.phase, Phase::Active(_)).then(|| self.last_flip + self.dwell_seconds(active.index))
    }

    pub fn tick(&mut self, now: Timestamp) -> Result<RenderParams> {
        if self.phase == Phase::Finished {
            self.shared.touched.store(false, Ordering::Release);
            return Ok(self.render());
        }

        let restart = std::mem::take(&mut self.shared.control.lock().restart_requested);
        if restart || self.phase == Phase::AwaitingFirstSlide {
            if restart {
                log::info!("restarting deck");
            }
            self.activate(0, self.deck.beginning().clone(), now)?;
        }

        let touched = self.shared.touched.swap(false, Ordering::AcqRel);
        let active = match self.phase {
            Phase::Active(stage) => self.current.as_ref().map(|a| (stage, a.index)),
            _ => None,
        };
        if let Some((stage, index)) = active {
            let dwell = self.dwell_seconds(index);
            let mut remaining = (self.last_flip + dwell).since(now);

            if touched && remaining > self.tuning.grace_seconds {
                self.last_flip = now + self.tuning.grace_seconds - dwell;
                remaining = self.tuning.grace_seconds;
                log::debug!("gesture shortened the slide to {}s", self.tuning.grace_seconds);
            }

            if remaining <= 0.0 {
                self.flip(now)?;
            } else if remaining < self.tuning.overexpose_seconds && self.has_next_slide() {
                if stage != Stage::Overexposing {
                    self.enter_overexposure();
                }
                let window = self.tuning.overexpose_seconds;
                self.overexposure = ((window - remaining) / window).clamp(0.0, 1.0) as f32;
            }
        }

        self.update_camera(now);
        self.lighting.update(now, self.camera.distance());
        self.refresh_layout()?;
        Ok(self.render())
    }

    fn dwell_seconds(&self, index: usize) -> f64 {
        let multiplier = if index == 0 {
            self.tuning.beginning_multiplier
        } else {
            1.0
        };
        multiplier * self.deck.slide_time_seconds()
    }

    fn has_next_slide(&self) -> bool {
        self.shared.control.lock().cursor.has_next()
    }

    fn enter_overexposure(&mut self) {
        self.phase = Phase::Active(Stage::Overexposing);
        self.overexposure = 0.0;
        log::trace!("overexposure started");
    }

    fn flip(&mut self, now: Timestamp) -> Result<()> {
        let next = self.shared.control.lock().cursor.advance();
        match next {
            Some((index, slide)) => self.activate(index, slide, now),
            None if self.deck.keep_last_slide() => {
                self.phase = Phase::Holding;
                self.overexposure = 0.0;
                log::info!("deck finished, holding last slide");
                Ok(())
            }
            None => {
                self.finish();
                Ok(())
            }
        }
    }

    fn activate(&mut self, index: usize, slide: Slide, now: Timestamp) -> Result<()> {
        log::debug!("flipped to slide {index}: {}", slide.headline());
        self.last_flip = now;
        self.phase = Phase::Active(Stage::AutoZoom);
        self.overexposure = 0.0;

        self.camera.begin_flyby(now);
        self.shared.auto_zooming.store(true, Ordering::Release);
        self.shared.absolute_zoom.store(self.tuning.zoom_min);
        self.shared.reset_pan();
        self.shared.touched.store(false, Ordering::Release);
        self.lighting.release();

        let loaded = self.metrics.load(&slide.font_name, slide.font_size);
        let glyphs_ready = loaded.is_ok();
        let font = slide.font_name.clone();
        let size = slide.font_size;
        self.current = Some(ActiveSlide {
            index,
            slide,
            glyphs_ready,
            layout: None,
        });
        loaded.map_err(|source| {
            log::error!("cannot load '{font}' at {size}px for slide {index}");
            PresenterError::GlyphLoad { font, size, source }
        })
    }

    fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.current = None;
        self.overexposure = 0.0;
        self.camera = CameraController::new(&self.tuning);
        self.shared.auto_zooming.store(false, Ordering::Release);
        self.shared.finished.store(true, Ordering::Release);
        log::info!("deck finished");
        if let Some(callback) = self.on_finished.take() {
            callback();
        }
    }

    fn update_camera(&mut self, now: Timestamp) {
        let frame = self.camera.update(now, self.shared.absolute_zoom.load());
        if let Some(zoom) = frame.zoom {
            self.shared.absolute_zoom.store(zoom);
        }
        if frame.landed {
            self.shared.auto_zooming.store(false, Ordering::Release);
            if self.phase == Phase::Active(Stage::AutoZoom) {
                self.phase = Phase::Active(Stage::Steady);
            }
            log::trace!("flyby landed");
        }
    }

    fn refresh_layout(&mut self) -> Result<()> {
        let viewport = self.shared.viewport();
        let Some(active) = self.current.as_mut() else {
            return Ok(());
        };
        if !active.glyphs_ready {
            return Err(PresenterError::GlyphsUnavailable {
                font: active.slide.font_name.clone(),
            });
        }
        if active.layout.as_ref().is_some_and(|(size, _)| *size == viewport) {
            return Ok(());
        }
        let projection = Projection::from_viewport(viewport.0, viewport.1, &self.tuning);
        let layout = self.layout_engine.layout(
            &active.slide.text,
            self.metrics.as_ref(),
            projection.width(),
            projection.height(),
        );
        active.layout = Some((viewport, layout));
        Ok(())
    }

    fn render(&self) -> RenderParams {
        let (width, height) = self.shared.viewport();
        let projection = Projection::from_viewport(width, height, &self.tuning);
        let base = RenderParams {
            camera_distance: self.camera.distance(),
            pan_offset: self.shared.pan(),
            light_position: self.lighting.position(),
            projection,
            text_scale: 0.0,
            lines: Vec::new(),
            color: [1.0, 1.0, 1.0],
            alpha: 0.0,
            overexposure: 0.0,
            slide_index: None,
        };
        let Some(active) = self.current.as_ref() else {
            return base;
        };
        let Some((_, layout)) = active.layout.as_ref() else {
            return base;
        };

        let o = self.overexposure;
        let color = active.slide.font_color.to_f32().map(|c| c + (1.0 - c) * o);
        RenderParams {
            text_scale: layout.scale,
            lines: layout.lines.clone(),
            color,
            alpha: 1.0,
            overexposure: o,
            slide_index: Some(active.index),
            ..base
        }
    }
}

fn prefetch_fonts(deck: &SlideDeck, metrics: &mut dyn GlyphMetrics) -> Result<()> {
    let fonts: BTreeSet<(&str, u32)> = deck
        .all_slides()
        .iter()
        .map(|slide| (slide.font_name.as_str(), slide.font_size))
        .collect();
    for (font, size) in fonts {
        metrics
            .load(font, size)
            .map_err(|source| PresenterError::UnresolvedFont {
                font: font.to_string(),
                size,
                source,
            })?;
        log::trace!("prefetched '{font}' at {size}px");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::clock::ManualClock;
    use crate::error::LoadError;
    use crate::layout::UniformMetrics;

    const FRAME: f64 = 1.0 / 60.0;

    fn deck(regular: usize, slide_time: f64, keep_last: bool) -> SlideDeck {
        SlideDeck::new(
            Slide::new("Welcome", "sans", 40),
            (0..regular).map(|i| Slide::new(format!("slide {i}"), "sans", 40)),
            slide_time,
            keep_last,
        )
    }

    fn presenter(deck: SlideDeck) -> (Presenter, ManualClock) {
        let clock = ManualClock::new();
        let presenter = Presenter::new(deck, clock.clone(), UniformMetrics::new(&["sans"])).unwrap();
        presenter.on_viewport_resize(1280, 720);
        (presenter, clock)
    }

    /// Tick at `FRAME` intervals until `until`, returning the last frame.
    fn run(presenter: &mut Presenter, clock: &ManualClock, until: f64) -> RenderParams {
        let mut params = presenter.tick(clock.now()).unwrap();
        while clock.now().as_secs() + FRAME <= until {
            let now = clock.advance(FRAME);
            params = presenter.tick(now).unwrap();
        }
        params
    }

    #[test]
    fn first_tick_shows_beginning_far_away() {
        let (mut p, clock) = presenter(deck(2, 5.0, false));
        assert_eq!(p.phase(), Phase::AwaitingFirstSlide);
        let params = p.tick(clock.now()).unwrap();
        assert_eq!(params.slide_index, Some(0));
        assert_eq!(params.camera_distance, p.tuning().depth_max);
        assert_eq!(params.alpha, 1.0);
        assert!(params.text_scale > 0.0);
        assert_eq!(p.phase(), Phase::Active(Stage::AutoZoom));
    }

    #[test]
    fn flyby_lands_at_closest_distance() {
        let (mut p, clock) = presenter(deck(1, 30.0, false));
        let params = run(&mut p, &clock, 4.1);
        assert_eq!(params.camera_distance, p.tuning().depth_min);
        assert_eq!(p.absolute_zoom(), p.tuning().zoom_max);
        assert_eq!(p.phase(), Phase::Active(Stage::Steady));
    }

    #[test]
    fn beginning_slide_dwells_twice_as_long() {
        let (mut p, clock) = presenter(deck(2, 5.0, false));
        run(&mut p, &clock, 9.9);
        assert_eq!(p.current_slide_index(), Some(0));
        run(&mut p, &clock, 10.05);
        assert_eq!(p.current_slide_index(), Some(1));
        run(&mut p, &clock, 14.9);
        assert_eq!(p.current_slide_index(), Some(1));
        run(&mut p, &clock, 15.05);
        assert_eq!(p.current_slide_index(), Some(2));
    }

    #[test]
    fn deck_finishes_exactly_once() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (mut p, clock) = presenter(deck(1, 5.0, false));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        p.on_finished(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        run(&mut p, &clock, 14.9);
        assert!(!p.is_finished());
        let params = run(&mut p, &clock, 20.0);
        assert!(p.is_finished());
        assert_eq!(p.phase(), Phase::Finished);
        assert_eq!(params.slide_index, None);
        assert_eq!(params.alpha, 0.0);

        run(&mut p, &clock, 40.0);
        assert!(p.is_finished());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn keep_last_slide_holds() {
        let (mut p, clock) = presenter(deck(1, 5.0, true));
        let params = run(&mut p, &clock, 60.0);
        assert_eq!(p.phase(), Phase::Holding);
        assert!(!p.is_finished());
        assert_eq!(params.slide_index, Some(1));
        assert_eq!(params.alpha, 1.0);
        assert_eq!(params.overexposure, 0.0);
    }

    #[test]
    fn overexposure_ramps_before_flip() {
        let (mut p, clock) = presenter(deck(2, 10.0, false));
        // Slide 1 runs from 20 to 30.
        let params = run(&mut p, &clock, 27.0);
        assert_eq!(params.overexposure, 0.0);
        let params = run(&mut p, &clock, 28.5);
        assert_eq!(p.phase(), Phase::Active(Stage::Overexposing));
        assert!((params.overexposure - 0.25).abs() < 0.02);
        assert!(params.color.iter().all(|&c| c == 1.0));

        let mut last = params.overexposure;
        while clock.now().as_secs() < 29.9 {
            let now = clock.advance(FRAME);
            let params = p.tick(now).unwrap();
            assert!(params.overexposure >= last);
            assert!(params.overexposure <= 1.0);
            last = params.overexposure;
        }
        let params = run(&mut p, &clock, 30.05);
        assert_eq!(params.slide_index, Some(2));
        assert_eq!(params.overexposure, 0.0);
    }

    #[test]
    fn last_slide_does_not_overexpose() {
        let (mut p, clock) = presenter(deck(1, 10.0, false));
        let params = run(&mut p, &clock, 29.5);
        assert_eq!(params.slide_index, Some(1));
        assert_eq!(params.overexposure, 0.0);
    }

    #[test]
    fn overexposure_blends_color_toward_white() {
        let deck = SlideDeck::new(
            Slide::new("intro", "sans", 40).with_color(crate::deck::Rgb::new(0, 0, 0)),
            vec![Slide::new("a", "sans", 40)],
            10.0,
            false,
        );
        let (mut p, clock) = presenter(deck);
        let params = run(&mut p, &clock, 19.0);
        assert!((params.overexposure - 0.5).abs() < 0.02);
        assert!(params.color.iter().all(|&c| (c - params.overexposure).abs() < 1e-6));
    }

    #[test]
    fn zoom_gestures_stay_in_range() {
        let (mut p, clock) = presenter(deck(1, 600.0, false));
        run(&mut p, &clock, 4.5);
        let t = p.tuning().clone();
        let factors = [0.5, 0.1, 3.0, 0.0001, 1e4, 1.0, 0.9, 1.1];
        for round in 0..300 {
            p.on_zoom(factors[round % factors.len()]);
            let params = p.tick(clock.advance(FRAME)).unwrap();
            assert!(p.absolute_zoom() >= t.zoom_min && p.absolute_zoom() <= t.zoom_max);
            assert!(params.camera_distance >= t.depth_min && params.camera_distance <= t.depth_max);
        }
    }

    #[test]
    fn unit_zoom_is_idempotent() {
        let (mut p, clock) = presenter(deck(1, 600.0, false));
        run(&mut p, &clock, 4.5);
        p.on_zoom(0.5);
        p.tick(clock.advance(FRAME)).unwrap();
        let zoom = p.absolute_zoom();
        for _ in 0..100 {
            p.on_zoom(1.0);
            p.tick(clock.advance(FRAME)).unwrap();
            assert_eq!(p.absolute_zoom(), zoom);
        }
    }

    #[test]
    fn light_is_continuous_at_mode_switch() {
        let (mut p, clock) = presenter(deck(2, 10.0, false));
        let mut previous = p.tick(clock.now()).unwrap();
        let mut was_dynamic = p.is_lighting_dynamic();
        let mut switches = 0;
        while clock.now().as_secs() < 30.0 {
            let params = p.tick(clock.advance(FRAME)).unwrap();
            if p.is_lighting_dynamic() != was_dynamic {
                if p.is_lighting_dynamic() {
                    for axis in 0..3 {
                        let jump = (params.light_position[axis] - previous.light_position[axis]).abs();
                        assert!(jump < 1e-3, "light jumped by {jump}");
                    }
                }
                switches += 1;
                was_dynamic = p.is_lighting_dynamic();
            }
            previous = params;
        }
        assert!(switches >= 3);
    }

    #[test]
    fn gesture_collapses_remaining_time_to_grace() {
        let (mut p, clock) = presenter(deck(1, 60.0, false));
        run(&mut p, &clock, 5.0);
        assert_eq!(p.scheduled_flip(), Some(Timestamp::from_secs(120.0)));
        p.on_pan(1.0, 0.0);
        let now = clock.advance(FRAME);
        p.tick(now).unwrap();
        let flip = p.scheduled_flip().unwrap();
        assert!(flip.since(now) <= p.tuning().grace_seconds + 1e-9);
        run(&mut p, &clock, now.as_secs() + 2.9);
        assert_eq!(p.current_slide_index(), Some(0));
        run(&mut p, &clock, now.as_secs() + 3.05);
        assert_eq!(p.current_slide_index(), Some(1));
    }

    #[test]
    fn gesture_never_extends_a_nearly_done_slide() {
        let (mut p, clock) = presenter(deck(2, 10.0, false));
        run(&mut p, &clock, 19.0);
        let before = p.scheduled_flip();
        p.on_zoom(0.5);
        p.tick(clock.advance(FRAME)).unwrap();
        assert_eq!(p.scheduled_flip(), before);
    }

    #[test]
    fn corner_tap_restarts_from_beginning() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (mut p, clock) = presenter(deck(3, 5.0, false));
        run(&mut p, &clock, 17.0);
        assert_eq!(p.current_slide_index(), Some(2));

        p.on_double_tap(true);
        let params = p.tick(clock.advance(FRAME)).unwrap();
        assert_eq!(params.slide_index, Some(0));
        assert_eq!(params.camera_distance, p.tuning().depth_max);
        assert_eq!(p.absolute_zoom(), p.tuning().zoom_min);
        assert_eq!(params.pan_offset, [0.0, 0.0]);

        let restarted = clock.now().as_secs();
        run(&mut p, &clock, restarted + 10.05);
        assert_eq!(p.current_slide_index(), Some(1));
    }

    #[test]
    fn corner_tap_after_finish_is_ignored() {
        let (mut p, clock) = presenter(deck(1, 2.0, false));
        run(&mut p, &clock, 7.0);
        assert!(p.is_finished());
        p.on_double_tap(true);
        let params = p.tick(clock.advance(FRAME)).unwrap();
        assert!(p.is_finished());
        assert_eq!(params.slide_index, None);
    }

    #[test]
    fn view_reset_recenters_at_full_zoom() {
        let (mut p, clock) = presenter(deck(1, 600.0, false));
        run(&mut p, &clock, 4.5);
        p.on_pan(4.0, 2.0);
        p.on_zoom(0.2);
        p.tick(clock.advance(FRAME)).unwrap();
        p.on_double_tap(false);
        let params = p.tick(clock.advance(FRAME)).unwrap();
        assert_eq!(params.pan_offset, [0.0, 0.0]);
        assert_eq!(params.camera_distance, p.tuning().depth_min);
    }

    #[test]
    fn gestures_from_another_thread_keep_state_consistent() {
        let (mut p, clock) = presenter(deck(2, 1.0, false));
        let t = p.tuning().clone();
        let input = p.input_handle();
        let gestures = std::thread::spawn(move || {
            for i in 0..20_000u32 {
                input.on_zoom(if i % 2 == 0 { 1.7 } else { 0.6 });
                input.on_pan(0.3, -0.2);
                if i % 97 == 0 {
                    input.on_double_tap(i % 194 == 0);
                }
            }
        });

        let check = |p: &Presenter, params: &RenderParams| {
            assert!(p.absolute_zoom() >= t.zoom_min && p.absolute_zoom() <= t.zoom_max);
            assert!(params.camera_distance >= t.depth_min && params.camera_distance <= t.depth_max);
            assert!((0.0..=1.0).contains(&params.overexposure));
            assert!(params.pan_offset.iter().all(|v| v.is_finite()));
        };

        let mut ticks = 0;
        while !gestures.is_finished() || ticks < 1_000 {
            let params = p.tick(clock.advance(FRAME)).unwrap();
            check(&p, &params);
            ticks += 1;
        }
        gestures.join().unwrap();

        let deadline = clock.now().as_secs() + 60.0;
        while !p.is_finished() && clock.now().as_secs() < deadline {
            let params = p.tick(clock.advance(FRAME)).unwrap();
            check(&p, &params);
        }
        assert!(p.is_finished());
        assert_eq!(p.phase(), Phase::Finished);
    }

    #[test]
    fn unresolved_font_fails_at_startup() {
        let deck = SlideDeck::new(
            Slide::new("intro", "sans", 40),
            vec![Slide::new("a", "comic", 40)],
            5.0,
            false,
        );
        let result = Presenter::new(deck, ManualClock::new(), UniformMetrics::new(&["sans"]));
        assert!(matches!(
            result,
            Err(PresenterError::UnresolvedFont { ref font, size: 40, .. }) if font == "comic"
        ));
    }

    #[test]
    fn zero_slide_time_is_rejected() {
        let deck = SlideDeck::new(Slide::new("intro", "sans", 40), Vec::new(), 0.0, false);
        assert!(Presenter::new(deck, ManualClock::new(), UniformMetrics::new(&["sans"])).is_err());
    }

    /// Metrics that start failing once `broken` is set.
    struct BreakableMetrics {
        inner: UniformMetrics,
        broken: Arc<std::sync::atomic::AtomicBool>,
    }

    impl GlyphMetrics for BreakableMetrics {
        fn load(&mut self, font_name: &str, size: u32) -> std::result::Result<(), LoadError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(LoadError::UnsupportedSize(size));
            }
            self.inner.load(font_name, size)
        }

        fn advance_width(&self, ch: char) -> f32 {
            self.inner.advance_width(ch)
        }

        fn line_height(&self) -> f32 {
            self.inner.line_height()
        }
    }

    #[test]
    fn glyph_load_failure_at_flip_is_reported() {
        let broken = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let metrics = BreakableMetrics {
            inner: UniformMetrics::new(&["sans"]),
            broken: Arc::clone(&broken),
        };
        let clock = ManualClock::new();
        let mut p = Presenter::new(deck(1, 5.0, false), clock.clone(), metrics).unwrap();
        p.tick(clock.now()).unwrap();

        broken.store(true, Ordering::SeqCst);
        clock.set(Timestamp::from_secs(10.0));
        assert!(matches!(
            p.tick(clock.now()),
            Err(PresenterError::GlyphLoad { size: 40, .. })
        ));
        assert_eq!(p.current_slide_index(), Some(1));
        assert!(matches!(
            p.tick(clock.advance(FRAME)),
            Err(PresenterError::GlyphsUnavailable { .. })
        ));
    }

    #[test]
    fn resize_relayouts_text() {
        let (mut p, clock) = presenter(deck(1, 5.0, false));
        let wide = p.tick(clock.now()).unwrap();
        p.on_viewport_resize(720, 1280);
        let tall = p.tick(clock.advance(FRAME)).unwrap();
        assert!(tall.projection.height() > wide.projection.height());
        assert_eq!(tall.line_offsets(), vec![0.0]);
    }
}
