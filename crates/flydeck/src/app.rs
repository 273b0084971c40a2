use eframe::egui;
use flydeck_core::{
    MonotonicClock, PresentationClock, Presenter, PresenterError, RenderParams, SlideDeck, Tuning,
};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::metrics::{EguiMetrics, family_for};

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(4, 6, 14);
const ESC_QUIT_WINDOW: f32 = 1.0;
/// Wheel points per e-fold of zoom.
const WHEEL_ZOOM_SCALE: f32 = 200.0;
const MIN_DRAWN_FONT_SIZE: f32 = 0.5;

type SharedError = Rc<RefCell<Option<PresenterError>>>;

struct KioskApp {
    deck: SlideDeck,
    tuning: Tuning,
    clock: MonotonicClock,
    presenter: Option<Presenter>,
    frame_interval: Option<Duration>,
    last_esc: Option<Instant>,
    last_size: (u32, u32),
    error: SharedError,
}

impl KioskApp {
    fn new(deck: SlideDeck, tuning: Tuning, fps: Option<u32>, error: SharedError) -> Self {
        Self {
            deck,
            tuning,
            clock: MonotonicClock::new(),
            presenter: None,
            frame_interval: fps
                .filter(|&fps| fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / fps as f64)),
            last_esc: None,
            last_size: (0, 0),
            error,
        }
    }

    /// Build the presenter on the first frame, once egui's fonts exist.
    fn ensure_presenter(&mut self, ctx: &egui::Context) -> Option<&mut Presenter> {
        if self.presenter.is_none() {
            let result = Presenter::with_tuning(
                self.deck.clone(),
                self.clock.clone(),
                EguiMetrics::new(ctx),
                self.tuning.clone(),
            );
            match result {
                Ok(mut presenter) => {
                    let close_ctx = ctx.clone();
                    presenter.on_finished(move || {
                        close_ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    });
                    self.presenter = Some(presenter);
                }
                Err(e) => {
                    self.fail(ctx, e);
                    return None;
                }
            }
        }
        self.presenter.as_mut()
    }

    fn fail(&mut self, ctx: &egui::Context, e: PresenterError) {
        log::error!("{e}");
        self.error.borrow_mut().get_or_insert(e);
        self.presenter = None;
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let mut close = false;
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Q) {
                close = true;
                return;
            }
            if i.key_pressed(egui::Key::Escape) {
                if let Some(last) = self.last_esc {
                    if last.elapsed().as_secs_f32() < ESC_QUIT_WINDOW {
                        close = true;
                        return;
                    }
                }
                self.last_esc = Some(Instant::now());
            }
        });
        if close {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn handle_pointer(&mut self, ctx: &egui::Context, rect: egui::Rect) {
        let Some(presenter) = self.presenter.as_ref() else {
            return;
        };
        let input = presenter.input_handle();

        let size = (rect.width().round() as u32, rect.height().round() as u32);
        if size != self.last_size {
            input.on_viewport_resize(size.0, size.1);
            self.last_size = size;
        }

        ctx.input(|i| {
            if i.pointer.button_double_clicked(egui::PointerButton::Primary) {
                if let Some(pos) = i.pointer.interact_pos() {
                    let local = pos - rect.min;
                    input.on_double_tap_at(local.x, local.y);
                }
                return;
            }
            if i.pointer.primary_down() {
                let delta = i.pointer.delta();
                if delta != egui::Vec2::ZERO {
                    input.on_drag(delta.x, delta.y);
                }
            }
            let zoom = i.zoom_delta();
            if zoom != 1.0 {
                input.on_zoom(zoom);
            }
            let scroll = i.smooth_scroll_delta.y;
            if scroll != 0.0 {
                input.on_zoom((scroll / WHEEL_ZOOM_SCALE).exp());
            }
        });
    }
}

impl eframe::App for KioskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keys(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(BACKGROUND).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                ui.painter().rect_filled(rect, 0.0, BACKGROUND);

                if self.ensure_presenter(ctx).is_none() {
                    return;
                }
                self.handle_pointer(ctx, rect);

                let now = self.clock.now();
                let Some(presenter) = self.presenter.as_mut() else {
                    return;
                };
                match presenter.tick(now) {
                    Ok(params) => {
                        let slide = params
                            .slide_index
                            .and_then(|index| presenter.deck().get(index))
                            .cloned();
                        if let Some(slide) = slide {
                            draw_frame(ui, rect, &params, &slide.font_name, slide.font_size);
                        }
                    }
                    Err(e) => self.fail(ctx, e),
                }
            });

        match self.frame_interval {
            Some(interval) => ctx.request_repaint_after(interval),
            None => ctx.request_repaint(),
        }
    }
}

/// Screen points per world unit at the near plane.
fn points_per_unit(rect: egui::Rect, params: &RenderParams) -> f32 {
    let width = params.projection.width();
    if width > 0.0 {
        rect.width() / width
    } else {
        0.0
    }
}

fn draw_frame(ui: &egui::Ui, rect: egui::Rect, params: &RenderParams, font_name: &str, font_size: u32) {
    let Some(family) = family_for(font_name) else {
        return;
    };
    let perspective = params.projection.perspective(params.camera_distance);
    let unit = points_per_unit(rect, params) * perspective;
    let center = rect.center();
    let [pan_x, pan_y] = params.pan_offset;
    let origin = center + egui::vec2(pan_x * unit, -pan_y * unit);

    draw_light(ui, rect, params, unit);

    // Lambert term for a flat face lit from (x, 0, 1).
    let [light_x, _, light_z] = params.light_position;
    let shade = light_z / (light_x * light_x + light_z * light_z).sqrt();
    let shade = 0.55 + 0.45 * shade;
    let shade = shade + (1.0 - shade) * params.overexposure;
    let [r, g, b] = params.color.map(|c| ((c * shade).clamp(0.0, 1.0) * 255.0) as u8);
    let color = egui::Color32::from_rgba_unmultiplied(r, g, b, (params.alpha * 255.0) as u8);

    let glyph_to_points = params.text_scale * unit;
    let size = font_size as f32 * glyph_to_points;
    if size < MIN_DRAWN_FONT_SIZE {
        return;
    }
    let font = egui::FontId::new(size, family);
    for line in &params.lines {
        let galley = ui.painter().layout_no_wrap(line.text.clone(), font.clone(), color);
        let line_center = origin + egui::vec2(0.0, -line.offset_y * glyph_to_points);
        let pos = line_center - galley.rect.size() / 2.0;
        ui.painter().galley(pos, galley, color);
    }
}

fn draw_light(ui: &egui::Ui, rect: egui::Rect, params: &RenderParams, unit: f32) {
    let [light_x, light_y, _] = params.light_position;
    let pos = rect.center() + egui::vec2(light_x * unit, -light_y * unit);
    let radius = rect.height() * 0.45;
    // A few stacked translucent discs stand in for a radial falloff.
    for step in 1..=4 {
        let t = step as f32 / 4.0;
        let alpha = (6.0 * params.alpha) as u8;
        ui.painter()
            .circle_filled(pos, radius * t, egui::Color32::from_white_alpha(alpha));
    }
}

pub fn run(file: PathBuf, windowed: bool, fps: Option<u32>, config: &Config) -> anyhow::Result<()> {
    let deck = crate::commands::load_deck(&file)?;
    let tuning = config.tuning_for(&deck);
    tuning.validate()?;

    for slide in deck.all_slides() {
        if family_for(&slide.font_name).is_none() {
            anyhow::bail!(
                "Font '{}' is not available. Use 'sans' or 'mono'.",
                slide.font_name
            );
        }
    }

    let title = format!(
        "flydeck - {}",
        file.file_name().unwrap_or_default().to_string_lossy()
    );
    let viewport = if windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    };
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    log::info!("presenting {} ({} slides)", file.display(), deck.len());
    let error: SharedError = Rc::new(RefCell::new(None));
    let app_error = Rc::clone(&error);
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(KioskApp::new(deck, tuning, fps, app_error)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    match error.borrow_mut().take() {
        Some(e) => Err(anyhow::Error::new(e).context("Presentation stopped")),
        None => Ok(()),
    }
}
