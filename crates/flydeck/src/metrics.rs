use eframe::egui;
use flydeck_core::{GlyphMetrics, LoadError};

/// Largest font size egui is asked to rasterize for measurement.
const MAX_FONT_SIZE: u32 = 1024;

/// Maps a deck font name onto one of egui's built-in families.
pub fn family_for(font_name: &str) -> Option<egui::FontFamily> {
    match font_name.to_ascii_lowercase().as_str() {
        "sans" | "proportional" | "sans-serif" => Some(egui::FontFamily::Proportional),
        "mono" | "monospace" => Some(egui::FontFamily::Monospace),
        _ => None,
    }
}

/// Glyph metrics measured with egui's font system.
pub struct EguiMetrics {
    painter: egui::Painter,
    active: Option<egui::FontId>,
}

impl EguiMetrics {
    pub fn new(ctx: &egui::Context) -> Self {
        Self {
            painter: egui::Painter::new(
                ctx.clone(),
                egui::LayerId::background(),
                egui::Rect::EVERYTHING,
            ),
            active: None,
        }
    }

    fn measure(&self, text: &str) -> egui::Vec2 {
        match &self.active {
            Some(font) => self
                .painter
                .layout_no_wrap(text.to_string(), font.clone(), egui::Color32::WHITE)
                .rect
                .size(),
            None => egui::Vec2::ZERO,
        }
    }
}

impl GlyphMetrics for EguiMetrics {
    fn load(&mut self, font_name: &str, size: u32) -> Result<(), LoadError> {
        let family =
            family_for(font_name).ok_or_else(|| LoadError::UnknownFont(font_name.to_string()))?;
        if size == 0 || size > MAX_FONT_SIZE {
            return Err(LoadError::UnsupportedSize(size));
        }
        self.active = Some(egui::FontId::new(size as f32, family));
        Ok(())
    }

    fn advance_width(&self, ch: char) -> f32 {
        self.measure(ch.encode_utf8(&mut [0; 4])).x
    }

    fn line_height(&self) -> f32 {
        self.measure("M").y
    }
}
