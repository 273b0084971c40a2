//! Text placement for the active slide.
//!
//! Layout works in glyph units (the font's pixel metrics) and produces a
//! single uniform scale that maps them into world units. World space is
//! y-up with the text block centered on the origin; lines are drawn
//! center-anchored, so only vertical offsets are computed here.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::LoadError;
use crate::tuning::Tuning;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("line break pattern is valid"));

/// Per-character metrics for the active font at the active size.
///
/// Implemented by the host's font system; `load` selects which font the
/// other two methods describe.
pub trait GlyphMetrics {
    fn load(&mut self, font_name: &str, size: u32) -> Result<(), LoadError>;
    fn advance_width(&self, ch: char) -> f32;
    fn line_height(&self) -> f32;
}

/// Metrics where every glyph has the same advance, proportional to the font
/// size. Used by the headless simulator and tests.
#[derive(Debug, Clone)]
pub struct UniformMetrics {
    known_fonts: Vec<String>,
    advance_ratio: f32,
    line_ratio: f32,
    size: u32,
    /// Exact overrides keyed by font name, used instead of the ratios.
    fixed: HashMap<String, (f32, f32)>,
    active: Option<String>,
}

impl UniformMetrics {
    pub fn new(known_fonts: &[&str]) -> Self {
        Self {
            known_fonts: known_fonts.iter().map(|f| f.to_string()).collect(),
            advance_ratio: 0.6,
            line_ratio: 1.2,
            size: 0,
            fixed: HashMap::new(),
            active: None,
        }
    }

    /// Register a font whose advance and line height ignore the size.
    pub fn with_fixed(mut self, font_name: &str, advance: f32, line_height: f32) -> Self {
        self.known_fonts.push(font_name.to_string());
        self.fixed
            .insert(font_name.to_string(), (advance, line_height));
        self
    }

    fn fixed_metrics(&self) -> Option<(f32, f32)> {
        self.active.as_ref().and_then(|f| self.fixed.get(f)).copied()
    }
}

impl GlyphMetrics for UniformMetrics {
    fn load(&mut self, font_name: &str, size: u32) -> Result<(), LoadError> {
        if !self.known_fonts.iter().any(|f| f == font_name) {
            return Err(LoadError::UnknownFont(font_name.to_string()));
        }
        if size == 0 {
            return Err(LoadError::UnsupportedSize(size));
        }
        self.active = Some(font_name.to_string());
        self.size = size;
        Ok(())
    }

    fn advance_width(&self, _ch: char) -> f32 {
        match self.fixed_metrics() {
            Some((advance, _)) => advance,
            None => self.size as f32 * self.advance_ratio,
        }
    }

    fn line_height(&self) -> f32 {
        match self.fixed_metrics() {
            Some((_, line_height)) => line_height,
            None => self.size as f32 * self.line_ratio,
        }
    }
}

/// Symmetric perspective frustum for the current viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
}

impl Projection {
    pub fn from_viewport(width: u32, height: u32, tuning: &Tuning) -> Self {
        let ratio = if width == 0 || height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        let mut top = tuning.projection_size / 2.0;
        if ratio < 1.0 {
            top /= ratio;
        }
        let bottom = -top;
        Self {
            left: ratio * bottom,
            right: ratio * top,
            bottom,
            top,
            near: tuning.near_plane,
        }
    }

    /// Width of the frustum at the near plane.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the frustum at the near plane.
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// How much larger than the near plane an object at `distance` appears.
    pub fn perspective(&self, distance: f32) -> f32 {
        self.near / distance
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub text: String,
    /// Sum of glyph advances, in glyph units.
    pub width: f32,
    /// Center of the line relative to the block center, in glyph units, y-up.
    pub offset_y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Glyph units to world units.
    pub scale: f32,
    pub line_height: f32,
    pub block_height: f32,
    pub lines: Vec<LineLayout>,
}

/// Splits on any newline sequence. Trailing empty lines are dropped, so
/// `"HELLO\n"` is one line, but at least one line is always returned.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = LINE_BREAK.split(text).collect();
    while lines.len() > 1 && lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// Fits slide text into the projected viewport.
#[derive(Debug, Clone)]
pub struct TextLayoutEngine {
    margin: f32,
    interline_fraction: f32,
}

impl TextLayoutEngine {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            margin: tuning.layout_margin,
            interline_fraction: tuning.interline_fraction,
        }
    }

    /// Lay out `text` for a viewport of `projected_width` x `projected_height`
    /// world units. The first text line is the topmost.
    pub fn layout(
        &self,
        text: &str,
        metrics: &dyn GlyphMetrics,
        projected_width: f32,
        projected_height: f32,
    ) -> TextLayout {
        let raw_lines = split_lines(text);
        let line_height = metrics.line_height();
        let gap = line_height * self.interline_fraction;
        let count = raw_lines.len();

        let widths: Vec<f32> = raw_lines
            .iter()
            .map(|line| line.chars().map(|ch| metrics.advance_width(ch)).sum())
            .collect();
        let max_width = widths.iter().copied().fold(0.0_f32, f32::max);
        let block_height = count as f32 * line_height + (count as f32 - 1.0) * gap;

        let fit_width = if max_width > 0.0 {
            self.margin * projected_width / max_width
        } else {
            f32::INFINITY
        };
        let fit_height = if block_height > 0.0 {
            self.margin * projected_height / block_height
        } else {
            f32::INFINITY
        };
        let scale = fit_width.min(fit_height);
        let scale = if scale.is_finite() { scale } else { 0.0 };

        let lines = raw_lines
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(k, (line, width))| {
                // Offsets grow upward, so the first line takes the highest slot.
                let i = (count - 1 - k) as f32;
                LineLayout {
                    text: line.to_string(),
                    width,
                    offset_y: -block_height / 2.0 + line_height / 2.0 + i * (line_height + gap),
                }
            })
            .collect();

        TextLayout {
            scale,
            line_height,
            block_height,
            lines,
        }
    }
}
