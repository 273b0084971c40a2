use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{PresenterError, Result};
use crate::tuning::Tuning;

/// Opaque RGB text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components as linear `[0, 1]` floats.
    pub fn to_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

impl FromStr for Rgb {
    type Err = PresenterError;

    fn from_str(value: &str) -> Result<Self> {
        let color = csscolorparser::parse(value.trim()).map_err(|_| PresenterError::InvalidColor {
            value: value.to_string(),
        })?;
        let [r, g, b, _] = color.to_rgba8();
        Ok(Self { r, g, b })
    }
}

/// One unit of presented text.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub text: String,
    pub font_name: String,
    pub font_size: u32,
    pub font_color: Rgb,
}

impl Slide {
    pub fn new(text: impl Into<String>, font_name: impl Into<String>, font_size: u32) -> Self {
        Self {
            text: text.into(),
            font_name: font_name.into(),
            font_size,
            font_color: Rgb::WHITE,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.font_color = color;
        self
    }

    /// First line of the text, for log messages.
    pub fn headline(&self) -> &str {
        self.text.lines().next().unwrap_or_default()
    }
}

/// Ordered slides plus deck-wide timing.
///
/// Index 0 is the opening ("beginning") slide. Identity is positional, so a
/// regular slide with the same content as the opening one is still a regular
/// slide.
#[derive(Debug, Clone)]
pub struct SlideDeck {
    slides: Arc<[Slide]>,
    slide_time_seconds: f64,
    keep_last_slide: bool,
    tuning: Option<Tuning>,
}

impl SlideDeck {
    pub fn new(
        beginning: Slide,
        slides: impl IntoIterator<Item = Slide>,
        slide_time_seconds: f64,
        keep_last_slide: bool,
    ) -> Self {
        let all: Vec<Slide> = std::iter::once(beginning).chain(slides).collect();
        Self {
            slides: all.into(),
            slide_time_seconds,
            keep_last_slide,
            tuning: None,
        }
    }

    /// Build from a full slide list whose first entry is the opening slide.
    pub fn from_slides(
        slides: Vec<Slide>,
        slide_time_seconds: f64,
        keep_last_slide: bool,
    ) -> Result<Self> {
        if slides.is_empty() {
            return Err(PresenterError::EmptyDeck);
        }
        Ok(Self {
            slides: slides.into(),
            slide_time_seconds,
            keep_last_slide,
            tuning: None,
        })
    }

    pub fn from_yaml(source: &str) -> Result<Self> {
        let file: DeckFile = serde_yaml::from_str(source)?;
        file.into_deck()
    }

    pub fn beginning(&self) -> &Slide {
        &self.slides[0]
    }

    /// The regular slides, without the opening one.
    pub fn slides(&self) -> &[Slide] {
        &self.slides[1..]
    }

    pub fn all_slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slide_time_seconds(&self) -> f64 {
        self.slide_time_seconds
    }

    pub fn keep_last_slide(&self) -> bool {
        self.keep_last_slide
    }

    /// Tuning overrides carried by the deck file, if any.
    pub fn tuning(&self) -> Option<&Tuning> {
        self.tuning.as_ref()
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    /// Total dwell time of one pass through the deck, ignoring gestures.
    pub fn run_time_seconds(&self, beginning_multiplier: f64) -> f64 {
        self.slide_time_seconds * (beginning_multiplier + self.slides().len() as f64)
    }

    pub fn cursor(&self) -> SlideCursor {
        SlideCursor {
            slides: Arc::clone(&self.slides),
            position: 1,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.slides.is_empty() {
            return Err(PresenterError::EmptyDeck);
        }
        if self.slide_time_seconds.is_nan() || self.slide_time_seconds <= 0.0 {
            return Err(PresenterError::InvalidTuning(
                "slide_time must be positive".to_string(),
            ));
        }
        if let Some(tuning) = &self.tuning {
            tuning.validate()?;
        }
        Ok(())
    }
}

/// Restartable position into a deck's regular slides.
///
/// The opening slide is shown separately, so the cursor starts (and resets)
/// just past it. Callers synchronize access; the presenter keeps it under
/// the same lock as the restart request.
#[derive(Debug, Clone)]
pub struct SlideCursor {
    slides: Arc<[Slide]>,
    position: usize,
}

impl SlideCursor {
    /// Next slide and its deck index, or `None` once exhausted.
    pub fn advance(&mut self) -> Option<(usize, Slide)> {
        let slide = self.slides.get(self.position)?.clone();
        let index = self.position;
        self.position += 1;
        Some((index, slide))
    }

    pub fn has_next(&self) -> bool {
        self.position < self.slides.len()
    }

    pub fn reset(&mut self) {
        self.position = 1;
    }

    /// Deck index the next `advance` will return.
    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeckFile {
    settings: DeckSettings,
    beginning: SlideEntry,
    #[serde(default)]
    slides: Vec<SlideEntry>,
    #[serde(default)]
    tuning: Option<Tuning>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeckSettings {
    slide_time: f64,
    #[serde(default)]
    keep_last_slide: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SlideEntry {
    text: String,
    font: FontEntry,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FontEntry {
    name: String,
    size: u32,
    #[serde(default = "default_color")]
    color: String,
}

fn default_color() -> String {
    "#ffffff".to_string()
}

impl SlideEntry {
    fn into_slide(self) -> Result<Slide> {
        let color = self.font.color.parse()?;
        Ok(Slide::new(self.text, self.font.name, self.font.size).with_color(color))
    }
}

impl DeckFile {
    fn into_deck(self) -> Result<SlideDeck> {
        let beginning = self.beginning.into_slide()?;
        let slides = self
            .slides
            .into_iter()
            .map(SlideEntry::into_slide)
            .collect::<Result<Vec<_>>>()?;
        let mut deck = SlideDeck::new(
            beginning,
            slides,
            self.settings.slide_time,
            self.settings.keep_last_slide,
        );
        deck.tuning = self.tuning;
        deck.validate()?;
        Ok(deck)
    }
}
