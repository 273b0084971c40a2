//! Animation core of the flydeck kiosk presenter.
//!
//! A [`Presenter`] takes a [`SlideDeck`], a [`PresentationClock`] and a
//! [`GlyphMetrics`] provider. The host calls [`Presenter::tick`] once per
//! frame and paints the returned [`RenderParams`]; gestures go through an
//! [`InputGestureAdapter`] from any thread.

pub mod camera;
pub mod clock;
pub mod deck;
pub mod error;
pub mod input;
pub mod layout;
pub mod lighting;
pub mod presenter;
pub mod tuning;

pub use clock::{ManualClock, MonotonicClock, PresentationClock, Timestamp};
pub use deck::{Rgb, Slide, SlideCursor, SlideDeck};
pub use error::{LoadError, PresenterError, Result};
pub use input::{Gesture, InputGestureAdapter, is_corner_tap};
pub use layout::{GlyphMetrics, LineLayout, Projection, TextLayout, TextLayoutEngine, UniformMetrics};
pub use presenter::{Phase, Presenter, RenderParams, Stage};
pub use tuning::Tuning;
