/// Failure reported by a [`GlyphMetrics`](crate::layout::GlyphMetrics) provider
/// when a font cannot be rasterized at the requested size.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("unknown font '{0}'")]
    UnknownFont(String),
    #[error("font size {0}px is not supported")]
    UnsupportedSize(u32),
}

#[derive(Debug, thiserror::Error)]
pub enum PresenterError {
    #[error("deck has no slides")]
    EmptyDeck,

    #[error("slide font '{font}' at {size}px cannot be resolved: {source}")]
    UnresolvedFont {
        font: String,
        size: u32,
        #[source]
        source: LoadError,
    },

    #[error("failed to load glyphs for '{font}' at {size}px: {source}")]
    GlyphLoad {
        font: String,
        size: u32,
        #[source]
        source: LoadError,
    },

    #[error("no glyph metrics loaded for font '{font}'")]
    GlyphsUnavailable { font: String },

    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("invalid color '{value}'")]
    InvalidColor { value: String },

    #[error("failed to parse deck: {0}")]
    DeckSyntax(#[from] serde_yaml::Error),
}

impl PresenterError {
    /// Whether the error is a startup configuration problem rather than a
    /// failure while the presentation is running.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            Self::GlyphLoad { .. } | Self::GlyphsUnavailable { .. }
        )
    }
}

pub type Result<T, E = PresenterError> = std::result::Result<T, E>;
