pub mod check;
pub mod completion;
pub mod config;
pub mod simulate;

use anyhow::{Context, Result};
use flydeck_core::SlideDeck;
use std::path::Path;

/// Read and validate a deck file.
pub fn load_deck(file: &Path) -> Result<SlideDeck> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    SlideDeck::from_yaml(&source).with_context(|| format!("Invalid deck {}", file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_deck_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.yaml");
        std::fs::write(
            &path,
            "settings: { slide_time: 4 }\nbeginning: { text: Hi, font: { name: sans, size: 40 } }\n",
        )
        .unwrap();
        let deck = load_deck(&path).unwrap();
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.slide_time_seconds(), 4.0);
    }

    #[test]
    fn reports_missing_and_broken_decks() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_deck(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(missing.to_string().contains("File not found"));

        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "settings: [").unwrap();
        let broken = load_deck(&path).unwrap_err();
        assert!(broken.to_string().contains("Invalid deck"));
    }
}
