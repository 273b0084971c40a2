use anyhow::Result;
use colored::Colorize;
use flydeck_core::{ManualClock, Phase, Presenter, SlideDeck, Timestamp, Tuning, UniformMetrics};
use std::path::Path;

use crate::config::Config;

/// Font names the kiosk window can draw.
const KNOWN_FONTS: &[&str] = &["sans", "sans-serif", "proportional", "mono", "monospace"];
const SIMULATED_VIEWPORT: (u32, u32) = (1920, 1080);

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Flip { at: f64, index: usize },
    Holding { at: f64 },
    Finished { at: f64 },
    TimedOut { at: f64 },
}

pub fn run(file: &Path, fps: u32, max_seconds: f64) -> Result<()> {
    let deck = super::load_deck(file)?;
    let tuning = Config::load_or_default().tuning_for(&deck);

    for event in simulate(&deck, tuning, fps, max_seconds)? {
        match event {
            Event::Flip { at, index } => {
                let headline = deck.get(index).map(|s| s.headline()).unwrap_or_default();
                println!("{:>9.2}s  {} {index:>2}  {headline}", at, "slide".cyan());
            }
            Event::Holding { at } => {
                println!("{:>9.2}s  {}", at, "holding last slide".yellow());
            }
            Event::Finished { at } => {
                println!("{:>9.2}s  {}", at, "finished".green().bold());
            }
            Event::TimedOut { at } => {
                println!("{:>9.2}s  {}", at, "stopped (--max-seconds reached)".yellow());
            }
        }
    }
    Ok(())
}

/// Drive the presenter frame by frame on a manual clock.
pub fn simulate(deck: &SlideDeck, tuning: Tuning, fps: u32, max_seconds: f64) -> Result<Vec<Event>> {
    if fps == 0 {
        anyhow::bail!("fps must be at least 1");
    }
    let frame = 1.0 / fps as f64;
    let clock = ManualClock::new();
    let metrics = UniformMetrics::new(KNOWN_FONTS);
    let mut presenter = Presenter::with_tuning(deck.clone(), clock.clone(), metrics, tuning)?;
    presenter.on_viewport_resize(SIMULATED_VIEWPORT.0, SIMULATED_VIEWPORT.1);

    let mut events = Vec::new();
    let mut shown = None;
    let mut frames: u64 = 0;
    loop {
        // Multiply rather than accumulate so long runs do not drift.
        let now = Timestamp::from_secs(frames as f64 * frame);
        clock.set(now);
        let params = presenter.tick(now)?;
        let at = now.as_secs();

        if params.slide_index.is_some() && params.slide_index != shown {
            if let Some(index) = params.slide_index {
                events.push(Event::Flip { at, index });
            }
        }
        shown = params.slide_index.or(shown);

        match presenter.phase() {
            Phase::Finished => {
                events.push(Event::Finished { at });
                break;
            }
            Phase::Holding => {
                events.push(Event::Holding { at });
                break;
            }
            _ => {}
        }
        if at >= max_seconds {
            events.push(Event::TimedOut { at });
            break;
        }
        frames += 1;
    }
    log::debug!("simulated {frames} frames");
    Ok(events)
}
