use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::Config;
use crate::metrics::family_for;

pub fn run(file: &Path) -> Result<()> {
    let deck = super::load_deck(file)?;
    let tuning = Config::load_or_default().tuning_for(&deck);
    tuning.validate()?;

    println!("{} {}", "Deck:".bold(), file.display());
    println!(
        "  {} slides ({} after the opening slide), {}s each",
        deck.len(),
        deck.slides().len(),
        deck.slide_time_seconds()
    );
    println!(
        "  run time {:.1}s, {}",
        deck.run_time_seconds(tuning.beginning_multiplier),
        if deck.keep_last_slide() {
            "holds the last slide"
        } else {
            "closes after the last slide"
        }
    );
    if deck.tuning().is_some() {
        println!("  {}", "uses its own tuning".dimmed());
    }

    let mut unknown = 0;
    for (index, slide) in deck.all_slides().iter().enumerate() {
        let marker = if family_for(&slide.font_name).is_some() {
            "ok".green()
        } else {
            unknown += 1;
            "unknown font".red()
        };
        println!(
            "  [{index:>2}] {:<32} {} {}px {}",
            slide.headline(),
            slide.font_name,
            slide.font_size,
            marker
        );
    }

    println!();
    if unknown > 0 {
        anyhow::bail!("{unknown} slide(s) use a font other than 'sans' or 'mono'");
    }
    println!("{}", "Deck is valid.".green());
    Ok(())
}
