use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let (config, from_file) = match Config::load_from(&path) {
        Ok(config) => (config, true),
        Err(_) if !path.exists() => (Config::default(), false),
        Err(e) => return Err(e),
    };

    println!("{} {}", "Config file:".bold(), path.display());
    if !from_file {
        println!("{}", "(not created yet, showing defaults)".dimmed());
    }
    println!();

    let defaults = config.defaults.clone().unwrap_or_default();
    println!("{}", "defaults".cyan().bold());
    println!(
        "  deck:     {}",
        defaults
            .deck
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".dimmed().to_string())
    );
    println!("  windowed: {}", defaults.windowed.unwrap_or(false));
    println!(
        "  fps:      {}",
        defaults
            .fps
            .map(|f| f.to_string())
            .unwrap_or_else(|| "display rate".dimmed().to_string())
    );
    println!();

    let label = if config.tuning.is_some() {
        "tuning".cyan().bold()
    } else {
        "tuning (defaults)".cyan().bold()
    };
    println!("{label}");
    let tuning = config.tuning.unwrap_or_default();
    for line in serde_yaml::to_string(&tuning)?.lines() {
        println!("  {line}");
    }
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_default();
    config.set(key, value)?;
    let path = config.save()?;
    println!(
        "{} {key} = {value} ({})",
        "Saved".green().bold(),
        path.display()
    );
    Ok(())
}
