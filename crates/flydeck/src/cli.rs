use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flydeck")]
#[command(author, version, about)]
#[command(long_about = "A kiosk slideshow that flies text slides through a lit 3-D scene.\n\n\
    Slides come from a YAML deck file and advance on their own.\n\n\
    Examples:\n  \
    flydeck deck.yaml              Run the deck fullscreen\n  \
    flydeck deck.yaml --windowed   Run in a window\n  \
    flydeck check deck.yaml        Validate a deck\n  \
    flydeck simulate deck.yaml     Print the slide timeline without a window")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Deck file to present
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Launch in a window instead of fullscreen
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Frame rate cap for the kiosk window
    #[arg(long, global = false)]
    pub fps: Option<u32>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a deck file and print a summary
    Check {
        /// Deck file to validate
        file: PathBuf,
    },

    /// Run a deck headlessly and print every slide flip
    Simulate {
        /// Deck file to simulate
        file: PathBuf,

        /// Simulated frames per second
        #[arg(long, default_value = "60")]
        fps: u32,

        /// Stop after this many simulated seconds
        #[arg(long, default_value = "3600")]
        max_seconds: f64,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. defaults.deck, defaults.windowed, defaults.fps, tuning.grace_seconds)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Check { file }) => crate::commands::check::run(&file),
            Some(Commands::Simulate {
                file,
                fps,
                max_seconds,
            }) => crate::commands::simulate::run(&file, fps, max_seconds),
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                println!("flydeck {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => {
                let config = crate::config::Config::load_or_default();
                let file = self.file.or_else(|| config.default_deck());
                if let Some(file) = file {
                    if !file.exists() {
                        anyhow::bail!("File not found: {}", file.display());
                    }
                    let windowed = self.windowed || config.default_windowed();
                    let fps = self.fps.or_else(|| config.default_fps());
                    crate::app::run(file, windowed, fps, &config)
                } else {
                    use clap::CommandFactory;
                    let mut cmd = Self::command();
                    cmd.print_help()?;
                    println!();
                    Ok(())
                }
            }
        }
    }
}
