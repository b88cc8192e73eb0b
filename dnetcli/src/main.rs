use clap::Parser;
use colored::Colorize;
use dnetlib::Config;

use std::path::{Path, PathBuf};

/// Print a colored error message and exit with the given code.
macro_rules! fatal_error {
    ($code:expr, $($arg:tt)*) => {{
        eprintln!("{} {}", "ERROR:".bold().red(), format!($($arg)*));
        std::process::exit($code)
    }};
}

mod commands;
use commands::Command;

/// Distribution network evaluation: radial configurations and minimum loss.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    limits: Limits,

    #[command(subcommand)]
    command: Command,
}

/// Electrical limits shared by all commands that evaluate a network.
#[derive(clap::Args, Debug)]
pub struct Limits {
    /// YAML or JSON file overriding the default electrical limits.
    #[arg(long, global = true)]
    limits: Option<PathBuf>,
    /// Highest current allowed at a substation, in amperes.
    #[arg(long, global = true)]
    max_current: Option<f64>,
}

impl Limits {
    pub fn load(&self) -> Config {
        let mut config = match &self.limits {
            Some(path) => read_limits(path),
            None => Config::default(),
        };
        if let Some(max_current) = self.max_current {
            config.max_current = max_current;
        }
        log::debug!("Electrical limits: {:?}", config);
        config
    }
}

fn read_limits(path: &Path) -> Config {
    let content = match std::fs::read_to_string(path) {
        Ok(x) => x,
        Err(err) => fatal_error!(1, "Cannot read limits file: {}", err),
    };
    match serde_yaml::from_str(&content) {
        Ok(x) => x,
        Err(err) => fatal_error!(1, "Error while parsing limits: {}", err),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.limits.load();
    cli.command.run(config);
}
