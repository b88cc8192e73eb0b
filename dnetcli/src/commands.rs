use super::*;

use dnetlib::Network;

mod evaluate;
pub use evaluate::*;

mod convert;
pub use convert::*;

/// All CLI commands available in this binary.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Count the feasible configurations of a network.
    #[command(alias = "e")]
    Enumerate(Enumerate),

    /// Find the feasible configuration with minimum loss.
    #[command(alias = "o")]
    Optimize(Optimize),

    /// Print the loss of a given configuration.
    #[command(alias = "l")]
    Loss(Loss),

    /// Convert a network in the Fukui-TEPCO format to YAML.
    Convert(Convert),
}

#[derive(clap::Args, Debug)]
pub struct Enumerate {
    /// Path to the YAML file containing the network.
    network: PathBuf,
    /// Write the decision diagram of the feasible configurations to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print this many distinct configurations drawn at random.
    #[arg(short, long)]
    sample: Option<usize>,
    /// Ignore the electrical limits and count every radial configuration.
    #[arg(short, long, default_value_t = false)]
    topologies: bool,
}

#[derive(clap::Args, Debug)]
pub struct Optimize {
    /// Path to the YAML file containing the network.
    network: PathBuf,
    /// Search this decision diagram instead of enumerating the feasible configurations.
    #[arg(short, long)]
    diagram: Option<PathBuf>,
    /// Print the results as JSON (Hint: redirect stdout)
    #[arg(short, long, default_value_t = false)]
    json: bool,
}

#[derive(clap::Args, Debug)]
pub struct Loss {
    /// Path to the YAML file containing the network.
    network: PathBuf,
    /// Names of the closed switches. Every other switch is open.
    closed: Vec<String>,
}

impl Command {
    pub fn run(self, config: Config) {
        match self {
            Command::Enumerate(args) => args.run(config),
            Command::Optimize(args) => args.run(config),
            Command::Loss(args) => args.run(config),
            Command::Convert(args) => args.run(),
        }
    }
}

fn read_network<P: AsRef<Path>>(path: P, config: Config) -> Network {
    let mut network = match Network::read_from_file(path) {
        Ok(x) => x,
        Err(err) => fatal_error!(1, "Cannot read network: {}", err),
    };
    network.set_config(config);
    network
}
