/// Commands that enumerate, optimize and evaluate configurations.
use super::*;

use dnetlib::network::Diagram;
use dnetlib::{Configuration, OptimizationResult};

fn print_configuration(network: &Network, config: &Configuration) {
    let closed = network.switch_names(config.closed_switches());
    println!("{:18}{}", "Closed:".bold(), closed.join(" "));
}

fn print_optimization_result(result: &OptimizationResult) {
    println!("{:30}{}", "Minimum Loss:".bold(), result.minimum_loss);
    println!(
        "{:30}{}",
        "Loss Without Root Sections:".bold(),
        result.loss_without_root_sections
    );
    println!(
        "{:30}{}",
        "Lower Bound of Minimum Loss:".bold(),
        result.lower_bound_of_minimum_loss
    );
    println!(
        "{:30}{}",
        "Open Switches:".bold(),
        result.open_switches.join(" ")
    );
    println!(
        "{:30}{}",
        "Closed Switches:".bold(),
        result.closed_switches.join(" ")
    );
}

impl Enumerate {
    pub fn run(self, config: Config) {
        let network = read_network(&self.network, config);
        let configs = if self.topologies {
            network.enumerate_topologies()
        } else {
            match network.enumerate() {
                Ok(x) => x,
                Err(err) => fatal_error!(1, "Error while enumerating configurations: {}", err),
            }
        };

        println!("{:18}{}", "Switches:".bold(), network.switches().len());
        println!("{:18}{}", "Sections:".bold(), network.sections().len());
        println!("{:18}{}", "Configurations:".bold(), configs.len());
        println!("{:18}{}", "Diagram Nodes:".bold(), configs.family().node_count());

        if let Some(count) = self.sample {
            for config in configs.rand_iter(rand::thread_rng()).take(count) {
                print_configuration(&network, &config);
            }
        }

        if let Some(path) = self.output {
            if let Err(err) = std::fs::write(&path, configs.dumps()) {
                fatal_error!(1, "Error while writing the diagram: {}", err);
            }
            println!(
                "{} Saved the diagram: {}",
                "SUCCESS!".bold().green(),
                path.display()
            );
        }
    }
}

impl Optimize {
    pub fn run(self, config: Config) {
        let network = read_network(&self.network, config);
        let result = match &self.diagram {
            Some(path) => {
                let text = match std::fs::read_to_string(path) {
                    Ok(x) => x,
                    Err(err) => fatal_error!(1, "Cannot read diagram: {}", err),
                };
                let diagram = match Diagram::parse(&text, network.switches().len()) {
                    Ok(x) => x,
                    Err(err) => fatal_error!(1, "Error while parsing diagram: {}", err),
                };
                network.optimize_diagram(&diagram)
            }
            None => match network.enumerate() {
                Ok(configs) => network.optimize(&configs),
                Err(err) => fatal_error!(1, "Error while enumerating configurations: {}", err),
            },
        };
        let result = match result {
            Ok(x) => x,
            Err(err) => fatal_error!(2, "Optimization failed: {}", err),
        };

        if self.json {
            match serde_json::to_string(&result) {
                Ok(json) => println!("{}", json),
                Err(err) => fatal_error!(1, "Error while converting to JSON: {}", err),
            }
        } else {
            print_optimization_result(&result);
        }
    }
}

impl Loss {
    pub fn run(self, config: Config) {
        let network = read_network(&self.network, config);
        let closed = match network.configuration(&self.closed) {
            Ok(x) => x,
            Err(err) => fatal_error!(1, "Invalid configuration: {}", err),
        };
        let (loss, lower_bound) = match network.loss_report(&closed) {
            Ok(x) => x,
            Err(err) => fatal_error!(2, "Cannot compute the loss: {}", err),
        };

        let mut feasible = true;
        for &root in network.root_sections() {
            match network.satisfies_electric_constraints(root, &closed) {
                Ok(ok) => feasible &= ok,
                Err(err) => fatal_error!(2, "Cannot check the electrical limits: {}", err),
            }
        }

        print_configuration(&network, &closed);
        println!("{:18}{}", "Loss:".bold(), loss);
        println!("{:18}{}", "Lower Bound:".bold(), lower_bound);
        if feasible {
            println!("{:18}{}", "Feasible:".bold(), "yes".green());
        } else {
            println!("{:18}{}", "Feasible:".bold(), "no".red());
        }
    }
}
