use super::*;

use std::io::Write;

#[derive(clap::Args, Debug)]
pub struct Convert {
    /// Directory containing the Fukui-TEPCO files.
    dir: PathBuf,
    /// Path to the YAML file that will be created. Printed to stdout if omitted.
    output: Option<PathBuf>,
}

impl Convert {
    pub fn run(self) {
        let Convert { dir, output } = self;

        if let Some(path) = &output {
            if path.exists() {
                fatal_error!(1, "Output file already exists!");
            }
        }

        let document = match dnetlib::io::fukui_tepco::convert_dir(&dir) {
            Ok(x) => x,
            Err(err) => fatal_error!(1, "Error while converting the network: {}", err),
        };
        let yaml = match document.to_yaml() {
            Ok(x) => x,
            Err(err) => fatal_error!(1, "Error while converting to YAML: {}", err),
        };

        let Some(path) = output else {
            print!("{}", yaml);
            return;
        };

        let mut file = match std::fs::File::options()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(err) => fatal_error!(1, "Error while opening the YAML file: {}", err),
        };

        if let Err(err) = file.write_all(yaml.as_bytes()) {
            fatal_error!(1, "Error while writing the YAML file: {}", err);
        }

        drop(file);

        println!(
            "{} Saved the YAML file: {}",
            "SUCCESS!".bold().green(),
            path.display()
        );
    }
}
