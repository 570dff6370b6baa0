use std::path::{Path, PathBuf};

use clap::{value_parser, Arg, ArgAction, ArgMatches, ColorChoice, Command};

/// Default configuration file, looked up in the working directory
const DEFAULT_RCFILE: &str = "tecs.json";

pub struct Cli {
    /// Arguments passed by user
    pub matches: ArgMatches,
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

impl Cli {
    /// Build new command line interface
    pub fn new() -> Self {
        let cmd = Command::new("tecs")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Slant TEC reconstruction from RINEX files")
            .long_about(
                "tecs reconstructs the slant total electron content along
the line of sight of every satellite, from dual frequency
observations and broadcast navigation data.
Every observation file found in the configured directories
is processed, one output file is produced per satellite.",
            )
            .color(ColorChoice::Always)
            .arg(
                Arg::new("rcfile")
                    .short('c')
                    .long("rcfile")
                    .value_name("FILE")
                    .value_parser(value_parser!(PathBuf))
                    .help("Configuration file (JSON). Defaults to ./tecs.json.")
                    .long_help(
                        "Configuration file (JSON). Relative directories it defines
are relative to the configuration file itself.
Every key is optional, for example:
{
    \"obs_dir\": [\"./obs\"],
    \"nav_dir\": [\"./nav\"],
    \"out_dir\": \"./out\",
    \"rec_fields\": \"datetime, el, az, tec.l1l2, validity\"
}",
                    ),
            )
            .arg(
                Arg::new("quiet")
                    .short('q')
                    .long("quiet")
                    .action(ArgAction::SetTrue)
                    .help("Do not print the epochs being processed."),
            );
        Self {
            matches: cmd.get_matches(),
        }
    }
    /// Configuration file path
    pub fn rcfile(&self) -> PathBuf {
        self.matches
            .get_one::<PathBuf>("rcfile")
            .cloned()
            .unwrap_or_else(|| Path::new(DEFAULT_RCFILE).to_path_buf())
    }
    pub fn quiet(&self) -> bool {
        self.matches.get_flag("quiet")
    }
}
