mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use commands::Paths;
use config::{ConfigError, Constants};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Exit status for internal invariant violations (EX_SOFTWARE)
const EXIT_INTERNAL: u8 = 70;

/// A utility to manage a site-specific overlay containing customized
/// kernel-ng-util packages.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the kernelng configuration file
    #[clap(long = "config", env = "KERNELNG_CONF", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to portage's repos.conf
    #[clap(long = "repos-conf", value_name = "PATH")]
    repos_conf: Option<PathBuf>,

    /// Only report errors
    #[clap(short, long, conflicts_with_all = &["verbose", "debug"])]
    quiet: bool,

    /// Report progress (repeat for more detail)
    #[clap(short, long, parse(from_occurrences), conflicts_with = "debug")]
    verbose: usize,

    /// Report everything
    #[clap(long)]
    debug: bool,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Modify the kernel-ng-util configuration
    #[clap(subcommand)]
    Config(ConfigCommands),
    /// Print shell completions
    Completions {
        /// Shell to generate completions for
        #[clap(arg_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the built-in example configuration
    Example,
    /// Write the example configuration to the configuration file
    Init {
        /// Overwrite an existing configuration file
        #[clap(short, long)]
        force: bool,
    },
    /// Print the stored configuration
    Show,
    /// Print the value of a setting
    Get {
        /// Setting name
        key: String,
        /// Package section (global settings when omitted)
        #[clap(short, long)]
        section: Option<String>,
    },
    /// Change a setting and save the configuration
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
        /// Package section (global settings when omitted)
        #[clap(short, long)]
        section: Option<String>,
    },
    /// Revert a setting to its default (or remove it) and save
    Unset {
        /// Setting name
        key: String,
        /// Package section (global settings when omitted)
        #[clap(short, long)]
        section: Option<String>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let filter = match args.verbose {
        _ if args.debug => "debug",
        0 if args.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let constants = Constants::current();
    let paths = Paths {
        config: args.config.unwrap_or_else(|| constants.config_file()),
        repos_conf: args.repos_conf.unwrap_or_else(|| constants.repos_conf_file()),
    };

    let mut stdout = io::stdout().lock();

    // Execute command
    let result = match args.command {
        Commands::Config(command) => match command {
            ConfigCommands::Example => commands::cmd_example(&mut stdout),
            ConfigCommands::Init { force } => commands::cmd_init(&paths, force),
            ConfigCommands::Show => commands::cmd_show(&paths, &mut stdout),
            ConfigCommands::Get { key, section } => {
                commands::cmd_get(&paths, &key, section.as_deref(), &mut stdout)
            }
            ConfigCommands::Set {
                key,
                value,
                section,
            } => commands::cmd_set(&paths, &key, &value, section.as_deref()),
            ConfigCommands::Unset { key, section } => {
                commands::cmd_unset(&paths, &key, section.as_deref())
            }
        },
        Commands::Completions { shell } => {
            let mut command = Args::command();
            let name = constants.prog.clone();
            clap_complete::generate(shell, &mut command, name, &mut stdout);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let fatal = e
                .downcast_ref::<ConfigError>()
                .map_or(false, ConfigError::is_fatal);
            if fatal {
                error!("internal error: {:#}", e);
                ExitCode::from(EXIT_INTERNAL)
            } else {
                error!("{:#}", e);
                ExitCode::FAILURE
            }
        }
    }
}
