use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

use gql_harness::config::{ConfigCommand, HarnessConfig};
use gql_harness::doctor::DoctorCommand;
use gql_harness::logging::init_logging;
use gql_harness::runner::{resolve_suites, SuiteRunner};
use gql_harness::suites::builtin_suites;

#[derive(Parser)]
#[command(name = "gqlh")]
#[command(author = "gql-harness contributors")]
#[command(version)]
#[command(about = "End-to-end test suites for a GraphQL API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, help = "Enable verbose output", global = true)]
    verbose: bool,

    #[arg(long, help = "Path to a JSON config file", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run test suites against the configured endpoint")]
    Run {
        #[arg(help = "Suites to run (default: all)")]
        suites: Vec<String>,

        #[arg(long, help = "Print the run summary as JSON")]
        json: bool,
    },

    #[command(about = "List the built-in suites and their tests")]
    List,

    #[command(about = "Show or edit the harness configuration")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    #[command(about = "Check the configuration and probe the endpoint")]
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    #[command(about = "Print the effective configuration with secrets masked")]
    Show,
    #[command(about = "Print the config file location")]
    Path,
    #[command(about = "Create or update the config file interactively")]
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run { suites, json } => {
            let config = HarnessConfig::load(config_path)?;
            run_suites(&config, &suites, json)?;
        }
        Commands::List => {
            for suite in builtin_suites() {
                println!("{} {}", suite.name().cyan().bold(), suite.description().dimmed());
                for name in suite.case_names() {
                    println!("  • {name}");
                }
            }
        }
        Commands::Config { action } => {
            let command = ConfigCommand::new(config_path)?;
            match action {
                ConfigAction::Show => command.show(&HarnessConfig::load(config_path)?)?,
                ConfigAction::Path => println!("{}", command.path().display()),
                ConfigAction::Init => {
                    let current = if command.path().exists() {
                        HarnessConfig::from_file(command.path())?
                    } else {
                        HarnessConfig::default()
                    };
                    command.init(&current)?;
                }
            }
        }
        Commands::Doctor => {
            let config = HarnessConfig::load(config_path)?;
            DoctorCommand::new(config, cli.verbose).execute()?;
        }
    }

    Ok(())
}

fn run_suites(config: &HarnessConfig, names: &[String], json: bool) -> Result<()> {
    let suites = resolve_suites(names)?;
    if !json {
        println!(
            "{} Running {} suite(s) against {}",
            "🚀".green(),
            suites.len(),
            config.endpoint.cyan()
        );
        println!();
    }

    let runner = SuiteRunner::from_config(config)?.show_progress(!json);
    let summary = runner.run_all(&suites);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.print();
    }

    if !summary.is_success() {
        bail!("{} test(s) failed", summary.failed());
    }
    Ok(())
}
