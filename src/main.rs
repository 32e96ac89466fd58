//! Stuntman command-line tool
//!
//! Assembles a persona registry the same way a host application would and
//! prints it, so persona files and peer servers can be checked without
//! starting the application.

mod cli;
mod version;

use clap::Parser;
use tracing::{debug, info};

use stuntman::config::{self, StuntmanConfig};
use stuntman::error::Result;
use stuntman::logging::{self, LogGuards};
use stuntman::persona::{Persona, PersonaRegistry};

use crate::cli::{Cli, Commands, ConfigSubcommand, OutputFormat};
use crate::version::BUILD_INFO;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Commands that do not need a registry
    match &cli.command {
        Commands::Version { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(&BUILD_INFO)?);
            } else {
                print!("{}", BUILD_INFO);
            }
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(subcommand, cli.config.as_deref());
        }
        _ => {}
    }

    let config = StuntmanConfig::load(cli.config.as_deref())?;

    // Held until exit so buffered file logs are flushed
    let _log_guards: LogGuards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;
    debug!(version = %BUILD_INFO.full_version(), "Starting stuntman");

    let mut registry = config.build_registry()?;

    match cli.command {
        Commands::List { format } => print_personas(&registry, format)?,
        Commands::Import { source, format } => {
            let before = registry.len();
            registry.add_personas_from_json(&source)?;
            info!(source = %source, added = registry.len() - before, "Imported personas");
            print_personas(&registry, format)?;
        }
        Commands::Fetch {
            base_url,
            strict,
            format,
        } => {
            if strict {
                registry.add_configuration_from_server(&base_url)?;
            } else {
                registry.try_add_configuration_from_server(&base_url);
            }
            print_personas(&registry, format)?;
        }
        Commands::Export { pretty } => {
            let json = registry.to_federation_json()?;
            if pretty {
                let value: serde_json::Value = serde_json::from_str(&json)?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", json);
            }
        }
        Commands::Version { .. } | Commands::Config { .. } => {}
    }

    Ok(())
}

fn handle_config_command(subcommand: &ConfigSubcommand, config_path: Option<&str>) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let cfg = StuntmanConfig::load(config_path)?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), *force)?;
            println!("Configuration file created: {}", written.display());
        }
        ConfigSubcommand::Validate => {
            let cfg = StuntmanConfig::load(config_path)?;
            // Inline personas are only checked once they are built
            for entry in &cfg.personas {
                entry.to_persona()?;
            }
            println!("Configuration is valid.");
        }
    }

    Ok(())
}

fn print_personas(registry: &PersonaRegistry, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let personas: Vec<&Persona> = registry.personas().collect();
            println!("{}", serde_json::to_string_pretty(&personas)?);
        }
        OutputFormat::Table => {
            if registry.is_empty() {
                println!("No personas configured.");
                return Ok(());
            }

            println!("{:<38} {:<24} {:<8} SOURCE", "ID", "NAME", "TOKEN");
            for persona in registry.personas() {
                println!(
                    "{:<38} {:<24} {:<8} {}",
                    persona.id(),
                    persona.name(),
                    if persona.access_token().is_some() { "yes" } else { "-" },
                    persona.source().unwrap_or("-")
                );
            }
            println!();
            println!("{} persona(s), sign-in at {}", registry.len(), registry.sign_in_uri());
        }
    }

    Ok(())
}
