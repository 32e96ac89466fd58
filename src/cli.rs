//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the stuntman tool.

use clap::{Parser, Subcommand, ValueEnum};

/// Stuntman - fake identities for testing authenticated HTTP code
///
/// Builds a persona registry from configuration, files, and peer Stuntman
/// servers, then lists or exports it.
#[derive(Parser, Debug)]
#[command(name = "stuntman")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, env = "STUNTMAN_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for persona listings
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List personas from the configured sources
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Add personas from a JSON file or URL on top of the configured sources
    Import {
        /// Absolute path, file:// URL, or http(s):// URL
        source: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Add personas served by another Stuntman instance
    Fetch {
        /// Base URL of the peer application (e.g. http://localhost:5000)
        base_url: String,

        /// Fail instead of warning when the peer cannot be read
        #[arg(long)]
        strict: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Print the registry as a federation document
    Export {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version and build information
    Version {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show,

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_defaults() {
        let cli = Cli::parse_from(["stuntman", "list"]);
        match cli.command {
            Commands::List { format } => assert_eq!(format, OutputFormat::Table),
            _ => panic!("Expected List command"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from(["stuntman", "list", "--config", "/etc/stuntman.toml"]);
        assert_eq!(cli.config.as_deref(), Some("/etc/stuntman.toml"));
    }

    #[test]
    fn test_import() {
        let cli = Cli::parse_from(["stuntman", "import", "/tmp/users.json", "-f", "json"]);
        match cli.command {
            Commands::Import { source, format } => {
                assert_eq!(source, "/tmp/users.json");
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("Expected Import command"),
        }
    }

    #[test]
    fn test_fetch_strict() {
        let cli = Cli::parse_from(["stuntman", "fetch", "http://localhost:5000", "--strict"]);
        match cli.command {
            Commands::Fetch {
                base_url, strict, ..
            } => {
                assert_eq!(base_url, "http://localhost:5000");
                assert!(strict);
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_verbose_flags() {
        let cli = Cli::parse_from(["stuntman", "-vv", "export"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["stuntman", "config", "init", "--force"]);
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Init { path, force },
            } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
