//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mise",
    version,
    author = "neur0map",
    about = "Conversational recipe recommendations",
    long_about = "Mise turns plain-language requests into structured recipe filters, searches a \
                  recipe database by filters and semantic similarity, and ranks the results by \
                  relevance and review confidence. Follow-up messages refine the previous request."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/mise/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive recipe conversation
    Chat,

    /// Answer a single request and exit
    Query {
        /// Recipe request, e.g. "easy vegetarian dinner under 30 minutes"
        query: String,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Show only a specific section (e.g. "ranking")
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_args() {
        let cli = Cli::try_parse_from(["mise", "query", "vegan curry", "--json", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Query { query, json } => {
                assert_eq!(query, "vegan curry");
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
