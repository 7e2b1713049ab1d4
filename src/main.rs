use mise::cli::{Cli, Commands, ConfigAction};
use mise::config::{Config, ConfigValidator};
use mise::error::{MiseError, Result};
use mise::recommend::{format_results, Recommender, TurnOutcome};
use mise::session::ChatSession;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Chat => {
            cmd_chat(cli.config)?;
        }
        Commands::Query { query, json } => {
            cmd_query(cli.config, &query, json)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

/// Logs go to stderr so the transcript on stdout stays clean
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "mise=debug" } else { "mise=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_recommender(config: &Config) -> Result<Recommender> {
    let recommender = Recommender::from_config(config)?;
    recommender.validate_startup()?;
    Ok(recommender)
}

fn cmd_chat(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let recommender = build_recommender(&config)?;
    let mut session = ChatSession::new(config.session.memory_size);
    tracing::info!("Chat session {} started", session.id);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    mise::chat::run(&recommender, &mut session, stdin.lock(), stdout.lock())
}

fn cmd_query(config_path: Option<PathBuf>, query: &str, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let recommender = build_recommender(&config)?;
    let mut session = ChatSession::new(config.session.memory_size);

    let outcome = match recommender.process_turn(query, &mut session) {
        Ok(outcome) => outcome,
        Err(e @ MiseError::RetrieverUnavailable { .. }) => {
            eprintln!("{}", e.user_message());
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    if json {
        let out = serde_json::to_string_pretty(&outcome).map_err(|e| MiseError::Json {
            source: e,
            context: "Failed to serialize results".to_string(),
        })?;
        println!("{}", out);
        return Ok(());
    }

    match outcome {
        TurnOutcome::Clarify(clarification) => println!("{}", clarification),
        TurnOutcome::Results(result) => {
            println!("Filters: {}", result.filters);
            print!("{}", format_results(&result.recipes));
        }
    }

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { section } => {
            let config = load_config(config_path)?;
            let value = serde_json::to_value(&config).map_err(|e| MiseError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;

            let shown = match section {
                Some(section) => value.get(&section).cloned().ok_or_else(|| {
                    MiseError::Config(format!("Unknown config section: {}", section))
                })?,
                None => value,
            };

            let json = serde_json::to_string_pretty(&shown).map_err(|e| MiseError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;
            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            ConfigValidator::validate(&config)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            // Create parent directory
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| MiseError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            let config = Config::default();
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
            println!("  Database: {}", config.storage.database_path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };
    Config::load_or_default(&path)
}
