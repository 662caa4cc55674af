//! Smart Search CLI - ask a question, get an answer with sources.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use smart_search::{
    ClientConfig, ConfigStore, FileStorage, HttpTransport, LlmProvider, SearchController,
    SearchEngine, SearchOutcome, EXAMPLE_QUERIES,
};

/// Smart Search - AI answers grounded in live web search
#[derive(Parser)]
#[command(name = "smart-search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Search endpoint URL (overrides SMART_SEARCH_API_URL)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in milliseconds (overrides SMART_SEARCH_TIMEOUT_MS)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Preference file (overrides SMART_SEARCH_STORE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question
    Search(SearchArgs),

    /// List example questions, or run one
    Examples(ExamplesArgs),

    /// Inspect or reset stored preferences
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Parser)]
struct SearchArgs {
    /// Your question
    query: String,

    #[command(flatten)]
    form: FormArgs,
}

#[derive(Parser)]
struct ExamplesArgs {
    /// Run the example with this number (1-based)
    #[arg(long)]
    run: Option<usize>,

    #[command(flatten)]
    form: FormArgs,
}

/// Choices shared by every command that submits a search.
#[derive(Args)]
struct FormArgs {
    /// Search engine: google or bing
    #[arg(short, long, default_value = "google")]
    engine: SearchEngine,

    /// LLM provider: openai or qwen (saved for next time)
    #[arg(short, long)]
    provider: Option<LlmProvider>,

    /// Use your own SearchCans API key (saved for next time)
    #[arg(long, conflicts_with = "default_search_key")]
    search_key: Option<String>,

    /// Go back to the server's search key and forget the stored one
    #[arg(long)]
    default_search_key: bool,

    /// Use your own LLM API key (saved for next time)
    #[arg(long, conflicts_with = "default_llm_key")]
    llm_key: Option<String>,

    /// Go back to the server's LLM key and forget the stored one
    #[arg(long)]
    default_llm_key: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show stored preferences (keys masked)
    Show,

    /// Switch both keys back to server defaults and delete stored keys
    ClearKeys,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Search(args) => run_search(&config, &args.query, &args.form).await,
        Commands::Examples(args) => run_examples(&config, args).await,
        Commands::Config { action } => run_config(&config, action),
    }
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    if let Some(store) = &cli.store {
        config = config.with_store_path(store.clone());
    }
    config.validate()?;
    Ok(config)
}

fn build_controller(config: &ClientConfig) -> Result<SearchController<FileStorage>> {
    let storage = FileStorage::open(&config.store_path)?;
    let transport = HttpTransport::new(config)?;
    let mut controller = SearchController::new(storage, transport);
    controller.set_timeout(Duration::from_millis(config.timeout_ms));
    Ok(controller)
}

fn apply_form(controller: &mut SearchController<FileStorage>, form: &FormArgs) {
    controller.set_search_engine(form.engine);
    if let Some(provider) = form.provider {
        controller.set_llm_provider(provider);
    }

    if let Some(key) = &form.search_key {
        controller.set_use_custom_search_key(true);
        controller.set_search_api_key(key.clone());
    } else if form.default_search_key {
        controller.set_use_custom_search_key(false);
    }

    if let Some(key) = &form.llm_key {
        controller.set_use_custom_llm_key(true);
        controller.set_llm_api_key(key.clone());
    } else if form.default_llm_key {
        controller.set_use_custom_llm_key(false);
    }
}

async fn run_search(config: &ClientConfig, query: &str, form: &FormArgs) -> Result<()> {
    let mut controller = build_controller(config)?;
    apply_form(&mut controller, form);
    controller.set_query(query);

    if matches!(form.format, OutputFormat::Text) {
        eprintln!("Searching...");
    }
    controller.submit().await;
    warn_unsaved(&controller);

    print_outcome(controller.outcome(), form.format)
}

async fn run_examples(config: &ClientConfig, args: ExamplesArgs) -> Result<()> {
    let Some(number) = args.run else {
        println!("Example questions:\n");
        for (i, example) in EXAMPLE_QUERIES.iter().enumerate() {
            println!("  {}. {}", i + 1, example);
        }
        println!();
        println!("Usage: smart-search examples --run 1");
        return Ok(());
    };

    let example = number
        .checked_sub(1)
        .and_then(|index| EXAMPLE_QUERIES.get(index))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No example {}; choose 1 to {}",
                number,
                EXAMPLE_QUERIES.len()
            )
        })?;

    let mut controller = build_controller(config)?;
    apply_form(&mut controller, &args.form);
    controller.select_example(*example);

    if matches!(args.form.format, OutputFormat::Text) {
        eprintln!("Searching: {}", example);
    }
    controller.submit().await;
    warn_unsaved(&controller);

    print_outcome(controller.outcome(), args.form.format)
}

fn warn_unsaved(controller: &SearchController<FileStorage>) {
    if let Some(e) = controller.preferences_save_error() {
        eprintln!("Warning: preferences not saved: {}", e);
    }
}

fn run_config(config: &ClientConfig, action: ConfigAction) -> Result<()> {
    let mut store = ConfigStore::new(FileStorage::open(&config.store_path)?);

    match action {
        ConfigAction::Show => {
            let prefs = store.load();
            println!("Preference file: {}", store.storage().path().display());
            println!("Endpoint:        {}", config.endpoint);
            println!("LLM provider:    {}", prefs.llm_provider.label());
            println!(
                "Search key:      {}",
                describe_key(prefs.use_custom_search_key, prefs.search_api_key.as_deref())
            );
            println!(
                "LLM key:         {}",
                describe_key(prefs.use_custom_llm_key, prefs.llm_api_key.as_deref())
            );
        }
        ConfigAction::ClearKeys => {
            let mut prefs = store.load();
            prefs.use_custom_search_key = false;
            prefs.use_custom_llm_key = false;
            store.save(&prefs)?;
            println!("Custom API keys removed; using server defaults.");
        }
    }

    Ok(())
}

fn print_outcome(outcome: Option<&SearchOutcome>, format: OutputFormat) -> Result<()> {
    match outcome {
        Some(SearchOutcome::Success {
            answer,
            sources,
            metadata,
        }) => {
            match format {
                OutputFormat::Text => {
                    match metadata {
                        Some(metadata) => println!("\nAI Answer  [{}]\n", metadata.summary()),
                        None => println!("\nAI Answer\n"),
                    }
                    println!("{}", answer);

                    if !sources.is_empty() {
                        println!("\nSources:");
                        for (i, source) in sources.iter().enumerate() {
                            println!("  {}. {}", i + 1, source);
                        }
                    }
                }
                OutputFormat::Json => {
                    let output = json!({
                        "answer": answer,
                        "sources": sources,
                        "metadata": metadata,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
            Ok(())
        }
        Some(SearchOutcome::Failure { message }) => anyhow::bail!("{}", message),
        None => anyhow::bail!("Search produced no result"),
    }
}

fn describe_key(custom: bool, key: Option<&str>) -> String {
    match (custom, key) {
        (true, Some(key)) => format!("custom ({})", mask_key(key)),
        (true, None) => "custom (not set)".to_string(),
        (false, _) => "server default".to_string(),
    }
}

fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(3).collect();
    if key.chars().count() > 3 {
        format!("{}****", visible)
    } else {
        "****".to_string()
    }
}
