//! Profile-Harvester main entry point
//!
//! This is the command-line interface for the profile extraction pipeline.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use profile_harvester::config::{load_config_with_hash, Config};
use profile_harvester::model::{SearchFilter, SearchRequest};
use profile_harvester::output::{print_summary, write_json, ExportDocument};
use profile_harvester::{build_backend, Backend};
use tracing_subscriber::EnvFilter;

/// Profile-Harvester: rate-limited public-profile search
///
/// Runs a people search through the configured backend (an interactive
/// browser session or the remote API), optionally fetches profile details
/// for the first results, and prints or exports what it found.
#[derive(Parser, Debug)]
#[command(name = "profile-harvester")]
#[command(version)]
#[command(about = "Rate-limited public-profile search", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// JSON file with a search request body; flags override its fields
    #[arg(long, value_name = "FILE")]
    request: Option<PathBuf>,

    /// Search keywords
    #[arg(long)]
    keywords: Option<String>,

    /// Location filter
    #[arg(long)]
    location: Option<String>,

    /// Current company filter
    #[arg(long)]
    company: Option<String>,

    /// Industry filter
    #[arg(long)]
    industry: Option<String>,

    /// School filter
    #[arg(long)]
    school: Option<String>,

    /// Connection degree (1st, 2nd, 3rd or F, S, O)
    #[arg(long)]
    connection_degree: Option<String>,

    /// Experience level (1-6 or internship..executive)
    #[arg(long)]
    experience_level: Option<String>,

    /// Maximum number of results (1-100)
    #[arg(long, value_name = "N")]
    max_results: Option<i64>,

    /// Fetch profile details for the first results
    #[arg(long)]
    details: bool,

    /// Maximum number of profiles to fetch details for (1-20)
    #[arg(long, value_name = "N")]
    max_detailed: Option<i64>,

    /// Fetch details for a single profile URL or member id and exit
    #[arg(long, value_name = "URL", conflicts_with_all = ["auth_status", "dry_run"])]
    profile: Option<String>,

    /// Report whether the backend session is authenticated and exit
    #[arg(long, conflicts_with = "dry_run")]
    auth_status: bool,

    /// Validate config and show the search that would run without running it
    #[arg(long)]
    dry_run: bool,

    /// Write results as JSON to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Credentials may live in a .env next to the config
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: could not read .env: {}", e);
        }
    }

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let filter = SearchFilter::from_request(&build_request(&cli)?);

    if cli.dry_run {
        handle_dry_run(&config, &filter)?;
        return Ok(());
    }

    let backend = build_backend(&config)?;

    let result = if cli.auth_status {
        handle_auth_status(backend.as_ref()).await
    } else if let Some(profile) = &cli.profile {
        handle_profile(backend.as_ref(), profile, cli.output.as_deref()).await
    } else {
        handle_search(backend.as_ref(), &filter, &config_hash, cli.output.as_deref()).await
    };

    backend.shutdown().await;
    result
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("profile_harvester=info,warn"),
            1 => EnvFilter::new("profile_harvester=debug,info"),
            2 => EnvFilter::new("profile_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Merges the optional request file with command-line flags
fn build_request(cli: &Cli) -> Result<SearchRequest> {
    let mut request = match &cli.request {
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&body)
                .with_context(|| format!("{} is not a valid search request", path.display()))?
        }
        None => SearchRequest::default(),
    };

    let overrides = [
        (&mut request.keywords, &cli.keywords),
        (&mut request.location, &cli.location),
        (&mut request.current_company, &cli.company),
        (&mut request.industry, &cli.industry),
        (&mut request.school, &cli.school),
        (&mut request.connection_degree, &cli.connection_degree),
        (&mut request.years_of_experience, &cli.experience_level),
    ];
    for (field, flag) in overrides {
        if flag.is_some() {
            field.clone_from(flag);
        }
    }

    if cli.max_results.is_some() {
        request.max_results = cli.max_results;
    }
    if cli.max_detailed.is_some() {
        request.max_detailed_profiles = cli.max_detailed;
    }
    if cli.details {
        request.get_detailed_info = Some(true);
    }

    Ok(request)
}

/// Handles the --dry-run mode: validates config and shows the search
fn handle_dry_run(config: &Config, filter: &SearchFilter) -> Result<()> {
    println!("=== Profile-Harvester Dry Run ===\n");

    println!("Backend: {}", config.backend.kind);

    println!("\nRate Limit:");
    println!("  Request delay: {}ms", config.rate_limit.request_delay_ms);
    println!(
        "  Max actions per run: {}",
        config.rate_limit.max_actions_per_session
    );

    println!("\nSession:");
    println!(
        "  Manual login: poll every {}s, give up after {}s",
        config.session.login_poll_interval_secs, config.session.login_timeout_secs
    );
    println!("  Request timeout: {}s", config.session.request_timeout_secs);

    println!("\nSearch Filter:");
    println!("{}", serde_json::to_string_pretty(filter)?);

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --auth-status mode
async fn handle_auth_status(backend: &dyn Backend) -> Result<()> {
    if let Err(e) = backend.initialize().await {
        tracing::warn!("Backend could not authenticate: {}", e);
    }
    let status = backend.auth_status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

/// Handles the --profile mode: fetches one profile's details
async fn handle_profile(
    backend: &dyn Backend,
    profile: &str,
    output: Option<&Path>,
) -> Result<()> {
    let details = match backend.detail(profile).await {
        Ok(details) => details,
        Err(e) if e.is_not_found() => {
            println!("Profile not found: {}", profile);
            return Ok(());
        }
        Err(e) => return Err(e).context("profile fetch failed"),
    };

    match output {
        Some(path) => write_json(&details, path)?,
        None => println!("{}", serde_json::to_string_pretty(&details)?),
    }
    Ok(())
}

/// Handles the main search operation
async fn handle_search(
    backend: &dyn Backend,
    filter: &SearchFilter,
    config_hash: &str,
    output: Option<&Path>,
) -> Result<()> {
    tracing::info!(
        "Searching with {} backend (max {} results, details: {})",
        backend.kind(),
        filter.max_results(),
        filter.want_details()
    );

    let outcome = backend.search(filter).await.context("search failed")?;
    if outcome.is_partial() {
        tracing::warn!("Search returned partial results: {:?}", outcome.stop);
    }

    print_summary(&outcome);

    if let Some(path) = output {
        let document = ExportDocument::new(backend.kind(), config_hash, filter, outcome);
        write_json(&document, path)?;
        println!("\n✓ Results exported to: {}", path.display());
    }

    Ok(())
}
