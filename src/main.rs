use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oilboard::config::Config;
use oilboard::dashboard::{index_view, prepare_catalog, SortMode};
use oilboard::output::OutputFormat;
use oilboard::scrape::{IndexEntry, ScrapeOptions, DEFAULT_INDEX_URL, DEFAULT_SKIP};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const EXIT_SUCCESS: i32 = 0;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_DATA: i32 = 5;

/// Per-request timeout while scraping
const SCRAPE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the dashboard (default if no subcommand)
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Open the dashboard in a browser once listening
        #[arg(long)]
        open: bool,
    },
    /// Print the ranked catalog
    List {
        /// score, beneficial, blends, components or therapeutic
        #[arg(short, long, default_value = "score")]
        sort: String,
        /// Only oils whose name contains this text
        #[arg(short, long, default_value = "")]
        query: String,
        /// Show at most this many oils
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Show one oil with its score breakdown
    Show {
        /// Oil id, as listed in the catalog
        id: u32,
    },
    /// Merge a scraped catalog with a hand-curated one
    Merge {
        #[arg(long)]
        scraped: PathBuf,
        #[arg(long)]
        curated: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Build a catalog from the oil reference site
    #[command(subcommand)]
    Scrape(ScrapeCommand),
    /// Manage the image cache
    #[command(subcommand)]
    Images(ImagesCommand),
    /// Create a config file interactively
    Init,
}

#[derive(Subcommand, Debug)]
enum ScrapeCommand {
    /// Collect oil page links from the index page
    Index {
        #[arg(long, default_value = DEFAULT_INDEX_URL)]
        url: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Scrape every page listed in an index file
    Pages {
        /// Index file written by `scrape index`
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Index entries to skip from the front
        #[arg(long, default_value_t = DEFAULT_SKIP)]
        skip: usize,
        /// Pause between pages, e.g. "2s" or "500ms"
        #[arg(long, value_parser = humantime::parse_duration, default_value = "2s")]
        delay: Duration,
    },
}

#[derive(Subcommand, Debug)]
enum ImagesCommand {
    /// Look up and cache an image for every oil
    Prefetch {
        /// Parallel lookups (overrides images.prefetch_concurrency)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Delete every cached image
    Clear,
}

#[derive(Parser, Debug)]
#[command(name = "oilboard")]
#[command(about = "Rank and browse an essential oil catalog", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/oilboard/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();
    oilboard::logging::init(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Serve {
        bind: None,
        port: None,
        open: false,
    });
    let config_path = cli.config.map(PathBuf::from);

    // Init writes the config, so it runs before any config is loaded
    if let Commands::Init = command {
        if let Err(e) = oilboard::config::run_init_wizard(config_path) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    let config = match oilboard::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = oilboard::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let start_time = Instant::now();
    let result = run(command, config).await;
    tracing::debug!(elapsed = ?start_time.elapsed(), "done");

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        let code = if oilboard::http::is_network_error(&e) {
            EXIT_NETWORK
        } else {
            EXIT_DATA
        };
        std::process::exit(code);
    }

    std::process::exit(EXIT_SUCCESS);
}

async fn run(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Serve { bind, port, open } => serve(config, bind, port, open).await,
        Commands::List {
            sort,
            query,
            limit,
            format,
        } => list(&config, &sort, &query, limit, format),
        Commands::Show { id } => show(&config, id),
        Commands::Merge {
            scraped,
            curated,
            output,
        } => merge(&scraped, &curated, &output),
        Commands::Scrape(ScrapeCommand::Index { url, output }) => scrape_index(&url, &output).await,
        Commands::Scrape(ScrapeCommand::Pages {
            input,
            output,
            skip,
            delay,
        }) => scrape_pages(&input, &output, ScrapeOptions { skip, delay }).await,
        Commands::Images(ImagesCommand::Prefetch { concurrency }) => {
            prefetch_images(&config, concurrency).await
        }
        Commands::Images(ImagesCommand::Clear) => {
            let cache = oilboard::images::ImageCache::new(config.images.cache_dir());
            cache.clear()?;
            println!("Cleared image cache at {}", cache.path().display());
            Ok(())
        }
        Commands::Init => Ok(()),
    }
}

async fn serve(config: Config, bind: Option<String>, port: Option<u16>, open: bool) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let port = port.unwrap_or(config.server.port);
    let open = open || config.server.open_browser;

    let addr = tokio::net::lookup_host((bind.as_str(), port))
        .await
        .with_context(|| format!("Invalid bind address '{}'", bind))?
        .next()
        .with_context(|| format!("'{}' did not resolve to an address", bind))?;

    let images = oilboard::images::ImageResolver::from_config(&config.images)?;
    let state = Arc::new(oilboard::server::AppState::new(config, images));
    oilboard::server::serve(state, addr, open).await
}

fn list(
    config: &Config,
    sort: &str,
    query: &str,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let oils = oilboard::catalog::load_catalog(&config.data_file)?;
    let scored = prepare_catalog(oils, &config.scoring)?;
    let mut rows = index_view(&scored, query, SortMode::parse(sort)).oils;
    if let Some(limit) = limit {
        rows.truncate(limit);
    }

    match format {
        OutputFormat::Table => {
            let use_colors = oilboard::output::should_use_colors();
            println!("{}", oilboard::output::format_ranked_table(&rows, use_colors));
        }
        OutputFormat::Tsv => {
            if !rows.is_empty() {
                println!("{}", oilboard::output::format_tsv(&rows));
            }
        }
        OutputFormat::Json => {
            println!("{}", oilboard::output::format_json(&rows)?);
        }
    }
    Ok(())
}

fn show(config: &Config, id: u32) -> Result<()> {
    let oils = oilboard::catalog::load_catalog(&config.data_file)?;
    let scored = prepare_catalog(oils, &config.scoring)?;
    let oil = scored
        .oils
        .iter()
        .find(|o| o.oil.oil_id == id)
        .with_context(|| format!("No oil with id {} in {}", id, config.data_file.display()))?;

    let score = oilboard::scoring::calculate_score(&oil.oil, &config.scoring, scored.most_blended_oil());
    let beneficial = oilboard::scoring::calculate_beneficial_score(&oil.oil, &config.scoring);
    let use_colors = oilboard::output::should_use_colors();
    println!(
        "{}",
        oilboard::output::format_oil_detail(oil, &score, &beneficial, use_colors)
    );
    Ok(())
}

fn merge(scraped: &Path, curated: &Path, output: &Path) -> Result<()> {
    for path in [scraped, curated] {
        if !path.exists() {
            anyhow::bail!("Catalog file not found at {}", path.display());
        }
    }
    let scraped_oils = oilboard::catalog::load_catalog(scraped)?;
    let curated_oils = oilboard::catalog::load_catalog(curated)?;
    let (scraped_count, curated_count) = (scraped_oils.len(), curated_oils.len());

    let merged = oilboard::catalog::merge_catalogs(scraped_oils, curated_oils);
    oilboard::catalog::save_catalog(output, &merged)?;

    println!(
        "Merged {} scraped and {} curated oils into {} ({} total)",
        scraped_count,
        curated_count,
        output.display(),
        merged.len()
    );
    Ok(())
}

async fn scrape_index(url: &str, output: &Path) -> Result<()> {
    let client = oilboard::http::build_client(SCRAPE_TIMEOUT)?;
    let entries = oilboard::scrape::scrape_index(&client, url).await?;
    oilboard::catalog::save_json(output, &entries)?;
    println!("Saved {} oil links to {}", entries.len(), output.display());
    Ok(())
}

async fn scrape_pages(input: &Path, output: &Path, options: ScrapeOptions) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read index file at {}", input.display()))?;
    let entries: Vec<IndexEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse index file {}", input.display()))?;

    let client = oilboard::http::build_client(SCRAPE_TIMEOUT)?;
    let (oils, report) = oilboard::scrape::scrape_pages(&client, &entries, &options, output).await?;

    println!(
        "Scraped {} of {} pages into {} ({} oils)",
        report.scraped,
        report.attempted,
        output.display(),
        oils.len()
    );
    if !report.failed.is_empty() {
        eprintln!("Skipped: {}", report.failed.join(", "));
    }
    Ok(())
}

async fn prefetch_images(config: &Config, concurrency: Option<usize>) -> Result<()> {
    let oils = oilboard::catalog::load_catalog(&config.data_file)?;
    let resolver = oilboard::images::ImageResolver::from_config(&config.images)?;
    let concurrency = concurrency.unwrap_or(config.images.prefetch_concurrency);

    let report = resolver.prefetch(&oils, concurrency).await;
    println!(
        "Images: {} found, {} without a match (cache: {})",
        report.found,
        report.missing,
        resolver.cache().path().display()
    );
    Ok(())
}
