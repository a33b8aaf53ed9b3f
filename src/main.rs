use clap::Parser;
use place_atlas::config::AtlasConfig;
use place_atlas::logging::init_logging;
use place_atlas::places::{flag_code_for, variants_of, FileStore, PlaceCache, PlaceResolver};
use place_atlas::places::cache::SystemClock;
use std::path::PathBuf;
use std::sync::Arc;

/// Place Atlas: bounded city/division lists for any spelling of a country.
///
/// Examples:
///   atlas Türkiye
///   atlas "United States (US)" --offline
///   atlas Germany --limit 20 --no-cache
///   atlas --variants USA
///   atlas --serve --port 8080
#[derive(Parser)]
#[command(name = "atlas", version, about, long_about = None)]
struct Cli {
    /// Country name, any known spelling.
    #[arg(index = 1)]
    country: Option<String>,

    /// Config file (default: ~/.place_atlas/config.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding cities/<slug>.json and world_cities.json.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Offline mode: skip the remote lookup tier.
    #[arg(long)]
    offline: bool,

    /// Do not read or write the persistent cache.
    #[arg(long)]
    no_cache: bool,

    /// Default result limit for countries without their own limit.
    #[arg(long)]
    limit: Option<usize>,

    /// Print the known spellings of the country instead of resolving it.
    #[arg(long)]
    variants: bool,

    /// Run the HTTP API.
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Debug logging (when RUST_LOG is unset).
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if cli.variants {
        let Some(country) = cli.country.as_deref() else {
            eprintln!("Error: --variants needs a country.");
            std::process::exit(1);
        };
        println!("{}", serde_json::json!(variants_of(country)));
        return;
    }

    let cache = if config.use_cache {
        let path = config.cache_path.clone().unwrap_or_else(FileStore::default_path);
        PlaceCache::new(Arc::new(FileStore::load_from(path)), Arc::new(SystemClock), config.cache_version.clone())
    } else {
        PlaceCache::disabled()
    };
    let resolver = PlaceResolver::from_config(&config, cache);

    if cli.serve {
        if let Err(e) = place_atlas::server::start(&cli.host, cli.port, resolver).await {
            eprintln!("Error: Cannot serve on {}:{}: {}", cli.host, cli.port, e);
            std::process::exit(1);
        }
        return;
    }

    let Some(country) = cli.country.as_deref() else {
        eprintln!("Error: No country specified.");
        eprintln!();
        eprintln!("Usage:");
        eprintln!("  atlas Türkiye");
        eprintln!("  atlas \"United States (US)\" --offline");
        eprintln!("  atlas --variants USA");
        eprintln!("  atlas --serve");
        std::process::exit(1);
    };

    let result = resolver.resolve_places(country).await;
    eprintln!("  {} {} for {}", result.len(), result.kind, country);

    let output = serde_json::json!({
        "country": country,
        "flag_code": flag_code_for(country),
        "kind": result.kind,
        "items": result.items,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> place_atlas::places::types::Result<AtlasConfig> {
    let mut config = match &cli.config {
        Some(path) => AtlasConfig::load_from(path)?,
        None => AtlasConfig::load()?,
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(limit) = cli.limit {
        config.default_limit = limit;
    }
    config.offline |= cli.offline;
    config.use_cache &= !cli.no_cache;
    Ok(config)
}
