//! Volprofile CLI: volume profiles from local or synthetic market data.
//!
//! Commands:
//! - `profile`: compute a volume profile per symbol and bin count
//! - `config`: print the effective configuration as TOML

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use volprofile_core::config::validate_bins;
use volprofile_core::data::{CachedSource, FileSource, MarketDataSource, ObservationCache, SyntheticSource};
use volprofile_core::{compute_volume_profile_with, AnalysisConfig, Attribution, Period, VolumeProfile};

#[derive(Parser)]
#[command(
    name = "volprofile",
    about = "Volprofile CLI: volume-at-price profiles and point of control"
)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute volume profiles.
    Profile(ProfileArgs),
    /// Print the effective configuration as TOML.
    Config {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ProfileArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbols to analyse (repeatable). Defaults to the configured symbol.
    #[arg(long = "symbol")]
    symbols: Vec<String>,

    /// Lookback period: 1mo, 3mo, 6mo, 1y, 2y.
    #[arg(long)]
    period: Option<Period>,

    /// Bin counts (repeatable, 30..=150). Defaults to the configured count.
    #[arg(long = "bins")]
    bins: Vec<usize>,

    /// Directory holding {SYMBOL}.csv / {SYMBOL}.parquet files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use a deterministic synthetic series instead of files.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Volume attribution: close or range.
    #[arg(long)]
    attribution: Option<Attribution>,

    /// Print each profile as JSON instead of a summary.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Write profile levels as CSV.
    #[arg(long)]
    csv_out: Option<PathBuf>,

    /// Write the full profile as JSON.
    #[arg(long)]
    json_out: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Profile(args) => run_profile(args),
        Commands::Config { config } => run_config(config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("analysis failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "volprofile=debug,volprofile_core=debug"
    } else {
        "volprofile=info,volprofile_core=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn run_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    config.validate()?;
    print!("{}", config.to_toml()?);
    Ok(())
}

fn run_profile(args: ProfileArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(period) = args.period {
        config.period = period;
    }
    if let Some(attribution) = args.attribution {
        config.attribution = attribution;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(first) = args.symbols.first() {
        config.symbol = first.clone();
    }
    if let Some(&first) = args.bins.first() {
        config.bins = first;
    }
    config.validate()?;

    let symbols = if args.symbols.is_empty() {
        vec![config.symbol.clone()]
    } else {
        args.symbols.clone()
    };
    let bin_counts = if args.bins.is_empty() {
        vec![config.bins]
    } else {
        args.bins.clone()
    };
    for &bins in &bin_counts {
        validate_bins(bins)?;
    }

    let inner: Box<dyn MarketDataSource> = if args.synthetic {
        Box::new(SyntheticSource::ending_today())
    } else {
        Box::new(FileSource::new(&config.data_dir))
    };
    let cache = match config.cache_ttl() {
        Some(ttl) => ObservationCache::with_ttl(ttl),
        None => ObservationCache::new(),
    };
    let source = CachedSource::new(inner, cache);
    info!(source = source.name(), period = %config.period, "starting analysis");

    let multiple = symbols.len() * bin_counts.len() > 1;
    for symbol in &symbols {
        let observations = source
            .observations(symbol, config.period)
            .with_context(|| format!("fetching {symbol}"))?;

        for &bins in &bin_counts {
            let opts = config.profile_options();
            let opts = volprofile_core::ProfileOptions { bin_count: bins, ..opts };
            let profile = compute_volume_profile_with(&observations, &opts)
                .with_context(|| format!("profiling {symbol} with {bins} bins"))?;

            if args.json {
                println!("{}", profile.to_json()?);
            } else {
                print_summary(symbol, config.period, &profile);
            }

            if let Some(base) = &args.csv_out {
                let path = output_path(base, symbol, bins, multiple);
                profile
                    .save_csv(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "wrote profile CSV");
            }
            if let Some(base) = &args.json_out {
                let path = output_path(base, symbol, bins, multiple);
                profile
                    .save_json(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "wrote profile JSON");
            }
        }
    }

    let stats = source.cache().stats();
    debug!(hits = stats.hits, misses = stats.misses, entries = stats.entries, "cache stats");
    Ok(())
}

/// `out.csv` -> `out_TSLA_70.csv` when several profiles share one output flag.
fn output_path(base: &Path, symbol: &str, bins: usize, multiple: bool) -> PathBuf {
    if !multiple {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profile".into());
    let name = match base.extension() {
        Some(ext) => format!(
            "{stem}_{}_{bins}.{}",
            symbol.to_uppercase(),
            ext.to_string_lossy()
        ),
        None => format!("{stem}_{}_{bins}", symbol.to_uppercase()),
    };
    base.with_file_name(name)
}

fn format_volume(volume: f64) -> String {
    if volume >= 1e9 {
        format!("{:.1}B", volume / 1e9)
    } else if volume >= 1e6 {
        format!("{:.1}M", volume / 1e6)
    } else if volume >= 1e3 {
        format!("{:.1}K", volume / 1e3)
    } else {
        format!("{volume:.0}")
    }
}

fn print_summary(symbol: &str, period: Period, profile: &VolumeProfile) {
    println!();
    println!("=== Volume Profile ===");
    println!("Symbol:         {}", symbol.to_uppercase());
    println!(
        "Period:         {period} ({} observations)",
        profile.observation_count
    );
    println!(
        "Price Range:    ${:.2} to ${:.2}",
        profile.price_min, profile.price_max
    );
    println!(
        "Bins:           {} (width ${:.2}, {} attribution)",
        profile.len(),
        profile.bin_width,
        profile.attribution
    );
    println!();
    println!("Current Price:  ${:.2}", profile.current_price);
    println!(
        "POC Price:      ${:.2} ({:.1}% of volume)",
        profile.poc_price,
        profile.poc_share() * 100.0
    );
    println!("POC Volume:     {}", format_volume(profile.poc_volume));
    println!("Total Volume:   {}", format_volume(profile.total_volume));
    println!("Fingerprint:    {}", profile.fingerprint());
    println!();
}
