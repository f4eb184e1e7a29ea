//! nufeed - package source inspector
//!
//! Usage:
//!   nufeed sources paket.dependencies           # List declared feeds
//!   nufeed sources paket.dependencies --probe   # ...and check they answer
//!   nufeed parse 'source "https://..."'          # Parse a single line
//!   nufeed classify https://www.myget.org/F/x   # Detect the feed host

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nufeed_core::config::{ConfigStore, NufeedConfig};
use nufeed_core::platform::Platform;
use nufeed_core::probe::{ProbeOutcome, Prober};
use nufeed_core::source::{
    CacheKind, PackageSource, SourceParser, SourcesFile, classify, classify_url,
};

#[derive(Parser)]
#[command(name = "nufeed")]
#[command(about = "Package source inspector", long_about = None)]
struct Cli {
    /// Directory holding nufeed.toml (defaults to ~/.config/nufeed)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Path conventions to apply (defaults to the host platform)
    #[arg(long, global = true)]
    platform: Option<PlatformArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sources declared in a dependencies file
    Sources {
        /// Dependencies file to read
        file: PathBuf,

        /// Check that every source can be reached
        #[arg(long)]
        probe: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Parse a single source line
    Parse {
        /// The line, e.g. 'source "https://feed" username: "u" password: "p"'
        line: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show which known feed host a url belongs to
    Classify {
        url: String,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// Only show problems (non-zero exit if any source is unreachable)
    Quiet,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    Windows,
    Posix,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Windows => Platform::Windows,
            PlatformArg::Posix => Platform::Posix,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nufeed_core=info,nufeed=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let store = match cli.config_dir {
        Some(dir) => ConfigStore::from_dir(dir),
        None => ConfigStore::from_default_dir()?,
    };
    let config = store.load()?;
    let parser = build_parser(&store, &config, cli.platform.map(Platform::from))?;

    match cli.command {
        Commands::Sources {
            file,
            probe,
            format,
        } => run_sources(&parser, &config, &file, probe, format)?,
        Commands::Parse { line, format } => run_parse(&parser, &line, format)?,
        Commands::Classify { url } => println!("{}", classify_url(&url)),
    }

    Ok(())
}

fn build_parser(
    store: &ConfigStore,
    config: &NufeedConfig,
    platform: Option<Platform>,
) -> Result<SourceParser> {
    let credentials = store.load_credentials(config)?;
    tracing::debug!("loaded {} saved credentials", credentials.len());

    Ok(SourceParser::new()
        .with_platform(platform.unwrap_or_else(Platform::current))
        .with_credential_store(credentials))
}

fn run_sources(
    parser: &SourceParser,
    config: &NufeedConfig,
    file: &Path,
    probe: bool,
    format: OutputFormat,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read dependencies file: {}", file.display()))?;
    let parsed = parser
        .parse_sources(&content)
        .with_context(|| format!("Failed to parse sources in {}", file.display()))?;

    let outcomes = if probe {
        Some(probe_sources(config, &parsed.all_sources())?)
    } else {
        None
    };

    match format {
        OutputFormat::Table => print_table(&parsed, outcomes.as_deref()),
        OutputFormat::Json => print_json(&parsed, outcomes.as_deref())?,
        OutputFormat::Quiet => {
            let exit_code = print_quiet(outcomes.as_deref());
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn run_parse(parser: &SourceParser, line: &str, format: OutputFormat) -> Result<()> {
    let source = parser.parse_line(line)?;
    match format {
        OutputFormat::Json => {
            let output = source_json(&source);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table | OutputFormat::Quiet => print_source(&source, None),
    }
    Ok(())
}

fn probe_sources(config: &NufeedConfig, sources: &[PackageSource]) -> Result<Vec<ProbeOutcome>> {
    let prober = Prober::new(config.probe.build_probe()?);

    // Block on async probes using tokio runtime
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;

    Ok(runtime.block_on(prober.warn_all_unreachable(sources)))
}

// =============================================================================
// Output
// =============================================================================

fn print_table(parsed: &SourcesFile, outcomes: Option<&[ProbeOutcome]>) {
    if parsed.sources.is_empty() {
        println!("No sources declared");
    }
    for source in &parsed.sources {
        print_source(source, find_outcome(outcomes, source));
    }

    for cache in &parsed.caches {
        let kind = match cache.kind {
            Some(CacheKind::AllVersions) => "all versions",
            Some(CacheKind::CurrentVersion) => "current version",
            None => "default",
        };
        let status = match outcomes.and_then(|o| o.iter().find(|o| o.url() == cache.location)) {
            Some(outcome) if outcome.is_reachable() => format!(" {}", style("[OK]").green()),
            Some(_) => format!(" {}", style("[UNREACHABLE]").red()),
            None => String::new(),
        };
        println!(
            "{} {} ({}){}",
            style("cache").dim(),
            cache.location,
            kind,
            status
        );
    }
}

fn find_outcome<'a>(
    outcomes: Option<&'a [ProbeOutcome]>,
    source: &PackageSource,
) -> Option<&'a ProbeOutcome> {
    outcomes?.iter().find(|o| o.url() == source.url())
}

fn print_source(source: &PackageSource, outcome: Option<&ProbeOutcome>) {
    let kind = match source {
        PackageSource::NuGetV2(_) => "nuget v2",
        PackageSource::NuGetV3(_) => "nuget v3",
        PackageSource::LocalFeed { .. } => "local",
    };

    let status = match outcome {
        Some(ProbeOutcome::Reachable { .. }) => format!(" {}", style("[OK]").green()),
        Some(ProbeOutcome::Unreachable { .. }) => format!(" {}", style("[UNREACHABLE]").red()),
        None => String::new(),
    };

    println!(
        "{:<9} {} ({}){}",
        style(kind).cyan(),
        style(source.url()).bold(),
        classify(source),
        status
    );
    if let Some(auth) = source.auth() {
        println!("          auth: {}", auth);
    }
}

fn source_json(source: &PackageSource) -> serde_json::Value {
    serde_json::json!({
        "source": source,
        "feed_kind": classify(source),
    })
}

fn print_json(parsed: &SourcesFile, outcomes: Option<&[ProbeOutcome]>) -> Result<()> {
    let sources: Vec<_> = parsed
        .sources
        .iter()
        .map(|source| {
            let mut entry = source_json(source);
            if let Some(outcome) = find_outcome(outcomes, source) {
                entry["reachable"] = serde_json::Value::Bool(outcome.is_reachable());
            }
            entry
        })
        .collect();

    // Wrap in versioned output
    let output = serde_json::json!({
        "schema_version": 1,
        "sources": sources,
        "caches": parsed.caches,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_quiet(outcomes: Option<&[ProbeOutcome]>) -> i32 {
    let unreachable: Vec<_> = outcomes
        .unwrap_or_default()
        .iter()
        .filter(|o| !o.is_reachable())
        .collect();

    if unreachable.is_empty() {
        return 0;
    }
    for outcome in &unreachable {
        if let ProbeOutcome::Unreachable { url, reason } = outcome {
            println!("{}: {}", url, reason);
        }
    }
    1
}
