//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::chain::{describe_chain, resolve};
use crate::domain::compiler::{CompileOptions, MultiAssetMode, StrategyCompiler};
use crate::domain::config_validation::{
    multi_asset_mode, price_source, synthetic_seed, validate_app_config, PriceSource,
};
use crate::domain::error::VaultError;
use crate::domain::graph::{NATIVE_CODE, USDC_CODE, USDC_ISSUER};
use crate::domain::price::{AssetId, AssetPair, HistoricalDataRequest};
use crate::domain::price_history::load_price_history;
use crate::domain::resolution::HOUR_MS;
use crate::domain::synthetic::SyntheticSeriesGenerator;
use crate::domain::vault_validation::validate_vault;
use crate::ports::aggregate_port::AggregatePort;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "vaultforge", about = "Vault strategy compiler and price history tool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a strategy graph into a vault configuration
    Compile {
        #[arg(short, long)]
        graph: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Record every upstream asset on each rule
        #[arg(long)]
        all_assets: bool,
    },
    /// Lay a vault configuration back out as a strategy graph
    Decompile {
        #[arg(short, long)]
        vault: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a readable description of each rule chain in a graph
    Describe {
        #[arg(short, long)]
        graph: PathBuf,
    },
    /// Validate a vault configuration
    Validate {
        #[arg(short, long)]
        vault: PathBuf,
    },
    /// Reconstruct a regular price series for an asset pair
    Prices {
        #[arg(long)]
        base: String,
        #[arg(long)]
        base_issuer: Option<String>,
        #[arg(long, default_value = USDC_CODE)]
        counter: String,
        #[arg(long)]
        counter_issuer: Option<String>,
        /// RFC 3339 time or Unix milliseconds
        #[arg(long, value_parser = parse_timestamp)]
        start: DateTime<Utc>,
        /// RFC 3339 time or Unix milliseconds
        #[arg(long, value_parser = parse_timestamp)]
        end: DateTime<Utc>,
        /// Requested bucket size in milliseconds
        #[arg(long, default_value_t = HOUR_MS)]
        resolution: i64,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Overrides [synthetic] seed
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Compile {
            graph,
            config,
            output,
            name,
            description,
            all_assets,
        } => run_compile(
            &graph,
            config.as_ref(),
            output.as_ref(),
            name,
            description,
            all_assets,
        ),
        Command::Decompile { vault, output } => run_decompile(&vault, output.as_ref()),
        Command::Describe { graph } => run_describe(&graph),
        Command::Validate { vault } => run_validate(&vault),
        Command::Prices {
            base,
            base_issuer,
            counter,
            counter_issuer,
            start,
            end,
            resolution,
            config,
            seed,
            output,
        } => {
            let pair = AssetPair::new(
                asset_id(&base, base_issuer),
                asset_id(&counter, counter_issuer),
            );
            let request = HistoricalDataRequest {
                pair,
                start,
                end,
                resolution_ms: resolution,
            };
            run_prices(&request, config.as_ref(), seed, output.as_ref())
        }
    }
}

fn fail(err: &VaultError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Load and validate an INI file. Without a path, every key takes its default.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = match path {
        Some(p) => {
            log::info!("Loading config from {}", p.display());
            FileConfigAdapter::from_file(p)
        }
        None => FileConfigAdapter::from_string(""),
    }
    .map_err(|e| fail(&e))?;

    validate_app_config(&adapter).map_err(|e| fail(&e))?;
    Ok(adapter)
}

fn read_input(path: &Path) -> Result<String, ExitCode> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("error: failed to read {}: {}", path.display(), e);
        ExitCode::from(&VaultError::from(e))
    })
}

fn write_output(output: Option<&PathBuf>, content: &str) -> ExitCode {
    match output {
        Some(path) => match fs::write(path, content) {
            Ok(()) => {
                log::info!("Written to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: failed to write {}: {}", path.display(), e);
                ExitCode::from(&VaultError::from(e))
            }
        },
        None => {
            println!("{content}");
            ExitCode::SUCCESS
        }
    }
}

/// Config value, with `--all-assets` forcing `AllAssets`.
pub fn build_compile_options(
    config: &dyn ConfigPort,
    all_assets: bool,
) -> Result<CompileOptions, VaultError> {
    let multi_asset = if all_assets {
        MultiAssetMode::AllAssets
    } else {
        multi_asset_mode(config)?
    };
    Ok(CompileOptions { multi_asset })
}

/// `--seed`, then `[synthetic] seed`, then a freshly drawn seed.
pub fn build_generator(
    config: &dyn ConfigPort,
    seed_override: Option<u64>,
) -> Result<SyntheticSeriesGenerator, VaultError> {
    let generator = match seed_override.or(synthetic_seed(config)?) {
        Some(seed) => SyntheticSeriesGenerator::new(seed),
        None => SyntheticSeriesGenerator::from_entropy(),
    };
    Ok(generator)
}

pub fn build_aggregate_port(config: &dyn ConfigPort) -> Result<Box<dyn AggregatePort>, VaultError> {
    match price_source(config)? {
        PriceSource::Csv => Ok(Box::new(CsvAdapter::from_config(config)?)),
        PriceSource::Horizon => build_horizon_port(config),
    }
}

#[cfg(feature = "horizon")]
fn build_horizon_port(config: &dyn ConfigPort) -> Result<Box<dyn AggregatePort>, VaultError> {
    use crate::adapters::horizon_adapter::HorizonAdapter;

    let adapter = HorizonAdapter::from_config(config)?;
    log::info!("Using Horizon at {}", adapter.base_url());
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "horizon"))]
fn build_horizon_port(_config: &dyn ConfigPort) -> Result<Box<dyn AggregatePort>, VaultError> {
    Err(VaultError::ConfigInvalid {
        section: "prices".into(),
        key: "source".into(),
        reason: "horizon feature is not enabled in this build".into(),
    })
}

/// Native XLM never carries an issuer; bare USDC gets the well-known issuer.
pub fn asset_id(code: &str, issuer: Option<String>) -> AssetId {
    match (code, issuer) {
        (NATIVE_CODE, _) => AssetId::native(),
        (USDC_CODE, None) => AssetId::new(USDC_CODE, Some(USDC_ISSUER.to_string())),
        (code, issuer) => AssetId::new(code, issuer),
    }
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ms) = s.trim().parse::<i64>() {
        return DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| format!("timestamp {ms} is out of range"));
    }
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{s}': {e}"))
}

fn run_compile(
    graph_path: &Path,
    config_path: Option<&PathBuf>,
    output_path: Option<&PathBuf>,
    name: Option<String>,
    description: Option<String>,
    all_assets: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let options = match build_compile_options(&config, all_assets) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };
    let compiler = StrategyCompiler::new(options);

    log::info!("Loading graph from {}", graph_path.display());
    let content = match read_input(graph_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let graph = match compiler.import_graph_json(&content) {
        Ok(g) => g,
        Err(e) => return fail(&e),
    };

    let mut vault = compiler.serialize_graph(&graph);
    vault.metadata.name = name;
    vault.metadata.description = description;
    log::info!(
        "Compiled {} assets and {} rules",
        vault.assets.len(),
        vault.rules.len()
    );

    match compiler.export_json(&vault) {
        Ok(json) => write_output(output_path, &json),
        Err(e) => fail(&e),
    }
}

fn run_decompile(vault_path: &Path, output_path: Option<&PathBuf>) -> ExitCode {
    let compiler = StrategyCompiler::default();

    log::info!("Loading vault from {}", vault_path.display());
    let content = match read_input(vault_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let vault = match compiler.import_json(&content) {
        Ok(v) => v,
        Err(e) => return fail(&e),
    };

    let graph = compiler.deserialize(&vault);
    log::info!(
        "Laid out {} nodes and {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );
    match compiler.export_graph_json(&graph) {
        Ok(json) => write_output(output_path, &json),
        Err(e) => fail(&e),
    }
}

fn run_describe(graph_path: &Path) -> ExitCode {
    let content = match read_input(graph_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let graph = match StrategyCompiler::default().import_graph_json(&content) {
        Ok(g) => g,
        Err(e) => return fail(&e),
    };

    let chains = resolve(&graph.nodes, &graph.edges);
    if chains.is_empty() {
        eprintln!("No complete rule chains found.");
        return ExitCode::SUCCESS;
    }
    for (i, chain) in chains.iter().enumerate() {
        println!("{}. {}", i + 1, describe_chain(chain));
    }
    ExitCode::SUCCESS
}

fn run_validate(vault_path: &Path) -> ExitCode {
    let content = match read_input(vault_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let vault = match StrategyCompiler::default().import_json(&content) {
        Ok(v) => v,
        Err(e) => return fail(&e),
    };

    eprintln!("=== Vault ===");
    if let Some(name) = &vault.metadata.name {
        eprintln!("Name:    {name}");
    }
    eprintln!("Assets:  {}", vault.assets.len());
    for asset in &vault.assets {
        eprintln!("  {}: {}%", asset.code, asset.allocation);
    }
    eprintln!("Rules:   {}", vault.rules.len());

    if let Err(e) = validate_vault(&vault) {
        return fail(&e);
    }
    eprintln!("\nVault configuration is valid.");
    ExitCode::SUCCESS
}

fn run_prices(
    request: &HistoricalDataRequest,
    config_path: Option<&PathBuf>,
    seed: Option<u64>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    if request.end < request.start {
        let err = VaultError::validation("end must not be before start");
        return fail(&err);
    }

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let port = match build_aggregate_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let generator = match build_generator(&config, seed) {
        Ok(g) => g,
        Err(e) => return fail(&e),
    };

    log::info!(
        "Loading {} prices from {} to {}",
        request.pair,
        request.start,
        request.end
    );
    let response = load_price_history(port.as_ref(), &generator, request);
    log::info!(
        "{} points at {}ms resolution ({})",
        response.data_points.len(),
        response.resolution_ms,
        if response.using_mock_data {
            "synthetic"
        } else {
            "real"
        }
    );

    match serde_json::to_string_pretty(&response) {
        Ok(json) => write_output(output_path, &json),
        Err(e) => fail(&VaultError::from(e)),
    }
}
