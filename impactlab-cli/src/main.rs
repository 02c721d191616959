//! ImpactLab CLI — Monte Carlo runs, stress tests and order-size sweeps.
//!
//! Commands:
//! - `run`: Monte Carlo comparison of the configured strategies
//! - `stress`: normal market vs each stress scenario, same seeds
//! - `sizes`: rerun across order sizes
//! - `validate`: parse and validate a config file without running it
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use impactlab_core::cost::CostComponent;
use impactlab_core::scenario::{ScenarioKind, ScenarioSpec};
use impactlab_runner::{
    default_stress_scenarios, load_config, order_size_sensitivity, run_monte_carlo, stress_test,
    MonteCarloResult, RunConfig, SizePoint, StressTestReport, DEFAULT_ORDER_SIZES,
};

#[derive(Parser)]
#[command(
    name = "impactlab",
    about = "ImpactLab CLI — execution cost stress simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every simulation command.
#[derive(Args)]
struct RunOpts {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of Monte Carlo paths.
    #[arg(long)]
    paths: Option<usize>,

    /// Override the master seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Run on a private pool of this many threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Print the full result as JSON instead of tables.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare strategies by Monte Carlo simulation.
    Run {
        #[command(flatten)]
        opts: RunOpts,

        /// Inject a preset scenario: flash_crash, liquidity_drought, momentum_drift.
        #[arg(long)]
        scenario: Option<String>,
    },
    /// Run the normal market and every preset scenario with the same seeds.
    Stress {
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Rerun the experiment across order sizes.
    Sizes {
        #[command(flatten)]
        opts: RunOpts,

        /// Order sizes in shares. Defaults to 50000 100000 200000.
        #[arg(long, num_args = 1..)]
        sizes: Vec<f64>,
    },
    /// Parse and validate a config file.
    Validate {
        /// Path to a TOML config file.
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { opts, scenario } => run_cmd(&opts, scenario.as_deref()),
        Commands::Stress { opts } => stress_cmd(&opts),
        Commands::Sizes { opts, sizes } => sizes_cmd(&opts, sizes),
        Commands::Validate { config } => {
            let run = load_config(&config)
                .with_context(|| format!("invalid config {}", config.display()))?;
            println!(
                "{} is valid: {} paths, horizon {}, order size {}",
                config.display(),
                run.monte_carlo.paths,
                run.simulation.horizon,
                run.simulation.order_size
            );
            Ok(())
        }
    }
}

fn resolve_config(opts: &RunOpts) -> Result<RunConfig> {
    let mut config = match &opts.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(paths) = opts.paths {
        config.monte_carlo.paths = paths;
    }
    if let Some(seed) = opts.seed {
        config.simulation.seed = seed;
    }
    if opts.threads.is_some() {
        config.monte_carlo.threads = opts.threads;
    }
    config.validate()?;
    Ok(config)
}

fn parse_scenario(name: &str, horizon: usize) -> Result<ScenarioSpec> {
    let kind = ScenarioKind::all()
        .into_iter()
        .find(|k| k.name() == name)
        .with_context(|| {
            format!("unknown scenario '{name}'. Valid: flash_crash, liquidity_drought, momentum_drift")
        })?;
    Ok(ScenarioSpec::preset(kind, horizon))
}

fn run_cmd(opts: &RunOpts, scenario: Option<&str>) -> Result<()> {
    let mut config = resolve_config(opts)?;
    if let Some(name) = scenario {
        config.monte_carlo.scenario = Some(parse_scenario(name, config.simulation.horizon)?);
    }
    let result = run_monte_carlo(&config.simulation, &config.monte_carlo)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }
    Ok(())
}

fn stress_cmd(opts: &RunOpts) -> Result<()> {
    let config = resolve_config(opts)?;
    let scenarios = default_stress_scenarios(config.simulation.horizon);
    info!(scenarios = scenarios.len(), "running stress test");
    let report = stress_test(&config.simulation, &config.monte_carlo, &scenarios)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_stress(&report);
    }
    Ok(())
}

fn sizes_cmd(opts: &RunOpts, sizes: Vec<f64>) -> Result<()> {
    let config = resolve_config(opts)?;
    let sizes = if sizes.is_empty() {
        DEFAULT_ORDER_SIZES.to_vec()
    } else {
        sizes
    };
    let points = order_size_sensitivity(&config.simulation, &config.monte_carlo, &sizes)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&points)?);
    } else {
        print_sizes(&points);
    }
    Ok(())
}

// ─── Output ──────────────────────────────────────────────────────────

fn print_summary(result: &MonteCarloResult) {
    println!();
    println!("=== Monte Carlo Result ===");
    println!("Paths:          {}", result.paths);
    println!("Seed:           {}", result.seed);
    println!("Order size:     {}", result.order_size);
    println!(
        "Scenario:       {}",
        result.scenario.map_or("normal", |s| s.name())
    );
    println!("Baseline:       {}", result.baseline);
    println!();
    println!("--- Total cost (bps of arrival notional) ---");
    println!(
        "{:<16} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "strategy", "mean", "std", "stderr", "p5", "p95", "savings"
    );
    for s in &result.strategies {
        let c = &s.cost_bps;
        println!(
            "{:<16} {:>10.2} {:>10.2} {:>10.3} {:>10.2} {:>10.2} {:>10.3}",
            s.name,
            c.mean,
            c.std_dev,
            c.std_error,
            c.percentile(5.0).unwrap_or(0.0),
            c.percentile(95.0).unwrap_or(0.0),
            s.risk_adjusted_savings
        );
    }
    println!();
    println!("--- Mean cost components (bps) ---");
    print!("{:<16}", "strategy");
    for component in CostComponent::all() {
        print!(" {:>14}", component.name());
    }
    println!();
    for s in &result.strategies {
        print!("{:<16}", s.name);
        for component in CostComponent::all() {
            print!(" {:>14.2}", s.component_means_bps.get(component));
        }
        println!();
    }

    let d = &result.diagnostics;
    if !d.is_clean() {
        println!();
        println!(
            "Clamps:         {} variance, {} price floor, {} participation",
            d.variance_truncations, d.price_floor_clamps, d.participation_clamps
        );
    }
}

fn print_stress(report: &StressTestReport) {
    print_summary(&report.normal);
    for impact in &report.scenarios {
        println!();
        println!("=== {} vs normal ===", impact.scenario.name());
        for inc in &impact.increases {
            let pct = inc
                .increase_pct
                .map_or_else(|| "n/a".to_string(), |p| format!("{p:+.0}%"));
            println!(
                "  {:<16} {:>14.0} -> {:>14.0}  ({pct})",
                inc.strategy, inc.normal_mean, inc.stressed_mean
            );
        }
    }
}

fn print_sizes(points: &[SizePoint]) {
    for point in points {
        println!();
        println!(
            "=== Order size {} ({:.0}% of ADV) ===",
            point.order_size,
            point.adv_fraction * 100.0
        );
        for s in &point.result.strategies {
            println!(
                "  {:<16} {:>10.2} bps (±{:.2})",
                s.name, s.cost_bps.mean, s.cost_bps.std_dev
            );
        }
    }
}
