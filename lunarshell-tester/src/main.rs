mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use lunarshell_game::ExplorationSettings;
use logic::{
    ExplorationStrategy, SimulationAggregate, SimulationConfig, SimulationRecord,
    aggregate_records, resolve_seeds, run_simulation, split_csv,
};

#[derive(Debug, Parser)]
#[command(name = "lunarshell-tester", version = "0.1.0")]
#[command(about = "Headless simulation harness for the Lunar Shell exploration engine")]
struct Args {
    /// Seeds to run (comma-separated, decimal or 0x-hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Simulated minutes of active exploration per run
    #[arg(long, default_value_t = 10)]
    minutes: u64,

    /// Choice policies to run (comma-separated, or `all`)
    #[arg(long, default_value = "cautious")]
    policy: String,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON file overriding the bundled exploration settings
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Simulate without connectivity, so no choices are offered
    #[arg(long)]
    offline: bool,

    /// Persist each run's storage keys as JSON files under this directory
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let seeds = resolve_seeds(&split_csv(&args.seeds))?;
    let strategies = expand_policies(&args.policy)?;
    let config = SimulationConfig {
        minutes: args.minutes,
        settings: load_settings(args.settings.as_deref())?,
        offline: args.offline,
        save_dir: args.save_dir.clone(),
    };

    let records = run_all(&args, &config, &seeds, &strategies)?;
    let aggregates = aggregate_records(&records);

    write_reports(&args, &records, &aggregates, start_time)?;

    if records.iter().any(|r| !r.passed()) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🌙 Lunar Shell Exploration Tester".bright_cyan().bold());
    println!("{}", "=================================".cyan());
}

fn expand_policies(policy_arg: &str) -> Result<Vec<ExplorationStrategy>> {
    let mut strategies = Vec::new();
    for token in split_csv(policy_arg) {
        if token.eq_ignore_ascii_case("all") {
            strategies.extend(ExplorationStrategy::ALL);
            continue;
        }
        let Some(strategy) = ExplorationStrategy::from_key(&token) else {
            bail!("Unknown policy `{token}`");
        };
        strategies.push(strategy);
    }
    strategies.sort();
    strategies.dedup();
    if strategies.is_empty() {
        bail!("No policies provided");
    }
    Ok(strategies)
}

fn load_settings(path: Option<&Path>) -> Result<ExplorationSettings> {
    let Some(path) = path else {
        return Ok(ExplorationSettings::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings {}", path.display()))?;
    ExplorationSettings::from_json(&raw)
        .with_context(|| format!("invalid settings in {}", path.display()))
}

fn run_all(
    args: &Args,
    config: &SimulationConfig,
    seeds: &[u64],
    strategies: &[ExplorationStrategy],
) -> Result<Vec<SimulationRecord>> {
    println!("{}", "🧭 Running Simulations".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut records = Vec::with_capacity(seeds.len() * strategies.len());
    for &strategy in strategies {
        for &seed in seeds {
            let run_start = Instant::now();
            let record = run_simulation(seed, strategy, config)?;
            if args.verbose {
                let status = if record.passed() {
                    "✅".to_string()
                } else {
                    "❌".red().to_string()
                };
                println!(
                    "{status} [{} seed {seed}] {} entries, {} moonlight - {:?}",
                    strategy.label().green(),
                    record.entries_generated,
                    record.moonlight,
                    run_start.elapsed()
                );
            }
            records.push(record);
        }
    }
    Ok(records)
}

fn write_reports(
    args: &Args,
    records: &[SimulationRecord],
    aggregates: &[SimulationAggregate],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, records, aggregates)?,
        "markdown" => {
            logic::reports::generate_markdown_report(&mut output_target, records, aggregates)?;
        }
        _ => {
            let duration = start_time.elapsed();
            if records.is_empty() {
                writeln!(&mut output_target, "No simulations executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    records,
                    aggregates,
                    duration,
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
