use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser as ClapParser;
use loglens_stats::{Parser, ParserConfig, StatType};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "loglens-stats")]
#[command(version)]
#[command(about = "Frequency stats over an nginx access log")]
struct Args {
    /// Access log to read
    #[arg(value_name = "FILE", default_value = "access.log")]
    input: PathBuf,

    /// Dimension to print: ips, status_codes, pages, hits, user_agents, extensions
    #[arg(long, short, default_value = "ips")]
    stat: StatType,

    /// Only show entries seen at least this many times (0 shows everything)
    #[arg(long, short, default_value_t = 1000)]
    min: u64,

    /// Matcher threads (defaults to the CPU count)
    #[arg(long, short)]
    workers: Option<usize>,

    /// JSON file with a parser config, e.g. {"workers": 8, "queue_capacity": 64}
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Echo every matched record as a JSON line while parsing
    #[arg(long)]
    records: bool,
}

fn load_config(args: &Args) -> anyhow::Result<ParserConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ParserConfig::from_json(&json)?
        }
        None => ParserConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    Ok(config.normalized())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!("args: {args:?}");

    let config = load_config(&args)?;
    let parser = Parser::with_config(config);

    let file = File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;

    let started = Instant::now();
    let summary = if args.records {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        parser.parse_with(file, |record| {
            if let Ok(line) = serde_json::to_string(record) {
                let _ = writeln!(out, "{line}");
            }
        })?
    } else {
        parser.parse(file)?
    };
    let elapsed = humantime::format_duration(started.elapsed());
    tracing::info!(
        lines = summary.lines,
        records = summary.records,
        dropped = summary.dropped(),
        "parsed {} in {elapsed}",
        args.input.display()
    );

    let stats = parser.stats(args.stat, args.min);
    let (ipv4, ipv6) = parser.ips_count();

    if args.json {
        let output = serde_json::json!({
            "count": parser.count(),
            "ipv4": ipv4,
            "ipv6": ipv6,
            "stat": args.stat,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} (min {}):", args.stat, args.min);
        for stat in &stats {
            println!("{:>10}  {}", stat.value, stat.name);
        }
        println!("requests: {}", parser.count());
        println!("ipv4: {ipv4} ipv6: {ipv6}");
    }

    Ok(())
}
