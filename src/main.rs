//! Asset Read Bench CLI
//!
//! Drives the benchmark engine from a host shell: extract the payload, run
//! actions, and build the inputs (payload files and packs).

use anyhow::{Context, Result, bail};
use asset_read_bench::config::{self, BenchConfig};
use asset_read_bench::{
    Action, AssetContainer, BenchmarkResult, CompressionType, Dispatched, Engine, PackAssets,
    PackBuilder, PieceOrder, Summary, assets, generate, logging,
};
use std::path::{Path, PathBuf};

fn usage(program: &str) {
    eprintln!("Asset Read Bench v{}", asset_read_bench::VERSION);
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {} init <assets> [data-dir]", program);
    eprintln!(
        "  {} run <action|all> <assets> [data-dir] [--pieces N] [--runs N] [--shuffle] [--verify] [--json]",
        program
    );
    eprintln!("  {} generate <file> [size-mib]", program);
    eprintln!("  {} pack <out.pack> <none|zlib|zstd|lz4> <files...>", program);
    eprintln!("  {} list <assets>", program);
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  assets    Asset directory or .pack file");
    eprintln!("  data-dir  Private storage root (default: local data dir)");
    eprintln!("  action    e.g. FILE_READ_MULTIPLE_GO or fileReadMultipleGo");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {}  Path to a JSON configuration file", config::CONFIG_ENV);
    eprintln!("  RUST_LOG    Log filter");
}

/// Options of the `run` command
#[derive(Debug, Default)]
struct RunOptions {
    pieces: Option<i64>,
    runs: usize,
    shuffle: bool,
    verify: bool,
    json: bool,
}

/// Splits `args` into positionals and `run` options
fn parse_run_args(args: &[String]) -> Result<(Vec<String>, RunOptions)> {
    let mut positional = Vec::new();
    let mut options = RunOptions {
        runs: 1,
        ..Default::default()
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--pieces" => {
                let value = iter.next().context("--pieces needs a value")?;
                options.pieces = Some(value.parse().context("invalid --pieces")?);
            }
            "--runs" => {
                let value = iter.next().context("--runs needs a value")?;
                options.runs = value.parse().context("invalid --runs")?;
                if options.runs == 0 {
                    bail!("--runs must be at least 1");
                }
            }
            "--shuffle" => options.shuffle = true,
            "--verify" => options.verify = true,
            "--json" => options.json = true,
            flag if flag.starts_with("--") => bail!("unknown option: {}", flag),
            _ => positional.push(arg.clone()),
        }
    }
    Ok((positional, options))
}

fn data_dir_arg(arg: Option<&String>) -> Result<PathBuf> {
    match arg {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => config::default_data_dir().context("no data directory given and no default"),
    }
}

fn parse_actions(name: &str) -> Result<Vec<Action>> {
    if name.eq_ignore_ascii_case("all") {
        return Ok(Action::ALL.to_vec());
    }
    Ok(vec![name.parse()?])
}

fn cmd_init(config: BenchConfig, args: &[String]) -> Result<()> {
    let assets_path = args.first().context("missing <assets>")?;
    let data_dir = data_dir_arg(args.get(1))?;

    let container = assets::open(assets_path)
        .with_context(|| format!("failed to open assets {}", assets_path))?;
    let engine = Engine::new(Some(container.as_ref()), Some(&data_dir), config);
    let report = engine.init()?;

    println!(
        "{} {} ({} bytes, sha256 {})",
        if report.skipped { "Up to date:" } else { "Extracted:" },
        report.path.display(),
        report.bytes,
        report.sha256
    );
    Ok(())
}

fn print_result(result: &BenchmarkResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(result)?);
    } else {
        println!(
            "{:<20} {:<28} {:>12} bytes {:>5} pieces {:>12.3} ms {:>10.1} MB/s",
            result.strategy.to_string(),
            result.source.to_string(),
            result.bytes_read,
            result.pieces,
            result.elapsed_ms(),
            result.throughput_mbps()
        );
    }
    Ok(())
}

fn print_summary(summary: &Summary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
    } else {
        println!(
            "  {} runs: min {:.3} ms, median {:.3} ms, mean {:.3} ms, max {:.3} ms, {:.1} MB/s",
            summary.runs,
            summary.min_nanos as f64 / 1e6,
            summary.median_nanos as f64 / 1e6,
            summary.mean_nanos as f64 / 1e6,
            summary.max_nanos as f64 / 1e6,
            summary.mean_throughput_mbps
        );
    }
    Ok(())
}

fn cmd_run(mut config: BenchConfig, args: &[String]) -> Result<()> {
    let (positional, options) = parse_run_args(args)?;
    let action_name = positional.first().context("missing <action>")?;
    let assets_path = positional.get(1).context("missing <assets>")?;
    let data_dir = data_dir_arg(positional.get(2))?;

    if options.shuffle {
        config.piece_order = PieceOrder::Shuffled;
    }
    if options.verify {
        config.verify = true;
    }

    let actions = parse_actions(action_name)?;
    let container = assets::open(assets_path)
        .with_context(|| format!("failed to open assets {}", assets_path))?;
    let engine = Engine::new(Some(container.as_ref()), Some(&data_dir), config);

    let mut failures = 0;
    for action in actions {
        let mut results = Vec::with_capacity(options.runs);
        for _ in 0..options.runs {
            match engine.dispatch(action, options.pieces) {
                Ok(Dispatched::Init(report)) => {
                    println!("INIT {} ({} bytes)", report.path.display(), report.bytes);
                    break;
                }
                Ok(Dispatched::Bench(result)) => {
                    print_result(&result, options.json)?;
                    results.push(result);
                }
                Err(e) => {
                    eprintln!("{} failed: {}", action, e);
                    failures += 1;
                    break;
                }
            }
        }
        if results.len() > 1 {
            if let Some(summary) = Summary::from_results(&results) {
                print_summary(&summary, options.json)?;
            }
        }
    }

    if failures > 0 {
        bail!("{} action(s) failed", failures);
    }
    Ok(())
}

fn cmd_generate(args: &[String]) -> Result<()> {
    let path = args.first().context("missing <file>")?;
    let size_mib = match args.get(1) {
        Some(s) => s.parse().context("invalid size")?,
        None => generate::DEFAULT_SIZE_MIB,
    };

    let bytes = generate::write_random_file(path, size_mib)?;
    println!(
        "File '{}' with random content of size {}MB has been created ({} bytes).",
        path, size_mib, bytes
    );
    Ok(())
}

fn cmd_pack(args: &[String]) -> Result<()> {
    let out = args.first().context("missing <out.pack>")?;
    let compression: CompressionType = args
        .get(1)
        .context("missing <compression>")?
        .parse()?;
    let files = &args[2.min(args.len())..];
    if files.is_empty() {
        bail!("no input files");
    }

    let mut builder = PackBuilder::new(compression);
    for file in files {
        let path = Path::new(file);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("bad file name: {}", file))?;
        builder.add_file(name, path)?;
    }

    for entry in builder.write_to(out)? {
        println!(
            "{:<32} {:>6} {:>12} -> {:>12} bytes",
            entry.name,
            format!("{:?}", entry.compression).to_lowercase(),
            entry.raw_len,
            entry.stored_len
        );
    }
    Ok(())
}

fn cmd_list(args: &[String]) -> Result<()> {
    let assets_path = args.first().context("missing <assets>")?;
    if Path::new(assets_path).is_file() {
        return list_pack(assets_path);
    }

    let container = assets::open(assets_path)
        .with_context(|| format!("failed to open assets {}", assets_path))?;
    for name in container.list() {
        println!("{}", name);
    }
    Ok(())
}

/// Prints the pack index, then checks every entry against its checksum
fn list_pack(path: &str) -> Result<()> {
    let pack = PackAssets::open(path).with_context(|| format!("failed to open pack {}", path))?;
    for name in pack.list() {
        if let Some(entry) = pack.entry(&name) {
            println!(
                "{:<32} {:>6} {:>12} -> {:>12} bytes",
                entry.name,
                format!("{:?}", entry.compression).to_lowercase(),
                entry.raw_len,
                entry.stored_len
            );
        }
    }
    pack.verify_all()
        .with_context(|| format!("pack {} failed verification", path))?;
    println!("All entries verified");
    Ok(())
}

fn run(args: &[String]) -> Result<()> {
    let config = BenchConfig::from_env().context("failed to load configuration")?;
    logging::init(&config.log_filter);

    let rest = &args[2..];
    match args[1].as_str() {
        "init" => cmd_init(config, rest),
        "run" => cmd_run(config, rest),
        "generate" => cmd_generate(rest),
        "pack" => cmd_pack(rest),
        "list" => cmd_list(rest),
        other => bail!("unknown command: {}", other),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || matches!(args[1].as_str(), "-h" | "--help" | "help") {
        usage(args.first().map(String::as_str).unwrap_or("asset-read-bench"));
        std::process::exit(1);
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
