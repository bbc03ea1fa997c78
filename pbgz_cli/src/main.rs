use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing::Level;

use pbgz_codecs::codec_by_name;
use pbgz_core::format::DEFAULT_BLOCK_SIZE;
use pbgz_core::{compress_file, decompress_file, inspect_archive, PipelineConfig};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "pbgz",
    about = "Parallel block gzip compressor for PBGZ archives",
    version
)]
struct Cli {
    /// Log per-run wiring details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a PBGZ archive
    Compress {
        /// Source file to compress
        source: PathBuf,
        /// Destination archive (must not exist)
        archive: PathBuf,
        /// Raw bytes per block (default: 1048576 = 1 MiB)
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: u32,
        #[command(flatten)]
        pool: PoolArgs,
    },
    /// Decompress a PBGZ archive back to the original bytes
    Decompress {
        /// Source archive
        archive: PathBuf,
        /// Destination file (must not exist)
        output: PathBuf,
        #[command(flatten)]
        pool: PoolArgs,
    },
    /// Print header metadata and block table statistics
    Inspect {
        /// Archive to inspect
        archive: PathBuf,
        /// Print the block table in physical order
        #[arg(long)]
        blocks: bool,
    },
}

#[derive(clap::Args)]
struct PoolArgs {
    /// Worker threads (default: logical CPU count)
    #[arg(short, long)]
    workers: Option<usize>,
    /// Bounded queue capacity (default: workers × 5)
    #[arg(short, long)]
    queue_depth: Option<usize>,
    /// Single-block codec: gzip | passthrough
    #[arg(short, long, default_value = "gzip")]
    codec: String,
}

impl PoolArgs {
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(depth) = self.queue_depth {
            config = config.with_queue_depth(depth);
        }
        config
    }
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(source: PathBuf, archive: PathBuf, block_size: u32, pool: PoolArgs) -> anyhow::Result<bool> {
    let codec = codec_by_name(&pool.codec)?;
    let config = pool.config().with_block_size(block_size);
    eprintln!("compress of file {:?} into {:?}", source, archive);

    let t0 = Instant::now();
    let ok = compress_file(&source, &archive, codec.as_ref(), &config)?;
    if ok {
        let raw = std::fs::metadata(&source)?.len();
        let packed = std::fs::metadata(&archive)?.len();
        eprintln!(
            "  {} -> {} in {:.3}s ({} workers)",
            human_bytes(raw),
            human_bytes(packed),
            t0.elapsed().as_secs_f64(),
            config.workers
        );
    }
    Ok(ok)
}

fn run_decompress(archive: PathBuf, output: PathBuf, pool: PoolArgs) -> anyhow::Result<bool> {
    let codec = codec_by_name(&pool.codec)?;
    let config = pool.config();
    eprintln!("decompress of file {:?} into {:?}", archive, output);

    let t0 = Instant::now();
    let ok = decompress_file(&archive, &output, codec.as_ref(), &config)?;
    if ok {
        let raw = std::fs::metadata(&output)?.len();
        eprintln!(
            "  {} restored in {:.3}s ({} workers)",
            human_bytes(raw),
            t0.elapsed().as_secs_f64(),
            config.workers
        );
    }
    Ok(ok)
}

fn run_inspect(archive: PathBuf, show_blocks: bool) -> anyhow::Result<bool> {
    let summary = inspect_archive(&archive)?;

    println!("=== PBGZ archive: {:?} ===", archive);
    println!();
    println!("  block size     : {}", human_bytes(summary.block_size()));
    println!("  block count    : {}", summary.blocks_count());
    println!("  header         : {}", human_bytes(summary.header_len()));
    println!("  compressed     : {}", human_bytes(summary.body_len()));
    println!("  file on disk   : {}", human_bytes(summary.archive_len));
    println!("  raw (at most)  : {}", human_bytes(summary.max_raw_len()));

    if show_blocks {
        println!();
        println!("  {:>8}  {:>10}  {:>14}  {:>12}", "slot", "block", "file offset", "compressed");
        println!("  {}", "-".repeat(50));
        for (slot, (offset, info)) in summary.physical_layout().iter().enumerate() {
            println!(
                "  {:>8}  {:>10}  {:>14}  {:>12}",
                slot,
                info.order_number,
                offset,
                human_bytes(info.compressed_size as u64)
            );
        }
    }

    Ok(true)
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compress {
            source,
            archive,
            block_size,
            pool,
        } => run_compress(source, archive, block_size, pool),
        Commands::Decompress {
            archive,
            output,
            pool,
        } => run_decompress(archive, output, pool),
        Commands::Inspect { archive, blocks } => run_inspect(archive, blocks),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
