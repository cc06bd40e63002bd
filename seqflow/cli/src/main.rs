//! Seqflow CLI - Line-Oriented Pipelines over Standard Input
//!
//! Runs the seqflow operators over stdin, one element per line.
//!
//! # Usage
//!
//! ```bash
//! # CRC32 of every line, 8 workers, input order preserved
//! seqflow crc -j 8 < input.txt
//!
//! # Completion order, at most 100 lines per second, JSON output
//! seqflow crc --unordered --rate 100 --per-ms 1000 --json < input.txt
//!
//! # Batch lines into 2 second tumbling windows
//! tail -f app.log | seqflow window tumbling --size-ms 2000
//!
//! # Sessions separated by half a second of silence
//! seqflow window session --gap-ms 500
//!
//! # Verbose logging (stderr)
//! RUST_LOG=seqflow_core=debug seqflow crc < input.txt
//! ```
//!
//! # Signals
//!
//! - `SIGINT`: cancels the pipeline; windows flush what they hold

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio_stream::wrappers::LinesStream;
use tracing::{info, warn};

use seqflow_core::config::{load_config_from_path, RateLimitSettings};
use seqflow_core::parallel::parallel_map_ctx;
use seqflow_core::timing::rate_limit_ctx;
use seqflow_core::window::{session_window_ctx, sliding_time_window_ctx, tumbling_time_window_ctx};
use seqflow_core::{CancelToken, ConfigOverrides, FlowConfigFile, FlowStream};

/// Seqflow - concurrent and time-driven pipelines over stdin lines
#[derive(Parser, Debug)]
#[command(name = "seqflow")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "SEQFLOW_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "SEQFLOW_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Cancel the whole pipeline after this many milliseconds
    #[arg(long, value_name = "MS")]
    deadline_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the CRC32 of every line in parallel
    Crc(CrcArgs),
    /// Group lines into time windows and print each as a JSON array
    Window(WindowArgs),
}

/// Parallel engine overrides shared by the subcommands that use it
#[derive(clap::Args, Debug, Default)]
struct ParallelArgs {
    /// Number of concurrent workers
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Emit results in completion order
    #[arg(long)]
    unordered: bool,

    /// Work and result queue capacity
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Reorder in fixed batches of this many lines (0 = streaming)
    #[arg(long)]
    chunk_size: Option<usize>,
}

impl ParallelArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            concurrency: self.concurrency,
            ordered: self.unordered.then_some(false),
            buffer_size: self.buffer_size,
            chunk_size: self.chunk_size,
        }
    }
}

#[derive(clap::Args, Debug)]
struct CrcArgs {
    #[command(flatten)]
    parallel: ParallelArgs,

    /// Emit at most this many results per period
    #[arg(long)]
    rate: Option<u32>,

    /// Rate limit period in milliseconds
    #[arg(long, default_value_t = 1000)]
    per_ms: u64,

    /// Print one JSON object per line
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum WindowKind {
    Tumbling,
    Sliding,
    Session,
}

#[derive(clap::Args, Debug)]
struct WindowArgs {
    /// Window strategy
    #[arg(value_enum)]
    kind: WindowKind,

    /// Window length in milliseconds (tumbling, sliding)
    #[arg(long, default_value_t = 1000)]
    size_ms: u64,

    /// Slide in milliseconds (sliding; defaults to half the size, at least 1)
    #[arg(long)]
    slide_ms: Option<u64>,

    /// Inactivity gap in milliseconds (session)
    #[arg(long, default_value_t = 500)]
    gap_ms: u64,
}

impl WindowArgs {
    /// Explicit slide, else half the window, never zero
    fn effective_slide_ms(&self) -> u64 {
        self.slide_ms.unwrap_or(self.size_ms / 2).max(1)
    }
}

// =============================================================================
// Records
// =============================================================================

/// Checksum of one input line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct LineChecksum {
    line: usize,
    bytes: usize,
    crc32: u32,
}

impl LineChecksum {
    fn compute(line: usize, text: &str) -> Self {
        Self {
            line,
            bytes: text.len(),
            crc32: crc32fast::hash(text.as_bytes()),
        }
    }

    fn render(&self, json: bool) -> Result<String> {
        if json {
            serde_json::to_string(self).context("Failed to encode checksum")
        } else {
            Ok(format!("{}\t{:08x}\t{}", self.line, self.crc32, self.bytes))
        }
    }
}

// =============================================================================
// Plumbing
// =============================================================================

/// Initialize logging to stderr so stdout stays machine-readable
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("seqflow={level},seqflow_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn stdin_lines() -> impl Stream<Item = String> + Send + 'static {
    LinesStream::new(BufReader::new(tokio::io::stdin()).lines()).filter_map(|line| {
        futures::future::ready(match line {
            Ok(line) => Some(line),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable input line");
                None
            }
        })
    })
}

/// Cancel `token` on the first Ctrl-C
fn cancel_on_interrupt(token: &CancelToken) {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received SIGINT, cancelling pipeline");
            token.cancel();
        }
    });
}

fn resolve_rate(args: &CrcArgs, config: &FlowConfigFile) -> Option<RateLimitSettings> {
    match args.rate {
        Some(per_period) => Some(RateLimitSettings {
            per_period,
            period: Duration::from_millis(args.per_ms),
        }),
        None => config.rate_limit,
    }
}

// =============================================================================
// Commands
// =============================================================================

async fn run_crc(token: &CancelToken, args: &CrcArgs, mut config: FlowConfigFile) -> Result<u64> {
    args.parallel.overrides().apply(&mut config);
    info!(
        concurrency = config.parallel.concurrency(),
        ordered = config.parallel.ordered(),
        source = %config.source(),
        "Starting checksum pipeline"
    );

    let checksums: FlowStream<LineChecksum> = parallel_map_ctx(
        token,
        stdin_lines().enumerate(),
        |(line, text)| async move { LineChecksum::compute(line + 1, &text) },
        config.parallel.clone(),
    );
    let mut checksums = match resolve_rate(args, &config) {
        Some(rate) => rate_limit_ctx(token, checksums, rate.per_period, rate.period),
        None => checksums,
    };

    let mut out = BufWriter::new(tokio::io::stdout());
    let mut written = 0u64;
    while let Some(checksum) = checksums.next().await {
        let mut rendered = checksum.render(args.json)?;
        rendered.push('\n');
        out.write_all(rendered.as_bytes()).await?;
        written += 1;
    }
    out.flush().await?;
    Ok(written)
}

async fn run_window(token: &CancelToken, args: &WindowArgs) -> Result<u64> {
    let size = Duration::from_millis(args.size_ms);
    let lines = stdin_lines();
    let mut windows = match args.kind {
        WindowKind::Tumbling => tumbling_time_window_ctx(token, lines, size),
        WindowKind::Sliding => {
            let slide = Duration::from_millis(args.effective_slide_ms());
            sliding_time_window_ctx(token, lines, size, slide)
        }
        WindowKind::Session => {
            session_window_ctx(token, lines, Duration::from_millis(args.gap_ms))
        }
    };

    let mut out = BufWriter::new(tokio::io::stdout());
    let mut written = 0u64;
    while let Some(window) = windows.next().await {
        let mut rendered = serde_json::to_string(&window).context("Failed to encode window")?;
        rendered.push('\n');
        out.write_all(rendered.as_bytes()).await?;
        // Windows are sparse; make each visible as soon as it closes
        out.flush().await?;
        written += 1;
    }
    Ok(written)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = match args.config.clone() {
        Some(path) => load_config_from_path(Some(path)),
        None => seqflow_core::load_config(),
    }
    .context("Failed to load configuration")?;

    let root = CancelToken::new();
    cancel_on_interrupt(&root);
    let token = match args.deadline_ms {
        Some(ms) => root.with_timeout(Duration::from_millis(ms)),
        None => root.child(),
    };

    let written = match &args.command {
        Command::Crc(crc) => run_crc(&token, crc, config).await?,
        Command::Window(window) => run_window(&token, window).await?,
    };

    match token.error() {
        Some(e) => warn!(error = %e, written, "Pipeline stopped early"),
        None => info!(written, "Pipeline finished"),
    }
    Ok(())
}
