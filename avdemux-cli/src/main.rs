//! avdemux CLI entrypoint.
//!
//! ```bash
//! avdemux streams input.mp4
//! avdemux scan input.mp4 --strict
//! avdemux --sink terminal scan input.mkv --json
//! ```

mod report;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use avdemux_core::{DemuxError, DiagnosticsSink, TerminalSink, TracingSink};
use avdemux_ffmpeg::{FfmpegDemuxer, demuxer_with_sink};

use crate::report::{JSON_SCHEMA_VERSION, scan, streams_report};

const EXIT_FAILURE: u8 = 1;
const EXIT_OPEN_FAILED: u8 = 2;
const EXIT_STRICT_FAILED: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "avdemux",
    version,
    about = "Inspect media containers through the avdemux demuxer",
    arg_required_else_help = true,
    after_help = "Examples:\n  avdemux streams in.mp4\n  avdemux scan in.mp4 --strict\n  avdemux scan in.mkv --json --limit 500"
)]
struct Cli {
    /// Where demuxer diagnostics go.
    #[arg(long = "sink", value_enum, default_value_t = SinkArg::Tracing, global = true)]
    sink: SinkArg,

    /// Disable ANSI colors in log output.
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a container and list its streams.
    Streams(StreamsArgs),
    /// Read every packet and report per-stream statistics.
    Scan(ScanArgs),
}

#[derive(Args, Debug, Clone)]
struct StreamsArgs {
    /// Media container to open.
    path: PathBuf,

    /// Emit one JSON object on stdout.
    #[arg(long = "json")]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct ScanArgs {
    /// Media container to open.
    path: PathBuf,

    /// Emit one JSON object on stdout.
    #[arg(long = "json")]
    json: bool,

    /// Fail unless the file has video and audio, every packet carries a
    /// payload and a timestamp, and at least one video keyframe is seen.
    #[arg(long = "strict")]
    strict: bool,

    /// Stop after this many packets.
    #[arg(long = "limit")]
    limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum SinkArg {
    /// Route through `tracing` (stderr, filtered by RUST_LOG).
    Tracing,
    /// Colored `[LEVEL] message` lines on stdout.
    Terminal,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.no_color);

    let json_command = match &cli.command {
        Commands::Streams(args) if args.json => Some("streams"),
        Commands::Scan(args) if args.json => Some("scan"),
        _ => None,
    };
    // Terminal diagnostics share stdout, which --json reserves for the report.
    let sink: Arc<dyn DiagnosticsSink> = match (cli.sink, json_command) {
        (SinkArg::Terminal, None) => {
            let terminal = TerminalSink::new();
            Arc::new(if cli.no_color {
                terminal.with_color(false)
            } else {
                terminal
            })
        }
        _ => Arc::new(TracingSink),
    };

    let result = match cli.command {
        Commands::Streams(args) => run_streams(args, sink),
        Commands::Scan(args) => run_scan(args, sink),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            let demux = err.downcast_ref::<DemuxError>();
            if let Some(command) = json_command {
                println!("{}", command_error_json(command, &err, demux));
            } else {
                tracing::error!(error = %format!("{err:#}"), "Command failed");
            }
            ExitCode::from(if demux.is_some() {
                EXIT_OPEN_FAILED
            } else {
                EXIT_FAILURE
            })
        }
    }
}

fn init_tracing(no_color: bool) {
    let ansi_enabled =
        !no_color && std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(ansi_enabled)
        .init();
}

fn open(path: &Path, sink: Arc<dyn DiagnosticsSink>) -> anyhow::Result<FfmpegDemuxer> {
    let mut demuxer = demuxer_with_sink(sink);
    demuxer.try_open(path)?;
    Ok(demuxer)
}

fn run_streams(args: StreamsArgs, sink: Arc<dyn DiagnosticsSink>) -> anyhow::Result<ExitCode> {
    let demuxer = open(&args.path, sink)?;
    let report = streams_report(&demuxer);

    if args.json {
        println!(
            "{}",
            serde_json::to_string(&report).context("serialize streams report")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", report.path);
    for stream in &report.streams {
        let detail = match (stream.width, stream.height, stream.sample_rate, stream.channels) {
            (Some(w), Some(h), _, _) => format!(" {w}x{h}"),
            (_, _, Some(rate), Some(ch)) => format!(" {rate} Hz, {ch} ch"),
            _ => String::new(),
        };
        let marker = stream
            .selected
            .map(|kind| format!("  [selected {kind}]"))
            .unwrap_or_default();
        println!(
            "  #{:<2} {:<10} {:<12} tb={}{detail}{marker}",
            stream.index, stream.kind, stream.codec, stream.time_base
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn run_scan(args: ScanArgs, sink: Arc<dyn DiagnosticsSink>) -> anyhow::Result<ExitCode> {
    let mut demuxer = open(&args.path, sink)?;
    let mut report = scan(&mut demuxer, args.limit);
    demuxer.close();

    if args.strict {
        report.violations = report.strict_violations();
        report.ok = report.violations.is_empty();
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string(&report).context("serialize scan report")?
        );
    } else {
        println!("{}: {} packets ({:?})", report.path, report.total_packets, report.ended);
        for tally in &report.streams {
            let role = if Some(tally.index) == report.video_stream_index {
                " video"
            } else if Some(tally.index) == report.audio_stream_index {
                " audio"
            } else {
                ""
            };
            println!(
                "  #{:<2}{role:<6} packets={} bytes={} keyframes={} missing_pts={}",
                tally.index, tally.packets, tally.bytes, tally.keyframes, tally.missing_pts
            );
        }
        if let Some(err) = &report.read_error {
            println!("  read error: {err}");
        }
        for violation in &report.violations {
            println!("  FAILED: {violation}");
        }
    }

    if report.ok {
        tracing::info!(
            path = %report.path,
            packets = report.total_packets,
            "Scan passed"
        );
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::error!(
            path = %report.path,
            violations = report.violations.len(),
            "Strict validation failed"
        );
        Ok(ExitCode::from(EXIT_STRICT_FAILED))
    }
}

fn command_error_json(command: &str, err: &anyhow::Error, demux: Option<&DemuxError>) -> String {
    serde_json::json!({
        "schema_version": JSON_SCHEMA_VERSION,
        "command": command,
        "ok": false,
        "error": format!("{err:#}"),
        "error_code": demux.map(DemuxError::error_code),
    })
    .to_string()
}
