//! Framepump CLI - drive a media transform workstream from the command line.
//!
//! All diagnostics go to stderr. The primary output stream carries only
//! produced bytes, so an encoded bitstream never picks up log text.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use framepump::{
    BitstreamFormat, DecodeConfig, DecodePump, DeviceTarget, EncodeConfig, EncodePump,
    FrameSink, NullFrameSink, RawFrameReader, RawWriterSink, Resolution, SoftwareDecoder,
    SoftwareEncoder,
};
use framepump_core::RawFormat;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::debug;

/// Command-line interface for the framepump driver.
#[derive(Parser, Debug)]
#[command(name = "framepump")]
#[command(version)]
#[command(about = "State-driven driver for media transform workstreams")]
struct Cli {
    /// Verbose diagnostics on stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit the run summary as one JSON object on stderr
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a bitstream into raw frames
    Decode(DecodeArgs),
    /// Encode raw frames into a bitstream
    Encode(EncodeArgs),
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Input bitstream file
    #[arg(short, long)]
    input: PathBuf,

    /// Write decoded frames to this file instead of discarding them
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input bitstream format
    #[arg(long, value_enum, default_value = "h264")]
    format: FormatArg,

    /// Output resolution as WIDTHxHEIGHT
    #[arg(long, default_value = "352x288", value_parser = parse_resolution)]
    resolution: Resolution,

    /// Raw format of decoded frames
    #[arg(long, value_enum, default_value = "nv12")]
    raw_format: RawFormatArg,

    /// Target device preference
    #[arg(long, value_enum, default_value = "auto")]
    device: DeviceArg,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Input raw NV12 file
    #[arg(short, long)]
    input: PathBuf,

    /// Output bitstream file, or `-` for stdout
    #[arg(short, long)]
    output: PathBuf,

    /// Frame width in pixels
    #[arg(long)]
    width: u32,

    /// Frame height in pixels
    #[arg(long)]
    height: u32,

    /// Output bitstream format
    #[arg(long, value_enum, default_value = "h264")]
    format: FormatArg,

    /// Target device preference
    #[arg(long, value_enum, default_value = "auto")]
    device: DeviceArg,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum FormatArg {
    H264,
    Hevc,
}

impl From<FormatArg> for BitstreamFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::H264 => BitstreamFormat::H264,
            FormatArg::Hevc => BitstreamFormat::Hevc,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum RawFormatArg {
    Nv12,
    Rgba,
}

impl From<RawFormatArg> for RawFormat {
    fn from(arg: RawFormatArg) -> Self {
        match arg {
            RawFormatArg::Nv12 => RawFormat::Nv12,
            RawFormatArg::Rgba => RawFormat::Rgba,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum DeviceArg {
    Auto,
    Gpu,
    Cpu,
}

impl From<DeviceArg> for DeviceTarget {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Auto => DeviceTarget::Auto,
            DeviceArg::Gpu => DeviceTarget::Gpu,
            DeviceArg::Cpu => DeviceTarget::Cpu,
        }
    }
}

/// Parse `WIDTHxHEIGHT` into a resolution.
fn parse_resolution(value: &str) -> Result<Resolution, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width = w.parse().map_err(|_| format!("bad width '{w}'"))?;
    let height = h.parse().map_err(|_| format!("bad height '{h}'"))?;
    Ok(Resolution::new(width, height))
}

/// Run summary emitted on stderr.
#[derive(Debug, Serialize)]
struct Summary {
    /// Operation that ran.
    operation: &'static str,
    /// Frames processed.
    frames: u64,
    /// Wall time spent inside engine calls, seconds.
    engine_seconds: f64,
    /// Frames per second of engine time, when defined.
    fps: Option<f64>,
    /// Encoded bytes written (encode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes_written: Option<u64>,
    /// Encoded over raw bytes (encode only), when defined.
    #[serde(skip_serializing_if = "Option::is_none")]
    compression_ratio: Option<f64>,
}

impl Summary {
    fn print(&self, json: bool) {
        if json {
            if let Ok(line) = serde_json::to_string(self) {
                eprintln!("{line}");
            }
            return;
        }

        eprintln!();
        eprintln!("{}", style("Summary:").cyan().bold());
        eprintln!("  Frames processed : {}", self.frames);
        eprintln!("  Engine time      : {:.3}s", self.engine_seconds);
        match self.fps {
            Some(fps) => eprintln!("  Frames per second: {fps:.2}"),
            None => eprintln!("  Frames per second: n/a"),
        }
        if let Some(bytes) = self.bytes_written {
            eprintln!("  Bytes written    : {bytes}");
        }
        if let Some(ratio) = self.compression_ratio {
            eprintln!("  Compression ratio: {ratio:.4}");
        }
    }
}

/// Per-frame progress bar on stderr, hidden in quiet and JSON modes.
fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("static progress template"),
    );
    pb
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let quiet = cli.quiet || cli.json;
    match cli.command {
        Command::Decode(args) => run_decode(args, quiet, cli.json),
        Command::Encode(args) => run_encode(args, quiet, cli.json),
    }
}

fn run_decode(args: DecodeArgs, quiet: bool, json: bool) -> anyhow::Result<()> {
    let config = DecodeConfig::new(args.format.into())
        .with_device(args.device.into())
        .with_dst_format(args.raw_format.into())
        .with_output(args.resolution);
    debug!(?config, "decode configuration");

    let mut engine = SoftwareDecoder::new(&config).context("failed to create decoder")?;
    let input = File::open(&args.input)
        .with_context(|| format!("failed to open input '{}'", args.input.display()))?;
    let mut reader = BufReader::new(input);

    let report = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output '{}'", path.display()))?;
            let mut sink = RawWriterSink::new(BufWriter::new(file));
            let report = drive_decode(&mut engine, &mut reader, &mut sink, quiet)?;
            sink.into_inner().flush()?;
            report
        }
        None => drive_decode(&mut engine, &mut reader, &mut NullFrameSink, quiet)?,
    };

    if let Some(path) = &args.output {
        eprintln!(
            "{} {} ({} raw frames at {})",
            style("Wrote").green().bold(),
            path.display(),
            report.frames,
            config.output_info(),
        );
    }

    Summary {
        operation: "decode",
        frames: report.frames,
        engine_seconds: report.engine_time.as_secs_f64(),
        fps: report.fps(),
        bytes_written: None,
        compression_ratio: None,
    }
    .print(json);
    Ok(())
}

fn drive_decode<R, S>(
    engine: &mut SoftwareDecoder,
    reader: &mut R,
    sink: &mut S,
    quiet: bool,
) -> anyhow::Result<framepump::DecodeReport>
where
    R: Read,
    S: FrameSink,
{
    let pb = progress_bar(quiet);
    let pb_frames = pb.clone();
    let report = DecodePump::new()
        .on_progress(move |frame| {
            pb_frames.set_message(format!("Frame: {frame}"));
            pb_frames.tick();
        })
        .run(engine, reader, sink)
        .context("decode run failed")?;
    pb.finish_and_clear();
    Ok(report)
}

fn run_encode(args: EncodeArgs, quiet: bool, json: bool) -> anyhow::Result<()> {
    let config = EncodeConfig::new(
        args.format.into(),
        Resolution::new(args.width, args.height),
    )
    .with_device(args.device.into());
    debug!(?config, "encode configuration");

    let mut engine = SoftwareEncoder::new(&config).context("failed to create encoder")?;
    let input = File::open(&args.input)
        .with_context(|| format!("failed to open input '{}'", args.input.display()))?;
    let mut source = RawFrameReader::new(BufReader::new(input), config.source_info());

    // Only produced bytes touch the output stream.
    let mut dest: Box<dyn Write> = if args.output.as_os_str() == "-" {
        Box::new(std::io::stdout().lock())
    } else {
        let file = File::create(&args.output)
            .with_context(|| format!("failed to create output '{}'", args.output.display()))?;
        Box::new(BufWriter::new(file))
    };

    let pb = progress_bar(quiet);
    let pb_frames = pb.clone();
    let report = EncodePump::new()
        .on_progress(move |frame| {
            pb_frames.set_message(format!("Frame: {frame}"));
            pb_frames.tick();
        })
        .run(&mut engine, &mut source, &mut dest)
        .context("encode run failed")?;
    pb.finish_and_clear();
    dest.flush()?;
    source.reclaim();

    Summary {
        operation: "encode",
        frames: report.frames,
        engine_seconds: report.engine_time.as_secs_f64(),
        fps: report.fps(),
        bytes_written: Some(report.bytes_written),
        compression_ratio: report.compression_ratio(),
    }
    .print(json);
    Ok(())
}
