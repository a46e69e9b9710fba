//! CLI binary for verse2json.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and writes the resulting JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use verse2json::{
    convert_files_with, write_json, ConversionConfig, ConversionOutput,
    ConversionProgressCallback, Diagnostic, ParseMode, ProgressCallback,
};

/// File name used when `--output` names a directory.
const DEFAULT_OUTPUT_NAME: &str = "nested_verse_data.json";

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a progress bar over primary rows, with one
/// log line per diagnostic printed above it.
struct CliProgressCallback {
    bar: ProgressBar,
    warnings: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_conversion_start
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>5}/{len} groups  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Assembling");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            warnings: AtomicUsize::new(0),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_rows: usize) {
        self.bar.set_length(total_rows as u64);
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Assembling {total_rows} verse groups…"))
        ));
    }

    fn on_row_complete(&self, _row_num: usize, _total: usize, verse_group: &str, chunks: usize) {
        self.bar.set_message(dim(&format!("{verse_group} ({chunks} chunks)")));
        self.bar.inc(1);
    }

    fn on_row_diagnostic(&self, row_num: usize, diagnostic: &Diagnostic) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} row {:>5}  {}",
            yellow("⚠"),
            row_num,
            dim(&diagnostic.to_string())
        ));
    }

    fn on_conversion_complete(&self, total_rows: usize, diagnostics: usize) {
        self.bar.finish_and_clear();
        if diagnostics == 0 {
            eprintln!(
                "{} {} verse groups assembled",
                green("✔"),
                bold(&total_rows.to_string())
            );
        } else {
            eprintln!(
                "{} {} verse groups assembled  ({} warnings)",
                yellow("⚠"),
                bold(&total_rows.to_string()),
                yellow(&diagnostics.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert to stdout
  verse2json verses.csv chunks.csv

  # Write nested_verse_data.json into a directory
  verse2json verses.csv chunks.csv -o out/

  # Strict JSON list cells, 1536-dimension embeddings
  verse2json --parse-mode strict --embedding-dim 1536 verses.csv chunks.csv -o data.json

  # Keep a machine-readable record of every degraded row
  verse2json verses.csv chunks.csv -o data.json --diagnostics warnings.json

PARSE MODES:
  literal       Python-style literals: ['a', "b"], (1, 2), None/True/False (default)
  lenient-json  single quotes rewritten to double quotes, then JSON
  strict        JSON only

  A cell that does not parse in the selected mode is kept as a one-element
  list holding the raw text, and a warning is reported.

ENVIRONMENT VARIABLES:
  RUST_LOG                  Override the log filter (e.g. verse2json=debug)
  VERSE2JSON_OUTPUT         Default for --output
  VERSE2JSON_PARSE_MODE     Default for --parse-mode
  VERSE2JSON_EMBEDDING_DIM  Default for --embedding-dim
"#;

/// Join verse and commentary-chunk tables into nested JSON documents.
#[derive(Parser, Debug)]
#[command(
    name = "verse2json",
    version,
    about = "Join verse and commentary-chunk CSV tables into nested JSON documents",
    long_about = "Join a verse-commentary table (one row per verse group) and a chunk table \
(one row per commentary chunk with an embedding) into one nested JSON document per verse \
group, ready for a semantic-search index.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Primary CSV: one row per verse group.
    primary: PathBuf,

    /// Secondary CSV: one row per commentary chunk.
    secondary: PathBuf,

    /// Write JSON to this file (or directory) instead of stdout.
    #[arg(short, long, env = "VERSE2JSON_OUTPUT")]
    output: Option<PathBuf>,

    /// How loosely formatted list cells are parsed.
    #[arg(long, env = "VERSE2JSON_PARSE_MODE", value_enum, default_value = "literal")]
    parse_mode: ParseModeArg,

    /// Length every embedding vector is padded or truncated to.
    #[arg(long, env = "VERSE2JSON_EMBEDDING_DIM", default_value_t = 768,
          value_parser = clap::value_parser!(u32).range(1..))]
    embedding_dim: u32,

    /// Keep HTML entities in verse text and commentary as-is.
    #[arg(long, env = "VERSE2JSON_NO_HTML_DECODE")]
    no_html_decode: bool,

    /// Omit `verse_group_summary`.
    #[arg(long, env = "VERSE2JSON_NO_SUMMARY")]
    no_summary: bool,

    /// Words taken from the commentary for the summary.
    #[arg(long, env = "VERSE2JSON_SUMMARY_WORDS", default_value_t = 20,
          value_parser = clap::value_parser!(u32).range(1..))]
    summary_words: u32,

    /// Emit a zero-padded `verse_uid` (CCCVVV) on each verse.
    #[arg(long, env = "VERSE2JSON_VERSE_UID")]
    verse_uid: bool,

    /// Skip the check that verse numbers start at the lowest marker.
    #[arg(long, env = "VERSE2JSON_NO_ORDER_CHECK")]
    no_order_check: bool,

    /// Emit compact JSON instead of two-space indented JSON.
    #[arg(long, env = "VERSE2JSON_COMPACT")]
    compact: bool,

    /// Write all diagnostics as a JSON array to this file.
    #[arg(long, env = "VERSE2JSON_DIAGNOSTICS")]
    diagnostics: Option<PathBuf>,

    /// Read every CSV cell as text (no number detection).
    #[arg(long, env = "VERSE2JSON_NO_TYPE_INFERENCE")]
    no_type_inference: bool,

    /// Print conversion statistics as JSON to stderr.
    #[arg(long)]
    stats: bool,

    /// Disable progress bar.
    #[arg(long, env = "VERSE2JSON_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "VERSE2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "VERSE2JSON_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ParseModeArg {
    Strict,
    LenientJson,
    #[value(alias = "literal-syntax")]
    Literal,
}

impl From<ParseModeArg> for ParseMode {
    fn from(v: ParseModeArg) -> Self {
        match v {
            ParseModeArg::Strict => ParseMode::Strict,
            ParseModeArg::LenientJson => ParseMode::LenientJson,
            ParseModeArg::Literal => ParseMode::LiteralSyntax,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Per-row warnings go through the progress bar when it is active, so
    // library logs drop to ERROR in that case.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert_files_with(&cli.primary, &cli.secondary, !cli.no_type_inference, &config)
        .context("Conversion failed")?;
    let json = output
        .to_json(!cli.compact)
        .context("Failed to serialise documents")?;

    if let Some(ref out) = cli.output {
        let path = resolve_output_path(out);
        write_json(&path, &json).context("Failed to write output")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} documents  {} chunks  {}ms  →  {}",
                if output.stats.diagnostics == 0 {
                    green("✔")
                } else {
                    yellow("⚠")
                },
                output.stats.documents,
                output.stats.chunks,
                output.stats.duration_ms,
                bold(&path.display().to_string()),
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .and_then(|_| handle.write_all(b"\n"))
            .context("Failed to write to stdout")?;
    }

    if let Some(ref path) = cli.diagnostics {
        write_diagnostics(path, &output)?;
    }

    if !cli.quiet {
        print_summary(&cli, &output, show_progress)?;
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .parse_mode(cli.parse_mode.clone().into())
        .embedding_dim(cli.embedding_dim as usize)
        .decode_html(!cli.no_html_decode)
        .include_summary(!cli.no_summary)
        .summary_words(cli.summary_words as usize)
        .emit_verse_uid(cli.verse_uid)
        .validate_verse_order(!cli.no_order_check);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// A directory output gets the default file name appended. A path ending in
/// a separator names a directory even before it exists; `write_json`
/// creates it.
fn resolve_output_path(out: &Path) -> PathBuf {
    let names_dir = out
        .as_os_str()
        .to_string_lossy()
        .ends_with(std::path::is_separator);
    if names_dir || out.is_dir() {
        out.join(DEFAULT_OUTPUT_NAME)
    } else {
        out.to_path_buf()
    }
}

fn write_diagnostics(path: &Path, output: &ConversionOutput) -> Result<()> {
    let all: Vec<&Diagnostic> = output.diagnostics().collect();
    let json = serde_json::to_string_pretty(&all).context("Failed to serialise diagnostics")?;
    write_json(path, &json)
        .with_context(|| format!("Failed to write diagnostics to {}", path.display()))
}

fn print_summary(cli: &Cli, output: &ConversionOutput, show_progress: bool) -> Result<()> {
    let stats = &output.stats;
    if cli.stats {
        let json = serde_json::to_string_pretty(stats).context("Failed to serialise stats")?;
        eprintln!("{json}");
    } else if !show_progress && cli.output.is_none() {
        // The progress callback already printed its own summary line.
        eprintln!(
            "Assembled {} documents ({} verses, {} chunks) in {}ms",
            stats.documents, stats.verses, stats.chunks, stats.duration_ms
        );
        if stats.diagnostics > 0 {
            eprintln!("  {} warnings", stats.diagnostics);
        }
    }
    if stats.unmatched_chunks > 0 {
        eprintln!(
            "   {}",
            dim(&format!(
                "{} chunk rows matched no verse group",
                stats.unmatched_chunks
            ))
        );
    }
    Ok(())
}
