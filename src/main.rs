// SPDX-License-Identifier: MIT
//
// trill — a minimal terminal text viewer.
//
// This is the binary that wires the two crates together:
//
//   trill-term   → raw mode, window size, key decoding, ANSI output
//   trill-editor → row buffer, viewport, cursor movement
//
// The control loop strictly alternates:
//
//   refresh_screen → one write to stdout
//   read_key       → blocks (100ms timeouts are absorbed by the decoder)
//   process_key    → cursor / scroll update, or quit
//
// Every fatal error funnels through `die`: blank the screen, make sure the
// terminal is out of raw mode, report, exit 1. The raw-mode guard lives
// inside `run`, so it has already restored the terminal by the time `die`
// prints anything.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use trill_editor::editor::{Action, Editor};
use trill_editor::view;
use trill_term::TermError;
use trill_term::input::{self, ByteSource, Stdin};
use trill_term::output::OutputBuffer;
use trill_term::terminal::{self, RawMode};

/// Environment variable holding the log filter (e.g. `trill=debug`).
const LOG_ENV: &str = "TRILL_LOG";

/// A minimal terminal text viewer. Ctrl-Q quits.
#[derive(Parser, Debug)]
#[command(name = "trill", version, about, long_about = None)]
struct Cli {
    /// File to view (read-only)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Write diagnostic logs to this file (filter with TRILL_LOG)
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Send `tracing` output to `path`.
///
/// The terminal is in raw mode and fully owned by the viewer, so logs never
/// go to stdout or stderr. Without `--log` no subscriber is installed.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

// ─── Control Loop ───────────────────────────────────────────────────────────

fn run(cli: &Cli) -> Result<()> {
    let raw = RawMode::enable().context("cannot enter raw mode")?;
    let mut stdin = Stdin;

    let size = terminal::window_size(&mut stdin, &mut io::stdout())?;
    tracing::info!(cols = size.cols, rows = size.rows, "terminal size");

    let mut editor = match &cli.file {
        Some(path) => Editor::open(path, size)?,
        None => Editor::new(size),
    };

    let mut out = OutputBuffer::new();
    event_loop(&mut editor, &mut stdin, &mut out, &mut io::stdout())?;

    raw.restore()?;
    Ok(())
}

/// Render, read a key, apply it; repeat until the quit key.
///
/// Each frame goes to `sink` in one write. After quit the blank exit frame
/// is written, and the caller restores the terminal.
fn event_loop(
    editor: &mut Editor,
    keys: &mut impl ByteSource,
    out: &mut OutputBuffer,
    sink: &mut impl Write,
) -> Result<()> {
    loop {
        editor.refresh_screen(out);
        out.flush_to(sink).map_err(TermError::Write)?;

        let key = input::read_key(keys)?;
        tracing::trace!(?key, "key");

        if editor.process_key(key) == Action::Quit {
            break;
        }
    }

    tracing::info!("quit");
    view::draw_exit_frame(out);
    out.flush_to(sink).map_err(TermError::Write)?;
    Ok(())
}

/// Fatal error: clear the screen, report, exit 1.
///
/// Screen cleanup is best-effort; a failure there must not hide the
/// original error.
fn die(err: &anyhow::Error) -> ! {
    let mut out = OutputBuffer::new();
    view::draw_exit_frame(&mut out);
    let _ = out.flush_stdout();

    tracing::error!("fatal: {err:#}");
    eprintln!("trill: {err:#}");
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    if let Some(path) = &cli.log {
        if let Err(e) = init_logging(path) {
            eprintln!("trill: {e:#}");
            process::exit(1);
        }
    }

    if let Err(e) = run(&cli) {
        die(&e);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
