// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, window size, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are
// the standard POSIX interfaces for terminal control — there is no safe
// alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// `RawMode` owns the terminal's original attributes. It is created right
// before the control loop and restores the terminal when restored
// explicitly or dropped, so every exit path (quit, `?` error, panic)
// leaves the shell usable.
//
// Window size comes from `TIOCGWINSZ` when the terminal supports it. Some
// terminals report zero columns, so the fallback parks the cursor in the
// bottom-right corner and asks where it ended up.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;
use crate::error::TermError;
use crate::input::{ByteSource, ESC};

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: usize,
    /// Number of rows (height in character cells).
    pub rows: usize,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal, the query fails, or the
/// terminal reports zero columns.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 {
        Some(Size {
            cols: usize::from(ws.ws_col),
            rows: usize::from(ws.ws_row),
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

/// Determine the window size, falling back to a cursor-position probe.
///
/// Tries [`get_size`] first and falls back to [`probe_size`].
///
/// # Errors
///
/// Returns [`TermError::Write`] if the probe can't be written, and
/// [`TermError::WindowSize`] if the reply is missing or malformed.
pub fn window_size(
    input: &mut impl ByteSource,
    out: &mut impl Write,
) -> Result<Size, TermError> {
    if let Some(size) = get_size() {
        tracing::debug!(cols = size.cols, rows = size.rows, "window size from TIOCGWINSZ");
        return Ok(size);
    }

    tracing::debug!("TIOCGWINSZ unavailable, probing cursor position");
    probe_size(input, out)
}

/// Measure the screen by moving the cursor to the bottom-right corner.
///
/// Writes `ESC[999C ESC[999B` then `ESC[6n` to `out` and parses the
/// `ESC[<rows>;<cols>R` reply read from `input`.
///
/// # Errors
///
/// Same as [`window_size`].
pub fn probe_size(
    input: &mut impl ByteSource,
    out: &mut impl Write,
) -> Result<Size, TermError> {
    ansi::cursor_far_corner(out).map_err(TermError::Write)?;
    cursor_position(input, out)
}

/// Ask the terminal where the cursor is and read back the reply.
///
/// # Errors
///
/// Same as [`window_size`].
pub fn cursor_position(
    input: &mut impl ByteSource,
    out: &mut impl Write,
) -> Result<Size, TermError> {
    ansi::request_cursor_position(out).map_err(TermError::Write)?;
    out.flush().map_err(TermError::Write)?;

    let mut reply = Vec::with_capacity(CURSOR_REPORT_MAX);
    while reply.len() < CURSOR_REPORT_MAX {
        match input.read_byte().map_err(TermError::Read)? {
            Some(b'R') | None => break,
            Some(b) => reply.push(b),
        }
    }

    parse_cursor_report(&reply).ok_or(TermError::WindowSize)
}

/// Longest cursor-position reply we are willing to read.
const CURSOR_REPORT_MAX: usize = 31;

/// Parse a cursor-position report with its trailing `R` already removed.
///
/// Accepts `ESC [ <rows> ; <cols>`. Anything after the column digits is
/// ignored.
#[must_use]
pub fn parse_cursor_report(reply: &[u8]) -> Option<Size> {
    let body = reply.strip_prefix(&[ESC, b'['])?;
    let body = std::str::from_utf8(body).ok()?;
    let (rows, cols) = body.split_once(';')?;
    let cols = cols
        .find(|c: char| !c.is_ascii_digit())
        .map_or(cols, |end| &cols[..end]);

    Some(Size {
        rows: rows.parse().ok()?,
        cols: cols.parse().ok()?,
    })
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// [`RawMode`] owns its own copy, but the panic hook can't reach it. This
/// backup lets the hook leave raw mode without the guard.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Take the backup out of [`TERMIOS_BACKUP`], leaving `None`.
///
/// Whoever takes `Some` is the one that restores. A poisoned lock yields
/// `None` from the outer option, so the guard's own restore still runs.
#[cfg(unix)]
fn take_backup() -> Option<Option<libc::termios>> {
    TERMIOS_BACKUP.lock().ok().map(|mut guard| guard.take())
}

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Some(Some(original)) = take_backup() {
        unsafe {
            let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original);
        }
    }
}

/// Blank screen with a visible cursor, written on panic.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[2J\x1b[H\x1b[?25h";

/// Panic hook guard — ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Writes [`EMERGENCY_RESTORE`] straight to fd 1, bypassing Rust's stdout
/// lock in case the panic happened while a frame was being flushed.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Raw Mode ───────────────────────────────────────────────────────────────

/// Raw-mode guard.
///
/// [`enable`](Self::enable) saves the current termios and switches stdin
/// to raw mode. [`restore`](Self::restore) puts the saved attributes back
/// and reports failure; dropping the guard without calling it restores
/// best-effort.
///
/// # Example
///
/// ```no_run
/// use trill_term::terminal::RawMode;
///
/// let raw = RawMode::enable()?;
/// // ... render frames, read keys ...
/// raw.restore()?;
/// # Ok::<(), trill_term::TermError>(())
/// ```
pub struct RawMode {
    /// Attributes captured before raw mode. `None` once restored.
    #[cfg(unix)]
    original: Option<libc::termios>,
}

/// Read timeout in tenths of a second (`VTIME`).
pub const READ_TIMEOUT_DECISECONDS: u8 = 1;

impl RawMode {
    /// Capture the current attributes and enter raw mode.
    ///
    /// Disables canonical mode, echo, signal keys, `IEXTEN`, flow
    /// control, CR→NL translation, output post-processing, parity
    /// checking, and break signalling; forces 8-bit characters; and makes
    /// `read()` return after [`READ_TIMEOUT_DECISECONDS`] with or without
    /// input.
    ///
    /// # Errors
    ///
    /// [`TermError::GetAttr`] if stdin's attributes can't be read (e.g.
    /// stdin is not a terminal), [`TermError::SetAttr`] if the raw
    /// attributes can't be applied.
    #[cfg(unix)]
    pub fn enable() -> Result<Self, TermError> {
        let fd = libc::STDIN_FILENO;

        if !is_tty() {
            return Err(TermError::GetAttr(io::Error::from_raw_os_error(libc::ENOTTY)));
        }

        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &raw mut termios) } != 0 {
            return Err(TermError::GetAttr(io::Error::last_os_error()));
        }

        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = Some(termios);
        }
        install_panic_hook();

        // From here on the guard exists, so an early return restores.
        let guard = Self {
            original: Some(termios),
        };

        let mut attrs = termios;
        attrs.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
        attrs.c_oflag &= !libc::OPOST;
        attrs.c_cflag |= libc::CS8;
        attrs.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
        attrs.c_cc[libc::VMIN] = 0;
        attrs.c_cc[libc::VTIME] = READ_TIMEOUT_DECISECONDS;

        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const attrs) } != 0 {
            return Err(TermError::SetAttr(io::Error::last_os_error()));
        }

        tracing::info!("raw mode enabled");
        Ok(guard)
    }

    #[cfg(not(unix))]
    pub fn enable() -> Result<Self, TermError> {
        Err(TermError::GetAttr(io::Error::from(io::ErrorKind::Unsupported)))
    }

    /// Reapply the original attributes.
    ///
    /// # Errors
    ///
    /// [`TermError::SetAttr`] if `tcsetattr` fails. The guard is consumed
    /// either way, so restoration is attempted exactly once.
    pub fn restore(mut self) -> Result<(), TermError> {
        self.restore_inner()
    }

    #[cfg(unix)]
    fn restore_inner(&mut self) -> Result<(), TermError> {
        let Some(original) = self.original.take() else {
            return Ok(());
        };

        // The panic hook got there first.
        if matches!(take_backup(), Some(None)) {
            return Ok(());
        }

        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) }
            != 0
        {
            return Err(TermError::SetAttr(io::Error::last_os_error()));
        }

        tracing::info!("terminal attributes restored");
        Ok(())
    }

    #[cfg(not(unix))]
    fn restore_inner(&mut self) -> Result<(), TermError> {
        Ok(())
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = self.restore_inner() {
            tracing::error!(error = %e, "failed to restore terminal on drop");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
