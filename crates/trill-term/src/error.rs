// SPDX-License-Identifier: MIT
//
// Terminal errors.
//
// Every variant here is fatal for the viewer: the binary reacts to any of
// them by clearing the screen, restoring the terminal, and exiting with
// status 1. Unrecognised key sequences are not errors; the decoder turns
// them into `Key::Escape`.

use std::io;

use thiserror::Error;

/// An unrecoverable terminal failure.
#[derive(Debug, Error)]
pub enum TermError {
    /// Reading the current terminal attributes failed (`tcgetattr`).
    #[error("tcgetattr failed")]
    GetAttr(#[source] io::Error),

    /// Applying terminal attributes failed (`tcsetattr`).
    #[error("tcsetattr failed")]
    SetAttr(#[source] io::Error),

    /// Reading from stdin failed with something other than a timeout.
    #[error("read from stdin failed")]
    Read(#[source] io::Error),

    /// Writing to stdout failed.
    #[error("write to stdout failed")]
    Write(#[source] io::Error),

    /// Neither `TIOCGWINSZ` nor the cursor-position report produced a size.
    #[error("unable to determine terminal size")]
    WindowSize,
}
