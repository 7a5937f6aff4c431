// SPDX-License-Identifier: MIT
//
// trill-term — Terminal layer for trill.
//
// Everything that touches the terminal lives here: entering and leaving
// raw mode through termios, probing the window size, the handful of ANSI
// sequences the viewer emits, the frame output buffer, and the decoder
// that turns raw stdin bytes into keys.
//
// Like the rest of trill, this crate talks to the terminal directly with
// ANSI escape sequences and raw termios. No TUI framework sits in between.

pub mod ansi;
pub mod error;
pub mod input;
pub mod output;
pub mod terminal;

pub use error::TermError;
