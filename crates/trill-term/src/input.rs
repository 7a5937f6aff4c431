// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Terminal input decoder.
//
// Turns raw stdin bytes into keys. Terminals encode navigation keys as
// short escape sequences, and this decoder recognises exactly the forms
// that common emulators send:
//
//   ESC [ <digit> ~   Home / Delete / End / PageUp / PageDown (VT style)
//   ESC [ <letter>    arrows, Home, End (xterm style)
//   ESC O <letter>    Home, End (application cursor mode)
//
// Anything else that starts with ESC decodes to `Key::Escape`, which the
// editor ignores. That keeps unknown sequences harmless instead of fatal.
//
// # Timeouts
//
// Raw mode is configured with VMIN=0 / VTIME=1, so a read returns after
// at most 100ms even with nothing typed. A `ByteSource` reports that as
// `Ok(None)`. While waiting for the first byte of a key we simply read
// again; inside an escape sequence a timeout means the user pressed a
// bare Escape.

use std::io;

use crate::error::TermError;

// ─── Keys ───────────────────────────────────────────────────────────────────

/// Escape byte (0x1B).
pub const ESC: u8 = 0x1b;

/// A decoded key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Any byte that is not the start of an escape sequence, including
    /// control characters such as Ctrl-Q (`0x11`).
    Char(u8),
    /// A bare Escape, or an escape sequence we don't recognise.
    Escape,
    // ── Navigation ──────────────────────────────────────────────
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
    // ── Editing ─────────────────────────────────────────────────
    Delete,
}

/// The byte a terminal sends for Ctrl + `k`.
///
/// Ctrl clears bits 5 and 6, so `ctrl_key(b'q')` is `0x11`.
#[inline]
#[must_use]
pub const fn ctrl_key(k: u8) -> u8 {
    k & 0x1f
}

// ─── Byte Sources ───────────────────────────────────────────────────────────

/// Something the decoder can pull single bytes from.
///
/// `Ok(None)` means the read timed out with no data. Errors are fatal.
pub trait ByteSource {
    /// Read one byte, or `None` on timeout.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than a timeout.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// In-memory source: yields the slice, then times out forever.
impl ByteSource for &[u8] {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        match self.split_first() {
            Some((&b, rest)) => {
                *self = rest;
                Ok(Some(b))
            }
            None => Ok(None),
        }
    }
}

/// The process's stdin, read one byte per `read()` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdin;

impl ByteSource for Stdin {
    #[cfg(unix)]
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };

        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(err),
                }
            }
        }
    }

    #[cfg(not(unix))]
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        use std::io::Read;

        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Block until a full key has been read from `src`.
///
/// Timeouts before the first byte are absorbed here; callers never see
/// "no input". With an in-memory source that is already empty this never
/// returns, so tests always supply at least one byte.
///
/// # Errors
///
/// Returns [`TermError::Read`] if the source fails with anything other
/// than a timeout.
pub fn read_key(src: &mut impl ByteSource) -> Result<Key, TermError> {
    let c = loop {
        if let Some(b) = src.read_byte().map_err(TermError::Read)? {
            break b;
        }
    };

    if c != ESC {
        return Ok(Key::Char(c));
    }

    let Some(first) = next(src)? else {
        return Ok(Key::Escape);
    };
    let Some(second) = next(src)? else {
        return Ok(Key::Escape);
    };

    let key = match (first, second) {
        (b'[', b'0'..=b'9') => match next(src)? {
            Some(b'~') => vt_key(second),
            _ => None,
        },
        (b'[', letter) => csi_key(letter),
        (b'O', letter) => ss3_key(letter),
        _ => None,
    };

    Ok(key.unwrap_or(Key::Escape))
}

/// Read one byte inside an escape sequence. A timeout ends the sequence.
fn next(src: &mut impl ByteSource) -> Result<Option<u8>, TermError> {
    src.read_byte().map_err(TermError::Read)
}

/// `ESC [ <digit> ~`
const fn vt_key(digit: u8) -> Option<Key> {
    match digit {
        b'1' | b'7' => Some(Key::Home),
        b'3' => Some(Key::Delete),
        b'4' | b'8' => Some(Key::End),
        b'5' => Some(Key::PageUp),
        b'6' => Some(Key::PageDown),
        _ => None,
    }
}

/// `ESC [ <letter>`
const fn csi_key(letter: u8) -> Option<Key> {
    match letter {
        b'A' => Some(Key::ArrowUp),
        b'B' => Some(Key::ArrowDown),
        b'C' => Some(Key::ArrowRight),
        b'D' => Some(Key::ArrowLeft),
        b'H' => Some(Key::Home),
        b'F' => Some(Key::End),
        _ => None,
    }
}

/// `ESC O <letter>`
const fn ss3_key(letter: u8) -> Option<Key> {
    match letter {
        b'H' => Some(Key::Home),
        b'F' => Some(Key::End),
        _ => None,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: decode one key from a byte string.
    fn decode(data: &[u8]) -> Key {
        let mut src = data;
        read_key(&mut src).unwrap()
    }

    /// Helper: decode one key and report how many bytes were left over.
    fn decode_rest(data: &[u8]) -> (Key, usize) {
        let mut src = data;
        let key = read_key(&mut src).unwrap();
        (key, src.len())
    }

    /// Source that times out a fixed number of times before yielding bytes.
    struct Sleepy<'a> {
        timeouts: usize,
        data: &'a [u8],
    }

    impl ByteSource for Sleepy<'_> {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            if self.timeouts > 0 {
                self.timeouts -= 1;
                return Ok(None);
            }
            self.data.read_byte()
        }
    }

    /// Source that always fails.
    struct Broken(io::ErrorKind);

    impl ByteSource for Broken {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            Err(io::Error::from(self.0))
        }
    }

    // ── Plain bytes ─────────────────────────────────────────────────

    #[test]
    fn printable_byte_is_char() {
        assert_eq!(decode(b"a"), Key::Char(b'a'));
    }

    #[test]
    fn control_byte_is_char() {
        assert_eq!(decode(b"\x11"), Key::Char(0x11));
    }

    #[test]
    fn high_byte_is_char() {
        assert_eq!(decode(&[0xC3]), Key::Char(0xC3));
    }

    #[test]
    fn only_first_byte_is_consumed() {
        assert_eq!(decode_rest(b"abc"), (Key::Char(b'a'), 2));
    }

    #[test]
    fn ctrl_key_clears_upper_bits() {
        assert_eq!(ctrl_key(b'q'), 0x11);
        assert_eq!(ctrl_key(b'a'), 0x01);
        assert_eq!(ctrl_key(b'Q'), 0x11);
    }

    // ── Timeouts ────────────────────────────────────────────────────

    #[test]
    fn timeouts_before_first_byte_are_absorbed() {
        let mut src = Sleepy {
            timeouts: 5,
            data: b"x",
        };
        assert_eq!(read_key(&mut src).unwrap(), Key::Char(b'x'));
    }

    #[test]
    fn lone_escape() {
        assert_eq!(decode(b"\x1b"), Key::Escape);
    }

    #[test]
    fn escape_then_one_byte() {
        assert_eq!(decode(b"\x1b["), Key::Escape);
    }

    #[test]
    fn escape_digit_without_terminator() {
        assert_eq!(decode(b"\x1b[5"), Key::Escape);
    }

    // ── ESC [ <digit> ~ ─────────────────────────────────────────────

    #[test]
    fn vt_sequences_table() {
        let cases: [(&[u8; 4], Key); 7] = [
            (b"\x1b[1~", Key::Home),
            (b"\x1b[3~", Key::Delete),
            (b"\x1b[4~", Key::End),
            (b"\x1b[5~", Key::PageUp),
            (b"\x1b[6~", Key::PageDown),
            (b"\x1b[7~", Key::Home),
            (b"\x1b[8~", Key::End),
        ];
        for (bytes, expected) in cases {
            assert_eq!(decode(bytes), expected, "input {bytes:?}");
        }
    }

    #[test]
    fn unmapped_digits_are_escape() {
        for digit in [b'0', b'2', b'9'] {
            assert_eq!(decode(&[ESC, b'[', digit, b'~']), Key::Escape);
        }
    }

    #[test]
    fn digit_with_wrong_terminator_is_escape() {
        assert_eq!(decode_rest(b"\x1b[5A"), (Key::Escape, 0));
    }

    // ── ESC [ <letter> ──────────────────────────────────────────────

    #[test]
    fn csi_sequences_table() {
        let cases: [(&[u8; 3], Key); 6] = [
            (b"\x1b[A", Key::ArrowUp),
            (b"\x1b[B", Key::ArrowDown),
            (b"\x1b[C", Key::ArrowRight),
            (b"\x1b[D", Key::ArrowLeft),
            (b"\x1b[H", Key::Home),
            (b"\x1b[F", Key::End),
        ];
        for (bytes, expected) in cases {
            assert_eq!(decode(bytes), expected, "input {bytes:?}");
        }
    }

    #[test]
    fn csi_letter_consumes_three_bytes() {
        assert_eq!(decode_rest(b"\x1b[Axyz"), (Key::ArrowUp, 3));
    }

    // ── ESC O <letter> ──────────────────────────────────────────────

    #[test]
    fn ss3_sequences_table() {
        assert_eq!(decode(b"\x1bOH"), Key::Home);
        assert_eq!(decode(b"\x1bOF"), Key::End);
    }

    #[test]
    fn ss3_arrows_are_not_mapped() {
        assert_eq!(decode(b"\x1bOA"), Key::Escape);
    }

    // ── Unrecognised sequences ──────────────────────────────────────

    #[test]
    fn every_unlisted_three_byte_sequence_is_escape() {
        let listed: [&[u8; 3]; 8] = [
            b"\x1b[A", b"\x1b[B", b"\x1b[C", b"\x1b[D", b"\x1b[H", b"\x1b[F", b"\x1bOH",
            b"\x1bOF",
        ];
        for first in 0u8..=255 {
            for second in [b'A', b'F', b'H', b'Z', b'x', b'~', ESC] {
                let seq = [ESC, first, second];
                if listed.contains(&&seq) {
                    continue;
                }
                // `ESC [ <digit>` waits for a fourth byte; with none it's Escape too.
                assert_eq!(decode(&seq), Key::Escape, "input {seq:?}");
            }
        }
    }

    #[test]
    fn alt_letter_is_escape() {
        assert_eq!(decode_rest(b"\x1bxy"), (Key::Escape, 0));
    }

    // ── Errors ──────────────────────────────────────────────────────

    #[test]
    fn read_error_is_fatal() {
        let err = read_key(&mut Broken(io::ErrorKind::BrokenPipe)).unwrap_err();
        assert!(matches!(err, TermError::Read(_)));
    }
}
