//! Viewport — scroll offsets and frame rendering.
//!
//! A [`Viewport`] knows the screen size and which part of the buffer is on
//! screen (`rowoff`, `coloff`). Each frame it first [`scroll`]s so the
//! cursor is visible, then [`draw_frame`] writes the complete frame into an
//! [`OutputBuffer`]:
//!
//! ```text
//! ESC[?25l ESC[2J ESC[H         hide cursor, clear, home
//! <row 0> ESC[K \r\n            one line per screen row
//! ...
//! <row n-1> ESC[K               no \r\n after the last row
//! ESC[<y>;<x>H ESC[?25h         place and show the cursor
//! ```
//!
//! Rows past the end of the buffer show a `~`. The marker is a display
//! concern only and never stored in a [`Row`](crate::row::Row). An empty
//! buffer gets a centered welcome banner a third of the way down.
//!
//! [`scroll`]: Viewport::scroll
//! [`draw_frame`]: Viewport::draw_frame

use trill_term::ansi;
use trill_term::output::OutputBuffer;
use trill_term::terminal::Size;

use crate::row::RowBuffer;

/// Shown in the first column of screen rows below the end of the buffer.
pub const PLACEHOLDER: u8 = b'~';

/// Welcome banner text for an empty buffer.
#[must_use]
pub fn welcome_message() -> String {
    format!("Trill editor -- version {}", env!("CARGO_PKG_VERSION"))
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// The visible window onto a [`RowBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible row.
    rowoff: usize,
    /// First visible column.
    coloff: usize,
    /// Screen height in rows.
    screenrows: usize,
    /// Screen width in columns.
    screencols: usize,
}

impl Viewport {
    /// A viewport at the top-left of the buffer, sized to `size`.
    #[must_use]
    pub const fn new(size: Size) -> Self {
        Self {
            rowoff: 0,
            coloff: 0,
            screenrows: size.rows,
            screencols: size.cols,
        }
    }

    #[inline]
    #[must_use]
    pub const fn rowoff(&self) -> usize {
        self.rowoff
    }

    #[inline]
    #[must_use]
    pub const fn coloff(&self) -> usize {
        self.coloff
    }

    #[inline]
    #[must_use]
    pub const fn screenrows(&self) -> usize {
        self.screenrows
    }

    #[inline]
    #[must_use]
    pub const fn screencols(&self) -> usize {
        self.screencols
    }

    /// Adjust the offsets so `(cx, cy)` is inside the window.
    ///
    /// Only the offsets move. The cursor itself is never clamped here. On a
    /// zero-sized screen an offset is pinned to the cursor, so `rowoff <= cy`
    /// and `coloff <= cx` always hold.
    pub const fn scroll(&mut self, cx: usize, cy: usize) {
        self.rowoff = clamp_offset(self.rowoff, cy, self.screenrows);
        self.coloff = clamp_offset(self.coloff, cx, self.screencols);
    }

    /// Render one full frame with the cursor at `(cx, cy)`.
    ///
    /// Call [`scroll`](Self::scroll) first; this draws whatever the current
    /// offsets select.
    pub fn draw_frame(&self, rows: &RowBuffer, cx: usize, cy: usize, out: &mut OutputBuffer) {
        // Writes into an OutputBuffer can't fail; `.ok()` discards the
        // always-Ok result.
        ansi::cursor_hide(out).ok();
        ansi::clear_screen(out).ok();
        ansi::cursor_home(out).ok();

        self.draw_rows(rows, out);

        ansi::cursor_to(
            out,
            cx.saturating_sub(self.coloff),
            cy.saturating_sub(self.rowoff),
        )
        .ok();
        ansi::cursor_show(out).ok();
    }

    fn draw_rows(&self, rows: &RowBuffer, out: &mut OutputBuffer) {
        for y in 0..self.screenrows {
            let filerow = y + self.rowoff;

            match rows.get(filerow) {
                Some(row) => out.push_bytes(row.visible(self.coloff, self.screencols)),
                None if rows.is_empty() && y == self.screenrows / 3 => self.draw_welcome(out),
                None => out.push_bytes(&[PLACEHOLDER]),
            }

            ansi::clear_line(out).ok();
            if y + 1 < self.screenrows {
                out.push_bytes(b"\r\n");
            }
        }
    }

    /// The banner, truncated to the screen width and centered.
    fn draw_welcome(&self, out: &mut OutputBuffer) {
        let welcome = welcome_message();
        let shown = &welcome.as_bytes()[..welcome.len().min(self.screencols)];

        let mut padding = (self.screencols - shown.len()) / 2;
        if padding > 0 {
            out.push_bytes(&[PLACEHOLDER]);
            padding -= 1;
        }
        out.push_bytes(" ".repeat(padding).as_bytes());
        out.push_bytes(shown);
    }
}

/// Smallest change to `offset` that puts `pos` in `[offset, offset + extent)`.
const fn clamp_offset(offset: usize, pos: usize, extent: usize) -> usize {
    if pos < offset {
        pos
    } else if pos >= offset + extent {
        if extent == 0 { pos } else { pos + 1 - extent }
    } else {
        offset
    }
}

/// The frame drawn on exit: a blank screen with the cursor home and visible.
pub fn draw_exit_frame(out: &mut OutputBuffer) {
    ansi::cursor_hide(out).ok();
    ansi::clear_screen(out).ok();
    ansi::cursor_home(out).ok();
    ansi::cursor_show(out).ok();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCREEN: Size = Size { cols: 80, rows: 24 };

    fn rows(lines: &[&str]) -> RowBuffer {
        lines.iter().collect()
    }

    fn frame(view: &Viewport, buf: &RowBuffer, cx: usize, cy: usize) -> String {
        let mut out = OutputBuffer::new();
        view.draw_frame(buf, cx, cy, &mut out);
        String::from_utf8(out.as_bytes().to_vec()).unwrap()
    }

    /// Screen rows of a frame: the text between the header and the final
    /// cursor placement, split on `\r\n`, with `ESC[K` removed.
    fn screen_lines(frame: &str) -> Vec<String> {
        let body = frame
            .strip_prefix("\x1b[?25l\x1b[2J\x1b[H")
            .expect("frame header");
        let end = body.rfind("\x1b[K").expect("at least one row") + 3;
        body[..end]
            .split("\r\n")
            .map(|line| line.strip_suffix("\x1b[K").expect("row ends with EL").to_owned())
            .collect()
    }

    // -- Scrolling --

    #[test]
    fn scroll_no_change_when_visible() {
        let mut v = Viewport::new(SCREEN);
        v.scroll(10, 10);
        assert_eq!((v.rowoff(), v.coloff()), (0, 0));
    }

    #[test]
    fn scroll_down_past_bottom() {
        let mut v = Viewport::new(Size { cols: 80, rows: 10 });
        v.scroll(0, 15);
        assert_eq!(v.rowoff(), 6);
    }

    #[test]
    fn scroll_up_above_top() {
        let mut v = Viewport::new(Size { cols: 80, rows: 10 });
        v.scroll(0, 30);
        v.scroll(0, 4);
        assert_eq!(v.rowoff(), 4);
    }

    #[test]
    fn scroll_right_past_edge() {
        let mut v = Viewport::new(Size { cols: 20, rows: 5 });
        v.scroll(50, 0);
        assert_eq!(v.coloff(), 31);
    }

    #[test]
    fn scroll_left_before_edge() {
        let mut v = Viewport::new(Size { cols: 20, rows: 5 });
        v.scroll(50, 0);
        v.scroll(3, 0);
        assert_eq!(v.coloff(), 3);
    }

    #[test]
    fn scroll_is_idempotent() {
        for (cx, cy) in [(0, 0), (79, 23), (80, 24), (500, 3), (2, 900)] {
            let mut v = Viewport::new(SCREEN);
            v.scroll(cx, cy);
            let once = v;
            v.scroll(cx, cy);
            assert_eq!(v, once, "cursor ({cx}, {cy})");
        }
    }

    #[test]
    fn scroll_keeps_cursor_inside_window() {
        let mut v = Viewport::new(Size { cols: 7, rows: 3 });
        for (cx, cy) in [(0, 0), (6, 2), (7, 3), (40, 1), (0, 40), (13, 13), (1, 1)] {
            v.scroll(cx, cy);
            assert!(v.rowoff() <= cy && cy < v.rowoff() + v.screenrows());
            assert!(v.coloff() <= cx && cx < v.coloff() + v.screencols());
        }
    }

    #[test]
    fn scroll_zero_sized_screen_pins_offsets_to_cursor() {
        let mut v = Viewport::new(Size { cols: 0, rows: 0 });
        v.scroll(0, 0);
        assert_eq!((v.rowoff(), v.coloff()), (0, 0));
        v.scroll(5, 7);
        assert_eq!((v.rowoff(), v.coloff()), (7, 5));
        v.scroll(2, 3);
        assert_eq!((v.rowoff(), v.coloff()), (3, 2));
    }

    // -- Frame structure --

    #[test]
    fn frame_header_and_trailer() {
        let v = Viewport::new(Size { cols: 10, rows: 2 });
        let f = frame(&v, &rows(&["hi"]), 0, 0);
        assert!(f.starts_with("\x1b[?25l\x1b[2J\x1b[H"));
        assert!(f.ends_with("\x1b[1;1H\x1b[?25h"));
    }

    #[test]
    fn frame_has_no_newline_after_last_row() {
        let v = Viewport::new(Size { cols: 10, rows: 3 });
        let f = frame(&v, &rows(&["a", "b", "c"]), 0, 0);
        assert_eq!(f.matches("\r\n").count(), 2);
        assert_eq!(f.matches("\x1b[K").count(), 3);
        assert!(f.contains("c\x1b[K\x1b[1;1H"));
    }

    #[test]
    fn frame_rows_past_end_show_placeholder() {
        let v = Viewport::new(Size { cols: 10, rows: 4 });
        let f = frame(&v, &rows(&["one", "two"]), 0, 0);
        assert_eq!(screen_lines(&f), vec!["one", "two", "~", "~"]);
    }

    #[test]
    fn frame_content_rows_have_no_marker() {
        let v = Viewport::new(Size { cols: 10, rows: 1 });
        let f = frame(&v, &rows(&["text"]), 0, 0);
        assert_eq!(screen_lines(&f), vec!["text"]);
    }

    #[test]
    fn frame_truncates_long_rows_to_width() {
        let v = Viewport::new(Size { cols: 4, rows: 1 });
        let f = frame(&v, &rows(&["abcdefgh"]), 0, 0);
        assert_eq!(screen_lines(&f), vec!["abcd"]);
    }

    #[test]
    fn frame_applies_offsets() {
        let mut v = Viewport::new(Size { cols: 3, rows: 2 });
        let buf = rows(&["0123456", "abcdefg", "ABCDEFG"]);
        v.scroll(5, 2);
        let f = frame(&v, &buf, 5, 2);
        assert_eq!(screen_lines(&f), vec!["def", "DEF"]);
        assert!(f.ends_with("\x1b[2;3H\x1b[?25h"));
    }

    #[test]
    fn frame_short_row_scrolled_past_is_blank() {
        let mut v = Viewport::new(Size { cols: 3, rows: 2 });
        let buf = rows(&["ab", "abcdefgh"]);
        v.scroll(6, 1);
        let f = frame(&v, &buf, 6, 1);
        assert_eq!(screen_lines(&f), vec!["", "efg"]);
    }

    #[test]
    fn frame_zero_rows_draws_only_chrome() {
        let v = Viewport::new(Size { cols: 80, rows: 0 });
        let mut out = OutputBuffer::new();
        v.draw_frame(&RowBuffer::new(), 0, 0, &mut out);
        assert_eq!(out.as_bytes(), b"\x1b[?25l\x1b[2J\x1b[H\x1b[1;1H\x1b[?25h");
    }

    // -- Welcome banner --

    #[test]
    fn welcome_on_empty_24x80() {
        let v = Viewport::new(SCREEN);
        let f = frame(&v, &RowBuffer::new(), 0, 0);
        let lines = screen_lines(&f);
        assert_eq!(lines.len(), 24);

        let welcome = welcome_message();
        let padding = (80 - welcome.len()) / 2;
        let expected = format!("~{}{welcome}", " ".repeat(padding - 1));
        assert_eq!(lines[8], expected);

        for (y, line) in lines.iter().enumerate() {
            assert!(line.starts_with('~'), "row {y} starts with the marker");
            if y != 8 {
                assert_eq!(line, "~");
            }
        }
        assert!(f.ends_with("\x1b[1;1H\x1b[?25h"));
    }

    #[test]
    fn welcome_truncated_on_narrow_screen() {
        let v = Viewport::new(Size { cols: 10, rows: 3 });
        let f = frame(&v, &RowBuffer::new(), 0, 0);
        let lines = screen_lines(&f);
        assert_eq!(lines[1], &welcome_message()[..10]);
    }

    #[test]
    fn welcome_odd_padding() {
        let welcome = welcome_message();
        let cols = welcome.len() + 3;
        let v = Viewport::new(Size { cols, rows: 3 });
        let f = frame(&v, &RowBuffer::new(), 0, 0);
        assert_eq!(screen_lines(&f)[1], format!("~{welcome}"));
    }

    #[test]
    fn no_welcome_when_buffer_has_rows() {
        let v = Viewport::new(SCREEN);
        let f = frame(&v, &rows(&["x"]), 0, 0);
        assert!(!f.contains(&welcome_message()));
    }

    #[test]
    fn welcome_mentions_version() {
        assert!(welcome_message().starts_with("Trill editor -- version "));
        assert!(welcome_message().ends_with(env!("CARGO_PKG_VERSION")));
    }

    // -- Exit frame --

    #[test]
    fn exit_frame_is_blank_screen() {
        let mut out = OutputBuffer::new();
        draw_exit_frame(&mut out);
        assert_eq!(out.as_bytes(), b"\x1b[?25l\x1b[2J\x1b[H\x1b[?25h");
    }
}
