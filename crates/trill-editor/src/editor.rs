//! Editor state — cursor, viewport, and the loaded rows.
//!
//! [`Editor`] is the single owned value the control loop works on. It is
//! mutated only through [`process_key`](Editor::process_key) and read by
//! [`refresh_screen`](Editor::refresh_screen).
//!
//! The cursor lives in buffer coordinates:
//!
//! - `cy` ranges over `0..=numrows`. `cy == numrows` is the line just past
//!   the end of the file, where there is no current row.
//! - `cx` ranges over `0..=len(current row)`, so the cursor can sit one past
//!   the last character. With no current row, `cx` is 0.

use std::path::Path;

use trill_term::input::{Key, ctrl_key};
use trill_term::output::OutputBuffer;
use trill_term::terminal::Size;

use crate::row::{LoadError, Row, RowBuffer};
use crate::view::Viewport;

/// The key that quits: Ctrl-Q.
pub const QUIT_KEY: Key = Key::Char(ctrl_key(b'q'));

/// What the control loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep running.
    Continue,
    /// Draw the exit frame and leave.
    Quit,
}

/// Vertical or horizontal single-step movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The viewer's complete mutable state.
#[derive(Debug, Clone)]
pub struct Editor {
    cx: usize,
    cy: usize,
    rows: RowBuffer,
    view: Viewport,
}

impl Editor {
    /// An editor with no file, cursor at the origin.
    #[must_use]
    pub const fn new(size: Size) -> Self {
        Self::with_rows(RowBuffer::new(), size)
    }

    /// An editor over already-loaded rows.
    #[must_use]
    pub const fn with_rows(rows: RowBuffer, size: Size) -> Self {
        Self {
            cx: 0,
            cy: 0,
            rows,
            view: Viewport::new(size),
        }
    }

    /// Load `path` and create an editor over it.
    ///
    /// # Errors
    ///
    /// Propagates [`LoadError`] from [`RowBuffer::open`].
    pub fn open(path: &Path, size: Size) -> Result<Self, LoadError> {
        Ok(Self::with_rows(RowBuffer::open(path)?, size))
    }

    // -- Accessors --

    #[inline]
    #[must_use]
    pub const fn cx(&self) -> usize {
        self.cx
    }

    #[inline]
    #[must_use]
    pub const fn cy(&self) -> usize {
        self.cy
    }

    #[inline]
    #[must_use]
    pub const fn rows(&self) -> &RowBuffer {
        &self.rows
    }

    #[inline]
    #[must_use]
    pub const fn view(&self) -> &Viewport {
        &self.view
    }

    /// The row under the cursor, or `None` on the line past the end.
    #[must_use]
    pub fn current_row(&self) -> Option<&Row> {
        self.rows.get(self.cy)
    }

    // -- Input --

    /// Apply one decoded key.
    pub fn process_key(&mut self, key: Key) -> Action {
        match key {
            QUIT_KEY => return Action::Quit,
            Key::Home => self.cx = 0,
            Key::End => self.cx = self.current_row().map_or(0, Row::len),
            Key::PageUp | Key::PageDown => {
                let dir = if key == Key::PageUp {
                    Direction::Up
                } else {
                    Direction::Down
                };
                for _ in 0..self.view.screenrows() {
                    self.move_cursor(dir);
                }
            }
            Key::ArrowUp => self.move_cursor(Direction::Up),
            Key::ArrowDown => self.move_cursor(Direction::Down),
            Key::ArrowLeft => self.move_cursor(Direction::Left),
            Key::ArrowRight => self.move_cursor(Direction::Right),
            Key::Char(_) | Key::Escape | Key::Delete => {}
        }
        Action::Continue
    }

    /// Move the cursor one step, then snap `cx` to the new row's length.
    pub fn move_cursor(&mut self, dir: Direction) {
        match dir {
            Direction::Up => self.cy = self.cy.saturating_sub(1),
            Direction::Down => {
                if self.cy < self.rows.len() {
                    self.cy += 1;
                }
            }
            Direction::Left => self.cx = self.cx.saturating_sub(1),
            Direction::Right => {
                if self.current_row().is_some_and(|row| self.cx < row.len()) {
                    self.cx += 1;
                }
            }
        }

        let rowlen = self.current_row().map_or(0, Row::len);
        self.cx = self.cx.min(rowlen);
    }

    // -- Output --

    /// Scroll so the cursor is visible, then render the frame into `out`.
    pub fn refresh_screen(&mut self, out: &mut OutputBuffer) {
        self.view.scroll(self.cx, self.cy);
        self.view.draw_frame(&self.rows, self.cx, self.cy, out);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
