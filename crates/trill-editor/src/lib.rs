//! # trill-editor — Editor core for trill
//!
//! The pieces of the viewer that don't touch the terminal directly:
//!
//! - **[`row`]** — `Row` and the append-only `RowBuffer`, plus file loading
//! - **[`view`]** — `Viewport` scroll offsets and frame rendering
//! - **[`editor`]** — `Editor` state, cursor movement, and key dispatch

pub mod editor;
pub mod row;
pub mod view;
