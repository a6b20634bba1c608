use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::cell::GridSize;
use crate::error::Result;

/// What the terminal can do with colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalCaps {
    /// Palette registers can be reprogrammed with arbitrary RGB values.
    pub programmable_palette: bool,
    /// Number of simultaneously displayable colors (registers), at most 256.
    pub colors: u16,
    /// Largest channel value accepted by `set_palette_entry`.
    pub intensity_max: u16,
}

/// A key read without blocking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    /// Ctrl+C. Raw mode delivers it as a key instead of SIGINT.
    Interrupt,
    Other,
}

/// Primitives the render loop needs from a terminal.
///
/// Registers are palette slots; register 0 is reserved and every painted cell
/// uses register 0 as its foreground and a data register as its background.
pub trait Terminal {
    fn capabilities(&self) -> TerminalCaps;

    fn enter_raw_mode(&mut self) -> Result<()>;

    /// Undo everything `enter_raw_mode` and painting changed. Must be idempotent.
    fn restore_mode(&mut self) -> Result<()>;

    fn grid_size(&mut self) -> Result<GridSize>;

    /// Program `register` with channels already scaled to `intensity_max`.
    fn set_palette_entry(&mut self, register: u8, r: u16, g: u16, b: u16) -> Result<()>;

    /// Bind `register` to a paintable style (foreground register 0, background `register`).
    fn bind_style(&mut self, register: u8) -> Result<()>;

    /// Write a blank in `register`'s style at (row, col); the cursor advances.
    fn paint_cell(&mut self, row: u16, col: u16, register: u8) -> Result<()>;

    /// Insert a blank in `register`'s style at (row, col) without moving the cursor.
    fn insert_cell(&mut self, row: u16, col: u16, register: u8) -> Result<()>;

    /// Make everything painted so far visible.
    fn present(&mut self) -> Result<()>;

    fn poll_key(&mut self) -> Result<Option<KeyInput>>;

    fn sleep(&mut self, duration: Duration);
}

impl<T: Terminal + ?Sized> Terminal for &mut T {
    fn capabilities(&self) -> TerminalCaps {
        (**self).capabilities()
    }
    fn enter_raw_mode(&mut self) -> Result<()> {
        (**self).enter_raw_mode()
    }
    fn restore_mode(&mut self) -> Result<()> {
        (**self).restore_mode()
    }
    fn grid_size(&mut self) -> Result<GridSize> {
        (**self).grid_size()
    }
    fn set_palette_entry(&mut self, register: u8, r: u16, g: u16, b: u16) -> Result<()> {
        (**self).set_palette_entry(register, r, g, b)
    }
    fn bind_style(&mut self, register: u8) -> Result<()> {
        (**self).bind_style(register)
    }
    fn paint_cell(&mut self, row: u16, col: u16, register: u8) -> Result<()> {
        (**self).paint_cell(row, col, register)
    }
    fn insert_cell(&mut self, row: u16, col: u16, register: u8) -> Result<()> {
        (**self).insert_cell(row, col, register)
    }
    fn present(&mut self) -> Result<()> {
        (**self).present()
    }
    fn poll_key(&mut self) -> Result<Option<KeyInput>> {
        (**self).poll_key()
    }
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }
}

// Sessions between `begin` and drop. The panic hook only touches the terminal
// while this is non-zero.
static OPEN_SESSIONS: AtomicUsize = AtomicUsize::new(0);

/// Whether some `TerminalSession` currently holds the terminal.
pub fn session_active() -> bool {
    OPEN_SESSIONS.load(Ordering::SeqCst) > 0
}

/// Raw-mode acquisition. The terminal is restored when the session is dropped,
/// whether the render loop returned normally, failed, or unwound.
pub struct TerminalSession<T: Terminal> {
    terminal: T,
}

impl<T: Terminal> TerminalSession<T> {
    pub fn begin(mut terminal: T) -> Result<Self> {
        // Counted before entering so a panic halfway through still restores.
        OPEN_SESSIONS.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = terminal.enter_raw_mode() {
            let _ = terminal.restore_mode();
            OPEN_SESSIONS.fetch_sub(1, Ordering::SeqCst);
            return Err(e);
        }
        Ok(Self { terminal })
    }
}

impl<T: Terminal> Deref for TerminalSession<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.terminal
    }
}

impl<T: Terminal> DerefMut for TerminalSession<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.terminal
    }
}

impl<T: Terminal> Drop for TerminalSession<T> {
    fn drop(&mut self) {
        if let Err(e) = self.terminal.restore_mode() {
            crate::utils::logger::error(&format!("Failed to restore terminal: {}", e));
        }
        OPEN_SESSIONS.fetch_sub(1, Ordering::SeqCst);
    }
}
