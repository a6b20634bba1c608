//! Scripted in-memory terminal for render loop tests.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use super::cell::GridSize;
use super::terminal::{KeyInput, Terminal, TerminalCaps};
use crate::error::{Result, TerimError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Paint(u16, u16, u8),
    Insert(u16, u16, u8),
    Present,
}

pub struct MockTerminal {
    pub caps: TerminalCaps,
    /// Grid size per `grid_size` call; the last entry repeats.
    pub sizes: Vec<GridSize>,
    /// Keys per poll; once drained every poll returns `q`.
    pub keys: VecDeque<Option<KeyInput>>,
    pub registers: Vec<Option<(u16, u16, u16)>>,
    pub bound: Vec<bool>,
    pub screen: Vec<Option<u8>>,
    pub screen_size: GridSize,
    pub ops: Vec<Op>,
    pub sleeps: Vec<Duration>,
    pub grid_calls: usize,
    pub raw: bool,
    pub enter_count: usize,
    pub restore_count: usize,
    pub fail_paint_after: Option<usize>,
    paints: usize,
}

impl MockTerminal {
    pub fn new(sizes: Vec<GridSize>) -> Self {
        Self {
            caps: TerminalCaps {
                programmable_palette: true,
                colors: 256,
                intensity_max: 1000,
            },
            sizes,
            keys: VecDeque::new(),
            registers: vec![None; 256],
            bound: vec![false; 256],
            screen: Vec::new(),
            screen_size: GridSize::new(0, 0),
            ops: Vec::new(),
            sleeps: Vec::new(),
            grid_calls: 0,
            raw: false,
            enter_count: 0,
            restore_count: 0,
            fail_paint_after: None,
            paints: 0,
        }
    }

    /// Let the loop run `iterations` times before `q` arrives.
    pub fn quit_after(mut self, iterations: usize) -> Self {
        self.keys = (1..iterations).map(|_| None).collect();
        self
    }

    pub fn with_colors(mut self, colors: u16) -> Self {
        self.caps.colors = colors;
        self
    }

    pub fn repaints(&self) -> usize {
        self.ops.iter().filter(|op| **op == Op::Present).count()
    }

    pub fn cell(&self, row: u16, col: u16) -> Option<u8> {
        self.screen[row as usize * self.screen_size.cols as usize + col as usize]
    }

    fn check_bounds(&self, row: u16, col: u16) -> Result<()> {
        if row >= self.screen_size.rows || col >= self.screen_size.cols {
            return Err(TerimError::TerminalIo(io::Error::other(format!(
                "cell ({}, {}) is outside the grid",
                row, col
            ))));
        }
        Ok(())
    }

    fn write_cell(&mut self, row: u16, col: u16, register: u8) -> Result<()> {
        if let Some(limit) = self.fail_paint_after {
            if self.paints >= limit {
                return Err(TerimError::TerminalIo(io::Error::other("write failed")));
            }
        }
        self.paints += 1;
        if !self.bound[register as usize] {
            return Err(TerimError::TerminalIo(io::Error::other("style not bound")));
        }
        let idx = row as usize * self.screen_size.cols as usize + col as usize;
        self.screen[idx] = Some(register);
        Ok(())
    }
}

impl Terminal for MockTerminal {
    fn capabilities(&self) -> TerminalCaps {
        self.caps
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        self.raw = true;
        self.enter_count += 1;
        Ok(())
    }

    fn restore_mode(&mut self) -> Result<()> {
        self.raw = false;
        self.restore_count += 1;
        Ok(())
    }

    fn grid_size(&mut self) -> Result<GridSize> {
        let idx = self.grid_calls.min(self.sizes.len().saturating_sub(1));
        self.grid_calls += 1;
        let size = *self
            .sizes
            .get(idx)
            .ok_or_else(|| TerimError::TerminalIo(io::Error::other("no size scripted")))?;
        if size != self.screen_size {
            self.screen_size = size;
            self.screen = vec![None; size.cell_count()];
        }
        Ok(size)
    }

    fn set_palette_entry(&mut self, register: u8, r: u16, g: u16, b: u16) -> Result<()> {
        self.registers[register as usize] = Some((r, g, b));
        Ok(())
    }

    fn bind_style(&mut self, register: u8) -> Result<()> {
        self.bound[register as usize] = true;
        Ok(())
    }

    fn paint_cell(&mut self, row: u16, col: u16, register: u8) -> Result<()> {
        self.check_bounds(row, col)?;
        // An advancing write into the last cell would push the cursor off the grid.
        if row + 1 == self.screen_size.rows && col + 1 == self.screen_size.cols {
            return Err(TerimError::TerminalIo(io::Error::other(
                "cursor advanced past the grid",
            )));
        }
        self.write_cell(row, col, register)?;
        self.ops.push(Op::Paint(row, col, register));
        Ok(())
    }

    fn insert_cell(&mut self, row: u16, col: u16, register: u8) -> Result<()> {
        self.check_bounds(row, col)?;
        self.write_cell(row, col, register)?;
        self.ops.push(Op::Insert(row, col, register));
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.ops.push(Op::Present);
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<KeyInput>> {
        Ok(self.keys.pop_front().unwrap_or(Some(KeyInput::Char('q'))))
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
