/// Represents a 24-bit RGB color
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct RgbColor(pub u8, pub u8, pub u8);

impl RgbColor {
    /// Scale each channel from 0..=255 to 0..=`max` (the driver's native range).
    pub fn scaled(self, max: u16) -> (u16, u16, u16) {
        let scale = |c: u8| (c as u32 * max as u32 / 255) as u16;
        (scale(self.0), scale(self.1), scale(self.2))
    }
}

/// Terminal dimensions in character cells.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GridSize {
    pub rows: u16,
    pub cols: u16,
}

impl GridSize {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    #[cfg(test)]
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// Colors chosen for one repaint. Entry `i` is programmed into register `i + 1`.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Palette {
    pub colors: Vec<RgbColor>,
}

impl Palette {
    pub fn register(index: u8) -> u8 {
        index + 1
    }
}

/// One palette index per grid cell, row-major.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CellBuffer {
    pub width: usize,
    pub indices: Vec<u8>,
}
