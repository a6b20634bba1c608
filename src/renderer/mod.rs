pub mod cell;
pub mod display;
pub mod processor;
pub mod quantizer;
pub mod terminal;

#[cfg(test)]
pub mod mock;

pub use cell::{CellBuffer, GridSize, Palette, RgbColor};
pub use display::TerminalDisplay;
pub use processor::{FrameProcessor, ResampledImage, ResizeFilter};
pub use quantizer::{quantize, Quantized};
pub use terminal::{KeyInput, Terminal, TerminalCaps, TerminalSession};
