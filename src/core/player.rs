use std::time::Duration;

use crate::decoder::{Frame, FrameSource};
use crate::error::{Result, TerimError};
use crate::renderer::{
    quantize, FrameProcessor, GridSize, KeyInput, Palette, Quantized, ResizeFilter, Terminal,
    TerminalSession,
};
use crate::shared::{constants, Config};
use crate::sync::FramePacer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub fallback_fps: u32,
    pub resize_filter: ResizeFilter,
}

impl From<&Config> for PlaybackOptions {
    fn from(config: &Config) -> Self {
        Self {
            fallback_fps: config.fallback_fps,
            resize_filter: config.resize_filter,
        }
    }
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RenderState {
    /// Nothing visible changed; leave the screen alone.
    SteadyState,
    Repaint,
    Terminated,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub iterations: u64,
    pub repaints: u64,
    pub skipped: u64,
    pub overruns: u64,
}

/// Resample and quantize one frame for `grid`. Pure: identical inputs give
/// identical palettes and cell buffers.
pub fn render_frame(
    processor: &mut FrameProcessor,
    frame: &Frame,
    grid: GridSize,
    max_colors: usize,
) -> Result<Quantized> {
    let resampled = processor.resample(frame, grid)?;
    quantize(&resampled, max_colors)
}

/// Program the palette registers and paint every cell of `grid`.
///
/// The bottom-right cell goes last through `insert_cell` so the cursor never
/// moves past the grid.
pub fn paint<T: Terminal>(
    terminal: &mut T,
    rendered: &Quantized,
    grid: GridSize,
    intensity_max: u16,
) -> Result<()> {
    for (i, color) in rendered.palette.colors.iter().enumerate() {
        let register = Palette::register(i as u8);
        let (r, g, b) = color.scaled(intensity_max);
        terminal.set_palette_entry(register, r, g, b)?;
        terminal.bind_style(register)?;
    }

    let cols = grid.cols as usize;
    let Some((last, body)) = rendered.cells.indices.split_last() else {
        return terminal.present();
    };
    for (i, index) in body.iter().enumerate() {
        let (row, col) = ((i / cols) as u16, (i % cols) as u16);
        terminal.paint_cell(row, col, Palette::register(*index))?;
    }
    terminal.insert_cell(grid.rows - 1, grid.cols - 1, Palette::register(*last))?;

    terminal.present()
}

/// Reject terminals that cannot show at least one data color next to the
/// reserved register. Returns the palette budget.
pub fn color_budget(terminal: &impl Terminal) -> Result<usize> {
    let caps = terminal.capabilities();
    if !caps.programmable_palette {
        return Err(TerimError::UnsupportedTerminal(
            "terminal cannot change its color palette".to_string(),
        ));
    }
    if caps.colors < 2 {
        return Err(TerimError::UnsupportedTerminal(format!(
            "terminal reports {} color(s), at least 2 are needed",
            caps.colors
        )));
    }
    Ok((caps.colors.min(constants::MAX_COLOR_REGISTERS) - 1) as usize)
}

/// The animation/resize loop. Owns the frame source and all per-repaint state.
pub struct Player<S: FrameSource> {
    source: S,
    processor: FrameProcessor,
    pacer: FramePacer,
    max_colors: usize,
    last_size: Option<GridSize>,
    index: usize,
}

impl<S: FrameSource> Player<S> {
    pub fn new(source: S, options: &PlaybackOptions, max_colors: usize) -> Self {
        Self {
            source,
            processor: FrameProcessor::new(options.resize_filter),
            pacer: FramePacer::new(options.fallback_fps),
            max_colors,
            last_size: None,
            index: 0,
        }
    }

    fn next_state(&self, grid: GridSize) -> RenderState {
        if grid.is_empty() {
            // Minimized or zero-sized window: nothing can be drawn.
            RenderState::SteadyState
        } else if self.last_size != Some(grid) || self.source.is_animated() {
            RenderState::Repaint
        } else {
            RenderState::SteadyState
        }
    }

    /// Run until the quit key arrives or a terminal operation fails.
    pub fn run<T: Terminal>(&mut self, terminal: &mut T) -> Result<PlaybackSummary> {
        let intensity_max = terminal.capabilities().intensity_max;
        let mut summary = PlaybackSummary::default();
        let mut state = RenderState::Repaint;

        while state != RenderState::Terminated {
            let grid = terminal.grid_size()?;
            state = self.next_state(grid);
            let frame = self.source.frame(self.index)?;
            let target = self.pacer.target(frame);

            let elapsed = match state {
                RenderState::Repaint => {
                    self.pacer.begin_work();
                    let rendered = render_frame(&mut self.processor, frame, grid, self.max_colors)?;
                    paint(terminal, &rendered, grid, intensity_max)?;
                    self.last_size = Some(grid);
                    summary.repaints += 1;
                    self.pacer.end_work()
                }
                _ => {
                    summary.skipped += 1;
                    Duration::ZERO
                }
            };
            summary.iterations += 1;

            if elapsed > target {
                crate::utils::logger::debug(&format!(
                    "Frame {} overran: render={}us budget={}us",
                    self.index,
                    elapsed.as_micros(),
                    target.as_micros()
                ));
            }

            if Self::quit_requested(terminal)? {
                state = RenderState::Terminated;
            } else {
                let sleep = self.pacer.remaining(target, elapsed);
                terminal.sleep(sleep);

                self.index = self.source.next_index(self.index);
            }
        }

        let stats = self.pacer.stats();
        crate::utils::logger::debug(&format!(
            "Paced {} frame(s), {} over budget",
            stats.frames_paced, stats.overruns
        ));
        summary.overruns = stats.overruns;
        Ok(summary)
    }

    fn quit_requested<T: Terminal>(terminal: &mut T) -> Result<bool> {
        Ok(matches!(
            terminal.poll_key()?,
            Some(KeyInput::Char(constants::QUIT_KEY)) | Some(KeyInput::Interrupt)
        ))
    }
}

/// Init → loop → Terminated. Capabilities are checked before the terminal
/// mode is touched; once raw mode is entered it is restored on every exit.
pub fn play<T: Terminal, S: FrameSource>(
    terminal: T,
    source: S,
    options: &PlaybackOptions,
) -> Result<PlaybackSummary> {
    let max_colors = color_budget(&terminal)?;
    crate::utils::logger::debug(&format!(
        "Starting render loop: {} frame(s), {} palette entries",
        source.frame_count(),
        max_colors
    ));

    let mut session = TerminalSession::begin(terminal)?;
    let mut player = Player::new(source, options, max_colors);
    let result = player.run(&mut *session);
    drop(session);

    match &result {
        Ok(summary) => crate::utils::logger::debug(&format!(
            "Render loop ended. Iterations: {}, Repaints: {}, Skipped: {}, Overruns: {}",
            summary.iterations, summary.repaints, summary.skipped, summary.overruns
        )),
        Err(e) => crate::utils::logger::error(&format!("Render loop failed: {}", e)),
    }
    result
}
