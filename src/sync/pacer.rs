use std::time::{Duration, Instant};

use crate::decoder::Frame;

/// Per-frame timing: each frame gets its own budget, render work is charged
/// against it and whatever is left is slept.
///
/// Overruns are not caught up on later frames; the sleep is simply zero.
pub struct FramePacer {
    fallback: Duration,
    work_started: Option<Instant>,
    frames_paced: u64,
    overruns: u64,
}

impl FramePacer {
    /// `fallback_fps` sets the duration of frames that carry none.
    pub fn new(fallback_fps: u32) -> Self {
        Self {
            fallback: Duration::from_millis(1000 / fallback_fps.max(1) as u64),
            work_started: None,
            frames_paced: 0,
            overruns: 0,
        }
    }

    pub fn fallback(&self) -> Duration {
        self.fallback
    }

    pub fn target(&self, frame: &Frame) -> Duration {
        frame.display_duration(self.fallback)
    }

    /// Mark the start of render work for this frame.
    pub fn begin_work(&mut self) {
        self.work_started = Some(Instant::now());
    }

    /// Time spent since `begin_work`, zero if no work was started.
    pub fn end_work(&mut self) -> Duration {
        self.work_started
            .take()
            .map(|start| start.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Sleep budget left for a frame of length `target` after `elapsed` work.
    pub fn remaining(&mut self, target: Duration, elapsed: Duration) -> Duration {
        self.frames_paced += 1;
        if elapsed > target {
            self.overruns += 1;
        }
        target.saturating_sub(elapsed)
    }

    pub fn stats(&self) -> PacingStats {
        PacingStats {
            frames_paced: self.frames_paced,
            overruns: self.overruns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingStats {
    pub frames_paced: u64,
    pub overruns: u64,
}
