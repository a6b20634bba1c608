use std::time::Duration;

use crate::error::Result;

/// One decoded, fully composited RGB image.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Packed RGB, `width * height * 3` bytes, row-major.
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Authored display time. `None` for still images.
    pub duration: Option<Duration>,
}

impl Frame {
    pub fn new(buffer: Vec<u8>, width: u32, height: u32, duration: Option<Duration>) -> Self {
        debug_assert_eq!(buffer.len(), (width * height * 3) as usize);
        Self { buffer, width, height, duration }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> crate::renderer::RgbColor {
        let offset = ((y * self.width + x) * 3) as usize;
        crate::renderer::RgbColor(self.buffer[offset], self.buffer[offset + 1], self.buffer[offset + 2])
    }

    /// Duration to show this frame for. Missing and zero durations both use
    /// `fallback`; many GIF encoders write 0 to mean "as fast as sensible".
    pub fn display_duration(&self, fallback: Duration) -> Duration {
        match self.duration {
            Some(d) if !d.is_zero() => d,
            _ => fallback,
        }
    }
}

/// Cyclic access to decoded frames. Implementations may keep every frame in
/// memory or decode on demand; the render loop only walks indices in order
/// and wraps at `frame_count`.
pub trait FrameSource {
    fn frame_count(&self) -> usize;

    fn is_animated(&self) -> bool {
        self.frame_count() > 1
    }

    fn frame(&mut self, index: usize) -> Result<&Frame>;

    fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.frame_count().max(1)
    }
}

/// Every frame decoded up front. Never empty.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    /// Returns `None` for an empty frame list.
    pub fn new(frames: Vec<Frame>) -> Option<Self> {
        if frames.is_empty() {
            None
        } else {
            Some(Self { frames })
        }
    }

    pub fn single(frame: Frame) -> Self {
        Self { frames: vec![frame] }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl FrameSource for FrameSequence {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame(&mut self, index: usize) -> Result<&Frame> {
        Ok(&self.frames[index % self.frames.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RgbColor;

    fn solid(duration_ms: Option<u64>) -> Frame {
        Frame::new(vec![1, 2, 3], 1, 1, duration_ms.map(Duration::from_millis))
    }

    #[test]
    fn test_display_duration_fallback() {
        let fallback = Duration::from_millis(33);
        assert_eq!(solid(None).display_duration(fallback), fallback);
        assert_eq!(solid(Some(0)).display_duration(fallback), fallback);
        assert_eq!(solid(Some(120)).display_duration(fallback), Duration::from_millis(120));
    }

    #[test]
    fn test_sequence_is_never_empty() {
        assert!(FrameSequence::new(Vec::new()).is_none());
        assert!(!FrameSequence::single(solid(None)).is_animated());
    }

    #[test]
    fn test_cyclic_traversal() {
        let seq = FrameSequence::new(vec![solid(Some(1)), solid(Some(2)), solid(Some(3))]).unwrap();
        assert!(seq.is_animated());
        let mut index = 0;
        let visited: Vec<usize> = (0..5)
            .map(|_| {
                let current = index;
                index = seq.next_index(index);
                current
            })
            .collect();
        assert_eq!(visited, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_pixel_lookup() {
        let frame = Frame::new(vec![0, 0, 0, 9, 8, 7], 2, 1, None);
        assert_eq!(frame.pixel(1, 0), RgbColor(9, 8, 7));
    }
}
