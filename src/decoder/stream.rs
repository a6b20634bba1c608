use image::{AnimationDecoder, Frames};
use std::path::{Path, PathBuf};

use super::frame_data::{Frame, FrameSource};
use super::loader::{frame_from_gif, open_gif};
use crate::error::{Result, TerimError};

/// GIF frames decoded on demand from a single decoder, restarted whenever the
/// caller wraps around. Holds one composited frame at a time.
pub struct StreamingSource {
    path: PathBuf,
    frame_count: usize,
    frames: Option<Frames<'static>>,
    /// Index of `current` within the animation.
    position: usize,
    current: Option<Frame>,
}

impl StreamingSource {
    /// Open `path` and count its frames with one decoding pass.
    pub fn open(path: &Path) -> Result<Self> {
        let mut frame_count = 0;
        for frame in open_gif(path)?.into_frames() {
            frame.map_err(|e| TerimError::decode(path, e))?;
            frame_count += 1;
        }
        if frame_count == 0 {
            return Err(TerimError::decode(path, "GIF has no frames"));
        }

        crate::utils::logger::info(&format!(
            "Streaming {}: {} frame(s)",
            path.display(),
            frame_count
        ));

        Ok(Self {
            path: path.to_path_buf(),
            frame_count,
            frames: None,
            position: 0,
            current: None,
        })
    }

    fn restart(&mut self) -> Result<()> {
        self.frames = Some(open_gif(&self.path)?.into_frames());
        self.current = None;
        self.position = 0;
        Ok(())
    }

    fn pull(&mut self) -> Result<()> {
        let frames = self
            .frames
            .as_mut()
            .ok_or_else(|| TerimError::decode(&self.path, "decoder not started"))?;
        let frame = frames
            .next()
            .ok_or_else(|| TerimError::decode(&self.path, "animation ended early"))?
            .map_err(|e| TerimError::decode(&self.path, e))?;

        if self.current.is_some() {
            self.position += 1;
        }
        self.current = Some(frame_from_gif(frame));
        Ok(())
    }
}

impl FrameSource for StreamingSource {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn frame(&mut self, index: usize) -> Result<&Frame> {
        let index = index % self.frame_count;

        let rewind = match self.current {
            Some(_) => index < self.position,
            None => true,
        };
        if rewind {
            self.restart()?;
            self.pull()?;
        }
        while self.position < index {
            self.pull()?;
        }

        self.current
            .as_ref()
            .ok_or_else(|| TerimError::decode(&self.path, "no frame decoded"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::loader::fixtures::write_gif;
    use crate::renderer::RgbColor;
    use std::time::Duration;

    #[test]
    fn test_streaming_wraps_and_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        write_gif(&path, 3, 2, &[[255, 0, 0], [0, 255, 0], [0, 0, 255]], &[100, 200, 50]);

        let mut source = StreamingSource::open(&path).unwrap();
        assert_eq!(source.frame_count(), 3);
        assert!(source.is_animated());

        let mut index = 0;
        let mut seen = Vec::new();
        for _ in 0..4 {
            let frame = source.frame(index).unwrap();
            seen.push((frame.pixel(0, 0), frame.duration));
            index = source.next_index(index);
        }

        assert_eq!(
            seen,
            vec![
                (RgbColor(255, 0, 0), Some(Duration::from_millis(100))),
                (RgbColor(0, 255, 0), Some(Duration::from_millis(200))),
                (RgbColor(0, 0, 255), Some(Duration::from_millis(50))),
                (RgbColor(255, 0, 0), Some(Duration::from_millis(100))),
            ]
        );
    }

    #[test]
    fn test_same_index_does_not_advance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        write_gif(&path, 2, 2, &[[9, 9, 9], [200, 200, 200]], &[40, 40]);

        let mut source = StreamingSource::open(&path).unwrap();
        assert_eq!(source.frame(1).unwrap().pixel(0, 0), RgbColor(200, 200, 200));
        assert_eq!(source.frame(1).unwrap().pixel(0, 0), RgbColor(200, 200, 200));
        assert_eq!(source.frame(0).unwrap().pixel(0, 0), RgbColor(9, 9, 9));
    }

    #[test]
    fn test_non_gif_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.gif");
        std::fs::write(&path, b"GIF? no").unwrap();
        assert!(matches!(StreamingSource::open(&path), Err(TerimError::Decode { .. })));
    }
}
