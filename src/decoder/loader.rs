use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use super::frame_data::{Frame, FrameSequence};
use crate::error::{Result, TerimError};

/// Probe `path` and return its format, failing for unreadable or unrecognized files.
pub fn detect_format(path: &Path) -> Result<ImageFormat> {
    let reader = ImageReader::open(path)
        .map_err(|e| TerimError::decode(path, e))?
        .with_guessed_format()
        .map_err(|e| TerimError::decode(path, e))?;

    reader
        .format()
        .ok_or_else(|| TerimError::decode(path, "not a recognized image format"))
}

/// Decode every frame of `path`. GIFs yield one composited frame per
/// sub-image with its authored delay; other formats yield a single frame
/// without a duration.
pub fn load(path: &Path) -> Result<FrameSequence> {
    let format = detect_format(path)?;

    let sequence = match format {
        ImageFormat::Gif => {
            let decoder = open_gif(path)?;
            let frames = decoder
                .into_frames()
                .map(|frame| frame.map(frame_from_gif))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| TerimError::decode(path, e))?;
            FrameSequence::new(frames).ok_or_else(|| TerimError::decode(path, "GIF has no frames"))?
        }
        _ => {
            let image = ImageReader::open(path)
                .map_err(|e| TerimError::decode(path, e))?
                .with_guessed_format()
                .map_err(|e| TerimError::decode(path, e))?
                .decode()
                .map_err(|e| TerimError::decode(path, e))?;
            FrameSequence::single(frame_from_image(image, None))
        }
    };

    crate::utils::logger::info(&format!(
        "Decoded {}: {:?}, {} frame(s)",
        path.display(),
        format,
        sequence.frames().len()
    ));

    Ok(sequence)
}

pub(super) fn open_gif(path: &Path) -> Result<GifDecoder<BufReader<File>>> {
    let file = File::open(path).map_err(|e| TerimError::decode(path, e))?;
    GifDecoder::new(BufReader::new(file)).map_err(|e| TerimError::decode(path, e))
}

pub(super) fn frame_from_gif(frame: image::Frame) -> Frame {
    let (numer, denom) = frame.delay().numer_denom_ms();
    let millis = numer as u64 / denom.max(1) as u64;
    let duration = Some(Duration::from_millis(millis));
    frame_from_image(DynamicImage::ImageRgba8(frame.into_buffer()), duration)
}

fn frame_from_image(image: DynamicImage, duration: Option<Duration>) -> Frame {
    // Alpha is dropped; the terminal has no notion of transparency here.
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    Frame::new(rgb.into_raw(), width, height, duration)
}
