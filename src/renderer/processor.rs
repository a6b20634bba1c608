use fast_image_resize as fr;
use fr::images::{Image, ImageRef};
use std::str::FromStr;

use super::cell::{GridSize, RgbColor};
use crate::decoder::Frame;
use crate::error::{Result, TerimError};

/// Filter used to fit a frame onto the character grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizeFilter {
    Nearest,
    /// Area average; the closest match to a plain "shrink to grid".
    #[default]
    Box,
    Bilinear,
    CatmullRom,
    Lanczos3,
}

impl ResizeFilter {
    fn algorithm(self) -> fr::ResizeAlg {
        match self {
            ResizeFilter::Nearest => fr::ResizeAlg::Nearest,
            ResizeFilter::Box => fr::ResizeAlg::Convolution(fr::FilterType::Box),
            ResizeFilter::Bilinear => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
            ResizeFilter::CatmullRom => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
            ResizeFilter::Lanczos3 => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
        }
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "box" | "area" => Ok(ResizeFilter::Box),
            "bilinear" => Ok(ResizeFilter::Bilinear),
            "catmull-rom" | "catmullrom" | "bicubic" => Ok(ResizeFilter::CatmullRom),
            "lanczos3" | "lanczos" => Ok(ResizeFilter::Lanczos3),
            other => Err(format!("unknown resize filter '{}'", other)),
        }
    }
}

/// Pixels of a frame after it has been fitted to the grid: one pixel per cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResampledImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<RgbColor>,
}

pub struct FrameProcessor {
    resizer: fr::Resizer,
    options: fr::ResizeOptions,
}

impl FrameProcessor {
    pub fn new(filter: ResizeFilter) -> Self {
        Self {
            resizer: fr::Resizer::new(),
            options: fr::ResizeOptions::new().resize_alg(filter.algorithm()),
        }
    }

    /// Resample `frame` to exactly `grid.cols` x `grid.rows` pixels.
    pub fn resample(&mut self, frame: &Frame, grid: GridSize) -> Result<ResampledImage> {
        if grid.is_empty() {
            return Err(TerimError::Resample(format!(
                "grid {}x{} has no cells",
                grid.cols, grid.rows
            )));
        }
        let (dst_w, dst_h) = (grid.cols as u32, grid.rows as u32);

        let to_pixels = |buffer: &[u8]| -> Vec<RgbColor> {
            buffer
                .chunks_exact(3)
                .map(|px| RgbColor(px[0], px[1], px[2]))
                .collect()
        };

        let pixels = if frame.width == dst_w && frame.height == dst_h {
            to_pixels(&frame.buffer)
        } else {
            let src_image =
                ImageRef::new(frame.width, frame.height, &frame.buffer, fr::PixelType::U8x3)
                    .map_err(|e| TerimError::Resample(e.to_string()))?;

            let mut dst_image = Image::new(dst_w, dst_h, fr::PixelType::U8x3);

            self.resizer
                .resize(&src_image, &mut dst_image, &self.options)
                .map_err(|e| TerimError::Resample(e.to_string()))?;

            to_pixels(dst_image.buffer())
        };

        Ok(ResampledImage {
            width: dst_w as usize,
            height: dst_h as usize,
            pixels,
        })
    }
}
