//! Palette reduction for one resampled frame.
//!
//! Images that already fit the budget keep their exact colors. Larger ones go
//! through imagequant with dithering off, so a given frame always maps to the
//! same palette and the same indices.

use imagequant::{Attributes, RGBA};
use rayon::prelude::*;

use super::cell::{CellBuffer, Palette, RgbColor};
use super::processor::ResampledImage;
use crate::error::Result;

/// Output of one quantization pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quantized {
    pub palette: Palette,
    pub cells: CellBuffer,
}

/// Sorted distinct colors, or `None` as soon as there are more than `limit`.
fn distinct_colors(pixels: &[RgbColor], limit: usize) -> Option<Vec<RgbColor>> {
    let mut colors = pixels.to_vec();
    colors.par_sort_unstable();
    colors.dedup();
    (colors.len() <= limit).then_some(colors)
}

fn exact(image: &ResampledImage, colors: Vec<RgbColor>) -> Quantized {
    let indices = image
        .pixels
        .par_iter()
        .map(|px| colors.binary_search(px).unwrap_or(0) as u8)
        .collect();

    Quantized {
        palette: Palette { colors },
        cells: CellBuffer {
            width: image.width,
            indices,
        },
    }
}

/// A single register can only hold the average color.
fn mean(image: &ResampledImage) -> Quantized {
    let total = image.pixels.len().max(1) as u64;
    let sums = image
        .pixels
        .par_iter()
        .map(|px| [px.0 as u64, px.1 as u64, px.2 as u64])
        .reduce(|| [0; 3], |a, b| [a[0] + b[0], a[1] + b[1], a[2] + b[2]]);
    let avg = |sum: u64| ((sum + total / 2) / total) as u8;

    Quantized {
        palette: Palette {
            colors: vec![RgbColor(avg(sums[0]), avg(sums[1]), avg(sums[2]))],
        },
        cells: CellBuffer {
            width: image.width,
            indices: vec![0; image.pixels.len()],
        },
    }
}

fn reduce(image: &ResampledImage, max_colors: usize) -> Result<Quantized> {
    let pixels: Vec<RGBA> = image
        .pixels
        .iter()
        .map(|px| RGBA::new(px.0, px.1, px.2, 255))
        .collect();

    let mut attr = Attributes::new();
    attr.set_max_colors(max_colors as u32)?;
    attr.set_quality(0, 100)?;

    let mut img = attr.new_image(pixels, image.width, image.height, 0.0)?;
    let mut result = attr.quantize(&mut img)?;
    result.set_dithering_level(0.0)?;
    let (palette, indices) = result.remapped(&mut img)?;

    Ok(Quantized {
        palette: Palette {
            colors: palette.iter().map(|c| RgbColor(c.r, c.g, c.b)).collect(),
        },
        cells: CellBuffer {
            width: image.width,
            indices,
        },
    })
}

/// Reduce `image` to at most `max_colors` colors (clamped to 1..=255).
pub fn quantize(image: &ResampledImage, max_colors: usize) -> Result<Quantized> {
    let max_colors = max_colors.clamp(1, u8::MAX as usize);
    if image.pixels.is_empty() {
        return Ok(exact(image, Vec::new()));
    }

    if let Some(colors) = distinct_colors(&image.pixels, max_colors) {
        return Ok(exact(image, colors));
    }
    if max_colors == 1 {
        return Ok(mean(image));
    }
    reduce(image, max_colors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_from(width: usize, pixels: Vec<RgbColor>) -> ResampledImage {
        ResampledImage {
            width,
            height: pixels.len() / width,
            pixels,
        }
    }

    fn rainbow(width: usize, height: usize) -> ResampledImage {
        let pixels = (0..width * height)
            .map(|i| RgbColor((i * 37 % 256) as u8, (i * 91 % 256) as u8, (i * 13 % 256) as u8))
            .collect();
        image_from(width, pixels)
    }

    #[test]
    fn test_solid_image_has_one_entry() {
        let image = image_from(2, vec![RgbColor(255, 0, 0); 4]);
        let q = quantize(&image, 255).unwrap();
        assert_eq!(q.palette.colors, vec![RgbColor(255, 0, 0)]);
        assert_eq!(q.cells.indices, vec![0; 4]);
    }

    #[test]
    fn test_lossless_within_budget() {
        let image = rainbow(16, 1);
        let q = quantize(&image, 16).unwrap();
        assert!(q.palette.colors.len() <= 16);
        for (px, idx) in image.pixels.iter().zip(&q.cells.indices) {
            assert_eq!(q.palette.colors[*idx as usize], *px);
        }
    }

    #[test]
    fn test_budget_is_never_exceeded() {
        let image = rainbow(80, 24);
        for budget in [1usize, 2, 7, 15, 255] {
            let q = quantize(&image, budget).unwrap();
            assert!(!q.palette.colors.is_empty());
            assert!(q.palette.colors.len() <= budget);
            assert!(q
                .cells
                .indices
                .iter()
                .all(|i| (*i as usize) < q.palette.colors.len()));
            assert_eq!(q.cells.indices.len(), image.pixels.len());
        }
    }

    #[test]
    fn test_single_register_holds_the_mean() {
        let image = image_from(2, vec![RgbColor(0, 0, 0), RgbColor(200, 100, 50)]);
        let q = quantize(&image, 1).unwrap();
        assert_eq!(q.palette.colors, vec![RgbColor(100, 50, 25)]);
        assert_eq!(q.cells.indices, vec![0, 0]);
    }

    #[test]
    fn test_budget_above_register_limit_is_clamped() {
        let image = rainbow(40, 20);
        let q = quantize(&image, 1000).unwrap();
        assert!(q.palette.colors.len() <= 255);
    }

    #[test]
    fn test_two_clusters_split_apart() {
        let mut pixels = Vec::new();
        for i in 0..8u8 {
            pixels.push(RgbColor(i, i, i));
            pixels.push(RgbColor(250 - i, 250 - i, 250 - i));
        }
        let q = quantize(&image_from(4, pixels), 2).unwrap();
        assert_eq!(q.palette.colors.len(), 2);
        let dark = q.cells.indices[0];
        let light = q.cells.indices[1];
        assert_ne!(dark, light);
        assert!(q.palette.colors[dark as usize].0 < 10);
        assert!(q.palette.colors[light as usize].0 > 240);
    }

    #[test]
    fn test_quantize_is_deterministic() {
        let image = rainbow(64, 32);
        assert_eq!(quantize(&image, 31).unwrap(), quantize(&image, 31).unwrap());
    }
}
