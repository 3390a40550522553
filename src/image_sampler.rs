//! Bitmap to point extraction
//!
//! Walks an RGBA image on a coarse grid and keeps every dark sample as a
//! point. Image rounds have no special points, bonuses or obstacles.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Errors building an image for sampling
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("Image buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Image has no pixels")]
    Empty,
}

/// Sampling grid and cutoffs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleOptions {
    /// Grid spacing in pixels
    pub step: u32,
    /// Average RGB below this counts as dark
    pub threshold: u8,
    /// Keep at most this many points (first in scan order)
    pub max_points: usize,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            step: 20,
            threshold: 100,
            max_points: 20,
        }
    }
}

/// Row-major 8-bit RGBA pixels
#[derive(Debug, Clone)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbaImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, SampleError> {
        if width == 0 || height == 0 {
            return Err(SampleError::Empty);
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(SampleError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Mean of the R, G and B channels at (x, y)
    pub fn brightness(&self, x: u32, y: u32) -> u8 {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let sum: u16 = self.data[i..i + 3].iter().map(|&c| u16::from(c)).sum();
        (sum / 3) as u8
    }
}

/// Extract points from the dark areas of `image` with default options
pub fn sample_points(image: &RgbaImage) -> Vec<Vec2> {
    sample_points_with(image, &SampleOptions::default())
}

/// Extract points from the dark areas of `image`
pub fn sample_points_with(image: &RgbaImage, options: &SampleOptions) -> Vec<Vec2> {
    let step = options.step.max(1) as usize;

    let points: Vec<Vec2> = (0..image.height)
        .step_by(step)
        .flat_map(|y| (0..image.width).step_by(step).map(move |x| (x, y)))
        .filter(|&(x, y)| image.brightness(x, y) < options.threshold)
        .map(|(x, y)| Vec2::new(x as f32, y as f32))
        .take(options.max_points)
        .collect();

    log::info!(
        "Sampled {} points from {}x{} image",
        points.len(),
        image.width,
        image.height
    );
    points
}
