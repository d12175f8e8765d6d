//! # Disparity maps
//!
//! Integer disparity maps produced by the selector and refined by the post filters. Disparity 0
//! doubles as the "invalid" marker once a consistency or uniqueness check has run.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayView2};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// An integer disparity map with values in `[0, max_disparity)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisparityMap {
    data: Array2<u16>,
    max_disparity: usize,
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl DisparityMap {
    /// An all-zero map of `rows` x `cols`.
    pub fn new(rows: usize, cols: usize, max_disparity: usize) -> Self {
        DisparityMap {
            data: Array2::zeros((rows, cols)),
            max_disparity,
        }
    }

    /// Wrap a `(row, col)` array of disparities.
    pub fn from_array(data: Array2<u16>, max_disparity: usize) -> Self {
        DisparityMap {
            data,
            max_disparity,
        }
    }

    /// `(rows, cols)`
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Size of the disparity range the map was computed with.
    pub fn max_disparity(&self) -> usize {
        self.max_disparity
    }

    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.data[(row, col)]
    }

    #[cfg(test)]
    pub(crate) fn put(&mut self, row: usize, col: usize, val: u16) {
        self.data[(row, col)] = val;
    }

    pub fn view(&self) -> ArrayView2<'_, u16> {
        self.data.view()
    }

    pub fn into_inner(self) -> Array2<u16> {
        self.data
    }

    /// Converts the map into an 8 bit image, saturating disparities above 255.
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.cols() as u32, self.rows() as u32, |x, y| {
            let val = self.data[(y as usize, x as usize)];
            Luma([val.min(255) as u8])
        })
    }

    /// Converts the map into an 8 bit image scaled so the disparity range spans `0..=255`.
    pub fn to_luma_normalised(&self) -> GrayImage {
        let mult = match self.max_disparity {
            0 | 1 => 1.0,
            d => 255.0 / (d - 1) as f32,
        };

        GrayImage::from_fn(self.cols() as u32, self.rows() as u32, |x, y| {
            let val = self.data[(y as usize, x as usize)] as f32 * mult;
            Luma([val.round().clamp(0.0, 255.0) as u8])
        })
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
