//! Deterministic synthetic stereo pairs.

use image::{GrayImage, Luma};

/// Uniform noise texture from a linear congruential generator.
pub fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
    let mut state = seed;
    GrayImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        Luma([(state >> 16) as u8])
    })
}

/// Right view of a fronto-parallel scene at constant disparity `shift`: every right pixel
/// `x` shows the left pixel `x + shift`, replicating the last column past the border.
pub fn shifted(left: &GrayImage, shift: u32) -> GrayImage {
    let width = left.width();
    GrayImage::from_fn(width, left.height(), |x, y| {
        *left.get_pixel((x + shift).min(width - 1), y)
    })
}
