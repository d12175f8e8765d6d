//! # Matching costs
//!
//! Pixelwise matching cost functions. Each function is prepared once per stereo pair (census
//! codes, ranks, or the raw intensities) and then queried per pixel and disparity through the
//! [`CostModel`] trait.
//!
//! Samples falling outside the image, either inside a support window or at the candidate pixel
//! itself, take the value 0.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;
use ndarray::{Array2, Zip};

use crate::config::{CostFunction, SgmConfig};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

const CODE_WORDS: usize = 4;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Which image a cost volume is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Reference is the left image, the candidate for disparity `d` is at `col - d`.
    Left,
    /// Reference is the right image, the candidate for disparity `d` is at `col + d`.
    Right,
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait CostModel: Send + Sync {
    /// Cost of matching the reference pixel `(row, col)` with its candidate at disparity `d`.
    fn cost(&self, anchor: Anchor, row: usize, col: usize, d: usize) -> u32;
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Census descriptor of up to 256 neighbors, one bit per neighbor in raster order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CensusCode([u64; CODE_WORDS]);

/// Per-pixel data for both images of a pair.
struct Pair<T> {
    left: Array2<T>,
    right: Array2<T>,
}

pub struct CensusCost {
    codes: Pair<CensusCode>,
}

pub struct RankCost {
    ranks: Pair<u32>,
}

pub struct SadCost {
    images: Pair<u8>,
    half: isize,
}

pub struct ZsadCost {
    images: Pair<u8>,
    half: isize,
}

pub struct ShdCost {
    codes: Pair<CensusCode>,
    half: isize,
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Prepare the cost model selected by the configuration for the given pair.
///
/// The configuration is expected to be validated.
pub fn build(config: &SgmConfig, left: &GrayImage, right: &GrayImage) -> Box<dyn CostModel> {
    let left = to_array(left);
    let right = to_array(right);
    let window = config.window_size;

    match config.cost_function {
        CostFunction::Census => Box::new(CensusCost {
            codes: Pair::map(&left, &right, |img| census_transform(img, window)),
        }),
        CostFunction::Rank => Box::new(RankCost {
            ranks: Pair::map(&left, &right, |img| rank_transform(img, window)),
        }),
        CostFunction::Sad => Box::new(SadCost {
            images: Pair { left, right },
            half: (window / 2) as isize,
        }),
        CostFunction::Zsad => Box::new(ZsadCost {
            images: Pair { left, right },
            half: (window / 2) as isize,
        }),
        CostFunction::Shd => Box::new(ShdCost {
            codes: Pair::map(&left, &right, |img| census_transform(img, window)),
            half: (config.shd_window / 2) as isize,
        }),
    }
}

/// Copy a grayscale image into a `(row, col)` array.
pub fn to_array(img: &GrayImage) -> Array2<u8> {
    let (width, height) = img.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
        img.get_pixel(col as u32, row as u32)[0]
    })
}

/// Census transform with a square window. Bits are set for neighbors darker than the center.
pub fn census_transform(img: &Array2<u8>, window: usize) -> Array2<CensusCode> {
    let half = (window / 2) as isize;
    let mut census = Array2::<CensusCode>::default(img.dim());

    Zip::indexed(&mut census).par_for_each(|(row, col), code| {
        let center = img[(row, col)];
        let mut bit = 0;
        for (dr, dc) in window_offsets(half) {
            if dr == 0 && dc == 0 {
                continue;
            }
            if sample(img, row as isize + dr, col as isize + dc) < center {
                code.set(bit);
            }
            bit += 1;
        }
    });

    census
}

/// Rank transform with a square window: the number of neighbors darker than the center.
pub fn rank_transform(img: &Array2<u8>, window: usize) -> Array2<u32> {
    let half = (window / 2) as isize;
    let mut ranks = Array2::<u32>::zeros(img.dim());

    Zip::indexed(&mut ranks).par_for_each(|(row, col), rank| {
        let center = img[(row, col)];
        *rank = window_offsets(half)
            .filter(|&(dr, dc)| dr != 0 || dc != 0)
            .filter(|&(dr, dc)| sample(img, row as isize + dr, col as isize + dc) < center)
            .count() as u32;
    });

    ranks
}

/// Offsets of a square window of half-size `half`, in raster order.
fn window_offsets(half: isize) -> impl Iterator<Item = (isize, isize)> {
    (-half..=half).flat_map(move |dr| (-half..=half).map(move |dc| (dr, dc)))
}

/// Read `a[(row, col)]`, or the default value outside the array.
fn sample<T: Copy + Default>(a: &Array2<T>, row: isize, col: isize) -> T {
    if row < 0 || col < 0 {
        return T::default();
    }
    a.get((row as usize, col as usize)).copied().unwrap_or_default()
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Anchor {
    /// Column of the candidate pixel for disparity `d`. May lie outside the image.
    pub fn candidate(self, col: usize, d: usize) -> isize {
        match self {
            Anchor::Left => col as isize - d as isize,
            Anchor::Right => col as isize + d as isize,
        }
    }
}

impl CensusCode {
    fn set(&mut self, bit: usize) {
        self.0[bit / 64] |= 1 << (bit % 64);
    }

    pub fn count_ones(&self) -> u32 {
        self.0.iter().map(|w| w.count_ones()).sum()
    }

    pub fn hamming(&self, other: &CensusCode) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

impl<T> Pair<T> {
    fn map<S, F>(left: &S, right: &S, f: F) -> Self
    where
        F: Fn(&S) -> Array2<T>,
    {
        Pair {
            left: f(left),
            right: f(right),
        }
    }

    /// (reference, candidate) arrays for the anchor.
    fn sides(&self, anchor: Anchor) -> (&Array2<T>, &Array2<T>) {
        match anchor {
            Anchor::Left => (&self.left, &self.right),
            Anchor::Right => (&self.right, &self.left),
        }
    }
}

impl CostModel for CensusCost {
    fn cost(&self, anchor: Anchor, row: usize, col: usize, d: usize) -> u32 {
        let (reference, candidate) = self.codes.sides(anchor);
        let other = sample(candidate, row as isize, anchor.candidate(col, d));
        reference[(row, col)].hamming(&other)
    }
}

impl CostModel for RankCost {
    fn cost(&self, anchor: Anchor, row: usize, col: usize, d: usize) -> u32 {
        let (reference, candidate) = self.ranks.sides(anchor);
        let other = sample(candidate, row as isize, anchor.candidate(col, d));
        reference[(row, col)].abs_diff(other)
    }
}

impl CostModel for SadCost {
    fn cost(&self, anchor: Anchor, row: usize, col: usize, d: usize) -> u32 {
        let (reference, candidate) = self.images.sides(anchor);
        let (row, col, cand) = (row as isize, col as isize, anchor.candidate(col, d));

        window_offsets(self.half)
            .map(|(dr, dc)| {
                let a = sample(reference, row + dr, col + dc);
                let b = sample(candidate, row + dr, cand + dc);
                a.abs_diff(b) as u32
            })
            .sum()
    }
}

impl CostModel for ZsadCost {
    fn cost(&self, anchor: Anchor, row: usize, col: usize, d: usize) -> u32 {
        let (reference, candidate) = self.images.sides(anchor);
        let (row, col, cand) = (row as isize, col as isize, anchor.candidate(col, d));

        let diffs: Vec<f32> = window_offsets(self.half)
            .map(|(dr, dc)| {
                let a = sample(reference, row + dr, col + dc) as i32;
                let b = sample(candidate, row + dr, cand + dc) as i32;
                (a - b) as f32
            })
            .collect();

        // Mean of the patch difference, i.e. the difference of the two patch means.
        let mean = diffs.iter().sum::<f32>() / diffs.len() as f32;

        diffs
            .iter()
            .map(|diff| (diff - mean).abs().round() as u32)
            .sum()
    }
}

impl CostModel for ShdCost {
    fn cost(&self, anchor: Anchor, row: usize, col: usize, d: usize) -> u32 {
        let (reference, candidate) = self.codes.sides(anchor);
        let (row, col, cand) = (row as isize, col as isize, anchor.candidate(col, d));

        window_offsets(self.half)
            .map(|(dr, dc)| {
                let a = sample(reference, row + dr, col + dc);
                let b = sample(candidate, row + dr, cand + dc);
                a.hamming(&b)
            })
            .sum()
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
