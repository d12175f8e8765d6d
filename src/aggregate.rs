//! # Path aggregation
//!
//! The SGM smoothing recurrence. For a scanline direction `r` and pixel `p`:
//!
//! ```text
//! Lr(p,d) = C(p,d) + min(Lr(p-r,d), Lr(p-r,d-1) + P1, Lr(p-r,d+1) + P1, min_i Lr(p-r,i) + P2)
//!                  - min_i Lr(p-r,i)
//! ```
//!
//! Directions 0-3 look back at pixels already visited by a forward raster scan, directions 4-7
//! at pixels visited by a reverse scan. Each direction is an independent task; within a
//! direction the scan order is strictly sequential.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::time::Instant;

use log::trace;
use ndarray::{Array3, s};
use rayon::prelude::*;

use crate::config::Directions;
use crate::error::*;
use crate::volume::{allocate, AggregatedCost, CostVolume};

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Cost sentinel marking unavailable disparities.
pub const MAX_VALUE: u32 = u32::MAX;

/// Scanline directions, as the offset from a pixel to its predecessor `p - r`.
pub static PATHS: [ScanLine; 8] = [
    ScanLine {
        drow: 0,
        dcol: -1,
        forward: true,
    },
    ScanLine {
        drow: -1,
        dcol: -1,
        forward: true,
    },
    ScanLine {
        drow: -1,
        dcol: 0,
        forward: true,
    },
    ScanLine {
        drow: -1,
        dcol: 1,
        forward: true,
    },
    ScanLine {
        drow: 0,
        dcol: 1,
        forward: false,
    },
    ScanLine {
        drow: 1,
        dcol: 1,
        forward: false,
    },
    ScanLine {
        drow: 1,
        dcol: 0,
        forward: false,
    },
    ScanLine {
        drow: 1,
        dcol: -1,
        forward: false,
    },
];

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct ScanLine {
    pub drow: isize,
    pub dcol: isize,
    /// Scanned in increasing row/col order.
    pub forward: bool,
}

/// Smoothness penalties for a one-step (`p1`) and a larger (`p2`) disparity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Penalties {
    pub p1: u32,
    pub p2: u32,
}

/// Running path cost `Lr` of one direction, indexed `(row, col, disparity)`.
pub type DirectionAccumulator = Array3<u32>;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Aggregate `cost` along the active directions and sum the path costs.
pub fn aggregate(
    cost: &CostVolume,
    directions: Directions,
    penalties: Penalties,
) -> Result<AggregatedCost> {
    let (rows, cols, disparities) = cost.dim();

    // Each accumulator is folded into the running sum as soon as its scan finishes.
    let total = PATHS[..directions.count()]
        .par_iter()
        .enumerate()
        .map(|(index, path)| {
            let start = Instant::now();
            let lr = scan_direction(cost, path, penalties);
            trace!("direction {} ({:?}) aggregated in {:?}", index, path, start.elapsed());
            lr
        })
        .try_reduce_with(|mut total, lr| {
            total += &lr;
            Ok(total)
        });

    match total {
        Some(total) => Ok(AggregatedCost::from_array(total?)),
        None => Ok(AggregatedCost::from_array(allocate(rows, cols, disparities)?)),
    }
}

/// Run the recurrence along a single direction.
pub fn scan_direction(
    cost: &CostVolume,
    path: &ScanLine,
    penalties: Penalties,
) -> Result<DirectionAccumulator> {
    let (rows, cols, disparities) = cost.dim();
    let mut lr = allocate(rows, cols, disparities)?;
    let mut prev = vec![0u32; disparities];

    for i in 0..rows {
        let row = if path.forward { i } else { rows - 1 - i };
        for j in 0..cols {
            let col = if path.forward { j } else { cols - 1 - j };

            let prev_row = row as isize + path.drow;
            let prev_col = col as isize + path.dcol;
            let first = prev_row < 0
                || prev_col < 0
                || prev_row >= rows as isize
                || prev_col >= cols as isize;

            if first {
                lr.slice_mut(s![row, col, ..]).assign(&cost.costs(row, col));
                continue;
            }

            for (d, value) in prev.iter_mut().enumerate() {
                *value = lr[(prev_row as usize, prev_col as usize, d)];
            }
            let min_prev = prev.iter().copied().min().unwrap_or_default();

            for d in 0..disparities {
                lr[(row, col, d)] = step(&prev, min_prev, d, cost.get(row, col, d), penalties);
            }
        }
    }

    Ok(lr)
}

/// One cell of the recurrence, given the predecessor's path costs and their minimum.
///
/// The running minimum is subtracted from the smoothed term before the pixel cost is added, so
/// the result never exceeds `cost + P2` and no intermediate wraps.
fn step(prev: &[u32], min_prev: u32, d: usize, cost: u32, penalties: Penalties) -> u32 {
    let Penalties { p1, p2 } = penalties;

    let minus = if d == 0 { MAX_VALUE - p1 } else { prev[d - 1] };
    let plus = if d + 1 == prev.len() {
        MAX_VALUE - p1
    } else {
        prev[d + 1]
    };

    let smoothed = prev[d]
        .min(minus + p1)
        .min(plus + p1)
        .min(min_prev + p2);

    cost + (smoothed - min_prev)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    const PENALTIES: Penalties = Penalties { p1: 3, p2: 10 };

    fn volume(rows: usize, cols: usize, disparities: usize) -> CostVolume {
        CostVolume::from_array(Array3::from_shape_fn(
            (rows, cols, disparities),
            |(r, c, d)| ((r * 7 + c * 13 + d * 5) % 17) as u32,
        ))
    }

    #[test]
    fn step_picks_cheapest_transition() {
        let prev = [5, 2, 9, 20];
        // Same disparity: 5. Neighbor at d=1 with P1: 5. Jump from min with P2: 12.
        assert_eq!(step(&prev, 2, 0, 4, PENALTIES), 4 + 5 - 2);
        assert_eq!(step(&prev, 2, 1, 4, PENALTIES), 4);
        assert_eq!(step(&prev, 2, 2, 4, PENALTIES), 4 + 5 - 2);
        assert_eq!(step(&prev, 2, 3, 4, PENALTIES), 4 + 12 - 2);
    }

    #[test]
    fn step_with_single_disparity_keeps_cost() {
        assert_eq!(step(&[42], 42, 0, 7, PENALTIES), 7);
    }

    #[test]
    fn first_pixel_of_each_direction_is_raw_cost() {
        let cost = volume(5, 6, 4);

        for path in &PATHS {
            let lr = scan_direction(&cost, path, PENALTIES).unwrap();
            for row in 0..5 {
                for col in 0..6 {
                    let prev_row = row as isize + path.drow;
                    let prev_col = col as isize + path.dcol;
                    if prev_row < 0 || prev_col < 0 || prev_row >= 5 || prev_col >= 6 {
                        for d in 0..4 {
                            assert_eq!(lr[(row, col, d)], cost.get(row, col, d));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn horizontal_path_follows_recurrence() {
        let cost = volume(1, 5, 3);
        let lr = scan_direction(&cost, &PATHS[0], PENALTIES).unwrap();

        let mut expected = vec![cost.costs(0, 0).to_vec()];
        for col in 1..5 {
            let prev = expected[col - 1].clone();
            let min_prev = *prev.iter().min().unwrap();
            let row: Vec<u32> = (0..3)
                .map(|d| step(&prev, min_prev, d, cost.get(0, col, d), PENALTIES))
                .collect();
            expected.push(row);
        }

        for col in 0..5 {
            for d in 0..3 {
                assert_eq!(lr[(0, col, d)], expected[col][d]);
            }
        }
    }

    #[test]
    fn path_cost_is_bounded() {
        let cost = volume(8, 8, 6);
        let max_cost = cost.view().iter().copied().max().unwrap();

        for path in &PATHS {
            let lr = scan_direction(&cost, path, PENALTIES).unwrap();
            assert!(lr.iter().all(|&v| v <= max_cost + PENALTIES.p2));
        }
    }

    #[test]
    fn aggregate_sums_active_directions() {
        let cost = volume(4, 5, 3);

        for (directions, count) in [(Directions::Four, 4), (Directions::Eight, 8)] {
            let total = aggregate(&cost, directions, PENALTIES).unwrap();
            let paths: Vec<_> = PATHS[..count]
                .iter()
                .map(|p| scan_direction(&cost, p, PENALTIES).unwrap())
                .collect();

            for row in 0..4 {
                for col in 0..5 {
                    for d in 0..3 {
                        let sum: u32 = paths.iter().map(|lr| lr[(row, col, d)]).sum();
                        assert_eq!(total.get(row, col, d), sum);
                    }
                }
            }
        }
    }

    #[test]
    fn zero_cost_disparity_stays_zero() {
        // Disparity 0 is free everywhere, so every path keeps it at zero.
        let cost = CostVolume::from_array(Array3::from_shape_fn((6, 6, 4), |(r, c, d)| {
            if d == 0 {
                0
            } else {
                (1 + r + c + d) as u32
            }
        }));
        let total = aggregate(&cost, Directions::Eight, PENALTIES).unwrap();
        for row in 0..6 {
            for col in 0..6 {
                assert_eq!(total.get(row, col, 0), 0);
            }
        }
    }
}
