//! # Post filters
//!
//! Median smoothing and invalid-gap interpolation of disparity maps. Both treat disparity 0 as
//! the invalid marker left behind by the uniqueness and consistency checks.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use ndarray::{Array2, ArrayViewMut1, Axis};
use rayon::prelude::*;

use crate::disparity::DisparityMap;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Median filter with an odd square `window`, sampling outside the map from the nearest edge
/// pixel. A window of 1 returns the map unchanged.
pub fn median_filter(map: &DisparityMap, window: usize) -> DisparityMap {
    if window <= 1 {
        return map.clone();
    }

    let (rows, cols) = map.dim();
    let half = (window / 2) as isize;
    let src = map.view();
    let mut out = Array2::<u16>::zeros((rows, cols));

    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(row, mut line)| {
            let mut samples = Vec::with_capacity(window * window);
            for col in 0..cols {
                samples.clear();
                for dr in -half..=half {
                    let r = clamp_index(row as isize + dr, rows);
                    for dc in -half..=half {
                        let c = clamp_index(col as isize + dc, cols);
                        samples.push(src[(r, c)]);
                    }
                }
                samples.sort_unstable();
                line[col] = samples[samples.len() / 2];
            }
        });

    DisparityMap::from_array(out, map.max_disparity())
}

/// Fill invalid (zero) disparities from their valid neighbors.
///
/// Each row is scanned first: an interior run of at most `gap_threshold` zeros takes the smaller
/// of the two disparities bounding it, then leading and trailing zeros take the nearest valid
/// disparity of the row. Columns are then extrapolated to the top and bottom the same way. Rows
/// and columns without any valid disparity are left untouched.
pub fn interpolate_gaps(map: &DisparityMap, gap_threshold: usize) -> DisparityMap {
    let mut data = map.clone().into_inner();

    data.axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|mut line| {
            fill_interior(&mut line, gap_threshold);
            extrapolate(&mut line);
        });

    data.axis_iter_mut(Axis(1))
        .into_par_iter()
        .for_each(|mut line| extrapolate(&mut line));

    DisparityMap::from_array(data, map.max_disparity())
}

fn clamp_index(idx: isize, len: usize) -> usize {
    idx.clamp(0, len as isize - 1) as usize
}

/// Replace runs of zeros bounded by valid disparities on both sides.
fn fill_interior(line: &mut ArrayViewMut1<'_, u16>, gap_threshold: usize) {
    let mut count = 0;

    for u in 0..line.len() {
        if line[u] == 0 {
            count += 1;
            continue;
        }

        let start = u - count;
        if count > 0 && start > 0 && count <= gap_threshold {
            let fill = line[start - 1].min(line[u]);
            for v in start..u {
                line[v] = fill;
            }
        }
        count = 0;
    }
}

/// Copy the first valid disparity over the leading zeros and the last one over the trailing
/// zeros.
fn extrapolate(line: &mut ArrayViewMut1<'_, u16>) {
    let len = line.len();

    let first = match (0..len).find(|&u| line[u] > 0) {
        Some(u) => u,
        None => return,
    };
    let value = line[first];
    for u in 0..first {
        line[u] = value;
    }

    if let Some(last) = (0..len).rev().find(|&u| line[u] > 0) {
        let value = line[last];
        for u in last + 1..len {
            line[u] = value;
        }
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
