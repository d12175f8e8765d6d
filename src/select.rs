//! # Disparity selection
//!
//! Reduces an aggregated cost volume to one disparity per pixel, either by plain
//! winner-take-all or with a uniqueness test that rejects ambiguous minima.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use ndarray::{Array2, ArrayView1, Zip};

use crate::disparity::DisparityMap;
use crate::volume::AggregatedCost;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Disparity selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Lowest aggregated cost, ties resolved to the lowest disparity.
    WinnerTakesAll,
    /// Winner-take-all, but ambiguous pixels are forced to disparity 0.
    Uniqueness,
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// The three smallest costs of a pixel and the disparities of the two smallest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Minima {
    pub values: [u32; 3],
    pub disparities: [usize; 2],
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Select one disparity per pixel of a left- or right-anchored aggregated cost.
pub fn select(cost: &AggregatedCost, selection: Selection) -> DisparityMap {
    let (rows, cols, disparities) = cost.dim();
    let mut map = Array2::<u16>::zeros((rows, cols));

    Zip::indexed(&mut map).par_for_each(|(row, col), disp| {
        let costs = cost.costs(row, col);
        let d = match selection {
            Selection::WinnerTakesAll => winner_takes_all(costs),
            Selection::Uniqueness => unique_winner(costs),
        };
        *disp = d as u16;
    });

    DisparityMap::from_array(map, disparities)
}

/// Recover the right-anchored map from a left-anchored aggregated cost.
///
/// The right pixel `col` at disparity `d` corresponds to the left pixel `col + d`, so the right
/// disparity is the winner of `cost(row, col + d, d)` over the disparities that stay inside the
/// image. Always plain winner-take-all.
pub fn select_right_from_left(cost: &AggregatedCost) -> DisparityMap {
    let (rows, cols, disparities) = cost.dim();
    let mut map = Array2::<u16>::zeros((rows, cols));

    Zip::indexed(&mut map).par_for_each(|(row, col), disp| {
        let mut best = cost.get(row, col, 0);
        let mut best_d = 0;
        for d in 1..disparities.min(cols - col) {
            let candidate = cost.get(row, col + d, d);
            if candidate < best {
                best = candidate;
                best_d = d;
            }
        }
        *disp = best_d as u16;
    });

    DisparityMap::from_array(map, disparities)
}

/// Index of the smallest cost; the first one on ties.
pub fn winner_takes_all(costs: ArrayView1<'_, u32>) -> usize {
    let mut best = 0;
    for (d, &value) in costs.iter().enumerate().skip(1) {
        if value < costs[best] {
            best = d;
        }
    }
    best
}

/// Winner-take-all with the uniqueness test.
///
/// The match is rejected when the runner-up is not adjacent and within 5% of the winner, or
/// when the third smallest cost is within 5% of it. The ratio is evaluated as `min * 20 >
/// other * 19` in integers.
pub fn unique_winner(costs: ArrayView1<'_, u32>) -> usize {
    let Minima {
        values: [min0, min1, min2],
        disparities: [d0, d1],
    } = three_smallest(costs);

    let min0 = min0 as u64 * 20;
    let min1 = min1 as u64 * 19;
    let min2 = min2 as u64 * 19;

    if (d0.abs_diff(d1) > 1 && min0 > min1) || min0 > min2 {
        0
    } else {
        d0
    }
}

/// Single pass insertion of every cost into a three-slot minimum list.
///
/// Slots start at `u32::MAX` with both disparities at 0; a strict `<` keeps the lowest index on
/// ties.
pub fn three_smallest(costs: ArrayView1<'_, u32>) -> Minima {
    let mut values = [u32::MAX; 3];
    let mut disparities = [0usize; 2];

    for (d, &value) in costs.iter().enumerate() {
        if value < values[0] {
            values = [value, values[0], values[1]];
            disparities = [d, disparities[0]];
        } else if value < values[1] {
            values = [values[0], value, values[1]];
            disparities[1] = d;
        } else if value < values[2] {
            values[2] = value;
        }
    }

    Minima {
        values,
        disparities,
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array3};

    #[test]
    fn winner_takes_first_minimum() {
        assert_eq!(winner_takes_all(arr1(&[5, 3, 3, 9]).view()), 1);
        assert_eq!(winner_takes_all(arr1(&[2, 3, 2]).view()), 0);
        assert_eq!(winner_takes_all(arr1(&[7]).view()), 0);
    }

    #[test]
    fn three_smallest_tracks_order() {
        let minima = three_smallest(arr1(&[50, 10, 40, 20, 30]).view());
        assert_eq!(minima.values, [10, 20, 30]);
        assert_eq!(minima.disparities, [1, 3]);

        let minima = three_smallest(arr1(&[4]).view());
        assert_eq!(minima.values, [4, u32::MAX, u32::MAX]);
        assert_eq!(minima.disparities, [0, 0]);
    }

    #[test]
    fn uniqueness_keeps_clear_winner() {
        // 100 * 20 = 2000 is not above 200 * 19 = 3800.
        assert_eq!(unique_winner(arr1(&[300, 200, 100, 250, 400]).view()), 2);
    }

    #[test]
    fn uniqueness_rejects_distant_runner_up() {
        // Runner-up at distance 3 within 5%: 100 * 20 = 2000 > 104 * 19 = 1976.
        assert_eq!(
            unique_winner(arr1(&[500, 100, 500, 500, 104, 500]).view()),
            0
        );
    }

    #[test]
    fn uniqueness_accepts_adjacent_runner_up() {
        // The runner-up is adjacent and the third candidate is far enough.
        assert_eq!(
            unique_winner(arr1(&[500, 100, 101, 500, 500]).view()),
            1
        );
    }

    #[test]
    fn uniqueness_rejects_close_third() {
        // Adjacent runner-up, but the third smallest is also within 5%.
        assert_eq!(
            unique_winner(arr1(&[500, 100, 101, 102, 500]).view()),
            0
        );
    }

    #[test]
    fn uniqueness_only_ever_forces_zero() {
        let mut state = 7u32;
        for _ in 0..500 {
            let costs: Vec<u32> = (0..9)
                .map(|_| {
                    state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                    100 + (state >> 24)
                })
                .collect();
            let costs = arr1(&costs);
            let plain = winner_takes_all(costs.view());
            let unique = unique_winner(costs.view());
            assert!(unique == plain || unique == 0);
        }
    }

    #[test]
    fn right_map_scans_candidate_side() {
        // Left-anchored cost is minimal at d=2 everywhere.
        let cost = AggregatedCost::from_array(Array3::from_shape_fn((1, 6, 4), |(_, _, d)| {
            if d == 2 {
                1
            } else {
                10
            }
        }));
        let right = select_right_from_left(&cost);

        // Right pixels whose candidates col + 2 stay inside the image find d=2.
        for col in 0..4 {
            assert_eq!(right.get(0, col), 2);
        }
        // Near the right border only d < cols - col are visible.
        assert_eq!(right.get(0, 4), 0);
        assert_eq!(right.get(0, 5), 0);
    }

    #[test]
    fn select_applies_policy_per_pixel() {
        let cost = AggregatedCost::from_array(Array3::from_shape_fn((2, 2, 5), |(r, c, d)| {
            ((d as isize - (r + c) as isize).abs() * 10) as u32
        }));
        let map = select(&cost, Selection::WinnerTakesAll);
        assert_eq!(map.dim(), (2, 2));
        assert_eq!(map.max_disparity(), 5);
        for r in 0..2 {
            for c in 0..2 {
                assert_eq!(map.get(r, c), (r + c) as u16);
            }
        }
    }
}
