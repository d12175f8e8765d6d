//! # Left-right consistency
//!
//! Invalidates left disparities that the right-anchored map does not confirm.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use ndarray::{Array2, Zip};

use crate::disparity::DisparityMap;
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Largest tolerated difference between a left disparity and its right counterpart.
pub const MAX_DIFFERENCE: u16 = 1;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Cross-check `left` against `right`.
///
/// A left pixel `(row, col)` with disparity `ld` is kept when the right map at `(row, col - ld)`
/// holds a disparity within one of `ld`. Matches landing left of the image compare against 0.
/// Rejected pixels are set to 0.
pub fn check(left: &DisparityMap, right: &DisparityMap) -> Result<DisparityMap> {
    if left.dim() != right.dim() {
        let (lr, lc) = left.dim();
        let (rr, rc) = right.dim();
        return Err(Error::DimensionMismatch {
            left: (lc as u32, lr as u32),
            right: (rc as u32, rr as u32),
        });
    }

    let right = right.view();
    let mut out = Array2::<u16>::zeros(left.dim());

    Zip::indexed(&mut out)
        .and(left.view())
        .par_for_each(|(row, col), out, &ld| {
            let rd = match col.checked_sub(ld as usize) {
                Some(c) => right[(row, c)],
                None => 0,
            };
            *out = if ld.abs_diff(rd) <= MAX_DIFFERENCE { ld } else { 0 };
        });

    Ok(DisparityMap::from_array(out, left.max_disparity()))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn consistent_pairs_survive() {
        let left = DisparityMap::from_array(arr2(&[[0, 3, 2, 2, 2]]), 4);
        let right = DisparityMap::from_array(arr2(&[[2, 2, 2, 0, 0]]), 4);

        let checked = check(&left, &right).unwrap();
        assert_eq!(checked.view(), arr2(&[[0, 0, 2, 2, 2]]).view());
    }

    #[test]
    fn off_by_one_is_tolerated() {
        let left = DisparityMap::from_array(arr2(&[[0, 0, 3, 3]]), 4);
        let right = DisparityMap::from_array(arr2(&[[2, 0, 0, 0]]), 4);

        let checked = check(&left, &right).unwrap();
        // col 2 looks left of the image and compares against 0; col 3 finds 2.
        assert_eq!(checked.view(), arr2(&[[0, 0, 0, 3]]).view());
    }

    #[test]
    fn mismatching_maps_are_rejected() {
        let left = DisparityMap::new(2, 3, 4);
        let right = DisparityMap::new(3, 2, 4);
        assert_eq!(
            check(&left, &right),
            Err(Error::DimensionMismatch {
                left: (3, 2),
                right: (2, 3)
            })
        );
    }

    #[test]
    fn rejected_pixels_are_zero() {
        let left = DisparityMap::from_array(arr2(&[[0, 0, 0, 3, 3, 3]]), 4);
        let right = DisparityMap::from_array(arr2(&[[1, 1, 1, 1, 1, 1]]), 4);

        let checked = check(&left, &right).unwrap();
        for col in 0..6 {
            let d = checked.get(0, col);
            assert!(d == 0 || d == left.get(0, col));
        }
        assert_eq!(checked.get(0, 3), 0);
    }
}
