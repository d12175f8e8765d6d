//! # Cost volumes
//!
//! Dense `(row, col, disparity)` arrays of matching costs, and the builder applying a
//! [`CostModel`] across a whole image pair.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use ndarray::{Array3, ArrayView1, ArrayView3, Zip, s};

use crate::cost::{Anchor, CostModel};
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Dense `(row, col, disparity)` cost array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostVolume {
    data: Array3<u32>,
}

/// Direction-wise sum of the path costs. Shares the layout of the cost volume it came from.
pub type AggregatedCost = CostVolume;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Evaluate `model` for every pixel and every disparity in `0..disparities`.
pub fn build_volume(
    model: &dyn CostModel,
    anchor: Anchor,
    rows: usize,
    cols: usize,
    disparities: usize,
) -> Result<CostVolume> {
    let mut data = allocate(rows, cols, disparities)?;

    Zip::indexed(&mut data).par_for_each(|(row, col, d), cost| {
        *cost = model.cost(anchor, row, col, d);
    });

    Ok(CostVolume { data })
}

/// Allocate a zeroed `(rows, cols, disparities)` array, reporting allocation failure instead of
/// aborting.
pub(crate) fn allocate(rows: usize, cols: usize, disparities: usize) -> Result<Array3<u32>> {
    let elements = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(disparities))
        .ok_or(Error::Allocation {
            elements: usize::MAX,
        })?;

    let mut buf: Vec<u32> = Vec::new();
    buf.try_reserve_exact(elements)
        .map_err(|_| Error::Allocation { elements })?;
    buf.resize(elements, 0);

    Array3::from_shape_vec((rows, cols, disparities), buf).map_err(|_| Error::Allocation { elements })
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl CostVolume {
    /// Wrap an existing `(row, col, disparity)` array.
    pub fn from_array(data: Array3<u32>) -> Self {
        Self { data }
    }

    /// `(rows, cols, disparities)`
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, row: usize, col: usize, d: usize) -> u32 {
        self.data[(row, col, d)]
    }

    /// Costs of every disparity at one pixel.
    pub fn costs(&self, row: usize, col: usize) -> ArrayView1<'_, u32> {
        self.data.slice(s![row, col, ..])
    }

    pub fn view(&self) -> ArrayView3<'_, u32> {
        self.data.view()
    }

    pub(crate) fn data_mut(&mut self) -> &mut Array3<u32> {
        &mut self.data
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CostFunction, SgmConfig};
    use crate::cost;
    use image::{GrayImage, Luma};

    fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
        let mut state = seed;
        GrayImage::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            Luma([(state >> 16) as u8])
        })
    }

    #[test]
    fn matches_row_major_evaluation() {
        let left = noise(20, 10, 1);
        let right = noise(20, 10, 2);
        let config = SgmConfig {
            cost_function: CostFunction::Sad,
            window_size: 5,
            ..Default::default()
        };
        let model = cost::build(&config, &left, &right);

        for anchor in [Anchor::Left, Anchor::Right] {
            let volume = build_volume(model.as_ref(), anchor, 10, 20, 6).unwrap();
            assert_eq!(volume.dim(), (10, 20, 6));

            for row in 0..10 {
                for col in 0..20 {
                    for d in 0..6 {
                        assert_eq!(volume.get(row, col, d), model.cost(anchor, row, col, d));
                    }
                }
            }
        }
    }

    #[test]
    fn allocation_overflow_is_reported() {
        assert!(matches!(
            allocate(usize::MAX, 2, 2),
            Err(Error::Allocation { .. })
        ));
    }
}
