//! # Semi-global matching
//!
//! The full pipeline: matching cost, path aggregation, disparity selection, median filtering,
//! the optional left-right check and the optional gap interpolation.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::time::Instant;

use image::GrayImage;
use log::debug;

use crate::aggregate::{aggregate, Penalties};
use crate::config::{Consistency, SgmConfig};
use crate::consistency::check;
use crate::cost::{self, Anchor, CostModel};
use crate::disparity::DisparityMap;
use crate::error::*;
use crate::filter::{interpolate_gaps, median_filter};
use crate::select::{select, select_right_from_left, Selection};
use crate::volume::{build_volume, AggregatedCost};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A configured SGM pipeline.
///
/// The configuration is validated once on construction and fixed for the lifetime of the
/// instance; `compute` can be called for any number of frame pairs.
#[derive(Debug, Clone)]
pub struct Sgm {
    config: SgmConfig,
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Sgm {
    pub fn new(config: SgmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Compute the left-referenced disparity map of a rectified pair.
    ///
    /// Pixels rejected by the uniqueness or the consistency check are 0, unless gap
    /// interpolation is enabled and refills them.
    pub fn compute(&self, left: &GrayImage, right: &GrayImage) -> Result<DisparityMap> {
        self.check_inputs(left, right)?;

        let (width, height) = left.dimensions();
        debug!(
            "computing {}x{} disparity over {} disparities ({:?}, {} directions, {:?})",
            width,
            height,
            self.config.max_disparity,
            self.config.cost_function,
            self.config.directions.count(),
            self.config.consistency
        );

        let start = Instant::now();
        let model = cost::build(&self.config, left, right);
        debug!("cost model prepared in {:?}", start.elapsed());

        let left_agg = self.aggregated(model.as_ref(), Anchor::Left, left)?;
        let left_map = self.filtered(select(&left_agg, self.selection()));

        let disp = match self.right_map(model.as_ref(), left_agg, right)? {
            Some(right_map) => self.cross_check(&left_map, &right_map)?,
            None => left_map,
        };

        if !self.config.interpolate {
            return Ok(disp);
        }

        let start = Instant::now();
        let disp = interpolate_gaps(&disp, self.config.gap_threshold);
        debug!("gaps interpolated in {:?}", start.elapsed());

        Ok(disp)
    }

    /// Median filtered right-referenced map for the consistency mode, if any.
    ///
    /// The right map is always selected winner-take-all; uniqueness only applies to the left map.
    fn right_map(
        &self,
        model: &dyn CostModel,
        left_agg: AggregatedCost,
        right: &GrayImage,
    ) -> Result<Option<DisparityMap>> {
        let map = match self.config.consistency {
            Consistency::None => return Ok(None),
            Consistency::SingleVolume => select_right_from_left(&left_agg),
            Consistency::DualVolume => {
                drop(left_agg);
                let right_agg = self.aggregated(model, Anchor::Right, right)?;
                select(&right_agg, Selection::WinnerTakesAll)
            }
        };
        Ok(Some(self.filtered(map)))
    }

    fn selection(&self) -> Selection {
        if self.config.uniqueness {
            Selection::Uniqueness
        } else {
            Selection::WinnerTakesAll
        }
    }

    fn penalties(&self) -> Penalties {
        Penalties {
            p1: self.config.penalty_p1,
            p2: self.config.penalty_p2,
        }
    }

    fn check_inputs(&self, left: &GrayImage, right: &GrayImage) -> Result<()> {
        if left.dimensions() != right.dimensions() {
            return Err(Error::DimensionMismatch {
                left: left.dimensions(),
                right: right.dimensions(),
            });
        }

        let (width, height) = left.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage);
        }

        if self.config.max_disparity >= width as usize {
            return Err(Error::DisparityExceedsWidth {
                disparities: self.config.max_disparity,
                width: width as usize,
            });
        }

        Ok(())
    }

    /// Cost volume and aggregation for one reference image.
    fn aggregated(
        &self,
        model: &dyn CostModel,
        anchor: Anchor,
        reference: &GrayImage,
    ) -> Result<AggregatedCost> {
        let (width, height) = reference.dimensions();

        let start = Instant::now();
        let volume = build_volume(
            model,
            anchor,
            height as usize,
            width as usize,
            self.config.max_disparity,
        )?;
        debug!("{:?} cost volume built in {:?}", anchor, start.elapsed());

        let start = Instant::now();
        let agg = aggregate(&volume, self.config.directions, self.penalties())?;
        debug!("{:?} costs aggregated in {:?}", anchor, start.elapsed());

        Ok(agg)
    }

    fn filtered(&self, map: DisparityMap) -> DisparityMap {
        if self.config.median_window <= 1 {
            return map;
        }

        let start = Instant::now();
        let map = median_filter(&map, self.config.median_window);
        debug!(
            "{}x{} median filter applied in {:?}",
            self.config.median_window,
            self.config.median_window,
            start.elapsed()
        );
        map
    }

    fn cross_check(&self, left: &DisparityMap, right: &DisparityMap) -> Result<DisparityMap> {
        let start = Instant::now();
        let checked = check(left, right)?;
        debug!("left-right check in {:?}", start.elapsed());
        Ok(checked)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Disparity map of a rectified pair over `d_range` disparities with the default settings.
pub fn compute_disp(left: &GrayImage, right: &GrayImage, d_range: usize) -> Result<DisparityMap> {
    let config = SgmConfig {
        max_disparity: d_range,
        ..Default::default()
    };
    Sgm::new(config)?.compute(left, right)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CostFunction;
    use image::Luma;

    fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
        let mut state = seed;
        GrayImage::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            Luma([(state >> 16) as u8])
        })
    }

    fn right_map_of(config: SgmConfig, left: &GrayImage, right: &GrayImage) -> DisparityMap {
        let sgm = Sgm::new(config).unwrap();
        let model = cost::build(&sgm.config, left, right);
        let left_agg = sgm.aggregated(model.as_ref(), Anchor::Left, left).unwrap();
        sgm.right_map(model.as_ref(), left_agg, right)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn right_map_ignores_uniqueness() {
        let left = noise(48, 32, 5);
        let right = noise(48, 32, 6);

        for consistency in [Consistency::SingleVolume, Consistency::DualVolume] {
            let config = SgmConfig {
                cost_function: CostFunction::Sad,
                window_size: 5,
                max_disparity: 8,
                consistency,
                median_window: 1,
                ..Default::default()
            };
            let plain = right_map_of(config.clone(), &left, &right);
            let unique = right_map_of(
                SgmConfig {
                    uniqueness: true,
                    ..config
                },
                &left,
                &right,
            );
            assert_eq!(plain, unique, "{:?}", consistency);
        }
    }

    #[test]
    fn dual_volume_right_map_is_winner_takes_all() {
        let left = noise(48, 32, 5);
        let right = noise(48, 32, 6);
        let config = SgmConfig {
            cost_function: CostFunction::Sad,
            window_size: 5,
            max_disparity: 8,
            consistency: Consistency::DualVolume,
            uniqueness: true,
            median_window: 1,
            ..Default::default()
        };

        let sgm = Sgm::new(config).unwrap();
        let model = cost::build(&sgm.config, &left, &right);
        let right_agg = sgm.aggregated(model.as_ref(), Anchor::Right, &right).unwrap();
        let expected = select(&right_agg, Selection::WinnerTakesAll);

        assert_eq!(right_map_of(sgm.config.clone(), &left, &right), expected);
    }

    #[test]
    fn no_right_map_without_consistency() {
        let img = noise(16, 8, 1);
        let sgm = Sgm::new(SgmConfig {
            max_disparity: 4,
            ..Default::default()
        })
        .unwrap();
        let model = cost::build(&sgm.config, &img, &img);
        let left_agg = sgm.aggregated(model.as_ref(), Anchor::Left, &img).unwrap();
        assert_eq!(sgm.right_map(model.as_ref(), left_agg, &img), Ok(None));
    }
}
