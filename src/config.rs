//! # Matcher configuration
//!
//! The configuration record consumed by [`crate::Sgm`]. All options are fixed once per matcher
//! instance and are checked eagerly by [`SgmConfig::validate`].

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Smallest supported matching window.
pub const MIN_WINDOW: usize = 3;

/// Largest supported matching window. A 15x15 census code needs 224 bits.
pub const MAX_WINDOW: usize = 15;

/// Largest supported median filter window.
pub const MAX_MEDIAN_WINDOW: usize = 31;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Pixelwise matching cost function.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CostFunction {
    Census,
    Rank,
    Sad,
    Zsad,
    Shd,
}

/// Number of scanline directions aggregated by SGM.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "usize")]
pub enum Directions {
    Four,
    Eight,
}

/// Left-right consistency checking mode.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// Only the left-anchored map is computed.
    None,
    /// The right map is recovered from the left-anchored aggregated cost ("LR1").
    #[serde(alias = "lr1")]
    SingleVolume,
    /// Independent left- and right-anchored cost volumes ("LR2").
    #[serde(alias = "lr2")]
    DualVolume,
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SgmConfig {
    pub cost_function: CostFunction,
    pub window_size: usize,
    /// Outer window of the SHD cost, ignored by the other cost functions.
    pub shd_window: usize,
    pub max_disparity: usize,
    pub penalty_p1: u32,
    pub penalty_p2: u32,
    pub directions: Directions,
    pub uniqueness: bool,
    pub consistency: Consistency,
    /// Median filter window applied to every selected map. 1 disables the filter.
    pub median_window: usize,
    /// Longest run of invalid pixels bridged by gap interpolation.
    pub gap_threshold: usize,
    pub interpolate: bool,
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl CostFunction {
    /// Largest cost the function can produce for a single pixel and disparity.
    pub fn max_cost(self, window_size: usize, shd_window: usize) -> u64 {
        let area = (window_size * window_size) as u64;
        match self {
            CostFunction::Census | CostFunction::Rank => area - 1,
            CostFunction::Sad => 255 * area,
            CostFunction::Zsad => 2 * 255 * area,
            CostFunction::Shd => (area - 1) * (shd_window * shd_window) as u64,
        }
    }
}

impl Directions {
    pub fn count(self) -> usize {
        match self {
            Directions::Four => 4,
            Directions::Eight => 8,
        }
    }
}

impl TryFrom<usize> for Directions {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            4 => Ok(Directions::Four),
            8 => Ok(Directions::Eight),
            n => Err(Error::DirectionCount(n)),
        }
    }
}

impl Default for SgmConfig {
    fn default() -> Self {
        Self {
            cost_function: CostFunction::Census,
            window_size: 7,
            shd_window: 3,
            max_disparity: 128,
            penalty_p1: 7,
            penalty_p2: 86,
            directions: Directions::Four,
            uniqueness: false,
            consistency: Consistency::None,
            median_window: 5,
            gap_threshold: 128,
            interpolate: false,
        }
    }
}

impl SgmConfig {
    /// Check every option. Nothing is clamped; the first offending option is reported.
    pub fn validate(&self) -> Result<()> {
        if self.max_disparity == 0 {
            return Err(Error::ZeroDisparity);
        }
        if self.max_disparity > u16::MAX as usize {
            return Err(Error::DisparityTooLarge(self.max_disparity));
        }
        if self.penalty_p1 >= self.penalty_p2 {
            return Err(Error::PenaltyOrder {
                p1: self.penalty_p1,
                p2: self.penalty_p2,
            });
        }
        check_window("window_size", self.window_size, MIN_WINDOW, MAX_WINDOW)?;
        check_window("shd_window", self.shd_window, 1, MAX_WINDOW)?;
        check_window("median_window", self.median_window, 1, MAX_MEDIAN_WINDOW)?;
        if self.gap_threshold == 0 {
            return Err(Error::InvalidWindow {
                name: "gap_threshold",
                size: 0,
                min: 1,
                max: usize::MAX,
            });
        }

        // Lr never exceeds max_cost + P2, and the recurrence adds at most another P2 before the
        // running minimum is removed again. The direction sum must stay below the sentinel.
        let bound = self.max_cost() + 2 * self.penalty_p2 as u64;
        let bound = bound * self.directions.count() as u64 + self.penalty_p1 as u64;
        if bound >= u32::MAX as u64 {
            return Err(Error::CostRange { bound });
        }

        Ok(())
    }

    /// Largest pixelwise cost of the configured cost function.
    pub fn max_cost(&self) -> u64 {
        self.cost_function
            .max_cost(self.window_size, self.shd_window)
    }
}

fn check_window(name: &'static str, size: usize, min: usize, max: usize) -> Result<()> {
    if size % 2 == 0 || size < min || size > max {
        return Err(Error::InvalidWindow {
            name,
            size,
            min,
            max,
        });
    }
    Ok(())
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
