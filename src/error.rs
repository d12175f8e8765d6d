//! # Error standards
//!
//! This module provides the error enum and result type for this crate. Every error is raised
//! before any per-pixel work starts; there is no retriable error class.

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the sgm crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("the disparity range must contain at least one disparity")]
    ZeroDisparity,

    #[error("disparity range {0} does not fit the 16 bit disparity map")]
    DisparityTooLarge(usize),

    #[error("P1 ({p1}) must be smaller than P2 ({p2})")]
    PenaltyOrder { p1: u32, p2: u32 },

    #[error("{name} must be odd and within {min}..={max}, got {size}")]
    InvalidWindow {
        name: &'static str,
        size: usize,
        min: usize,
        max: usize,
    },

    #[error("unsupported number of aggregation directions: {0} (expected 4 or 8)")]
    DirectionCount(usize),

    #[error("aggregated costs may reach {bound}, which does not fit below the cost sentinel")]
    CostRange { bound: u64 },

    #[error("left image is {left:?} but right image is {right:?}")]
    DimensionMismatch {
        left: (u32, u32),
        right: (u32, u32),
    },

    #[error("input images must not be empty")]
    EmptyImage,

    #[error("disparity range {disparities} must be smaller than the image width {width}")]
    DisparityExceedsWidth { disparities: usize, width: usize },

    #[error("failed to allocate a buffer of {elements} elements")]
    Allocation { elements: usize },
}
