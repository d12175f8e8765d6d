//! # Semi-global matching
//!
//! Dense disparity maps from rectified grayscale stereo pairs. A matching cost (Census, Rank,
//! SAD, ZSAD or SHD) is smoothed along 4 or 8 scanline directions, reduced to one disparity
//! per pixel and optionally cleaned up by a left-right check and gap interpolation.
//!
//! ```no_run
//! use sgm_rs::prelude::*;
//!
//! let left = image::open("left.png").unwrap().to_luma8();
//! let right = image::open("right.png").unwrap().to_luma8();
//!
//! let sgm = Sgm::new(SgmConfig {
//!     max_disparity: 64,
//!     consistency: Consistency::SingleVolume,
//!     ..Default::default()
//! })
//! .unwrap();
//! let disp = sgm.compute(&left, &right).unwrap();
//! disp.to_luma_normalised().save("disp.png").unwrap();
//! ```

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod aggregate;
pub mod config;
pub mod consistency;
pub mod cost;
mod disparity;
mod error;
pub mod filter;
pub mod select;
mod sgm;
pub mod volume;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use crate::config::{Consistency, CostFunction, Directions, SgmConfig};
pub use crate::disparity::DisparityMap;
pub use crate::error::{Error, Result};
pub use crate::sgm::{compute_disp, Sgm};

pub mod prelude {
    pub use crate::config::{Consistency, CostFunction, Directions, SgmConfig};
    pub use crate::disparity::DisparityMap;
    pub use crate::sgm::{compute_disp, Sgm};
}
