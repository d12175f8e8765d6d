//! Computes the disparity map of a stereo pair and saves it as a normalised grayscale PNG.
//!
//! ```text
//! cargo run --release --example disparity -- left.png right.png disp.png [config.json]
//! ```

use std::env;
use std::error::Error;
use std::fs;

use sgm_rs::prelude::*;

pub fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        return Err(format!(
            "usage: {} <left> <right> <output> [config.json]",
            args[0]
        )
        .into());
    }

    let limg = image::open(&args[1])?.to_luma8();
    let rimg = image::open(&args[2])?.to_luma8();

    let config = match args.get(4) {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => SgmConfig {
            max_disparity: 64,
            consistency: Consistency::SingleVolume,
            interpolate: true,
            ..Default::default()
        },
    };

    let disp = Sgm::new(config)?.compute(&limg, &rimg)?;
    disp.to_luma_normalised().save(&args[3])?;

    Ok(())
}
