use anyhow::{anyhow, Result};
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

use crate::error::CompressError;
use crate::raster::Raster;
use crate::utils::file_utils::is_raw_file;

/// Decode an image file into an 8-bit RGB raster.
///
/// Standard formats go through `image`; grayscale, palette, 16-bit and alpha images are
/// normalized to RGB and alpha is dropped. Camera RAW files are demosaiced by `imagepipe`
/// when the `raw` feature is enabled.
pub fn load_image(path: &Path) -> Result<Raster>
{
	let raster: Raster = if is_raw_file(path)
	{
		load_raw(path)?
	}
	else
	{
		let img = image::open(path)
			.map_err(|e| anyhow!("Failed to decode image: {}", e))?;
		into_raster(img)
			.map_err(|e| anyhow!("Decoded image has an unusable layout: {}", e))?
	};

	debug!(path = %path.display(), height = raster.height(), width = raster.width(), "decoded image");
	Ok(raster)
}

/// Normalize a decoded image to RGB and validate it as a raster.
pub fn into_raster(img: DynamicImage) -> Result<Raster, CompressError>
{
	Ok(Raster::from_rgb_image(img.to_rgb8())?)
}

#[cfg(feature = "raw")]
fn load_raw(path: &Path) -> Result<Raster>
{
	// Zero size limits keep the full sensor resolution.
	let decoded = imagepipe::simple_decode_8bit(path, 0, 0)
		.map_err(|e| anyhow!("Failed to decode RAW file: {}", e))?;

	Ok(Raster::from_samples(decoded.height, decoded.width, crate::raster::CHANNELS, decoded.data)?)
}

#[cfg(not(feature = "raw"))]
fn load_raw(path: &Path) -> Result<Raster>
{
	Err(anyhow!("Cannot decode RAW file '{}': built without the 'raw' feature", path.display()))
}
