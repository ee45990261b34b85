use anyhow::{anyhow, Result};
use image::{Pixel, Rgb, RgbImage};

use crate::error::ShapeError;

/// Number of color channels per pixel (RGB, no alpha).
pub const CHANNELS: usize = 3;

/// An 8-bit RGB raster stored row-major with interleaved channels.
///
/// The sample at `[row][col][channel]` lives at `(row * width + col) * 3 + channel`.
/// An empty 0x0 raster is allowed, a raster with only one zero dimension is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster
{
	height: usize,
	width: usize,
	samples: Vec<u8>,
}

impl Raster
{
	/// Create a raster from interleaved samples with an explicit channel count.
	/// Only 3-channel data is accepted; anything else is rejected rather than converted.
	pub fn from_samples(height: usize, width: usize, channels: usize, samples: Vec<u8>) -> Result<Self, ShapeError>
	{
		if channels != CHANNELS
		{
			return Err(ShapeError::ChannelCount(channels));
		}

		if (height == 0) != (width == 0)
		{
			return Err(ShapeError::Ragged { height, width });
		}

		let expected: usize = height * width * CHANNELS;
		if samples.len() != expected
		{
			return Err(ShapeError::SampleCount { expected, actual: samples.len() });
		}

		Ok(Self { height, width, samples })
	}

	/// Allocate a zero-filled raster with the same shape as `other`.
	pub fn zeroed_like(other: &Raster) -> Self
	{
		Self
		{
			height: other.height,
			width: other.width,
			samples: vec![0; other.samples.len()],
		}
	}

	pub fn height(&self) -> usize
	{
		self.height
	}

	pub fn width(&self) -> usize
	{
		self.width
	}

	/// Returns (height, width).
	pub fn shape(&self) -> (usize, usize)
	{
		(self.height, self.width)
	}

	/// Samples of one row between two columns (end exclusive).
	pub fn span(&self, row: usize, col_start: usize, col_end: usize) -> &[u8]
	{
		&self.samples[self.offset(row, col_start)..self.offset(row, col_end)]
	}

	/// Mutable samples of one row between two columns (end exclusive).
	pub fn span_mut(&mut self, row: usize, col_start: usize, col_end: usize) -> &mut [u8]
	{
		let start: usize = self.offset(row, col_start);
		let end: usize = self.offset(row, col_end);
		&mut self.samples[start..end]
	}

	fn offset(&self, row: usize, col: usize) -> usize
	{
		(row * self.width + col) * CHANNELS
	}

	/// Wrap decoded RGB image data without copying. The buffer layout is checked like any
	/// other sample source, so an image with one zero dimension is rejected.
	pub fn from_rgb_image(img: RgbImage) -> Result<Self, ShapeError>
	{
		let (width, height) = img.dimensions();
		let channels: usize = Rgb::<u8>::CHANNEL_COUNT as usize;
		Self::from_samples(height as usize, width as usize, channels, img.into_raw())
	}

	/// Convert back into an image buffer for encoding.
	pub fn into_rgb_image(self) -> Result<RgbImage>
	{
		let (height, width) = self.shape();
		RgbImage::from_raw(width as u32, height as u32, self.samples)
			.ok_or_else(|| anyhow!("Raster of {}x{} does not fit an RGB image buffer", width, height))
	}
}

#[cfg(test)]
impl Raster
{
	/// Create an RGB raster from interleaved samples.
	pub fn new(height: usize, width: usize, samples: Vec<u8>) -> Result<Self, ShapeError>
	{
		Self::from_samples(height, width, CHANNELS, samples)
	}

	/// Create a raster from nested rows of pixels. Every row must have the same width.
	pub fn from_rows(rows: &[Vec<[u8; 3]>]) -> Result<Self, ShapeError>
	{
		let height: usize = rows.len();
		let width: usize = rows.first().map(|row| row.len()).unwrap_or(0);

		if let Some(row) = rows.iter().find(|row| row.len() != width)
		{
			return Err(ShapeError::Ragged { height, width: row.len() });
		}

		let samples: Vec<u8> = rows.iter()
			.flat_map(|row| row.iter().flat_map(|pixel| pixel.iter().copied()))
			.collect();

		Self::new(height, width, samples)
	}

	pub fn samples(&self) -> &[u8]
	{
		&self.samples
	}

	/// Get the pixel at (row, col).
	pub fn pixel(&self, row: usize, col: usize) -> [u8; 3]
	{
		let offset: usize = self.offset(row, col);
		[self.samples[offset], self.samples[offset + 1], self.samples[offset + 2]]
	}
}
