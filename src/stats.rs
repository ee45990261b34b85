use crate::blocks::Block;
use crate::raster::{Raster, CHANNELS};

/// Per-channel mean and population standard deviation of a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats
{
	pub mean: [f64; 3],
	pub std_dev: [f64; 3],
}

impl ChannelStats
{
	/// True when at least one channel varies less than `cutoff` (strictly).
	pub fn any_channel_below(&self, cutoff: f64) -> bool
	{
		self.std_dev.iter().any(|&std_dev| std_dev < cutoff)
	}

	/// The mean color, truncated toward zero into 8-bit samples.
	pub fn mean_color(&self) -> [u8; 3]
	{
		[self.mean[0] as u8, self.mean[1] as u8, self.mean[2] as u8]
	}
}

/// Compute channel statistics over every pixel of `block`.
///
/// Uses two passes (mean, then squared deviations) so a constant block yields exactly zero.
/// The block must lie inside the raster and contain at least one pixel.
pub fn analyze_block(raster: &Raster, block: &Block) -> ChannelStats
{
	let count: f64 = block.pixel_count() as f64;

	// First pass: channel sums.
	let mut sum: [f64; 3] = [0.0; 3];
	for row in block.row_start..block.row_end
	{
		for pixel in raster.span(row, block.col_start, block.col_end).chunks_exact(CHANNELS)
		{
			for c in 0..CHANNELS
			{
				sum[c] += pixel[c] as f64;
			}
		}
	}

	let mean: [f64; 3] = [sum[0] / count, sum[1] / count, sum[2] / count];

	// Second pass: squared deviations from the mean.
	let mut squares: [f64; 3] = [0.0; 3];
	for row in block.row_start..block.row_end
	{
		for pixel in raster.span(row, block.col_start, block.col_end).chunks_exact(CHANNELS)
		{
			for c in 0..CHANNELS
			{
				let delta: f64 = pixel[c] as f64 - mean[c];
				squares[c] += delta * delta;
			}
		}
	}

	let std_dev: [f64; 3] =
	[
		(squares[0] / count).sqrt(),
		(squares[1] / count).sqrt(),
		(squares[2] / count).sqrt(),
	];

	ChannelStats { mean, std_dev }
}
