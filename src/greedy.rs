use rayon::prelude::*;
use tracing::debug;

use crate::blocks::{partition, Block};
use crate::error::{CompressError, ConfigError};
use crate::raster::{Raster, CHANNELS};
use crate::stats::{analyze_block, ChannelStats};

/// Default block edge length in pixels.
pub const DEFAULT_BLOCK_SIZE: usize = 8;

/// Default flatten threshold as a fraction of the 8-bit range.
pub const DEFAULT_THRESHOLD: f64 = 0.2;

/// Validated settings for the greedy compressor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions
{
	block_size: usize,
	threshold: f64,
}

impl CompressOptions
{
	/// Build options, rejecting a zero block size or a threshold outside [0.0, 1.0].
	pub fn new(block_size: usize, threshold: f64) -> Result<Self, ConfigError>
	{
		if block_size == 0
		{
			return Err(ConfigError::InvalidBlockSize(0));
		}

		// NaN fails the range check as well.
		if !(0.0..=1.0).contains(&threshold)
		{
			return Err(ConfigError::InvalidThreshold(threshold));
		}

		Ok(Self { block_size, threshold })
	}

	/// Build options from a signed block size, as typed by a user.
	pub fn from_signed(block_size: i64, threshold: f64) -> Result<Self, ConfigError>
	{
		let block_size: usize = usize::try_from(block_size)
			.ok()
			.filter(|&size| size > 0)
			.ok_or(ConfigError::InvalidBlockSize(block_size))?;

		Self::new(block_size, threshold)
	}

	pub fn block_size(&self) -> usize
	{
		self.block_size
	}

	pub fn threshold(&self) -> f64
	{
		self.threshold
	}

	/// Standard deviation cutoff in 8-bit sample units.
	pub fn cutoff(&self) -> f64
	{
		self.threshold * 255.0
	}
}

impl Default for CompressOptions
{
	fn default() -> Self
	{
		Self
		{
			block_size: DEFAULT_BLOCK_SIZE,
			threshold: DEFAULT_THRESHOLD,
		}
	}
}

/// What happens to a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDecision
{
	/// Fill the whole block with this color.
	Flatten([u8; 3]),

	/// Copy the block unchanged.
	Preserve,
}

/// Decide a block's fate. Any single smooth channel flattens all three.
pub fn decide(stats: &ChannelStats, cutoff: f64) -> BlockDecision
{
	if stats.any_channel_below(cutoff)
	{
		BlockDecision::Flatten(stats.mean_color())
	}
	else
	{
		BlockDecision::Preserve
	}
}

/// Block counts from one compressor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressionReport
{
	pub total_blocks: usize,
	pub flattened_blocks: usize,
}

impl CompressionReport
{
	pub fn preserved_blocks(&self) -> usize
	{
		self.total_blocks - self.flattened_blocks
	}

	/// Fraction of blocks that were flattened (0.0 for an empty raster).
	pub fn flattened_ratio(&self) -> f64
	{
		if self.total_blocks == 0
		{
			0.0
		}
		else
		{
			self.flattened_blocks as f64 / self.total_blocks as f64
		}
	}
}

/// Output raster plus its block report.
#[derive(Debug, Clone, PartialEq)]
pub struct Compressed
{
	pub raster: Raster,
	pub report: CompressionReport,
}

/// Flatten every low-variation block of `raster` to its mean color.
///
/// Blocks are analyzed in parallel; each block's decision depends only on its own pixels.
/// The source raster is left untouched and a new raster of the same shape is returned.
pub fn greedy_compress(raster: &Raster, options: &CompressOptions) -> Result<Compressed, CompressError>
{
	let (height, width) = raster.shape();
	let blocks: Vec<Block> = partition(height, width, options.block_size())?.collect();
	let cutoff: f64 = options.cutoff();

	// Analyze and decide all blocks.
	let decisions: Vec<BlockDecision> = blocks.par_iter()
		.map(|block| decide(&analyze_block(raster, block), cutoff))
		.collect();

	// Assemble the output; blocks never overlap so each region is written once.
	let mut output: Raster = Raster::zeroed_like(raster);
	let mut report = CompressionReport
	{
		total_blocks: blocks.len(),
		flattened_blocks: 0,
	};

	for (block, decision) in blocks.iter().zip(&decisions)
	{
		write_block(raster, &mut output, block, *decision);
		if let BlockDecision::Flatten(_) = decision
		{
			report.flattened_blocks += 1;
		}
	}

	debug!(
		height,
		width,
		block_size = options.block_size(),
		threshold = options.threshold(),
		total = report.total_blocks,
		flattened = report.flattened_blocks,
		preserved = report.preserved_blocks(),
		"greedy compression finished"
	);

	Ok(Compressed { raster: output, report })
}

/// Write one block of `output` according to its decision.
fn write_block(source: &Raster, output: &mut Raster, block: &Block, decision: BlockDecision)
{
	for row in block.row_start..block.row_end
	{
		let target: &mut [u8] = output.span_mut(row, block.col_start, block.col_end);
		match decision
		{
			BlockDecision::Flatten(color) =>
			{
				for pixel in target.chunks_exact_mut(CHANNELS)
				{
					pixel.copy_from_slice(&color);
				}
			},
			BlockDecision::Preserve =>
			{
				target.copy_from_slice(source.span(row, block.col_start, block.col_end));
			},
		}
	}
}
