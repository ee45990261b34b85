use crate::error::ConfigError;

/// A rectangular tile of a raster. Ranges are half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block
{
	pub row_start: usize,
	pub row_end: usize,
	pub col_start: usize,
	pub col_end: usize,
}

impl Block
{
	pub fn height(&self) -> usize
	{
		self.row_end - self.row_start
	}

	pub fn width(&self) -> usize
	{
		self.col_end - self.col_start
	}

	/// Number of pixels covered by this block.
	pub fn pixel_count(&self) -> usize
	{
		self.height() * self.width()
	}
}

/// Lazy row-major sequence of blocks covering a raster.
/// Edge blocks are clipped to the raster bounds, never padded.
#[derive(Debug, Clone)]
pub struct Blocks
{
	height: usize,
	width: usize,
	block_size: usize,
	row: usize,
	col: usize,
}

/// Tile a `height` x `width` raster into `block_size` blocks.
pub fn partition(height: usize, width: usize, block_size: usize) -> Result<Blocks, ConfigError>
{
	if block_size == 0
	{
		return Err(ConfigError::InvalidBlockSize(0));
	}

	Ok(Blocks
	{
		height,
		width,
		block_size,
		row: 0,
		col: 0,
	})
}

impl Blocks
{
	fn remaining(&self) -> usize
	{
		if self.width == 0 || self.row >= self.height
		{
			return 0;
		}

		let per_row: usize = self.width.div_ceil(self.block_size);
		let rows_left: usize = (self.height - self.row).div_ceil(self.block_size);
		let done_in_row: usize = self.col / self.block_size;

		rows_left * per_row - done_in_row
	}
}

impl Iterator for Blocks
{
	type Item = Block;

	fn next(&mut self) -> Option<Block>
	{
		if self.width == 0 || self.row >= self.height
		{
			return None;
		}

		let block = Block
		{
			row_start: self.row,
			row_end: (self.row + self.block_size).min(self.height),
			col_start: self.col,
			col_end: (self.col + self.block_size).min(self.width),
		};

		// Advance to the next column, wrapping to the next block row.
		self.col += self.block_size;
		if self.col >= self.width
		{
			self.col = 0;
			self.row += self.block_size;
		}

		Some(block)
	}

	fn size_hint(&self) -> (usize, Option<usize>)
	{
		let remaining: usize = self.remaining();
		(remaining, Some(remaining))
	}
}

impl ExactSizeIterator for Blocks {}
